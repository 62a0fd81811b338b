// SPDX-License-Identifier: Apache-2.0

//! Subscription creation.

use crate::config::Configuration;
use crate::error::Result;
use crate::kubernetes::post_params;
use crate::types::olm::{
    CatalogSource, Subscription, SubscriptionSpec, APPROVAL_MANUAL,
};
use kube::{Api, ResourceExt};
use tracing::info;

pub struct SubscriptionManager {
    cfg: Configuration,
}

impl SubscriptionManager {
    pub fn new(cfg: &Configuration) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Create a Subscription with manual install plan approval. A duplicate
    /// create is a caller error and surfaces as the API conflict it is.
    pub async fn create(
        &self,
        package: &str,
        channel: &str,
        starting_csv: &str,
        catalog: &CatalogSource,
    ) -> Result<Subscription> {
        let mut sub = Subscription::new(
            &format!("{}-sub", package),
            SubscriptionSpec {
                source: catalog.name_any(),
                source_namespace: catalog.namespace().unwrap_or_else(|| self.cfg.namespace.clone()),
                name: package.to_string(),
                channel: channel.to_string(),
                starting_csv: Some(starting_csv.to_string()),
                install_plan_approval: Some(APPROVAL_MANUAL.to_string()),
            },
        );
        sub.metadata.namespace = Some(self.cfg.namespace.clone());

        let api: Api<Subscription> = Api::namespaced(self.cfg.client.clone(), &self.cfg.namespace);
        let created = api.create(&post_params(), &sub).await?;
        info!("Created Subscription: {}", created.name_any());
        Ok(created)
    }
}
