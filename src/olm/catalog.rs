// SPDX-License-Identifier: Apache-2.0

//! Catalog source publication.

use crate::config::Configuration;
use crate::constants::poll;
use crate::error::Result;
use crate::kubernetes::{poll_until, post_params};
use crate::types::olm::{CatalogSource, CatalogSourceSpec};
use kube::Api;
use std::time::Duration;
use tracing::{debug, info};

/// Publishes a catalog resource exposing the package index and returns its
/// identity. The installer only depends on this seam; how the index itself
/// is served (registry pod, pre-pushed index image) is up to the
/// implementation.
pub trait CatalogCreator {
    fn create_catalog(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<CatalogSource>> + Send;
}

/// Creates a grpc CatalogSource pointing at an already-serving index address
pub struct GrpcCatalogCreator {
    cfg: Configuration,
    address: String,
}

impl GrpcCatalogCreator {
    pub fn new(cfg: &Configuration, address: impl Into<String>) -> Self {
        Self {
            cfg: cfg.clone(),
            address: address.into(),
        }
    }
}

impl CatalogCreator for GrpcCatalogCreator {
    async fn create_catalog(&self, name: &str) -> Result<CatalogSource> {
        let mut cs = CatalogSource::new(
            name,
            CatalogSourceSpec {
                source_type: Some("grpc".to_string()),
                address: Some(self.address.clone()),
                display_name: Some(name.to_string()),
                publisher: None,
            },
        );
        cs.metadata.namespace = Some(self.cfg.namespace.clone());

        let api: Api<CatalogSource> =
            Api::namespaced(self.cfg.client.clone(), &self.cfg.namespace);
        let created = api.create(&post_params(), &cs).await?;
        debug!(
            "CatalogSource {}/{} created, serving {}",
            self.cfg.namespace, name, self.address
        );
        Ok(created)
    }
}

/// Wait until the catalog's gRPC connection is observed READY.
///
/// OLM propagates the connection state to the CatalogSource status slowly
/// even though its catalog-operator reports a connection almost immediately,
/// so this gate is opt-in and skipped by default.
pub async fn wait_for_catalog_ready(
    cfg: &Configuration,
    name: &str,
    deadline: Duration,
) -> Result<()> {
    let api: Api<CatalogSource> = Api::namespaced(cfg.client.clone(), &cfg.namespace);
    let what = format!("catalog source {} connection is not ready", name);

    poll_until(poll::INTERVAL, deadline, &what, || {
        let api = api.clone();
        let name = name.to_string();
        async move {
            let cs = api.get(&name).await?;
            Ok(cs.is_ready())
        }
    })
    .await?;

    info!("CatalogSource {} is ready", name);
    Ok(())
}
