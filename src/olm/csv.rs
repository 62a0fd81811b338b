// SPDX-License-Identifier: Apache-2.0

//! Waiting for the installed ClusterServiceVersion.

use crate::config::Configuration;
use crate::constants::poll;
use crate::error::Result;
use crate::kubernetes::poll_until;
use crate::types::olm::ClusterServiceVersion;
use kube::Api;
use std::time::Duration;
use tracing::info;

/// Blocks until the named CSV reaches its terminal success phase, or the
/// deadline elapses.
pub trait CsvWaiter {
    fn wait_for_success(
        &self,
        name: &str,
        namespace: &str,
        deadline: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<W: CsvWaiter + Sync> CsvWaiter for &W {
    async fn wait_for_success(&self, name: &str, namespace: &str, deadline: Duration) -> Result<()> {
        <W as CsvWaiter>::wait_for_success(self, name, namespace, deadline).await
    }
}

/// Default waiter: polls the CSV phase until it reports `Succeeded`
pub struct PhaseWaiter {
    cfg: Configuration,
}

impl PhaseWaiter {
    pub fn new(cfg: &Configuration) -> Self {
        Self { cfg: cfg.clone() }
    }
}

impl CsvWaiter for PhaseWaiter {
    async fn wait_for_success(&self, name: &str, namespace: &str, deadline: Duration) -> Result<()> {
        let api: Api<ClusterServiceVersion> = Api::namespaced(self.cfg.client.clone(), namespace);
        let what = format!("csv {}/{} did not reach phase 'Succeeded'", namespace, name);

        poll_until(poll::INTERVAL, deadline, &what, || {
            let api = api.clone();
            let name = name.to_string();
            async move {
                let csv = api.get(&name).await?;
                Ok(csv.is_succeeded())
            }
        })
        .await
    }
}

/// Waits out the installation and returns the deployed CSV.
pub struct InstallationWaiter<W> {
    cfg: Configuration,
    waiter: W,
}

impl<W: CsvWaiter> InstallationWaiter<W> {
    pub fn new(cfg: &Configuration, waiter: W) -> Self {
        Self {
            cfg: cfg.clone(),
            waiter,
        }
    }

    /// Delegate the terminal-phase wait, then perform one authoritative
    /// fetch of the installed CSV.
    pub async fn wait_installed(
        &self,
        name: &str,
        deadline: Duration,
    ) -> Result<ClusterServiceVersion> {
        info!(
            "Waiting for ClusterServiceVersion {}/{} to reach 'Succeeded' phase",
            self.cfg.namespace, name
        );
        self.waiter
            .wait_for_success(name, &self.cfg.namespace, deadline)
            .await?;

        // TODO: also check the status of the resources the CSV deploys.
        let api: Api<ClusterServiceVersion> =
            Api::namespaced(self.cfg.client.clone(), &self.cfg.namespace);
        Ok(api.get(name).await?)
    }
}
