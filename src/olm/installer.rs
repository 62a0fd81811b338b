// SPDX-License-Identifier: Apache-2.0

//! The installation orchestrator.
//!
//! A single linear pipeline: publish catalog, ensure operator group, create
//! subscription, wait for and approve the install plan, wait for the CSV.
//! The first failing stage aborts the run with its stage name attached.
//! Resources created by earlier stages are left in place on failure; cleanup
//! is the caller's responsibility.

use crate::config::{Configuration, Settings};
use crate::error::{InstallerError, Result};
use crate::olm::catalog::{self, CatalogCreator, GrpcCatalogCreator};
use crate::olm::csv::{CsvWaiter, InstallationWaiter, PhaseWaiter};
use crate::olm::install_plan::InstallPlanApprover;
use crate::olm::operator_group::OperatorGroupReconciler;
use crate::olm::subscription::SubscriptionManager;
use crate::types::install_mode::{InstallMode, InstallModeType};
use crate::types::olm::ClusterServiceVersion;
use kube::ResourceExt;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

/// Everything a single installation run needs besides the cluster context
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub package: String,
    pub channel: String,
    pub starting_csv: String,
    pub install_mode: Option<InstallMode>,
    pub catalog_name: String,
    /// Upper bound for each wait stage
    pub timeout: Duration,
    /// Gate subscription creation on catalog readiness (see Settings)
    pub wait_for_catalog: bool,
}

impl From<&Settings> for InstallRequest {
    fn from(settings: &Settings) -> Self {
        Self {
            package: settings.package.clone(),
            channel: settings.channel.clone(),
            starting_csv: settings.starting_csv.clone(),
            install_mode: settings.install_mode.clone(),
            catalog_name: settings.catalog_name.clone(),
            timeout: settings.timeout,
            wait_for_catalog: settings.wait_for_catalog,
        }
    }
}

pub struct OperatorInstaller<C, W> {
    cfg: Configuration,
    catalog_creator: C,
    csv_waiter: W,
    supported_modes: BTreeSet<InstallModeType>,
    request: InstallRequest,
}

impl OperatorInstaller<GrpcCatalogCreator, PhaseWaiter> {
    /// Installer with the default collaborators: a grpc CatalogSource
    /// creator and the phase-polling CSV waiter.
    pub fn from_settings(
        cfg: &Configuration,
        settings: &Settings,
        supported_modes: BTreeSet<InstallModeType>,
    ) -> Self {
        Self::new(
            cfg,
            GrpcCatalogCreator::new(cfg, settings.catalog_address.clone()),
            PhaseWaiter::new(cfg),
            supported_modes,
            InstallRequest::from(settings),
        )
    }
}

impl<C: CatalogCreator, W: CsvWaiter + Sync> OperatorInstaller<C, W> {
    pub fn new(
        cfg: &Configuration,
        catalog_creator: C,
        csv_waiter: W,
        supported_modes: BTreeSet<InstallModeType>,
        request: InstallRequest,
    ) -> Self {
        Self {
            cfg: cfg.clone(),
            catalog_creator,
            csv_waiter,
            supported_modes,
            request,
        }
    }

    /// Run the full installation and return the installed CSV
    pub async fn install_operator(&self) -> Result<ClusterServiceVersion> {
        let req = &self.request;

        let cs = self
            .catalog_creator
            .create_catalog(&req.catalog_name)
            .await
            .map_err(InstallerError::at("create catalog"))?;
        info!("Created CatalogSource: {}", cs.name_any());

        if req.wait_for_catalog {
            catalog::wait_for_catalog_ready(&self.cfg, &cs.name_any(), req.timeout)
                .await
                .map_err(InstallerError::at("wait for catalog source"))?;
        }

        OperatorGroupReconciler::new(&self.cfg)
            .ensure(
                req.install_mode.as_ref(),
                &self.supported_modes,
                &req.starting_csv,
            )
            .await
            .map_err(InstallerError::at("ensure operator group"))?;

        let subscription = SubscriptionManager::new(&self.cfg)
            .create(&req.package, &req.channel, &req.starting_csv, &cs)
            .await
            .map_err(InstallerError::at("create subscription"))?;

        let approver = InstallPlanApprover::new(&self.cfg);
        let ip_ref = approver
            .wait_for_install_plan(&subscription.name_any(), req.timeout)
            .await
            .map_err(InstallerError::at("wait for install plan"))?;
        approver
            .approve(&ip_ref)
            .await
            .map_err(InstallerError::at("approve install plan"))?;

        let csv = InstallationWaiter::new(&self.cfg, &self.csv_waiter)
            .wait_installed(&req.starting_csv, req.timeout)
            .await
            .map_err(InstallerError::at("wait for installed csv"))?;

        info!("OLM has successfully installed {:?}", req.starting_csv);
        Ok(csv)
    }
}
