// SPDX-License-Identifier: Apache-2.0

//! The OLM installation pipeline: catalog publication, operator group
//! reconciliation, subscription, install plan approval and the CSV wait.

pub mod catalog;
pub mod csv;
pub mod install_plan;
pub mod installer;
pub mod operator_group;
pub mod subscription;

pub use catalog::{CatalogCreator, GrpcCatalogCreator};
pub use csv::{CsvWaiter, InstallationWaiter, PhaseWaiter};
pub use install_plan::InstallPlanApprover;
pub use installer::{InstallRequest, OperatorInstaller};
pub use operator_group::OperatorGroupReconciler;
pub use subscription::SubscriptionManager;
