// SPDX-License-Identifier: Apache-2.0

//! OLM resource types (`operators.coreos.com`), limited to the fields the
//! installer reads and writes.

use crate::types::install_mode::InstallModeType;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Terminal success phase of a ClusterServiceVersion
pub const CSV_PHASE_SUCCEEDED: &str = "Succeeded";

/// Connection state of a catalog source that is ready to serve its index
pub const CATALOG_STATE_READY: &str = "READY";

/// Manual install plan approval: OLM generates a plan but does not execute it
/// until `InstallPlan.spec.approved` is flipped.
pub const APPROVAL_MANUAL: &str = "Manual";

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1", kind = "OperatorGroup")]
#[kube(namespaced)]
#[kube(status = "OperatorGroupStatus")]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespaces: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
}

impl OperatorGroup {
    /// Target namespaces of this group; empty means cluster-wide
    pub fn target_namespaces(&self) -> &[String] {
        self.spec.target_namespaces.as_deref().unwrap_or(&[])
    }
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1alpha1", kind = "Subscription")]
#[kube(namespaced)]
#[kube(status = "SubscriptionStatus")]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    /// Catalog source the package is served from
    pub source: String,
    pub source_namespace: String,
    /// Package name within the catalog index
    pub name: String,
    pub channel: String,
    #[serde(rename = "startingCSV", skip_serializing_if = "Option::is_none")]
    pub starting_csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_plan_approval: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_plan_ref: Option<InstallPlanReference>,
    #[serde(rename = "installedCSV", skip_serializing_if = "Option::is_none")]
    pub installed_csv: Option<String>,
}

/// Reference to the install plan OLM generated for a subscription
#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallPlanReference {
    pub name: String,
    pub namespace: String,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1alpha1", kind = "InstallPlan")]
#[kube(namespaced)]
#[kube(status = "InstallPlanStatus")]
#[serde(rename_all = "camelCase")]
pub struct InstallPlanSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<String>,
    #[serde(default)]
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_service_version_names: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallPlanStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "ClusterServiceVersion"
)]
#[kube(namespaced)]
#[kube(status = "ClusterServiceVersionStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_modes: Option<Vec<CsvInstallMode>>,
}

/// A `(type, supported)` pair from a CSV's declared install modes
#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
pub struct CsvInstallMode {
    #[serde(rename = "type")]
    pub mode: InstallModeType,
    pub supported: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterServiceVersionStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClusterServiceVersion {
    /// Install modes this CSV declares as supported. An empty set means the
    /// operator is not installable.
    pub fn supported_modes(&self) -> BTreeSet<InstallModeType> {
        supported_modes(self.spec.install_modes.as_deref().unwrap_or(&[]))
    }

    /// Whether the CSV has reached its terminal success phase
    pub fn is_succeeded(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|p| p == CSV_PHASE_SUCCEEDED)
    }
}

/// Filter declared `(type, supported)` pairs down to the supported set
pub fn supported_modes(modes: &[CsvInstallMode]) -> BTreeSet<InstallModeType> {
    modes
        .iter()
        .filter(|m| m.supported)
        .map(|m| m.mode)
        .collect()
}

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "operators.coreos.com", version = "v1alpha1", kind = "CatalogSource")]
#[kube(namespaced)]
#[kube(status = "CatalogSourceStatus")]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_state: Option<GrpcConnectionState>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrpcConnectionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_observed_state: Option<String>,
}

impl CatalogSource {
    /// Whether the catalog's gRPC connection has been observed READY
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.connection_state.as_ref())
            .and_then(|c| c.last_observed_state.as_deref())
            .is_some_and(|state| state == CATALOG_STATE_READY)
    }
}
