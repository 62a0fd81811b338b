// SPDX-License-Identifier: Apache-2.0

//! OperatorGroup reconciliation.
//!
//! At most one OperatorGroup may exist per namespace; a second one puts every
//! CSV in the namespace into an error state. An existing group is therefore
//! adopted when compatible and never mutated, and more than one is a fatal
//! conflict that is never auto-repaired.

use crate::config::Configuration;
use crate::constants::OPERATOR_GROUP_NAME;
use crate::error::{InstallerError, Result};
use crate::kubernetes::post_params;
use crate::types::install_mode::{self, InstallMode, InstallModeType};
use crate::types::olm::{OperatorGroup, OperatorGroupSpec};
use kube::api::ListParams;
use kube::{Api, ResourceExt};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub struct OperatorGroupReconciler {
    cfg: Configuration,
}

impl OperatorGroupReconciler {
    pub fn new(cfg: &Configuration) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Ensure a compatible OperatorGroup exists in the operator namespace,
    /// creating one with resolved target namespaces when absent.
    /// `operator_name` is only used in diagnostics.
    pub async fn ensure(
        &self,
        requested: Option<&InstallMode>,
        supported: &BTreeSet<InstallModeType>,
        operator_name: &str,
    ) -> Result<OperatorGroup> {
        let existing = self.get_operator_group().await?;
        debug!(
            "OperatorGroup found in {}? {}",
            self.cfg.namespace,
            existing.is_some()
        );

        if supported.is_empty() {
            return Err(InstallerError::Unsupported(format!(
                "operator {:?} is not installable: no supported install modes",
                operator_name
            )));
        }

        let supported =
            install_mode::narrow(requested, supported, &self.cfg.namespace, operator_name)?;

        match existing {
            None => {
                let targets =
                    install_mode::target_namespaces(requested, &supported, &self.cfg.namespace)?;
                let og = self.create_operator_group(targets).await?;
                info!("OperatorGroup {:?} created", og.name_any());
                Ok(og)
            }
            Some(og) => {
                self.validate_operator_group(&og, &supported, requested)?;
                info!("Using existing OperatorGroup {:?}", og.name_any());
                Ok(og)
            }
        }
    }

    /// Returns the single OperatorGroup in the namespace, or None. More than
    /// one is a conflict listing the offending names.
    async fn get_operator_group(&self) -> Result<Option<OperatorGroup>> {
        let api: Api<OperatorGroup> = Api::namespaced(self.cfg.client.clone(), &self.cfg.namespace);
        let list = api.list(&ListParams::default()).await?;

        match list.items.len() {
            0 => Ok(None),
            1 => Ok(list.items.into_iter().next()),
            _ => {
                let names: Vec<String> = list.items.iter().map(|og| og.name_any()).collect();
                Err(InstallerError::Conflict(format!(
                    "more than one operator group in namespace {}: {:?}",
                    self.cfg.namespace, names
                )))
            }
        }
    }

    async fn create_operator_group(&self, target_namespaces: Vec<String>) -> Result<OperatorGroup> {
        let mut og = OperatorGroup::new(
            OPERATOR_GROUP_NAME,
            OperatorGroupSpec {
                target_namespaces: Some(target_namespaces),
            },
        );
        og.metadata.namespace = Some(self.cfg.namespace.clone());

        let api: Api<OperatorGroup> = Api::namespaced(self.cfg.client.clone(), &self.cfg.namespace);
        // A create racing another creator surfaces as an API error on purpose.
        Ok(api.create(&post_params(), &og).await?)
    }

    /// An existing group is compatible when one of the supported modes
    /// matches its target set exactly.
    fn validate_operator_group(
        &self,
        og: &OperatorGroup,
        supported: &BTreeSet<InstallModeType>,
        requested: Option<&InstallMode>,
    ) -> Result<()> {
        let og_targets: BTreeSet<&str> =
            og.target_namespaces().iter().map(String::as_str).collect();
        let requested_targets: BTreeSet<&str> = requested
            .map(|m| m.target_namespaces.iter().map(String::as_str).collect())
            .unwrap_or_default();
        let own_namespace = BTreeSet::from([self.cfg.namespace.as_str()]);

        let compatible = (supported.contains(&InstallModeType::AllNamespaces)
            && og_targets.is_empty())
            || (supported.contains(&InstallModeType::OwnNamespace) && og_targets == own_namespace)
            || (supported.contains(&InstallModeType::SingleNamespace)
                && og_targets == requested_targets);
        if compatible {
            return Ok(());
        }

        match requested {
            Some(mode) => Err(InstallerError::Validation(format!(
                "existing operatorgroup {:?} is not compatible with install mode {:?}",
                og.name_any(),
                mode.to_string()
            ))),
            None => Err(InstallerError::Validation(format!(
                "existing operatorgroup {:?} is not compatible with any supported package install modes",
                og.name_any()
            ))),
        }
    }
}
