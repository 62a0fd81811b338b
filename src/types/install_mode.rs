// SPDX-License-Identifier: Apache-2.0

//! Install modes and the namespace-scoping resolver.
//!
//! An operator declares which install modes it supports in its CSV. The
//! caller may request a specific mode; otherwise the resolver picks the
//! widest supported scope (AllNamespaces, then OwnNamespace, then
//! SingleNamespace).

use crate::error::{InstallerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Namespace-scoping strategy an operator can run under
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
    schemars::JsonSchema,
)]
pub enum InstallModeType {
    AllNamespaces,
    OwnNamespace,
    SingleNamespace,
}

impl InstallModeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallModeType::AllNamespaces => "AllNamespaces",
            InstallModeType::OwnNamespace => "OwnNamespace",
            InstallModeType::SingleNamespace => "SingleNamespace",
        }
    }
}

impl fmt::Display for InstallModeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallModeType {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AllNamespaces" => Ok(InstallModeType::AllNamespaces),
            "OwnNamespace" => Ok(InstallModeType::OwnNamespace),
            "SingleNamespace" => Ok(InstallModeType::SingleNamespace),
            other => Err(InstallerError::Validation(format!(
                "unknown install mode {:?}",
                other
            ))),
        }
    }
}

/// An explicitly requested install mode with its target namespaces.
/// Absence of a request is modelled as `Option<InstallMode>`, never as a
/// sentinel value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallMode {
    pub mode: InstallModeType,
    pub target_namespaces: Vec<String>,
}

impl InstallMode {
    pub fn all_namespaces() -> Self {
        Self {
            mode: InstallModeType::AllNamespaces,
            target_namespaces: Vec::new(),
        }
    }

    pub fn own_namespace() -> Self {
        Self {
            mode: InstallModeType::OwnNamespace,
            target_namespaces: Vec::new(),
        }
    }

    pub fn single_namespace(target: impl Into<String>) -> Self {
        Self {
            mode: InstallModeType::SingleNamespace,
            target_namespaces: vec![target.into()],
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.target_namespaces.is_empty() {
            write!(f, "{}", self.mode)
        } else {
            write!(f, "{}={}", self.mode, self.target_namespaces.join(","))
        }
    }
}

/// Parses the CLI-style syntax: `AllNamespaces`, `OwnNamespace` or
/// `SingleNamespace=<namespace>`.
impl FromStr for InstallMode {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        let (mode_str, target) = match s.split_once('=') {
            Some((m, t)) => (m, Some(t)),
            None => (s, None),
        };
        let mode: InstallModeType = mode_str.parse()?;

        match (mode, target) {
            (InstallModeType::SingleNamespace, Some(ns)) if !ns.is_empty() => {
                Ok(InstallMode::single_namespace(ns))
            }
            (InstallModeType::SingleNamespace, _) => Err(InstallerError::Validation(format!(
                "install mode {:?} requires a target namespace, e.g. SingleNamespace=my-ns",
                mode.as_str()
            ))),
            (_, Some(_)) => Err(InstallerError::Validation(format!(
                "install mode {:?} does not take a target namespace",
                mode.as_str()
            ))),
            (_, None) => Ok(InstallMode {
                mode,
                target_namespaces: Vec::new(),
            }),
        }
    }
}

/// Narrows the supported mode set to the requested mode, applying the
/// namespace self-watch guards first. With no requested mode the supported
/// set passes through unchanged.
pub fn narrow(
    requested: Option<&InstallMode>,
    supported: &BTreeSet<InstallModeType>,
    operator_namespace: &str,
    operator_name: &str,
) -> Result<BTreeSet<InstallModeType>> {
    let Some(requested) = requested else {
        return Ok(supported.clone());
    };

    if requested.mode == InstallModeType::SingleNamespace {
        if !supported.contains(&InstallModeType::OwnNamespace)
            && requested
                .target_namespaces
                .iter()
                .any(|ns| ns == operator_namespace)
        {
            return Err(InstallerError::Validation(format!(
                "cannot watch namespace {:?}: operator {:?} does not support install mode {:?}",
                operator_namespace,
                operator_name,
                InstallModeType::OwnNamespace.as_str()
            )));
        }
        if requested.target_namespaces.first().map(String::as_str) == Some(operator_namespace) {
            return Err(InstallerError::Validation(format!(
                "use install mode {:?} to watch operator's namespace {:?}",
                InstallModeType::OwnNamespace.as_str(),
                operator_namespace
            )));
        }
    }

    let narrowed: BTreeSet<InstallModeType> =
        supported.intersection(&BTreeSet::from([requested.mode])).copied().collect();
    if narrowed.is_empty() {
        return Err(InstallerError::Unsupported(format!(
            "operator {:?} does not support install mode {:?}",
            operator_name,
            requested.mode.as_str()
        )));
    }
    Ok(narrowed)
}

/// Resolves the target namespace list for a new OperatorGroup from the
/// (possibly narrowed) supported mode set. An empty list means cluster-wide.
pub fn target_namespaces(
    requested: Option<&InstallMode>,
    supported: &BTreeSet<InstallModeType>,
    operator_namespace: &str,
) -> Result<Vec<String>> {
    if supported.contains(&InstallModeType::AllNamespaces) {
        Ok(Vec::new())
    } else if supported.contains(&InstallModeType::OwnNamespace) {
        Ok(vec![operator_namespace.to_string()])
    } else if supported.contains(&InstallModeType::SingleNamespace) {
        let targets = requested.map(|m| m.target_namespaces.as_slice()).unwrap_or(&[]);
        if targets.len() != 1 {
            return Err(InstallerError::Unsupported(format!(
                "install mode {:?} requires explicit target namespace",
                InstallModeType::SingleNamespace.as_str()
            )));
        }
        Ok(targets.to_vec())
    } else {
        Err(InstallerError::Unsupported(
            "no supported install modes".to_string(),
        ))
    }
}
