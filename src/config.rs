// SPDX-License-Identifier: Apache-2.0
use crate::types::install_mode::{InstallMode, InstallModeType};
use anyhow::{Context, Result};
use kube::Client;
use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

/// Shared context passed by reference into each installer component
#[derive(Clone)]
pub struct Configuration {
    /// Client for the cluster the operator is installed into
    pub client: Client,
    /// Namespace the operator is installed in
    pub namespace: String,
}

impl Configuration {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

/// Installation settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    /// Namespace to install the operator into
    pub namespace: String,
    /// Package name in the catalog index
    pub package: String,
    /// Channel to subscribe to
    pub channel: String,
    /// Name of the CSV to start the installation from
    pub starting_csv: String,
    /// Requested install mode; None lets the resolver choose
    pub install_mode: Option<InstallMode>,
    /// Install modes the operator's CSV declares as supported. Normally read
    /// from the bundle manifests; the bundle tooling is not part of this
    /// binary, so they are passed in explicitly.
    pub supported_modes: BTreeSet<InstallModeType>,
    /// Name for the catalog source published by the installer
    pub catalog_name: String,
    /// gRPC address the catalog source serves its index on
    pub catalog_address: String,
    /// Upper bound for each wait stage
    pub timeout: Duration,
    /// Gate subscription creation on the catalog connection reporting READY.
    /// Off by default: OLM propagates the connection state to the catalog
    /// source status slowly, so the gate can stall well past the point where
    /// the subscription would succeed.
    pub wait_for_catalog: bool,
}

impl Settings {
    /// Load installation settings from environment variables
    pub fn from_env() -> Result<Self> {
        let namespace =
            env::var("OLMCTL_NAMESPACE").context("OLMCTL_NAMESPACE environment variable not set")?;
        let package =
            env::var("OLMCTL_PACKAGE").context("OLMCTL_PACKAGE environment variable not set")?;
        let channel =
            env::var("OLMCTL_CHANNEL").context("OLMCTL_CHANNEL environment variable not set")?;
        let starting_csv = env::var("OLMCTL_STARTING_CSV")
            .context("OLMCTL_STARTING_CSV environment variable not set")?;

        let install_mode = match env::var("OLMCTL_INSTALL_MODE") {
            Ok(raw) => Some(
                raw.parse::<InstallMode>()
                    .with_context(|| format!("invalid OLMCTL_INSTALL_MODE {:?}", raw))?,
            ),
            Err(_) => None,
        };

        let supported_modes = env::var("OLMCTL_SUPPORTED_MODES")
            .context("OLMCTL_SUPPORTED_MODES environment variable not set")?
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<InstallModeType>()
                    .with_context(|| format!("invalid install mode {:?} in OLMCTL_SUPPORTED_MODES", s))
            })
            .collect::<Result<BTreeSet<_>>>()?;

        let catalog_name =
            env::var("OLMCTL_CATALOG_SOURCE").unwrap_or_else(|_| format!("{}-catalog", package));
        let catalog_address = env::var("OLMCTL_CATALOG_ADDRESS").unwrap_or_else(|_| {
            format!("{}.{}.svc.cluster.local:50051", catalog_name, namespace)
        });

        let timeout_secs: u64 = env::var("OLMCTL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .context("OLMCTL_TIMEOUT_SECS must be an integer number of seconds")?;
        let wait_for_catalog: bool = env::var("OLMCTL_WAIT_FOR_CATALOG")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        Ok(Settings {
            namespace,
            package,
            channel,
            starting_csv,
            install_mode,
            supported_modes,
            catalog_name,
            catalog_address,
            timeout: Duration::from_secs(timeout_secs),
            wait_for_catalog,
        })
    }
}
