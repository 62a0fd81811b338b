// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::{Client, ResourceExt};
use tracing::info;

use olmctl::config::{Configuration, Settings};
use olmctl::olm::OperatorInstaller;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting olmctl");

    // Load installation settings
    let settings = Settings::from_env()?;
    info!(
        "Installing {} (channel {}, starting at {}) into namespace {}",
        settings.package, settings.channel, settings.starting_csv, settings.namespace
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let cfg = Configuration::new(client, settings.namespace.clone());
    let installer =
        OperatorInstaller::from_settings(&cfg, &settings, settings.supported_modes.clone());

    let csv = installer.install_operator().await?;
    info!(
        "Operator installed: {}/{}",
        settings.namespace,
        csv.name_any()
    );

    Ok(())
}
