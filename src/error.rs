// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    #[error("unsupported install configuration: {0}")]
    Unsupported(String),

    #[error("invalid install configuration: {0}")]
    Validation(String),

    #[error("operator group conflict: {0}")]
    Conflict(String),

    #[error("timed out waiting for condition: {0}")]
    NotReady(String),

    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<InstallerError>,
    },
}

impl InstallerError {
    /// Wrap an error with the name of the pipeline stage that produced it.
    pub fn at(stage: &'static str) -> impl FnOnce(InstallerError) -> InstallerError {
        move |source| InstallerError::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// True if this is a resource-version conflict from the API server (HTTP 409).
    pub fn is_conflict(&self) -> bool {
        matches!(self, InstallerError::Api(kube::Error::Api(e)) if e.code == 409)
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;
