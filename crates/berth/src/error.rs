use std::time::Duration;

use crate::client::ClientError;
use crate::manifest::ManifestError;
use crate::selector::SelectorError;

/// Failures from a deploy run, tagged by the phase that produced them.
///
/// Every phase is fatal: nothing is retried and no rollback is attempted. A
/// resource that was created or updated before a later phase failed is left
/// as-is.
#[derive(thiserror::Error, Debug)]
pub enum DeployError {
    #[error("invalid deploy configuration: {0}")]
    InvalidConfig(String),
    /// Could not build a Kubernetes client from the local kube config.
    #[error("failed to set up Kubernetes client")]
    ClientSetup(#[source] ClientError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// The existence check failed with something other than "not found".
    #[error("failed to fetch workload resource")]
    WorkloadGet(#[source] ClientError),
    #[error("failed to create workload resource")]
    WorkloadCreate(#[source] ClientError),
    #[error("failed to update workload resource")]
    WorkloadUpdate(#[source] ClientError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("failed to list pods for readiness check")]
    PodList(#[source] ClientError),
    /// The readiness predicate was not satisfied before the configured
    /// deadline expired.
    #[error("workload did not become ready within {0:?}")]
    ReadyTimeout(Duration),
}
