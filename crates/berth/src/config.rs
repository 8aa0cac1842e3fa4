use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::Builder;

use crate::error::DeployError;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_MANIFEST_PATH: &str = "app.yaml";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Settings for a single deploy run.
///
/// Build one with [`DeployConfig::builder`]; every field has a documented
/// default so `DeployConfig::builder().build()` is a valid starting point.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(private, name = "build_impl"))]
pub struct DeployConfig {
    /// Namespace the workload is reconciled into, unless the manifest's own
    /// metadata names one.
    #[builder(setter(into), default = "DEFAULT_NAMESPACE.to_string()")]
    namespace: String,

    /// Where the workload manifest is read from.
    #[builder(setter(into), default = "PathBuf::from(DEFAULT_MANIFEST_PATH)")]
    manifest_path: PathBuf,

    /// Fixed delay between readiness polls.
    #[builder(default = "DEFAULT_POLL_INTERVAL")]
    poll_interval: Duration,

    /// Give up waiting for readiness after this long. `None` waits forever.
    #[builder(setter(strip_option), default)]
    ready_timeout: Option<Duration>,

    /// Hide the spinner animation for progress updates.
    #[builder(default = "false")]
    hide_spinner: bool,
}

impl DeployConfig {
    pub fn builder() -> DeployConfigBuilder {
        DeployConfigBuilder::default()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout
    }

    pub fn hide_spinner(&self) -> bool {
        self.hide_spinner
    }
}

impl DeployConfigBuilder {
    pub fn build(&self) -> Result<DeployConfig, DeployError> {
        self.build_impl()
            .map_err(|err| DeployError::InvalidConfig(err.to_string()))
    }
}
