//! Deploy a declaratively-specified workload onto a Kubernetes cluster and
//! block until it is fully ready.
//!
//! The entry point is [`WorkloadDeployer`], which runs the two phases of a
//! deploy in sequence: reconcile the cluster to the desired
//! [`WorkloadManifest`] (create the resource if it is absent, update it in
//! place if it exists), then poll the pods selected by the resource's
//! template labels until every expected pod is running.
//!
//! # Example
//!
//! ```no_run
//! use berth::{DeployConfig, WorkloadDeployer, WorkloadManifest};
//!
//! # async fn example() -> Result<(), berth::DeployError> {
//! let config = DeployConfig::builder().namespace("default").build()?;
//! let manifest = WorkloadManifest::load(config.manifest_path())?;
//! let deployer = WorkloadDeployer::from_config(config)?;
//! let outcome = deployer.deploy(manifest).await?;
//! println!("deployed with labels {:?}", outcome.labels);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
mod config;
mod deploy;
mod error;
mod manifest;
mod progress;
mod selector;
mod wait;

pub use config::{
    DeployConfig, DeployConfigBuilder, DEFAULT_MANIFEST_PATH, DEFAULT_NAMESPACE,
    DEFAULT_POLL_INTERVAL,
};
pub use deploy::{ReconcileAction, ReconcileOutcome, WorkloadDeployer};
pub use error::DeployError;
pub use manifest::{ManifestError, ManifestMeta, WorkloadManifest};
pub use progress::{ProgressBarFactory, ProgressRenderer};
pub use selector::{selector_from_labels, SelectorError};
