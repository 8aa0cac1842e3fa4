use std::error::Error as _;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use fluvio_future::task::run_block_on;

use berth::{
    DeployConfig, DeployError, WorkloadDeployer, WorkloadManifest, DEFAULT_MANIFEST_PATH,
    DEFAULT_NAMESPACE,
};

/// Deploy a Kubernetes workload and wait until its pods are ready
#[derive(Debug, Parser)]
#[command(name = "berth", version)]
struct DeployOpt {
    /// Path to the workload manifest
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// Kubernetes namespace to deploy into
    #[arg(long, value_name = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Seconds between readiness polls
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    poll_interval: u64,

    /// Fail if the workload is not ready after this many seconds
    #[arg(long, value_name = "SECONDS")]
    ready_timeout: Option<u64>,

    /// Hide the progress spinner
    #[arg(long)]
    hide_spinner: bool,
}

fn main() -> Result<()> {
    fluvio_future::subscriber::init_tracer(None);
    let opt = DeployOpt::parse();

    if let Err(err) = run_block_on(process(opt)) {
        eprintln!("Error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }

    Ok(())
}

async fn process(opt: DeployOpt) -> Result<(), DeployError> {
    let mut builder = DeployConfig::builder();
    builder
        .namespace(opt.namespace)
        .manifest_path(opt.manifest)
        .poll_interval(Duration::from_secs(opt.poll_interval))
        .hide_spinner(opt.hide_spinner);
    if let Some(secs) = opt.ready_timeout {
        builder.ready_timeout(Duration::from_secs(secs));
    }
    let config = builder.build()?;

    let manifest = WorkloadManifest::load(config.manifest_path())?;
    let deployer = WorkloadDeployer::from_config(config)?;
    deployer.deploy(manifest).await?;

    Ok(())
}
