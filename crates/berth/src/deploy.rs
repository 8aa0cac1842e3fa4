use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use k8_types::app::deployment::DeploymentSpec;
use k8_types::{InputK8Obj, InputObjectMeta, K8Obj, Spec};

use crate::client::{K8WorkloadClient, WorkloadClient};
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::manifest::WorkloadManifest;
use crate::progress::{DeployProgressMessage, ProgressBarFactory, ProgressRenderedText};
use crate::wait;

/// Which reconcile branch was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
}

/// Identifying labels, namespace and expected pod count produced by
/// reconciliation.
///
/// The labels, used as a selector within the namespace the resource actually
/// landed in, match exactly the pods spawned by the reconciled resource;
/// readiness polling keys off both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub namespace: String,
    pub labels: HashMap<String, String>,
    pub expected_pods: i32,
    pub action: ReconcileAction,
}

/// Deploys one workload and waits until its pods are ready.
pub struct WorkloadDeployer {
    config: DeployConfig,
    client: Arc<dyn WorkloadClient>,
    pb_factory: ProgressBarFactory,
}

impl WorkloadDeployer {
    /// Creates a deployer talking to the cluster from the local kube config.
    pub fn from_config(config: DeployConfig) -> Result<Self, DeployError> {
        let client =
            Arc::new(K8WorkloadClient::from_kube_config().map_err(DeployError::ClientSetup)?);
        Ok(Self::with_client(config, client))
    }

    /// Creates a deployer over an explicitly supplied client.
    pub fn with_client(config: DeployConfig, client: Arc<dyn WorkloadClient>) -> Self {
        Self {
            pb_factory: ProgressBarFactory::new(config.hide_spinner()),
            config,
            client,
        }
    }

    /// Runs the full deploy: reconcile, then block until ready.
    ///
    /// Fail-fast between phases; a reconcile error is reported without any
    /// readiness polling.
    #[instrument(skip(self, manifest), fields(workload = %manifest.name()))]
    pub async fn deploy(&self, manifest: WorkloadManifest) -> Result<ReconcileOutcome, DeployError> {
        let pb = self.pb_factory.create();
        let name = manifest.name().to_owned();
        pb.println(DeployProgressMessage::Reconciling(name.clone()).msg());

        let outcome = self.reconcile(manifest).await?;
        let reconciled = match outcome.action {
            ReconcileAction::Created => DeployProgressMessage::Created(name),
            ReconcileAction::Updated => DeployProgressMessage::Updated(name),
        };
        pb.println(reconciled.msg());

        wait::wait_for_pods(self.client.as_ref(), &self.config, &outcome, &pb).await?;

        pb.println(DeployProgressMessage::Success(render_labels(&outcome.labels)).msg());
        pb.finish_and_clear();
        Ok(outcome)
    }

    /// Converges the cluster to the manifest: create-if-absent,
    /// update-if-present.
    ///
    /// The existence check strictly precedes the write; a fetch failure other
    /// than "not found" is terminal and no write is attempted.
    pub async fn reconcile(
        &self,
        manifest: WorkloadManifest,
    ) -> Result<ReconcileOutcome, DeployError> {
        let WorkloadManifest::Deployment { metadata, spec } = manifest;
        let namespace = metadata
            .namespace
            .unwrap_or_else(|| self.config.namespace().to_owned());

        let input = InputK8Obj {
            api_version: DeploymentSpec::api_version(),
            kind: DeploymentSpec::kind(),
            metadata: InputObjectMeta {
                name: metadata.name,
                namespace,
                labels: metadata.labels,
                ..Default::default()
            },
            spec,
            ..Default::default()
        };

        match self.client.retrieve_deployment(&input.metadata).await {
            Ok(_existing) => {
                debug!(name = %input.metadata.name, "workload exists, updating in place");
                let updated = self
                    .client
                    .replace_deployment(input)
                    .await
                    .map_err(DeployError::WorkloadUpdate)?;
                Ok(outcome_of(updated, ReconcileAction::Updated))
            }
            Err(err) if err.is_not_found() => {
                debug!(name = %input.metadata.name, "workload absent, creating");
                let created = self
                    .client
                    .create_deployment(input)
                    .await
                    .map_err(DeployError::WorkloadCreate)?;
                Ok(outcome_of(created, ReconcileAction::Created))
            }
            Err(err) => Err(DeployError::WorkloadGet(err)),
        }
    }

    /// Blocks until the pods matching `outcome` satisfy the readiness
    /// predicate, or the configured deadline expires.
    pub async fn wait_ready(&self, outcome: &ReconcileOutcome) -> Result<(), DeployError> {
        let pb = self.pb_factory.create();
        wait::wait_for_pods(self.client.as_ref(), &self.config, outcome, &pb).await
    }
}

/// Namespace, labels and replica count are read back from the server
/// response, not from the local manifest.
fn outcome_of(obj: K8Obj<DeploymentSpec>, action: ReconcileAction) -> ReconcileOutcome {
    let labels = obj
        .spec
        .template
        .metadata
        .map(|meta| meta.labels)
        .unwrap_or_default();
    // absent replicas means 1, matching the API server's defaulting
    let expected_pods = obj.spec.replicas.unwrap_or(1);
    ReconcileOutcome {
        namespace: obj.metadata.namespace,
        labels,
        expected_pods,
        action,
    }
}

fn render_labels(labels: &HashMap<String, String>) -> String {
    let mut pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    format!("{{{}}}", pairs.join(", "))
}
