//! Cluster access used by the deployer.
//!
//! [`WorkloadClient`] is the seam between the reconcile/wait logic and the
//! Kubernetes API: production code talks to the cluster through
//! [`K8WorkloadClient`], tests substitute [`memory::MemoryWorkloadClient`].

use async_trait::async_trait;
use tracing::{debug, instrument};

use k8_client::meta_client::{ListArg, MetadataClient, PatchMergeType};
use k8_client::{load_and_share, SharedK8Client};
use k8_types::app::deployment::DeploymentSpec;
use k8_types::core::pod::PodSpec;
use k8_types::{InputK8Obj, InputObjectMeta, K8Obj};

pub mod memory;

/// Errors surfaced by a [`WorkloadClient`].
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The requested object does not exist. Expected during reconciliation,
    /// where it drives the create branch.
    #[error("object not found")]
    NotFound,
    #[error(transparent)]
    K8(#[from] anyhow::Error),
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// An absent object is `Ok(None)` on the wire; surface it as the typed
/// not-found error so callers can branch on it.
fn found<S>(item: Option<K8Obj<S>>) -> Result<K8Obj<S>, ClientError>
where
    S: k8_types::Spec,
{
    item.ok_or(ClientError::NotFound)
}

/// CRUD access to workload resources plus read access to their pods.
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    /// Fetches the deployment named by `meta`, or [`ClientError::NotFound`].
    async fn retrieve_deployment(
        &self,
        meta: &InputObjectMeta,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError>;

    async fn create_deployment(
        &self,
        input: InputK8Obj<DeploymentSpec>,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError>;

    /// Overwrites the existing deployment's spec with `input`'s spec.
    async fn replace_deployment(
        &self,
        input: InputK8Obj<DeploymentSpec>,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError>;

    /// Lists pods in `namespace` matching the given label selector.
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<K8Obj<PodSpec>>, ClientError>;
}

/// [`WorkloadClient`] backed by the cluster named in the local kube config.
pub struct K8WorkloadClient {
    client: SharedK8Client,
}

impl K8WorkloadClient {
    /// Connects using the kube config discovered by `k8-client`.
    pub fn from_kube_config() -> Result<Self, ClientError> {
        let client = load_and_share().map_err(|err| ClientError::K8(err.into()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkloadClient for K8WorkloadClient {
    #[instrument(skip(self))]
    async fn retrieve_deployment(
        &self,
        meta: &InputObjectMeta,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError> {
        found(self.client.retrieve_item::<DeploymentSpec, _>(meta).await?)
    }

    #[instrument(skip(self, input), fields(name = %input.metadata.name))]
    async fn create_deployment(
        &self,
        input: InputK8Obj<DeploymentSpec>,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError> {
        Ok(self.client.create_item(input).await?)
    }

    #[instrument(skip(self, input), fields(name = %input.metadata.name))]
    async fn replace_deployment(
        &self,
        input: InputK8Obj<DeploymentSpec>,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError> {
        // Merge patch carrying the entire desired spec: every field the
        // manifest specifies overwrites the live value.
        let patch = serde_json::json!({ "spec": input.spec });
        Ok(self
            .client
            .patch::<DeploymentSpec, _>(&input.metadata, &patch, PatchMergeType::JsonMerge)
            .await?)
    }

    #[instrument(skip(self))]
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<K8Obj<PodSpec>>, ClientError> {
        let option = ListArg {
            label_selector: Some(selector.to_owned()),
            ..Default::default()
        };
        let list = self
            .client
            .retrieve_items_with_option::<PodSpec, _>(namespace, Some(option))
            .await?;
        debug!(pods = list.items.len(), "listed pods");
        Ok(list.items)
    }
}
