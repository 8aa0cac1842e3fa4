//! In-memory [`WorkloadClient`] for tests.
//!
//! Deployments live in a map keyed by `namespace/name` with the resource
//! version bumped on every replace. Pod listings are scripted: each call to
//! [`MemoryWorkloadClient::push_pod_batch`] queues one snapshot, and
//! `list_pods` serves the queue in order, replaying the last snapshot once
//! the queue is drained. The selector is honored, so a snapshot may contain
//! pods that the listing must filter out.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_lock::{Mutex, RwLock};
use async_trait::async_trait;

use k8_types::app::deployment::DeploymentSpec;
use k8_types::core::pod::PodSpec;
use k8_types::{InputK8Obj, InputObjectMeta, K8Obj, ObjectMeta};

use super::{ClientError, WorkloadClient};

#[derive(Debug, Default)]
pub struct MemoryWorkloadClient {
    deployments: RwLock<HashMap<String, K8Obj<DeploymentSpec>>>,
    pod_batches: Mutex<VecDeque<Vec<K8Obj<PodSpec>>>>,
    fail_retrieve: Mutex<Option<String>>,
    creates: AtomicU32,
    replaces: AtomicU32,
}

impl MemoryWorkloadClient {
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seeds an existing deployment, as if a prior run had created it.
    pub async fn insert_deployment(&self, obj: K8Obj<DeploymentSpec>) {
        let key = object_key(&obj.metadata.namespace, &obj.metadata.name);
        self.deployments.write().await.insert(key, obj);
    }

    pub async fn deployment(&self, namespace: &str, name: &str) -> Option<K8Obj<DeploymentSpec>> {
        self.deployments
            .read()
            .await
            .get(&object_key(namespace, name))
            .cloned()
    }

    /// Queues one pod-list snapshot.
    pub async fn push_pod_batch(&self, pods: Vec<K8Obj<PodSpec>>) {
        self.pod_batches.lock().await.push_back(pods);
    }

    /// Makes the next `retrieve_deployment` calls fail with the given
    /// message, simulating a non-not-found read failure.
    pub async fn fail_retrieve_with(&self, message: impl Into<String>) {
        *self.fail_retrieve.lock().await = Some(message.into());
    }

    pub fn create_calls(&self) -> u32 {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn replace_calls(&self) -> u32 {
        self.replaces.load(Ordering::Relaxed)
    }
}

fn object_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

fn selector_matches(selector: &str, labels: &HashMap<String, String>) -> bool {
    selector.split(',').all(|term| match term.split_once('=') {
        Some((key, value)) => labels.get(key).is_some_and(|v| v == value),
        None => false,
    })
}

fn obj_from_input(input: InputK8Obj<DeploymentSpec>) -> K8Obj<DeploymentSpec> {
    let metadata = input.metadata;
    let mut obj = K8Obj::new(metadata.name.clone(), input.spec);
    obj.metadata = ObjectMeta {
        name: metadata.name,
        namespace: metadata.namespace,
        labels: metadata.labels,
        ..Default::default()
    };
    obj
}

#[async_trait]
impl WorkloadClient for MemoryWorkloadClient {
    async fn retrieve_deployment(
        &self,
        meta: &InputObjectMeta,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError> {
        if let Some(message) = self.fail_retrieve.lock().await.clone() {
            return Err(ClientError::Other(message));
        }

        self.deployments
            .read()
            .await
            .get(&object_key(&meta.namespace, &meta.name))
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    async fn create_deployment(
        &self,
        input: InputK8Obj<DeploymentSpec>,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError> {
        self.creates.fetch_add(1, Ordering::Relaxed);

        let key = object_key(&input.metadata.namespace, &input.metadata.name);
        let mut lock = self.deployments.write().await;
        if lock.contains_key(&key) {
            return Err(ClientError::Other(format!("{key} already exists")));
        }

        let obj = obj_from_input(input);
        lock.insert(key, obj.clone());
        Ok(obj)
    }

    async fn replace_deployment(
        &self,
        input: InputK8Obj<DeploymentSpec>,
    ) -> Result<K8Obj<DeploymentSpec>, ClientError> {
        self.replaces.fetch_add(1, Ordering::Relaxed);

        let key = object_key(&input.metadata.namespace, &input.metadata.name);
        let mut lock = self.deployments.write().await;
        let existing = lock.get(&key).ok_or(ClientError::NotFound)?;

        let old_version = existing
            .metadata
            .resource_version
            .parse::<i32>()
            .unwrap_or_default();
        let mut obj = obj_from_input(input);
        obj.metadata.resource_version = (old_version + 1).to_string();

        lock.insert(key, obj.clone());
        Ok(obj)
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &str,
    ) -> Result<Vec<K8Obj<PodSpec>>, ClientError> {
        let mut batches = self.pod_batches.lock().await;
        let batch = if batches.len() > 1 {
            batches.pop_front().unwrap_or_default()
        } else {
            batches.front().cloned().unwrap_or_default()
        };
        drop(batches);

        Ok(batch
            .into_iter()
            .filter(|pod| {
                pod.metadata.namespace.is_empty() || pod.metadata.namespace == namespace
            })
            .filter(|pod| selector_matches(selector, &pod.metadata.labels))
            .collect())
    }
}
