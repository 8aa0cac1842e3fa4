//! End-to-end deploy runs against the in-memory client.

use std::collections::HashMap;
use std::time::Duration;

use k8_types::core::pod::{PodSpec, PodStatus};
use k8_types::{K8Obj, ObjectMeta};

use berth::client::memory::MemoryWorkloadClient;
use berth::{DeployConfig, DeployError, ReconcileAction, WorkloadDeployer, WorkloadManifest};

const WEB_MANIFEST: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
spec:
  replicas: 3
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: nginx:1.25
"#;

fn web_manifest() -> WorkloadManifest {
    WorkloadManifest::decode(WEB_MANIFEST.as_bytes()).expect("manifest")
}

fn fast_config() -> DeployConfig {
    DeployConfig::builder()
        .poll_interval(Duration::from_millis(10))
        .hide_spinner(true)
        .build()
        .expect("config")
}

fn pod(name: &str, namespace: &str, phase: &str, labels: &[(&str, &str)]) -> K8Obj<PodSpec> {
    let mut obj = K8Obj::new(name.to_owned(), PodSpec::default());
    obj.metadata = ObjectMeta {
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    };
    obj.set_status(PodStatus {
        phase: phase.to_owned(),
        ..Default::default()
    })
}

fn web_pod(name: &str, phase: &str) -> K8Obj<PodSpec> {
    pod(name, "default", phase, &[("app", "web")])
}

#[fluvio_future::test]
async fn test_deploy_creates_and_waits_until_ready() {
    let client = MemoryWorkloadClient::new_shared();
    // pods come up over three polls
    client.push_pod_batch(vec![]).await;
    client
        .push_pod_batch(vec![
            web_pod("web-1", "Running"),
            web_pod("web-2", "Running"),
            web_pod("web-3", "Pending"),
        ])
        .await;
    client
        .push_pod_batch(vec![
            web_pod("web-1", "Running"),
            web_pod("web-2", "Running"),
            web_pod("web-3", "Running"),
        ])
        .await;

    let deployer = WorkloadDeployer::with_client(fast_config(), client.clone());
    let outcome = deployer.deploy(web_manifest()).await.expect("deploy");

    assert_eq!(outcome.action, ReconcileAction::Created);
    assert_eq!(outcome.expected_pods, 3);
    assert_eq!(
        outcome.labels,
        HashMap::from([("app".to_owned(), "web".to_owned())])
    );
    assert_eq!(client.create_calls(), 1);
    assert_eq!(client.replace_calls(), 0);

    let stored = client.deployment("default", "web").await.expect("stored");
    assert_eq!(stored.spec.replicas, Some(3));
}

#[fluvio_future::test]
async fn test_second_deploy_updates_in_place() {
    let client = MemoryWorkloadClient::new_shared();
    client
        .push_pod_batch(vec![
            web_pod("web-1", "Running"),
            web_pod("web-2", "Running"),
            web_pod("web-3", "Running"),
        ])
        .await;

    let deployer = WorkloadDeployer::with_client(fast_config(), client.clone());
    deployer.deploy(web_manifest()).await.expect("first deploy");
    let outcome = deployer
        .deploy(web_manifest())
        .await
        .expect("second deploy");

    assert_eq!(outcome.action, ReconcileAction::Updated);
    assert_eq!(client.create_calls(), 1);
    assert_eq!(client.replace_calls(), 1);

    let stored = client.deployment("default", "web").await.expect("stored");
    assert_eq!(stored.metadata.resource_version, "1");
}

#[fluvio_future::test]
async fn test_retrieve_failure_is_terminal() {
    let client = MemoryWorkloadClient::new_shared();
    client.fail_retrieve_with("api server unreachable").await;

    let deployer = WorkloadDeployer::with_client(fast_config(), client.clone());
    let err = deployer.deploy(web_manifest()).await.unwrap_err();

    assert!(matches!(err, DeployError::WorkloadGet(_)));
    // no write is attempted after a failed existence check
    assert_eq!(client.create_calls(), 0);
    assert_eq!(client.replace_calls(), 0);
}

#[fluvio_future::test]
async fn test_selector_excludes_foreign_pods() {
    let client = MemoryWorkloadClient::new_shared();
    // three matching pods running, plus one from another workload
    client
        .push_pod_batch(vec![
            web_pod("web-1", "Running"),
            web_pod("web-2", "Running"),
            web_pod("web-3", "Running"),
            pod("api-1", "default", "Running", &[("app", "api")]),
        ])
        .await;

    let deployer = WorkloadDeployer::with_client(fast_config(), client.clone());
    let outcome = deployer.deploy(web_manifest()).await.expect("deploy");
    assert_eq!(outcome.expected_pods, 3);
}

#[fluvio_future::test]
async fn test_ready_timeout_expires() {
    let client = MemoryWorkloadClient::new_shared();
    // no pods ever appear

    let config = DeployConfig::builder()
        .poll_interval(Duration::from_millis(10))
        .ready_timeout(Duration::from_millis(50))
        .hide_spinner(true)
        .build()
        .expect("config");

    let deployer = WorkloadDeployer::with_client(config, client.clone());
    let err = deployer.deploy(web_manifest()).await.unwrap_err();

    match err {
        DeployError::ReadyTimeout(limit) => assert_eq!(limit, Duration::from_millis(50)),
        other => panic!("expected timeout, got: {other:?}"),
    }
    // the workload itself was still reconciled
    assert_eq!(client.create_calls(), 1);
}

#[fluvio_future::test]
async fn test_manifest_namespace_overrides_config() {
    let manifest = WorkloadManifest::decode(
        br#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: staging
spec:
  replicas: 1
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: nginx:1.25
"#,
    )
    .expect("manifest");

    let client = MemoryWorkloadClient::new_shared();
    // the ready pod lives in the manifest's namespace; the same-labeled pod
    // in the configured namespace must not satisfy the readiness check
    client
        .push_pod_batch(vec![
            pod("web-1", "staging", "Running", &[("app", "web")]),
            pod("impostor-1", "default", "Running", &[("app", "web")]),
        ])
        .await;

    let config = DeployConfig::builder()
        .poll_interval(Duration::from_millis(10))
        .ready_timeout(Duration::from_millis(500))
        .hide_spinner(true)
        .build()
        .expect("config");

    let deployer = WorkloadDeployer::with_client(config, client.clone());
    let outcome = deployer.deploy(manifest).await.expect("deploy");

    assert_eq!(outcome.namespace, "staging");
    assert_eq!(outcome.expected_pods, 1);
    assert!(client.deployment("staging", "web").await.is_some());
    assert!(client.deployment("default", "web").await.is_none());
}
