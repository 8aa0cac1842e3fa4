use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use k8_types::app::deployment::DeploymentSpec;

pub const DEPLOYMENT_API_VERSION: &str = "apps/v1";
pub const DEPLOYMENT_KIND: &str = "Deployment";

#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    #[error("failed to read workload manifest {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode workload manifest")]
    Decode(#[from] serde_yaml::Error),
    /// The manifest decoded cleanly but names a kind this tool does not
    /// manage.
    #[error("unsupported workload kind {kind} ({api_version})")]
    UnsupportedKind { api_version: String, kind: String },
}

/// Object metadata carried by a manifest.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestMeta {
    pub name: String,
    pub namespace: Option<String>,
    pub labels: HashMap<String, String>,
}

/// Envelope shared by every Kubernetes manifest; `spec` is decoded per kind.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    api_version: String,
    kind: String,
    #[serde(default)]
    metadata: ManifestMeta,
    spec: serde_yaml::Value,
}

/// A workload decoded from a manifest file.
///
/// This is the closed set of kinds the deployer manages; anything else is an
/// [`ManifestError::UnsupportedKind`] input error before any cluster call is
/// made.
#[derive(Debug, Clone)]
pub enum WorkloadManifest {
    Deployment {
        metadata: ManifestMeta,
        spec: DeploymentSpec,
    },
}

impl WorkloadManifest {
    /// Reads and decodes the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = std::fs::read(path).map_err(|source| ManifestError::Read {
            path: path.to_owned(),
            source,
        })?;
        debug!(path = %path.display(), size = bytes.len(), "read workload manifest");
        Self::decode(&bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_yaml::from_slice(bytes)?;
        match (raw.api_version.as_str(), raw.kind.as_str()) {
            (DEPLOYMENT_API_VERSION, DEPLOYMENT_KIND) => {
                let spec: DeploymentSpec = serde_yaml::from_value(raw.spec)?;
                Ok(Self::Deployment {
                    metadata: raw.metadata,
                    spec,
                })
            }
            _ => Err(ManifestError::UnsupportedKind {
                api_version: raw.api_version,
                kind: raw.kind,
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Deployment { metadata, .. } => &metadata.name,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Deployment { .. } => DEPLOYMENT_KIND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEB_DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
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

    #[test]
    fn test_decode_deployment() {
        let manifest = WorkloadManifest::decode(WEB_DEPLOYMENT.as_bytes()).expect("manifest");
        assert_eq!(manifest.name(), "web");
        assert_eq!(manifest.kind(), DEPLOYMENT_KIND);

        let WorkloadManifest::Deployment { metadata, spec } = manifest;
        assert_eq!(metadata.namespace, None);
        assert_eq!(spec.replicas, Some(3));
        let template_labels = spec.template.metadata.expect("template meta").labels;
        assert_eq!(template_labels.get("app").map(String::as_str), Some("web"));
    }

    #[test]
    fn test_unsupported_kind() {
        let service = r#"
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  selector:
    app: web
"#;
        let err = WorkloadManifest::decode(service.as_bytes()).unwrap_err();
        match err {
            ManifestError::UnsupportedKind { api_version, kind } => {
                assert_eq!(api_version, "v1");
                assert_eq!(kind, "Service");
            }
            other => panic!("expected unsupported kind, got: {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_input() {
        let err = WorkloadManifest::decode(b"not: [valid").unwrap_err();
        assert!(matches!(err, ManifestError::Decode(_)));
    }

    #[test]
    fn test_missing_spec() {
        let headless = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
"#;
        let err = WorkloadManifest::decode(headless.as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestError::Decode(_)));
    }
}
