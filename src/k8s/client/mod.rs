// Package client provides the cluster control-plane seam used by the
// resolver and the scale controller.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, info};

use crate::error::{Error, Result};


/// Replica count of one deployment as observed at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleSnapshot {
    pub replicas: i32,
    /// Version the read was served at. Sent back on update so the API server
    /// rejects a write that races an external change.
    pub resource_version: Option<String>,
}

impl ScaleSnapshot {
    pub fn new(replicas: i32) -> Self {
        Self {
            replicas,
            resource_version: None,
        }
    }

    /// Same snapshot with a new desired replica count.
    pub fn with_replicas(&self, replicas: i32) -> Self {
        Self {
            replicas,
            resource_version: self.resource_version.clone(),
        }
    }
}

/// Operations the cluster control plane must provide.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Names of the deployments in `namespace` matching `label_selector`.
    async fn list_deployment_names(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<String>>;

    /// Reads the scale subresource of a deployment.
    async fn get_scale(&self, namespace: &str, name: &str) -> Result<ScaleSnapshot>;

    /// Writes the scale subresource and returns what the server stored.
    async fn update_scale(
        &self,
        namespace: &str,
        name: &str,
        scale: ScaleSnapshot,
    ) -> Result<ScaleSnapshot>;
}

/// Builds a client from the in-cluster service account when `path_to_conf`
/// is empty, from the given kubeconfig file otherwise.
pub async fn new_kubernetes_client(path_to_conf: &str) -> Result<Client> {
    let config = if path_to_conf.is_empty() {
        Config::incluster().map_err(Error::config)?
    } else {
        let kubeconfig = Kubeconfig::read_from(path_to_conf).map_err(Error::config)?;
        Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(Error::config)?
    };

    info!(
        component = "k8s-client",
        event = "config_loaded",
        in_cluster = path_to_conf.is_empty(),
        cluster_url = %config.cluster_url,
        "cluster configuration loaded"
    );

    Client::try_from(config).map_err(Error::config)
}

/// Control plane backed by the Kubernetes apps/v1 API.
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
}

impl KubeControlPlane {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// See [`new_kubernetes_client`].
    pub async fn connect(path_to_conf: &str) -> Result<Self> {
        Ok(Self::new(new_kubernetes_client(path_to_conf).await?))
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn list_deployment_names(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<String>> {
        let mut params = ListParams::default();
        if !label_selector.is_empty() {
            params = params.labels(label_selector);
        }

        let list = self.deployments(namespace).list(&params).await?;
        let names: Vec<String> = list
            .items
            .into_iter()
            .filter_map(|deployment| deployment.metadata.name)
            .collect();

        debug!(
            component = "k8s-client",
            event = "deployments_listed",
            namespace,
            label_selector,
            count = names.len(),
            "deployments listed"
        );
        Ok(names)
    }

    async fn get_scale(&self, namespace: &str, name: &str) -> Result<ScaleSnapshot> {
        let scale = self.deployments(namespace).get_scale(name).await?;
        snapshot_from_scale(name, scale)
    }

    async fn update_scale(
        &self,
        namespace: &str,
        name: &str,
        scale: ScaleSnapshot,
    ) -> Result<ScaleSnapshot> {
        let body = serde_json::to_vec(&scale_request(namespace, name, &scale))
            .map_err(Error::control_plane)?;
        let stored = self
            .deployments(namespace)
            .replace_scale(name, &PostParams::default(), body)
            .await?;
        snapshot_from_scale(name, stored)
    }
}

pub(crate) fn snapshot_from_scale(name: &str, scale: Scale) -> Result<ScaleSnapshot> {
    let replicas = scale
        .spec
        .and_then(|spec| spec.replicas)
        .ok_or_else(|| Error::MissingReplicas(name.to_string()))?;
    Ok(ScaleSnapshot {
        replicas,
        resource_version: scale.metadata.resource_version,
    })
}

pub(crate) fn scale_request(namespace: &str, name: &str, scale: &ScaleSnapshot) -> Scale {
    Scale {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: scale.resource_version.clone(),
            ..ObjectMeta::default()
        },
        spec: Some(ScaleSpec {
            replicas: Some(scale.replicas),
        }),
        status: None,
    }
}
