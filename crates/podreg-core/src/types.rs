//! Pod data model.
//!
//! A [`Pod`] has a desired state (the immutable manifest plus the placement it
//! was scheduled to) and a current state that is filled in on every read from
//! live container runtime data. The derived [`PodStatus`] is a view and is never
//! treated as authoritative.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::PodId;

/// The only manifest version accepted by validation.
pub const MANIFEST_VERSION: &str = "v1beta1";

/// Name of the infrastructure container that owns the pod's network namespace.
pub const NETWORK_CONTAINER: &str = "net";

/// Runtime info for every container of one pod, keyed by container name.
pub type PodInfo = BTreeMap<String, ContainerInfo>;

/// Labels attached to a pod.
pub type Labels = BTreeMap<String, String>;

/// A pod record as stored in the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    /// Unique identifier. Empty until assigned.
    pub id: PodId,
    /// Labels used for selection and watch filtering.
    #[serde(default)]
    pub labels: Labels,
    /// What the client asked for.
    pub desired_state: DesiredState,
    /// What the cluster last reported.
    #[serde(default)]
    pub current_state: CurrentState,
    /// When the pod was accepted by the coordinator.
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Registry cursor of the last write to this record.
    #[serde(default)]
    pub resource_version: u64,
}

impl Pod {
    /// Create a pod with the given ID and containers and an otherwise default manifest.
    #[must_use]
    pub fn new(id: impl Into<PodId>, containers: Vec<Container>) -> Self {
        let id = id.into();
        Self {
            desired_state: DesiredState {
                manifest: ContainerManifest {
                    version: MANIFEST_VERSION.to_string(),
                    id: id.clone(),
                    containers,
                },
                host: None,
            },
            id,
            ..Default::default()
        }
    }

    /// Add a label, builder style.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// The host the pod currently runs on, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.current_state.host.as_deref().filter(|h| !h.is_empty())
    }

    /// Host ports requested by any container of this pod.
    pub fn host_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.desired_state
            .manifest
            .containers
            .iter()
            .flat_map(|c| c.ports.iter())
            .filter_map(|p| p.host_port)
    }
}

/// Desired state of a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    /// The container manifest. Its ID always equals the pod ID after creation.
    pub manifest: ContainerManifest,
    /// The machine the scheduler placed the pod on.
    #[serde(default)]
    pub host: Option<String>,
}

/// Observed state of a pod, recomputed on reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentState {
    /// Machine the pod is assigned to.
    #[serde(default)]
    pub host: Option<String>,
    /// Routable address of that machine.
    #[serde(default)]
    pub host_ip: Option<String>,
    /// IP of the pod's network container.
    #[serde(default)]
    pub pod_ip: Option<String>,
    /// Derived aggregate status.
    #[serde(default)]
    pub status: PodStatus,
    /// Per-container runtime info, if any was available.
    #[serde(default)]
    pub info: Option<PodInfo>,
}

/// Describes the containers that make up a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerManifest {
    /// Manifest schema version.
    pub version: String,
    /// Manifest ID, equal to the pod ID.
    pub id: PodId,
    /// Containers to run.
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A single container in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container name, unique within the pod.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Command override.
    #[serde(default)]
    pub command: Vec<String>,
    /// Exposed ports.
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Environment variables.
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

impl Container {
    /// Create a container with a name and image.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Add a port, builder style.
    #[must_use]
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }
}

/// A container port, optionally bound on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Optional port name, unique within the pod.
    #[serde(default)]
    pub name: String,
    /// Port inside the container.
    pub container_port: u16,
    /// Port bound on the host, if any.
    #[serde(default)]
    pub host_port: Option<u16>,
    /// Transport protocol.
    #[serde(default)]
    pub protocol: Protocol,
}

/// Transport protocol of a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

/// An environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    #[serde(default)]
    pub value: String,
}

/// Derived aggregate status of a pod.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodStatus {
    /// Not yet running, or not enough information to tell.
    #[default]
    Waiting,
    /// Every container is running.
    Running,
    /// Every container has stopped.
    Terminated,
}

impl PodStatus {
    /// The status name as used in field selectors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Terminated => "Terminated",
        }
    }

    /// Returns true for the statuses that end a convergence wait.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Running | Self::Terminated)
    }
}

impl fmt::Display for PodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime record of one container, in the shape node agents report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInfo {
    /// Container runtime ID.
    #[serde(default)]
    pub id: String,
    /// Process state.
    #[serde(default)]
    pub state: ContainerState,
    /// Network configuration, present for containers that own a network namespace.
    #[serde(default)]
    pub network_settings: Option<NetworkSettings>,
}

impl ContainerInfo {
    /// A running container with no network settings.
    #[must_use]
    pub fn running() -> Self {
        Self {
            state: ContainerState {
                running: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// A stopped container that exited with `exit_code`.
    #[must_use]
    pub fn exited(exit_code: i32) -> Self {
        Self {
            state: ContainerState {
                running: false,
                exit_code,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Attach network settings with the given IP, builder style.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.network_settings = Some(NetworkSettings {
            ip_address: ip.into(),
        });
        self
    }
}

/// Process state of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    /// Whether the container process is running.
    #[serde(default)]
    pub running: bool,
    /// Exit code of the last run.
    #[serde(default)]
    pub exit_code: i32,
    /// When the container started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Network settings of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Container IP address.
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
}

/// Generic outcome of an operation that has no object to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Outcome.
    pub status: StatusKind,
}

impl Status {
    /// A successful outcome.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: StatusKind::Success,
        }
    }
}

/// Outcome kind of a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Failure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pod_has_matching_manifest_id() {
        let pod = Pod::new("web", vec![Container::new("nginx", "nginx:1.25")]);
        assert_eq!(pod.id, pod.desired_state.manifest.id);
        assert_eq!(pod.desired_state.manifest.version, MANIFEST_VERSION);
        assert_eq!(pod.current_state.status, PodStatus::Waiting);
    }

    #[test]
    fn host_ignores_empty_string() {
        let mut pod = Pod::new("web", vec![]);
        assert!(pod.host().is_none());
        pod.current_state.host = Some(String::new());
        assert!(pod.host().is_none());
        pod.current_state.host = Some("node-1".to_string());
        assert_eq!(pod.host(), Some("node-1"));
    }

    #[test]
    fn host_ports_flattens_containers() {
        let pod = Pod::new(
            "web",
            vec![
                Container::new("a", "img").with_port(Port {
                    container_port: 80,
                    host_port: Some(8080),
                    ..Default::default()
                }),
                Container::new("b", "img").with_port(Port {
                    container_port: 9000,
                    ..Default::default()
                }),
            ],
        );
        assert_eq!(pod.host_ports().collect::<Vec<_>>(), vec![8080]);
    }

    #[test]
    fn pod_status_terminal() {
        assert!(PodStatus::Running.is_terminal());
        assert!(PodStatus::Terminated.is_terminal());
        assert!(!PodStatus::Waiting.is_terminal());
        assert_eq!(PodStatus::Terminated.to_string(), "Terminated");
    }

    #[test]
    fn container_info_decodes_docker_shape() {
        let json = r#"{
            "Id": "abc123",
            "State": {"Running": true, "ExitCode": 0},
            "NetworkSettings": {"IPAddress": "10.244.1.7"}
        }"#;
        let info: ContainerInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "abc123");
        assert!(info.state.running);
        assert_eq!(info.network_settings.unwrap().ip_address, "10.244.1.7");
    }

    #[test]
    fn status_success_serializes_lowercase() {
        let json = serde_json::to_string(&Status::success()).unwrap();
        assert_eq!(json, r#"{"status":"success"}"#);
    }
}
