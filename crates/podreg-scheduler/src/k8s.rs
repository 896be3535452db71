//! Kubernetes-backed minion listing and instance lookups.
//!
//! Cluster nodes stand in for minions: schedulable nodes are listed as
//! placement targets and a node's `InternalIP` is its instance address.

use std::net::IpAddr;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::{debug, warn};

use crate::cloud::{CloudError, CloudProvider, Instances};
use crate::{MinionLister, Result};

/// Node address type used as the instance address.
const INTERNAL_IP: &str = "InternalIP";

/// Cluster nodes as minions and instances.
#[derive(Clone)]
pub struct KubeNodes {
    client: Client,
}

impl KubeNodes {
    /// Connect using in-cluster config or the local kubeconfig.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes client cannot be created.
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    /// Use a pre-configured client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn nodes_api(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }

    fn is_schedulable(node: &Node) -> bool {
        !node
            .spec
            .as_ref()
            .and_then(|spec| spec.unschedulable)
            .unwrap_or(false)
    }

    fn internal_ip(node: &Node) -> Option<IpAddr> {
        node.status
            .as_ref()?
            .addresses
            .as_ref()?
            .iter()
            .filter(|address| address.type_ == INTERNAL_IP)
            .find_map(|address| address.address.parse().ok())
    }
}

#[async_trait]
impl MinionLister for KubeNodes {
    async fn list(&self) -> Result<Vec<String>> {
        let nodes = self.nodes_api().list(&ListParams::default()).await?;

        let minions: Vec<String> = nodes
            .items
            .iter()
            .filter(|node| Self::is_schedulable(node))
            .filter_map(|node| node.metadata.name.clone())
            .collect();

        debug!(count = minions.len(), "Listed schedulable nodes");
        Ok(minions)
    }
}

#[async_trait]
impl Instances for KubeNodes {
    async fn ip_address(&self, name: &str) -> std::result::Result<IpAddr, CloudError> {
        let node = self
            .nodes_api()
            .get_opt(name)
            .await?
            .ok_or_else(|| CloudError::InstanceNotFound(name.to_string()))?;

        Self::internal_ip(&node).ok_or_else(|| {
            warn!(node = %name, "Node reports no internal address");
            CloudError::NoAddress(name.to_string())
        })
    }
}

/// A cloud whose instances are the cluster's nodes.
#[derive(Clone)]
pub struct KubeCloud {
    nodes: KubeNodes,
}

impl KubeCloud {
    /// Create a cloud over `nodes`.
    #[must_use]
    pub fn new(nodes: KubeNodes) -> Self {
        Self { nodes }
    }
}

impl CloudProvider for KubeCloud {
    fn instances(&self) -> Option<&dyn Instances> {
        Some(&self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeAddress, NodeSpec, NodeStatus};

    fn node(unschedulable: Option<bool>, addresses: Vec<(&str, &str)>) -> Node {
        Node {
            spec: Some(NodeSpec {
                unschedulable,
                ..NodeSpec::default()
            }),
            status: Some(NodeStatus {
                addresses: Some(
                    addresses
                        .into_iter()
                        .map(|(type_, address)| NodeAddress {
                            type_: type_.to_string(),
                            address: address.to_string(),
                        })
                        .collect(),
                ),
                ..NodeStatus::default()
            }),
            ..Node::default()
        }
    }

    #[test]
    fn cordoned_nodes_are_not_schedulable() {
        assert!(KubeNodes::is_schedulable(&node(None, vec![])));
        assert!(KubeNodes::is_schedulable(&node(Some(false), vec![])));
        assert!(!KubeNodes::is_schedulable(&node(Some(true), vec![])));
    }

    #[test]
    fn internal_ip_ignores_other_address_types() {
        let n = node(
            None,
            vec![
                ("Hostname", "node-1"),
                ("ExternalIP", "203.0.113.7"),
                ("InternalIP", "10.0.0.7"),
            ],
        );
        assert_eq!(KubeNodes::internal_ip(&n), Some("10.0.0.7".parse().unwrap()));
    }

    #[test]
    fn missing_internal_ip() {
        let n = node(None, vec![("InternalIP", "not-an-ip")]);
        assert_eq!(KubeNodes::internal_ip(&n), None);
        assert_eq!(KubeNodes::internal_ip(&Node::default()), None);
    }
}
