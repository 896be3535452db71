//! Cloud provider abstraction.
//!
//! A cloud provider may or may not be able to answer instance queries; the
//! coordination layer asks for [`Instances`] and treats `None` as "no address
//! lookup available".

use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from cloud instance lookups.
#[derive(Error, Debug)]
pub enum CloudError {
    /// No instance has this name.
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// The instance exists but reports no usable address.
    #[error("Instance {0} has no internal address")]
    NoAddress(String),

    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    KubeApi(#[from] kube::Error),
}

/// Instance queries against a cloud.
#[async_trait]
pub trait Instances: Send + Sync {
    /// Resolve an instance name to its address.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is unknown or the lookup fails.
    async fn ip_address(&self, name: &str) -> Result<IpAddr, CloudError>;
}

/// A cloud the cluster runs in.
pub trait CloudProvider: Send + Sync {
    /// Instance queries, if this cloud supports them.
    fn instances(&self) -> Option<&dyn Instances>;
}
