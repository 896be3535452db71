//! Pod placement for podreg.
//!
//! This crate provides the [`Scheduler`] and [`MinionLister`] traits the
//! coordination layer places pods through, plus the cloud lookups used to
//! resolve a host name to an address:
//!
//! - [`FirstFitScheduler`]: picks the first minion with no host-port conflict
//! - [`StaticMinionLister`]: a fixed, configured set of minions
//! - [`KubeNodes`] / [`KubeCloud`]: minions and addresses from Kubernetes nodes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Coordination Layer                           │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │ schedule(pod, minions)        │ ip_address(host)
//!                 ▼                               ▼
//! ┌───────────────────────────────┐   ┌─────────────────────────────┐
//! │       FirstFitScheduler       │   │         KubeCloud           │
//! │  ┌─────────┐  ┌────────────┐  │   │  ┌───────────────────────┐  │
//! │  │ Minion  │  │ Registry   │  │   │  │  KubeNodes (Instances) │  │
//! │  │ Lister  │  │ (ports)    │  │   │  └───────────────────────┘  │
//! │  └─────────┘  └────────────┘  │   └─────────────────────────────┘
//! └───────────────────────────────┘                 │
//!                                                   ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Kubernetes API Server                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use podreg_core::{Container, Pod};
//! use podreg_scheduler::{FirstFitScheduler, Scheduler, StaticMinionLister};
//! use podreg_store::RocksRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(RocksRegistry::open("/tmp/podreg-db")?);
//! let scheduler = FirstFitScheduler::new(registry);
//! let minions = StaticMinionLister::new(["node-1", "node-2"]);
//!
//! let pod = Pod::new("web-1", vec![Container::new("nginx", "nginx:1.25")]);
//! let host = scheduler.schedule(&pod, &minions).await?;
//! println!("placing on {host}");
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature for [`MockScheduler`] and [`MockCloud`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cloud;
pub mod error;
pub mod fit;
pub mod k8s;
pub mod minions;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use cloud::{CloudError, CloudProvider, Instances};
pub use error::{Result, SchedulerError};
pub use fit::FirstFitScheduler;
pub use k8s::{KubeCloud, KubeNodes};
pub use minions::StaticMinionLister;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockCloud, MockScheduler};

use async_trait::async_trait;
use podreg_core::Pod;

/// Lists the minions (worker hosts) pods can be placed on.
#[async_trait]
pub trait MinionLister: Send + Sync {
    /// List minion host names.
    ///
    /// # Errors
    ///
    /// Returns an error if the minion source cannot be read.
    async fn list(&self) -> Result<Vec<String>>;
}

/// Chooses a minion for a pod.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Pick the host `pod` should run on.
    ///
    /// # Errors
    ///
    /// Returns an error if no minion can take the pod or a lookup fails.
    async fn schedule(&self, pod: &Pod, minions: &dyn MinionLister) -> Result<String>;
}
