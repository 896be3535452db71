//! Pod registry for podreg.
//!
//! This crate defines the [`Registry`] trait through which the coordination
//! layer reads and writes pod records and follows their change stream, and
//! provides a durable `RocksDB` implementation.
//!
//! # Architecture
//!
//! The `RocksDB` registry uses two column families:
//!
//! - `pods`: Primary pod records, keyed by `pod_id`
//! - `pod_events`: Change log, keyed by big-endian `resource_version`
//!
//! Every write allocates the next resource version, stores the record and its
//! change event in one batch, then publishes the event to live watchers.
//! A watch started from version `n` replays logged events after `n` and then
//! follows live ones, so watchers can resume from any version they have seen.
//!
//! # Example
//!
//! ```no_run
//! use podreg_core::{Container, Pod, Selector};
//! use podreg_store::{Registry, RocksRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RocksRegistry::open("/tmp/podreg-db")?;
//!
//! let pod = Pod::new("web-1", vec![Container::new("nginx", "nginx:1.25")]);
//! registry.create_pod("node-1", pod).await?;
//!
//! let pods = registry.list_pods(&Selector::everything()).await?;
//! assert_eq!(pods.len(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
mod events;
pub mod keys;
pub mod rocks;
pub mod schema;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{Result, StoreError};
pub use rocks::RocksRegistry;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MemoryRegistry, RegistryCalls};

use async_trait::async_trait;
use futures::stream::BoxStream;
use podreg_core::{Pod, PodId, Selector, WatchEvent};

/// A stream of pod change events, in registry order.
///
/// The stream ends when the registry shuts down, or right after yielding an
/// error.
pub type WatchStream = BoxStream<'static, Result<WatchEvent>>;

/// Durable storage for pod records.
///
/// Implementations must be safe for concurrent use; callers add no locking
/// around them.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Store a new pod placed on `machine`.
    ///
    /// Sets the pod's desired and current host to `machine`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the ID is taken.
    async fn create_pod(&self, machine: &str, pod: Pod) -> Result<()>;

    /// Replace an existing pod record.
    ///
    /// Placement and creation time are carried over from the stored record
    /// when the incoming pod doesn't set them.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the pod doesn't exist.
    async fn update_pod(&self, pod: Pod) -> Result<()>;

    /// Delete a pod.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the pod doesn't exist.
    async fn delete_pod(&self, pod_id: &PodId) -> Result<()>;

    /// Get a pod by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_pod(&self, pod_id: &PodId) -> Result<Option<Pod>>;

    /// List all pods whose labels match `selector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_pods(&self, selector: &Selector) -> Result<Vec<Pod>>;

    /// Stream every change after `resource_version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the change log cannot be read.
    async fn watch_pods(&self, resource_version: u64) -> Result<WatchStream>;
}

/// Place `pod` on `machine`.
pub(crate) fn assign_host(pod: &mut Pod, machine: &str) {
    pod.desired_state.host = Some(machine.to_string());
    pod.current_state.host = Some(machine.to_string());
}

/// Carry placement and creation time over from the stored record.
pub(crate) fn merge_for_update(stored: &Pod, mut incoming: Pod) -> Pod {
    if incoming.desired_state.host.is_none() {
        incoming
            .desired_state
            .host
            .clone_from(&stored.desired_state.host);
    }
    if incoming.current_state.host.is_none() {
        incoming
            .current_state
            .host
            .clone_from(&stored.current_state.host);
    }
    if incoming.creation_timestamp.is_none() {
        incoming.creation_timestamp = stored.creation_timestamp;
    }
    incoming
}
