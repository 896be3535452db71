//! Pod lifecycle coordination for podreg.
//!
//! This crate turns a client's pod request into a placed, persisted pod and
//! follows it until it converges. It coordinates between the scheduler, the
//! registry, and the node runtime info sources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  API-facing request handler                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         PodStorage                           │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │  Placement  │ │ Convergence │ │   Filtered Watch    │   │
//! │  │  (locked)   │ │    Poll     │ │                     │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │    Info     │ │   Status    │ │      Instance       │   │
//! │  │  Enricher   │ │ Synthesizer │ │      Locator        │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!         ┌──────────────┬─────┴────────┬──────────────┐
//!         ▼              ▼              ▼              ▼
//!   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!   │Scheduler │   │ Registry │   │ Pod Info │   │  Cloud   │
//!   │          │   │(RocksDB) │   │(cache/HTTP)  │ (K8s)    │
//!   └──────────┘   └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use podreg_control::PodStorage;
//! use podreg_core::{Container, Pod};
//! use podreg_scheduler::{FirstFitScheduler, StaticMinionLister};
//! use podreg_store::RocksRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(RocksRegistry::open("/tmp/podreg")?);
//! let storage = PodStorage::builder(
//!     registry.clone(),
//!     Arc::new(FirstFitScheduler::new(registry)),
//!     Arc::new(StaticMinionLister::new(["node-1"])),
//! )
//! .build();
//!
//! // Returns as soon as the pod is accepted; await the operation to wait
//! // for it to converge.
//! let pod = Pod::new("", vec![Container::new("nginx", "nginx:1.25")]);
//! let operation = storage.create(pod)?;
//! if let Some(pod) = operation.await? {
//!     println!("Pod {} converged", pod.id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Convergence
//!
//! Create and update wait for the pod's derived status to leave `Waiting`:
//!
//! - `Running` or `Terminated` ends the wait successfully
//! - A failed fetch ends it with that error
//! - A pod that disappears ends it with `None`
//!
//! The wait polls on a fixed period and gives up after a configurable
//! number of attempts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod info_client;
pub mod locator;
pub mod operation;
pub mod service;
pub mod status;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use cache::PodInfoCache;
pub use error::{ControlError, Result};
pub use filter::FilteredWatch;
pub use info_client::{HttpPodInfoGetter, InfoError, PodInfoGetter};
pub use operation::Operation;
pub use service::{PodStorage, PodStorageBuilder};
pub use types::ControlConfig;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockInfoGetter;
