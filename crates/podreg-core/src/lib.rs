//! Core types and utilities for podreg.
//!
//! This crate provides the foundational types shared by the registry, the
//! scheduler and the coordination layer:
//!
//! - **Identifiers**: [`PodId`], assigned once and never changed
//! - **Data model**: [`Pod`], its manifest, and per-container runtime info
//! - **Selectors**: equality-based label and field selectors
//! - **Validation**: aggregated pod validation rules
//! - **Watch events**: change events emitted by registries
//!
//! # Example
//!
//! ```
//! use podreg_core::{validate_pod, Container, Pod, PodId, Selector};
//!
//! let pod = Pod::new(PodId::generate(), vec![Container::new("web", "nginx:1.25")])
//!     .with_label("app", "web");
//! assert!(validate_pod(&pod).is_ok());
//!
//! let selector: Selector = "app=web".parse().unwrap();
//! assert!(selector.matches(&pod.labels));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod labels;
pub mod types;
pub mod validation;
pub mod watch;

pub use error::{CoreError, Result};
pub use ids::{IdError, PodId};
pub use labels::{Operator, Requirement, Selector, SelectorError};
pub use types::{
    Container, ContainerInfo, ContainerManifest, ContainerState, CurrentState, DesiredState,
    EnvVar, Labels, NetworkSettings, Pod, PodInfo, PodStatus, Port, Protocol, Status, StatusKind,
    MANIFEST_VERSION, NETWORK_CONTAINER,
};
pub use validation::{validate_pod, ValidationError, ValidationErrorKind, ValidationErrors};
pub use watch::{EventType, WatchEvent};
