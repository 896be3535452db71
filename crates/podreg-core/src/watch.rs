//! Change events emitted by the pod registry.

use serde::{Deserialize, Serialize};

use crate::types::Pod;

/// What happened to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// The object was created.
    Added,
    /// The object was updated.
    Modified,
    /// The object was deleted. The event carries its last state.
    Deleted,
}

/// A single change to a pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEvent {
    /// Kind of change.
    #[serde(rename = "type")]
    pub kind: EventType,
    /// The pod after the change (or before it, for deletes).
    pub object: Pod,
}

impl WatchEvent {
    /// Create an event.
    #[must_use]
    pub const fn new(kind: EventType, object: Pod) -> Self {
        Self { kind, object }
    }

    /// Registry cursor of this event.
    #[must_use]
    pub const fn resource_version(&self) -> u64 {
        self.object.resource_version
    }
}
