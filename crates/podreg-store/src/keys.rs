//! Key encoding utilities for `RocksDB`.
//!
//! Event keys are big-endian so that lexicographic iteration order equals
//! resource-version order.

use podreg_core::PodId;

/// Encode a pod key (the pod ID bytes).
#[must_use]
pub fn pod_key(pod_id: &PodId) -> Vec<u8> {
    pod_id.as_bytes().to_vec()
}

/// Encode an event key from a resource version.
#[must_use]
pub fn event_key(resource_version: u64) -> [u8; 8] {
    resource_version.to_be_bytes()
}

/// Decode the resource version from an event key.
///
/// Returns `None` if the key is not exactly 8 bytes.
#[must_use]
pub fn resource_version_from_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
