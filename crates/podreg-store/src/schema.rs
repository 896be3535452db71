//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary pod records, keyed by `pod_id`.
    pub const PODS: &str = "pods";

    /// Change log, keyed by big-endian `resource_version`.
    pub const POD_EVENTS: &str = "pod_events";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::PODS, cf::POD_EVENTS]
}
