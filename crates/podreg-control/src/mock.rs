//! Mock runtime info source for testing.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use podreg_core::{PodId, PodInfo};

use crate::info_client::{InfoError, PodInfoGetter};

/// An info source answering from a fixed table.
///
/// Lookups for unknown pods return `NotAvailable` unless a fallback is set;
/// hosts marked as failing return an HTTP 500 error.
#[derive(Default)]
pub struct MockInfoGetter {
    entries: Mutex<HashMap<(String, PodId), PodInfo>>,
    fallback: Mutex<Option<PodInfo>>,
    failing_hosts: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, PodId)>>,
}

impl MockInfoGetter {
    /// Create an empty info source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every lookup without a specific entry with `info`.
    #[must_use]
    pub fn with_fallback(info: PodInfo) -> Self {
        let getter = Self::default();
        *getter.fallback.lock() = Some(info);
        getter
    }

    /// Set the info for `pod_id` on `host`.
    pub fn insert(&self, host: impl Into<String>, pod_id: PodId, info: PodInfo) {
        self.entries.lock().insert((host.into(), pod_id), info);
    }

    /// Make every lookup against `host` fail.
    pub fn fail_host(&self, host: impl Into<String>) {
        self.failing_hosts.lock().insert(host.into());
    }

    /// Lookups made so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, PodId)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PodInfoGetter for MockInfoGetter {
    async fn get_pod_info(&self, host: &str, pod_id: &PodId) -> Result<PodInfo, InfoError> {
        self.calls.lock().push((host.to_string(), pod_id.clone()));

        if self.failing_hosts.lock().contains(host) {
            return Err(InfoError::Http(500));
        }

        let key = (host.to_string(), pod_id.clone());
        if let Some(info) = self.entries.lock().get(&key) {
            return Ok(info.clone());
        }

        self.fallback.lock().clone().ok_or(InfoError::NotAvailable)
    }
}
