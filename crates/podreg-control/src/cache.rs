//! Pod info cache.
//!
//! Keeps the last runtime info seen for each hosted pod so reads don't have
//! to reach every node. A background refresher re-reads info for all pods in
//! the registry on an interval.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use podreg_core::{PodId, PodInfo, Selector};
use podreg_store::{Registry, StoreError};
use tracing::{debug, error};

use crate::info_client::{InfoError, PodInfoGetter};

type CacheKey = (String, PodId);

/// A cache of pod runtime info keyed by host and pod.
#[derive(Debug, Default)]
pub struct PodInfoCache {
    entries: RwLock<HashMap<CacheKey, PodInfo>>,
}

impl PodInfoCache {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached info for a pod, if any.
    #[must_use]
    pub fn get(&self, host: &str, pod_id: &PodId) -> Option<PodInfo> {
        self.entries
            .read()
            .get(&(host.to_string(), pod_id.clone()))
            .cloned()
    }

    /// Insert or update the info for a pod.
    pub fn insert(&self, host: impl Into<String>, pod_id: PodId, info: PodInfo) {
        self.entries.write().insert((host.into(), pod_id), info);
    }

    /// Remove the info for a pod.
    pub fn remove(&self, host: &str, pod_id: &PodId) -> Option<PodInfo> {
        self.entries
            .write()
            .remove(&(host.to_string(), pod_id.clone()))
    }

    /// Get the number of cached pods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Re-read info for every hosted pod in `registry` from `source`.
    ///
    /// Entries for pods that are gone or moved are dropped. A pod whose
    /// source reports no info loses its entry; a failed query keeps the old
    /// entry. Returns the number of pods with cached info afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be listed.
    pub async fn refresh(
        &self,
        registry: &dyn Registry,
        source: &dyn PodInfoGetter,
    ) -> Result<usize, StoreError> {
        let pods = registry.list_pods(&Selector::everything()).await?;

        let mut live: HashSet<CacheKey> = HashSet::with_capacity(pods.len());
        for pod in &pods {
            let Some(host) = pod.host() else {
                continue;
            };
            live.insert((host.to_string(), pod.id.clone()));

            match source.get_pod_info(host, &pod.id).await {
                Ok(info) => self.insert(host, pod.id.clone(), info),
                Err(InfoError::NotAvailable) => {
                    self.remove(host, &pod.id);
                }
                Err(e) => {
                    error!(pod_id = %pod.id, host = %host, error = %e, "Failed to refresh pod info");
                }
            }
        }

        self.entries.write().retain(|key, _| live.contains(key));
        Ok(self.len())
    }

    /// Refresh the cache every `period`, forever.
    pub async fn run_refresher(
        self: Arc<Self>,
        registry: Arc<dyn Registry>,
        source: Arc<dyn PodInfoGetter>,
        period: Duration,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.refresh(registry.as_ref(), source.as_ref()).await {
                Ok(cached) => debug!(cached, "Refreshed pod info cache"),
                Err(e) => error!(error = %e, "Pod info cache refresh failed"),
            }
        }
    }
}

#[async_trait]
impl PodInfoGetter for PodInfoCache {
    async fn get_pod_info(&self, host: &str, pod_id: &PodId) -> Result<PodInfo, InfoError> {
        self.get(host, pod_id).ok_or(InfoError::NotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInfoGetter;
    use podreg_core::{Container, ContainerInfo, Pod};
    use podreg_store::MemoryRegistry;

    fn running_info() -> PodInfo {
        let mut info = PodInfo::new();
        info.insert("web".to_string(), ContainerInfo::running());
        info
    }

    fn test_pod(id: &str) -> Pod {
        Pod::new(id, vec![Container::new("web", "nginx")])
    }

    #[test]
    fn cache_insert_and_get() {
        let cache = PodInfoCache::new();
        let id = PodId::new("web");

        assert!(cache.get("h1", &id).is_none());
        cache.insert("h1", id.clone(), running_info());

        assert_eq!(cache.get("h1", &id), Some(running_info()));
        assert!(cache.get("h2", &id).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn miss_is_not_available() {
        let cache = PodInfoCache::new();
        let err = cache
            .get_pod_info("h1", &PodId::new("web"))
            .await
            .unwrap_err();
        assert!(err.is_not_available());
    }

    #[tokio::test]
    async fn refresh_fills_and_prunes() {
        let registry = MemoryRegistry::new();
        registry.create_pod("h1", test_pod("a")).await.unwrap();
        registry.create_pod("h2", test_pod("b")).await.unwrap();

        let source = MockInfoGetter::new();
        source.insert("h1", PodId::new("a"), running_info());

        let cache = PodInfoCache::new();
        cache.insert("h9", PodId::new("gone"), running_info());

        let cached = cache.refresh(&registry, &source).await.unwrap();
        assert_eq!(cached, 1);
        assert_eq!(cache.get("h1", &PodId::new("a")), Some(running_info()));
        assert!(cache.get("h2", &PodId::new("b")).is_none());
        assert!(cache.get("h9", &PodId::new("gone")).is_none());
    }

    #[tokio::test]
    async fn refresh_keeps_entry_on_source_error() {
        let registry = MemoryRegistry::new();
        registry.create_pod("h1", test_pod("a")).await.unwrap();

        let source = MockInfoGetter::new();
        source.fail_host("h1");

        let cache = PodInfoCache::new();
        cache.insert("h1", PodId::new("a"), running_info());

        cache.refresh(&registry, &source).await.unwrap();
        assert_eq!(cache.get("h1", &PodId::new("a")), Some(running_info()));
    }
}
