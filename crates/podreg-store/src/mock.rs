//! In-memory registry for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use podreg_core::{EventType, Pod, PodId, Selector, WatchEvent};
use tokio::sync::broadcast;

use crate::error::{Result, StoreError};
use crate::events::{self, EVENT_CHANNEL_CAPACITY};
use crate::{assign_host, merge_for_update, Registry, WatchStream};

/// Number of calls made to each registry operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryCalls {
    /// `create_pod` calls.
    pub create: usize,
    /// `update_pod` calls.
    pub update: usize,
    /// `delete_pod` calls.
    pub delete: usize,
    /// `get_pod` calls.
    pub get: usize,
    /// `list_pods` calls.
    pub list: usize,
    /// `watch_pods` calls.
    pub watch: usize,
}

impl RegistryCalls {
    /// Total calls across all operations.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.create + self.update + self.delete + self.get + self.list + self.watch
    }
}

#[derive(Default)]
struct State {
    pods: BTreeMap<PodId, Pod>,
    log: Vec<WatchEvent>,
    last_version: u64,
    calls: RegistryCalls,
    fail_next: Option<StoreError>,
}

/// A registry that keeps everything in memory and counts calls.
pub struct MemoryRegistry {
    state: Mutex<State>,
    events: broadcast::Sender<WatchEvent>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(State::default()),
            events,
        }
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> RegistryCalls {
        self.state.lock().calls
    }

    /// Make the next operation of any kind fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Replace a stored pod without recording a change event.
    ///
    /// Stands in for the node agent writing runtime state behind the
    /// coordinator's back.
    pub fn set_pod(&self, pod: Pod) {
        self.state.lock().pods.insert(pod.id.clone(), pod);
    }

    /// Remove a stored pod without recording a change event.
    pub fn remove_pod(&self, pod_id: &PodId) -> Option<Pod> {
        self.state.lock().pods.remove(pod_id)
    }

    fn take_failure(state: &mut State) -> Result<()> {
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn commit(&self, state: &mut State, kind: EventType, mut pod: Pod) {
        state.last_version += 1;
        pod.resource_version = state.last_version;

        match kind {
            EventType::Deleted => {
                state.pods.remove(&pod.id);
            }
            EventType::Added | EventType::Modified => {
                state.pods.insert(pod.id.clone(), pod.clone());
            }
        }

        let event = WatchEvent::new(kind, pod);
        state.log.push(event.clone());
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn create_pod(&self, machine: &str, mut pod: Pod) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.create += 1;
        Self::take_failure(&mut state)?;

        if state.pods.contains_key(&pod.id) {
            return Err(StoreError::AlreadyExists(pod.id));
        }

        assign_host(&mut pod, machine);
        self.commit(&mut state, EventType::Added, pod);
        Ok(())
    }

    async fn update_pod(&self, pod: Pod) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.update += 1;
        Self::take_failure(&mut state)?;

        let stored = state
            .pods
            .get(&pod.id)
            .ok_or_else(|| StoreError::NotFound(pod.id.clone()))?;

        let pod = merge_for_update(stored, pod);
        self.commit(&mut state, EventType::Modified, pod);
        Ok(())
    }

    async fn delete_pod(&self, pod_id: &PodId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.delete += 1;
        Self::take_failure(&mut state)?;

        let stored = state
            .pods
            .get(pod_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(pod_id.clone()))?;

        self.commit(&mut state, EventType::Deleted, stored);
        Ok(())
    }

    async fn get_pod(&self, pod_id: &PodId) -> Result<Option<Pod>> {
        let mut state = self.state.lock();
        state.calls.get += 1;
        Self::take_failure(&mut state)?;

        Ok(state.pods.get(pod_id).cloned())
    }

    async fn list_pods(&self, selector: &Selector) -> Result<Vec<Pod>> {
        let mut state = self.state.lock();
        state.calls.list += 1;
        Self::take_failure(&mut state)?;

        Ok(state
            .pods
            .values()
            .filter(|pod| selector.matches(&pod.labels))
            .cloned()
            .collect())
    }

    async fn watch_pods(&self, resource_version: u64) -> Result<WatchStream> {
        let mut state = self.state.lock();
        state.calls.watch += 1;
        Self::take_failure(&mut state)?;

        let receiver = self.events.subscribe();
        let backlog = state
            .log
            .iter()
            .filter(|event| event.resource_version() > resource_version)
            .cloned()
            .collect();

        Ok(events::follow(backlog, receiver, resource_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use podreg_core::Container;

    fn test_pod(id: &str) -> Pod {
        Pod::new(id, vec![Container::new("web", "nginx")])
    }

    #[tokio::test]
    async fn counts_calls() {
        let registry = MemoryRegistry::new();
        registry.create_pod("node-a", test_pod("a")).await.unwrap();
        registry.get_pod(&PodId::new("a")).await.unwrap();
        registry.list_pods(&Selector::everything()).await.unwrap();

        let calls = registry.calls();
        assert_eq!(calls.create, 1);
        assert_eq!(calls.get, 1);
        assert_eq!(calls.list, 1);
        assert_eq!(calls.total(), 3);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let registry = MemoryRegistry::new();
        registry.fail_next(StoreError::Database("disk full".into()));

        let err = registry.create_pod("node-a", test_pod("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));

        registry.create_pod("node-a", test_pod("a")).await.unwrap();
        assert_eq!(registry.calls().create, 2);
    }

    #[tokio::test]
    async fn update_keeps_placement() {
        let registry = MemoryRegistry::new();
        registry.create_pod("node-a", test_pod("a")).await.unwrap();
        registry.update_pod(test_pod("a")).await.unwrap();

        let pod = registry.get_pod(&PodId::new("a")).await.unwrap().unwrap();
        assert_eq!(pod.host(), Some("node-a"));
        assert_eq!(pod.resource_version, 2);
    }

    #[tokio::test]
    async fn watch_skips_events_at_or_before_version() {
        let registry = MemoryRegistry::new();
        registry.create_pod("node-a", test_pod("a")).await.unwrap();
        registry.create_pod("node-a", test_pod("b")).await.unwrap();

        let mut watch = registry.watch_pods(1).await.unwrap();
        registry.delete_pod(&PodId::new("b")).await.unwrap();

        let added = watch.next().await.unwrap().unwrap();
        assert_eq!((added.kind, added.object.id.as_str()), (EventType::Added, "b"));

        let deleted = watch.next().await.unwrap().unwrap();
        assert_eq!(deleted.kind, EventType::Deleted);
        assert_eq!(deleted.resource_version(), 3);
    }
}
