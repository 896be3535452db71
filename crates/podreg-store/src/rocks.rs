//! `RocksDB` registry implementation.
//!
//! This module provides the `RocksRegistry` implementation of the `Registry`
//! trait.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use podreg_core::{EventType, Pod, PodId, Selector, WatchEvent};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use tokio::sync::broadcast;

use crate::error::{Result, StoreError};
use crate::events::{self, EVENT_CHANNEL_CAPACITY};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{assign_host, merge_for_update, Registry, WatchStream};

/// RocksDB-backed pod registry.
pub struct RocksRegistry {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Last allocated resource version. Held for the whole of every write.
    last_version: Mutex<u64>,
    events: broadcast::Sender<WatchEvent>,
}

impl RocksRegistry {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let registry = Self {
            db: Arc::new(db),
            last_version: Mutex::new(0),
            events,
        };

        let last = registry.read_last_version()?;
        *registry.last_version.lock() = last;
        tracing::debug!(resource_version = last, "Opened pod registry");

        Ok(registry)
    }

    /// The most recently allocated resource version.
    #[must_use]
    pub fn resource_version(&self) -> u64 {
        *self.last_version.lock()
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read_last_version(&self) -> Result<u64> {
        let cf_events = self.cf(cf::POD_EVENTS)?;
        let mut iter = self.db.iterator_cf(&cf_events, IteratorMode::End);

        match iter.next() {
            Some(item) => {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                keys::resource_version_from_key(&key)
                    .ok_or_else(|| StoreError::Database("malformed event key".to_string()))
            }
            None => Ok(0),
        }
    }

    fn read_pod(&self, pod_id: &PodId) -> Result<Option<Pod>> {
        let cf = self.cf(cf::PODS)?;
        let key = keys::pod_key(pod_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Write a pod change and its event in one batch, then publish the event.
    ///
    /// The caller must hold `last_version` for the duration.
    fn commit(&self, last_version: &mut u64, kind: EventType, mut pod: Pod) -> Result<()> {
        let cf_pods = self.cf(cf::PODS)?;
        let cf_events = self.cf(cf::POD_EVENTS)?;

        let version = *last_version + 1;
        pod.resource_version = version;
        let pod_key = keys::pod_key(&pod.id);
        let event = WatchEvent::new(kind, pod);

        let mut batch = WriteBatch::default();
        match kind {
            EventType::Deleted => batch.delete_cf(&cf_pods, &pod_key),
            EventType::Added | EventType::Modified => {
                batch.put_cf(&cf_pods, &pod_key, Self::serialize(&event.object)?);
            }
        }
        batch.put_cf(&cf_events, keys::event_key(version), Self::serialize(&event)?);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        *last_version = version;

        tracing::trace!(
            pod_id = %event.object.id,
            resource_version = version,
            kind = ?kind,
            "Committed pod change"
        );

        // No live watchers is not an error.
        let _ = self.events.send(event);
        Ok(())
    }

    fn read_events_after(&self, resource_version: u64) -> Result<Vec<WatchEvent>> {
        let cf_events = self.cf(cf::POD_EVENTS)?;
        let start = keys::event_key(resource_version.saturating_add(1));

        let mut events = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_events, IteratorMode::From(&start, Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            match keys::resource_version_from_key(&key) {
                Some(version) if version > resource_version => {
                    events.push(Self::deserialize(&value)?);
                }
                _ => {}
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl Registry for RocksRegistry {
    async fn create_pod(&self, machine: &str, mut pod: Pod) -> Result<()> {
        let mut last_version = self.last_version.lock();

        if self.read_pod(&pod.id)?.is_some() {
            return Err(StoreError::AlreadyExists(pod.id));
        }

        assign_host(&mut pod, machine);
        self.commit(&mut last_version, EventType::Added, pod)
    }

    async fn update_pod(&self, pod: Pod) -> Result<()> {
        let mut last_version = self.last_version.lock();

        let stored = self
            .read_pod(&pod.id)?
            .ok_or_else(|| StoreError::NotFound(pod.id.clone()))?;

        let pod = merge_for_update(&stored, pod);
        self.commit(&mut last_version, EventType::Modified, pod)
    }

    async fn delete_pod(&self, pod_id: &PodId) -> Result<()> {
        let mut last_version = self.last_version.lock();

        let stored = self
            .read_pod(pod_id)?
            .ok_or_else(|| StoreError::NotFound(pod_id.clone()))?;

        self.commit(&mut last_version, EventType::Deleted, stored)
    }

    async fn get_pod(&self, pod_id: &PodId) -> Result<Option<Pod>> {
        self.read_pod(pod_id)
    }

    async fn list_pods(&self, selector: &Selector) -> Result<Vec<Pod>> {
        let cf = self.cf(cf::PODS)?;

        let mut pods = Vec::new();
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);

        for item in iter {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let pod: Pod = Self::deserialize(&value)?;
            if selector.matches(&pod.labels) {
                pods.push(pod);
            }
        }

        Ok(pods)
    }

    async fn watch_pods(&self, resource_version: u64) -> Result<WatchStream> {
        let receiver = self.events.subscribe();
        let backlog = self.read_events_after(resource_version)?;

        tracing::debug!(
            resource_version,
            replayed = backlog.len(),
            "Starting pod watch"
        );

        Ok(events::follow(backlog, receiver, resource_version))
    }
}
