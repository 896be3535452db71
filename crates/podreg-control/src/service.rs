//! Pod lifecycle coordinator.
//!
//! This module provides `PodStorage`, which turns a client's pod request
//! into a placed, persisted pod and follows it until its derived status
//! converges.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use podreg_core::{validate_pod, Pod, PodId, Selector, Status};
use podreg_scheduler::{CloudProvider, MinionLister, Scheduler};
use podreg_store::Registry;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::enrich::enrich;
use crate::error::{ControlError, Result};
use crate::filter::FilteredWatch;
use crate::info_client::PodInfoGetter;
use crate::locator::locate;
use crate::operation::Operation;

/// Default sleep between convergence polls.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(10);

/// Default maximum convergence polls per operation.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 360;

/// Coordinates pod placement, persistence and convergence.
///
/// Creates are placed one at a time: choosing a host and persisting the pod
/// happen under a lock held by this coordinator, so two creates never see
/// the same cluster occupancy. Waiting for convergence happens outside it.
#[derive(Clone)]
pub struct PodStorage {
    shared: Arc<Shared>,
}

struct Shared {
    registry: Arc<dyn Registry>,
    scheduler: Arc<dyn Scheduler>,
    minions: Arc<dyn MinionLister>,
    cloud: Option<Arc<dyn CloudProvider>>,
    info_cache: Option<Arc<dyn PodInfoGetter>>,
    live_info: Option<Arc<dyn PodInfoGetter>>,
    poll_period: Duration,
    max_poll_attempts: Option<u32>,
    placement: Mutex<()>,
}

/// Builder for [`PodStorage`].
pub struct PodStorageBuilder {
    registry: Arc<dyn Registry>,
    scheduler: Arc<dyn Scheduler>,
    minions: Arc<dyn MinionLister>,
    cloud: Option<Arc<dyn CloudProvider>>,
    info_cache: Option<Arc<dyn PodInfoGetter>>,
    live_info: Option<Arc<dyn PodInfoGetter>>,
    poll_period: Duration,
    max_poll_attempts: Option<u32>,
}

impl PodStorageBuilder {
    /// Resolve host addresses through `cloud`.
    #[must_use]
    pub fn cloud(mut self, cloud: Arc<dyn CloudProvider>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    /// Read runtime info from `cache` first.
    #[must_use]
    pub fn info_cache(mut self, cache: Arc<dyn PodInfoGetter>) -> Self {
        self.info_cache = Some(cache);
        self
    }

    /// Read runtime info from `live` when the cache has none.
    #[must_use]
    pub fn live_info(mut self, live: Arc<dyn PodInfoGetter>) -> Self {
        self.live_info = Some(live);
        self
    }

    /// Sleep between convergence polls.
    #[must_use]
    pub const fn poll_period(mut self, period: Duration) -> Self {
        self.poll_period = period;
        self
    }

    /// Maximum convergence polls per operation; `None` for no limit.
    #[must_use]
    pub const fn max_poll_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Build the coordinator.
    #[must_use]
    pub fn build(self) -> PodStorage {
        PodStorage {
            shared: Arc::new(Shared {
                registry: self.registry,
                scheduler: self.scheduler,
                minions: self.minions,
                cloud: self.cloud,
                info_cache: self.info_cache,
                live_info: self.live_info,
                poll_period: self.poll_period,
                max_poll_attempts: self.max_poll_attempts,
                placement: Mutex::new(()),
            }),
        }
    }
}

impl PodStorage {
    /// Start building a coordinator over the given collaborators.
    #[must_use]
    pub fn builder(
        registry: Arc<dyn Registry>,
        scheduler: Arc<dyn Scheduler>,
        minions: Arc<dyn MinionLister>,
    ) -> PodStorageBuilder {
        PodStorageBuilder {
            registry,
            scheduler,
            minions,
            cloud: None,
            info_cache: None,
            live_info: None,
            poll_period: DEFAULT_POLL_PERIOD,
            max_poll_attempts: Some(DEFAULT_MAX_POLL_ATTEMPTS),
        }
    }

    /// Accept a new pod and start placing it.
    ///
    /// A pod without an ID gets a fresh one. The returned operation places
    /// and persists the pod, then waits for it to reach `Running` or
    /// `Terminated`. It yields the pod as submitted, or `None` if the pod
    /// disappeared while waiting.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Validation` if the pod is invalid. Nothing is
    /// scheduled or stored in that case.
    pub fn create(&self, mut pod: Pod) -> Result<Operation<Option<Pod>>> {
        if pod.id.is_empty() {
            pod.id = PodId::generate();
        }
        pod.desired_state.manifest.id = pod.id.clone();
        validate_pod(&pod)?;
        pod.creation_timestamp = Some(Utc::now());

        info!(pod_id = %pod.id, "Accepted pod");

        let shared = Arc::clone(&self.shared);
        Ok(Operation::spawn(async move {
            shared.place(pod.clone()).await?;
            shared.wait_for_pod(pod).await
        }))
    }

    /// Replace an existing pod and wait for it to converge.
    ///
    /// The pod keeps its placement; nothing is rescheduled.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Validation` if the pod is invalid.
    pub fn update(&self, pod: Pod) -> Result<Operation<Option<Pod>>> {
        validate_pod(&pod)?;

        let shared = Arc::clone(&self.shared);
        Ok(Operation::spawn(async move {
            shared.registry.update_pod(pod.clone()).await?;
            debug!(pod_id = %pod.id, "Updated pod");
            shared.wait_for_pod(pod).await
        }))
    }

    /// Delete a pod.
    pub fn delete(&self, pod_id: &PodId) -> Operation<Status> {
        let shared = Arc::clone(&self.shared);
        let pod_id = pod_id.clone();
        Operation::spawn(async move {
            shared.registry.delete_pod(&pod_id).await?;
            info!(pod_id = %pod_id, "Deleted pod");
            Ok(Status::success())
        })
    }

    /// Get a pod with its runtime info, derived status and host address.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry read fails. Info and address lookup
    /// failures only leave those fields empty.
    pub async fn get(&self, pod_id: &PodId) -> Result<Option<Pod>> {
        self.shared.get(pod_id).await
    }

    /// List pods matching `selector`, each with its runtime info.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry read fails.
    pub async fn list(&self, selector: &Selector) -> Result<Vec<Pod>> {
        let shared = &self.shared;
        let mut pods = shared.registry.list_pods(selector).await?;

        if shared.has_info_source() {
            let cache = shared.info_cache.as_deref();
            let live = shared.live_info.as_deref();
            futures::future::join_all(pods.iter_mut().map(|pod| enrich(pod, cache, live))).await;
        }

        Ok(pods)
    }

    /// Watch pod changes after `resource_version` that match both selectors.
    ///
    /// The field selector sees `ID`, `CurrentState.Status` and
    /// `CurrentState.Host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot start the watch.
    pub async fn watch(
        &self,
        label: Selector,
        field: Selector,
        resource_version: u64,
    ) -> Result<FilteredWatch> {
        let inner = self.shared.registry.watch_pods(resource_version).await?;
        Ok(FilteredWatch::new(inner, label, field))
    }
}

impl Shared {
    fn has_info_source(&self) -> bool {
        self.info_cache.is_some() || self.live_info.is_some()
    }

    /// Choose a host and persist the pod there, one create at a time.
    async fn place(&self, pod: Pod) -> Result<()> {
        let _placement = self.placement.lock().await;

        let machine = self.scheduler.schedule(&pod, self.minions.as_ref()).await?;
        let pod_id = pod.id.clone();
        self.registry.create_pod(&machine, pod).await?;

        info!(pod_id = %pod_id, host = %machine, "Placed pod");
        Ok(())
    }

    async fn get(&self, pod_id: &PodId) -> Result<Option<Pod>> {
        let Some(mut pod) = self.registry.get_pod(pod_id).await? else {
            return Ok(None);
        };

        if self.has_info_source() {
            enrich(
                &mut pod,
                self.info_cache.as_deref(),
                self.live_info.as_deref(),
            )
            .await;
        }

        if let Some(host) = pod.host().map(str::to_owned) {
            pod.current_state.host_ip = locate(self.cloud.as_deref(), &host)
                .await
                .map(|ip| ip.to_string());
        }

        Ok(Some(pod))
    }

    /// Poll until `pod` reaches a terminal status.
    async fn wait_for_pod(&self, pod: Pod) -> Result<Option<Pod>> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;

            let Some(current) = self.get(&pod.id).await? else {
                debug!(pod_id = %pod.id, attempts, "Pod disappeared while waiting");
                return Ok(None);
            };
            if current.id != pod.id {
                return Err(ControlError::UnexpectedObject {
                    expected: pod.id,
                    found: current.id,
                });
            }

            let status = current.current_state.status;
            if status.is_terminal() {
                info!(pod_id = %pod.id, status = %status, attempts, "Pod converged");
                return Ok(Some(pod));
            }
            if self.max_poll_attempts.is_some_and(|max| attempts >= max) {
                return Err(ControlError::PollLimitExceeded {
                    pod_id: pod.id,
                    attempts,
                });
            }

            debug!(pod_id = %pod.id, status = %status, attempts, "Waiting for pod");
            tokio::time::sleep(self.poll_period).await;
        }
    }
}
