//! Mock scheduler and cloud for testing.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use podreg_core::{Pod, PodId};

use crate::cloud::{CloudError, CloudProvider, Instances};
use crate::{MinionLister, Result, Scheduler, SchedulerError};

/// A scheduler that places every pod on the first listed minion.
///
/// Records the pods it was asked to place and how many `schedule` calls
/// overlapped.
#[derive(Default)]
pub struct MockScheduler {
    delay: Option<Duration>,
    fail: Mutex<bool>,
    scheduled: Mutex<Vec<PodId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockScheduler {
    /// Create a new mock scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every `schedule` call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every following `schedule` call fail with `NoMinions`.
    pub fn fail(&self) {
        *self.fail.lock() = true;
    }

    /// Number of `schedule` calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.scheduled.lock().len()
    }

    /// Pods passed to `schedule`, in call order.
    #[must_use]
    pub fn scheduled(&self) -> Vec<PodId> {
        self.scheduled.lock().clone()
    }

    /// Most `schedule` calls ever running at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scheduler for MockScheduler {
    async fn schedule(&self, pod: &Pod, minions: &dyn MinionLister) -> Result<String> {
        self.scheduled.lock().push(pod.id.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let fail = *self.fail.lock();
        let result = if fail {
            Err(SchedulerError::NoMinions)
        } else {
            minions
                .list()
                .await
                .and_then(|hosts| hosts.into_iter().next().ok_or(SchedulerError::NoMinions))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A cloud with a fixed instance table.
#[derive(Default)]
pub struct MockCloud {
    supports_instances: bool,
    addresses: HashMap<String, IpAddr>,
    lookups: Mutex<Vec<String>>,
}

impl MockCloud {
    /// A cloud that answers instance queries from `addresses`.
    #[must_use]
    pub fn with_instances<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = (S, IpAddr)>,
        S: Into<String>,
    {
        Self {
            supports_instances: true,
            addresses: addresses
                .into_iter()
                .map(|(name, ip)| (name.into(), ip))
                .collect(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// A cloud without instance support.
    #[must_use]
    pub fn without_instances() -> Self {
        Self::default()
    }

    /// Names passed to `ip_address`, in call order.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl Instances for MockCloud {
    async fn ip_address(&self, name: &str) -> std::result::Result<IpAddr, CloudError> {
        self.lookups.lock().push(name.to_string());
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| CloudError::InstanceNotFound(name.to_string()))
    }
}

impl CloudProvider for MockCloud {
    fn instances(&self) -> Option<&dyn Instances> {
        if self.supports_instances {
            Some(self)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticMinionLister;
    use podreg_core::Container;

    #[tokio::test]
    async fn mock_scheduler_uses_first_minion() {
        let scheduler = MockScheduler::new();
        let pod = Pod::new("web", vec![Container::new("web", "nginx")]);
        let minions = StaticMinionLister::new(["m1", "m2"]);

        let host = scheduler.schedule(&pod, &minions).await.unwrap();
        assert_eq!(host, "m1");
        assert_eq!(scheduler.scheduled(), vec![PodId::new("web")]);
        assert_eq!(scheduler.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn mock_scheduler_failure() {
        let scheduler = MockScheduler::new();
        scheduler.fail();
        let pod = Pod::new("web", vec![Container::new("web", "nginx")]);

        let err = scheduler
            .schedule(&pod, &StaticMinionLister::new(["m1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoMinions));
        assert_eq!(scheduler.call_count(), 1);
    }

    #[tokio::test]
    async fn mock_cloud_lookups() {
        let ip: IpAddr = "10.1.2.3".parse().unwrap();
        let cloud = MockCloud::with_instances([("host1", ip)]);
        let instances = cloud.instances().unwrap();

        assert_eq!(instances.ip_address("host1").await.unwrap(), ip);
        assert!(instances.ip_address("host2").await.is_err());
        assert_eq!(cloud.lookups(), vec!["host1", "host2"]);

        assert!(MockCloud::without_instances().instances().is_none());
    }
}
