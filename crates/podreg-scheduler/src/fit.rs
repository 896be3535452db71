//! First-fit placement by host-port availability.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use podreg_core::{Pod, Selector};
use podreg_store::Registry;
use tracing::debug;

use crate::{MinionLister, Result, Scheduler, SchedulerError};

/// Places a pod on the first minion where none of its host ports are taken.
pub struct FirstFitScheduler {
    registry: Arc<dyn Registry>,
}

impl FirstFitScheduler {
    /// Create a scheduler that reads existing placements from `registry`.
    #[must_use]
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Host ports in use, per host.
    async fn ports_in_use(&self) -> Result<HashMap<String, BTreeSet<u16>>> {
        let pods = self.registry.list_pods(&Selector::everything()).await?;

        let mut in_use: HashMap<String, BTreeSet<u16>> = HashMap::new();
        for pod in &pods {
            let Some(host) = pod.host().or(pod.desired_state.host.as_deref()) else {
                continue;
            };
            in_use
                .entry(host.to_string())
                .or_default()
                .extend(pod.host_ports());
        }

        Ok(in_use)
    }
}

#[async_trait]
impl Scheduler for FirstFitScheduler {
    async fn schedule(&self, pod: &Pod, minions: &dyn MinionLister) -> Result<String> {
        let minions = minions.list().await?;
        if minions.is_empty() {
            return Err(SchedulerError::NoMinions);
        }

        let wanted: BTreeSet<u16> = pod.host_ports().collect();
        let in_use = self.ports_in_use().await?;

        let chosen = minions.into_iter().find(|minion| {
            in_use
                .get(minion)
                .map_or(true, |ports| ports.is_disjoint(&wanted))
        });

        match chosen {
            Some(host) => {
                debug!(pod_id = %pod.id, host = %host, "Placed pod");
                Ok(host)
            }
            None => Err(SchedulerError::NoFit(pod.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticMinionLister;
    use podreg_core::{Container, Port};
    use podreg_store::MemoryRegistry;

    fn pod_with_host_port(id: &str, host_port: u16) -> Pod {
        let port = Port {
            container_port: 80,
            host_port: Some(host_port),
            ..Port::default()
        };
        Pod::new(id, vec![Container::new("web", "nginx").with_port(port)])
    }

    #[tokio::test]
    async fn picks_first_minion_when_empty() {
        let registry = Arc::new(MemoryRegistry::new());
        let scheduler = FirstFitScheduler::new(registry);
        let minions = StaticMinionLister::new(["node-a", "node-b"]);

        let host = scheduler
            .schedule(&pod_with_host_port("web", 8080), &minions)
            .await
            .unwrap();
        assert_eq!(host, "node-a");
    }

    #[tokio::test]
    async fn skips_minion_with_port_conflict() {
        let registry = Arc::new(MemoryRegistry::new());
        registry
            .create_pod("node-a", pod_with_host_port("existing", 8080))
            .await
            .unwrap();
        let scheduler = FirstFitScheduler::new(registry);
        let minions = StaticMinionLister::new(["node-a", "node-b"]);

        let host = scheduler
            .schedule(&pod_with_host_port("web", 8080), &minions)
            .await
            .unwrap();
        assert_eq!(host, "node-b");
    }

    #[tokio::test]
    async fn different_ports_share_a_minion() {
        let registry = Arc::new(MemoryRegistry::new());
        registry
            .create_pod("node-a", pod_with_host_port("existing", 8080))
            .await
            .unwrap();
        let scheduler = FirstFitScheduler::new(registry);
        let minions = StaticMinionLister::new(["node-a"]);

        let host = scheduler
            .schedule(&pod_with_host_port("web", 9090), &minions)
            .await
            .unwrap();
        assert_eq!(host, "node-a");
    }

    #[tokio::test]
    async fn no_fit() {
        let registry = Arc::new(MemoryRegistry::new());
        registry
            .create_pod("node-a", pod_with_host_port("existing", 8080))
            .await
            .unwrap();
        let scheduler = FirstFitScheduler::new(registry);
        let minions = StaticMinionLister::new(["node-a"]);

        let err = scheduler
            .schedule(&pod_with_host_port("web", 8080), &minions)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoFit(id) if id.as_str() == "web"));
    }

    #[tokio::test]
    async fn no_minions() {
        let scheduler = FirstFitScheduler::new(Arc::new(MemoryRegistry::new()));
        let err = scheduler
            .schedule(&pod_with_host_port("web", 8080), &StaticMinionLister::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoMinions));
        assert!(!err.is_retriable());
    }
}
