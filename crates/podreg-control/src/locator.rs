//! Host address lookup through the cloud provider.

use std::net::IpAddr;

use podreg_scheduler::CloudProvider;
use tracing::error;

/// Resolve `host` to an address.
///
/// The cloud is queried with the host name cut at its first `.`. Returns
/// `None` when there is no cloud, the cloud has no instance support, or the
/// lookup fails; a failed lookup is logged.
pub async fn locate(cloud: Option<&dyn CloudProvider>, host: &str) -> Option<IpAddr> {
    let instances = cloud?.instances()?;
    let short = host.split('.').next().unwrap_or(host);

    match instances.ip_address(short).await {
        Ok(ip) => Some(ip),
        Err(e) => {
            error!(host = %host, instance = %short, error = %e, "Failed to resolve host address");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podreg_scheduler::MockCloud;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn no_cloud() {
        assert_eq!(locate(None, "host1").await, None);
    }

    #[tokio::test]
    async fn cloud_without_instances() {
        let cloud = MockCloud::without_instances();
        assert_eq!(locate(Some(&cloud), "host1").await, None);
    }

    #[tokio::test]
    async fn strips_domain_before_lookup() {
        let cloud = MockCloud::with_instances([("host1", ip("10.0.0.1"))]);

        assert_eq!(locate(Some(&cloud), "host1.zone").await, Some(ip("10.0.0.1")));
        assert_eq!(
            locate(Some(&cloud), "host1.zone.example.com").await,
            Some(ip("10.0.0.1"))
        );
        assert_eq!(cloud.lookups(), vec!["host1", "host1"]);
    }

    #[tokio::test]
    async fn failed_lookup_is_none() {
        let cloud = MockCloud::with_instances([("host1", ip("10.0.0.1"))]);
        assert_eq!(locate(Some(&cloud), "host2").await, None);
        assert_eq!(cloud.lookups(), vec!["host2"]);
    }
}
