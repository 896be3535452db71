//! Runtime info enrichment for pod reads.

use podreg_core::{Pod, PodId, PodInfo, NETWORK_CONTAINER};
use tracing::{debug, error, warn};

use crate::info_client::{InfoError, PodInfoGetter};
use crate::status;

/// Fill in runtime info and pod IP for `pod`, then recompute its status.
///
/// The cache is asked first; the live source is asked when the cache has
/// nothing or there is no cache. A pod without a host is not queried.
/// Lookup failures are logged and leave the pod's info as it was.
pub async fn enrich(
    pod: &mut Pod,
    cache: Option<&dyn PodInfoGetter>,
    live: Option<&dyn PodInfoGetter>,
) {
    if let Some(host) = pod.host().map(str::to_owned) {
        let mut info = None;
        if let Some(cache) = cache {
            info = query(cache, &host, &pod.id).await;
        }
        if info.is_none() {
            if let Some(live) = live {
                info = query(live, &host, &pod.id).await;
            }
        }

        if let Some(info) = info {
            if let Some(ip) = network_ip(&info, &pod.id) {
                pod.current_state.pod_ip = Some(ip);
            }
            pod.current_state.info = Some(info);
        }
    }

    pod.current_state.status = status::pod_status(pod);
}

async fn query(source: &dyn PodInfoGetter, host: &str, pod_id: &PodId) -> Option<PodInfo> {
    match source.get_pod_info(host, pod_id).await {
        Ok(info) => Some(info),
        Err(InfoError::NotAvailable) => {
            debug!(pod_id = %pod_id, host = %host, "Pod info not available yet");
            None
        }
        Err(e) => {
            error!(pod_id = %pod_id, host = %host, error = %e, "Failed to get pod info");
            None
        }
    }
}

/// The pod IP, as reported by the network container.
fn network_ip(info: &PodInfo, pod_id: &PodId) -> Option<String> {
    let Some(net) = info.get(NETWORK_CONTAINER) else {
        warn!(pod_id = %pod_id, "No network container in pod info");
        return None;
    };

    match net.network_settings.as_ref() {
        Some(settings) => Some(settings.ip_address.clone()),
        None => {
            warn!(pod_id = %pod_id, "Network container has no network settings");
            None
        }
    }
}
