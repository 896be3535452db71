//! Derived pod status.
//!
//! A pod's status is computed from what the container runtime reports for
//! each desired container, never stored as truth.

use podreg_core::{Container, Pod, PodInfo, PodStatus};

/// Derive a status from runtime info, placement and the desired containers.
///
/// Each desired container counts as running, stopped, or unknown (absent
/// from `info`). Only an all-running or all-stopped pod leaves `Waiting`.
#[must_use]
pub fn derive_status(
    info: Option<&PodInfo>,
    host: Option<&str>,
    containers: &[Container],
) -> PodStatus {
    let (Some(info), Some(_)) = (info, host.filter(|h| !h.is_empty())) else {
        return PodStatus::Waiting;
    };

    let (mut running, mut stopped, mut unknown) = (0usize, 0usize, 0usize);
    for container in containers {
        match info.get(&container.name) {
            Some(c) if c.state.running => running += 1,
            Some(_) => stopped += 1,
            None => unknown += 1,
        }
    }

    match (running, stopped, unknown) {
        (r, 0, 0) if r > 0 => PodStatus::Running,
        (0, s, 0) if s > 0 => PodStatus::Terminated,
        _ => PodStatus::Waiting,
    }
}

/// Derive the status of `pod` from its own current state.
#[must_use]
pub fn pod_status(pod: &Pod) -> PodStatus {
    derive_status(
        pod.current_state.info.as_ref(),
        pod.host(),
        &pod.desired_state.manifest.containers,
    )
}
