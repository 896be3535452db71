//! Selector filtering over a registry watch stream.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::{Stream, StreamExt};
use podreg_core::{Pod, Selector, WatchEvent};
use podreg_store::{StoreError, WatchStream};

/// Field name for the pod ID.
pub const FIELD_ID: &str = "ID";
/// Field name for the pod's derived status.
pub const FIELD_STATUS: &str = "CurrentState.Status";
/// Field name for the pod's current host.
pub const FIELD_HOST: &str = "CurrentState.Host";
/// Older spelling of [`FIELD_STATUS`]. Matches the same derived status.
pub const FIELD_DESIRED_STATUS: &str = "DesiredState.Status";
/// Older spelling of [`FIELD_HOST`]. Matches the same current host.
pub const FIELD_DESIRED_HOST: &str = "DesiredState.Host";

/// The fields of `pod` a field selector can match on.
///
/// Status and host are exposed under both their `CurrentState` and
/// `DesiredState` names.
#[must_use]
pub fn pod_fields(pod: &Pod) -> BTreeMap<String, String> {
    let status = pod.current_state.status.as_str().to_string();
    let host = pod.current_state.host.clone().unwrap_or_default();
    BTreeMap::from([
        (FIELD_ID.to_string(), pod.id.to_string()),
        (FIELD_STATUS.to_string(), status.clone()),
        (FIELD_DESIRED_STATUS.to_string(), status),
        (FIELD_HOST.to_string(), host.clone()),
        (FIELD_DESIRED_HOST.to_string(), host),
    ])
}

/// A watch stream that yields only events whose pod matches both a label
/// selector and a field selector.
///
/// Events pass through unchanged and in order. Upstream errors are yielded
/// as-is, and the stream ends when upstream ends.
pub struct FilteredWatch {
    inner: WatchStream,
    label: Selector,
    field: Selector,
}

impl FilteredWatch {
    /// Filter `inner` by `label` and `field`.
    #[must_use]
    pub fn new(inner: WatchStream, label: Selector, field: Selector) -> Self {
        Self {
            inner,
            label,
            field,
        }
    }

    fn matches(&self, event: &WatchEvent) -> bool {
        self.label.matches(&event.object.labels) && self.field.matches(&pod_fields(&event.object))
    }
}

impl Stream for FilteredWatch {
    type Item = Result<WatchEvent, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(event)) if !self.matches(&event) => {}
                other => return Poll::Ready(other),
            }
        }
    }
}
