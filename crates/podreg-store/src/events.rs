//! Replay-then-follow watch streams shared by the registry implementations.

use futures::stream::{self, StreamExt};
use podreg_core::WatchEvent;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{StoreError, WatchStream};

/// Default capacity of the live event channel.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Build a watch stream from logged events after `from` and a live receiver.
///
/// The receiver must be subscribed before `backlog` is read, so that no event
/// falls between the two. Events seen in both are yielded once.
pub(crate) fn follow(
    backlog: Vec<WatchEvent>,
    receiver: broadcast::Receiver<WatchEvent>,
    from: u64,
) -> WatchStream {
    let last_seen = backlog.last().map_or(from, WatchEvent::resource_version);
    let replay = stream::iter(backlog.into_iter().map(Ok));

    let live = stream::unfold(Some((receiver, last_seen)), |state| async move {
        let (mut receiver, mut last_seen) = state?;
        loop {
            match receiver.recv().await {
                Ok(event) if event.resource_version() <= last_seen => {}
                Ok(event) => {
                    last_seen = event.resource_version();
                    return Some((Ok(event), Some((receiver, last_seen))));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Pod watcher lagged, closing stream");
                    return Some((Err(StoreError::WatchLagged(skipped)), None));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    replay.chain(live).boxed()
}
