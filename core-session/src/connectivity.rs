//! Backend reachability and in-flight request flags.

use core_runtime::events::{ConnectivityEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Process-wide connectivity flags
///
/// Readable by anyone; only the interceptors write to it. Clones share state.
#[derive(Clone)]
pub struct ConnectivityState {
    inner: Arc<Inner>,
}

struct Inner {
    offline: watch::Sender<bool>,
    request_in_progress: watch::Sender<bool>,
    events: EventBus,
}

impl ConnectivityState {
    /// Starts online with no request in flight.
    pub fn new(events: EventBus) -> Self {
        let (offline, _) = watch::channel(false);
        let (request_in_progress, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                offline,
                request_in_progress,
                events,
            }),
        }
    }

    pub fn is_offline(&self) -> bool {
        *self.inner.offline.borrow()
    }

    pub fn is_request_in_progress(&self) -> bool {
        *self.inner.request_in_progress.borrow()
    }

    /// Observe the `offline` flag.
    pub fn watch_offline(&self) -> watch::Receiver<bool> {
        self.inner.offline.subscribe()
    }

    /// Observe the "request in progress" flag.
    pub fn watch_request_in_progress(&self) -> watch::Receiver<bool> {
        self.inner.request_in_progress.subscribe()
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        let previous = self.inner.offline.send_replace(offline);
        if previous == offline {
            return;
        }

        let event = if offline {
            info!("Backend unreachable, switching to offline");
            ConnectivityEvent::WentOffline
        } else {
            info!("Backend reachable again");
            ConnectivityEvent::BackOnline
        };
        self.inner.events.publish(CoreEvent::Connectivity(event));
    }

    pub(crate) fn set_request_in_progress(&self, in_progress: bool) {
        self.inner.request_in_progress.send_replace(in_progress);
    }
}

impl std::fmt::Debug for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityState")
            .field("offline", &self.is_offline())
            .field("request_in_progress", &self.is_request_in_progress())
            .finish()
    }
}
