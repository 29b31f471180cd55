//! Toast notifications
//!
//! [`ToastCenter`] is the default [`NotificationSink`]: it keeps the list of
//! messages on screen for the host UI to render and drops each one after the
//! configured duration.

use bridge_traits::notify::{NotificationSink, Severity};
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use core_runtime::events::{CoreEvent, EventBus, NotificationEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Toasts kept on screen at once; showing another evicts the oldest.
pub const MAX_ACTIVE_TOASTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ToastCenter {
    inner: Arc<Inner>,
}

struct Inner {
    toasts: Mutex<Vec<Toast>>,
    next_id: AtomicU64,
    duration: Duration,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl ToastCenter {
    /// Toasts shown from inside a tokio runtime are dropped after `duration`.
    ///
    /// Without a runtime nothing expires on its own; the list then only
    /// shrinks through [`dismiss`](Self::dismiss) or by eviction once
    /// [`MAX_ACTIVE_TOASTS`] is reached.
    pub fn new(duration: Duration, events: EventBus) -> Self {
        Self::with_clock(duration, events, Arc::new(SystemClock))
    }

    pub fn with_clock(duration: Duration, events: EventBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                toasts: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                duration,
                clock,
                events,
            }),
        }
    }

    /// Display a message and return its id.
    ///
    /// Outside a tokio runtime the toast stays until dismissed.
    pub fn show(&self, severity: Severity, message: impl Into<String>) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let toast = Toast {
            id,
            severity,
            message: message.into(),
            created_at: self.inner.clock.now(),
        };

        debug!(id, %severity, message = %toast.message, "Toast shown");
        let event = CoreEvent::Notification(NotificationEvent::Shown {
            id,
            severity,
            message: toast.message.clone(),
        });
        let evicted: Vec<u64> = {
            let mut toasts = self.lock();
            toasts.push(toast);
            let excess = toasts.len().saturating_sub(MAX_ACTIVE_TOASTS);
            toasts.drain(..excess).map(|t| t.id).collect()
        };
        self.inner.events.publish(event);
        for evicted_id in evicted {
            debug!(id = evicted_id, "Toast evicted");
            self.inner
                .events
                .publish(CoreEvent::Notification(NotificationEvent::Dismissed {
                    id: evicted_id,
                }));
        }

        if let Ok(handle) = Handle::try_current() {
            let weak: Weak<Inner> = Arc::downgrade(&self.inner);
            let duration = self.inner.duration;
            handle.spawn(async move {
                tokio::time::sleep(duration).await;
                if let Some(inner) = weak.upgrade() {
                    ToastCenter { inner }.dismiss(id);
                }
            });
        }

        id
    }

    /// Remove a toast early. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let removed = {
            let mut toasts = self.lock();
            let before = toasts.len();
            toasts.retain(|t| t.id != id);
            toasts.len() != before
        };

        if removed {
            debug!(id, "Toast dismissed");
            self.inner
                .events
                .publish(CoreEvent::Notification(NotificationEvent::Dismissed { id }));
        }
        removed
    }

    /// Toasts on screen, oldest first
    pub fn active(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Toast>> {
        self.inner
            .toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for ToastCenter {
    fn notify(&self, severity: Severity, message: &str) {
        self.show(severity, message);
    }
}
