//! # Event Bus System
//!
//! Provides an event-driven architecture for the admin client core using
//! `tokio::sync::broadcast`. Components publish what happened (the backend went
//! offline, a credential was wiped, a navigation was redirected, a toast was
//! shown) and any number of observers, typically the host UI, react to it.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies per concern
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ```text
//! ┌──────────────────────┐  emit   ┌───────────┐
//! │ Response interceptor ├────────>│           │
//! └──────────────────────┘         │           │  subscribe  ┌─────────┐
//! ┌──────────────────────┐  emit   │ EventBus  ├────────────>│ Host UI │
//! │ Router / guard       ├────────>│           │             └─────────┘
//! └──────────────────────┘         │           │
//! ┌──────────────────────┐  emit   │           │
//! │ Toast center         ├────────>│           │
//! └──────────────────────┘         └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ConnectivityEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus.publish(CoreEvent::Connectivity(ConnectivityEvent::WentOffline));
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event, CoreEvent::Connectivity(ConnectivityEvent::WentOffline));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two types of errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Publishers inside the core use [`EventBus::publish`], which treats "no
//! subscriber" as a normal condition.

use bridge_traits::notify::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Backend reachability transitions
    Connectivity(ConnectivityEvent),
    /// Credential lifecycle
    Session(SessionEvent),
    /// Route transitions
    Navigation(NavigationEvent),
    /// Toast lifecycle
    Notification(NotificationEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Connectivity(e) => e.description(),
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Navigation(e) => e.description(),
            CoreEvent::Notification(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Connectivity(ConnectivityEvent::WentOffline) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::Expired { .. }) => EventSeverity::Warning,
            CoreEvent::Navigation(NavigationEvent::HardReload { .. }) => EventSeverity::Warning,
            CoreEvent::Connectivity(ConnectivityEvent::BackOnline) => EventSeverity::Info,
            CoreEvent::Session(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Connectivity Events
// ============================================================================

/// Emitted only when the `offline` flag actually changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ConnectivityEvent {
    /// A request or probe received no response.
    WentOffline,
    /// A response arrived after the backend was considered offline.
    BackOnline,
}

impl ConnectivityEvent {
    fn description(&self) -> &str {
        match self {
            ConnectivityEvent::WentOffline => "Backend unreachable",
            ConnectivityEvent::BackOnline => "Backend reachable again",
        }
    }
}

// ============================================================================
// Session Events
// ============================================================================

/// Why a stored credential was removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    /// The user signed out.
    SignedOut,
    /// The server answered 401 to an authenticated call.
    Unauthorized,
    /// The token-validation request failed during navigation.
    ValidationFailed,
}

/// Events related to the stored session credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A credential was persisted after a successful login.
    CredentialStored,
    /// Both credential keys were removed from storage.
    CredentialCleared {
        /// What triggered the removal.
        reason: ClearReason,
    },
    /// A 401 arrived while `route` was displayed; a hard reload follows.
    Expired {
        /// Route active when the session expired.
        route: Option<String>,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::CredentialStored => "Session credential stored",
            SessionEvent::CredentialCleared { .. } => "Session credential cleared",
            SessionEvent::Expired { .. } => "Session expired",
        }
    }
}

// ============================================================================
// Navigation Events
// ============================================================================

/// Events related to route transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NavigationEvent {
    /// The router settled on `to`.
    Completed {
        /// Route left, if any.
        from: Option<String>,
        /// Route now displayed.
        to: String,
    },
    /// The guard sent the user somewhere else.
    Redirected {
        /// Route originally asked for.
        requested: String,
        /// Route the guard redirected to.
        to: String,
    },
    /// All in-memory UI state must be discarded and the client restarted at `path`.
    HardReload {
        /// Entry path of the restarted client.
        path: String,
    },
}

impl NavigationEvent {
    fn description(&self) -> &str {
        match self {
            NavigationEvent::Completed { .. } => "Navigation completed",
            NavigationEvent::Redirected { .. } => "Navigation redirected",
            NavigationEvent::HardReload { .. } => "Client restart requested",
        }
    }
}

// ============================================================================
// Notification Events
// ============================================================================

/// Events related to user-facing toasts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NotificationEvent {
    /// A toast became visible.
    Shown {
        /// Toast identifier, unique per toast center.
        id: u64,
        /// Toast severity.
        severity: Severity,
        /// Text shown to the user.
        message: String,
    },
    /// A toast was removed, either by timeout or explicitly.
    Dismissed {
        /// Toast identifier.
        id: u64,
    },
}

impl NotificationEvent {
    fn description(&self) -> &str {
        match self {
            NotificationEvent::Shown { .. } => "Notification shown",
            NotificationEvent::Dismissed { .. } => "Notification dismissed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Cloning is cheap; every clone publishes into the same channel.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, SessionEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let event_bus = EventBus::new(100);
/// let mut subscriber = event_bus.subscribe();
///
/// event_bus.publish(CoreEvent::Session(SessionEvent::CredentialStored));
/// assert!(subscriber.recv().await.is_ok());
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Publishes an event, ignoring the absence of subscribers.
    pub fn publish(&self, event: CoreEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event dropped: no subscribers");
        }
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let navigation_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Navigation(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every buffered event that passes the filter.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(id: u64) -> CoreEvent {
        CoreEvent::Notification(NotificationEvent::Shown {
            id,
            severity: Severity::Error,
            message: "Server unavailable. Check your connection.".to_string(),
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_errors_but_publish_does_not() {
        let bus = EventBus::new(10);
        let event = CoreEvent::Connectivity(ConnectivityEvent::WentOffline);

        assert!(bus.emit(event.clone()).is_err());
        bus.publish(event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Navigation(NavigationEvent::Redirected {
            requested: "home".to_string(),
            to: "login".to_string(),
        });

        assert_eq!(bus.emit(event.clone()).unwrap(), 2);
        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, CoreEvent::Session(_)));

        bus.publish(shown(1));
        let session_event = CoreEvent::Session(SessionEvent::CredentialCleared {
            reason: ClearReason::Unauthorized,
        });
        bus.publish(session_event.clone());

        assert_eq!(stream.recv().await.unwrap(), session_event);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for id in 0..5 {
            bus.publish(shown(id));
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            CoreEvent::Connectivity(ConnectivityEvent::WentOffline).severity(),
            EventSeverity::Error
        );
        assert_eq!(
            CoreEvent::Session(SessionEvent::Expired {
                route: Some("clientes".to_string())
            })
            .severity(),
            EventSeverity::Warning
        );
        assert_eq!(
            CoreEvent::Connectivity(ConnectivityEvent::BackOnline).severity(),
            EventSeverity::Info
        );
        assert_eq!(shown(1).severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Navigation(NavigationEvent::HardReload {
            path: "/login".to_string(),
        });
        assert_eq!(event.description(), "Client restart requested");
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut stream = EventStream::new(bus.subscribe());

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for id in 0..10 {
                bus1.publish(shown(id));
            }
        });
        let handle2 = tokio::spawn(async move {
            for id in 0..10 {
                bus2.publish(CoreEvent::Notification(NotificationEvent::Dismissed { id }));
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        assert_eq!(stream.drain().len(), 20);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Session(SessionEvent::CredentialCleared {
            reason: ClearReason::ValidationFailed,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("validation_failed"));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }
}
