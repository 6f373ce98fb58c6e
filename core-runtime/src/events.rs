//! # Event Bus System
//!
//! Provides typed event broadcasting built on `tokio::sync::broadcast`.
//! Each controller instance owns its own bus, so independent players (and
//! independent tests) never share a process-wide notification center.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **EventBus**: Broadcast channel for publishing one event type
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **EventSink**: Injectable publishing seam, implemented by the bus and by
//!   plain closures
//! - **BusEvent**: Description and severity metadata for logging/filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   publish    ┌───────────┐    subscribe    ┌────────────┐
//! │ Controller ├─────────────>│ EventBus  ├────────────────>│ Transport  │
//! └─────┬──────┘              │ (broadcast│                 │ UI         │
//!       │                     │  channel) ├────────────────>│ Analytics  │
//!       │ publish             └───────────┘                 └────────────┘
//!       v
//! ┌────────────┐
//! │ Extra sinks│  (closures, recorders)
//! └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, EventSink};
//!
//! let bus: EventBus<String> = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//!
//! bus.publish("state changed".to_string());
//! assert_eq!(receiver.try_recv().unwrap(), "state changed");
//! ```
//!
//! ## Error Handling
//!
//! Receivers can observe two errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind by `n` events.
//!   Non-fatal; the subscriber continues with newer events.
//! - **`RecvError::Closed`**: every sender was dropped (controller gone).
//!
//! Publishing never fails from the publisher's point of view: an event with
//! no subscriber is simply dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for an event bus channel.
///
/// Subscribers that fall further behind receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

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

/// Metadata every published event type provides.
pub trait BusEvent: Clone {
    /// Human-readable description of the event.
    fn description(&self) -> &str;

    /// Severity used for filtering and log routing.
    fn severity(&self) -> EventSeverity {
        EventSeverity::Debug
    }
}

/// Injectable publishing seam.
///
/// Publishing is synchronous: a sink observes events in exactly the order the
/// publisher produced them.
pub trait EventSink<E> {
    fn publish(&self, event: E);
}

impl<E, F> EventSink<E> for F
where
    F: Fn(&E),
{
    fn publish(&self, event: E) {
        self(&event)
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast bus for one event type.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends usable outside any async runtime
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. `CoreConfig` validation rejects that value
    /// before a controller ever builds its bus.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: E) -> Result<usize, SendError<E>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<E> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E: Clone> EventSink<E> for EventBus<E> {
    fn publish(&self, event: E) {
        // No subscriber is not an error for the publisher.
        let _ = self.emit(event);
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream<E> {
    receiver: Receiver<E>,
    filter: Option<EventFilter<E>>,
}

impl<E: Clone> EventStream<E> {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<E>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter are returned by `recv()` and `try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &E) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<E, RecvError>> {
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

    /// Drains every matching event currently buffered.
    ///
    /// Events the bus overwrote before this stream read them are lost; the
    /// drain logs how many and continues with the oldest retained event.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Some(Ok(event)) => events.push(event),
                Some(Err(RecvError::Lagged(missed))) => {
                    tracing::warn!(missed, "event stream lagged, oldest events dropped");
                }
                Some(Err(_)) | None => break,
            }
        }
        events
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
