//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback orchestration core
//! and the platform it runs on. The core owns no decoder, renderer or network
//! stack: everything it needs from the host is expressed here.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaEngine`](media::MediaEngine) - Play/pause/seek control surface plus
//!   time, rate, readiness and seekable-range observation
//! - [`MediaEngineFactory`](media::MediaEngineFactory) - Per-session engine
//!   creation with configuration and destruction hooks
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Wall-clock source for live/DVR date computations
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Events
//!
//! Engines never mutate core state. They report observations as
//! [`EngineEvent`](media::EngineEvent) values, delivered on the cooperative
//! thread that drives the controller.
//!
//! ## Error Handling
//!
//! Engine failures are expressed with [`BridgeError`](error::BridgeError).
//! Implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Never include credentials from the content locator in messages
//!
//! ## Examples
//!
//! ### Implementing MediaEngineFactory
//!
//! ```ignore
//! use bridge_traits::media::{MediaEngine, MediaEngineFactory, MediaSource, MediaType, PlaybackSessionId};
//!
//! struct NativeFactory;
//!
//! impl MediaEngineFactory for NativeFactory {
//!     fn create(&self, session: PlaybackSessionId, source: &MediaSource) -> Box<dyn MediaEngine> {
//!         Box::new(NativeEngine::load(session, source))
//!     }
//!
//!     fn configure(&self, engine: &mut dyn MediaEngine) {
//!         // Apply audio session / external playback settings
//!     }
//! }
//! ```

pub mod error;
pub mod media;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use media::{
    EngineEvent, EngineObserverId, ItemStatus, MediaEngine, MediaEngineFactory, MediaSource,
    MediaType, PlaybackSessionId, QueueId, SeekId, SeekRequest, TimeRange, UNBOUNDED_TOLERANCE,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
