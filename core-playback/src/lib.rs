//! # Playback Orchestration Module
//!
//! Drives a host media engine and reconciles its asynchronous events into a
//! deterministic sequence of playback states.
//!
//! ## Overview
//!
//! This module handles:
//! - The playback state machine ([`MediaPlayerController`])
//! - Segment tracking with enter/leave events and blocked segment skipping
//! - Periodic time observers shared among callbacks
//! - Time range, live and DVR computations
//!
//! Decoding, buffering and rendering belong to the host engine, reached only
//! through [`bridge_traits::MediaEngine`].

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod observers;
pub mod segments;
pub mod session;
pub mod state;
pub mod timeline;
pub mod tracker;

pub use config::PlayerSettings;
pub use controller::MediaPlayerController;
pub use error::{PlayerError, Result};
pub use events::PlayerEvent;
pub use observers::{ObserverToken, PeriodicCallback, PeriodicObserverMultiplexer};
pub use segments::{Segment, SegmentHandle, SegmentIndex};
pub use session::{PlaybackRequest, ReadyHandler, SeekHandler};
pub use state::{PlaybackState, StreamType};
pub use tracker::{SegmentTracker, SegmentTransition};
