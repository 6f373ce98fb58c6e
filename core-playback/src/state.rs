//! Playback and stream classification states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable state of the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No session, or the last session failed.
    #[default]
    Idle,
    /// Session created, waiting for the engine to become ready.
    Preparing,
    /// One or more seeks are in flight.
    Seeking,
    /// Playing at a non-zero rate.
    Playing,
    /// Paused (rate zero).
    Paused,
    /// Playback stalled for lack of data.
    Stalled,
    /// The item played to its end.
    Ended,
}

impl PlaybackState {
    /// Returns `true` while playback runs or is paused, the only states in
    /// which segment tracking follows the play head.
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    /// Returns `true` if a session is loaded and ready to accept seeks.
    pub fn accepts_seeks(&self) -> bool {
        !matches!(self, PlaybackState::Idle | PlaybackState::Preparing)
    }

    /// Resolve Playing or Paused from an engine rate.
    pub fn from_rate(rate: f64) -> Self {
        if rate == 0.0 {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Preparing => "preparing",
            PlaybackState::Seeking => "seeking",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stalled => "stalled",
            PlaybackState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Kind of stream loaded in the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// Not known yet (no engine, or no seekable range reported).
    Unknown,
    /// Finite media.
    OnDemand,
    /// Live stream without a usable DVR window.
    Live,
    /// Live stream with time shifting.
    Dvr,
}

impl StreamType {
    pub fn is_live_like(&self) -> bool {
        matches!(self, StreamType::Live | StreamType::Dvr)
    }
}
