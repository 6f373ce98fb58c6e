//! # Player Settings
//!
//! Tunables of the playback controller. Durations travel as milliseconds on
//! the wire so hosts can ship settings as plain JSON.

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback controller settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// DVR windows shorter than this are treated as pure live streams and
    /// their time range collapses to empty.
    ///
    /// Default: 0 (any window counts as DVR).
    #[serde(default, with = "millis")]
    pub minimum_dvr_window_length: Duration,

    /// Distance from the live edge within which a DVR stream is still live.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_live_tolerance", with = "millis")]
    pub live_tolerance: Duration,

    /// Interval of the internal tick driving segment tracking.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_segment_tick_interval", with = "millis")]
    pub segment_tick_interval: Duration,

    /// Offset past a blocked segment's end where skips land.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_blocked_segment_skip_margin", with = "millis")]
    pub blocked_segment_skip_margin: Duration,

    /// Offset added to a target segment's start when it overrides the start time.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_segment_start_offset", with = "millis")]
    pub segment_start_offset: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            minimum_dvr_window_length: Duration::ZERO,
            live_tolerance: default_live_tolerance(),
            segment_tick_interval: default_segment_tick_interval(),
            blocked_segment_skip_margin: default_blocked_segment_skip_margin(),
            segment_start_offset: default_segment_start_offset(),
        }
    }
}

impl PlayerSettings {
    /// Validate settings values.
    pub fn validate(&self) -> Result<()> {
        if self.segment_tick_interval.is_zero() {
            return Err(PlayerError::InvalidSettings(
                "segment_tick_interval must be > 0".to_string(),
            ));
        }

        // A zero margin would land skips exactly on the blocked segment's end,
        // which seek rounding can pull back inside it.
        if self.blocked_segment_skip_margin.is_zero() {
            return Err(PlayerError::InvalidSettings(
                "blocked_segment_skip_margin must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: PlayerSettings = serde_json::from_str(json)
            .map_err(|e| PlayerError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_live_tolerance() -> Duration {
    Duration::from_secs(30)
}

fn default_segment_tick_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_blocked_segment_skip_margin() -> Duration {
    Duration::from_millis(100)
}

fn default_segment_start_offset() -> Duration {
    Duration::from_millis(100)
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
