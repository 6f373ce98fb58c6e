//! # Player Events
//!
//! Everything a controller reports to its observers. Each controller owns its
//! own [`EventBus`](core_runtime::events::EventBus), so independent players
//! never see each other's events.
//!
//! Segments are referenced by [`SegmentHandle`]; resolve them through
//! [`MediaPlayerController::segment`](crate::MediaPlayerController::segment)
//! while the list they belong to is still installed.

use crate::segments::SegmentHandle;
use crate::state::PlaybackState;
use core_runtime::events::{BusEvent, EventSeverity};
use serde::{Deserialize, Serialize};

/// Events published by the playback controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    /// The playback state changed.
    PlaybackStateChanged {
        state: PlaybackState,
        previous_state: PlaybackState,
        /// The change resulted from an explicit segment selection.
        selected: bool,
    },

    /// The play head entered a segment.
    SegmentStarted {
        segment: SegmentHandle,
        previous_segment: Option<SegmentHandle>,
        selected: bool,
        selected_at_entry: bool,
    },

    /// The play head left a segment.
    SegmentEnded {
        segment: SegmentHandle,
        next_segment: Option<SegmentHandle>,
        /// Entry into the next segment is an explicit selection.
        selected: bool,
        /// The ending segment had been entered by explicit selection.
        selected_at_entry: bool,
        /// The segment was left by a jump rather than by reaching its end.
        interrupted: bool,
    },

    /// A blocked segment is about to be skipped.
    WillSkipBlockedSegment { segment: SegmentHandle },

    /// The seek past a blocked segment completed.
    DidSkipBlockedSegment { segment: SegmentHandle },

    /// The engine failed. The controller is back in `Idle`.
    PlaybackFailed { message: String },

    /// Picture in picture was started or stopped by the host.
    PictureInPictureStateChanged { active: bool },
}

impl PlayerEvent {
    /// The segment this event is about, if any.
    pub fn segment(&self) -> Option<SegmentHandle> {
        match self {
            PlayerEvent::SegmentStarted { segment, .. }
            | PlayerEvent::SegmentEnded { segment, .. }
            | PlayerEvent::WillSkipBlockedSegment { segment }
            | PlayerEvent::DidSkipBlockedSegment { segment } => Some(*segment),
            _ => None,
        }
    }
}

impl BusEvent for PlayerEvent {
    fn description(&self) -> &str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "Playback state changed",
            PlayerEvent::SegmentStarted { .. } => "Segment started",
            PlayerEvent::SegmentEnded { .. } => "Segment ended",
            PlayerEvent::WillSkipBlockedSegment { .. } => "Will skip blocked segment",
            PlayerEvent::DidSkipBlockedSegment { .. } => "Did skip blocked segment",
            PlayerEvent::PlaybackFailed { .. } => "Playback failed",
            PlayerEvent::PictureInPictureStateChanged { .. } => {
                "Picture in picture state changed"
            }
        }
    }

    fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::PlaybackFailed { .. } => EventSeverity::Error,
            PlayerEvent::PlaybackStateChanged { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}
