//! # Playback Sessions
//!
//! A [`PlaybackRequest`] describes what to play. Preparing it produces the
//! media context (source, segments, user info), which stays readable after
//! `stop`, and a [`PlaybackSession`] owning the engine, which does not.

use crate::controller::MediaPlayerController;
use crate::segments::{Segment, SegmentHandle, SegmentIndex};
use bridge_traits::{EngineObserverId, MediaEngine, MediaSource, PlaybackSessionId, SeekId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

/// One-shot handler called when preparation completes.
pub type ReadyHandler = Box<dyn FnOnce(&mut MediaPlayerController)>;

/// One-shot handler called when a seek completes, with its `finished` flag.
pub type SeekHandler = Box<dyn FnOnce(&mut MediaPlayerController, bool)>;

/// Everything needed to start one playback attempt.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub source: MediaSource,
    pub start_time: Duration,
    pub segments: Vec<Segment>,
    /// Index into `segments` of the segment to enter first.
    pub target_segment: Option<usize>,
    pub user_info: HashMap<String, String>,
}

impl PlaybackRequest {
    pub fn new(source: MediaSource) -> Self {
        Self {
            source,
            start_time: Duration::ZERO,
            segments: Vec::new(),
            target_segment: None,
            user_info: HashMap::new(),
        }
    }

    pub fn with_start_time(mut self, start_time: Duration) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    /// Start in the segment at `index`. Preparing a request whose target is
    /// not an index of its segment list panics.
    pub fn with_target_segment(mut self, index: usize) -> Self {
        self.target_segment = Some(index);
        self
    }

    pub fn with_user_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_info.insert(key.into(), value.into());
        self
    }
}

/// Media loaded by the last `prepare`.
#[derive(Debug)]
pub(crate) struct MediaContext {
    pub source: MediaSource,
    pub segments: SegmentIndex,
    pub user_info: HashMap<String, String>,
}

/// What a pending seek is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeekKind {
    /// Reaching the start position during preparation.
    Start,
    /// Requested by the caller.
    User,
    /// Skipping past a blocked segment.
    Skip(SegmentHandle),
}

pub(crate) struct PendingSeek {
    pub kind: SeekKind,
    pub on_done: Option<SeekHandler>,
}

/// The live engine and per-attempt start state.
pub(crate) struct PlaybackSession {
    pub id: PlaybackSessionId,
    pub engine: Box<dyn MediaEngine>,
    pub start_time: Duration,
    pub on_ready: Option<ReadyHandler>,
    /// Readiness was already acted upon.
    pub started: bool,
    pub pending_seeks: BTreeMap<SeekId, PendingSeek>,
    pub segment_observer: EngineObserverId,
}

impl PlaybackSession {
    pub fn has_pending_seeks(&self) -> bool {
        !self.pending_seeks.is_empty()
    }

    pub fn has_pending_start_seek(&self) -> bool {
        self.pending_seeks
            .values()
            .any(|pending| pending.kind == SeekKind::Start)
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("start_time", &self.start_time)
            .field("awaiting_ready", &self.on_ready.is_some())
            .field("started", &self.started)
            .field("pending_seeks", &self.pending_seeks.len())
            .finish()
    }
}
