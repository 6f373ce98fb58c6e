//! Media engine bridge traits and supporting timeline types.
//!
//! The core never decodes, buffers or renders anything itself. It drives a
//! host-provided [`MediaEngine`] through a narrow control surface and consumes
//! the engine's observations as tagged [`EngineEvent`] values. Host
//! applications ship one [`MediaEngineFactory`] which creates a fresh engine
//! for every playback session.
//!
//! ## Threading
//!
//! Engines are driven from a single cooperative thread. The traits therefore
//! carry no `Send`/`Sync` bounds, and every event an engine produces must be
//! delivered back on that same thread, either through
//! [`MediaEngine::poll_events`] (events raised while a call executes) or by
//! the host forwarding it to the controller later.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Tolerance value meaning "no constraint" for a seek.
pub const UNBOUNDED_TOLERANCE: Duration = Duration::MAX;

/// Content locator handed to the engine factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Remote HTTP(S) stream (on-demand, live or DVR) fetched by the engine.
    RemoteStream {
        url: String,
        headers: HashMap<String, String>,
    },
}

impl MediaSource {
    /// Remote stream without extra headers.
    pub fn remote(url: impl Into<String>) -> Self {
        MediaSource::RemoteStream {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Local file source.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        MediaSource::LocalFile { path: path.into() }
    }

    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::RemoteStream { .. })
    }

    /// Printable locator (URL or path). Callers logging it should redact it first.
    pub fn locator(&self) -> String {
        match self {
            MediaSource::LocalFile { path } => path.display().to_string(),
            MediaSource::RemoteStream { url, .. } => url.clone(),
        }
    }
}

/// Unique identifier for one playback session.
///
/// Engines tag nothing themselves; the controller hands the id to the factory
/// so asynchronous hosts can route late events back with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Half-open media time range `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Range spanning `start..end`. An `end` before `start` yields an empty range.
    pub fn from_bounds(start: Duration, end: Duration) -> Self {
        Self {
            start,
            duration: end.saturating_sub(start),
        }
    }

    /// Zero-length range located at `start`.
    pub fn empty_at(start: Duration) -> Self {
        Self {
            start,
            duration: Duration::ZERO,
        }
    }

    pub fn end(&self) -> Duration {
        self.start.saturating_add(self.duration)
    }

    pub fn is_empty(&self) -> bool {
        self.duration.is_zero()
    }

    /// Returns `true` if `time` lies in `[start, end)`.
    pub fn contains(&self, time: Duration) -> bool {
        time >= self.start && time < self.end()
    }
}

/// Readiness of the item loaded into an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed(BridgeError),
}

/// Kind of content the loaded item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Not known yet, or no item loaded.
    #[default]
    Unknown,
    /// The item has at least one video track.
    Video,
    /// Audio only.
    Audio,
}

/// Identifier of a seek issued to an engine, echoed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeekId(pub u64);

/// Seek instruction with tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub id: SeekId,
    pub time: Duration,
    pub tolerance_before: Duration,
    pub tolerance_after: Duration,
}

impl SeekRequest {
    pub fn new(
        id: SeekId,
        time: Duration,
        tolerance_before: Duration,
        tolerance_after: Duration,
    ) -> Self {
        Self {
            id,
            time,
            tolerance_before,
            tolerance_after,
        }
    }

    /// Zero tolerance on both sides.
    pub fn precise(id: SeekId, time: Duration) -> Self {
        Self::new(id, time, Duration::ZERO, Duration::ZERO)
    }

    /// Unbounded tolerance on both sides.
    pub fn efficient(id: SeekId, time: Duration) -> Self {
        Self::new(id, time, UNBOUNDED_TOLERANCE, UNBOUNDED_TOLERANCE)
    }

    pub fn is_precise(&self) -> bool {
        self.tolerance_before.is_zero() && self.tolerance_after.is_zero()
    }
}

/// Identity of the dispatch queue a periodic observer wants its ticks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueId(pub u32);

impl QueueId {
    /// The cooperative (main) thread.
    pub const MAIN: QueueId = QueueId(0);
}

impl Default for QueueId {
    fn default() -> Self {
        Self::MAIN
    }
}

/// Engine-side handle for an installed periodic time observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineObserverId(pub u64);

/// Observations raised by an engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Item readiness changed.
    StatusChanged(ItemStatus),
    /// Playback rate changed (`0.0` means paused or starved).
    RateChanged(f64),
    /// Playback stalled for lack of data.
    Stalled,
    /// The item played to its end.
    PlayedToEnd,
    /// Playback failed after the item had loaded.
    Failed(BridgeError),
    /// A seek finished. `finished` is `false` when it was interrupted.
    SeekCompleted { id: SeekId, finished: bool },
    /// A periodic observer fired.
    PeriodicTick {
        observer: EngineObserverId,
        time: Duration,
    },
}

/// Platform media engine driven by the core.
pub trait MediaEngine {
    /// Begin or resume playback.
    fn play(&mut self);

    /// Pause playback.
    fn pause(&mut self);

    /// Start a seek. Completion is reported with [`EngineEvent::SeekCompleted`]
    /// carrying `request.id`, either queued for [`poll_events`](Self::poll_events)
    /// or delivered later by the host.
    fn seek(&mut self, request: SeekRequest);

    /// Current play head position.
    fn current_time(&self) -> Duration;

    /// Current playback rate.
    fn rate(&self) -> f64;

    /// Readiness of the loaded item.
    fn item_status(&self) -> ItemStatus;

    /// Seekable ranges, in ascending order.
    fn seekable_time_ranges(&self) -> Vec<TimeRange>;

    /// Item duration, `None` when indefinite (live streams).
    fn duration(&self) -> Option<Duration>;

    /// Content kind of the loaded item, once its tracks are known.
    fn media_type(&self) -> MediaType {
        MediaType::Unknown
    }

    /// Install a periodic time observer.
    fn add_periodic_time_observer(&mut self, interval: Duration, queue: QueueId)
        -> EngineObserverId;

    /// Remove a periodic time observer. Unknown ids are ignored.
    fn remove_periodic_time_observer(&mut self, observer: EngineObserverId);

    /// Drain events raised synchronously by previous calls.
    fn poll_events(&mut self) -> Vec<EngineEvent> {
        Vec::new()
    }
}

/// Creates engines and hosts their lifecycle hooks.
pub trait MediaEngineFactory {
    /// Create the engine for a new session, loading `source`.
    fn create(&self, session: PlaybackSessionId, source: &MediaSource) -> Box<dyn MediaEngine>;

    /// Apply host configuration. Called right after creation and on every
    /// configuration reload.
    fn configure(&self, _engine: &mut dyn MediaEngine) {}

    /// Called right before the engine of `session` is dropped.
    fn destroyed(&self, _session: PlaybackSessionId) {}
}
