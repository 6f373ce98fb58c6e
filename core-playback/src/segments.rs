//! # Segments
//!
//! Logical sub-ranges of the media timeline and the index that owns them.
//!
//! Segments are addressed through [`SegmentHandle`]s: an index into the list
//! plus the generation of the list it was issued for. Replacing the list bumps
//! the generation, so every handle into the old list stops resolving at once.
//! Two segments with identical ranges are still distinct: identity is the
//! handle, never the value.

use bridge_traits::TimeRange;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A named sub-range `[start, start + duration)` of the media timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub start: Duration,
    pub duration: Duration,
    /// Playback must never dwell inside a blocked segment.
    #[serde(default)]
    pub blocked: bool,
    /// Hidden segments are excluded from user-facing listings.
    #[serde(default)]
    pub hidden: bool,
    /// Opaque host data.
    #[serde(default)]
    pub user_info: HashMap<String, String>,
}

impl Segment {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self {
            start,
            duration,
            ..Default::default()
        }
    }

    /// Segment spanning `start..end`.
    pub fn between(start: Duration, end: Duration) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_user_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_info.insert(key.into(), value.into());
        self
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.duration)
    }

    pub fn end(&self) -> Duration {
        self.range().end()
    }

    pub fn contains(&self, time: Duration) -> bool {
        self.range().contains(time)
    }
}

/// Non-owning reference to a segment of a specific segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentHandle {
    pub generation: u64,
    pub index: u32,
}

/// Ordered segment list of a session.
///
/// Order matters for overlapping ranges: [`locate`](Self::locate) returns the
/// first match.
#[derive(Debug)]
pub struct SegmentIndex {
    generation: u64,
    segments: Vec<Segment>,
    visible: OnceCell<Vec<SegmentHandle>>,
}

impl SegmentIndex {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            segments,
            visible: OnceCell::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Install a new list. Handles issued for the previous list stop resolving.
    pub fn replace(&mut self, segments: Vec<Segment>) {
        *self = Self::new(segments);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, handle: SegmentHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: SegmentHandle) -> Option<&Segment> {
        if handle.generation != self.generation {
            return None;
        }
        self.segments.get(handle.index as usize)
    }

    pub fn handle_at(&self, index: usize) -> Option<SegmentHandle> {
        (index < self.segments.len()).then(|| SegmentHandle {
            generation: self.generation,
            index: index as u32,
        })
    }

    /// First segment whose range contains `time`.
    pub fn locate(&self, time: Duration) -> Option<SegmentHandle> {
        self.segments
            .iter()
            .position(|segment| segment.contains(time))
            .and_then(|index| self.handle_at(index))
    }

    /// Segments with `hidden == false`, computed on first use.
    pub fn visible(&self) -> &[SegmentHandle] {
        self.visible.get_or_init(|| {
            self.iter()
                .filter(|(_, segment)| !segment.hidden)
                .map(|(handle, _)| handle)
                .collect()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentHandle, &Segment)> {
        let generation = self.generation;
        self.segments.iter().enumerate().map(move |(index, segment)| {
            (
                SegmentHandle {
                    generation,
                    index: index as u32,
                },
                segment,
            )
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_blocked(&self, handle: SegmentHandle) -> bool {
        self.get(handle).map(|segment| segment.blocked).unwrap_or(false)
    }
}

impl Default for SegmentIndex {
    fn default() -> Self {
        Self::empty()
    }
}
