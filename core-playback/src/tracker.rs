//! # Segment Transition Tracker
//!
//! Follows the play head through the segment list and decides which segment
//! transitions happen. The tracker is pure bookkeeping: it returns the
//! transitions and lets the controller publish events and issue seeks.
//!
//! ## Invariants
//!
//! - A blocked segment is never current.
//! - `previous` is updated even for blocked candidates, so repeated ticks
//!   inside the same blocked range only ever request one skip.
//! - When one call yields both an end and a start, the end comes first.

use crate::segments::{SegmentHandle, SegmentIndex};

/// Outcome of a segment status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTransition {
    Ended {
        segment: SegmentHandle,
        next: Option<SegmentHandle>,
        selected: bool,
        selected_at_entry: bool,
        interrupted: bool,
    },
    Started {
        segment: SegmentHandle,
        previous: Option<SegmentHandle>,
        selected: bool,
        selected_at_entry: bool,
    },
    /// The candidate is blocked and must be skipped.
    Skip(SegmentHandle),
}

/// Segment cursor of the current session.
#[derive(Debug, Default, Clone)]
pub struct SegmentTracker {
    previous: Option<SegmentHandle>,
    current: Option<SegmentHandle>,
    target: Option<SegmentHandle>,
    selected: bool,
}

impl SegmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<SegmentHandle> {
        self.previous
    }

    pub fn current(&self) -> Option<SegmentHandle> {
        self.current
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The current segment, only if it was entered by explicit selection.
    pub fn selected_segment(&self) -> Option<SegmentHandle> {
        self.current.filter(|_| self.selected)
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Set the segment the next status update should enter explicitly.
    pub fn set_target(&mut self, target: Option<SegmentHandle>) {
        self.target = target;
    }

    /// Consume the pending target.
    pub fn take_target(&mut self) -> Option<SegmentHandle> {
        self.target.take()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// End the current segment because its list is going away, then clear.
    pub fn interrupt(&mut self) -> Option<SegmentTransition> {
        let ended = self.current.map(|segment| SegmentTransition::Ended {
            segment,
            next: None,
            selected: false,
            selected_at_entry: self.selected,
            interrupted: true,
        });
        self.clear();
        ended
    }

    /// Move the cursor to `candidate`.
    ///
    /// `explicit` marks a candidate reached by segment selection. `interrupted`
    /// tells whether leaving the previous segment is a jump rather than
    /// reaching its end.
    pub fn process_transition(
        &mut self,
        index: &SegmentIndex,
        candidate: Option<SegmentHandle>,
        explicit: bool,
        interrupted: bool,
    ) -> Vec<SegmentTransition> {
        if candidate == self.previous && !explicit {
            return Vec::new();
        }

        let mut transitions = Vec::with_capacity(2);
        let candidate_blocked = candidate.is_some_and(|c| index.is_blocked(c));
        let previous_playable = self.previous.filter(|p| !index.is_blocked(*p));

        if let Some(ending) = previous_playable {
            self.current = None;
            transitions.push(SegmentTransition::Ended {
                segment: ending,
                next: candidate.filter(|_| !candidate_blocked),
                selected: explicit,
                selected_at_entry: self.selected,
                interrupted,
            });
            self.selected = false;
        }

        if let Some(segment) = candidate {
            if candidate_blocked {
                transitions.push(SegmentTransition::Skip(segment));
            } else {
                self.current = Some(segment);
                self.selected = explicit;
                transitions.push(SegmentTransition::Started {
                    segment,
                    previous: previous_playable,
                    selected: explicit,
                    selected_at_entry: explicit,
                });
            }
        }

        self.previous = candidate;
        transitions
    }
}
