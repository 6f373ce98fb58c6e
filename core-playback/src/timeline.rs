//! Time range and live computations derived from engine observations.

use crate::state::StreamType;
use bridge_traits::TimeRange;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Overall seekable range: first range start to last range end.
///
/// For live streams (indefinite duration) the range collapses to empty when
/// the DVR window is shorter than `minimum_dvr_window`.
pub fn seekable_range(
    ranges: &[TimeRange],
    duration: Option<Duration>,
    minimum_dvr_window: Duration,
) -> TimeRange {
    let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
        return TimeRange::default();
    };

    let range = TimeRange::from_bounds(first.start, last.end());
    if duration.is_none() && range.duration < minimum_dvr_window {
        TimeRange::empty_at(range.start)
    } else {
        range
    }
}

/// Classify a stream from its engine observations and effective time range.
pub fn stream_type(ranges: &[TimeRange], duration: Option<Duration>, range: TimeRange) -> StreamType {
    if ranges.is_empty() {
        return StreamType::Unknown;
    }

    match duration {
        Some(_) => StreamType::OnDemand,
        None if range.is_empty() => StreamType::Live,
        None => StreamType::Dvr,
    }
}

/// Whether the play head is live. DVR streams count as live within
/// `tolerance` of the live edge.
pub fn is_live(stream_type: StreamType, range: TimeRange, current_time: Duration, tolerance: Duration) -> bool {
    match stream_type {
        StreamType::Live => true,
        StreamType::Dvr => range.end().saturating_sub(current_time) < tolerance,
        StreamType::OnDemand | StreamType::Unknown => false,
    }
}

/// Wall-clock date of the play head for live and DVR streams.
pub fn playhead_date(
    stream_type: StreamType,
    range: TimeRange,
    current_time: Duration,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !stream_type.is_live_like() {
        return None;
    }

    let behind_edge = range.end().saturating_sub(current_time);
    let behind_edge = chrono::Duration::from_std(behind_edge).ok()?;
    now.checked_sub_signed(behind_edge)
}
