//! # Media Player Controller
//!
//! The playback state machine. It owns one media engine per session, turns
//! the engine's asynchronous observations into a deterministic sequence of
//! [`PlaybackState`]s, follows the play head through the segment list and
//! skips blocked segments.
//!
//! ## Threading
//!
//! The controller is neither `Send` nor `Sync`: every operation and every
//! engine event runs on the thread that created it, and no locks are taken.
//!
//! ## Event Processing
//!
//! Engine events enter an inbox and are processed one at a time by a work
//! loop. Events an engine raises while the controller is calling into it are
//! collected through [`MediaEngine::poll_events`] after each step and queued
//! behind the current one. Handlers that call back into the controller from
//! inside the loop only enqueue work, so a chain of seeks over any number of
//! contiguous blocked segments runs at constant stack depth.
//!
//! Every queued event is tagged with the session it belongs to. Events for a
//! session that has since been stopped or replaced are discarded.
//!
//! ## Example
//!
//! ```ignore
//! let mut controller = MediaPlayerController::new(config, PlayerSettings::default())?;
//! let mut events = controller.subscribe();
//!
//! controller.play_source(
//!     PlaybackRequest::new(MediaSource::remote("https://example.com/vod.m3u8"))
//!         .with_segments(chapters),
//! );
//!
//! // Later, from the host's engine callbacks
//! controller.handle_engine_event(session_id, EngineEvent::Stalled);
//! ```

use crate::config::PlayerSettings;
use crate::error::{PlayerError, Result};
use crate::events::PlayerEvent;
use crate::observers::{ObserverToken, PeriodicObserverMultiplexer};
use crate::segments::{Segment, SegmentHandle, SegmentIndex};
use crate::session::{
    MediaContext, PendingSeek, PlaybackRequest, PlaybackSession, ReadyHandler, SeekHandler,
    SeekKind,
};
use crate::state::{PlaybackState, StreamType};
use crate::timeline;
use crate::tracker::{SegmentTracker, SegmentTransition};
use bridge_traits::{
    BridgeError, EngineEvent, ItemStatus, MediaSource, MediaType, PlaybackSessionId, QueueId,
    SeekId, SeekRequest, TimeRange, UNBOUNDED_TOLERANCE,
};
use chrono::{DateTime, Utc};
use core_runtime::config::CoreConfig;
use core_runtime::events::{BusEvent, EventBus, EventSink, EventStream};
use core_runtime::logging::{redact_if_sensitive, redact_locator};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How the play head reached the position a segment update looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateCause {
    /// Continuous playback.
    Progress,
    /// Seek or preparation.
    Jump,
}

#[derive(Debug, Default)]
struct SegmentUpdate {
    skip: Option<SegmentHandle>,
    selected: bool,
}

/// Playback orchestration engine.
pub struct MediaPlayerController {
    config: CoreConfig,
    settings: PlayerSettings,
    bus: EventBus<PlayerEvent>,
    sinks: Vec<Box<dyn EventSink<PlayerEvent>>>,
    media: Option<MediaContext>,
    session: Option<PlaybackSession>,
    tracker: SegmentTracker,
    observers: PeriodicObserverMultiplexer,
    state: PlaybackState,
    seek_start_time: Option<Duration>,
    seek_target_time: Option<Duration>,
    last_error: Option<PlayerError>,
    inbox: VecDeque<(PlaybackSessionId, EngineEvent)>,
    draining: bool,
    next_seek_id: u64,
}

impl MediaPlayerController {
    /// Create an idle controller.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::InvalidSettings`] if `settings` fail validation.
    pub fn new(config: CoreConfig, settings: PlayerSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_parts(config, settings))
    }

    /// Create an idle controller with default settings.
    pub fn with_default_settings(config: CoreConfig) -> Self {
        Self::from_parts(config, PlayerSettings::default())
    }

    fn from_parts(config: CoreConfig, settings: PlayerSettings) -> Self {
        Self {
            bus: EventBus::new(config.event_buffer_size),
            config,
            settings,
            sinks: Vec::new(),
            media: None,
            session: None,
            tracker: SegmentTracker::new(),
            observers: PeriodicObserverMultiplexer::new(),
            state: PlaybackState::Idle,
            seek_start_time: None,
            seek_target_time: None,
            last_error: None,
            inbox: VecDeque::new(),
            draining: false,
            next_seek_id: 0,
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Subscribe to the controller's events.
    ///
    /// The bus keeps the last `event_buffer_size` events per subscriber. A
    /// long run of blocked skips can exceed that between two reads; the
    /// stream then reports `Lagged` and continues with the oldest retained
    /// event. Use [`add_event_sink`](Self::add_event_sink) to see every event.
    pub fn subscribe(&self) -> EventStream<PlayerEvent> {
        EventStream::new(self.bus.subscribe())
    }

    /// Add a synchronous event sink. Sinks see events in publication order.
    pub fn add_event_sink(&mut self, sink: impl EventSink<PlayerEvent> + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Re-publish a picture in picture change reported by the host.
    pub fn notify_picture_in_picture_state(&mut self, active: bool) {
        self.post(PlayerEvent::PictureInPictureStateChanged { active });
    }

    fn post(&self, event: PlayerEvent) {
        trace!(event = event.description(), "posting player event");
        for sink in &self.sinks {
            sink.publish(event.clone());
        }
        self.bus.publish(event);
    }

    fn post_transition(&self, transition: SegmentTransition) {
        let event = match transition {
            SegmentTransition::Ended {
                segment,
                next,
                selected,
                selected_at_entry,
                interrupted,
            } => {
                debug!(?segment, ?next, interrupted, "segment ended");
                PlayerEvent::SegmentEnded {
                    segment,
                    next_segment: next,
                    selected,
                    selected_at_entry,
                    interrupted,
                }
            }
            SegmentTransition::Started {
                segment,
                previous,
                selected,
                selected_at_entry,
            } => {
                debug!(?segment, ?previous, selected, "segment started");
                PlayerEvent::SegmentStarted {
                    segment,
                    previous_segment: previous,
                    selected,
                    selected_at_entry,
                }
            }
            SegmentTransition::Skip(_) => return,
        };
        self.post(event);
    }

    // ========================================================================
    // Session Lifecycle
    // ========================================================================

    /// Start a new playback session.
    ///
    /// Any current session is torn down first, as if [`stop`](Self::stop) had
    /// been called. `on_ready` runs once the engine is ready and the start
    /// position reached; the controller then enters `Playing` or `Paused`
    /// according to the engine rate unless the handler changed the state.
    ///
    /// # Panics
    ///
    /// Panics if the request's target segment is not an index of its segment
    /// list.
    pub fn prepare(&mut self, request: PlaybackRequest, on_ready: Option<ReadyHandler>) {
        let PlaybackRequest {
            source,
            start_time,
            segments,
            target_segment,
            user_info,
        } = request;

        if let Some(index) = target_segment {
            assert!(
                index < segments.len(),
                "target segment {index} is not part of the {} supplied segments",
                segments.len()
            );
        }

        self.teardown();
        self.last_error = None;

        let segments = SegmentIndex::new(segments);
        let target = target_segment.and_then(|index| segments.handle_at(index));
        let start_time = target
            .and_then(|handle| segments.get(handle))
            .map_or(start_time, |segment| {
                segment.start.saturating_add(self.settings.segment_start_offset)
            });

        let id = PlaybackSessionId::new();
        info!(
            session = %id,
            locator = %redact_locator(&source.locator()),
            start_ms = start_time.as_millis() as u64,
            segments = segments.len(),
            "preparing playback"
        );
        for (key, value) in &user_info {
            debug!(
                session = %id,
                key = %key,
                value = %redact_if_sensitive(key, value),
                "user info"
            );
        }

        let factory = self.config.engine_factory.clone();
        let mut engine = factory.create(id, &source);
        factory.configure(engine.as_mut());
        self.observers.attach_all(engine.as_mut());
        let segment_observer =
            engine.add_periodic_time_observer(self.settings.segment_tick_interval, QueueId::MAIN);
        let already_ready = engine.item_status() == ItemStatus::ReadyToPlay;

        self.media = Some(MediaContext {
            source,
            segments,
            user_info,
        });
        self.tracker.set_target(target);
        self.session = Some(PlaybackSession {
            id,
            engine,
            start_time,
            on_ready,
            started: false,
            pending_seeks: BTreeMap::new(),
            segment_observer,
        });
        self.set_state(PlaybackState::Preparing, false);

        if already_ready {
            self.inbox
                .push_back((id, EngineEvent::StatusChanged(ItemStatus::ReadyToPlay)));
        }
        self.pump();
    }

    /// Prepare `source` starting in the segment at `index`. An index outside
    /// `segments` starts at the default location instead.
    pub fn prepare_at_index(
        &mut self,
        source: MediaSource,
        index: usize,
        segments: Vec<Segment>,
        user_info: HashMap<String, String>,
        on_ready: Option<ReadyHandler>,
    ) {
        let mut request = PlaybackRequest::new(source).with_segments(segments);
        request.user_info = user_info;
        if index < request.segments.len() {
            request.target_segment = Some(index);
        } else {
            debug!(index, "segment index out of range, starting at default location");
        }
        self.prepare(request, on_ready);
    }

    /// Prepare `request` and start playing once ready.
    pub fn play_source(&mut self, request: PlaybackRequest) {
        self.prepare(
            request,
            Some(Box::new(|controller: &mut MediaPlayerController| {
                controller.play()
            })),
        );
    }

    /// Tear down the session and return to `Idle`. The media context
    /// (source, segments, user info) stays readable.
    pub fn stop(&mut self) {
        if self.session.is_none() && self.state == PlaybackState::Idle {
            return;
        }
        info!(session = ?self.session_id(), "stopping playback");
        self.teardown();
    }

    /// Like [`stop`](Self::stop), but also forget the media context.
    pub fn reset(&mut self) {
        if self.session.is_none() && self.state == PlaybackState::Idle && self.media.is_none() {
            return;
        }
        info!(session = ?self.session_id(), "resetting player");
        self.teardown();
        self.media = None;
        self.last_error = None;
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            self.observers.detach_all(session.engine.as_mut());
            session
                .engine
                .remove_periodic_time_observer(session.segment_observer);
            debug!(
                session = %session.id,
                pending_seeks = session.pending_seeks.len(),
                "destroying engine"
            );
            self.config.engine_factory.destroyed(session.id);
        }

        self.inbox.clear();
        self.tracker.clear();
        self.set_state(PlaybackState::Idle, false);
    }

    fn fail(&mut self, error: BridgeError) {
        let error = PlayerError::PlaybackFailed(error);
        warn!(session = ?self.session_id(), %error, "playback failed");

        self.teardown();
        let message = error.to_string();
        self.last_error = Some(error);
        self.post(PlayerEvent::PlaybackFailed { message });
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Resume playback. After the end of the media, playback restarts from
    /// the start of the time range.
    pub fn play(&mut self) {
        if self.state == PlaybackState::Ended {
            let start = self.time_range().start;
            debug!(start_ms = start.as_millis() as u64, "replaying from start");
            self.seek(
                start,
                UNBOUNDED_TOLERANCE,
                UNBOUNDED_TOLERANCE,
                None,
                Some(Box::new(|controller: &mut MediaPlayerController, _: bool| {
                    controller.play()
                })),
            );
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.engine.play();
        self.pump();
    }

    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.engine.pause();
        self.pump();
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.engine.rate() == 0.0 {
            self.play();
        } else {
            self.pause();
        }
    }

    // ========================================================================
    // Seeking
    // ========================================================================

    /// Seek to `time` within the given tolerances.
    ///
    /// When `target` is given, that segment is entered as an explicit
    /// selection once the seek completes. A destination inside a blocked
    /// segment is turned into a skip past it. Ignored while `Idle`, while
    /// `Preparing` until the ready handler runs, and for targets not in the
    /// current segment list; the handler is then dropped without being
    /// called.
    pub fn seek(
        &mut self,
        time: Duration,
        tolerance_before: Duration,
        tolerance_after: Duration,
        target: Option<SegmentHandle>,
        on_done: Option<SeekHandler>,
    ) {
        if !self.accepts_seeks() {
            debug!(state = %self.state, "seek ignored");
            return;
        }
        let Some(media) = self.media.as_ref() else {
            return;
        };
        if target.is_some_and(|handle| !media.segments.contains(handle)) {
            debug!(?target, "seek ignored, segment not in the current list");
            return;
        }

        let destination = target.or_else(|| media.segments.locate(time));
        if let Some(blocked) = destination.filter(|handle| media.segments.is_blocked(*handle)) {
            let transitions = self.tracker.process_transition(
                &media.segments,
                Some(blocked),
                target.is_some(),
                true,
            );
            for transition in transitions {
                self.post_transition(transition);
            }
            self.skip_blocked(blocked, on_done);
            self.pump();
            return;
        }

        self.tracker.set_target(target);
        let seek_id = self.allocate_seek_id();
        self.issue_seek(
            SeekRequest::new(seek_id, time, tolerance_before, tolerance_after),
            SeekKind::User,
            on_done,
            target.is_some(),
        );
        self.pump();
    }

    /// Seek with unbounded tolerance.
    pub fn seek_efficiently(&mut self, time: Duration, on_done: Option<SeekHandler>) {
        self.seek(time, UNBOUNDED_TOLERANCE, UNBOUNDED_TOLERANCE, None, on_done);
    }

    /// Seek with zero tolerance.
    pub fn seek_precisely(&mut self, time: Duration, on_done: Option<SeekHandler>) {
        self.seek(time, Duration::ZERO, Duration::ZERO, None, on_done);
    }

    /// Select `segment`: seek to its start and enter it explicitly. Unknown
    /// segments are ignored.
    pub fn seek_to_segment(&mut self, segment: SegmentHandle, on_done: Option<SeekHandler>) {
        let Some(start) = self.segment(segment).map(|s| s.start) else {
            debug!(?segment, "seek to unknown segment ignored");
            return;
        };
        let time = start.saturating_add(self.settings.segment_start_offset);
        self.seek(time, Duration::ZERO, Duration::ZERO, Some(segment), on_done);
    }

    /// Select the segment at `index`. Out of range indices are ignored.
    pub fn seek_to_segment_at_index(&mut self, index: usize, on_done: Option<SeekHandler>) {
        let Some(handle) = self
            .media
            .as_ref()
            .and_then(|media| media.segments.handle_at(index))
        else {
            debug!(index, "segment index out of range, seek ignored");
            return;
        };
        self.seek_to_segment(handle, on_done);
    }

    /// Seeks need a loaded item. While preparing, that is once the engine
    /// reported readiness and the start position was reached, which is when
    /// the ready handler runs.
    fn accepts_seeks(&self) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        match self.state {
            PlaybackState::Preparing => session.started && !session.has_pending_start_seek(),
            state => state.accepts_seeks(),
        }
    }

    fn allocate_seek_id(&mut self) -> SeekId {
        self.next_seek_id += 1;
        SeekId(self.next_seek_id)
    }

    fn issue_seek(
        &mut self,
        request: SeekRequest,
        kind: SeekKind,
        on_done: Option<SeekHandler>,
        selected: bool,
    ) {
        let Some(current_time) = self.session.as_ref().map(|s| s.engine.current_time()) else {
            return;
        };

        if kind != SeekKind::Start {
            if self.state != PlaybackState::Seeking {
                self.set_state(PlaybackState::Seeking, selected);
                self.seek_start_time = Some(current_time);
            }
            self.seek_target_time = Some(request.time);
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        debug!(
            seek = request.id.0,
            time_ms = request.time.as_millis() as u64,
            precise = request.is_precise(),
            ?kind,
            "issuing seek"
        );
        session
            .pending_seeks
            .insert(request.id, PendingSeek { kind, on_done });
        session.engine.seek(request);
    }

    fn skip_blocked(&mut self, segment: SegmentHandle, on_done: Option<SeekHandler>) {
        let Some(end) = self.segment(segment).map(Segment::end) else {
            return;
        };

        debug!(?segment, end_ms = end.as_millis() as u64, "skipping blocked segment");
        self.post(PlayerEvent::WillSkipBlockedSegment { segment });

        let landing = end.saturating_add(self.settings.blocked_segment_skip_margin);
        let request = SeekRequest::precise(self.allocate_seek_id(), landing);
        self.issue_seek(request, SeekKind::Skip(segment), on_done, false);
    }

    // ========================================================================
    // Engine Events
    // ========================================================================

    /// Deliver an event raised asynchronously by the engine of `session`.
    /// Events for any other session are discarded.
    pub fn handle_engine_event(&mut self, session: PlaybackSessionId, event: EngineEvent) {
        self.inbox.push_back((session, event));
        self.pump();
    }

    fn pump(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;

        loop {
            self.collect_engine_events();
            let Some((session, event)) = self.inbox.pop_front() else {
                break;
            };
            if self.session_id() != Some(session) {
                trace!(session = %session, ?event, "discarding event of stale session");
                continue;
            }
            self.process_engine_event(event);
        }

        self.draining = false;
    }

    fn collect_engine_events(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let id = session.id;
            self.inbox
                .extend(session.engine.poll_events().into_iter().map(|event| (id, event)));
        }
    }

    fn process_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::StatusChanged(ItemStatus::ReadyToPlay) => self.on_item_ready(),
            EngineEvent::StatusChanged(ItemStatus::Failed(error)) | EngineEvent::Failed(error) => {
                self.fail(error)
            }
            EngineEvent::StatusChanged(ItemStatus::Unknown) => {}
            EngineEvent::RateChanged(rate) => self.on_rate_changed(rate),
            EngineEvent::Stalled => {
                if self.state.is_active() {
                    self.set_state(PlaybackState::Stalled, false);
                }
            }
            EngineEvent::PlayedToEnd => {
                if self.state.is_active() || self.state == PlaybackState::Stalled {
                    self.set_state(PlaybackState::Ended, false);
                }
            }
            EngineEvent::SeekCompleted { id, finished } => self.on_seek_completed(id, finished),
            EngineEvent::PeriodicTick { observer, time } => {
                let is_segment_tick = self
                    .session
                    .as_ref()
                    .is_some_and(|session| session.segment_observer == observer);

                if is_segment_tick {
                    if self.state.is_active() {
                        trace!(time_ms = time.as_millis() as u64, "segment tick");
                        let update = self.update_segment_status(time, UpdateCause::Progress);
                        if let Some(blocked) = update.skip {
                            self.skip_blocked(blocked, None);
                        }
                    }
                } else if !self.observers.dispatch(observer, time) {
                    trace!(observer = observer.0, "tick for unknown observer");
                }
            }
        }
    }

    fn on_item_ready(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if self.state != PlaybackState::Preparing || session.started {
            return;
        }
        session.started = true;
        let start_time = session.start_time;

        if start_time.is_zero() && !self.tracker.has_target() {
            self.finish_preparation();
        } else {
            let request = SeekRequest::precise(self.allocate_seek_id(), start_time);
            self.issue_seek(request, SeekKind::Start, None, false);
        }
    }

    fn finish_preparation(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.id;
        let on_ready = session.on_ready.take();
        info!(session = %id, "playback ready");

        if let Some(on_ready) = on_ready {
            on_ready(self);
        }

        // The handler may have stopped playback or prepared another session.
        if self.state == PlaybackState::Preparing && self.session_id() == Some(id) {
            let state = PlaybackState::from_rate(self.rate());
            self.enter_active_state(state, UpdateCause::Jump);
        }
    }

    fn on_rate_changed(&mut self, rate: f64) {
        match self.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                let state = PlaybackState::from_rate(rate);
                if state != self.state {
                    self.enter_active_state(state, UpdateCause::Progress);
                }
            }
            PlaybackState::Stalled if rate == 0.0 => {
                debug!("rate dropped while stalled, resuming");
                if let Some(session) = self.session.as_mut() {
                    session.engine.play();
                }
            }
            PlaybackState::Stalled => {
                self.enter_active_state(PlaybackState::Playing, UpdateCause::Progress);
            }
            _ => {}
        }
    }

    fn on_seek_completed(&mut self, id: SeekId, finished: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(pending) = session.pending_seeks.remove(&id) else {
            debug!(seek = id.0, "completion of unknown seek ignored");
            return;
        };
        let settled = !session.has_pending_seeks();
        debug!(seek = id.0, finished, settled, kind = ?pending.kind, "seek completed");

        if settled {
            match pending.kind {
                SeekKind::Start => self.finish_preparation(),
                SeekKind::User | SeekKind::Skip(_) => {
                    if self.state == PlaybackState::Seeking {
                        let state = PlaybackState::from_rate(self.rate());
                        self.enter_active_state(state, UpdateCause::Jump);
                    }
                }
            }
        }

        if let SeekKind::Skip(segment) = pending.kind {
            debug!(?segment, "blocked segment skipped");
            self.post(PlayerEvent::DidSkipBlockedSegment { segment });
        }
        if let Some(on_done) = pending.on_done {
            on_done(self, finished);
        }
    }

    // ========================================================================
    // State & Segment Tracking
    // ========================================================================

    fn set_state(&mut self, state: PlaybackState, selected: bool) {
        if state == self.state {
            return;
        }
        let previous_state = std::mem::replace(&mut self.state, state);
        if state != PlaybackState::Seeking {
            self.seek_start_time = None;
            self.seek_target_time = None;
        }

        debug!(session = ?self.session_id(), from = %previous_state, to = %state, "playback state changed");
        self.post(PlayerEvent::PlaybackStateChanged {
            state,
            previous_state,
            selected,
        });
    }

    /// Enter `Playing` or `Paused`, updating segment status first so
    /// observers of the state change see the matching current segment. A
    /// blocked landing segment is skipped instead and the state stays (or
    /// becomes) `Seeking`.
    fn enter_active_state(&mut self, state: PlaybackState, cause: UpdateCause) {
        debug_assert!(state.is_active());

        let update = self.update_segment_status(self.current_time(), cause);
        match update.skip {
            Some(blocked) => self.skip_blocked(blocked, None),
            None => self.set_state(state, update.selected),
        }
    }

    fn update_segment_status(&mut self, time: Duration, cause: UpdateCause) -> SegmentUpdate {
        let Some(media) = self.media.as_ref() else {
            return SegmentUpdate::default();
        };
        let segments = &media.segments;

        let (candidate, explicit) = match self.tracker.take_target() {
            Some(target) => (Some(target), true),
            None => (segments.locate(time), false),
        };
        let interrupted = cause == UpdateCause::Jump
            || self
                .tracker
                .previous()
                .and_then(|previous| segments.get(previous))
                .is_some_and(|previous| time < previous.end());

        let transitions = self
            .tracker
            .process_transition(segments, candidate, explicit, interrupted);

        let mut update = SegmentUpdate {
            skip: None,
            selected: explicit,
        };
        for transition in transitions {
            match transition {
                SegmentTransition::Skip(blocked) => update.skip = Some(blocked),
                other => self.post_transition(other),
            }
        }
        update
    }

    /// Replace the segment list of the current media.
    ///
    /// The current segment ends as interrupted, handles into the old list
    /// stop resolving, and segment status is recomputed when playing or
    /// paused.
    pub fn set_segments(&mut self, segments: Vec<Segment>) {
        if self.media.is_none() {
            return;
        }
        if let Some(ended) = self.tracker.interrupt() {
            self.post_transition(ended);
        }
        if let Some(media) = self.media.as_mut() {
            media.segments.replace(segments);
            debug!(segments = media.segments.len(), "segment list replaced");
        }

        if self.state.is_active() {
            let update = self.update_segment_status(self.current_time(), UpdateCause::Jump);
            if let Some(blocked) = update.skip {
                self.skip_blocked(blocked, None);
            }
        }
        self.pump();
    }

    // ========================================================================
    // Periodic Observers
    // ========================================================================

    /// Call `callback` with the play head position every `interval`.
    ///
    /// Registrations survive `stop`, `reset` and new sessions.
    pub fn add_periodic_observer(
        &mut self,
        interval: Duration,
        queue: QueueId,
        callback: impl FnMut(Duration) + 'static,
    ) -> ObserverToken {
        let token = self.observers.register(interval, queue, Box::new(callback));
        if let Some(session) = self.session.as_mut() {
            self.observers.attach_all(session.engine.as_mut());
        }
        token
    }

    /// Remove a periodic observer. Unknown tokens are ignored.
    pub fn remove_periodic_observer(&mut self, token: ObserverToken) {
        let Some(observer) = self.observers.unregister(token) else {
            return;
        };
        if let Some(session) = self.session.as_mut() {
            session.engine.remove_periodic_time_observer(observer);
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Re-apply the host engine configuration to the live engine.
    pub fn reload_configuration(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        debug!(session = %session.id, "reloading engine configuration");
        self.config.engine_factory.configure(session.engine.as_mut());
        self.pump();
    }

    /// Validate and apply new settings.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::InvalidSettings`] and keeps the current
    /// settings if validation fails.
    pub fn update_settings(&mut self, settings: PlayerSettings) -> Result<()> {
        settings.validate()?;

        let interval_changed = settings.segment_tick_interval != self.settings.segment_tick_interval;
        self.settings = settings;

        if interval_changed {
            if let Some(session) = self.session.as_mut() {
                session
                    .engine
                    .remove_periodic_time_observer(session.segment_observer);
                session.segment_observer = session
                    .engine
                    .add_periodic_time_observer(self.settings.segment_tick_interval, QueueId::MAIN);
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn session_id(&self) -> Option<PlaybackSessionId> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Play head position, zero without a session.
    pub fn current_time(&self) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |session| session.engine.current_time())
    }

    /// Engine playback rate, zero without a session.
    pub fn rate(&self) -> f64 {
        self.session
            .as_ref()
            .map_or(0.0, |session| session.engine.rate())
    }

    /// Seekable range of the media.
    pub fn time_range(&self) -> TimeRange {
        let Some(session) = self.session.as_ref() else {
            return TimeRange::default();
        };
        timeline::seekable_range(
            &session.engine.seekable_time_ranges(),
            session.engine.duration(),
            self.settings.minimum_dvr_window_length,
        )
    }

    pub fn stream_type(&self) -> StreamType {
        let Some(session) = self.session.as_ref() else {
            return StreamType::Unknown;
        };
        timeline::stream_type(
            &session.engine.seekable_time_ranges(),
            session.engine.duration(),
            self.time_range(),
        )
    }

    /// Content kind reported by the engine, `Unknown` without a session.
    pub fn media_type(&self) -> MediaType {
        self.session
            .as_ref()
            .map_or(MediaType::Unknown, |session| session.engine.media_type())
    }

    /// Whether the play head is live.
    pub fn is_live(&self) -> bool {
        timeline::is_live(
            self.stream_type(),
            self.time_range(),
            self.current_time(),
            self.settings.live_tolerance,
        )
    }

    /// Wall-clock date of the play head for live and DVR streams.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        timeline::playhead_date(
            self.stream_type(),
            self.time_range(),
            self.current_time(),
            self.config.clock.now(),
        )
    }

    /// Play head position when the current run of seeks began.
    pub fn seek_start_time(&self) -> Option<Duration> {
        self.seek_start_time
    }

    /// Destination of the latest seek.
    pub fn seek_target_time(&self) -> Option<Duration> {
        self.seek_target_time
    }

    pub fn current_segment(&self) -> Option<SegmentHandle> {
        self.tracker.current()
    }

    /// The current segment, if it was entered by explicit selection.
    pub fn selected_segment(&self) -> Option<SegmentHandle> {
        self.tracker.selected_segment()
    }

    pub fn segments(&self) -> &[Segment] {
        self.media
            .as_ref()
            .map(|media| media.segments.segments())
            .unwrap_or(&[])
    }

    /// Segments not marked hidden.
    pub fn visible_segments(&self) -> &[SegmentHandle] {
        self.media
            .as_ref()
            .map(|media| media.segments.visible())
            .unwrap_or(&[])
    }

    pub fn segment_handle(&self, index: usize) -> Option<SegmentHandle> {
        self.media
            .as_ref()
            .and_then(|media| media.segments.handle_at(index))
    }

    /// Resolve a handle against the current segment list.
    pub fn segment(&self, handle: SegmentHandle) -> Option<&Segment> {
        self.media
            .as_ref()
            .and_then(|media| media.segments.get(handle))
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.media.as_ref().map(|media| &media.source)
    }

    pub fn user_info(&self) -> Option<&HashMap<String, String>> {
        self.media.as_ref().map(|media| &media.user_info)
    }

    /// Error of the last failed session, cleared by `prepare` and `reset`.
    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn periodic_observer_count(&self) -> usize {
        self.observers.callback_count()
    }
}

impl Drop for MediaPlayerController {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            self.observers.detach_all(session.engine.as_mut());
            self.config.engine_factory.destroyed(session.id);
        }
    }
}

impl fmt::Debug for MediaPlayerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPlayerController")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("segments", &self.segments().len())
            .field("current_segment", &self.tracker.current())
            .field("observers", &self.observers)
            .field("settings", &self.settings)
            .finish()
    }
}
