//! Simulated media engine shared by the controller scenario tests.
//!
//! Media time advances in 100 ms steps while the rate is non-zero. Every step
//! fires the periodic observers due at that step, and seeks complete
//! synchronously through `poll_events` unless `defer_seeks` is set.

#![allow(dead_code)]

use bridge_traits::{
    EngineEvent, EngineObserverId, ItemStatus, MediaEngine, MediaEngineFactory, MediaSource,
    PlaybackSessionId, QueueId, SeekRequest, TimeRange,
};
use core_playback::{
    MediaPlayerController, PlaybackRequest, PlaybackState, PlayerEvent, PlayerSettings, Segment,
    SegmentHandle,
};
use core_runtime::config::CoreConfig;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

pub const STEP: Duration = Duration::from_millis(100);

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Shape of the media the simulated engine plays.
#[derive(Debug, Clone, Copy)]
pub enum Media {
    OnDemand(Duration),
    /// Live stream with a DVR window of the given length, play head at the start.
    Dvr(Duration),
}

#[derive(Debug)]
pub struct SimState {
    pub media: Media,
    pub session: Option<PlaybackSessionId>,
    pub time: Duration,
    pub rate: f64,
    pub elapsed: Duration,
    pub ended: bool,
    pub auto_ready: bool,
    pub defer_seeks: bool,
    pub observers: Vec<(EngineObserverId, Duration, QueueId)>,
    pub next_observer: u64,
    pub pending: Vec<EngineEvent>,
    pub seeks: Vec<SeekRequest>,
    pub deferred: Vec<SeekRequest>,
    pub created: Vec<PlaybackSessionId>,
    pub configured: usize,
    pub destroyed: Vec<PlaybackSessionId>,
}

impl SimState {
    fn new(media: Media) -> Self {
        Self {
            media,
            session: None,
            time: Duration::ZERO,
            rate: 0.0,
            elapsed: Duration::ZERO,
            ended: false,
            auto_ready: true,
            defer_seeks: false,
            observers: Vec::new(),
            next_observer: 0,
            pending: Vec::new(),
            seeks: Vec::new(),
            deferred: Vec::new(),
            created: Vec::new(),
            configured: 0,
            destroyed: Vec::new(),
        }
    }

    fn end(&self) -> Duration {
        match self.media {
            Media::OnDemand(duration) | Media::Dvr(duration) => duration,
        }
    }

    fn set_rate(&mut self, rate: f64) {
        if self.rate != rate {
            self.rate = rate;
            self.pending.push(EngineEvent::RateChanged(rate));
        }
    }
}

pub struct SimulatedEngine {
    state: Rc<RefCell<SimState>>,
}

impl MediaEngine for SimulatedEngine {
    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.ended = false;
        state.set_rate(1.0);
    }

    fn pause(&mut self) {
        self.state.borrow_mut().set_rate(0.0);
    }

    fn seek(&mut self, request: SeekRequest) {
        let mut state = self.state.borrow_mut();
        state.seeks.push(request);
        if state.defer_seeks {
            state.deferred.push(request);
            return;
        }
        state.time = request.time.min(state.end());
        state.ended = false;
        state.pending.push(EngineEvent::SeekCompleted {
            id: request.id,
            finished: true,
        });
    }

    fn current_time(&self) -> Duration {
        self.state.borrow().time
    }

    fn rate(&self) -> f64 {
        self.state.borrow().rate
    }

    fn item_status(&self) -> ItemStatus {
        ItemStatus::Unknown
    }

    fn seekable_time_ranges(&self) -> Vec<TimeRange> {
        vec![TimeRange::new(Duration::ZERO, self.state.borrow().end())]
    }

    fn duration(&self) -> Option<Duration> {
        match self.state.borrow().media {
            Media::OnDemand(duration) => Some(duration),
            Media::Dvr(_) => None,
        }
    }

    fn add_periodic_time_observer(&mut self, interval: Duration, queue: QueueId) -> EngineObserverId {
        let mut state = self.state.borrow_mut();
        state.next_observer += 1;
        let id = EngineObserverId(state.next_observer);
        state.observers.push((id, interval, queue));
        id
    }

    fn remove_periodic_time_observer(&mut self, observer: EngineObserverId) {
        self.state
            .borrow_mut()
            .observers
            .retain(|(id, _, _)| *id != observer);
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }
}

pub struct SimulatedFactory {
    state: Rc<RefCell<SimState>>,
}

impl MediaEngineFactory for SimulatedFactory {
    fn create(&self, session: PlaybackSessionId, _source: &MediaSource) -> Box<dyn MediaEngine> {
        let mut state = self.state.borrow_mut();
        state.session = Some(session);
        state.created.push(session);
        state.time = Duration::ZERO;
        state.rate = 0.0;
        state.elapsed = Duration::ZERO;
        state.ended = false;
        state.pending.clear();
        state.deferred.clear();
        if state.auto_ready {
            state
                .pending
                .push(EngineEvent::StatusChanged(ItemStatus::ReadyToPlay));
        }
        Box::new(SimulatedEngine {
            state: self.state.clone(),
        })
    }

    fn configure(&self, _engine: &mut dyn MediaEngine) {
        self.state.borrow_mut().configured += 1;
    }

    fn destroyed(&self, session: PlaybackSessionId) {
        let mut state = self.state.borrow_mut();
        state.destroyed.push(session);
        state.observers.clear();
    }
}

/// Controller wired to a simulated engine, recording every event with the
/// media time it was posted at.
pub struct Harness {
    pub controller: MediaPlayerController,
    pub sim: Rc<RefCell<SimState>>,
    pub log: Rc<RefCell<Vec<(Duration, PlayerEvent)>>>,
}

impl Harness {
    pub fn new(media: Media) -> Self {
        Self::with_settings(media, PlayerSettings::default())
    }

    pub fn with_settings(media: Media, settings: PlayerSettings) -> Self {
        let sim = Rc::new(RefCell::new(SimState::new(media)));
        let config = CoreConfig::builder()
            .engine_factory(Arc::new(SimulatedFactory { state: sim.clone() }))
            .build()
            .unwrap();
        let mut controller = MediaPlayerController::new(config, settings).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let (sink_log, sink_sim) = (log.clone(), sim.clone());
        controller.add_event_sink(move |event: &PlayerEvent| {
            let time = sink_sim.borrow().time;
            sink_log.borrow_mut().push((time, event.clone()));
        });

        Self {
            controller,
            sim,
            log,
        }
    }

    /// Prepare `segments` and start playing from `start`.
    pub fn play(&mut self, start: Duration, segments: Vec<Segment>) {
        self.controller.play_source(
            PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/media.m3u8"))
                .with_start_time(start)
                .with_segments(segments),
        );
    }

    pub fn handle(&self, index: usize) -> SegmentHandle {
        self.controller.segment_handle(index).unwrap()
    }

    pub fn session(&self) -> PlaybackSessionId {
        self.controller.session_id().unwrap()
    }

    pub fn time(&self) -> Duration {
        self.sim.borrow().time
    }

    /// Run the simulated engine for `duration`.
    pub fn advance(&mut self, duration: Duration) {
        let steps = duration.as_millis() / STEP.as_millis();
        for _ in 0..steps {
            self.step();
        }
    }

    fn step(&mut self) {
        let Some(session) = self.controller.session_id() else {
            return;
        };

        let (ticks, reached_end) = {
            let mut sim = self.sim.borrow_mut();
            let end = sim.end();
            if sim.rate > 0.0 {
                sim.time = (sim.time + STEP).min(end);
            }
            sim.elapsed += STEP;

            let (time, elapsed) = (sim.time, sim.elapsed);
            let ticks: Vec<EngineEvent> = sim
                .observers
                .iter()
                .filter(|(_, interval, _)| elapsed.as_millis() % interval.as_millis() == 0)
                .map(|(observer, _, _)| EngineEvent::PeriodicTick {
                    observer: *observer,
                    time,
                })
                .collect();

            let on_demand = matches!(sim.media, Media::OnDemand(_));
            let reached_end = on_demand && sim.rate > 0.0 && !sim.ended && time >= end;
            if reached_end {
                sim.ended = true;
                sim.rate = 0.0;
            }
            (ticks, reached_end)
        };

        for tick in ticks {
            self.controller.handle_engine_event(session, tick);
        }
        if reached_end {
            self.controller
                .handle_engine_event(session, EngineEvent::PlayedToEnd);
        }
    }

    /// Complete every deferred seek in issue order.
    pub fn complete_deferred_seeks(&mut self) {
        let seeks: Vec<SeekRequest> = std::mem::take(&mut self.sim.borrow_mut().deferred);
        for seek in seeks {
            let session = self.session();
            self.sim.borrow_mut().time = seek.time;
            self.controller.handle_engine_event(
                session,
                EngineEvent::SeekCompleted {
                    id: seek.id,
                    finished: true,
                },
            );
        }
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.log.borrow().iter().map(|(_, event)| event.clone()).collect()
    }

    pub fn timed_events(&self) -> Vec<(Duration, PlayerEvent)> {
        self.log.borrow().clone()
    }

    /// Segment and skip events only.
    pub fn segment_events(&self) -> Vec<PlayerEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.segment().is_some())
            .collect()
    }

    pub fn states(&self) -> Vec<PlaybackState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlayerEvent::PlaybackStateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.log.borrow_mut().clear();
    }
}
