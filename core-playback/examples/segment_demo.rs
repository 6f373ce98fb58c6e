//! # Segment Playback Example
//!
//! Plays a two minute on-demand item with a blocked ad break and prints the
//! controller events as a tiny wall-clock-free engine advances the play head.
//!
//! Run with: `cargo run --example segment_demo --package core-playback`

use anyhow::Context;
use bridge_traits::time::LogLevel;
use bridge_traits::{
    EngineEvent, EngineObserverId, ItemStatus, MediaEngine, MediaEngineFactory, MediaSource,
    PlaybackSessionId, QueueId, SeekRequest, TimeRange,
};
use core_playback::{MediaPlayerController, PlaybackRequest, PlayerEvent, Segment};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const STEP: Duration = Duration::from_millis(100);
const LENGTH: Duration = Duration::from_secs(120);

// ============================================================================
// Demo Engine
// ============================================================================

#[derive(Default)]
struct Head {
    time: Duration,
    rate: f64,
    observers: Vec<(EngineObserverId, Duration)>,
    next_observer: u64,
    events: Vec<EngineEvent>,
}

struct DemoEngine(Rc<RefCell<Head>>);

impl MediaEngine for DemoEngine {
    fn play(&mut self) {
        let mut head = self.0.borrow_mut();
        head.rate = 1.0;
        head.events.push(EngineEvent::RateChanged(1.0));
    }

    fn pause(&mut self) {
        let mut head = self.0.borrow_mut();
        head.rate = 0.0;
        head.events.push(EngineEvent::RateChanged(0.0));
    }

    fn seek(&mut self, request: SeekRequest) {
        let mut head = self.0.borrow_mut();
        head.time = request.time.min(LENGTH);
        head.events.push(EngineEvent::SeekCompleted {
            id: request.id,
            finished: true,
        });
    }

    fn current_time(&self) -> Duration {
        self.0.borrow().time
    }

    fn rate(&self) -> f64 {
        self.0.borrow().rate
    }

    fn item_status(&self) -> ItemStatus {
        ItemStatus::ReadyToPlay
    }

    fn seekable_time_ranges(&self) -> Vec<TimeRange> {
        vec![TimeRange::new(Duration::ZERO, LENGTH)]
    }

    fn duration(&self) -> Option<Duration> {
        Some(LENGTH)
    }

    fn add_periodic_time_observer(&mut self, interval: Duration, _queue: QueueId) -> EngineObserverId {
        let mut head = self.0.borrow_mut();
        head.next_observer += 1;
        let observer = EngineObserverId(head.next_observer);
        head.observers.push((observer, interval));
        observer
    }

    fn remove_periodic_time_observer(&mut self, observer: EngineObserverId) {
        self.0.borrow_mut().observers.retain(|(id, _)| *id != observer);
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.0.borrow_mut().events)
    }
}

struct DemoFactory(Rc<RefCell<Head>>);

impl MediaEngineFactory for DemoFactory {
    fn create(&self, _session: PlaybackSessionId, _source: &MediaSource) -> Box<dyn MediaEngine> {
        *self.0.borrow_mut() = Head::default();
        Box::new(DemoEngine(self.0.clone()))
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    let head = Rc::new(RefCell::new(Head::default()));
    let config = CoreConfig::builder()
        .engine_factory(Arc::new(DemoFactory(head.clone())))
        .build()?;

    init_logging(
        config
            .logging_config()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )
    .context("failed to initialize logging")?;

    let mut controller = MediaPlayerController::with_default_settings(config);
    controller.add_event_sink(|event: &PlayerEvent| match event {
        PlayerEvent::PlaybackStateChanged { state, .. } => println!("state    -> {state}"),
        PlayerEvent::SegmentStarted { segment, .. } => println!("started  -> #{}", segment.index),
        PlayerEvent::SegmentEnded { segment, interrupted, .. } => {
            println!("ended    -> #{} (interrupted: {interrupted})", segment.index)
        }
        PlayerEvent::WillSkipBlockedSegment { segment } => println!("skipping -> #{}", segment.index),
        other => println!("event    -> {other:?}"),
    });
    controller.add_periodic_observer(Duration::from_secs(15), QueueId::MAIN, |time| {
        println!("progress -> {}s", time.as_secs())
    });

    controller.play_source(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/show/index.m3u8?token=secret"))
            .with_segments(vec![
                Segment::between(Duration::ZERO, Duration::from_secs(30)),
                Segment::between(Duration::from_secs(30), Duration::from_secs(60)).blocked(),
                Segment::between(Duration::from_secs(60), LENGTH),
            ]),
    );

    let mut elapsed = Duration::ZERO;
    while controller.state().is_active() {
        let Some(session) = controller.session_id() else {
            break;
        };

        let (time, ticks, finished) = {
            let mut head = head.borrow_mut();
            head.time = (head.time + STEP).min(LENGTH);
            elapsed += STEP;
            let ticks: Vec<EngineObserverId> = head
                .observers
                .iter()
                .filter(|(_, interval)| elapsed.as_millis() % interval.as_millis() == 0)
                .map(|(observer, _)| *observer)
                .collect();
            (head.time, ticks, head.time >= LENGTH)
        };

        for observer in ticks {
            controller.handle_engine_event(session, EngineEvent::PeriodicTick { observer, time });
        }
        if finished {
            head.borrow_mut().rate = 0.0;
            controller.handle_engine_event(session, EngineEvent::PlayedToEnd);
        }
    }

    println!("finished in state {}", controller.state());
    Ok(())
}
