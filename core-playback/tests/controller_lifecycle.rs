//! Session lifecycle, periodic observers and timeline queries.

mod common;

use bridge_traits::{
    BridgeError, Clock, EngineEvent, EngineObserverId, ItemStatus, MediaEngine,
    MediaEngineFactory, MediaSource, MediaType, PlaybackSessionId, QueueId, SeekRequest,
    TimeRange,
};
use chrono::{DateTime, TimeZone, Utc};
use common::{millis, secs, Harness, Media};
use core_playback::{
    MediaPlayerController, PlaybackRequest, PlaybackState, PlayerEvent, PlayerSettings, Segment,
    StreamType,
};
use core_runtime::config::CoreConfig;
use mockall::mock;
use mockall::predicate::eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_stop_is_idempotent_and_keeps_media_context() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.controller.stop();
    assert!(harness.events().is_empty());

    harness.controller.play_source(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/a.m3u8"))
            .with_segments(vec![Segment::between(secs(0), secs(5))])
            .with_user_info("title", "Evening news"),
    );
    let session = harness.session();

    harness.controller.stop();
    assert_eq!(harness.controller.state(), PlaybackState::Idle);
    assert_eq!(harness.sim.borrow().destroyed, vec![session]);
    assert!(harness.controller.session_id().is_none());
    assert_eq!(harness.controller.segments().len(), 1);
    assert_eq!(
        harness.controller.user_info().and_then(|info| info.get("title")).map(String::as_str),
        Some("Evening news")
    );

    harness.clear_events();
    harness.controller.stop();
    harness.controller.pause();
    assert!(harness.events().is_empty());

    harness.controller.reset();
    assert!(harness.controller.source().is_none());
    assert!(harness.controller.segments().is_empty());
    assert_eq!(harness.controller.current_segment(), None);
}

#[test]
fn test_prepare_tears_down_previous_session() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.play(secs(0), Vec::new());
    let first = harness.session();
    harness.clear_events();

    harness.play(secs(0), Vec::new());
    let second = harness.session();

    assert_ne!(first, second);
    assert_eq!(harness.sim.borrow().destroyed, vec![first]);
    assert_eq!(
        harness.states(),
        vec![
            PlaybackState::Idle,
            PlaybackState::Preparing,
            PlaybackState::Playing
        ]
    );
}

#[test]
fn test_periodic_observers_survive_sessions() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    let ticks = Rc::new(RefCell::new(Vec::new()));
    let record = ticks.clone();
    let token = harness
        .controller
        .add_periodic_observer(secs(1), QueueId::MAIN, move |time| {
            record.borrow_mut().push(time)
        });
    harness
        .controller
        .add_periodic_observer(secs(1), QueueId::MAIN, |_| {});
    assert_eq!(harness.controller.periodic_observer_count(), 2);

    harness.play(secs(0), Vec::new());
    // Shared user observer plus the internal segment observer
    assert_eq!(harness.sim.borrow().observers.len(), 2);

    harness.advance(secs(2));
    assert_eq!(*ticks.borrow(), vec![secs(1), secs(2)]);

    harness.controller.stop();
    harness.play(secs(0), Vec::new());
    assert_eq!(harness.sim.borrow().observers.len(), 2);

    harness.advance(secs(1));
    assert_eq!(ticks.borrow().len(), 3);

    harness.controller.remove_periodic_observer(token);
    harness.advance(secs(1));
    assert_eq!(ticks.borrow().len(), 3);
    assert_eq!(harness.controller.periodic_observer_count(), 1);
}

#[test]
fn test_end_of_media_and_replay() {
    let mut harness = Harness::new(Media::OnDemand(secs(3)));
    harness.play(secs(0), Vec::new());

    harness.advance(secs(4));
    assert_eq!(harness.controller.state(), PlaybackState::Ended);

    harness.controller.play();
    assert_eq!(harness.time(), Duration::ZERO);
    assert_eq!(harness.controller.state(), PlaybackState::Playing);
    assert!(!harness.sim.borrow().seeks.last().unwrap().is_precise());
}

#[test]
fn test_toggle_play_pause() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.controller.prepare(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/a.m3u8")),
        None,
    );
    assert_eq!(harness.controller.state(), PlaybackState::Paused);

    harness.controller.toggle_play_pause();
    assert_eq!(harness.controller.state(), PlaybackState::Playing);

    harness.controller.toggle_play_pause();
    assert_eq!(harness.controller.state(), PlaybackState::Paused);
}

#[test]
fn test_ready_handler_may_stop_playback() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.controller.prepare(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/a.m3u8")),
        Some(Box::new(|controller: &mut MediaPlayerController| {
            controller.stop()
        })),
    );

    assert_eq!(harness.controller.state(), PlaybackState::Idle);
    assert!(harness.controller.session_id().is_none());
    assert_eq!(harness.sim.borrow().destroyed.len(), 1);
    assert_eq!(
        harness.states(),
        vec![PlaybackState::Preparing, PlaybackState::Idle]
    );
}

#[test]
fn test_ready_handler_may_prepare_another_source() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.controller.prepare(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/a.m3u8")),
        Some(Box::new(|controller: &mut MediaPlayerController| {
            controller.prepare(
                PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/b.m3u8")),
                None,
            )
        })),
    );

    let (created, destroyed) = {
        let sim = harness.sim.borrow();
        (sim.created.clone(), sim.destroyed.clone())
    };
    assert_eq!(created.len(), 2);
    assert_eq!(destroyed, vec![created[0]]);
    assert_eq!(harness.controller.session_id(), Some(created[1]));
    assert_eq!(
        harness.controller.source().map(MediaSource::locator).as_deref(),
        Some("https://cdn.example.com/b.m3u8")
    );
    assert_eq!(
        harness.states(),
        vec![
            PlaybackState::Preparing,
            PlaybackState::Idle,
            PlaybackState::Preparing,
            PlaybackState::Paused
        ]
    );
}

#[test]
fn test_seek_while_preparing_is_ignored() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.sim.borrow_mut().auto_ready = false;
    harness.controller.prepare(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/a.m3u8")),
        None,
    );

    harness.controller.seek_precisely(secs(10), None);
    assert_eq!(harness.controller.state(), PlaybackState::Preparing);
    assert!(harness.sim.borrow().seeks.is_empty());
}

#[test]
fn test_stale_seek_completion_is_discarded() {
    let mut harness = Harness::new(Media::OnDemand(secs(30)));
    harness.play(secs(0), vec![Segment::between(secs(10), secs(20))]);
    harness.sim.borrow_mut().defer_seeks = true;

    let called = Rc::new(RefCell::new(false));
    let flag = called.clone();
    harness.controller.seek_precisely(
        secs(12),
        Some(Box::new(move |_: &mut MediaPlayerController, _: bool| {
            *flag.borrow_mut() = true
        })),
    );
    let stale_session = harness.session();
    let stale_seek = harness.sim.borrow().seeks[0];
    assert_eq!(harness.controller.state(), PlaybackState::Seeking);

    harness.controller.reset();
    harness.sim.borrow_mut().defer_seeks = false;
    harness.play(secs(0), Vec::new());
    harness.clear_events();

    harness.controller.handle_engine_event(
        stale_session,
        EngineEvent::SeekCompleted {
            id: stale_seek.id,
            finished: true,
        },
    );
    // Unknown seek id on the live session
    let live = harness.session();
    harness.controller.handle_engine_event(
        live,
        EngineEvent::SeekCompleted {
            id: stale_seek.id,
            finished: true,
        },
    );

    assert!(!*called.borrow());
    assert!(harness.events().is_empty());
    assert_eq!(harness.controller.state(), PlaybackState::Playing);
}

#[test]
fn test_deferred_seeks_complete_in_order() {
    let mut harness = Harness::new(Media::OnDemand(secs(60)));
    harness.play(secs(0), Vec::new());
    harness.advance(secs(1));
    harness.sim.borrow_mut().defer_seeks = true;

    harness.controller.seek_precisely(secs(20), None);
    harness.controller.seek_precisely(secs(30), None);
    assert_eq!(harness.controller.seek_start_time(), Some(secs(1)));
    assert_eq!(harness.controller.seek_target_time(), Some(secs(30)));

    harness.complete_deferred_seeks();
    assert_eq!(harness.controller.state(), PlaybackState::Playing);
    assert_eq!(harness.controller.seek_start_time(), None);
    assert_eq!(
        harness
            .states()
            .iter()
            .filter(|state| **state == PlaybackState::Seeking)
            .count(),
        1
    );
}

#[test]
fn test_failure_then_prepare_again() {
    let mut harness = Harness::new(Media::OnDemand(secs(60)));
    harness.play(secs(0), Vec::new());
    let session = harness.session();

    harness.controller.handle_engine_event(
        session,
        EngineEvent::Failed(BridgeError::Network("connection reset".into())),
    );
    assert_eq!(harness.controller.state(), PlaybackState::Idle);
    assert!(harness
        .controller
        .last_error()
        .is_some_and(|error| error.is_network_error()));
    assert!(matches!(
        harness.events().last(),
        Some(PlayerEvent::PlaybackFailed { .. })
    ));

    harness.play(secs(0), Vec::new());
    assert_eq!(harness.controller.state(), PlaybackState::Playing);
    assert!(harness.controller.last_error().is_none());
}

#[test]
fn test_stall_and_recovery_states() {
    let mut harness = Harness::new(Media::OnDemand(secs(60)));
    harness.play(secs(0), Vec::new());
    let session = harness.session();
    harness.clear_events();

    harness
        .controller
        .handle_engine_event(session, EngineEvent::Stalled);
    harness.sim.borrow_mut().rate = 0.0;
    harness
        .controller
        .handle_engine_event(session, EngineEvent::RateChanged(0.0));

    // The engine was told to resume and reported it
    assert_eq!(harness.sim.borrow().rate, 1.0);
    assert_eq!(
        harness.states(),
        vec![PlaybackState::Stalled, PlaybackState::Playing]
    );
}

#[test]
fn test_on_demand_timeline() {
    let mut harness = Harness::new(Media::OnDemand(secs(90)));
    assert_eq!(harness.controller.stream_type(), StreamType::Unknown);
    assert_eq!(harness.controller.time_range(), TimeRange::default());

    harness.play(secs(0), Vec::new());
    assert_eq!(harness.controller.stream_type(), StreamType::OnDemand);
    assert_eq!(harness.controller.time_range(), TimeRange::new(secs(0), secs(90)));
    assert!(!harness.controller.is_live());
    assert!(harness.controller.date().is_none());
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[test]
fn test_dvr_timeline() {
    let mut harness = Harness::new(Media::Dvr(secs(3600)));
    harness.play(secs(0), Vec::new());

    assert_eq!(harness.controller.stream_type(), StreamType::Dvr);
    assert!(!harness.controller.is_live());

    harness.controller.seek_efficiently(secs(3590), None);
    assert!(harness.controller.is_live());

    let mut settings = PlayerSettings::default();
    settings.minimum_dvr_window_length = secs(7200);
    harness.controller.update_settings(settings).unwrap();
    assert_eq!(harness.controller.stream_type(), StreamType::Live);
    assert!(harness.controller.time_range().is_empty());
    assert!(harness.controller.is_live());
}

#[test]
fn test_dvr_date_uses_clock() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap();
    let engine_state = Rc::new(RefCell::new((Duration::from_secs(1800), 0u64)));
    let config = CoreConfig::builder()
        .engine_factory(Arc::new(FixedDvrFactory(engine_state)))
        .clock(Arc::new(FixedClock(now)))
        .build()
        .unwrap();
    let mut controller = MediaPlayerController::with_default_settings(config);
    assert_eq!(controller.media_type(), MediaType::Unknown);
    controller.prepare(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/live.m3u8")),
        None,
    );

    assert_eq!(controller.media_type(), MediaType::Video);
    assert_eq!(controller.stream_type(), StreamType::Dvr);
    assert_eq!(
        controller.date(),
        Some(Utc.with_ymd_and_hms(2024, 6, 1, 20, 30, 0).unwrap())
    );
}

/// Live engine with a one hour window, ready immediately, play head fixed.
struct FixedDvrEngine(Rc<RefCell<(Duration, u64)>>);

impl MediaEngine for FixedDvrEngine {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, _request: SeekRequest) {}
    fn current_time(&self) -> Duration {
        self.0.borrow().0
    }
    fn rate(&self) -> f64 {
        0.0
    }
    fn item_status(&self) -> ItemStatus {
        ItemStatus::ReadyToPlay
    }
    fn seekable_time_ranges(&self) -> Vec<TimeRange> {
        vec![TimeRange::new(Duration::ZERO, secs(3600))]
    }
    fn duration(&self) -> Option<Duration> {
        None
    }
    fn media_type(&self) -> MediaType {
        MediaType::Video
    }
    fn add_periodic_time_observer(&mut self, _interval: Duration, _queue: QueueId) -> EngineObserverId {
        let mut state = self.0.borrow_mut();
        state.1 += 1;
        EngineObserverId(state.1)
    }
    fn remove_periodic_time_observer(&mut self, _observer: EngineObserverId) {}
}

struct FixedDvrFactory(Rc<RefCell<(Duration, u64)>>);

impl MediaEngineFactory for FixedDvrFactory {
    fn create(&self, _session: PlaybackSessionId, _source: &MediaSource) -> Box<dyn MediaEngine> {
        Box::new(FixedDvrEngine(self.0.clone()))
    }
}

// ============================================================================
// Engine lifecycle hooks
// ============================================================================

trait LifecycleHooks {
    fn created(&self, locator: String);
    fn configured(&self);
    fn destroyed(&self, session: PlaybackSessionId);
}

mock! {
    Hooks {}

    impl LifecycleHooks for Hooks {
        fn created(&self, locator: String);
        fn configured(&self);
        fn destroyed(&self, session: PlaybackSessionId);
    }
}

struct HookedFactory {
    hooks: MockHooks,
}

impl MediaEngineFactory for HookedFactory {
    fn create(&self, _session: PlaybackSessionId, source: &MediaSource) -> Box<dyn MediaEngine> {
        self.hooks.created(source.locator());
        Box::new(FixedDvrEngine(Rc::new(RefCell::new((Duration::ZERO, 0)))))
    }

    fn configure(&self, _engine: &mut dyn MediaEngine) {
        self.hooks.configured();
    }

    fn destroyed(&self, session: PlaybackSessionId) {
        self.hooks.destroyed(session);
    }
}

#[test]
fn test_factory_lifecycle_hooks() {
    let mut hooks = MockHooks::new();
    hooks
        .expect_created()
        .with(eq("https://cdn.example.com/live.m3u8".to_string()))
        .times(1)
        .return_const(());
    // Once at creation, once on reload
    hooks.expect_configured().times(2).return_const(());

    let destroyed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let record = destroyed.clone();
    hooks
        .expect_destroyed()
        .times(1)
        .returning(move |session| record.lock().unwrap().push(session));

    let config = CoreConfig::builder()
        .engine_factory(Arc::new(HookedFactory { hooks }))
        .build()
        .unwrap();
    let mut controller = MediaPlayerController::with_default_settings(config);

    controller.prepare(
        PlaybackRequest::new(MediaSource::remote("https://cdn.example.com/live.m3u8")),
        None,
    );
    let session = controller.session_id().unwrap();
    controller.reload_configuration();
    controller.stop();
    controller.reload_configuration();

    assert_eq!(*destroyed.lock().unwrap(), vec![session]);
}

#[test]
fn test_picture_in_picture_is_forwarded_to_sinks() {
    let mut harness = Harness::new(Media::OnDemand(secs(10)));
    harness.controller.notify_picture_in_picture_state(true);
    harness.controller.notify_picture_in_picture_state(false);

    assert_eq!(
        harness.events(),
        vec![
            PlayerEvent::PictureInPictureStateChanged { active: true },
            PlayerEvent::PictureInPictureStateChanged { active: false },
        ]
    );
}

#[tokio::test]
async fn test_bus_subscribers_receive_state_changes() {
    let mut harness = Harness::new(Media::OnDemand(secs(10)));
    let mut stream = harness.controller.subscribe().filter(|event| {
        matches!(event, PlayerEvent::PlaybackStateChanged { .. })
    });

    harness.play(secs(0), Vec::new());
    harness.advance(millis(500));

    let first = stream.recv().await.unwrap();
    assert_eq!(
        first,
        PlayerEvent::PlaybackStateChanged {
            state: PlaybackState::Preparing,
            previous_state: PlaybackState::Idle,
            selected: false,
        }
    );
    let second = stream.recv().await.unwrap();
    assert!(matches!(
        second,
        PlayerEvent::PlaybackStateChanged {
            state: PlaybackState::Playing,
            ..
        }
    ));
    assert!(stream.try_recv().is_none());
}
