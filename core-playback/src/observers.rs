//! # Periodic Observer Multiplexer
//!
//! Shares engine periodic time observers among any number of callbacks.
//! Callbacks registered with the same `(interval, queue)` pair are served by a
//! single engine observer. Registrations outlive engines: when the session
//! engine is torn down they are detached, and the next engine gets them back
//! through [`attach_all`](PeriodicObserverMultiplexer::attach_all) without
//! callers registering again.

use bridge_traits::{EngineObserverId, MediaEngine, QueueId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use tracing::trace;
use uuid::Uuid;

/// Callback invoked with the current play head position.
pub type PeriodicCallback = Box<dyn FnMut(Duration)>;

/// Opaque handle returned by [`PeriodicObserverMultiplexer::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(Uuid);

impl ObserverToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

type RegistrationKey = (Duration, QueueId);

struct Registration {
    callbacks: Vec<(ObserverToken, PeriodicCallback)>,
    engine_observer: Option<EngineObserverId>,
}

impl Registration {
    fn attach(&mut self, key: RegistrationKey, engine: &mut dyn MediaEngine) {
        if self.engine_observer.is_none() {
            self.engine_observer = Some(engine.add_periodic_time_observer(key.0, key.1));
        }
    }

    fn detach(&mut self, engine: &mut dyn MediaEngine) {
        if let Some(observer) = self.engine_observer.take() {
            engine.remove_periodic_time_observer(observer);
        }
    }
}

/// Registry of shared periodic observers.
#[derive(Default)]
pub struct PeriodicObserverMultiplexer {
    registrations: BTreeMap<RegistrationKey, Registration>,
    owners: HashMap<ObserverToken, RegistrationKey>,
}

impl PeriodicObserverMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for ticks every `interval` on `queue`.
    ///
    /// A new shared registration starts detached; call
    /// [`attach_all`](Self::attach_all) when an engine is live.
    pub fn register(
        &mut self,
        interval: Duration,
        queue: QueueId,
        callback: PeriodicCallback,
    ) -> ObserverToken {
        let key = (interval, queue);
        let token = ObserverToken::new();

        self.registrations
            .entry(key)
            .or_insert_with(|| Registration {
                callbacks: Vec::new(),
                engine_observer: None,
            })
            .callbacks
            .push((token, callback));

        self.owners.insert(token, key);
        token
    }

    /// Remove a callback. The shared registration is dropped with its last
    /// callback; its engine observer, if attached, is returned so the caller
    /// can remove it from the engine. Unknown tokens are ignored.
    pub fn unregister(&mut self, token: ObserverToken) -> Option<EngineObserverId> {
        let key = self.owners.remove(&token)?;
        let registration = self.registrations.get_mut(&key)?;

        registration.callbacks.retain(|(t, _)| *t != token);
        if registration.callbacks.is_empty() {
            return self
                .registrations
                .remove(&key)
                .and_then(|registration| registration.engine_observer);
        }
        None
    }

    /// Returns `true` if `token` is registered.
    pub fn contains(&self, token: ObserverToken) -> bool {
        self.owners.contains_key(&token)
    }

    /// Install every registration on a new engine.
    pub fn attach_all(&mut self, engine: &mut dyn MediaEngine) {
        for (key, registration) in self.registrations.iter_mut() {
            registration.attach(*key, engine);
        }
    }

    /// Remove every registration from the engine being torn down. The
    /// registrations themselves are kept.
    pub fn detach_all(&mut self, engine: &mut dyn MediaEngine) {
        for registration in self.registrations.values_mut() {
            registration.detach(engine);
        }
    }

    /// Deliver a tick of `observer` to its callbacks. Returns `false` if the
    /// observer is not one of ours.
    pub fn dispatch(&mut self, observer: EngineObserverId, time: Duration) -> bool {
        let Some(registration) = self
            .registrations
            .values_mut()
            .find(|r| r.engine_observer == Some(observer))
        else {
            return false;
        };

        trace!(
            observer = observer.0,
            callbacks = registration.callbacks.len(),
            "dispatching periodic tick"
        );
        for (_, callback) in registration.callbacks.iter_mut() {
            callback(time);
        }
        true
    }

    /// Number of shared registrations.
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl fmt::Debug for PeriodicObserverMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicObserverMultiplexer")
            .field("registrations", &self.registrations.len())
            .field("callbacks", &self.owners.len())
            .finish()
    }
}
