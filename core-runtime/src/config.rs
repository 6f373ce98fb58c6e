//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges and runtime settings a controller
//! needs. It enforces fail-fast validation so a controller can never be built
//! without an engine factory.
//!
//! ## Required Dependencies
//!
//! - `MediaEngineFactory` - Creates the platform media engine for each session
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Wall-clock source (default: [`SystemClock`])
//! - `LoggerSink` - Host log forwarding (default: none)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .engine_factory(Arc::new(NativeEngineFactory::default()))
//!     .event_buffer_size(512)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder reports missing capabilities with an actionable message:
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing engine factory");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use crate::logging::LoggingConfig;
use bridge_traits::{Clock, LoggerSink, MediaEngineFactory, SystemClock};
use std::sync::Arc;

/// Core configuration for a playback controller.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Media engine factory (required)
    pub engine_factory: Arc<dyn MediaEngineFactory>,

    /// Wall-clock source used for live/DVR dates
    pub clock: Arc<dyn Clock>,

    /// Per-subscriber buffer of the controller's event bus
    pub event_buffer_size: usize,

    /// Host log forwarding (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine_factory", &"MediaEngineFactory { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Logging configuration that mirrors events into the configured host
    /// sink. Pass it to [`init_logging`](crate::logging::init_logging) after
    /// adjusting format and level.
    pub fn logging_config(&self) -> LoggingConfig {
        let config = LoggingConfig::default();
        match &self.logger_sink {
            Some(sink) => config.with_logger_sink(sink.clone()),
            None => config,
        }
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine_factory: Option<Arc<dyn MediaEngineFactory>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
}

impl CoreConfigBuilder {
    /// Sets the media engine factory (required).
    pub fn engine_factory(mut self, factory: Arc<dyn MediaEngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Sets the wall-clock source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the event bus buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the host logger sink.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no engine factory was supplied
    /// - [`Error::Config`] when the event buffer size is zero
    pub fn build(self) -> Result<CoreConfig> {
        let engine_factory = self.engine_factory.ok_or_else(|| Error::CapabilityMissing {
            capability: "MediaEngineFactory".to_string(),
            message: "No media engine factory provided. \
                      Inject the platform engine adapter before building the player."
                .to_string(),
        })?;

        let event_buffer_size = self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        if event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than zero".to_string(),
            ));
        }

        Ok(CoreConfig {
            engine_factory,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size,
            logger_sink: self.logger_sink,
        })
    }
}
