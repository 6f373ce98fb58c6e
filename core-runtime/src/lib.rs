//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback crates depend
//! on. It establishes the logging conventions, the configuration builder
//! and the typed event broadcasting used by every controller instance.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
