//! # Playback Error Types
//!
//! Recoverable errors of the playback core. Invalid caller input (unknown
//! segment, index out of range) is not represented here: those calls are
//! silent no-ops. Programmer errors panic.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback orchestration.
#[derive(Error, Debug)]
pub enum PlayerError {
    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The engine reported a failure. Recoverable only by preparing again.
    #[error("Playback failed: {0}")]
    PlaybackFailed(#[source] BridgeError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Player settings failed validation.
    #[error("Invalid player settings: {0}")]
    InvalidSettings(String),

    /// Runtime infrastructure error (configuration, capabilities).
    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),
}

impl PlayerError {
    /// Returns `true` if this error was reported by the media engine.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, PlayerError::PlaybackFailed(_))
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(self, PlayerError::PlaybackFailed(BridgeError::Network(_)))
    }
}

impl From<BridgeError> for PlayerError {
    fn from(err: BridgeError) -> Self {
        PlayerError::PlaybackFailed(err)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
