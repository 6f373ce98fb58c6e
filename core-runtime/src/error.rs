use thiserror::Error;

/// Errors raised while assembling the runtime a controller runs on.
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is out of range or logging could not be installed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host bridge was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
