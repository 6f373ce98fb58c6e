use thiserror::Error;

/// Errors reported by host bridge implementations.
///
/// Media engines raise these through [`EngineEvent::Failed`](crate::media::EngineEvent::Failed)
/// and [`ItemStatus::Failed`](crate::media::ItemStatus::Failed), so the type is
/// `Clone` and carries only owned, printable context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Media item failed to load: {0}")]
    ItemFailed(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Network error: {0}")]
    Network(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
