use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChromiumError>;

#[derive(Debug, Error)]
pub enum ChromiumError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element query failed: {0}")]
    Element(String),

    /// The handle was never issued by this session, or the element it
    /// pointed at is gone.
    #[error("Unknown element handle: {0}")]
    UnknownHandle(u64),

    #[error("Browser error: {0}")]
    Browser(String),
}
