use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while projecting annotations
#[derive(Error, Debug)]
pub enum Error {
    /// The photo has no GPS latitude/longitude; a projection cannot be
    /// anchored and the save must be aborted.
    #[error("Missing GPS metadata on photo '{0}'")]
    MissingGeoreference(String),

    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    #[error("Core data error: {0}")]
    CoreError(#[from] facade_lite_core::Error),
}
