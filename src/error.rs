use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
    /// A resolved typeface could not be embedded into the output.
    #[error("font embedding failed: {0}")]
    Font(String),
    /// The crest image passed resolution but could not be encoded.
    #[error("image embedding failed: {0}")]
    Image(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed request record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
}
