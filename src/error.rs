use crate::data_types::SourceRef;
use thiserror::Error;

/// Failures reported to the caller of a manager operation.
///
/// None of these are fatal to the host chart: each one is scoped to the
/// single surface the operation was about.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The data source could not deliver the history for `source_ref`.
    /// No surface was created.
    #[error("failed to fetch `{source_ref}`: {reason}")]
    FetchFailure { source_ref: SourceRef, reason: String },

    /// The source is already registered or currently being fetched.
    #[error("`{0}` is already registered")]
    Duplicate(SourceRef),

    #[error("no surface with id {0}")]
    UnknownSurface(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("unknown timeframe `{0}`")]
    InvalidTimeframe(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
