//! Unified error types for Pagewright

use thiserror::Error;

use crate::types::AssetRole;

/// Failure kinds reported by the generation transport
///
/// The client never retries; the caller decides what to do with
/// transient kinds (see [`GenerationFailure::is_transient`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("generation service timed out")]
    Timeout,

    #[error("generation quota exceeded")]
    QuotaExceeded,

    #[error("generation service unavailable")]
    ServiceUnavailable,

    #[error("generation failed: {0}")]
    Unknown(String),
}

impl GenerationFailure {
    /// Whether a retry with backoff may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationFailure::Timeout
                | GenerationFailure::QuotaExceeded
                | GenerationFailure::ServiceUnavailable
        )
    }
}

/// Unified error type for all Pagewright operations
#[derive(Error, Debug)]
pub enum PagewrightError {
    // Interview errors
    #[error("Briefing is incomplete: missing answers for questions {missing:?}")]
    IncompleteBriefing { missing: Vec<u32> },

    #[error("Question {step} requires an answer before continuing")]
    AnswerRequired { step: u32 },

    #[error("Step {step} is outside the questionnaire (1..={count})")]
    StepOutOfRange { step: u32, count: u32 },

    #[error("Cannot {operation} while wizard is {state}")]
    InvalidTransition { operation: String, state: String },

    #[error("Another wizard operation is still in progress")]
    Busy,

    // Generation errors
    #[error("{0}")]
    Generation(#[from] GenerationFailure),

    #[error("Generated output rejected: {0}")]
    InvalidOutput(String),

    // Refinement errors
    #[error("No placeholder for the {0} in the current document")]
    SubstitutionFailed(AssetRole),

    #[error("More than one {0} asset supplied")]
    DuplicateAsset(AssetRole),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("No generated document available")]
    NoDocument,

    // Environment errors
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl PagewrightError {
    /// The transport failure behind this error, if any
    pub fn generation_failure(&self) -> Option<&GenerationFailure> {
        match self {
            PagewrightError::Generation(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type alias using PagewrightError
pub type Result<T> = std::result::Result<T, PagewrightError>;
