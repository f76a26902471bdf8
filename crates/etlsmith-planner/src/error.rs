use etlsmith_core::CoreError;
use thiserror::Error;

/// Errors raised while turning a description into a flow definition
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("No API key configured for the language model")]
    MissingApiKey,

    #[error("Description is empty")]
    EmptyDescription,

    #[error("Request to the language model failed: {0}")]
    Transport(String),

    #[error("Language model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Language model returned no content")]
    EmptyResponse,

    #[error("Failed to decode language model response: {0}")]
    Decode(String),

    #[error("Language model produced an invalid plan: {0}")]
    InvalidPlan(#[from] CoreError),
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
