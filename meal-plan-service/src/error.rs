use thiserror::Error;

/// Failures the service layer can surface. The pipeline itself never
/// errors; everything here comes from the LLM call or request handling.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("LLM is not available: {0}")]
    LlmUnavailable(String),

    #[error("LLM request failed: {0}")]
    LlmRequest(String),

    #[error("meal plan not found: {0}")]
    PlanNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
