/// Completion provider trait
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion client initialization failed: {0}")]
    InitializationError(String),

    #[error("Completion request failed: {0}")]
    RequestError(String),

    #[error("Completion API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Completion response was empty")]
    EmptyResponse,
}

/// Trait for text completion backends
///
/// A single prompt in, the model's text reply out. Structured output is requested
/// through the prompt and parsed by the caller.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    fn model_name(&self) -> &str;
}
