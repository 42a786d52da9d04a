//! Single entry point for model calls
//!
//! Built once at startup and cloned into the ingestion and search components.

use super::{CompletionError, CompletionProvider, EmbeddingError, EmbeddingProvider};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DelegateError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("delegate call timed out after {0:?}")]
    Timeout(Duration),

    #[error("delegate task failed: {0}")]
    TaskFailed(String),
}

/// Embedding + completion delegates with a per-call timeout
#[derive(Clone)]
pub struct ModelGateway {
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl ModelGateway {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            completer,
            timeout,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DelegateError> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();
        self.offload(move || embedder.embed(&text))
            .await?
            .map_err(DelegateError::from)
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, DelegateError> {
        let completer = Arc::clone(&self.completer);
        let prompt = prompt.to_string();
        self.offload(move || completer.complete(&prompt))
            .await?
            .map_err(DelegateError::from)
    }

    /// Run a blocking delegate call on the blocking pool under the gateway timeout.
    ///
    /// On timeout the blocking task keeps running to completion; its result is
    /// dropped.
    pub async fn offload<T, F>(&self, job: F) -> Result<T, DelegateError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(job)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_error)) => Err(DelegateError::TaskFailed(join_error.to_string())),
            Err(_) => Err(DelegateError::Timeout(self.timeout)),
        }
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn completion_model(&self) -> &str {
        self.completer.model_name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
