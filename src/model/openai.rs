/// OpenAI-compatible HTTP backend (OpenAI, Groq, Ollama, vLLM, ...)
use super::{CompletionError, CompletionProvider, EmbeddingError, EmbeddingProvider};
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiClient {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    temperature: f32,
    embedding_model: String,
    embedding_dimension: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Build a client. `request_timeout` bounds each HTTP round trip; the gateway
    /// applies its own timeout on top.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        chat_model: &str,
        temperature: f32,
        request_timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| CompletionError::InitializationError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: chat_model.to_string(),
            temperature,
            embedding_model: String::new(),
            embedding_dimension: 0,
        })
    }

    /// Also serve embeddings from the same endpoint
    pub fn with_embeddings(mut self, model: &str, dimension: usize) -> Self {
        self.embedding_model = model.to_string();
        self.embedding_dimension = dimension;
        self
    }

    fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::blocking::Response, (Option<u16>, String)> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| (None, e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .json::<ErrorResponse>()
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err((Some(status), message));
        }
        Ok(response)
    }
}

impl CompletionProvider for OpenAiClient {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.chat_model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .post("chat/completions", &request)
            .map_err(|(status, message)| match status {
                Some(status) => CompletionError::ApiError { status, message },
                None => CompletionError::RequestError(message),
            })?;

        let body: ChatResponse = response
            .json()
            .map_err(|e| CompletionError::RequestError(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

impl EmbeddingProvider for OpenAiClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.embedding_model.is_empty() {
            return Err(EmbeddingError::InitializationError(
                "No embedding model configured for this endpoint".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };
        let response = self
            .post("embeddings", &request)
            .map_err(|(status, message)| {
                EmbeddingError::GenerationError(match status {
                    Some(status) => format!("{}: {}", status, message),
                    None => message,
                })
            })?;

        let body: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;
        let embedding = body
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| EmbeddingError::GenerationError("missing embedding data".to_string()))?;

        if embedding.len() != self.embedding_dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.embedding_dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.embedding_dimension
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}
