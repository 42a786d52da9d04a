//! Model delegates
//!
//! Embedding and completion backends sit behind two narrow traits. Both are
//! synchronous; `ModelGateway` moves each call onto the blocking pool and puts a
//! timeout on it, so callers in async code only see `DelegateError`.
//!
//! Backends:
//! - `FastEmbedProvider`: local embeddings (offline mode)
//! - `OpenAiClient`: OpenAI-compatible HTTP API for completions and, in online
//!   mode, embeddings

mod completion;
mod embedding;
mod gateway;
mod openai;

pub use completion::{CompletionError, CompletionProvider};
pub use embedding::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use gateway::{DelegateError, ModelGateway};
pub use openai::OpenAiClient;

/// Pull the first JSON value (object or array) out of a model reply.
///
/// Models like to wrap JSON in prose or ```json fences.
pub fn extract_json_block(reply: &str) -> Option<&str> {
    let start = reply.find(['{', '['])?;
    let closing = match reply.as_bytes()[start] {
        b'{' => '}',
        _ => ']',
    };
    let end = reply.rfind(closing)?;
    (end > start).then(|| &reply[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_reply() {
        let reply = "Sure:\n```json\n{\"a\": [1, 2]}\n```\n";
        assert_eq!(extract_json_block(reply), Some("{\"a\": [1, 2]}"));
    }

    #[test]
    fn test_extract_json_array() {
        assert_eq!(extract_json_block("[\"q1\", \"q2\"]"), Some("[\"q1\", \"q2\"]"));
    }

    #[test]
    fn test_extract_json_missing() {
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("} {"), None);
    }
}
