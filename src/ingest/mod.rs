//! CV ingestion
//!
//! - `extractor`: the document extraction delegate and its completion-backed default
//! - `pipeline`: fingerprint cache, document storage and the profile merge

pub mod extractor;
pub mod pipeline;

pub use extractor::{strip_consent_clause, CompletionCvExtractor, CvExtractor, ExtractionError};
pub use pipeline::{embedding_text, IngestOutcome, Ingestor, RecordSource};
