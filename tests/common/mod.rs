//! Delegate fakes shared by the integration tests
#![allow(dead_code)]

use skillmatch::ingest::{CvExtractor, ExtractionError};
use skillmatch::model::{
    CompletionError, CompletionProvider, EmbeddingError, EmbeddingProvider, ModelGateway,
};
use skillmatch::profile::{CvRecord, PersonalInfo};
use skillmatch::storage::{ProfileDraft, StorageManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

type EmbedRule = dyn Fn(&str) -> Result<Vec<f32>, EmbeddingError> + Send + Sync;
type CompleteRule = dyn Fn(&str) -> Result<String, CompletionError> + Send + Sync;
type ExtractRule = dyn Fn(&str) -> Result<CvRecord, ExtractionError> + Send + Sync;

pub struct FakeEmbedder {
    rule: Box<EmbedRule>,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(rule: impl Fn(&str) -> Result<Vec<f32>, EmbeddingError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            rule: Box::new(rule),
            calls: AtomicUsize::new(0),
        })
    }

    /// Every text embeds to the same vector
    pub fn constant(vector: Vec<f32>) -> Arc<Self> {
        Self::new(move |_| Ok(vector.clone()))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(|_| Err(EmbeddingError::GenerationError("embedder offline".to_string())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.rule)(text)
    }

    fn dimension(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

/// Answers prompts with a rule and keeps every prompt it saw
pub struct FakeCompleter {
    rule: Box<CompleteRule>,
    prompts: Mutex<Vec<String>>,
}

impl FakeCompleter {
    pub fn new(rule: impl Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            rule: Box::new(rule),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts_containing(&self, needle: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .cloned()
            .collect()
    }
}

impl CompletionProvider for FakeCompleter {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.rule)(prompt)
    }

    fn model_name(&self) -> &str {
        "fake-completer"
    }
}

pub struct FakeExtractor {
    rule: Box<ExtractRule>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(rule: impl Fn(&str) -> Result<CvRecord, ExtractionError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            rule: Box::new(rule),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CvExtractor for FakeExtractor {
    fn extract_text(&self, text: &str) -> Result<CvRecord, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.rule)(text)
    }
}

pub fn storage() -> (TempDir, Arc<StorageManager>) {
    let temp = TempDir::new().unwrap();
    let storage = Arc::new(StorageManager::new(temp.path().to_path_buf(), 1024).unwrap());
    (temp, storage)
}

pub fn gateway(embedder: Arc<FakeEmbedder>, completer: Arc<FakeCompleter>) -> ModelGateway {
    ModelGateway::new(embedder, completer, Duration::from_secs(5))
}

pub fn record(name: &str, email: Option<&str>, skills: &[&str]) -> CvRecord {
    CvRecord {
        personal_info: PersonalInfo {
            name: Some(name.to_string()),
            email: email.map(str::to_string),
            ..Default::default()
        },
        summary: Some(format!("{} CV", name)),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Insert a profile directly with a chosen embedding
pub fn seed_profile(
    storage: &StorageManager,
    record: CvRecord,
    embedding: Vec<f32>,
) -> i64 {
    storage
        .database
        .upsert_profile(&ProfileDraft {
            record,
            experience_score: 0.0,
            embedding,
            cv_document: None,
            cv_fingerprint: None,
        })
        .unwrap()
        .profile_id
}
