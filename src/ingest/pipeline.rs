//! Idempotent CV ingestion
//!
//! bytes → fingerprint → cache hit short-circuit, or {store document, extract,
//! cache} → merge into the profile keyed by email.

use super::extractor::CvExtractor;
use crate::duration::{duration_in_months_at, experience_score};
use crate::error::{Result, SkillMatchError};
use crate::model::ModelGateway;
use crate::normalize::SkillAliases;
use crate::profile::{CandidateProfile, CvRecord};
use crate::storage::{fingerprint, ProfileDraft, StorageManager};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Where the record behind an ingestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Reused from the extraction cache
    Cache,
    /// Freshly extracted from the uploaded document
    Extracted,
    /// Extracted from submitted plain text
    Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub profile: CandidateProfile,
    pub source: RecordSource,
    /// False when an existing profile was updated or returned as is
    pub created: bool,
}

/// CV ingestion pipeline
#[derive(Clone)]
pub struct Ingestor {
    storage: Arc<StorageManager>,
    gateway: ModelGateway,
    extractor: Arc<dyn CvExtractor>,
    aliases: Arc<SkillAliases>,
}

impl Ingestor {
    pub fn new(
        storage: Arc<StorageManager>,
        gateway: ModelGateway,
        extractor: Arc<dyn CvExtractor>,
        aliases: Arc<SkillAliases>,
    ) -> Self {
        Self {
            storage,
            gateway,
            extractor,
            aliases,
        }
    }

    /// Ingest an uploaded CV document.
    ///
    /// On a cache hit the cached record is reused and a profile is created only
    /// if none exists for its email; an existing profile is returned unchanged.
    pub async fn ingest(&self, document: &[u8], extension: Option<&str>) -> Result<IngestOutcome> {
        if document.is_empty() {
            return Err(SkillMatchError::Extraction("document is empty".to_string()));
        }

        let fingerprint = fingerprint(document);

        let cached = {
            let fingerprint = fingerprint.clone();
            self.storage
                .run_blocking("cache lookup", move |s| s.database.cached_record(&fingerprint))
                .await?
        };
        if let Some(record) = cached {
            tracing::info!("Cache hit for {}", short(&fingerprint));

            // Email-less records have no identity key; the fingerprint stands in
            let email = record.personal_info.email().map(str::to_string);
            let key = fingerprint.clone();
            let existing = self
                .storage
                .run_blocking("profile lookup", move |s| match email {
                    Some(email) => s.database.find_profile_id_by_email(&email),
                    None => s.database.find_profile_id_by_fingerprint(&key),
                })
                .await?;
            if let Some(id) = existing {
                tracing::info!("Profile {} already exists, returning it unchanged", id);
                return Ok(IngestOutcome {
                    profile: self.load_profile(id).await?,
                    source: RecordSource::Cache,
                    created: false,
                });
            }

            let (profile, created) = self.merge(record, None, Some(fingerprint)).await?;
            return Ok(IngestOutcome {
                profile,
                source: RecordSource::Cache,
                created,
            });
        }

        tracing::info!("Cache miss for {}, extracting", short(&fingerprint));
        let document_name = {
            let bytes = document.to_vec();
            let extension = extension.map(str::to_string);
            self.storage
                .run_blocking("document store", move |s| {
                    s.documents.store(&bytes, extension.as_deref())
                })
                .await?
        };

        let extractor = Arc::clone(&self.extractor);
        let bytes = document.to_vec();
        let extracted = match self.gateway.offload(move || extractor.extract(&bytes)).await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(e)) => Err(SkillMatchError::Extraction(e.to_string())),
            Err(e) => Err(SkillMatchError::Extraction(e.to_string())),
        };
        let record = match extracted {
            Ok(record) => record,
            Err(e) => {
                self.discard_document(&document_name).await;
                return Err(e);
            }
        };

        let cache_write = {
            let fingerprint = fingerprint.clone();
            let record = record.clone();
            self.storage
                .run_blocking("cache write", move |s| {
                    s.database.cache_record(&fingerprint, &record)
                })
                .await
        };
        if let Err(e) = cache_write {
            tracing::warn!("Failed to cache extraction for {}: {}", short(&fingerprint), e);
        }

        match self
            .merge(record, Some(document_name.clone()), Some(fingerprint))
            .await
        {
            Ok((profile, created)) => Ok(IngestOutcome {
                profile,
                source: RecordSource::Extracted,
                created,
            }),
            Err(e) => {
                self.discard_document(&document_name).await;
                Err(e)
            }
        }
    }

    /// Ingest a CV submitted as plain text. No document is stored and the
    /// cache is not consulted.
    pub async fn ingest_text(&self, text: &str) -> Result<IngestOutcome> {
        if text.trim().is_empty() {
            return Err(SkillMatchError::Validation(
                "CV text must not be empty".to_string(),
            ));
        }

        let extractor = Arc::clone(&self.extractor);
        let text = text.to_string();
        let record = self
            .gateway
            .offload(move || extractor.extract_text(&text))
            .await
            .map_err(|e| SkillMatchError::Extraction(e.to_string()))?
            .map_err(|e| SkillMatchError::Extraction(e.to_string()))?;

        let (profile, created) = self.merge(record, None, None).await?;
        Ok(IngestOutcome {
            profile,
            source: RecordSource::Text,
            created,
        })
    }

    /// Derive every computed field, then write the profile in one transaction
    async fn merge(
        &self,
        mut record: CvRecord,
        cv_document: Option<String>,
        cv_fingerprint: Option<String>,
    ) -> Result<(CandidateProfile, bool)> {
        let today = Utc::now().date_naive();

        record.skills = self.aliases.normalize_all(&record.skills);
        for exp in &mut record.work_experience {
            exp.duration_months = duration_in_months_at(
                exp.start_date.as_deref().unwrap_or_default(),
                exp.end_date.as_deref().unwrap_or_default(),
                today,
            );
        }
        let score = experience_score(&record, today);

        let embedding = self.gateway.embed(&embedding_text(&record)).await?;

        let draft = ProfileDraft {
            record,
            experience_score: score,
            embedding,
            cv_document,
            cv_fingerprint,
        };
        let outcome = self
            .storage
            .run_blocking("profile upsert", move |s| s.database.upsert_profile(&draft))
            .await?;

        if let Some(previous) = &outcome.replaced_document {
            self.discard_document(previous).await;
        }

        tracing::info!(
            "{} profile {} (experience score {:.2})",
            if outcome.created { "Created" } else { "Updated" },
            outcome.profile_id,
            score
        );
        let profile = self.load_profile(outcome.profile_id).await?;
        Ok((profile, outcome.created))
    }

    async fn load_profile(&self, id: i64) -> Result<CandidateProfile> {
        self.storage
            .run_blocking("profile load", move |s| s.database.get_profile(id))
            .await
    }

    async fn discard_document(&self, name: &str) {
        let owned = name.to_string();
        let deleted = self
            .storage
            .run_blocking("document delete", move |s| s.documents.delete(&owned))
            .await;
        if let Err(e) = deleted {
            tracing::warn!("Failed to delete document {}: {}", name, e);
        }
    }
}

/// Text the profile embedding is computed from: summary, every experience and
/// project description, then the flattened skill list
pub fn embedding_text(record: &CvRecord) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(summary) = record.summary.as_deref() {
        parts.push(summary);
    }
    parts.extend(
        record
            .work_experience
            .iter()
            .filter_map(|exp| exp.description.as_deref()),
    );
    parts.extend(
        record
            .projects
            .iter()
            .filter_map(|project| project.description.as_deref()),
    );

    let skills = record.skills.join(", ");
    if !skills.is_empty() {
        parts.push(&skills);
    }

    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(12)]
}
