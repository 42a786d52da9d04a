//! Search orchestration
//!
//! query -> deconstruct -> (keyword || similarity) -> merge -> verify -> fuse
//! -> rank -> summarize

use super::summary::{BELOW_THRESHOLD_MESSAGE, NO_CANDIDATES_MESSAGE};
use super::{
    merge_candidates, rank, AbilityVerifier, Candidate, DeconstructedQuery, FusionWeights,
    QueryDeconstructor, ScoreBreakdown, SummaryComposer,
};
use crate::config::SearchConfig;
use crate::error::{Result, SkillMatchError};
use crate::model::ModelGateway;
use crate::profile::CandidateProfile;
use crate::storage::StorageManager;
use ahash::HashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Matched,
    /// Neither finder returned a candidate
    NoCandidates,
    /// Candidates existed but none scored above the threshold
    BelowThreshold,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedProfile {
    pub profile: CandidateProfile,
    pub match_score: u8,
    pub scores: ScoreBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub status: SearchStatus,
    pub summary: String,
    pub deconstruction: DeconstructedQuery,
    pub ranked: Vec<RankedProfile>,
}

/// Text the verifier judges a candidate by
pub fn profile_context(profile: &CandidateProfile) -> String {
    let education: Vec<String> = profile
        .education
        .iter()
        .map(|e| {
            [e.degree.as_deref(), e.institution.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|e| !e.is_empty())
        .collect();

    let mut experience: Vec<&str> = Vec::new();
    if !profile.description.is_empty() {
        experience.push(&profile.description);
    }
    experience.extend(
        profile
            .work_experiences
            .iter()
            .filter_map(|w| w.description.as_deref()),
    );
    experience.extend(profile.projects.iter().filter_map(|p| p.description.as_deref()));

    format!(
        "Education: {}. Skills: {}. Experience and projects: {}",
        education.join("; "),
        profile.skill_names().join(", "),
        experience.join(" ")
    )
}

pub struct CandidateSearcher {
    storage: Arc<StorageManager>,
    gateway: ModelGateway,
    deconstructor: QueryDeconstructor,
    verifier: Arc<dyn AbilityVerifier>,
    composer: SummaryComposer,
    config: SearchConfig,
}

impl CandidateSearcher {
    pub fn new(
        storage: Arc<StorageManager>,
        gateway: ModelGateway,
        deconstructor: QueryDeconstructor,
        verifier: Arc<dyn AbilityVerifier>,
        config: SearchConfig,
    ) -> Self {
        let composer = SummaryComposer::new(gateway.clone());
        Self {
            storage,
            gateway,
            deconstructor,
            verifier,
            composer,
            config,
        }
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SkillMatchError::Validation(
                "search query cannot be empty".to_string(),
            ));
        }

        let deconstruction = self.deconstructor.deconstruct(query).await;
        tracing::debug!(
            "Deconstructed query: {} skills, {} abilities",
            deconstruction.explicit_skills.len(),
            deconstruction.implied_abilities.len()
        );

        let (keyword_hits, similar) = tokio::join!(
            self.keyword_search(&deconstruction.explicit_skills),
            self.similarity_search(query)
        );
        let keyword_hits = keyword_hits?;
        let similar = similar?;
        tracing::debug!(
            "Finders returned {} keyword and {} similar candidates",
            keyword_hits.len(),
            similar.len()
        );

        let mut candidates =
            merge_candidates(&keyword_hits, &similar, self.config.keyword_default_distance);
        if candidates.is_empty() {
            return Ok(SearchOutcome {
                query: query.to_string(),
                status: SearchStatus::NoCandidates,
                summary: NO_CANDIDATES_MESSAGE.to_string(),
                deconstruction,
                ranked: Vec::new(),
            });
        }
        if candidates.len() > self.config.max_candidates {
            tracing::debug!(
                "Capping {} candidates at {}",
                candidates.len(),
                self.config.max_candidates
            );
            candidates.truncate(self.config.max_candidates);
        }

        let scored = self.score_candidates(&candidates, &deconstruction).await?;
        let ranked: Vec<RankedProfile> = rank(
            scored,
            self.config.min_match_score,
            self.config.present_limit,
        )
        .into_iter()
        .map(|(ranked, _)| ranked)
        .collect();

        if ranked.is_empty() {
            return Ok(SearchOutcome {
                query: query.to_string(),
                status: SearchStatus::BelowThreshold,
                summary: BELOW_THRESHOLD_MESSAGE.to_string(),
                deconstruction,
                ranked,
            });
        }

        let top = &ranked[..ranked.len().min(self.config.summary_limit)];
        let summary = self.composer.compose(query, top).await;

        tracing::info!("Search matched {} candidates", ranked.len());
        Ok(SearchOutcome {
            query: query.to_string(),
            status: SearchStatus::Matched,
            summary,
            deconstruction,
            ranked,
        })
    }

    /// Interview questions for one profile; unknown profile is NotFound
    pub async fn interview_questions(&self, profile_id: i64, query: &str) -> Result<Vec<String>> {
        let profile = self
            .storage
            .run_blocking("profile lookup", move |s| s.database.get_profile(profile_id))
            .await?;

        Ok(super::interview::interview_questions(&self.gateway, &profile, query).await)
    }

    async fn keyword_search(&self, tokens: &[String]) -> Result<Vec<i64>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let tokens = tokens.to_vec();
        self.storage
            .run_blocking("keyword search", move |s| s.database.keyword_candidates(&tokens))
            .await
    }

    async fn similarity_search(&self, query: &str) -> Result<Vec<(i64, f32)>> {
        let embedding = self.gateway.embed(query).await?;
        let limit = self.config.retrieval_limit;
        self.storage
            .run_blocking("similarity search", move |s| {
                s.database.nearest_profiles(&embedding, limit)
            })
            .await
    }

    /// Load, verify and score every candidate, keeping merge order
    async fn score_candidates(
        &self,
        candidates: &[Candidate],
        deconstruction: &DeconstructedQuery,
    ) -> Result<Vec<(RankedProfile, u8)>> {
        let ids: Vec<i64> = candidates.iter().map(|c| c.profile_id).collect();
        let profiles = self
            .storage
            .run_blocking("profile load", move |s| s.database.get_profiles(&ids))
            .await?;

        let verdicts = self
            .verify_all(&profiles, &deconstruction.implied_abilities)
            .await;
        let weights = FusionWeights::from(&self.config);
        let distances: HashMap<i64, f32> = candidates
            .iter()
            .map(|c| (c.profile_id, c.distance))
            .collect();

        let mut scored = Vec::with_capacity(profiles.len());
        for (profile, verdicts) in profiles.into_iter().zip(verdicts) {
            let distance = distances
                .get(&profile.id)
                .copied()
                .unwrap_or(self.config.keyword_default_distance);
            let scores = ScoreBreakdown::compute(
                &verdicts,
                &deconstruction.implied_abilities,
                &deconstruction.explicit_skills,
                &profile.skill_names(),
                distance,
                &weights,
            );
            tracing::debug!(
                "Profile {} scored {} (abilities {:.2}, skills {:.2}, semantic {:.2})",
                profile.id,
                scores.match_score,
                scores.abilities_score,
                scores.skills_score,
                scores.semantic_score
            );
            scored.push((
                RankedProfile {
                    match_score: scores.match_score,
                    profile,
                    scores,
                },
                scores.match_score,
            ));
        }
        Ok(scored)
    }

    /// One verdict list per profile, in profile order; candidates are verified
    /// concurrently
    async fn verify_all(
        &self,
        profiles: &[CandidateProfile],
        abilities: &[String],
    ) -> Vec<Vec<bool>> {
        if abilities.is_empty() {
            return vec![Vec::new(); profiles.len()];
        }

        let abilities: Arc<[String]> = abilities.into();
        let mut tasks = JoinSet::new();
        for (index, profile) in profiles.iter().enumerate() {
            let verifier = Arc::clone(&self.verifier);
            let abilities = Arc::clone(&abilities);
            let context = profile_context(profile);
            tasks.spawn(async move { (index, verifier.verify(&context, &abilities).await) });
        }

        let mut verdicts = vec![vec![false; abilities.len()]; profiles.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => verdicts[index] = result,
                Err(e) => tracing::warn!("Verification task failed: {}", e),
            }
        }
        verdicts
    }
}
