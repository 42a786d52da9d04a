//! Hybrid candidate search
//!
//! A query is split into explicit skills and implied abilities. Skills drive a
//! keyword finder, the raw query drives a similarity finder, and the merged
//! candidates are scored on three signals:
//! - abilities: share of implied abilities a completion model confirms
//! - skills: share of explicit skills the candidate holds
//! - semantic: embedding distance to the query

mod deconstruct;
mod fusion;
mod interview;
mod merge;
mod searcher;
mod summary;
mod verify;

pub use deconstruct::{DeconstructedQuery, QueryDeconstructor};
pub use fusion::{
    abilities_score, match_score, rank, semantic_score, skills_score, FusionWeights,
    ScoreBreakdown,
};
pub use interview::{parse_questions, MAX_QUESTIONS};
pub use merge::{merge_candidates, Candidate};
pub use searcher::{profile_context, CandidateSearcher, RankedProfile, SearchOutcome, SearchStatus};
pub use summary::{
    SummaryComposer, BELOW_THRESHOLD_MESSAGE, FALLBACK_SUMMARY, NO_CANDIDATES_MESSAGE,
};
pub use verify::{is_affirmative, AbilityVerifier, CompletionAbilityVerifier, AFFIRMATIVE_TOKEN};
