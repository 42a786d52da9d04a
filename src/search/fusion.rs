//! Score fusion: ability, skill and semantic signals into one 0-100 match score

use crate::config::SearchConfig;
use ahash::HashSet;
use serde::Serialize;

/// Weights of the three signals; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub abilities: f64,
    pub skills: f64,
    pub semantic: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            abilities: 0.5,
            skills: 0.3,
            semantic: 0.2,
        }
    }
}

impl From<&SearchConfig> for FusionWeights {
    fn from(config: &SearchConfig) -> Self {
        Self {
            abilities: config.abilities_weight,
            skills: config.skills_weight,
            semantic: config.semantic_weight,
        }
    }
}

/// Per-candidate signals and the fused score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub abilities_score: f64,
    pub skills_score: f64,
    pub semantic_score: f64,
    pub match_score: u8,
}

impl ScoreBreakdown {
    pub fn compute(
        verdicts: &[bool],
        requested_abilities: &[String],
        requested_skills: &[String],
        held_skills: &[&str],
        distance: f32,
        weights: &FusionWeights,
    ) -> Self {
        let abilities_score = abilities_score(verdicts, requested_abilities.len());
        let skills_score = skills_score(requested_skills, held_skills);
        let semantic_score = semantic_score(distance);
        Self {
            abilities_score,
            skills_score,
            semantic_score,
            match_score: match_score(abilities_score, skills_score, semantic_score, weights),
        }
    }
}

/// Fraction of requested abilities verified; 0 when none were requested.
///
/// Verdicts are matched to abilities by position. A missing verdict counts as
/// not verified and surplus verdicts are ignored.
pub fn abilities_score(verdicts: &[bool], requested: usize) -> f64 {
    if requested == 0 {
        return 0.0;
    }
    let verified = verdicts.iter().take(requested).filter(|v| **v).count();
    verified as f64 / requested as f64
}

/// Fraction of requested skills present in the candidate's skill set
/// (exact name, case-insensitive); 0 when none were requested
pub fn skills_score(requested: &[String], held: &[&str]) -> f64 {
    if requested.is_empty() {
        return 0.0;
    }
    let held: HashSet<String> = held.iter().map(|s| s.to_lowercase()).collect();
    let matched = requested
        .iter()
        .filter(|skill| held.contains(&skill.to_lowercase()))
        .count();
    matched as f64 / requested.len() as f64
}

pub fn semantic_score(distance: f32) -> f64 {
    (1.0 - distance as f64).max(0.0)
}

/// Weighted sum scaled to 0-100 and rounded half away from zero
pub fn match_score(abilities: f64, skills: f64, semantic: f64, weights: &FusionWeights) -> u8 {
    let fused = abilities * weights.abilities + skills * weights.skills + semantic * weights.semantic;
    (fused * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Keep items scoring strictly above `min_exclusive`, sort by score descending
/// (stable, so ties keep their input order) and keep the first `limit`
pub fn rank<T>(scored: Vec<(T, u8)>, min_exclusive: u8, limit: usize) -> Vec<(T, u8)> {
    let mut kept: Vec<(T, u8)> = scored
        .into_iter()
        .filter(|(_, score)| *score > min_exclusive)
        .collect();
    kept.sort_by(|a, b| b.1.cmp(&a.1));
    kept.truncate(limit);
    kept
}
