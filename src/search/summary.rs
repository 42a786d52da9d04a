//! Summary composer and the user-facing outcome messages

use super::RankedProfile;
use crate::model::ModelGateway;

/// Shown when neither finder returned a candidate
pub const NO_CANDIDATES_MESSAGE: &str = "No candidates in the database match this query.";

/// Shown when candidates were found but none scored above the threshold
pub const BELOW_THRESHOLD_MESSAGE: &str =
    "Candidates were found, but after detailed analysis none matched the query closely enough.";

/// Used when the summary call fails or returns nothing
pub const FALLBACK_SUMMARY: &str =
    "Matching candidates are listed below, ranked by match score.";

#[derive(Clone)]
pub struct SummaryComposer {
    gateway: ModelGateway,
}

impl SummaryComposer {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    /// One completion call over `top` (name, skills, match score); never fails
    pub async fn compose(&self, query: &str, top: &[RankedProfile]) -> String {
        if top.is_empty() {
            return FALLBACK_SUMMARY.to_string();
        }

        match self.gateway.complete(&summary_prompt(query, top)).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => FALLBACK_SUMMARY.to_string(),
            Err(e) => {
                tracing::warn!("Summary generation failed, using fallback: {}", e);
                FALLBACK_SUMMARY.to_string()
            }
        }
    }
}

fn summary_prompt(query: &str, top: &[RankedProfile]) -> String {
    let profiles: Vec<String> = top
        .iter()
        .map(|ranked| {
            format!(
                "- Profile: {}, Skills: {}, MATCH: {}%",
                ranked.profile.full_name(),
                ranked.profile.skill_names().join(", "),
                ranked.match_score
            )
        })
        .collect();

    format!(
        "You are a recruitment assistant. Review the candidate profiles and answer the query. \
         In 1-2 sentences explain why the candidates fit and point out the best one.\n\
         CONTEXT: Candidate profiles:\n{}\nQUERY: \"{}\"",
        profiles.join("\n"),
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{CandidateProfile, Skill};
    use crate::search::ScoreBreakdown;

    fn ranked(name: &str, score: u8) -> RankedProfile {
        RankedProfile {
            profile: CandidateProfile {
                id: 1,
                name: name.to_string(),
                surname: "Nowak".to_string(),
                email: None,
                phone: None,
                linkedin_url: None,
                github_url: None,
                description: String::new(),
                experience_score: 0.0,
                embedding: Vec::new(),
                cv_document: None,
                cv_fingerprint: None,
                skills: vec![Skill {
                    id: 1,
                    name: "Python".to_string(),
                }],
                work_experiences: Vec::new(),
                education: Vec::new(),
                projects: Vec::new(),
                languages: Vec::new(),
                publications: Vec::new(),
                activities: Vec::new(),
            },
            match_score: score,
            scores: ScoreBreakdown {
                abilities_score: 0.0,
                skills_score: 1.0,
                semantic_score: 0.9,
                match_score: score,
            },
        }
    }

    #[test]
    fn test_prompt_lists_each_profile() {
        let prompt = summary_prompt("python dev", &[ranked("Anna", 48), ranked("Jan", 40)]);
        assert!(prompt.contains("- Profile: Anna Nowak, Skills: Python, MATCH: 48%"));
        assert!(prompt.contains("- Profile: Jan Nowak, Skills: Python, MATCH: 40%"));
        assert!(prompt.contains("QUERY: \"python dev\""));
    }

    #[test]
    fn test_messages_are_distinct() {
        assert_ne!(NO_CANDIDATES_MESSAGE, BELOW_THRESHOLD_MESSAGE);
        assert_ne!(FALLBACK_SUMMARY, BELOW_THRESHOLD_MESSAGE);
    }
}
