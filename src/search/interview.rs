//! Interview question generation for one candidate

use crate::model::{extract_json_block, ModelGateway};
use crate::profile::CandidateProfile;

pub const MAX_QUESTIONS: usize = 5;

fn questions_prompt(profile: &CandidateProfile, query: &str) -> String {
    format!(
        "You are a technical recruiter. Write {} interview questions.\n\
         QUERY: \"{}\"\n\
         CANDIDATE PROFILE: Name: {}, Summary: {}, Skills: {}\n\
         Base the questions on this data. Return ONLY a JSON list, e.g. [\"Question 1\", ...].",
        MAX_QUESTIONS,
        query,
        profile.full_name(),
        profile.description,
        profile.skill_names().join(", ")
    )
}

/// Parse a JSON string array out of the reply, dropping blanks, capped at
/// [`MAX_QUESTIONS`]
pub fn parse_questions(reply: &str) -> Option<Vec<String>> {
    let json = extract_json_block(reply)?;
    let questions: Vec<String> = serde_json::from_str(json).ok()?;
    Some(
        questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(MAX_QUESTIONS)
            .collect(),
    )
}

/// Questions tailored to the profile and query; empty when the model fails
pub async fn interview_questions(
    gateway: &ModelGateway,
    profile: &CandidateProfile,
    query: &str,
) -> Vec<String> {
    match gateway.complete(&questions_prompt(profile, query)).await {
        Ok(reply) => parse_questions(&reply).unwrap_or_else(|| {
            tracing::warn!("Interview question reply was not a JSON list");
            Vec::new()
        }),
        Err(e) => {
            tracing::warn!("Interview question generation failed: {}", e);
            Vec::new()
        }
    }
}
