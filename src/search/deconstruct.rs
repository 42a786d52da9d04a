//! Query deconstruction: explicit skill tokens vs. implied abilities

use crate::model::{extract_json_block, ModelGateway};
use crate::normalize::SkillAliases;
use ahash::{HashSet, HashSetExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DECONSTRUCT_PROMPT: &str = "\
Analyse the recruitment query below and split it into two categories:
- explicit_skills: concrete technologies, tools or skills named literally in the query (e.g. \"Python\", \"React\")
- implied_abilities: general abilities, functions or roles the recruiter is asking for (e.g. \"can build APIs\", \"cloud experience\", \"is a data analyst\")
Return ONLY a JSON object: {\"explicit_skills\": [...], \"implied_abilities\": [...]}

Query: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeconstructedQuery {
    #[serde(default)]
    pub explicit_skills: Vec<String>,
    #[serde(default)]
    pub implied_abilities: Vec<String>,
}

impl DeconstructedQuery {
    pub fn is_empty(&self) -> bool {
        self.explicit_skills.is_empty() && self.implied_abilities.is_empty()
    }
}

/// Splits a query with one completion call.
///
/// Any failure yields an empty deconstruction, which leaves pure semantic
/// matching.
#[derive(Clone)]
pub struct QueryDeconstructor {
    gateway: ModelGateway,
    aliases: Arc<SkillAliases>,
}

impl QueryDeconstructor {
    pub fn new(gateway: ModelGateway, aliases: Arc<SkillAliases>) -> Self {
        Self { gateway, aliases }
    }

    pub async fn deconstruct(&self, query: &str) -> DeconstructedQuery {
        let reply = match self
            .gateway
            .complete(&format!("{}\"{}\"", DECONSTRUCT_PROMPT, query))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Query deconstruction failed, using semantic matching only: {}", e);
                return DeconstructedQuery::default();
            }
        };

        match parse_deconstruction(&reply) {
            Some(parsed) => DeconstructedQuery {
                explicit_skills: self.aliases.normalize_all(&parsed.explicit_skills),
                implied_abilities: dedup_statements(parsed.implied_abilities),
            },
            None => {
                tracing::warn!("Query deconstruction reply was not valid JSON");
                DeconstructedQuery::default()
            }
        }
    }
}

fn parse_deconstruction(reply: &str) -> Option<DeconstructedQuery> {
    let json = extract_json_block(reply)?;
    serde_json::from_str(json).ok()
}

/// Trim, drop blanks and case-insensitive duplicates, keep first occurrence
fn dedup_statements(statements: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    statements
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"explicit_skills\": [\"Python\"], \"implied_abilities\": [\"builds APIs\"]}\n```";
        let parsed = parse_deconstruction(reply).unwrap();
        assert_eq!(parsed.explicit_skills, vec!["Python"]);
        assert_eq!(parsed.implied_abilities, vec!["builds APIs"]);
    }

    #[test]
    fn test_parse_missing_keys_and_garbage() {
        let parsed = parse_deconstruction("{\"explicit_skills\": [\"Go\"]}").unwrap();
        assert!(parsed.implied_abilities.is_empty());
        assert!(parse_deconstruction("no idea").is_none());
    }

    #[test]
    fn test_dedup_statements() {
        let deduped = dedup_statements(vec![
            "Leads a team".to_string(),
            " leads a team ".to_string(),
            "".to_string(),
            "Mentors juniors".to_string(),
        ]);
        assert_eq!(deduped, vec!["Leads a team", "Mentors juniors"]);
    }
}
