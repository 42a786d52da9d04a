//! Document extraction delegate
//!
//! Turns CV text into a [`CvRecord`]. The default implementation asks the
//! completion model for the record as JSON, then makes a second, best-effort
//! call that attributes skills to individual work-experience entries.

use crate::model::{extract_json_block, CompletionError, CompletionProvider};
use crate::profile::{CvRecord, WorkExperience};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("document is not readable text: {0}")]
    Unreadable(String),

    #[error("document contains no text")]
    EmptyDocument,

    #[error("extraction model failed: {0}")]
    Delegate(#[from] CompletionError),

    #[error("extraction model returned an invalid record: {0}")]
    MalformedRecord(String),
}

/// Extraction delegate: document → structured CV record
pub trait CvExtractor: Send + Sync {
    /// Extract a record from already-decoded CV text
    fn extract_text(&self, text: &str) -> Result<CvRecord, ExtractionError>;

    /// Extract a record from raw document bytes.
    ///
    /// The default accepts UTF-8 text documents only; converting other formats
    /// to text happens before this crate sees the bytes.
    fn extract(&self, document: &[u8]) -> Result<CvRecord, ExtractionError> {
        let text = std::str::from_utf8(document)
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        self.extract_text(text)
    }
}

static CONSENT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(?:wyrażam zgodę na przetwarzanie|i (?:hereby )?(?:agree|consent) to the processing).*?(?:RODO|GDPR)\)?\.",
    )
    .expect("static regex")
});

/// Remove data-processing consent paragraphs that CVs commonly end with
pub fn strip_consent_clause(text: &str) -> String {
    CONSENT_CLAUSE.replace_all(text, "").trim().to_string()
}

const EXTRACTION_PROMPT: &str = "\
You extract information from CVs into JSON with high precision. Return ONLY a JSON object with these keys:
- personal_info: {name, email, phone, linkedin, github} (linkedin/github may be usernames or full links)
- summary: the 'About me' or summary section
- work_experience: [{position, company, start_date (MM.YYYY), end_date (MM.YYYY or 'Present'), description, technologies_used: []}]
- education: [{institution, degree, start_date, end_date}]
- all_skills: a complete flat list of EVERY skill, technology and tool found anywhere in the CV
- languages: [{name, level}]
- publications: [{title, outlet, date}]
- activities: [{name, role, start_date, end_date, description}] (student groups, organisations, volunteering)
- projects: [{name, description, technologies_used: []}]
- achievements: [string] (awards, competition results, certificates)
Use null for unknown values and [] for empty lists.

CV text:
---
";

const ATTRIBUTION_PROMPT: &str = "\
For every work experience below, list which entries from the skill list were most likely used in it.
Return ONLY JSON shaped like {\"work_experience\": [{\"position\": \"...\", \"technologies_used\": [\"...\"]}]}.

";

#[derive(Debug, Deserialize)]
struct Attribution {
    #[serde(default)]
    work_experience: Vec<AttributedExperience>,
}

#[derive(Debug, Deserialize)]
struct AttributedExperience {
    position: Option<String>,
    #[serde(default)]
    technologies_used: Vec<String>,
}

/// Extraction through the completion model
pub struct CompletionCvExtractor {
    completer: Arc<dyn CompletionProvider>,
}

impl CompletionCvExtractor {
    pub fn new(completer: Arc<dyn CompletionProvider>) -> Self {
        Self { completer }
    }

    /// Fill per-experience technology tags; failures keep what extraction returned
    fn attribute_technologies(&self, record: &mut CvRecord) {
        if record.work_experience.is_empty() || record.skills.is_empty() {
            return;
        }

        let experiences: Vec<_> = record
            .work_experience
            .iter()
            .map(|exp| {
                serde_json::json!({
                    "position": exp.position,
                    "company": exp.company,
                    "description": exp.description,
                })
            })
            .collect();
        let prompt = format!(
            "{}Skill list: {:?}\nWork experience: {}",
            ATTRIBUTION_PROMPT,
            record.skills,
            serde_json::Value::Array(experiences)
        );

        let attribution = self
            .completer
            .complete(&prompt)
            .map_err(|e| e.to_string())
            .and_then(|reply| {
                let json = extract_json_block(&reply)
                    .ok_or_else(|| "no JSON in reply".to_string())?;
                serde_json::from_str::<Attribution>(json).map_err(|e| e.to_string())
            });

        match attribution {
            Ok(attribution) => apply_attribution(&mut record.work_experience, attribution),
            Err(e) => tracing::warn!("Technology attribution skipped: {}", e),
        }
    }
}

fn apply_attribution(experiences: &mut [WorkExperience], attribution: Attribution) {
    for exp in experiences.iter_mut() {
        let Some(position) = exp.position.as_deref() else {
            continue;
        };
        if let Some(found) = attribution
            .work_experience
            .iter()
            .find(|a| a.position.as_deref() == Some(position))
        {
            exp.technologies_used = found.technologies_used.clone();
        }
    }
}

impl CvExtractor for CompletionCvExtractor {
    fn extract_text(&self, text: &str) -> Result<CvRecord, ExtractionError> {
        let text = strip_consent_clause(text);
        if text.is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let reply = self
            .completer
            .complete(&format!("{}{}\n---", EXTRACTION_PROMPT, text))?;
        let json = extract_json_block(&reply)
            .ok_or_else(|| ExtractionError::MalformedRecord("no JSON object in reply".to_string()))?;
        let mut record: CvRecord = serde_json::from_str(json)
            .map_err(|e| ExtractionError::MalformedRecord(e.to_string()))?;

        self.attribute_technologies(&mut record);
        record.expand_contact_links();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned replies in order and records prompts
    struct ScriptedCompleter {
        replies: Mutex<Vec<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompleter {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl CompletionProvider for ScriptedCompleter {
        fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(CompletionError::EmptyResponse))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    const RECORD: &str = r#"```json
    {
        "personal_info": {"name": "Jan Kowalski", "email": "jan@example.com", "github": "jkowalski"},
        "summary": "Backend developer",
        "work_experience": [{"position": "Developer", "company": "Acme", "start_date": "01.2020", "end_date": "Present"}],
        "all_skills": ["Python", "Django"]
    }
    ```"#;

    #[test]
    fn test_strip_consent_clause() {
        let text = "Jan Kowalski\nPython\nWyrażam zgodę na przetwarzanie moich danych osobowych \
                    zgodnie z ustawą (RODO).";
        assert_eq!(strip_consent_clause(text), "Jan Kowalski\nPython");

        let english = "Skills: Rust\nI hereby consent to the processing of my personal data (GDPR).";
        assert_eq!(strip_consent_clause(english), "Skills: Rust");
    }

    #[test]
    fn test_extracts_record_and_attributes_technologies() {
        let completer = ScriptedCompleter::new(vec![
            Ok(RECORD.to_string()),
            Ok(r#"{"work_experience": [{"position": "Developer", "technologies_used": ["Django"]}]}"#
                .to_string()),
        ]);
        let extractor = CompletionCvExtractor::new(completer.clone());

        let record = extractor.extract(b"Jan Kowalski CV").unwrap();
        assert_eq!(record.personal_info.email(), Some("jan@example.com"));
        assert_eq!(
            record.personal_info.github.as_deref(),
            Some("https://github.com/jkowalski")
        );
        assert_eq!(record.work_experience[0].technologies_used, vec!["Django"]);
        assert_eq!(completer.prompts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_attribution_failure_keeps_record() {
        let completer = ScriptedCompleter::new(vec![
            Ok(RECORD.to_string()),
            Err(CompletionError::RequestError("offline".to_string())),
        ]);
        let extractor = CompletionCvExtractor::new(completer);

        let record = extractor.extract_text("Jan Kowalski CV").unwrap();
        assert!(record.work_experience[0].technologies_used.is_empty());
        assert_eq!(record.skills, vec!["Python", "Django"]);
    }

    #[test]
    fn test_extraction_failures() {
        let extractor = CompletionCvExtractor::new(ScriptedCompleter::new(vec![]));
        assert!(matches!(
            extractor.extract(&[0xff, 0xfe, 0x00]),
            Err(ExtractionError::Unreadable(_))
        ));
        assert!(matches!(
            extractor.extract_text("   "),
            Err(ExtractionError::EmptyDocument)
        ));
        assert!(matches!(
            extractor.extract_text("some cv"),
            Err(ExtractionError::Delegate(_))
        ));

        let extractor = CompletionCvExtractor::new(ScriptedCompleter::new(vec![Ok(
            "I cannot help with that".to_string(),
        )]));
        assert!(matches!(
            extractor.extract_text("some cv"),
            Err(ExtractionError::MalformedRecord(_))
        ));
    }
}
