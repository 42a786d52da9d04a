//! Structured CV record produced by the extraction delegate

use super::{null_as_default, Activity, Education, Language, Project, Publication, WorkExperience};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// Full name as written on the CV
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Profile URL or bare handle
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

impl PersonalInfo {
    /// Identity key: trimmed email, `None` when blank
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Split the full name into (first name, rest)
    pub fn split_name(&self) -> (String, String) {
        let mut parts = self.name.as_deref().unwrap_or_default().split_whitespace();
        let name = parts.next().unwrap_or_default().to_string();
        let surname = parts.collect::<Vec<_>>().join(" ");
        (name, surname)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<Education>,
    /// Flat list of every skill, tool and technology on the CV, un-normalized
    #[serde(default, alias = "all_skills", deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<Language>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub publications: Vec<Publication>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
}

impl CvRecord {
    /// Expand bare LinkedIn/GitHub handles into profile URLs
    pub fn expand_contact_links(&mut self) {
        let info = &mut self.personal_info;
        info.linkedin = info
            .linkedin
            .take()
            .and_then(|link| expand_link(&link, "https://www.linkedin.com/in/"));
        info.github = info
            .github
            .take()
            .and_then(|link| expand_link(&link, "https://github.com/"));
    }
}

fn expand_link(link: &str, prefix: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        None
    } else if link.starts_with("http") {
        Some(link.to_string())
    } else {
        Some(format!("{}{}", prefix, link.trim_start_matches('@')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerates_nulls_and_aliases() {
        let json = r#"{
            "personal_info": {"name": "Anna Maria Nowak", "email": " anna@example.com "},
            "summary": null,
            "work_experience": null,
            "all_skills": ["Rust", "reactjs"],
            "projects": [{"name": "crawler", "technologies_used": null}]
        }"#;
        let record: CvRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.personal_info.email(), Some("anna@example.com"));
        assert_eq!(
            record.personal_info.split_name(),
            ("Anna".to_string(), "Maria Nowak".to_string())
        );
        assert!(record.work_experience.is_empty());
        assert_eq!(record.skills, vec!["Rust", "reactjs"]);
        assert!(record.projects[0].technologies_used.is_empty());
    }

    #[test]
    fn test_blank_email_is_no_identity() {
        let info = PersonalInfo {
            email: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(info.email(), None);
        assert_eq!(info.split_name(), (String::new(), String::new()));
    }

    #[test]
    fn test_expand_contact_links() {
        let mut record = CvRecord::default();
        record.personal_info.linkedin = Some("anowak".to_string());
        record.personal_info.github = Some("https://github.com/anowak".to_string());
        record.expand_contact_links();

        assert_eq!(
            record.personal_info.linkedin.as_deref(),
            Some("https://www.linkedin.com/in/anowak")
        );
        assert_eq!(
            record.personal_info.github.as_deref(),
            Some("https://github.com/anowak")
        );
    }
}
