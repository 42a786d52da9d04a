//! Candidate profile data model
//!
//! `CvRecord` is what the extraction delegate returns; `CandidateProfile` is the
//! persisted, derived view. Child rows (experience, education, ...) are owned by
//! exactly one profile and replaced wholesale on every ingestion.

mod record;
mod recruitment;

pub use record::{CvRecord, PersonalInfo};
pub use recruitment::{FeedbackEntry, MemberStatus, ProjectMember, Rating, RecruitmentProject};

use serde::{Deserialize, Deserializer, Serialize};

/// A persisted candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: i64,
    pub name: String,
    pub surname: String,
    /// Identity key when present; profiles from email-less text stand alone
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    /// Free-text summary from the latest parse
    pub description: String,
    /// Derived on every ingestion, never taken from input
    pub experience_score: f64,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// Name of the stored CV document, if the profile came from an upload
    pub cv_document: Option<String>,
    pub cv_fingerprint: Option<String>,
    pub skills: Vec<Skill>,
    pub work_experiences: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub languages: Vec<Language>,
    pub publications: Vec<Publication>,
    pub activities: Vec<Activity>,
}

impl CandidateProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }

    pub fn skill_names(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Shared, case-insensitively unique skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// "MM.YYYY", "YYYY" or a present-tense marker
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Recomputed from the date range on every ingestion; `None` if unparsable
    #[serde(default, skip_deserializing)]
    pub duration_months: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies_used: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies_used: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default)]
    pub name: Option<String>,
    /// e.g. "B2", "C1", "native"
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outlet: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
