//! Recruitment projects and search feedback

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage of a candidate within a recruitment project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    New,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Screening => "screening",
            Self::Interview => "interview",
            Self::Offer => "offer",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "screening" => Ok(Self::Screening),
            "interview" => Ok(Self::Interview),
            "offer" => Ok(Self::Offer),
            "hired" => Ok(Self::Hired),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown member status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruitmentProject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A candidate on a project's ordered member list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub project_id: i64,
    pub profile_id: i64,
    /// 1-based position in the member list
    pub position: i64,
    pub status: MemberStatus,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// Recruiter's verdict on one search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Relevant,
    Irrelevant,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevant => "relevant",
            Self::Irrelevant => "irrelevant",
        }
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevant" | "up" | "good" => Ok(Self::Relevant),
            "irrelevant" | "down" | "bad" => Ok(Self::Irrelevant),
            other => Err(format!("unknown rating: {}", other)),
        }
    }
}

/// Append-only feedback log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: i64,
    pub query: String,
    pub profile_id: i64,
    pub rating: Rating,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            MemberStatus::New,
            MemberStatus::Screening,
            MemberStatus::Interview,
            MemberStatus::Offer,
            MemberStatus::Hired,
            MemberStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<MemberStatus>().unwrap(), status);
        }
        assert!("archived".parse::<MemberStatus>().is_err());
        assert_eq!(MemberStatus::default(), MemberStatus::New);
    }

    #[test]
    fn test_rating_parse() {
        assert_eq!("Relevant".parse::<Rating>().unwrap(), Rating::Relevant);
        assert_eq!("down".parse::<Rating>().unwrap(), Rating::Irrelevant);
        assert!("maybe".parse::<Rating>().is_err());
    }
}
