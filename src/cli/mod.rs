//! CLI command definitions and parsing
use crate::profile::{MemberStatus, Rating};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "skillmatch",
    version,
    about = "Hybrid candidate search over CV-derived profiles",
    long_about = "Skillmatch ingests CVs into structured candidate profiles and answers free-text \
                  recruiter queries by fusing keyword, semantic and model-verified ability signals \
                  into one match score."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/skillmatch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a CV document (UTF-8 text: .txt, .md, text exports of PDFs)
    Ingest {
        /// Path to the CV file
        file: PathBuf,
    },

    /// Ingest a CV submitted as plain text
    IngestText {
        /// Path to a text file, or "-" for stdin
        #[arg(default_value = "-")]
        source: String,
    },

    /// Search candidates with a free-text query
    Search {
        /// Recruiter query, e.g. "python developer who can build APIs"
        query: String,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Browse stored profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },

    /// Write the stored CV document of a profile to a file
    Document {
        /// Profile ID
        profile_id: i64,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Record whether a search result was relevant
    Feedback {
        /// Query the result came from
        query: String,

        /// Profile ID
        profile_id: i64,

        /// relevant or irrelevant
        rating: Rating,
    },

    /// Generate interview questions for a candidate
    Questions {
        /// Profile ID
        profile_id: i64,

        /// Query the candidate is being considered for
        query: String,
    },

    /// Manage recruitment projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Show storage statistics
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfilesAction {
    /// List profiles ordered by surname
    List {
        /// Case-insensitive name or surname filter
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show one profile in full
    Show {
        /// Profile ID
        id: i64,

        /// Show the profile in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Create a recruitment project
    Create {
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List recruitment projects
    List,

    /// Show a project and its members
    Show { id: i64 },

    /// Add a candidate to a project
    Add { project_id: i64, profile_id: i64 },

    /// Change a member's status or notes
    Update {
        project_id: i64,
        profile_id: i64,

        /// new, screening, interview, offer, hired or rejected
        #[arg(short, long)]
        status: Option<MemberStatus>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Remove a candidate from a project
    Remove { project_id: i64, profile_id: i64 },

    /// List a project's members in order
    Members { project_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_project_update() {
        let cli = Cli::try_parse_from([
            "skillmatch", "project", "update", "1", "2", "--status", "interview",
        ])
        .unwrap();
        match cli.command {
            Commands::Project {
                action: ProjectAction::Update { status, notes, .. },
            } => {
                assert_eq!(status, Some(MemberStatus::Interview));
                assert!(notes.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_feedback_rating() {
        let cli = Cli::try_parse_from(["skillmatch", "feedback", "rust dev", "3", "irrelevant"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Feedback {
                rating: Rating::Irrelevant,
                ..
            }
        ));
    }
}
