//! Skillmatch - hybrid candidate matching over CV-derived profiles
//!
//! CVs are ingested idempotently into structured profiles (keyed by email,
//! cached by content fingerprint). Recruiter queries are answered by fusing
//! keyword matches, embedding similarity and model-verified implied abilities
//! into one ranked list with a short summary.

pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod profile;
pub mod search;
pub mod storage;

pub use error::{Result, SkillMatchError};
