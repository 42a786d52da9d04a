//! Configuration management for skillmatch
//!
//! A TOML file (default `<config_dir>/skillmatch/config.toml`) with environment
//! overrides of the form `SKILLMATCH_SECTION__KEY=value`. Missing sections fall
//! back to their defaults, so a config file only needs the keys it changes.

use crate::error::{Result, SkillMatchError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta", default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            schema_version: "1.0.0".to_string(),
            created_at: current_timestamp(),
            last_modified: current_timestamp(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Holds the SQLite database and the `documents/` store; `~/` is expanded
    pub data_dir: PathBuf,
    /// Documents at least this large (bytes) are zstd-compressed on disk
    pub compression_threshold: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/.skillmatch"),
            compression_threshold: 1024,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "offline" (local fastembed model) or "online" (the llm endpoint)
    pub mode: String,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: "offline".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
        }
    }
}

/// Completion model configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    /// Per-call timeout for every embedding and completion delegate call
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Matching and ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Nearest profiles fetched by the similarity finder
    pub retrieval_limit: usize,
    /// Ranked profiles returned to the caller
    pub present_limit: usize,
    /// Top profiles described in the summary
    pub summary_limit: usize,
    /// Profiles must score strictly above this to be presented
    pub min_match_score: u8,
    /// Distance assigned to profiles found only by keyword
    pub keyword_default_distance: f32,
    pub abilities_weight: f64,
    pub skills_weight: f64,
    pub semantic_weight: f64,
    /// Upper bound on merged candidates sent to ability verification
    pub max_candidates: usize,
    /// Concurrent ability-verification calls
    pub max_verify_concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            retrieval_limit: 10,
            present_limit: 5,
            summary_limit: 3,
            min_match_score: 35,
            keyword_default_distance: 1.0,
            abilities_weight: 0.5,
            skills_weight: 0.3,
            semantic_weight: 0.2,
            max_candidates: 25,
            max_verify_concurrency: 8,
        }
    }
}

/// Extra skill aliases merged over the built-in table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// alias → canonical name, e.g. `tf = "Terraform"`
    pub aliases: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkillMatchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise defaults (with env overrides)
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        tracing::debug!("No config at {:?}, using defaults", path);
        let mut config = Self::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: SKILLMATCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("SKILLMATCH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORAGE__DATA_DIR" => self.storage.data_dir = PathBuf::from(value),
            "EMBEDDING__MODE" => self.embedding.mode = value.to_string(),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "EMBEDDING__DIMENSION" => self.embedding.dimension = parse_value(path, value)?,
            "LLM__PROVIDER" => self.llm.provider = value.to_string(),
            "LLM__BASE_URL" => self.llm.base_url = value.to_string(),
            "LLM__API_KEY_ENV" => self.llm.api_key_env = value.to_string(),
            "LLM__MODEL" => self.llm.model = value.to_string(),
            "LLM__TEMPERATURE" => self.llm.temperature = parse_value(path, value)?,
            "LLM__TIMEOUT_SECS" => self.llm.timeout_secs = parse_value(path, value)?,
            "SEARCH__RETRIEVAL_LIMIT" => self.search.retrieval_limit = parse_value(path, value)?,
            "SEARCH__MIN_MATCH_SCORE" => self.search.min_match_score = parse_value(path, value)?,
            "SEARCH__MAX_CANDIDATES" => self.search.max_candidates = parse_value(path, value)?,
            "SEARCH__MAX_VERIFY_CONCURRENCY" => {
                self.search.max_verify_concurrency = parse_value(path, value)?
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Data directory with a leading `~/` expanded
    pub fn data_dir(&self) -> Result<PathBuf> {
        expand_path(&self.storage.data_dir)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            SkillMatchError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("skillmatch").join("config.toml"))
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| SkillMatchError::Config("Cannot determine home directory".to_string()))?;

        Ok(home_dir.join(".skillmatch"))
    }
}

fn parse_value<T: FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SkillMatchError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}'", value),
        })
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path.to_string_lossy();
    if path_str != "~" && !path_str.starts_with("~/") {
        return Ok(path.to_path_buf());
    }

    let home = dirs::home_dir()
        .ok_or_else(|| SkillMatchError::Config("Cannot determine home directory".to_string()))?;
    Ok(match path_str.strip_prefix("~/") {
        Some(stripped) => home.join(stripped),
        None => home,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.search.retrieval_limit = 12;
        config
            .skills
            .aliases
            .insert("tf".to_string(), "Terraform".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.search.retrieval_limit, 12);
        assert_eq!(loaded.skills.aliases["tf"], "Terraform");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nmodel = \"llama3\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.search.min_match_score, 35);
        assert_eq!(config.meta.schema_version, "1.0.0");
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("/nonexistent/skillmatch.toml"));
        assert!(matches!(result, Err(SkillMatchError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_invalid_file_reports_every_problem() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[search]\nabilities_weight = 0.9\npresent_limit = 0\n[llm]\ntimeout_secs = 0\n",
        )
        .unwrap();

        match Config::load(&path) {
            Err(SkillMatchError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert!(paths.contains(&"search.weights"));
                assert!(paths.contains(&"search.present_limit"));
                assert!(paths.contains(&"llm.timeout_secs"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_env_value_parsing() {
        let mut config = Config::default();
        config.set_value_from_env("LLM__TIMEOUT_SECS", "15").unwrap();
        config.set_value_from_env("LLM__MODEL", "gpt-4o").unwrap();
        assert_eq!(config.llm.timeout(), Duration::from_secs(15));
        assert_eq!(config.llm.model, "gpt-4o");

        assert!(matches!(
            config.set_value_from_env("SEARCH__MIN_MATCH_SCORE", "lots"),
            Err(SkillMatchError::InvalidConfigValue { .. })
        ));
        // Unknown keys are ignored
        config.set_value_from_env("NOPE__NOTHING", "1").unwrap();
    }

    #[test]
    fn test_expand_path() {
        let absolute = Path::new("/var/lib/skillmatch");
        assert_eq!(expand_path(absolute).unwrap(), absolute);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_path(Path::new("~/.skillmatch")).unwrap(),
                home.join(".skillmatch")
            );
        }
    }
}
