use crate::config::Config;
use crate::error::{Result, SkillMatchError, ValidationError};

/// Configuration validator
///
/// Collects every problem instead of stopping at the first one.
pub struct ConfigValidator;

const VALID_PROVIDERS: &[&str] = &["openai", "groq", "ollama", "openrouter", "azure"];

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_skills(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SkillMatchError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }

        if config.storage.compression_threshold == 0 {
            errors.push(ValidationError::new(
                "storage.compression_threshold",
                "Compression threshold must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let mode = &config.embedding.mode;
        if mode != "offline" && mode != "online" {
            errors.push(ValidationError::new(
                "embedding.mode",
                format!("Mode must be 'offline' or 'online', got '{}'", mode),
            ));
        }

        if config.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if config.embedding.dimension == 0 {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Embedding dimension must be greater than 0",
            ));
        }
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let temp = config.llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        let provider = &config.llm.provider;
        if !VALID_PROVIDERS.contains(&provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    VALID_PROVIDERS, provider
                ),
            ));
        }

        let base_url = &config.llm.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            errors.push(ValidationError::new(
                "llm.base_url",
                format!("Base URL must start with http:// or https://, got '{}'", base_url),
            ));
        }

        if config.llm.model.is_empty() {
            errors.push(ValidationError::new("llm.model", "Model name cannot be empty"));
        }

        if config.llm.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "llm.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if search.present_limit == 0 {
            errors.push(ValidationError::new(
                "search.present_limit",
                "Present limit must be greater than 0",
            ));
        }

        // Ranking needs more material than it presents
        if search.retrieval_limit <= search.present_limit {
            errors.push(ValidationError::new(
                "search.retrieval_limit",
                format!(
                    "Retrieval limit ({}) must exceed present limit ({})",
                    search.retrieval_limit, search.present_limit
                ),
            ));
        }

        if search.summary_limit > search.present_limit {
            errors.push(ValidationError::new(
                "search.summary_limit",
                format!(
                    "Summary limit ({}) cannot exceed present limit ({})",
                    search.summary_limit, search.present_limit
                ),
            ));
        }

        if search.min_match_score > 100 {
            errors.push(ValidationError::new(
                "search.min_match_score",
                format!("Minimum match score must be at most 100, got {}", search.min_match_score),
            ));
        }

        if !(0.0..=2.0).contains(&search.keyword_default_distance) {
            errors.push(ValidationError::new(
                "search.keyword_default_distance",
                format!(
                    "Keyword default distance must be between 0.0 and 2.0, got {}",
                    search.keyword_default_distance
                ),
            ));
        }

        let weights = [
            search.abilities_weight,
            search.skills_weight,
            search.semantic_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) || (weights.iter().sum::<f64>() - 1.0).abs() > 1e-6 {
            errors.push(ValidationError::new(
                "search.weights",
                format!(
                    "Weights must be non-negative and sum to 1.0, got {:?}",
                    weights
                ),
            ));
        }

        if search.max_candidates == 0 {
            errors.push(ValidationError::new(
                "search.max_candidates",
                "Max candidates must be greater than 0",
            ));
        }

        if search.max_verify_concurrency == 0 {
            errors.push(ValidationError::new(
                "search.max_verify_concurrency",
                "Verification concurrency must be greater than 0",
            ));
        }
    }

    fn validate_skills(config: &Config, errors: &mut Vec<ValidationError>) {
        for (alias, canonical) in &config.skills.aliases {
            if alias.trim().is_empty() || canonical.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("skills.aliases.{}", alias),
                    "Alias and canonical name cannot be empty",
                ));
            }
        }
    }
}
