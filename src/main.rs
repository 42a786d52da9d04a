use skillmatch::cli::{Cli, Commands, ConfigAction, ProfilesAction, ProjectAction};
use skillmatch::config::Config;
use skillmatch::error::{Result, SkillMatchError};
use skillmatch::ingest::{CompletionCvExtractor, IngestOutcome, Ingestor};
use skillmatch::model::{
    CompletionProvider, DelegateError, EmbeddingProvider, FastEmbedProvider, ModelGateway,
    OpenAiClient,
};
use skillmatch::normalize::SkillAliases;
use skillmatch::profile::CandidateProfile;
use skillmatch::search::{
    CandidateSearcher, CompletionAbilityVerifier, QueryDeconstructor, SearchOutcome,
};
use skillmatch::storage::{StorageManager, StorageStats};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    match cli.command {
        Commands::Config { action } => cmd_config(&config_path, action),
        command => {
            let config = Config::load_or_default(&config_path)?;
            run(&config_path, config, command)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose {
        "skillmatch=debug"
    } else {
        "skillmatch=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config_path: &Path, config: Config, command: Commands) -> Result<()> {
    let storage = Arc::new(StorageManager::new(
        config.data_dir()?,
        config.storage.compression_threshold,
    )?);

    match command {
        Commands::Ingest { file } => {
            let document = std::fs::read(&file).map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to read CV file: {:?}", file),
            })?;
            let extension = file.extension().and_then(|ext| ext.to_str());

            let models = Models::build(&config)?;
            let ingestor = models.ingestor(&config, storage);
            let outcome = runtime()?.block_on(ingestor.ingest(&document, extension))?;
            print_ingest(&outcome);
        }
        Commands::IngestText { source } => {
            let text = read_text_source(&source)?;

            let models = Models::build(&config)?;
            let ingestor = models.ingestor(&config, storage);
            let outcome = runtime()?.block_on(ingestor.ingest_text(&text))?;
            print_ingest(&outcome);
        }
        Commands::Search { query, json } => {
            let models = Models::build(&config)?;
            let searcher = models.searcher(&config, storage);
            let outcome = runtime()?.block_on(searcher.search(&query))?;

            if json {
                println!("{}", to_json(&outcome, "search results")?);
            } else {
                print_search(&outcome);
            }
        }
        Commands::Questions { profile_id, query } => {
            let models = Models::build(&config)?;
            let searcher = models.searcher(&config, storage);
            let questions =
                runtime()?.block_on(searcher.interview_questions(profile_id, &query))?;

            if questions.is_empty() {
                println!("No interview questions could be generated");
            }
            for (i, question) in questions.iter().enumerate() {
                println!("{}. {}", i + 1, question);
            }
        }
        Commands::Profiles { action } => cmd_profiles(&storage, action)?,
        Commands::Document { profile_id, output } => {
            let bytes = storage.document_for(profile_id)?;
            std::fs::write(&output, &bytes).map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to write document: {:?}", output),
            })?;
            println!("✓ Wrote {} bytes to {}", bytes.len(), output.display());
        }
        Commands::Feedback {
            query,
            profile_id,
            rating,
        } => {
            let entry = storage
                .database
                .record_feedback(&query, profile_id, rating)?;
            println!(
                "✓ Recorded '{}' for profile {} (entry {})",
                entry.rating.as_str(),
                entry.profile_id,
                entry.id
            );
        }
        Commands::Project { action } => cmd_project(&storage, action)?,
        Commands::Status => cmd_status(&config, &storage)?,
        Commands::Config { action } => cmd_config(config_path, action)?,
    }

    Ok(())
}

/// Model delegates, built once per invocation and shared by every component
struct Models {
    gateway: ModelGateway,
    completer: Arc<dyn CompletionProvider>,
}

impl Models {
    /// Built outside the async runtime: the blocking HTTP client and the local
    /// embedding model must not be created on a runtime thread
    fn build(config: &Config) -> Result<Self> {
        let api_key = config.llm.api_key();
        if api_key.is_none() && config.llm.provider != "ollama" {
            tracing::warn!(
                "{} is not set; completion calls will likely be rejected",
                config.llm.api_key_env
            );
        }

        let client = || {
            OpenAiClient::new(
                &config.llm.base_url,
                api_key.clone(),
                &config.llm.model,
                config.llm.temperature,
                config.llm.timeout(),
            )
            .map_err(|e| SkillMatchError::Delegate(DelegateError::from(e)))
        };

        let completer: Arc<dyn CompletionProvider> = Arc::new(client()?);
        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.mode.as_str() {
            "online" => Arc::new(
                client()?.with_embeddings(&config.embedding.model, config.embedding.dimension),
            ),
            _ => Arc::new(
                FastEmbedProvider::new(&config.embedding.model)
                    .map_err(|e| SkillMatchError::Delegate(DelegateError::from(e)))?,
            ),
        };

        let gateway = ModelGateway::new(embedder, Arc::clone(&completer), config.llm.timeout());
        Ok(Self { gateway, completer })
    }

    fn aliases(config: &Config) -> Arc<SkillAliases> {
        Arc::new(SkillAliases::builtin().with_overrides(&config.skills.aliases))
    }

    fn ingestor(&self, config: &Config, storage: Arc<StorageManager>) -> Ingestor {
        Ingestor::new(
            storage,
            self.gateway.clone(),
            Arc::new(CompletionCvExtractor::new(Arc::clone(&self.completer))),
            Self::aliases(config),
        )
    }

    fn searcher(&self, config: &Config, storage: Arc<StorageManager>) -> CandidateSearcher {
        CandidateSearcher::new(
            storage,
            self.gateway.clone(),
            QueryDeconstructor::new(self.gateway.clone(), Self::aliases(config)),
            Arc::new(CompletionAbilityVerifier::new(
                self.gateway.clone(),
                config.search.max_verify_concurrency,
            )),
            config.search.clone(),
        )
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| SkillMatchError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

fn read_text_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| SkillMatchError::Io {
                source: e,
                context: "Failed to read CV text from stdin".to_string(),
            })?;
        return Ok(text);
    }

    std::fs::read_to_string(source).map_err(|e| SkillMatchError::Io {
        source: e,
        context: format!("Failed to read CV text: {}", source),
    })
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| SkillMatchError::Json {
        source: e,
        context: format!("Failed to serialize {}", what),
    })
}

fn print_ingest(outcome: &IngestOutcome) {
    let profile = &outcome.profile;
    println!(
        "✓ {} profile {} ({})",
        if outcome.created { "Created" } else { "Updated" },
        profile.id,
        profile.full_name()
    );
    println!("  Source: {:?}", outcome.source);
    println!("  Skills: {}", profile.skill_names().join(", "));
    println!("  Experience score: {:.2}", profile.experience_score);
}

fn print_search(outcome: &SearchOutcome) {
    println!("{}", outcome.summary);

    if outcome.ranked.is_empty() {
        return;
    }

    println!();
    for (i, ranked) in outcome.ranked.iter().enumerate() {
        let profile = &ranked.profile;
        println!(
            "{}. {} [#{}] MATCH {}%",
            i + 1,
            profile.full_name(),
            profile.id,
            ranked.match_score
        );
        println!(
            "   abilities {:.2} | skills {:.2} | semantic {:.2}",
            ranked.scores.abilities_score, ranked.scores.skills_score, ranked.scores.semantic_score
        );
        if !profile.skills.is_empty() {
            println!("   {}", profile.skill_names().join(", "));
        }
    }
}

fn print_profile(profile: &CandidateProfile) {
    println!("{} [#{}]", profile.full_name(), profile.id);
    for (label, value) in [
        ("Email", &profile.email),
        ("Phone", &profile.phone),
        ("LinkedIn", &profile.linkedin_url),
        ("GitHub", &profile.github_url),
    ] {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    println!("  Experience score: {:.2}", profile.experience_score);
    if !profile.description.is_empty() {
        println!("\n{}", profile.description);
    }

    println!("\nSkills: {}", profile.skill_names().join(", "));

    if !profile.work_experiences.is_empty() {
        println!("\nExperience:");
        for exp in &profile.work_experiences {
            println!(
                "  - {} @ {} ({} - {}{})",
                exp.position.as_deref().unwrap_or("?"),
                exp.company.as_deref().unwrap_or("?"),
                exp.start_date.as_deref().unwrap_or("?"),
                exp.end_date.as_deref().unwrap_or("?"),
                exp.duration_months
                    .map(|m| format!(", {} months", m))
                    .unwrap_or_default()
            );
        }
    }

    if !profile.education.is_empty() {
        println!("\nEducation:");
        for edu in &profile.education {
            println!(
                "  - {} {}",
                edu.degree.as_deref().unwrap_or_default(),
                edu.institution.as_deref().unwrap_or_default()
            );
        }
    }

    if !profile.projects.is_empty() {
        println!("\nProjects:");
        for project in &profile.projects {
            println!("  - {}", project.name.as_deref().unwrap_or("?"));
        }
    }

    if !profile.languages.is_empty() {
        let languages: Vec<String> = profile
            .languages
            .iter()
            .map(|l| {
                format!(
                    "{} {}",
                    l.name.as_deref().unwrap_or_default(),
                    l.level.as_deref().unwrap_or_default()
                )
                .trim()
                .to_string()
            })
            .collect();
        println!("\nLanguages: {}", languages.join(", "));
    }
}

fn cmd_profiles(storage: &StorageManager, action: ProfilesAction) -> Result<()> {
    match action {
        ProfilesAction::List {
            filter,
            offset,
            limit,
        } => {
            let (profiles, total) =
                storage
                    .database
                    .list_profiles(filter.as_deref(), offset, limit)?;

            println!("Profiles: {} total", total);
            for profile in profiles {
                println!(
                    "  [#{}] {} {} <{}> {} skills, score {:.2}",
                    profile.id,
                    profile.name,
                    profile.surname,
                    profile.email.as_deref().unwrap_or("-"),
                    profile.skill_count,
                    profile.experience_score
                );
            }
        }
        ProfilesAction::Show { id, json } => {
            let profile = storage.database.get_profile(id)?;
            if json {
                println!("{}", to_json(&profile, "profile")?);
            } else {
                print_profile(&profile);
            }
        }
    }

    Ok(())
}

fn cmd_project(storage: &StorageManager, action: ProjectAction) -> Result<()> {
    let db = &storage.database;

    match action {
        ProjectAction::Create { name, description } => {
            let project = db.create_project(&name, description.as_deref())?;
            println!("✓ Created project {} ({})", project.id, project.name);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("Projects: {} total", projects.len());
            for project in projects {
                println!(
                    "  [#{}] {} ({})",
                    project.id,
                    project.name,
                    project.created_at.format("%Y-%m-%d")
                );
            }
        }
        ProjectAction::Show { id } => {
            let project = db.get_project(id)?;
            println!("{} [#{}]", project.name, project.id);
            if let Some(description) = &project.description {
                println!("  {}", description);
            }
            print_members(storage, id)?;
        }
        ProjectAction::Add {
            project_id,
            profile_id,
        } => {
            let member = db.add_member(project_id, profile_id)?;
            println!(
                "✓ Profile {} is member #{} of project {}",
                member.profile_id, member.position, member.project_id
            );
        }
        ProjectAction::Update {
            project_id,
            profile_id,
            status,
            notes,
        } => {
            let member = db.update_member(project_id, profile_id, status, notes.as_deref())?;
            println!(
                "✓ Profile {} in project {} is now '{}'",
                member.profile_id, member.project_id, member.status
            );
        }
        ProjectAction::Remove {
            project_id,
            profile_id,
        } => {
            db.remove_member(project_id, profile_id)?;
            println!("✓ Removed profile {} from project {}", profile_id, project_id);
        }
        ProjectAction::Members { project_id } => print_members(storage, project_id)?,
    }

    Ok(())
}

fn print_members(storage: &StorageManager, project_id: i64) -> Result<()> {
    let members = storage.database.list_members(project_id)?;
    println!("Members: {}", members.len());
    for member in members {
        let name = storage
            .database
            .get_profile(member.profile_id)
            .map(|p| p.full_name())
            .unwrap_or_else(|_| "?".to_string());
        println!(
            "  {}. {} [#{}] {}{}",
            member.position,
            name,
            member.profile_id,
            member.status,
            member
                .notes
                .as_deref()
                .map(|n| format!(" - {}", n))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_status(config: &Config, storage: &StorageManager) -> Result<()> {
    let stats = storage.stats()?;

    println!("Skillmatch Status");
    println!("=================");
    println!("\nData directory: {}", storage.base_path().display());
    println!("  Profiles:      {}", stats.db.profile_count);
    println!("  Skills:        {}", stats.db.skill_count);
    println!("  CV documents:  {}", stats.document_count);
    println!("  Cached parses: {}", stats.db.cache_entry_count);
    println!("  Projects:      {}", stats.db.project_count);
    println!("  Feedback:      {}", stats.db.feedback_count);
    println!(
        "  Disk usage:    {}",
        StorageStats::format_size(stats.total_size_bytes)
    );
    println!(
        "\nModels: {} embeddings ({}), completions {} via {}",
        config.embedding.mode, config.embedding.model, config.llm.model, config.llm.provider
    );

    Ok(())
}

fn cmd_config(path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(path)?;
            println!("# {}", path.display());
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path: PathBuf = file.unwrap_or_else(|| path.to_path_buf());
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            Config::default().save(path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}
