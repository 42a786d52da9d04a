//! SQLite database management with migrations
//!
//! Holds candidate profiles and their owned child rows, the shared skill
//! table, the extraction cache, search feedback and recruitment projects.

use crate::error::{Result, SkillMatchError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database and apply pending migrations
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        // Pragmas are per connection, so every pooled connection gets them
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
                ",
            )
        });

        let pool = Pool::builder()
            .max_size(16)
            .build(manager)
            .map_err(|e| SkillMatchError::Pool(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| SkillMatchError::Pool(format!("Failed to get connection: {}", e)))
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);
                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Row counts for the status command
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };

        Ok(DbStats {
            profile_count: count("profiles")?,
            skill_count: count("skills")?,
            cache_entry_count: count("cv_cache")?,
            feedback_count: count("search_feedback")?,
            project_count: count("recruitment_projects")?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbStats {
    pub profile_count: usize,
    pub skill_count: usize,
    pub cache_entry_count: usize,
    pub feedback_count: usize,
    pub project_count: usize,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: profiles and owned relations
    r#"
    CREATE TABLE profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL DEFAULT '',
        surname TEXT NOT NULL DEFAULT '',
        email TEXT UNIQUE COLLATE NOCASE,
        phone TEXT,
        linkedin_url TEXT,
        github_url TEXT,
        description TEXT NOT NULL DEFAULT '',
        experience_score REAL NOT NULL DEFAULT 0,
        embedding BLOB,
        cv_document TEXT,
        cv_fingerprint TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX idx_profiles_surname ON profiles(surname, name);

    CREATE TABLE skills (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE
    );

    CREATE TABLE profile_skills (
        profile_id INTEGER NOT NULL,
        skill_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        PRIMARY KEY (profile_id, skill_id),
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE,
        FOREIGN KEY (skill_id) REFERENCES skills(id)
    );

    CREATE INDEX idx_profile_skills_skill ON profile_skills(skill_id);

    CREATE TABLE work_experiences (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        position TEXT,
        company TEXT,
        start_date TEXT,
        end_date TEXT,
        duration_months INTEGER,
        description TEXT,
        technologies_used TEXT NOT NULL DEFAULT '[]',
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_work_experiences_profile ON work_experiences(profile_id);

    CREATE TABLE education (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        institution TEXT,
        degree TEXT,
        start_date TEXT,
        end_date TEXT,
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_education_profile ON education(profile_id);

    CREATE TABLE projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        name TEXT,
        description TEXT,
        technologies_used TEXT NOT NULL DEFAULT '[]',
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_projects_profile ON projects(profile_id);

    CREATE TABLE languages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        name TEXT,
        level TEXT,
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_languages_profile ON languages(profile_id);

    CREATE TABLE publications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        title TEXT,
        outlet TEXT,
        date TEXT,
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_publications_profile ON publications(profile_id);

    CREATE TABLE activities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        profile_id INTEGER NOT NULL,
        ordinal INTEGER NOT NULL,
        name TEXT,
        role TEXT,
        start_date TEXT,
        end_date TEXT,
        description TEXT,
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_activities_profile ON activities(profile_id);
    "#,
    // Migration 2: extraction cache, feedback, recruitment projects
    r#"
    CREATE TABLE cv_cache (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        fingerprint TEXT NOT NULL UNIQUE,
        record TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE search_feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        query TEXT NOT NULL,
        profile_id INTEGER NOT NULL,
        rating TEXT NOT NULL,
        recorded_at TEXT NOT NULL,
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_search_feedback_profile ON search_feedback(profile_id);

    CREATE TABLE recruitment_projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE project_members (
        project_id INTEGER NOT NULL,
        profile_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'new',
        notes TEXT,
        added_at TEXT NOT NULL,
        PRIMARY KEY (project_id, profile_id),
        FOREIGN KEY (project_id) REFERENCES recruitment_projects(id) ON DELETE CASCADE,
        FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
    );
    "#,
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let _db = Database::new(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_migrations_are_recorded_once() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        drop(Database::new(&db_path).unwrap());
        let db = Database::new(&db_path).unwrap();

        let conn = db.get_conn().unwrap();
        let (version, rows): (i32, i32) = conn
            .query_row("SELECT MAX(version), COUNT(*) FROM _migrations", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();

        assert_eq!(version, MIGRATIONS.len() as i32);
        assert_eq!(rows, MIGRATIONS.len() as i32);
    }

    #[test]
    fn test_schema_exists() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
        let conn = db.get_conn().unwrap();

        for table in [
            "profiles",
            "skills",
            "profile_skills",
            "work_experiences",
            "education",
            "projects",
            "languages",
            "publications",
            "activities",
            "cv_cache",
            "search_feedback",
            "recruitment_projects",
            "project_members",
        ] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();

            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_foreign_keys_enabled_on_every_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();

        let first = db.get_conn().unwrap();
        let second = db.get_conn().unwrap();
        for conn in [&first, &second] {
            let fk_enabled: i32 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(fk_enabled, 1);
        }
    }

    #[test]
    fn test_skill_names_unique_ignoring_case() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
        let conn = db.get_conn().unwrap();

        conn.execute("INSERT INTO skills (name) VALUES ('React')", [])
            .unwrap();
        assert!(conn
            .execute("INSERT INTO skills (name) VALUES ('react')", [])
            .is_err());
    }

    #[test]
    fn test_stats_on_empty_database() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.profile_count, 0);
        assert_eq!(stats.skill_count, 0);
        assert_eq!(stats.cache_entry_count, 0);
    }
}
