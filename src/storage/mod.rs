//! Storage layer for skillmatch
//!
//! Raw CV documents live in a file store; profiles, skills, the extraction
//! cache and recruitment data live in SQLite.

pub mod cache;
pub mod database;
pub mod documents;
pub mod profiles;
pub mod recruitment;
pub mod vector;

use crate::error::{Result, SkillMatchError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use cache::fingerprint;
pub use database::{Database, DbPool, DbStats};
pub use documents::DocumentStore;
pub use profiles::{ProfileDraft, ProfileSummary, UpsertOutcome};

/// Coordinates the document store and the database under one data directory
pub struct StorageManager {
    pub documents: DocumentStore,
    pub database: Database,
    base_path: PathBuf,
}

impl StorageManager {
    pub fn new(base_path: PathBuf, compression_threshold: usize) -> Result<Self> {
        std::fs::create_dir_all(&base_path).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to create data directory: {}", base_path.display()),
        })?;

        let documents = DocumentStore::new(base_path.clone(), compression_threshold)?;
        let database = Database::new(&base_path.join("skillmatch.sqlite"))?;

        Ok(Self {
            documents,
            database,
            base_path,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Run storage work on the blocking pool.
    ///
    /// SQLite calls may wait on `busy_timeout` and must not stall the executor.
    pub async fn run_blocking<T, F>(self: &Arc<Self>, what: &'static str, job: F) -> Result<T>
    where
        F: FnOnce(&StorageManager) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(self);
        tokio::task::spawn_blocking(move || job(&storage))
            .await
            .map_err(|e| anyhow::anyhow!("{} task failed: {}", what, e))?
    }

    /// Bytes of the CV document behind a profile
    pub fn document_for(&self, profile_id: i64) -> Result<Vec<u8>> {
        let name = self
            .database
            .cv_document(profile_id)?
            .ok_or_else(|| SkillMatchError::not_found("document", profile_id))?;
        self.documents.read(&name)
    }

    pub fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            db: self.database.stats()?,
            document_count: self.documents.count()?,
            total_size_bytes: Self::dir_size(&self.base_path)?,
        })
    }

    fn dir_size(path: &Path) -> Result<u64> {
        let mut size = 0u64;

        if path.is_dir() {
            for entry in std::fs::read_dir(path).map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to read directory: {}", path.display()),
            })? {
                let entry = entry.map_err(|e| SkillMatchError::Io {
                    source: e,
                    context: "Failed to read directory entry".to_string(),
                })?;
                let path = entry.path();

                if path.is_dir() {
                    size += Self::dir_size(&path)?;
                } else {
                    size += entry
                        .metadata()
                        .map_err(|e| SkillMatchError::Io {
                            source: e,
                            context: format!("Failed to get file metadata: {}", path.display()),
                        })?
                        .len();
                }
            }
        }

        Ok(size)
    }
}

/// Combined storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub db: DbStats,
    pub document_count: usize,
    pub total_size_bytes: u64,
}

impl StorageStats {
    /// Format size as human-readable string
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{CvRecord, PersonalInfo};
    use tempfile::TempDir;

    #[test]
    fn test_storage_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path().join("data"), 1024).unwrap();

        assert!(storage.base_path().join("documents").exists());
        assert!(storage.base_path().join("skillmatch.sqlite").exists());
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_results_and_errors() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(StorageManager::new(temp_dir.path().to_path_buf(), 1024).unwrap());

        let count = storage
            .run_blocking("count", |s| Ok(s.database.stats()?.profile_count))
            .await
            .unwrap();
        assert_eq!(count, 0);

        let missing = storage
            .run_blocking("lookup", |s| s.database.get_profile(42))
            .await;
        assert!(matches!(missing, Err(SkillMatchError::NotFound { entity: "profile", .. })));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(StorageStats::format_size(0), "0.00 B");
        assert_eq!(StorageStats::format_size(1024), "1.00 KB");
        assert_eq!(StorageStats::format_size(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_document_for_profile() {
        let temp_dir = TempDir::new().unwrap();
        let storage = StorageManager::new(temp_dir.path().to_path_buf(), 1024).unwrap();

        let name = storage.documents.store(b"%PDF-1.4 cv", Some("pdf")).unwrap();
        let draft = ProfileDraft {
            record: CvRecord {
                personal_info: PersonalInfo {
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
            experience_score: 0.0,
            embedding: vec![0.0],
            cv_document: Some(name),
            cv_fingerprint: None,
        };
        let with_doc = storage.database.upsert_profile(&draft).unwrap().profile_id;

        let mut no_doc = draft.clone();
        no_doc.record.personal_info.email = Some("b@example.com".to_string());
        no_doc.cv_document = None;
        let without_doc = storage.database.upsert_profile(&no_doc).unwrap().profile_id;

        assert_eq!(storage.document_for(with_doc).unwrap(), b"%PDF-1.4 cv");
        assert!(matches!(
            storage.document_for(without_doc),
            Err(SkillMatchError::NotFound { entity: "document", .. })
        ));

        let stats = storage.stats().unwrap();
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.db.profile_count, 2);
        assert!(stats.total_size_bytes > 0);
    }
}
