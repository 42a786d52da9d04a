//! Write-once extraction cache keyed by document fingerprint

use super::Database;
use crate::error::{Result, SkillMatchError};
use crate::profile::CvRecord;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// Hex BLAKE3 digest of raw document bytes
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

impl Database {
    /// Previously extracted record for a fingerprint.
    ///
    /// An entry that no longer deserializes is reported as a miss.
    pub fn cached_record(&self, fingerprint: &str) -> Result<Option<CvRecord>> {
        let conn = self.get_conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT record FROM cv_cache WHERE fingerprint = ?1",
                [fingerprint],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", fingerprint, e);
                None
            }
        }))
    }

    /// Store a record under its fingerprint. Existing entries are never
    /// overwritten; returns whether a new entry was written.
    pub fn cache_record(&self, fingerprint: &str, record: &CvRecord) -> Result<bool> {
        let json = serde_json::to_string(record).map_err(|e| SkillMatchError::Json {
            source: e,
            context: "Failed to encode CV record for cache".to_string(),
        })?;

        let conn = self.get_conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO cv_cache (fingerprint, record, created_at) VALUES (?1, ?2, ?3)",
            params![fingerprint, json, Utc::now()],
        )?;
        Ok(inserted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let a = fingerprint(b"cv bytes");
        assert_eq!(a, fingerprint(b"cv bytes"));
        assert_ne!(a, fingerprint(b"cv bytes "));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cache_is_write_once() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();

        let mut first = CvRecord::default();
        first.summary = Some("first".to_string());
        let mut second = CvRecord::default();
        second.summary = Some("second".to_string());

        assert!(db.cache_record("abc", &first).unwrap());
        assert!(!db.cache_record("abc", &second).unwrap());
        assert_eq!(db.cached_record("abc").unwrap(), Some(first));
        assert_eq!(db.cached_record("missing").unwrap(), None);
    }

    #[test]
    fn test_unreadable_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
        db.get_conn()
            .unwrap()
            .execute(
                "INSERT INTO cv_cache (fingerprint, record, created_at) VALUES ('bad', 'not json', 'x')",
                [],
            )
            .unwrap();

        assert_eq!(db.cached_record("bad").unwrap(), None);
    }
}
