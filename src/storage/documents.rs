//! Durable storage for uploaded CV documents
//!
//! Each upload is written under a freshly generated name (UUID v4 plus the
//! original extension). Large documents are zstd-compressed on disk.

use crate::error::{Result, SkillMatchError};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// File store for raw CV documents
pub struct DocumentStore {
    base_path: PathBuf,
    compression_threshold: usize,
}

impl DocumentStore {
    /// Create a document store rooted at `base_path/documents`
    pub fn new(base_path: PathBuf, compression_threshold: usize) -> Result<Self> {
        let documents_dir = base_path.join("documents");
        fs::create_dir_all(&documents_dir).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!(
                "Failed to create documents directory: {}",
                documents_dir.display()
            ),
        })?;

        Ok(Self {
            base_path,
            compression_threshold,
        })
    }

    /// Persist a document and return its generated name
    pub fn store(&self, data: &[u8], extension: Option<&str>) -> Result<String> {
        let name = generate_name(extension);
        let final_path = self.document_path(&name)?;
        let temp_path = final_path.with_extension("tmp");

        let parent = final_path
            .parent()
            .ok_or_else(|| SkillMatchError::Config("Invalid document path".to_string()))?;
        fs::create_dir_all(parent).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to create document directory: {}", parent.display()),
        })?;

        let payload = if data.len() >= self.compression_threshold {
            zstd::encode_all(data, 3).map_err(|e| SkillMatchError::Io {
                source: e,
                context: "Failed to compress document".to_string(),
            })?
        } else {
            data.to_vec()
        };

        let mut file = fs::File::create(&temp_path).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to create temp document: {}", temp_path.display()),
        })?;
        file.write_all(&payload)
            .and_then(|_| file.sync_all())
            .map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to write document: {}", temp_path.display()),
            })?;
        drop(file);

        fs::rename(&temp_path, &final_path).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!(
                "Failed to move document into place: {} -> {}",
                temp_path.display(),
                final_path.display()
            ),
        })?;

        tracing::debug!("Stored document {} ({} bytes)", name, data.len());
        Ok(name)
    }

    /// Read a document back, decompressing if needed
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.document_path(name)?;
        if !path.exists() {
            return Err(SkillMatchError::not_found("document", name));
        }

        let data = fs::read(&path).map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to read document: {}", path.display()),
        })?;

        // Small documents are stored raw; zstd frames are recognised by magic
        match zstd::decode_all(&data[..]) {
            Ok(decompressed) => Ok(decompressed),
            Err(_) => Ok(data),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.document_path(name)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Delete a document; deleting a missing document is not an error
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.document_path(name)?;
        if path.exists() {
            fs::remove_file(&path).map_err(|e| SkillMatchError::Io {
                source: e,
                context: format!("Failed to delete document: {}", path.display()),
            })?;
        }
        Ok(())
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize> {
        let root = self.base_path.join("documents");
        let mut count = 0;
        for shard in read_dir(&root)? {
            if shard.is_dir() {
                count += read_dir(&shard)?
                    .into_iter()
                    .filter(|p| p.is_file() && p.extension().map_or(true, |ext| ext != "tmp"))
                    .count();
            }
        }
        Ok(count)
    }

    /// Path for a document name: documents/<first two chars>/<name>
    ///
    /// Names come back from the database and the CLI, so anything that could
    /// escape the store is rejected.
    fn document_path(&self, name: &str) -> Result<PathBuf> {
        let valid = name.len() > 2
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !name.starts_with('.')
            && !name.contains("..");
        if !valid {
            return Err(SkillMatchError::Validation(format!(
                "Invalid document name: {}",
                name
            )));
        }

        Ok(self.base_path.join("documents").join(&name[..2]).join(name))
    }
}

fn generate_name(extension: Option<&str>) -> String {
    let id = Uuid::new_v4();
    let extension = extension
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    match extension {
        Some(ext) => format!("{}.{}", id, ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

fn read_dir(path: &std::path::Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(path).map_err(|e| SkillMatchError::Io {
        source: e,
        context: format!("Failed to read directory: {}", path.display()),
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SkillMatchError::Io {
            source: e,
            context: format!("Failed to read directory entry in {}", path.display()),
        })?;
        paths.push(entry.path());
    }
    Ok(paths)
}
