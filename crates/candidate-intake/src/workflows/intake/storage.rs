use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::domain::UploadedFile;

const CREATE_ATTEMPTS: i64 = 8;

/// Location of a file persisted by a [`FileStorage`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name under which the upload was written; recorded on the candidate.
    pub key: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not prepare upload directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write upload {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not remove upload {key}: {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("upload name {0:?} has no usable characters")]
    InvalidName(String),
}

/// Persistence seam for uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, file: &UploadedFile) -> Result<StoredFile, StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Writes uploads into a single flat directory.
#[derive(Debug, Clone)]
pub struct DiskFileStorage {
    root: PathBuf,
}

impl DiskFileStorage {
    /// Creates the directory when missing.
    pub async fn create(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Directory {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// `<millis>-<name>` with whitespace runs as `_` and path separators dropped.
pub fn storage_file_name(original: &str, timestamp_ms: i64) -> Option<String> {
    let mut sanitized = String::with_capacity(original.len());
    let mut in_whitespace = false;
    for ch in original.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if matches!(ch, '/' | '\\') || ch.is_control() {
            continue;
        }
        sanitized.push(ch);
    }

    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() || sanitized.chars().all(|ch| ch == '_') {
        return None;
    }
    Some(format!("{timestamp_ms}-{sanitized}"))
}

#[async_trait]
impl FileStorage for DiskFileStorage {
    async fn store(&self, file: &UploadedFile) -> Result<StoredFile, StorageError> {
        let now = Utc::now().timestamp_millis();

        // Two uploads in the same millisecond with the same name would collide;
        // bump the timestamp instead of overwriting.
        for attempt in 0..CREATE_ATTEMPTS {
            let key = storage_file_name(&file.original_name, now + attempt)
                .ok_or_else(|| StorageError::InvalidName(file.original_name.clone()))?;
            let path = self.root.join(&key);

            let mut handle = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(handle) => handle,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(StorageError::Write { key, source }),
            };

            let written = async {
                handle.write_all(&file.bytes).await?;
                handle.flush().await
            }
            .await;
            if let Err(source) = written {
                drop(handle);
                if let Err(err) = fs::remove_file(&path).await {
                    warn!(%key, error = %err, "could not discard partial upload");
                }
                return Err(StorageError::Write { key, source });
            }

            debug!(%key, size = file.bytes.len(), "upload stored");
            return Ok(StoredFile {
                key,
                path,
                size: file.bytes.len() as u64,
            });
        }

        Err(StorageError::Write {
            key: file.original_name.clone(),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "upload name collision"),
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if key.contains(['/', '\\']) {
            return Err(StorageError::InvalidName(key.to_string()));
        }
        match fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                key: key.to_string(),
                source,
            }),
        }
    }
}
