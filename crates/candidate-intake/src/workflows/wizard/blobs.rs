use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to binary content parked in a [`BlobStore`].
///
/// The handle carries display metadata only. The bytes stay in the store and
/// must be fetched through a [`BlobResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    pub key: Uuid,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

/// Bytes recovered from a [`BlobRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
    #[error("{name} is no longer available, please redo this step")]
    Unavailable { name: String },
}

/// Capability to turn a handle back into bytes.
#[async_trait]
pub trait BlobResolver: Send + Sync {
    async fn resolve(&self, reference: &BlobRef) -> Result<Blob, BlobError>;
}

/// Transient in-memory object store for the lifetime of one application attempt.
#[derive(Debug, Default, Clone)]
pub struct BlobStore {
    entries: Arc<RwLock<HashMap<Uuid, Blob>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> BlobRef {
        let bytes = bytes.into();
        let content_type = content_type.into();
        let reference = BlobRef {
            key: Uuid::new_v4(),
            name: name.into(),
            content_type: content_type.clone(),
            size: bytes.len() as u64,
        };

        self.entries.write().insert(
            reference.key,
            Blob {
                content_type,
                bytes,
            },
        );
        reference
    }

    /// Drops the bytes behind `reference`. Returns whether anything was removed.
    pub fn revoke(&self, reference: &BlobRef) -> bool {
        self.entries.write().remove(&reference.key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, reference: &BlobRef) -> bool {
        self.entries.read().contains_key(&reference.key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl BlobResolver for BlobStore {
    async fn resolve(&self, reference: &BlobRef) -> Result<Blob, BlobError> {
        self.entries
            .read()
            .get(&reference.key)
            .cloned()
            .ok_or_else(|| BlobError::Unavailable {
                name: reference.name.clone(),
            })
    }
}
