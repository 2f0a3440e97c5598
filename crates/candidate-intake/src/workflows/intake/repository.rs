use std::collections::HashMap;

use parking_lot::RwLock;

use super::domain::{CandidateId, CandidateRecord};

/// Storage abstraction so the service can be exercised in isolation.
pub trait CandidateRepository: Send + Sync {
    fn insert(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError>;
    fn fetch(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("a candidate with email {email} is already registered")]
    Conflict { email: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local candidate store. Email is unique only among records that have one.
#[derive(Debug, Default)]
pub struct InMemoryCandidateRepository {
    records: RwLock<Vec<CandidateRecord>>,
    by_email: RwLock<HashMap<String, usize>>,
}

impl InMemoryCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl CandidateRepository for InMemoryCandidateRepository {
    fn insert(&self, record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        let mut records = self.records.write();
        let mut by_email = self.by_email.write();

        if let Some(email) = record.email.as_deref() {
            let key = email_key(email);
            if by_email.contains_key(&key) {
                return Err(RepositoryError::Conflict {
                    email: email.to_string(),
                });
            }
            by_email.insert(key, records.len());
        }
        records.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|record| &record.id == id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Ok(self.records.read().clone())
    }
}
