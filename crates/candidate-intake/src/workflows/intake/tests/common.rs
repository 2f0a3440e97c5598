use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use parking_lot::Mutex;
use serde_json::Value;

use crate::workflows::intake::domain::{CandidateId, CandidateRecord, RegistrationForm, UploadedFile};
use crate::workflows::intake::repository::{
    CandidateRepository, InMemoryCandidateRepository, RepositoryError,
};
use crate::workflows::intake::storage::{FileStorage, StorageError, StoredFile};
use crate::workflows::intake::{intake_router, CandidateIntakeService, REGISTER_ROUTE};

pub(super) const BOUNDARY: &str = "candidate-intake-boundary";
pub(super) const BODY_LIMIT: usize = 1024 * 1024;

pub(super) fn resume_file() -> UploadedFile {
    UploadedFile {
        original_name: "Ada Lovelace CV.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.7 resume".to_vec(),
    }
}

pub(super) fn video_file() -> UploadedFile {
    UploadedFile {
        original_name: "recording.webm".to_string(),
        content_type: Some("video/webm".to_string()),
        bytes: vec![0x1A, 0x45, 0xDF, 0xA3, 0, 1, 2, 3],
    }
}

pub(super) fn complete_form(email: Option<&str>) -> RegistrationForm {
    let mut form = RegistrationForm::default();
    for (field, value) in [
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
        ("position", "Engineer"),
        ("currentPosition", "Analyst"),
        ("experience", "5"),
    ] {
        form.set_text(field, value.to_string());
    }
    if let Some(email) = email {
        form.set_text("email", email.to_string());
    }
    form.resume = Some(resume_file());
    form.video = Some(video_file());
    form
}

/// Storage double that keeps files in memory and can be told to fail.
#[derive(Default)]
pub(super) struct MemoryStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_on_store: Mutex<Option<usize>>,
    stores: Mutex<usize>,
}

impl MemoryStorage {
    pub(super) fn failing_on_store(call: usize) -> Self {
        let storage = Self::default();
        *storage.fail_on_store.lock() = Some(call);
        storage
    }

    pub(super) fn keys(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl FileStorage for MemoryStorage {
    async fn store(&self, file: &UploadedFile) -> Result<StoredFile, StorageError> {
        let call = {
            let mut stores = self.stores.lock();
            *stores += 1;
            *stores
        };
        if *self.fail_on_store.lock() == Some(call) {
            return Err(StorageError::Write {
                key: file.original_name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        let key = format!("{call}-{}", file.original_name.replace(' ', "_"));
        self.files.lock().insert(key.clone(), file.bytes.clone());
        Ok(StoredFile {
            path: key.clone().into(),
            key,
            size: file.bytes.len() as u64,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.files.lock().remove(key);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl CandidateRepository for UnavailableRepository {
    fn insert(&self, _record: CandidateRecord) -> Result<CandidateRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<CandidateRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService = CandidateIntakeService<InMemoryCandidateRepository, MemoryStorage>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryCandidateRepository>,
    Arc<MemoryStorage>,
) {
    let repository = Arc::new(InMemoryCandidateRepository::new());
    let storage = Arc::new(MemoryStorage::default());
    let service = CandidateIntakeService::new(repository.clone(), storage.clone());
    (service, repository, storage)
}

pub(super) fn router_with_service<R, S>(service: CandidateIntakeService<R, S>) -> axum::Router
where
    R: CandidateRepository + 'static,
    S: FileStorage + 'static,
{
    intake_router(Arc::new(service), BODY_LIMIT)
}

pub(super) enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a UploadedFile),
}

pub(super) fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                        file.original_name
                    )
                    .as_bytes(),
                );
                let content_type = file
                    .content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream");
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                body.extend_from_slice(&file.bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn register_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::post(REGISTER_ROUTE)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
