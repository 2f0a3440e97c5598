use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{CandidateId, CandidateRecord, RegistrationForm, UploadedFile};
use super::repository::{CandidateRepository, RepositoryError};
use super::storage::{FileStorage, StorageError, StoredFile};

pub const REGISTERED_MESSAGE: &str = "Candidate Registered Successfully";

/// Request-level problems reported back to the caller as 422.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Name is required")]
    MissingName,
    #[error("Resume file is required (field name: resume)")]
    MissingResume,
    #[error("Video file is required (field name: video)")]
    MissingVideo,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Validation(#[from] RegistrationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Accepts candidate registrations: validates, persists both uploads, then the record.
pub struct CandidateIntakeService<R, S> {
    repository: Arc<R>,
    storage: Arc<S>,
}

struct Validated<'a> {
    name: String,
    resume: &'a UploadedFile,
    video: &'a UploadedFile,
}

fn validate(form: &RegistrationForm) -> Result<Validated<'_>, RegistrationError> {
    let name = form.derived_name().ok_or(RegistrationError::MissingName)?;
    let resume = form
        .resume
        .as_ref()
        .filter(|file| file.is_usable())
        .ok_or(RegistrationError::MissingResume)?;
    let video = form
        .video
        .as_ref()
        .filter(|file| file.is_usable())
        .ok_or(RegistrationError::MissingVideo)?;
    Ok(Validated {
        name,
        resume,
        video,
    })
}

impl<R, S> CandidateIntakeService<R, S>
where
    R: CandidateRepository + 'static,
    S: FileStorage + 'static,
{
    pub fn new(repository: Arc<R>, storage: Arc<S>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Nothing stays on disk unless the record was inserted.
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<CandidateRecord, IntakeServiceError> {
        let Validated {
            name,
            resume,
            video,
        } = validate(&form)?;

        let stored_resume = self.storage.store(resume).await?;
        let stored_video = match self.storage.store(video).await {
            Ok(stored) => stored,
            Err(err) => {
                self.discard(&[&stored_resume]).await;
                return Err(err.into());
            }
        };

        let record = CandidateRecord {
            id: CandidateId(Uuid::new_v4().to_string()),
            name,
            email: form.email(),
            mobile: form.mobile(),
            position: form.position.clone(),
            current_position: form.current_position.clone(),
            experience: form.parsed_experience(),
            skills: form.parsed_skills(),
            resume_url: stored_resume.key.clone(),
            video_url: stored_video.key.clone(),
            created_at: Utc::now(),
        };

        match self.repository.insert(record) {
            Ok(record) => {
                info!(candidate = %record.id.0, resume = %record.resume_url, "candidate registered");
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "candidate insert failed, discarding uploads");
                self.discard(&[&stored_resume, &stored_video]).await;
                Err(err.into())
            }
        }
    }

    async fn discard(&self, files: &[&StoredFile]) {
        for file in files {
            if let Err(err) = self.storage.remove(&file.key).await {
                warn!(key = %file.key, error = %err, "could not remove orphaned upload");
            }
        }
    }
}
