use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::blobs::{BlobError, BlobRef, BlobResolver};
use super::draft::{ApplicationDraft, DraftField, DraftStore};

pub const VIDEO_FILE_NAME: &str = "recording.webm";
pub const DEFAULT_RESUME_FILE_NAME: &str = "resume.pdf";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Your application has been submitted successfully!";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

/// One binary part of the outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

/// Everything the intake endpoint receives in a single multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub fields: Vec<(&'static str, String)>,
    pub resume: FilePart,
    pub video: FilePart,
}

impl SubmissionPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Successful reply from the intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeReply {
    pub status: u16,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("intake endpoint answered {status}")]
    Rejected { status: u16, message: Option<String> },
    #[error("{0}")]
    Transport(String),
}

impl IntakeError {
    /// Server-provided text when present, otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            IntakeError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            IntakeError::Transport(detail) if !detail.trim().is_empty() => detail.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Outbound seam to the intake endpoint.
#[async_trait]
pub trait IntakeClient: Send + Sync {
    async fn register(&self, payload: SubmissionPayload) -> Result<IntakeReply, IntakeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("prerequisite step incomplete: {missing} is missing")]
    Incomplete { missing: DraftField },
    #[error(transparent)]
    Unavailable(#[from] BlobError),
    #[error("a submission is already in progress")]
    InFlight,
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: IntakeError,
    },
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Rehydrates draft handles and sends the combined application.
pub struct SubmissionAssembler<R, C> {
    resolver: Arc<R>,
    client: Arc<C>,
    in_flight: AtomicBool,
}

impl<R, C> SubmissionAssembler<R, C>
where
    R: BlobResolver + 'static,
    C: IntakeClient + 'static,
{
    pub fn new(resolver: Arc<R>, client: Arc<C>) -> Self {
        Self {
            resolver,
            client,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Builds the multipart payload. Fails before touching any handle when a
    /// step is missing.
    pub async fn assemble(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<SubmissionPayload, SubmissionError> {
        let (personal, resume, video) = draft
            .parts()
            .map_err(|missing| SubmissionError::Incomplete { missing })?;

        let resume_part = self
            .rehydrate(resume.blob(), DEFAULT_RESUME_FILE_NAME, mime::APPLICATION_PDF.as_ref())
            .await?;
        let video_part = self
            .rehydrate(video.blob(), VIDEO_FILE_NAME, super::capture::RECORDING_CONTENT_TYPE)
            .await?;

        Ok(SubmissionPayload {
            fields: vec![
                ("firstName", personal.first_name.clone()),
                ("lastName", personal.last_name.clone()),
                ("position", personal.position.clone()),
                ("currentPosition", personal.current_position.clone()),
                ("experience", personal.experience_years.to_string()),
            ],
            resume: resume_part,
            video: FilePart {
                file_name: VIDEO_FILE_NAME.to_string(),
                ..video_part
            },
        })
    }

    /// Assembles the draft held by `store` and sends it once.
    ///
    /// The store is cleared only after the endpoint accepts the submission.
    pub async fn submit(
        &self,
        store: &mut DraftStore,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmissionError::InFlight)?;

        let payload = self.assemble(store.as_draft()).await?;
        match self.client.register(payload).await {
            Ok(reply) => {
                store.clear();
                let message = reply
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
                info!(status = reply.status, "application submitted");
                Ok(SubmissionReceipt {
                    status: reply.status,
                    message,
                })
            }
            Err(source) => {
                warn!(error = %source, "application submission failed");
                Err(SubmissionError::Failed {
                    message: source.user_message(),
                    source,
                })
            }
        }
    }

    async fn rehydrate(
        &self,
        reference: &BlobRef,
        fallback_name: &str,
        fallback_type: &str,
    ) -> Result<FilePart, SubmissionError> {
        let blob = self.resolver.resolve(reference).await?;
        let file_name = if reference.name.trim().is_empty() {
            fallback_name.to_string()
        } else {
            reference.name.clone()
        };
        let content_type = if blob.content_type.trim().is_empty() {
            fallback_type.to_string()
        } else {
            blob.content_type
        };
        Ok(FilePart {
            file_name,
            content_type,
            bytes: blob.bytes,
        })
    }
}
