use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::assembler::{IntakeClient, SubmissionAssembler, SubmissionError, SubmissionReceipt};
use super::blobs::BlobStore;
use super::capture::CaptureController;
use super::draft::{
    validate_resume, ApplicationDraft, DraftError, DraftStore, PersonalDetails, ResumeRef,
};

/// Where the applicant currently is in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Details,
    Video,
    Review,
    Submitted,
}

/// A resume picked in step 1, before it is parked in the blob store.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("Please record a video before submitting.")]
    NoRecording,
    #[error("{action} is not available on the {step:?} step")]
    WrongStep { action: &'static str, step: WizardStep },
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Drives one application attempt from details to submission.
pub struct ApplicationWizard<C> {
    step: WizardStep,
    blobs: Arc<BlobStore>,
    drafts: DraftStore,
    capture: CaptureController,
    assembler: SubmissionAssembler<BlobStore, C>,
}

impl<C> ApplicationWizard<C>
where
    C: IntakeClient + 'static,
{
    pub fn new(capture: CaptureController, client: Arc<C>) -> Self {
        let blobs = Arc::new(BlobStore::new());
        Self {
            step: WizardStep::Details,
            assembler: SubmissionAssembler::new(blobs.clone(), client),
            blobs,
            drafts: DraftStore::new(),
            capture,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> ApplicationDraft {
        self.drafts.draft()
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn is_submitting(&self) -> bool {
        self.assembler.is_in_flight()
    }

    /// Step 1. Both inputs are validated before anything is stored.
    pub fn submit_details(
        &mut self,
        details: PersonalDetails,
        resume: ResumeUpload,
    ) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Details, "submitting details")?;
        details.validate()?;

        let ResumeUpload {
            file_name,
            content_type,
            bytes,
        } = resume;
        validate_resume(&content_type, bytes.len() as u64)?;

        let handle = self.blobs.register(file_name, content_type, bytes);
        let resume = ResumeRef::new(handle);
        if let Err(err) = self.drafts.set_personal(details) {
            self.blobs.revoke(resume.blob());
            return Err(err.into());
        }
        if let Err(err) = self.drafts.set_resume_ref(resume.clone()) {
            self.blobs.revoke(resume.blob());
            return Err(err.into());
        }

        self.step = WizardStep::Video;
        info!(resume = resume.file_name(), "details step completed");
        Ok(())
    }

    /// Step 2 "continue": keeps the finished recording and releases the camera.
    pub fn continue_from_video(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Video, "continuing to review")?;
        let recording = self.capture.recording().ok_or(WizardError::NoRecording)?;

        let video = recording.register(&self.blobs);
        if let Err(err) = self.drafts.set_video_ref(video.clone()) {
            self.blobs.revoke(video.blob());
            return Err(err.into());
        }

        self.capture.teardown();
        self.step = WizardStep::Review;
        info!(
            duration_seconds = recording.duration_seconds(),
            "video step completed"
        );
        Ok(())
    }

    /// Back navigation restarts the attempt from step 1.
    pub fn back(&mut self) {
        if matches!(self.step, WizardStep::Video | WizardStep::Review) {
            debug!(step = ?self.step, "back navigation restarts the application");
            self.restart();
        }
    }

    /// Step 3. On success the draft and every handle are dropped.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, WizardError> {
        self.expect_step(WizardStep::Review, "submitting the application")?;
        let receipt = self.assembler.submit(&mut self.drafts).await?;

        self.blobs.clear();
        self.capture.reset();
        self.step = WizardStep::Submitted;
        Ok(receipt)
    }

    /// Discards the current attempt and returns to step 1.
    pub fn restart(&mut self) {
        self.capture.reset();
        self.blobs.clear();
        self.drafts.reset();
        self.step = WizardStep::Details;
    }

    fn expect_step(&self, expected: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                action,
                step: self.step,
            })
        }
    }
}

impl<C> Drop for ApplicationWizard<C> {
    fn drop(&mut self) {
        self.capture.teardown();
    }
}
