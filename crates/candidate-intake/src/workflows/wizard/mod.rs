//! Client side of the application flow.
//!
//! Step 1 stores personal details and a resume handle, step 2 records a video
//! through the [`CaptureController`], step 3 hands the whole draft to the
//! [`SubmissionAssembler`]. Binary content never lives in the draft itself:
//! the draft keeps [`BlobRef`] handles into a [`BlobStore`].

pub mod assembler;
pub mod blobs;
pub mod capture;
pub mod client;
pub mod device;
pub mod draft;
pub mod flow;

pub use assembler::{
    FilePart, IntakeClient, IntakeError, IntakeReply, SubmissionAssembler, SubmissionError,
    SubmissionPayload, SubmissionReceipt,
};
pub use blobs::{Blob, BlobError, BlobRef, BlobResolver, BlobStore};
pub use capture::{
    CaptureController, CaptureEvent, CaptureSettings, CompletedRecording, RecordingCompletion,
    RecordingStatus, SessionSnapshot, StopReason, MAX_RECORDING_SECONDS,
};
pub use client::HttpIntakeClient;
pub use device::{
    CaptureConstraints, DeviceError, MediaDevice, MediaStream, SimulatedCamera, StreamLease,
};
pub use draft::{
    ApplicationDraft, DraftError, DraftField, DraftStore, PersonalDetails, ResumeRef, VideoRef,
    MAX_RESUME_BYTES,
};
pub use flow::{ApplicationWizard, ResumeUpload, WizardError, WizardStep};
