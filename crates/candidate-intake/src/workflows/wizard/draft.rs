use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blobs::BlobRef;
use super::capture::MAX_RECORDING_SECONDS;

pub const MAX_RESUME_BYTES: u64 = 5 * 1024 * 1024;

/// Step 1 text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub current_position: String,
    pub experience_years: u32,
}

impl PersonalDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("position", &self.position),
            ("currentPosition", &self.current_position),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DraftError::BlankField { field });
            }
        }
        Ok(())
    }
}

/// Resume handle plus its original file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeRef(BlobRef);

impl ResumeRef {
    pub fn new(blob: BlobRef) -> Self {
        Self(blob)
    }

    pub fn blob(&self) -> &BlobRef {
        &self.0
    }

    pub fn file_name(&self) -> &str {
        &self.0.name
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        validate_resume(&self.0.content_type, self.0.size)
    }
}

/// Declared type must be PDF and the size at most [`MAX_RESUME_BYTES`].
pub fn validate_resume(content_type: &str, size: u64) -> Result<(), DraftError> {
    let is_pdf = content_type
        .parse::<mime::Mime>()
        .map(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str())
        .unwrap_or(false);
    if !is_pdf {
        return Err(DraftError::ResumeNotPdf {
            content_type: content_type.to_string(),
        });
    }
    if size > MAX_RESUME_BYTES {
        return Err(DraftError::ResumeTooLarge { size });
    }
    Ok(())
}

/// Handle to a finished recording. Minted only by
/// [`CompletedRecording::register`](super::capture::CompletedRecording::register).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    blob: BlobRef,
    session_id: Uuid,
    duration_seconds: u32,
}

impl VideoRef {
    pub(crate) fn new(blob: BlobRef, session_id: Uuid, duration_seconds: u32) -> Self {
        Self {
            blob,
            session_id,
            duration_seconds,
        }
    }

    pub fn blob(&self) -> &BlobRef {
        &self.blob
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Personal,
    Resume,
    Video,
}

impl DraftField {
    pub const fn label(self) -> &'static str {
        match self {
            DraftField::Personal => "personal details",
            DraftField::Resume => "resume",
            DraftField::Video => "video recording",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// In-progress application assembled across the wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub personal: Option<PersonalDetails>,
    pub resume: Option<ResumeRef>,
    pub video: Option<VideoRef>,
}

impl ApplicationDraft {
    pub fn is_empty(&self) -> bool {
        self.personal.is_none() && self.resume.is_none() && self.video.is_none()
    }

    /// All three steps, or the first one (in wizard order) still missing.
    pub fn parts(&self) -> Result<(&PersonalDetails, &ResumeRef, &VideoRef), DraftField> {
        let personal = self.personal.as_ref().ok_or(DraftField::Personal)?;
        let resume = self.resume.as_ref().ok_or(DraftField::Resume)?;
        let video = self.video.as_ref().ok_or(DraftField::Video)?;
        Ok((personal, resume, video))
    }

    /// First step, in wizard order, that has not been recorded yet.
    pub fn missing(&self) -> Option<DraftField> {
        self.parts().err()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("All fields are required ({field} is blank)")]
    BlankField { field: &'static str },
    #[error("Resume must be a PDF file")]
    ResumeNotPdf { content_type: String },
    #[error("File size must not exceed 5 MB")]
    ResumeTooLarge { size: u64 },
    #[error("Recording exceeds the {limit} second limit ({duration_seconds}s)")]
    RecordingTooLong { duration_seconds: u32, limit: u32 },
    #[error("The {field} for this application has already been recorded")]
    AlreadySet { field: DraftField },
}

/// Write-once-per-field holder for the current application attempt.
///
/// Every setter validates first; a rejected write leaves the draft untouched.
#[derive(Debug, Default)]
pub struct DraftStore {
    draft: ApplicationDraft,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_personal(&mut self, details: PersonalDetails) -> Result<(), DraftError> {
        if self.draft.personal.is_some() {
            return Err(DraftError::AlreadySet {
                field: DraftField::Personal,
            });
        }
        details.validate()?;
        self.draft.personal = Some(details);
        Ok(())
    }

    pub fn set_resume_ref(&mut self, resume: ResumeRef) -> Result<(), DraftError> {
        if self.draft.resume.is_some() {
            return Err(DraftError::AlreadySet {
                field: DraftField::Resume,
            });
        }
        resume.validate()?;
        self.draft.resume = Some(resume);
        Ok(())
    }

    pub fn set_video_ref(&mut self, video: VideoRef) -> Result<(), DraftError> {
        if self.draft.video.is_some() {
            return Err(DraftError::AlreadySet {
                field: DraftField::Video,
            });
        }
        if video.duration_seconds > MAX_RECORDING_SECONDS {
            return Err(DraftError::RecordingTooLong {
                duration_seconds: video.duration_seconds,
                limit: MAX_RECORDING_SECONDS,
            });
        }
        self.draft.video = Some(video);
        Ok(())
    }

    /// Snapshot of the current draft.
    pub fn draft(&self) -> ApplicationDraft {
        self.draft.clone()
    }

    pub fn as_draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn is_complete(&self) -> bool {
        self.draft.is_complete()
    }

    /// Empties the store after a successful submission.
    pub fn clear(&mut self) {
        self.draft = ApplicationDraft::default();
    }

    /// Starts a fresh attempt, discarding every recorded step.
    pub fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> PersonalDetails {
        PersonalDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            position: "Engineer".to_string(),
            current_position: "Analyst".to_string(),
            experience_years: 5,
        }
    }

    fn resume(content_type: &str, size: u64) -> ResumeRef {
        ResumeRef::new(BlobRef {
            key: Uuid::new_v4(),
            name: "cv.pdf".to_string(),
            content_type: content_type.to_string(),
            size,
        })
    }

    fn video(duration_seconds: u32) -> VideoRef {
        VideoRef::new(
            BlobRef {
                key: Uuid::new_v4(),
                name: "recording.webm".to_string(),
                content_type: "video/webm".to_string(),
                size: 128,
            },
            Uuid::new_v4(),
            duration_seconds,
        )
    }

    #[test]
    fn blank_personal_field_is_rejected_without_writing() {
        let mut store = DraftStore::new();
        let mut incomplete = details();
        incomplete.current_position = "   ".to_string();

        assert_eq!(
            store.set_personal(incomplete),
            Err(DraftError::BlankField {
                field: "currentPosition"
            })
        );
        assert!(store.draft().is_empty());
    }

    #[test]
    fn resume_size_boundary_is_inclusive() {
        let mut store = DraftStore::new();
        assert_eq!(
            store.set_resume_ref(resume("application/pdf", MAX_RESUME_BYTES + 1)),
            Err(DraftError::ResumeTooLarge {
                size: MAX_RESUME_BYTES + 1
            })
        );
        assert!(store.draft().resume.is_none());

        store
            .set_resume_ref(resume("application/pdf", MAX_RESUME_BYTES))
            .expect("exactly 5 MiB passes");
        assert!(store.draft().resume.is_some());
    }

    #[test]
    fn resume_must_declare_pdf() {
        let mut store = DraftStore::new();
        let err = store
            .set_resume_ref(resume("application/msword", 1024))
            .expect_err("word document rejected");
        assert_eq!(err.to_string(), "Resume must be a PDF file");
        assert!(store.draft().is_empty());

        store
            .set_resume_ref(resume("application/pdf; name=cv.pdf", 1024))
            .expect("parameters on the pdf type are fine");
    }

    #[test]
    fn fields_are_write_once_until_cleared() {
        let mut store = DraftStore::new();
        store.set_personal(details()).expect("first write");
        let before = store.draft();

        let mut other = details();
        other.first_name = "Grace".to_string();
        assert_eq!(
            store.set_personal(other.clone()),
            Err(DraftError::AlreadySet {
                field: DraftField::Personal
            })
        );
        assert_eq!(store.draft(), before);

        store.clear();
        store.set_personal(other).expect("fresh attempt");
    }

    #[test]
    fn over_cap_recording_is_rejected() {
        let mut store = DraftStore::new();
        assert!(matches!(
            store.set_video_ref(video(MAX_RECORDING_SECONDS + 1)),
            Err(DraftError::RecordingTooLong { .. })
        ));
        store
            .set_video_ref(video(MAX_RECORDING_SECONDS))
            .expect("cap itself is allowed");
    }

    #[test]
    fn missing_reports_steps_in_wizard_order() {
        let mut store = DraftStore::new();
        assert_eq!(store.as_draft().missing(), Some(DraftField::Personal));
        store.set_personal(details()).expect("personal");
        assert_eq!(store.as_draft().missing(), Some(DraftField::Resume));
        store
            .set_resume_ref(resume("application/pdf", 10))
            .expect("resume");
        assert_eq!(store.as_draft().missing(), Some(DraftField::Video));
        store.set_video_ref(video(12)).expect("video");
        assert!(store.is_complete());

        store.reset();
        assert!(store.as_draft().is_empty());
    }

    #[test]
    fn parts_reports_earliest_gap_even_when_later_steps_exist() {
        let mut store = DraftStore::new();
        store.set_video_ref(video(30)).expect("video");
        assert_eq!(store.as_draft().parts().err(), Some(DraftField::Personal));

        store.set_personal(details()).expect("personal");
        assert_eq!(store.as_draft().parts().err(), Some(DraftField::Resume));

        store
            .set_resume_ref(resume("application/pdf", 10))
            .expect("resume");
        let (personal, resume, video) = store.as_draft().parts().expect("complete");
        assert_eq!(personal.first_name, "Ada");
        assert_eq!(resume.file_name(), "cv.pdf");
        assert_eq!(video.duration_seconds(), 30);
    }

    #[test]
    fn full_name_joins_trimmed_parts() {
        let mut person = details();
        person.first_name = " Ada ".to_string();
        assert_eq!(person.full_name(), "Ada Lovelace");
    }
}
