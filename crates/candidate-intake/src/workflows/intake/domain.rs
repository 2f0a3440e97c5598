use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::storage::storage_file_name;

/// Identifier wrapper for persisted candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// A file part received by the intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// False for the empty part a browser sends when no file was chosen, and
    /// for names that leave nothing to store under.
    pub fn is_usable(&self) -> bool {
        !self.bytes.is_empty() && storage_file_name(&self.original_name, 0).is_some()
    }
}

/// Raw registration request as the multipart body delivered it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub skills: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub current_position: Option<String>,
    pub experience: Option<String>,
    pub resume: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
}

impl RegistrationForm {
    /// Records a text field by its wire name. Unknown fields are ignored.
    pub fn set_text(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "mobile" => &mut self.mobile,
            "skills" => &mut self.skills,
            "firstName" => &mut self.first_name,
            "lastName" => &mut self.last_name,
            "position" => &mut self.position,
            "currentPosition" => &mut self.current_position,
            "experience" => &mut self.experience,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Records a file part. Only `resume` and `video` are kept.
    pub fn attach(&mut self, field: &str, file: UploadedFile) -> bool {
        match field {
            "resume" => self.resume = Some(file),
            "video" => self.video = Some(file),
            _ => return false,
        }
        true
    }

    /// `name` when given, otherwise first and last name joined.
    pub fn derived_name(&self) -> Option<String> {
        if let Some(name) = non_blank(&self.name) {
            return Some(name);
        }
        let joined = [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(" ");
        let joined = joined.trim();
        (!joined.is_empty()).then(|| joined.to_string())
    }

    pub fn parsed_experience(&self) -> Option<f64> {
        non_blank(&self.experience)
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }

    pub fn parsed_skills(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|skill| !skill.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn email(&self) -> Option<String> {
        non_blank(&self.email)
    }

    pub fn mobile(&self) -> Option<String> {
        non_blank(&self.mobile)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Persisted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: CandidateId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub position: Option<String>,
    pub current_position: Option<String>,
    pub experience: Option<f64>,
    pub skills: Vec<String>,
    pub resume_url: String,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}
