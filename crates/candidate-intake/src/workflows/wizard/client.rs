use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::assembler::{FilePart, IntakeClient, IntakeError, IntakeReply, SubmissionPayload};

pub const REGISTER_PATH: &str = "/api/candidates/register";

/// [`IntakeClient`] posting multipart requests to a running intake endpoint.
#[derive(Debug, Clone)]
pub struct HttpIntakeClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpIntakeClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REGISTER_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn file_part(part: FilePart) -> Result<Part, IntakeError> {
    Part::bytes(part.bytes.to_vec())
        .file_name(part.file_name)
        .mime_str(&part.content_type)
        .map_err(|err| IntakeError::Transport(err.to_string()))
}

fn body_text(body: &Option<Value>, key: &str) -> Option<String> {
    body.as_ref()
        .and_then(|value| value.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl IntakeClient for HttpIntakeClient {
    async fn register(&self, payload: SubmissionPayload) -> Result<IntakeReply, IntakeError> {
        let SubmissionPayload {
            fields,
            resume,
            video,
        } = payload;

        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part("resume", file_part(resume)?)
            .part("video", file_part(video)?);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| IntakeError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response.json::<Value>().await.ok();

        if status.is_success() {
            Ok(IntakeReply {
                status: status.as_u16(),
                message: body_text(&body, "message"),
            })
        } else {
            Err(IntakeError::Rejected {
                status: status.as_u16(),
                message: body_text(&body, "error"),
            })
        }
    }
}
