use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;
use tracing::debug;

use super::domain::{RegistrationForm, UploadedFile};
use super::repository::{CandidateRepository, RepositoryError};
use super::service::{CandidateIntakeService, IntakeServiceError, REGISTERED_MESSAGE};
use super::storage::FileStorage;

pub const REGISTER_ROUTE: &str = "/api/candidates/register";

/// Router exposing the candidate registration endpoint.
///
/// `max_request_bytes` caps the whole multipart body.
pub fn intake_router<R, S>(
    service: Arc<CandidateIntakeService<R, S>>,
    max_request_bytes: usize,
) -> Router
where
    R: CandidateRepository + 'static,
    S: FileStorage + 'static,
{
    Router::new()
        .route(REGISTER_ROUTE, post(register_handler::<R, S>))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .with_state(service)
}

pub(crate) async fn read_form(mut multipart: Multipart) -> Result<RegistrationForm, MultipartError> {
    let mut form = RegistrationForm::default();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            let file = UploadedFile {
                original_name: file_name,
                content_type,
                bytes: bytes.to_vec(),
            };
            if !form.attach(&name, file) {
                debug!(field = %name, "ignoring unexpected file part");
            }
        } else {
            let value = field.text().await?;
            if !form.set_text(&name, value) {
                debug!(field = %name, "ignoring unexpected text field");
            }
        }
    }
    Ok(form)
}

pub(crate) async fn register_handler<R, S>(
    State(service): State<Arc<CandidateIntakeService<R, S>>>,
    multipart: Multipart,
) -> Response
where
    R: CandidateRepository + 'static,
    S: FileStorage + 'static,
{
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(error) => {
            let payload = json!({
                "error": error.body_text(),
            });
            return (error.status(), axum::Json(payload)).into_response();
        }
    };

    match service.register(form).await {
        Ok(_) => {
            let payload = json!({
                "message": REGISTERED_MESSAGE,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(IntakeServiceError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(IntakeServiceError::Repository(error @ RepositoryError::Conflict { .. })) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
