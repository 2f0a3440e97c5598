use crate::infra::build_intake_service;
use crate::routes::with_intake_routes;
use candidate_intake::error::AppError;
use candidate_intake::workflows::intake::CandidateRepository;
use candidate_intake::workflows::wizard::{
    ApplicationWizard, CaptureController, CaptureSettings, HttpIntakeClient, PersonalDetails,
    RecordingStatus, ResumeUpload, SimulatedCamera, MAX_RECORDING_SECONDS,
};
use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

const SYNTHETIC_RESUME_BYTES: usize = 2 * 1024 * 1024;
const DEMO_BODY_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// PDF to upload as the resume. A synthetic 2 MiB PDF is used when omitted.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    /// Number of one-second ticks to simulate while recording.
    #[arg(long, default_value_t = MAX_RECORDING_SECONDS + 1)]
    pub(crate) ticks: u32,
    /// Simulate the applicant refusing camera access.
    #[arg(long)]
    pub(crate) deny_camera: bool,
    /// Directory for uploads received by the in-process server.
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct StoredCandidateView<'a> {
    name: &'a str,
    position: Option<&'a str>,
    experience: Option<f64>,
    resume_url: &'a str,
    video_url: &'a str,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        resume,
        ticks,
        deny_camera,
        upload_dir,
    } = args;

    let upload_dir = upload_dir.unwrap_or_else(|| {
        std::env::temp_dir().join(format!(
            "candidate-intake-demo-{}",
            Utc::now().timestamp_millis()
        ))
    });
    let (service, repository) = build_intake_service(&upload_dir).await?;
    let app = with_intake_routes(service, DEMO_BODY_LIMIT);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!(error = %err, "demo intake server stopped");
        }
    });

    println!("Candidate application wizard demo");
    println!("Intake endpoint: http://{addr}/api/candidates/register");
    println!("Uploads: {}", upload_dir.display());

    let camera = if deny_camera {
        SimulatedCamera::denying()
    } else {
        SimulatedCamera::granting()
    };
    let capture = CaptureController::with_settings(
        Arc::new(camera.clone()),
        CaptureSettings::manual_ticks(),
    );
    let client = Arc::new(HttpIntakeClient::new(&format!("http://{addr}")));
    let mut wizard = ApplicationWizard::new(capture, client);

    println!("\nStep 1: personal details and resume");
    let upload = load_resume(resume.as_deref()).await?;
    println!(
        "  Resume: {} ({}, {} bytes)",
        upload.file_name,
        upload.content_type,
        upload.bytes.len()
    );
    let details = PersonalDetails {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        position: "Engineer".to_string(),
        current_position: "Analyst".to_string(),
        experience_years: 5,
    };
    if let Err(err) = wizard.submit_details(details, upload) {
        println!("  Rejected: {err}");
        server.abort();
        return Ok(());
    }
    println!("  Saved. Moving to {:?}", wizard.step());

    println!("\nStep 2: video recording");
    let status = wizard.capture().start().await;
    if status == RecordingStatus::Denied {
        let snapshot = wizard.capture().snapshot();
        println!(
            "  {}",
            snapshot.message.as_deref().unwrap_or("Camera unavailable.")
        );
        println!(
            "  Status {:?}, elapsed {}s, stream held: {}",
            snapshot.status, snapshot.elapsed_seconds, snapshot.stream_held
        );
        server.abort();
        return Ok(());
    }

    for _ in 0..ticks {
        if wizard.capture().tick().is_none() {
            break;
        }
    }
    if wizard.capture().status() == RecordingStatus::Recording {
        wizard.capture().stop();
    }
    let snapshot = wizard.capture().snapshot();
    println!(
        "  Recorded {}s, stop reason {:?}, live tracks after stop: {}",
        snapshot.elapsed_seconds,
        snapshot.stop_reason,
        camera.live_tracks()
    );
    if let Some(message) = snapshot.message.as_deref() {
        println!("  {message}");
    }

    if let Err(err) = wizard.continue_from_video() {
        println!("  {err}");
        server.abort();
        return Ok(());
    }

    println!("\nStep 3: review and submit");
    let draft = wizard.draft();
    if let Some(personal) = &draft.personal {
        println!(
            "  {} applying for {} ({} years as {})",
            personal.full_name(),
            personal.position,
            personal.experience_years,
            personal.current_position
        );
    }
    match wizard.submit().await {
        Ok(receipt) => println!("  {} (HTTP {})", receipt.message, receipt.status),
        Err(err) => println!("  Submission failed: {err}"),
    }
    println!("  Draft cleared: {}", wizard.draft().is_empty());

    match repository.list() {
        Ok(records) => {
            println!("\nStored candidates: {}", records.len());
            for record in &records {
                let view = StoredCandidateView {
                    name: &record.name,
                    position: record.position.as_deref(),
                    experience: record.experience,
                    resume_url: &record.resume_url,
                    video_url: &record.video_url,
                };
                match serde_json::to_string_pretty(&view) {
                    Ok(json) => println!("{json}"),
                    Err(err) => println!("  Record unavailable: {err}"),
                }
            }
        }
        Err(err) => println!("\nRepository unavailable: {err}"),
    }

    server.abort();
    Ok(())
}

async fn load_resume(path: Option<&Path>) -> Result<ResumeUpload, AppError> {
    let Some(path) = path else {
        return Ok(synthetic_resume());
    };

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume.pdf".to_string());
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(ResumeUpload {
        file_name,
        content_type,
        bytes,
    })
}

fn synthetic_resume() -> ResumeUpload {
    let mut bytes = b"%PDF-1.7\n% Ada Lovelace resume\n".to_vec();
    bytes.resize(SYNTHETIC_RESUME_BYTES - 6, b' ');
    bytes.extend_from_slice(b"%%EOF\n");
    ResumeUpload {
        file_name: "Ada Lovelace Resume.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes,
    }
}
