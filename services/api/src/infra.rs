use candidate_intake::error::AppError;
use candidate_intake::workflows::intake::{
    CandidateIntakeService, DiskFileStorage, InMemoryCandidateRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type IntakeService = CandidateIntakeService<InMemoryCandidateRepository, DiskFileStorage>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory candidates plus uploads written under `upload_dir`.
pub(crate) async fn build_intake_service(
    upload_dir: impl Into<PathBuf>,
) -> Result<(Arc<IntakeService>, Arc<InMemoryCandidateRepository>), AppError> {
    let repository = Arc::new(InMemoryCandidateRepository::new());
    let storage = Arc::new(DiskFileStorage::create(upload_dir).await?);
    let service = Arc::new(CandidateIntakeService::new(repository.clone(), storage));
    Ok((service, repository))
}
