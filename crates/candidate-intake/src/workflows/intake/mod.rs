//! Server side of the application wizard: multipart registration, upload
//! storage, and the candidate repository.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use domain::{CandidateId, CandidateRecord, RegistrationForm, UploadedFile};
pub use repository::{CandidateRepository, InMemoryCandidateRepository, RepositoryError};
pub use router::{intake_router, REGISTER_ROUTE};
pub use service::{
    CandidateIntakeService, IntakeServiceError, RegistrationError, REGISTERED_MESSAGE,
};
pub use storage::{storage_file_name, DiskFileStorage, FileStorage, StorageError, StoredFile};
