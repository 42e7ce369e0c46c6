//! Wiring of the services for the front ends.

use crate::admin::{AdminService, SessionStore};
use crate::appointments::AppointmentBook;
use crate::backend::{HospitalBackend, HttpBackend};
use crate::config::{resolve_reference_directory, ClientConfig};
use crate::directory::ReferenceDirectory;
use crate::error::ImusResult;
use crate::lookup::{LookupSession, SearchResolver};
use crate::registration::{register, Registered, RegistrationForm};
use api_shared::PatientRecord;
use std::sync::Arc;

/// One backend connection pool and one reference directory, shared by every service.
#[derive(Clone)]
pub struct ImusClient {
    config: ClientConfig,
    backend: Arc<dyn HospitalBackend>,
    directory: Arc<ReferenceDirectory>,
}

impl ImusClient {
    /// Connects to the configured HTTP backend and loads the reference directory.
    pub fn from_config(config: ClientConfig) -> ImusResult<Self> {
        let directory = resolve_reference_directory(config.reference_directory())?;
        let backend = HttpBackend::new(config.backend_url());
        tracing::info!(
            "using backend {} with {} reference patients",
            backend.base_url(),
            directory.len()
        );
        Ok(Self::with_backend(
            config,
            Arc::new(backend),
            Arc::new(directory),
        ))
    }

    pub fn with_backend(
        config: ClientConfig,
        backend: Arc<dyn HospitalBackend>,
        directory: Arc<ReferenceDirectory>,
    ) -> Self {
        Self {
            config,
            backend,
            directory,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn directory(&self) -> &ReferenceDirectory {
        &self.directory
    }

    pub fn resolver(&self) -> SearchResolver {
        SearchResolver::new(self.backend.clone(), self.directory.clone())
    }

    pub fn lookup_session(&self) -> LookupSession {
        LookupSession::new(self.resolver())
    }

    pub async fn appointment_book(&self, patient: PatientRecord) -> ImusResult<AppointmentBook> {
        AppointmentBook::open(self.backend.clone(), patient).await
    }

    pub async fn register(&self, form: &RegistrationForm) -> ImusResult<Registered> {
        register(self.backend.as_ref(), form).await
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(
            self.backend.clone(),
            SessionStore::new(self.config.session_file()),
            self.config.session_ttl(),
        )
    }
}
