//! Admin area: login session, dashboard listings and bulk import.
//!
//! An [`AdminSession`] is issued after a successful `/admin/login` and persisted by a
//! [`SessionStore`] as a small JSON file so separate CLI invocations share it. Sessions expire;
//! an expired or unreadable session file is removed and treated as logged out.

use crate::appointments::Appointment;
use crate::backend::{HospitalBackend, ImportUpload};
use crate::constants::INVALID_CREDENTIALS_MESSAGE;
use crate::error::{ImusError, ImusResult, ValidationError};
use api_shared::{ImportRecord, LoginReq, PatientId, PatientRecord};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// A logged-in admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub session_id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Starts a session at `now`. A lifetime past the calendar range expires at its end.
    pub fn issue(username: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            username: username.trim().to_owned(),
            issued_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Persists the admin session as JSON.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored session if it is still live at `now`.
    ///
    /// Expired and corrupt session files are deleted and reported as `None`.
    pub fn load(&self, now: DateTime<Utc>) -> ImusResult<Option<AdminSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&self.path).map_err(|source| ImusError::FileRead {
            path: self.path.clone(),
            source,
        })?;

        let session: AdminSession = match serde_json::from_str(&text) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    "discarding unreadable admin session {}: {}",
                    self.path.display(),
                    e
                );
                self.clear()?;
                return Ok(None);
            }
        };

        if !session.is_live_at(now) {
            tracing::info!(
                "admin session for {} expired at {}",
                session.username,
                session.expires_at
            );
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub fn save(&self, session: &AdminSession) -> ImusResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ImusError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(session).map_err(ImusError::Serialization)?;
        std::fs::write(&self.path, json).map_err(|source| ImusError::FileWrite {
            path: self.path.clone(),
            source,
        })
    }

    /// Removes the session file. Returns whether one existed.
    pub fn clear(&self) -> ImusResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ImusError::FileWrite {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Headline counts shown above the dashboard listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_patients: usize,
    pub total_appointments: usize,
    /// Appointments dated after `today`.
    pub upcoming_appointments: usize,
}

/// Everything the dashboard lists, loaded once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub patients: Vec<PatientRecord>,
    pub appointments: Vec<Appointment>,
}

fn contains_term(field: Option<&str>, term: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(term))
}

impl Dashboard {
    /// Case-insensitive substring filter over names and address. A blank term keeps all.
    pub fn filter_patients(&self, term: &str) -> Vec<&PatientRecord> {
        let term = term.trim().to_lowercase();
        self.patients
            .iter()
            .filter(|p| {
                term.is_empty()
                    || contains_term(Some(p.lastname.as_str()), &term)
                    || contains_term(Some(p.firstname.as_str()), &term)
                    || contains_term(p.middlename.as_deref(), &term)
                    || contains_term(p.address.as_deref(), &term)
            })
            .collect()
    }

    /// Case-insensitive substring filter over patient name, type and detail.
    pub fn filter_appointments(&self, term: &str) -> Vec<&Appointment> {
        let term = term.trim().to_lowercase();
        self.appointments
            .iter()
            .filter(|a| {
                term.is_empty()
                    || contains_term(a.patient_name.as_deref(), &term)
                    || contains_term(Some(a.kind.as_str()), &term)
                    || contains_term(Some(a.detail.as_str()), &term)
            })
            .collect()
    }

    pub fn appointments_for(&self, patient_id: PatientId) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .collect()
    }

    pub fn summary(&self, today: NaiveDate) -> DashboardSummary {
        DashboardSummary {
            total_patients: self.patients.len(),
            total_appointments: self.appointments.len(),
            upcoming_appointments: self
                .appointments
                .iter()
                .filter(|a| a.is_upcoming(today))
                .count(),
        }
    }
}

/// Outcome of a bulk import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportReport {
    pub message: String,
    pub imported_count: u64,
    pub total_errors: u64,
    pub errors: Vec<String>,
}

fn import_mime_type(path: &Path) -> Result<&'static str, ValidationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => Ok("text/csv"),
        Some("json") => Ok("application/json"),
        _ => Err(ValidationError::UnsupportedImportFile(
            path.display().to_string(),
        )),
    }
}

/// Admin operations. Everything except login requires a live session.
pub struct AdminService {
    backend: Arc<dyn HospitalBackend>,
    store: SessionStore,
    ttl: Duration,
}

impl AdminService {
    pub fn new(backend: Arc<dyn HospitalBackend>, store: SessionStore, ttl: Duration) -> Self {
        Self {
            backend,
            store,
            ttl,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Checks credentials with the backend and persists a fresh session.
    ///
    /// # Errors
    ///
    /// [`ImusError::Rejected`] with the server message (or the generic invalid-credentials
    /// text) when the backend refuses, [`ImusError::Backend`] on transport failure.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ImusResult<AdminSession> {
        let req = LoginReq {
            username: username.trim().to_owned(),
            password: password.to_owned(),
        };
        let res = self.backend.login(&req).await?;
        if !res.success {
            tracing::warn!("admin login refused for {}", req.username);
            return Err(ImusError::Rejected(
                res.message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_owned()),
            ));
        }

        let session = AdminSession::issue(&req.username, now, self.ttl);
        self.store.save(&session)?;
        tracing::info!(
            "admin {} logged in, session {} valid until {}",
            session.username,
            session.session_id,
            session.expires_at
        );
        Ok(session)
    }

    pub fn logout(&self) -> ImusResult<bool> {
        self.store.clear()
    }

    pub fn current_session(&self, now: DateTime<Utc>) -> ImusResult<Option<AdminSession>> {
        self.store.load(now)
    }

    pub fn require_session(&self, now: DateTime<Utc>) -> ImusResult<AdminSession> {
        self.current_session(now)?.ok_or(ImusError::NotLoggedIn)
    }

    /// Loads all patients and all appointments.
    ///
    /// A failed appointment listing leaves the list empty; a failed patient listing is an
    /// error.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> ImusResult<Dashboard> {
        self.require_session(now)?;

        let patients = self.backend.list_patients().await?;
        if !patients.success {
            return Err(ImusError::Rejected(
                patients
                    .message
                    .unwrap_or_else(|| "Failed to load patients".to_owned()),
            ));
        }

        let appointments = match self.backend.all_appointments().await {
            Ok(res) if res.success => res.appointments.into_iter().map(Appointment::from).collect(),
            Ok(res) => {
                tracing::warn!(
                    "appointment listing unsuccessful: {}",
                    res.message.as_deref().unwrap_or("no message")
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("failed to load appointments: {}", e);
                Vec::new()
            }
        };

        Ok(Dashboard {
            patients: patients.data,
            appointments,
        })
    }

    /// Uploads a `.csv` or `.json` file to the import endpoint.
    ///
    /// The file contents are not inspected; the backend parses and validates them.
    pub async fn import_file(&self, path: &Path, now: DateTime<Utc>) -> ImusResult<ImportReport> {
        self.require_session(now)?;

        let mime_type = import_mime_type(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ImusError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_owned());

        tracing::info!("uploading {} ({} bytes) for import", file_name, bytes.len());
        let res = self
            .backend
            .import_patients(ImportUpload {
                file_name,
                mime_type,
                bytes,
            })
            .await?;

        if !res.success {
            return Err(ImusError::Rejected(
                res.error
                    .or(res.message)
                    .unwrap_or_else(|| "Import failed".to_owned()),
            ));
        }

        Ok(ImportReport {
            message: res
                .message
                .unwrap_or_else(|| format!("Imported {} records", res.imported_count)),
            imported_count: res.imported_count,
            total_errors: res.total_errors,
            errors: res.errors,
        })
    }

    pub async fn import_history(&self, now: DateTime<Utc>) -> ImusResult<Vec<ImportRecord>> {
        self.require_session(now)?;
        let res = self.backend.import_history().await?;
        if !res.success {
            return Err(ImusError::Rejected(
                res.message
                    .unwrap_or_else(|| "Failed to load import history".to_owned()),
            ));
        }
        Ok(res.imports)
    }
}
