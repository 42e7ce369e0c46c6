//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the services of
//! this crate. The binaries read the environment; the helpers here take the raw values as
//! `Option<String>` so the parsing rules can be tested without touching process-wide state.

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_SESSION_FILE, DEFAULT_SESSION_TTL_MINUTES, MAX_SESSION_TTL_MINUTES,
};
use crate::directory::ReferenceDirectory;
use crate::error::{ImusError, ImusResult};
use chrono::Duration;
use std::path::{Path, PathBuf};

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    backend_url: String,
    session_file: PathBuf,
    session_ttl: Duration,
    reference_directory: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(
        backend_url: String,
        session_file: PathBuf,
        session_ttl: Duration,
        reference_directory: Option<PathBuf>,
    ) -> ImusResult<Self> {
        let backend_url = backend_url.trim().trim_end_matches('/').to_owned();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ImusError::InvalidInput(format!(
                "backend url must start with http:// or https://, got {backend_url:?}"
            )));
        }
        if session_ttl <= Duration::zero() {
            return Err(ImusError::InvalidInput(
                "admin session lifetime must be positive".into(),
            ));
        }
        if session_ttl > Duration::minutes(MAX_SESSION_TTL_MINUTES) {
            return Err(ImusError::InvalidInput(format!(
                "admin session lifetime must not exceed {MAX_SESSION_TTL_MINUTES} minutes"
            )));
        }

        Ok(Self {
            backend_url,
            session_file,
            session_ttl,
            reference_directory,
        })
    }

    /// Builds the configuration from raw environment values, applying defaults.
    pub fn from_env_values(
        backend_url: Option<String>,
        session_file: Option<String>,
        session_ttl_minutes: Option<String>,
        reference_directory: Option<String>,
    ) -> ImusResult<Self> {
        Self::new(
            backend_url_from_env_value(backend_url),
            session_file_from_env_value(session_file),
            session_ttl_from_env_value(session_ttl_minutes)?,
            reference_directory_from_env_value(reference_directory),
        )
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn reference_directory(&self) -> Option<&Path> {
        self.reference_directory.as_deref()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            reference_directory: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// `IMUS_BACKEND_URL`, falling back to the local development backend.
pub fn backend_url_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned())
}

/// `IMUS_SESSION_FILE`.
pub fn session_file_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
}

/// `IMUS_SESSION_TTL_MINUTES`; a whole number of minutes between 1 and
/// [`MAX_SESSION_TTL_MINUTES`].
pub fn session_ttl_from_env_value(value: Option<String>) -> ImusResult<Duration> {
    let Some(raw) = non_blank(value) else {
        return Ok(Duration::minutes(DEFAULT_SESSION_TTL_MINUTES));
    };
    raw.parse::<i64>()
        .ok()
        .filter(|minutes| (1..=MAX_SESSION_TTL_MINUTES).contains(minutes))
        .and_then(Duration::try_minutes)
        .ok_or_else(|| {
            ImusError::InvalidInput(format!(
                "IMUS_SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES} minutes, got {raw:?}"
            ))
        })
}

/// `IMUS_REFERENCE_DIRECTORY`; unset means the built-in directory.
pub fn reference_directory_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

/// Builds the shared reference directory: the YAML override if configured, else the seed
/// records.
pub fn resolve_reference_directory(path: Option<&Path>) -> ImusResult<ReferenceDirectory> {
    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(ImusError::InvalidInput(format!(
                    "IMUS_REFERENCE_DIRECTORY is not a file: {}",
                    path.display()
                )));
            }
            ReferenceDirectory::load(path)
        }
        None => Ok(ReferenceDirectory::builtin()),
    }
}
