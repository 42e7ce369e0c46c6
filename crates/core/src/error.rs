use std::path::PathBuf;

/// Input rejected locally, before any request is made.
///
/// These are the "blocking alert" errors of the forms: the caller shows the message and keeps
/// the current view state.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please select a birth {0}")]
    MissingDateComponent(&'static str),
    #[error("unrecognised month name: {0}")]
    UnknownMonth(String),
    #[error("invalid birth day: {0}")]
    InvalidDay(String),
    #[error("invalid birth year: {0}")]
    InvalidYear(String),
    #[error("{0} is not a valid calendar date")]
    NonexistentDate(String),
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidIsoDate(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("unknown appointment type: {0}")]
    UnknownAppointmentKind(String),
    #[error("unsupported import file (expected .csv or .json): {0}")]
    UnsupportedImportFile(String),
}

/// Failures talking to the hospital backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {endpoint} (HTTP {status}): {source}")]
    Decode {
        endpoint: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, thiserror::Error)]
pub enum ImusError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The backend answered `success: false`; carries its message.
    #[error("{0}")]
    Rejected(String),
    #[error("birthday {0} was not one of the offered choices")]
    BirthdayNotOffered(String),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("admin login required")]
    NotLoggedIn,
    #[error("failed to read {path}: {source}", path = path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}", path = path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize session: {0}")]
    Serialization(serde_json::Error),
    #[error("reference directory schema mismatch: {0}")]
    Directory(String),
}

impl ImusError {
    /// Text suitable for showing inline on a form.
    ///
    /// Transport and decode failures collapse to the generic network message; everything else
    /// shows its own description.
    pub fn user_message(&self) -> String {
        match self {
            ImusError::Backend(_) => NETWORK_ERROR_MESSAGE.to_owned(),
            other => other.to_string(),
        }
    }
}

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

pub type ImusResult<T> = std::result::Result<T, ImusError>;
