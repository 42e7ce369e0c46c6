//! Constants used throughout the core crate.
//!
//! Endpoint paths and defaults live here so the backend client, configuration and tests agree
//! on them.

/// Month names accepted by the birthday selector, in calendar order.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Backend used when `IMUS_BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Admin session file used when `IMUS_SESSION_FILE` is not set.
pub const DEFAULT_SESSION_FILE: &str = ".imus/admin_session.json";

/// Admin session lifetime used when `IMUS_SESSION_TTL_MINUTES` is not set.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

/// Longest admin session lifetime accepted from configuration: one week.
pub const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

pub const SEARCH_PATH: &str = "/search";
pub const PATIENTS_PATH: &str = "/patients";
pub const ADD_PATIENT_PATH: &str = "/add_patient";
pub const APPOINTMENTS_PATH: &str = "/appointments";
pub const ADMIN_APPOINTMENTS_PATH: &str = "/admin/appointments";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const IMPORT_PATIENTS_PATH: &str = "/import_patients";
pub const IMPORT_HISTORY_PATH: &str = "/import_history";

/// Shown when login fails without a server message.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please try again.";
