//! # Imus Core
//!
//! Client-side logic for the Ospital ng Imus patient lookup and booking system:
//! - Patient search with a fallback reference directory and birthday disambiguation
//! - Appointment listing and booking for a resolved patient
//! - Patient registration
//! - Admin session, dashboard listings and bulk import
//!
//! **No server concerns**: the hospital backend is an external HTTP service reached through
//! [`HospitalBackend`]. Wire shapes live in `api-shared`.

pub mod admin;
pub mod appointments;
pub mod backend;
pub mod client;
pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod id_card;
pub mod lookup;
pub mod query;
pub mod registration;
pub mod validation;

pub use api_shared::PatientId;
pub use admin::{
    AdminService, AdminSession, Dashboard, DashboardSummary, ImportReport, SessionStore,
};
pub use appointments::{
    decode_reason, encode_reason, Appointment, AppointmentBook, AppointmentKind, NewAppointment,
};
pub use backend::{HospitalBackend, HttpBackend, ImportUpload};
pub use client::ImusClient;
pub use config::ClientConfig;
pub use directory::ReferenceDirectory;
pub use error::{BackendError, ImusError, ImusResult, ValidationError};
pub use id_card::IdCard;
pub use lookup::{BirthdayChoice, LookupSession, SearchResolver, ViewState};
pub use query::{NormalisedQuery, PatientQuery};
pub use registration::{register, Registered, RegistrationForm};

/// A patient record as returned by the backend or the reference directory.
pub type Patient = api_shared::PatientRecord;
