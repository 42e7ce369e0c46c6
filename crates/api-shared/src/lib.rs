//! # API Shared
//!
//! Wire types for the hospital backend HTTP contract.
//!
//! Contains:
//! - Request payloads (`SearchForm`, `AddPatientReq`, `CreateAppointmentReq`, `LoginReq`)
//! - Response envelopes (`SearchRes`, `ListPatientsRes`, `AppointmentsRes`, ...)
//! - Record shapes returned by the backend (`PatientRecord`, `AppointmentRecord`, `ImportRecord`)
//!
//! Used by `imus-core` for the backend client and by the stub backend in its integration tests.

pub mod wire;

pub use imus_types::PatientId;
pub use wire::*;
