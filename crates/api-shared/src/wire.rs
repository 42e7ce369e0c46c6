//! Request and response shapes exchanged with the hospital backend.
//!
//! The backend answers with loose JSON envelopes (`{success, message, ...}`) whose payload key
//! differs per endpoint. Optional fields are tolerated as absent or `null`, and unknown keys are
//! ignored so newer backends stay readable.

use imus_types::PatientId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Records
// ============================================================================

/// A patient record as stored by the backend.
///
/// The admin view carries the extended contact and medical fields; the search endpoint may
/// omit them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub lastname: String,
    pub firstname: String,
    #[serde(default)]
    pub middlename: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl PatientRecord {
    /// Builds a record carrying only the identity fields.
    pub fn identity(
        id: u64,
        lastname: &str,
        firstname: &str,
        middlename: Option<&str>,
        suffix: Option<&str>,
        birthday: &str,
    ) -> Self {
        Self {
            id: PatientId::new(id),
            lastname: lastname.to_owned(),
            firstname: firstname.to_owned(),
            middlename: middlename.map(str::to_owned),
            suffix: suffix.map(str::to_owned),
            birthday: birthday.to_owned(),
            address: None,
            phone: None,
            email: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            medical_history: None,
            allergies: None,
            blood_type: None,
            created_at: None,
            updated_at: None,
            status: None,
        }
    }

    /// "Firstname Middlename Lastname Suffix", skipping blank parts.
    pub fn full_name(&self) -> String {
        [
            Some(self.firstname.as_str()),
            self.middlename.as_deref(),
            Some(self.lastname.as_str()),
            self.suffix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// An appointment as stored by the backend.
///
/// `reason` holds the combined `"<type>: <reason>"` string; `type` is only present on
/// backends that keep it as its own column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: u64,
    pub patient_id: PatientId,
    pub appointment_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Only filled in by the admin listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One entry of the bulk-import history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: u64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub import_date: String,
    #[serde(default)]
    pub records_imported: u64,
    #[serde(default)]
    pub import_type: String,
    #[serde(default)]
    pub status: String,
}

// ============================================================================
// Requests
// ============================================================================

/// Form-encoded body of `POST /search`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    pub lastname: String,
    pub firstname: String,
    pub middlename: String,
    pub suffix: String,
    pub birthday: String,
}

/// JSON body of `POST /add_patient`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPatientReq {
    pub lastname: String,
    pub firstname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middlename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub birthday: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
}

/// JSON body of `POST /appointments`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAppointmentReq {
    pub patient_id: PatientId,
    pub appointment_date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
}

/// JSON body of `POST /admin/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<SearchData>,
}

impl SearchRes {
    /// Candidates carried by a successful response; empty otherwise.
    pub fn patients(&self) -> &[PatientRecord] {
        match (&self.data, self.success) {
            (Some(data), true) => &data.patients,
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub patients: Vec<PatientRecord>,
}

/// `GET /patients`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPatientsRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Vec<PatientRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// `GET /appointments/:patient_id` and `GET /admin/appointments`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentsRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub appointments: Vec<AppointmentRecord>,
}

/// `GET /import_history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportHistoryRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub imports: Vec<ImportRecord>,
}

/// `POST /add_patient`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPatientRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Failure detail; some backends use this instead of `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<PatientId>,
}

/// `POST /appointments`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAppointmentRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Failure detail; some backends use this instead of `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<u64>,
}

/// `POST /import_patients`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPatientsRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Failure detail; some backends use this instead of `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub imported_count: u64,
    #[serde(default)]
    pub total_errors: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `POST /admin/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRes {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
