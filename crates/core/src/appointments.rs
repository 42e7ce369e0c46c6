//! Appointment booking for a resolved patient.
//!
//! The client keeps the appointment type and the free-text detail as separate fields. On the
//! wire both are sent: the explicit `type` and the combined `"<type>: <detail>"` string in
//! `reason`, which is what backends without a `type` column store.

use crate::backend::HospitalBackend;
use crate::error::{ImusError, ImusResult, ValidationError};
use crate::validation::parse_iso_date;
use api_shared::{AppointmentRecord, CreateAppointmentReq, PatientId, PatientRecord};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The fixed appointment types offered by the booking form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AppointmentKind {
    #[default]
    Consultation,
    Laboratory,
    FollowUp,
    Imaging,
    Admission,
    Vaccination,
    Surgery,
    Other,
}

impl AppointmentKind {
    pub const ALL: [AppointmentKind; 8] = [
        AppointmentKind::Consultation,
        AppointmentKind::Laboratory,
        AppointmentKind::FollowUp,
        AppointmentKind::Imaging,
        AppointmentKind::Admission,
        AppointmentKind::Vaccination,
        AppointmentKind::Surgery,
        AppointmentKind::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AppointmentKind::Consultation => "Consultation",
            AppointmentKind::Laboratory => "Laboratory",
            AppointmentKind::FollowUp => "Follow-up",
            AppointmentKind::Imaging => "Imaging",
            AppointmentKind::Admission => "Admission",
            AppointmentKind::Vaccination => "Vaccination",
            AppointmentKind::Surgery => "Surgery",
            AppointmentKind::Other => "Other",
        }
    }

    /// Case-insensitive lookup by display label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AppointmentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ValidationError::UnknownAppointmentKind(s.trim().to_owned()))
    }
}

/// Combines type and detail into the stored `reason` string.
pub fn encode_reason(kind: AppointmentKind, detail: &str) -> String {
    format!("{}: {}", kind.label(), detail.trim())
}

/// Splits a stored appointment back into a type label and detail.
///
/// The type is the non-blank `explicit_type`, else the non-blank text before the first colon
/// of `reason`, else `"Consultation"`. Types the booking form offers are returned with their
/// canonical label; any other type is kept as the backend wrote it. The detail is the trimmed
/// text after the first colon, or the whole reason if it has none.
pub fn decode_reason(explicit_type: Option<&str>, reason: Option<&str>) -> (String, String) {
    let reason = reason.unwrap_or("").trim();
    let (prefix, detail) = match reason.split_once(':') {
        Some((prefix, detail)) => (Some(prefix), detail.trim()),
        None => (None, reason),
    };

    let kind = [explicit_type, prefix]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|label| !label.is_empty())
        .map(|label| match AppointmentKind::from_label(label) {
            Some(known) => known.label().to_owned(),
            None => label.to_owned(),
        })
        .unwrap_or_else(|| AppointmentKind::default().label().to_owned());

    (kind, detail.to_owned())
}

/// An appointment as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Appointment {
    pub id: u64,
    pub patient_id: PatientId,
    pub date: String,
    pub time: Option<String>,
    /// Type label; may name a type the booking form does not offer.
    pub kind: String,
    pub detail: String,
    pub status: Option<String>,
    pub doctor_name: Option<String>,
    pub patient_name: Option<String>,
    pub created_at: Option<String>,
}

impl From<AppointmentRecord> for Appointment {
    fn from(record: AppointmentRecord) -> Self {
        let (kind, detail) = decode_reason(record.kind.as_deref(), record.reason.as_deref());
        Self {
            id: record.id,
            patient_id: record.patient_id,
            date: record.appointment_date,
            time: record.appointment_time,
            kind,
            detail,
            status: record.status,
            doctor_name: record.doctor_name,
            patient_name: record.patient_name,
            created_at: record.created_at,
        }
    }
}

impl Appointment {
    /// The booking-form type, when the label names one.
    pub fn known_kind(&self) -> Option<AppointmentKind> {
        AppointmentKind::from_label(&self.kind)
    }

    /// Dated strictly after `today`. An unreadable date is never upcoming.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date
            .get(..10)
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .is_some_and(|date| date > today)
    }
}

/// A validated booking request, not yet tied to a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAppointment {
    date: NaiveDate,
    kind: AppointmentKind,
    detail: String,
}

impl NewAppointment {
    /// # Errors
    ///
    /// [`ValidationError::MissingField`] for a blank date and
    /// [`ValidationError::InvalidIsoDate`] for anything other than `YYYY-MM-DD`.
    pub fn new(date: &str, kind: AppointmentKind, detail: &str) -> Result<Self, ValidationError> {
        if date.trim().is_empty() {
            return Err(ValidationError::MissingField("appointment date"));
        }
        Ok(Self {
            date: parse_iso_date(date)?,
            kind,
            detail: detail.trim().to_owned(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> AppointmentKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn to_request(&self, patient_id: PatientId) -> CreateAppointmentReq {
        CreateAppointmentReq {
            patient_id,
            appointment_date: self.date.format("%Y-%m-%d").to_string(),
            kind: self.kind.label().to_owned(),
            reason: encode_reason(self.kind, &self.detail),
        }
    }
}

/// The appointment view for one patient.
pub struct AppointmentBook {
    backend: Arc<dyn HospitalBackend>,
    patient: PatientRecord,
    appointments: Vec<Appointment>,
}

impl AppointmentBook {
    /// Takes ownership of the resolved patient and loads their appointments.
    pub async fn open(backend: Arc<dyn HospitalBackend>, patient: PatientRecord) -> ImusResult<Self> {
        let mut book = Self {
            backend,
            patient,
            appointments: Vec::new(),
        };
        book.reload().await?;
        Ok(book)
    }

    pub fn patient(&self) -> &PatientRecord {
        &self.patient
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub async fn reload(&mut self) -> ImusResult<()> {
        let res = self.backend.patient_appointments(self.patient.id).await?;
        if !res.success {
            return Err(ImusError::Rejected(
                res.message
                    .unwrap_or_else(|| "Failed to load appointments".to_owned()),
            ));
        }
        self.appointments = res.appointments.into_iter().map(Appointment::from).collect();
        tracing::debug!(
            "loaded {} appointments for patient {}",
            self.appointments.len(),
            self.patient.id
        );
        Ok(())
    }

    /// Posts a new appointment and reloads the list.
    ///
    /// Returns the new appointment id when the backend reports one.
    pub async fn book(&mut self, appointment: &NewAppointment) -> ImusResult<Option<u64>> {
        let req = appointment.to_request(self.patient.id);
        let res = self.backend.create_appointment(&req).await?;
        if !res.success {
            return Err(ImusError::Rejected(
                res.error
                    .or(res.message)
                    .unwrap_or_else(|| "Failed to add appointment".to_owned()),
            ));
        }
        tracing::info!(
            "booked {} appointment for patient {} on {}",
            appointment.kind(),
            self.patient.id,
            req.appointment_date
        );
        self.reload().await?;
        Ok(res.appointment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    #[test]
    fn kinds_parse_from_labels() {
        assert_eq!("follow-up".parse::<AppointmentKind>(), Ok(AppointmentKind::FollowUp));
        assert_eq!(" SURGERY ".parse::<AppointmentKind>(), Ok(AppointmentKind::Surgery));
        assert!(matches!(
            "Dental".parse::<AppointmentKind>(),
            Err(ValidationError::UnknownAppointmentKind(_))
        ));
        for kind in AppointmentKind::ALL {
            assert_eq!(AppointmentKind::from_label(kind.label()), Some(kind));
        }
    }

    #[test]
    fn reason_round_trips_without_colon() {
        let stored = encode_reason(AppointmentKind::Consultation, "checkup");
        assert_eq!(stored, "Consultation: checkup");
        assert_eq!(
            decode_reason(None, Some(&stored)),
            ("Consultation".to_owned(), "checkup".to_owned())
        );
    }

    #[test]
    fn decode_splits_on_first_colon_only() {
        assert_eq!(
            decode_reason(None, Some("Laboratory: fasting: CBC")),
            ("Laboratory".to_owned(), "fasting: CBC".to_owned())
        );
    }

    #[test]
    fn decode_prefers_explicit_type() {
        assert_eq!(
            decode_reason(Some("Imaging"), Some("chest x-ray")),
            ("Imaging".to_owned(), "chest x-ray".to_owned())
        );
        assert_eq!(
            decode_reason(Some("follow-up"), Some("Consultation: x-ray")),
            ("Follow-up".to_owned(), "x-ray".to_owned())
        );
    }

    #[test]
    fn decode_keeps_backend_defined_types() {
        assert_eq!(
            decode_reason(Some("Dental"), Some("Dental: cleaning")),
            ("Dental".to_owned(), "cleaning".to_owned())
        );
        assert_eq!(
            decode_reason(None, Some("Physical therapy: knee")),
            ("Physical therapy".to_owned(), "knee".to_owned())
        );
        assert_eq!(
            decode_reason(Some("  "), Some("Dental: cleaning")),
            ("Dental".to_owned(), "cleaning".to_owned())
        );
    }

    #[test]
    fn decode_defaults_to_consultation_only_without_a_type() {
        assert_eq!(
            decode_reason(None, Some("annual checkup")),
            ("Consultation".to_owned(), "annual checkup".to_owned())
        );
        assert_eq!(
            decode_reason(None, None),
            ("Consultation".to_owned(), String::new())
        );
        assert_eq!(
            decode_reason(Some(""), Some(": molars")),
            ("Consultation".to_owned(), "molars".to_owned())
        );
    }

    #[test]
    fn shown_appointment_keeps_custom_type() {
        let record: AppointmentRecord = serde_json::from_str(
            r#"{"id": 4, "patient_id": 1, "appointment_date": "2025-03-01",
                "type": "Dental", "reason": "Dental: cleaning"}"#,
        )
        .unwrap();
        let shown = Appointment::from(record);
        assert_eq!(shown.kind, "Dental");
        assert_eq!(shown.detail, "cleaning");
        assert_eq!(shown.known_kind(), None);
    }

    #[test]
    fn new_appointment_requires_iso_date() {
        assert_eq!(
            NewAppointment::new(" ", AppointmentKind::Other, ""),
            Err(ValidationError::MissingField("appointment date"))
        );
        assert!(matches!(
            NewAppointment::new("15/02/2025", AppointmentKind::Other, ""),
            Err(ValidationError::InvalidIsoDate(_))
        ));
    }

    #[test]
    fn request_carries_type_and_combined_reason() {
        let appointment =
            NewAppointment::new("2025-02-15", AppointmentKind::FollowUp, " blood pressure ").unwrap();
        let req = appointment.to_request(PatientId::new(1));
        assert_eq!(req.appointment_date, "2025-02-15");
        assert_eq!(req.kind, "Follow-up");
        assert_eq!(req.reason, "Follow-up: blood pressure");
    }

    fn maria() -> PatientRecord {
        PatientRecord::identity(1, "Santos", "Maria", Some("Cruz"), None, "1985-03-15")
    }

    #[tokio::test]
    async fn booking_reloads_the_list() {
        let backend = Arc::new(MockBackend::default());
        let mut book = AppointmentBook::open(backend.clone(), maria()).await.unwrap();
        assert!(book.appointments().is_empty());

        let appointment =
            NewAppointment::new("2025-02-15", AppointmentKind::Laboratory, "CBC").unwrap();
        let id = book.book(&appointment).await.unwrap();

        assert_eq!(id, Some(1));
        assert_eq!(book.appointments().len(), 1);
        let shown = &book.appointments()[0];
        assert_eq!(shown.known_kind(), Some(AppointmentKind::Laboratory));
        assert_eq!(shown.detail, "CBC");
        assert_eq!(shown.date, "2025-02-15");
    }

    #[tokio::test]
    async fn rejected_booking_surfaces_server_message() {
        let backend = Arc::new(MockBackend {
            reject_appointments: Some("Patient not found".into()),
            ..Default::default()
        });
        let mut book = AppointmentBook::open(backend, maria()).await.unwrap();
        let appointment = NewAppointment::new("2025-02-15", AppointmentKind::Other, "").unwrap();

        let err = book.book(&appointment).await.unwrap_err();
        assert_eq!(err.user_message(), "Patient not found");
        assert!(book.appointments().is_empty());
    }
}
