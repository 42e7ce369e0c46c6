//! New patient registration.

use crate::backend::HospitalBackend;
use crate::error::{ImusError, ImusResult, ValidationError};
use crate::validation::{parse_iso_date, required};
use api_shared::{AddPatientReq, PatientId};
use imus_types::blank_to_none;

/// Contents of the add-patient form. `birthday` is ISO `YYYY-MM-DD`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub lastname: String,
    pub firstname: String,
    pub middlename: Option<String>,
    pub suffix: Option<String>,
    pub birthday: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub blood_type: Option<String>,
}

impl RegistrationForm {
    /// Checks the required fields and builds the request body.
    ///
    /// Optional fields that are blank are left out of the payload.
    pub fn validate(&self) -> Result<AddPatientReq, ValidationError> {
        let lastname = required("lastname", &self.lastname)?;
        let firstname = required("firstname", &self.firstname)?;
        let birthday = required("birthday", &self.birthday)?;
        let birthday = parse_iso_date(birthday.as_str())?;
        let address = required("address", &self.address)?;

        let optional = |value: &Option<String>| blank_to_none(value.as_deref());

        Ok(AddPatientReq {
            lastname: lastname.into_string(),
            firstname: firstname.into_string(),
            middlename: optional(&self.middlename),
            suffix: optional(&self.suffix),
            birthday: birthday.format("%Y-%m-%d").to_string(),
            address: address.into_string(),
            phone: optional(&self.phone),
            email: optional(&self.email),
            emergency_contact_name: optional(&self.emergency_contact_name),
            emergency_contact_phone: optional(&self.emergency_contact_phone),
            medical_history: optional(&self.medical_history),
            allergies: optional(&self.allergies),
            blood_type: optional(&self.blood_type),
        })
    }
}

/// A successful registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registered {
    pub message: String,
    pub patient_id: Option<PatientId>,
}

/// Validates the form locally, then posts it to `/add_patient`.
///
/// # Errors
///
/// - [`ImusError::Validation`] for a missing required field or a malformed birthday
/// - [`ImusError::Rejected`] with the server message when the backend refuses
/// - [`ImusError::Backend`] on transport failure
pub async fn register(backend: &dyn HospitalBackend, form: &RegistrationForm) -> ImusResult<Registered> {
    let req = form.validate()?;
    let res = backend.add_patient(&req).await?;
    if !res.success {
        return Err(ImusError::Rejected(
            res.error
                .or(res.message)
                .unwrap_or_else(|| "Failed to add patient".to_owned()),
        ));
    }

    tracing::info!(
        "registered patient {} {} (id {:?})",
        req.firstname,
        req.lastname,
        res.patient_id.map(PatientId::get)
    );
    Ok(Registered {
        message: res
            .message
            .unwrap_or_else(|| "Patient added successfully".to_owned()),
        patient_id: res.patient_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    fn form() -> RegistrationForm {
        RegistrationForm {
            lastname: "Dizon".into(),
            firstname: "Lito".into(),
            middlename: Some("  ".into()),
            birthday: "1970-01-01".into(),
            address: " Imus, Cavite ".into(),
            phone: Some("09170000000".into()),
            ..Default::default()
        }
    }

    #[test]
    fn validate_trims_and_drops_blank_optionals() {
        let req = form().validate().unwrap();
        assert_eq!(req.address, "Imus, Cavite");
        assert_eq!(req.middlename, None);
        assert_eq!(req.phone.as_deref(), Some("09170000000"));
    }

    #[test]
    fn validate_names_the_missing_field() {
        let mut f = form();
        f.address = String::new();
        assert_eq!(f.validate(), Err(ValidationError::MissingField("address")));

        let mut f = form();
        f.firstname = " ".into();
        assert_eq!(f.validate(), Err(ValidationError::MissingField("firstname")));
    }

    #[test]
    fn validate_rejects_non_iso_birthday() {
        let mut f = form();
        f.birthday = "01/01/1970".into();
        assert!(matches!(f.validate(), Err(ValidationError::InvalidIsoDate(_))));
    }

    #[tokio::test]
    async fn register_posts_validated_payload() {
        let backend = MockBackend::default();
        let registered = register(&backend, &form()).await.unwrap();

        assert_eq!(registered.patient_id, Some(PatientId::new(101)));
        let added = backend.added.lock().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].lastname, "Dizon");
    }

    #[tokio::test]
    async fn refusal_surfaces_the_backend_error() {
        let backend = MockBackend {
            reject_patients: Some("UNIQUE constraint failed: patients.email".into()),
            ..Default::default()
        };
        let err = register(&backend, &form()).await.unwrap_err();
        assert_eq!(err.user_message(), "UNIQUE constraint failed: patients.email");
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let backend = MockBackend::default();
        let mut f = form();
        f.lastname.clear();

        assert!(matches!(
            register(&backend, &f).await,
            Err(ImusError::Validation(ValidationError::MissingField("lastname")))
        ));
        assert!(backend.added.lock().unwrap().is_empty());
    }
}
