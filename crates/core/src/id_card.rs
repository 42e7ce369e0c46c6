//! Text rendering of a patient's ID card.

use api_shared::PatientRecord;
use std::fmt;

const TITLE: &str = "OSPITAL NG IMUS - PATIENT ID CARD";

/// Displays the identity fields of a patient, one per line.
pub struct IdCard<'a>(pub &'a PatientRecord);

fn or_na(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("N/A")
}

impl fmt::Display for IdCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patient = self.0;
        let id = patient.id.to_string();
        let rows = [
            ("Patient ID", Some(id.as_str())),
            ("Last Name", Some(patient.lastname.as_str())),
            ("First Name", Some(patient.firstname.as_str())),
            ("Middle Name", patient.middlename.as_deref()),
            ("Suffix", patient.suffix.as_deref()),
            ("Birthday", Some(patient.birthday.as_str())),
            ("Address", patient.address.as_deref()),
        ];

        writeln!(f, "{TITLE}")?;
        writeln!(f, "{}", "=".repeat(TITLE.len()))?;
        for (label, value) in rows {
            writeln!(f, "{:<13}{}", format!("{label}:"), or_na(value))?;
        }
        Ok(())
    }
}
