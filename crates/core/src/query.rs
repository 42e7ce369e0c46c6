//! The patient search form and its normalised form.

use crate::error::ValidationError;
use crate::validation::assemble_birthday;
use api_shared::SearchForm;
use imus_types::blank_to_none;

/// Raw contents of the search form, exactly as typed or selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientQuery {
    pub lastname: String,
    pub firstname: String,
    pub middlename: String,
    pub suffix: Option<String>,
    pub day: String,
    /// English month name, as offered by the month selector.
    pub month: String,
    pub year: String,
}

impl PatientQuery {
    /// Validates the birthday selectors and trims the name fields.
    pub fn normalise(&self) -> Result<NormalisedQuery, ValidationError> {
        let birthday = assemble_birthday(&self.day, &self.month, &self.year)?;
        Ok(NormalisedQuery {
            lastname: self.lastname.trim().to_owned(),
            firstname: self.firstname.trim().to_owned(),
            middlename: self.middlename.trim().to_owned(),
            suffix: blank_to_none(self.suffix.as_deref()),
            birthday,
        })
    }
}

/// A validated query: trimmed names and an ISO birthday.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalisedQuery {
    pub lastname: String,
    pub firstname: String,
    pub middlename: String,
    pub suffix: Option<String>,
    pub birthday: String,
}

impl NormalisedQuery {
    pub fn to_search_form(&self) -> SearchForm {
        SearchForm {
            lastname: self.lastname.clone(),
            firstname: self.firstname.clone(),
            middlename: self.middlename.clone(),
            suffix: self.suffix.clone().unwrap_or_default(),
            birthday: self.birthday.clone(),
        }
    }
}
