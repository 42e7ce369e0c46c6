//! Read-only reference directory used when the backend cannot answer a search.
//!
//! One directory is built at startup (the built-in seed records, or a YAML override) and
//! shared behind an `Arc` by every consumer. It is never mutated afterwards.
//!
//! ## YAML override
//!
//! ```yaml
//! patients:
//!   - id: 1
//!     lastname: Santos
//!     firstname: Maria
//!     middlename: Cruz
//!     birthday: "1985-03-15"
//!     address: 123 Rizal St., Imus, Cavite
//! ```

use crate::error::{ImusError, ImusResult};
use crate::query::NormalisedQuery;
use api_shared::{PatientId, PatientRecord};
use serde::Deserialize;
use std::path::Path;

/// Fixed list of patient records consulted by the search fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceDirectory {
    patients: Vec<PatientRecord>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryFile {
    patients: Vec<PatientRecord>,
}

impl ReferenceDirectory {
    pub fn new(patients: Vec<PatientRecord>) -> Self {
        Self { patients }
    }

    /// The hospital's seed records.
    pub fn builtin() -> Self {
        Self::new(SEED.iter().map(SeedRow::to_record).collect())
    }

    /// Parse a directory from YAML text.
    ///
    /// Uses `serde_path_to_error` so a schema mismatch names the failing field
    /// (e.g. `patients[2].birthday`).
    pub fn parse_yaml(yaml_text: &str) -> ImusResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        match serde_path_to_error::deserialize::<_, DirectoryFile>(deserializer) {
            Ok(file) => Ok(Self::new(file.patients)),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                Err(ImusError::Directory(format!("at {path}: {source}")))
            }
        }
    }

    pub fn load(path: &Path) -> ImusResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ImusError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::parse_yaml(&text)?;
        tracing::info!(
            "loaded {} reference patients from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn patients(&self) -> &[PatientRecord] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn get(&self, id: PatientId) -> Option<&PatientRecord> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Records equal to the query on lastname, firstname, middlename and birthday.
    ///
    /// Names compare case-insensitively; a blank query field must meet a blank record field.
    /// Suffix is not compared.
    pub fn exact_matches(&self, query: &NormalisedQuery) -> Vec<&PatientRecord> {
        self.patients
            .iter()
            .filter(|p| {
                same_text(&p.lastname, &query.lastname)
                    && same_text(&p.firstname, &query.firstname)
                    && same_text(p.middlename.as_deref().unwrap_or(""), &query.middlename)
                    && p.birthday.trim() == query.birthday
            })
            .collect()
    }

    /// Records whose names agree with every name field the user filled in.
    ///
    /// Blank firstname/middlename act as wildcards. Returns nothing when the lastname is
    /// blank so the fallback never enumerates the whole directory.
    pub fn name_matches(&self, query: &NormalisedQuery) -> Vec<&PatientRecord> {
        if query.lastname.is_empty() {
            return Vec::new();
        }
        self.patients
            .iter()
            .filter(|p| name_agrees(p, query))
            .collect()
    }
}

impl Default for ReferenceDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub(crate) fn name_agrees(record: &PatientRecord, query: &NormalisedQuery) -> bool {
    let wildcard_or_same = |wanted: &str, actual: &str| wanted.is_empty() || same_text(actual, wanted);

    same_text(&record.lastname, &query.lastname)
        && wildcard_or_same(&query.firstname, &record.firstname)
        && wildcard_or_same(&query.middlename, record.middlename.as_deref().unwrap_or(""))
}

struct SeedRow {
    id: u64,
    lastname: &'static str,
    firstname: &'static str,
    middlename: &'static str,
    suffix: Option<&'static str>,
    birthday: &'static str,
    address: &'static str,
    phone: &'static str,
    email: &'static str,
    emergency_contact_name: &'static str,
    emergency_contact_phone: &'static str,
    medical_history: &'static str,
    allergies: &'static str,
    blood_type: &'static str,
}

impl SeedRow {
    fn to_record(&self) -> PatientRecord {
        let mut record = PatientRecord::identity(
            self.id,
            self.lastname,
            self.firstname,
            Some(self.middlename),
            self.suffix,
            self.birthday,
        );
        record.address = Some(self.address.to_owned());
        record.phone = Some(self.phone.to_owned());
        record.email = Some(self.email.to_owned());
        record.emergency_contact_name = Some(self.emergency_contact_name.to_owned());
        record.emergency_contact_phone = Some(self.emergency_contact_phone.to_owned());
        record.medical_history = Some(self.medical_history.to_owned());
        record.allergies = Some(self.allergies.to_owned());
        record.blood_type = Some(self.blood_type.to_owned());
        record.status = Some("active".to_owned());
        record
    }
}

const SEED: [SeedRow; 11] = [
    SeedRow {
        id: 1,
        lastname: "Santos",
        firstname: "Maria",
        middlename: "Cruz",
        suffix: None,
        birthday: "1985-03-15",
        address: "123 Rizal St., Imus, Cavite",
        phone: "09171234567",
        email: "maria.santos@email.com",
        emergency_contact_name: "Juan Santos",
        emergency_contact_phone: "09181234567",
        medical_history: "Hypertension",
        allergies: "None",
        blood_type: "O+",
    },
    SeedRow {
        id: 2,
        lastname: "Santos",
        firstname: "Shayne",
        middlename: "Cruz",
        suffix: None,
        birthday: "1985-05-15",
        address: "456 Mabini St., Imus, Cavite",
        phone: "09172345678",
        email: "shayne.santos@email.com",
        emergency_contact_name: "Maria Santos",
        emergency_contact_phone: "09182345678",
        medical_history: "Diabetes Type 2",
        allergies: "Penicillin",
        blood_type: "A+",
    },
    SeedRow {
        id: 3,
        lastname: "Garcia",
        firstname: "Juan",
        middlename: "Dela Cruz",
        suffix: Some("Jr."),
        birthday: "1990-07-22",
        address: "789 Bonifacio Ave., Bacoor, Cavite",
        phone: "09173456789",
        email: "juan.garcia@email.com",
        emergency_contact_name: "Ana Garcia",
        emergency_contact_phone: "09183456789",
        medical_history: "None",
        allergies: "Shellfish",
        blood_type: "B+",
    },
    SeedRow {
        id: 4,
        lastname: "Reyes",
        firstname: "Ana",
        middlename: "Bautista",
        suffix: None,
        birthday: "1978-11-08",
        address: "321 Aguinaldo Hwy., Dasmariñas, Cavite",
        phone: "09174567890",
        email: "ana.reyes@email.com",
        emergency_contact_name: "Pedro Reyes",
        emergency_contact_phone: "09184567890",
        medical_history: "Asthma",
        allergies: "Dust",
        blood_type: "AB+",
    },
    SeedRow {
        id: 5,
        lastname: "Gonzales",
        firstname: "Pedro",
        middlename: "Martinez",
        suffix: Some("Sr."),
        birthday: "1965-01-30",
        address: "654 P. Burgos St., Imus, Cavite",
        phone: "09175678901",
        email: "pedro.gonzales@email.com",
        emergency_contact_name: "Carmen Gonzales",
        emergency_contact_phone: "09185678901",
        medical_history: "Heart Disease",
        allergies: "None",
        blood_type: "O-",
    },
    SeedRow {
        id: 6,
        lastname: "Lopez",
        firstname: "Carmen",
        middlename: "Villanueva",
        suffix: None,
        birthday: "1992-09-12",
        address: "987 Gen. Trias Dr., Gen. Trias, Cavite",
        phone: "09176789012",
        email: "carmen.lopez@email.com",
        emergency_contact_name: "Roberto Lopez",
        emergency_contact_phone: "09186789012",
        medical_history: "None",
        allergies: "None",
        blood_type: "A-",
    },
    SeedRow {
        id: 7,
        lastname: "Mendoza",
        firstname: "Roberto",
        middlename: "Fernandez",
        suffix: Some("III"),
        birthday: "1988-05-18",
        address: "159 Molino Blvd., Bacoor, Cavite",
        phone: "09177890123",
        email: "roberto.mendoza@email.com",
        emergency_contact_name: "Luz Mendoza",
        emergency_contact_phone: "09187890123",
        medical_history: "Migraine",
        allergies: "Aspirin",
        blood_type: "B-",
    },
    SeedRow {
        id: 8,
        lastname: "Torres",
        firstname: "Luz",
        middlename: "Aquino",
        suffix: None,
        birthday: "1975-12-03",
        address: "753 Salitran Rd., Dasmariñas, Cavite",
        phone: "09178901234",
        email: "luz.torres@email.com",
        emergency_contact_name: "Miguel Torres",
        emergency_contact_phone: "09188901234",
        medical_history: "Arthritis",
        allergies: "None",
        blood_type: "AB-",
    },
    SeedRow {
        id: 9,
        lastname: "Flores",
        firstname: "Miguel",
        middlename: "Ramos",
        suffix: Some("Jr."),
        birthday: "1983-08-25",
        address: "852 Palico Rd., Imus, Cavite",
        phone: "09179012345",
        email: "miguel.flores@email.com",
        emergency_contact_name: "Rosa Flores",
        emergency_contact_phone: "09189012345",
        medical_history: "None",
        allergies: "Latex",
        blood_type: "O+",
    },
    SeedRow {
        id: 10,
        lastname: "Morales",
        firstname: "Rosa",
        middlename: "Castillo",
        suffix: None,
        birthday: "1995-04-07",
        address: "951 Anabu Rd., Imus, Cavite",
        phone: "09170123456",
        email: "rosa.morales@email.com",
        emergency_contact_name: "Carlos Morales",
        emergency_contact_phone: "09180123456",
        medical_history: "None",
        allergies: "None",
        blood_type: "A+",
    },
    SeedRow {
        id: 11,
        lastname: "Rivera",
        firstname: "Carlos",
        middlename: "Jimenez",
        suffix: None,
        birthday: "1970-10-14",
        address: "357 Tanzang Luma, Imus, Cavite",
        phone: "09171234560",
        email: "carlos.rivera@email.com",
        emergency_contact_name: "Ana Rivera",
        emergency_contact_phone: "09181234560",
        medical_history: "High Blood Pressure",
        allergies: "Iodine",
        blood_type: "B+",
    },
];
