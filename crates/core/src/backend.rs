//! Hospital backend client.
//!
//! [`HospitalBackend`] is the seam between the flows in this crate and the remote HTTP API.
//! [`HttpBackend`] is the production implementation; tests substitute in-memory backends.
//!
//! The backend reports most failures as a JSON envelope with `success: false`, often with a
//! non-2xx status. Bodies are therefore decoded regardless of status and only a body that is
//! not the expected JSON becomes a [`BackendError::Decode`].

use crate::constants::{
    ADD_PATIENT_PATH, ADMIN_APPOINTMENTS_PATH, ADMIN_LOGIN_PATH, APPOINTMENTS_PATH,
    IMPORT_HISTORY_PATH, IMPORT_PATIENTS_PATH, PATIENTS_PATH, SEARCH_PATH,
};
use crate::error::{BackendError, BackendResult};
use api_shared::{
    AddPatientReq, AddPatientRes, AppointmentsRes, CreateAppointmentReq, CreateAppointmentRes,
    ImportHistoryRes, ImportPatientsRes, ListPatientsRes, LoginReq, LoginRes, PatientId,
    SearchForm, SearchRes,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// A file ready to be sent to the import endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportUpload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Operations offered by the hospital backend.
#[async_trait]
pub trait HospitalBackend: Send + Sync {
    async fn search(&self, form: &SearchForm) -> BackendResult<SearchRes>;

    async fn list_patients(&self) -> BackendResult<ListPatientsRes>;

    async fn add_patient(&self, req: &AddPatientReq) -> BackendResult<AddPatientRes>;

    async fn patient_appointments(&self, patient_id: PatientId) -> BackendResult<AppointmentsRes>;

    async fn create_appointment(
        &self,
        req: &CreateAppointmentReq,
    ) -> BackendResult<CreateAppointmentRes>;

    async fn all_appointments(&self) -> BackendResult<AppointmentsRes>;

    async fn import_patients(&self, upload: ImportUpload) -> BackendResult<ImportPatientsRes>;

    async fn import_history(&self) -> BackendResult<ImportHistoryRes>;

    async fn login(&self, req: &LoginReq) -> BackendResult<LoginRes>;
}

/// [`HospitalBackend`] over HTTP using a shared `reqwest` connection pool.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> BackendResult<T> {
        let transport = |source| BackendError::Transport {
            endpoint: endpoint.to_owned(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        tracing::debug!("{} answered HTTP {}", endpoint, status);

        serde_json::from_str(&body).map_err(|source| BackendError::Decode {
            endpoint: endpoint.to_owned(),
            status,
            source,
        })
    }
}

#[async_trait]
impl HospitalBackend for HttpBackend {
    async fn search(&self, form: &SearchForm) -> BackendResult<SearchRes> {
        let request = self.client.post(self.url(SEARCH_PATH)).form(form);
        self.send(SEARCH_PATH, request).await
    }

    async fn list_patients(&self) -> BackendResult<ListPatientsRes> {
        let request = self.client.get(self.url(PATIENTS_PATH));
        self.send(PATIENTS_PATH, request).await
    }

    async fn add_patient(&self, req: &AddPatientReq) -> BackendResult<AddPatientRes> {
        let request = self.client.post(self.url(ADD_PATIENT_PATH)).json(req);
        self.send(ADD_PATIENT_PATH, request).await
    }

    async fn patient_appointments(&self, patient_id: PatientId) -> BackendResult<AppointmentsRes> {
        let path = format!("{APPOINTMENTS_PATH}/{patient_id}");
        let request = self.client.get(self.url(&path));
        self.send(&path, request).await
    }

    async fn create_appointment(
        &self,
        req: &CreateAppointmentReq,
    ) -> BackendResult<CreateAppointmentRes> {
        let request = self.client.post(self.url(APPOINTMENTS_PATH)).json(req);
        self.send(APPOINTMENTS_PATH, request).await
    }

    async fn all_appointments(&self) -> BackendResult<AppointmentsRes> {
        let request = self.client.get(self.url(ADMIN_APPOINTMENTS_PATH));
        self.send(ADMIN_APPOINTMENTS_PATH, request).await
    }

    async fn import_patients(&self, upload: ImportUpload) -> BackendResult<ImportPatientsRes> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(upload.mime_type)
            .map_err(|source| BackendError::Transport {
                endpoint: IMPORT_PATIENTS_PATH.to_owned(),
                source,
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .client
            .post(self.url(IMPORT_PATIENTS_PATH))
            .multipart(form);
        self.send(IMPORT_PATIENTS_PATH, request).await
    }

    async fn import_history(&self) -> BackendResult<ImportHistoryRes> {
        let request = self.client.get(self.url(IMPORT_HISTORY_PATH));
        self.send(IMPORT_HISTORY_PATH, request).await
    }

    async fn login(&self, req: &LoginReq) -> BackendResult<LoginRes> {
        let request = self.client.post(self.url(ADMIN_LOGIN_PATH)).json(req);
        self.send(ADMIN_LOGIN_PATH, request).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_backend_trims_trailing_slash() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/");
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
        assert_eq!(backend.url(SEARCH_PATH), "http://127.0.0.1:5000/search");
    }
}
