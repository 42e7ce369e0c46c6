//! Runs the HTTP backend client against a stub hospital backend served by axum.

use api_shared::{
    AppointmentRecord, CreateAppointmentReq, LoginReq, PatientId, PatientRecord, SearchForm,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use imus_core::{
    AppointmentBook, AppointmentKind, BackendError, HospitalBackend, HttpBackend, ImportUpload,
    NewAppointment, PatientQuery, ReferenceDirectory, SearchResolver, ViewState,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct StubState {
    appointments: Arc<Mutex<Vec<CreateAppointmentReq>>>,
}

async fn search(Form(form): Form<SearchForm>) -> axum::response::Response {
    match form.lastname.as_str() {
        "Broken" => (StatusCode::INTERNAL_SERVER_ERROR, "<html>Internal Server Error</html>")
            .into_response(),
        "Santos" if form.birthday == "1985-03-15" => {
            let patient =
                PatientRecord::identity(50, "Santos", "Maria", Some("Cruz"), None, "1985-03-15");
            Json(json!({
                "success": true,
                "message": "Found 1 patient(s)",
                "data": { "patients": [patient] }
            }))
            .into_response()
        }
        _ => Json(json!({
            "success": true,
            "message": "No patients found",
            "data": { "patients": [] }
        }))
        .into_response(),
    }
}

async fn list_appointments(
    State(state): State<StubState>,
    Path(patient_id): Path<u64>,
) -> Json<Value> {
    let stored = state.appointments.lock().unwrap().clone();
    let appointments: Vec<AppointmentRecord> = stored
        .into_iter()
        .enumerate()
        .filter(|(_, req)| req.patient_id == PatientId::new(patient_id))
        .map(|(index, req)| AppointmentRecord {
            id: index as u64 + 1,
            patient_id: req.patient_id,
            appointment_date: req.appointment_date,
            appointment_time: None,
            kind: None,
            reason: Some(req.reason),
            status: Some("scheduled".into()),
            doctor_name: None,
            notes: None,
            patient_name: None,
            created_at: None,
        })
        .collect();
    Json(json!({ "success": true, "appointments": appointments }))
}

async fn create_appointment(
    State(state): State<StubState>,
    Json(req): Json<CreateAppointmentReq>,
) -> Json<Value> {
    let mut appointments = state.appointments.lock().unwrap();
    appointments.push(req);
    Json(json!({
        "success": true,
        "message": "Appointment created",
        "appointment_id": appointments.len()
    }))
}

async fn login(Json(req): Json<LoginReq>) -> axum::response::Response {
    if req.username == "admin" && req.password == "admin123" {
        Json(json!({ "success": true, "message": "Login successful" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn import_patients(mut multipart: Multipart) -> Json<Value> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let text = field.text().await.unwrap_or_default();
        let rows = text.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
        return Json(json!({
            "success": true,
            "message": format!("Imported {rows} patients from {file_name} ({content_type})"),
            "imported_count": rows,
            "total_errors": 0,
            "errors": []
        }));
    }
    Json(json!({ "success": false, "error": "No file uploaded" }))
}

async fn import_history() -> Json<Value> {
    Json(json!({
        "success": true,
        "imports": [{
            "id": 1,
            "filename": "patients.csv",
            "import_date": "2025-06-25T09:20:38",
            "records_imported": 2,
            "import_type": "csv",
            "status": "completed"
        }]
    }))
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/search", post(search))
        .route("/appointments", post(create_appointment))
        .route("/appointments/:patient_id", get(list_appointments))
        .route("/admin/login", post(login))
        .route("/import_patients", post(import_patients))
        .route("/import_history", get(import_history))
        .with_state(StubState::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn query(lastname: &str) -> PatientQuery {
    PatientQuery {
        lastname: lastname.into(),
        firstname: "Maria".into(),
        middlename: "Cruz".into(),
        suffix: None,
        day: "15".into(),
        month: "March".into(),
        year: "1985".into(),
    }
}

#[tokio::test]
async fn search_uses_server_candidate() {
    let backend = HttpBackend::new(&spawn_stub().await);
    let resolver = SearchResolver::new(Arc::new(backend), Arc::new(ReferenceDirectory::builtin()));

    let state = resolver.resolve(&query("Santos").normalise().unwrap()).await;
    match state {
        ViewState::Found(patient) => assert_eq!(patient.id, PatientId::new(50)),
        other => panic!("expected a server match, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_search_response_is_a_decode_error() {
    let backend = HttpBackend::new(&spawn_stub().await);
    let form = query("Broken").normalise().unwrap().to_search_form();

    let err = backend.search(&form).await.unwrap_err();
    assert!(matches!(err, BackendError::Decode { status: 500, .. }));
}

#[tokio::test]
async fn broken_search_falls_back_to_directory() {
    let backend = HttpBackend::new(&spawn_stub().await);
    let directory = ReferenceDirectory::new(vec![PatientRecord::identity(
        9,
        "Broken",
        "Maria",
        Some("Cruz"),
        None,
        "1985-03-15",
    )]);
    let resolver = SearchResolver::new(Arc::new(backend), Arc::new(directory));

    let state = resolver.resolve(&query("Broken").normalise().unwrap()).await;
    assert!(matches!(state, ViewState::Found(p) if p.id == PatientId::new(9)));
}

#[tokio::test]
async fn unreachable_backend_falls_back_to_directory() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{addr}"));
    let err = backend
        .search(&query("Santos").normalise().unwrap().to_search_form())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Transport { .. }));

    let resolver = SearchResolver::new(Arc::new(backend), Arc::new(ReferenceDirectory::builtin()));
    let state = resolver.resolve(&query("Santos").normalise().unwrap()).await;
    assert!(matches!(state, ViewState::Found(p) if p.id == PatientId::new(1)));
}

#[tokio::test]
async fn appointments_are_posted_and_reloaded() {
    let backend: Arc<dyn HospitalBackend> = Arc::new(HttpBackend::new(&spawn_stub().await));
    let patient = PatientRecord::identity(1, "Santos", "Maria", Some("Cruz"), None, "1985-03-15");

    let mut book = AppointmentBook::open(backend, patient).await.unwrap();
    assert!(book.appointments().is_empty());

    let new = NewAppointment::new("2025-02-15", AppointmentKind::Consultation, "checkup").unwrap();
    assert_eq!(book.book(&new).await.unwrap(), Some(1));

    let shown = &book.appointments()[0];
    assert_eq!(shown.known_kind(), Some(AppointmentKind::Consultation));
    assert_eq!(shown.detail, "checkup");
}

#[tokio::test]
async fn login_failure_body_is_decoded_despite_status() {
    let backend = HttpBackend::new(&spawn_stub().await);

    let ok = backend
        .login(&LoginReq {
            username: "admin".into(),
            password: "admin123".into(),
        })
        .await
        .unwrap();
    assert!(ok.success);

    let refused = backend
        .login(&LoginReq {
            username: "admin".into(),
            password: "nope".into(),
        })
        .await
        .unwrap();
    assert!(!refused.success);
    assert_eq!(refused.message.as_deref(), Some("Invalid credentials"));
}

#[tokio::test]
async fn import_sends_multipart_file_field() {
    let backend = HttpBackend::new(&spawn_stub().await);

    let res = backend
        .import_patients(ImportUpload {
            file_name: "patients.csv".into(),
            mime_type: "text/csv",
            bytes: b"lastname,firstname\nDizon,Lito\nCruz,Ana\n".to_vec(),
        })
        .await
        .unwrap();

    assert!(res.success);
    assert_eq!(res.imported_count, 2);
    assert_eq!(
        res.message.as_deref(),
        Some("Imported 2 patients from patients.csv (text/csv)")
    );

    let history = backend.import_history().await.unwrap();
    assert_eq!(history.imports[0].records_imported, 2);
}
