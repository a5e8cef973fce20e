use std::sync::Arc;

use dental_appointments::{
    client::ClinicClient,
    models::{AppState, AppointmentRequest, PatientRequest},
    routes,
    status::AppointmentStatus,
    store::MemoryStore,
};

/// Serves the router on an ephemeral port and returns its base URL.
async fn spawn_server(store: Arc<MemoryStore>) -> String {
    let app = routes::router(AppState {
        store,
        practitioners: Arc::new(vec!["Carlos Mendoza".to_string(), "Juan Pérez".to_string()]),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn ana() -> PatientRequest {
    PatientRequest {
        full_name: Some("Ana Ruiz".into()),
        document_number: Some("123".into()),
        phone: Some("555".into()),
        email: Some("a@b.com".into()),
        ..Default::default()
    }
}

fn visit(patient_id: i64) -> AppointmentRequest {
    AppointmentRequest {
        patient_id: Some(patient_id),
        date: Some("2024-06-01".into()),
        time: Some("09:00".into()),
        practitioner: Some("Carlos Mendoza".into()),
        status: Some("pendiente".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn full_lifecycle_through_the_client() {
    let store = Arc::new(MemoryStore::new());
    let client = ClinicClient::new(spawn_server(store).await).unwrap();

    let created = client.create_patient(&ana()).await;
    assert!(created.success, "{created:?}");
    let patient_id = created.id.unwrap();
    assert_eq!(client.patients().await.unwrap().len(), 1);

    let booked = client.create_appointment(&visit(patient_id)).await;
    assert!(booked.success, "{booked:?}");
    let appointment_id = booked.id.unwrap();

    let rotated = client.rotate_status(appointment_id).await;
    assert_eq!(rotated.new_status, Some(AppointmentStatus::Confirmed));
    let rotated = client.rotate_status(appointment_id).await;
    assert_eq!(rotated.new_status, Some(AppointmentStatus::Cancelled));

    let refused = client.delete_patient(patient_id).await;
    assert!(!refused.success);
    assert_eq!(refused.code.as_deref(), Some("HAS_DEPENDENTS"));
    assert!(!refused.is_transport_failure());

    assert!(client.delete_appointment(appointment_id).await.success);
    assert!(client.delete_patient(patient_id).await.success);
    assert!(client.patients().await.unwrap().is_empty());
}

#[tokio::test]
async fn cache_is_dropped_after_mutations() {
    let store = Arc::new(MemoryStore::new());
    let client = ClinicClient::new(spawn_server(store).await).unwrap();

    assert!(client.appointments().await.unwrap().is_empty());

    let patient_id = client.create_patient(&ana()).await.id.unwrap();
    client.create_appointment(&visit(patient_id)).await;

    let rows = client.appointments().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "pendiente");

    client.rotate_status(rows[0].id).await;
    assert_eq!(client.appointments().await.unwrap()[0].status, "confirmada");
}

#[tokio::test]
async fn delete_refetches_appointments_behind_a_stale_cache() {
    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(store).await;
    let front_desk = ClinicClient::new(base.clone()).unwrap();
    let other_desk = ClinicClient::new(base).unwrap();

    let patient_id = front_desk.create_patient(&ana()).await.id.unwrap();
    assert!(front_desk.appointments().await.unwrap().is_empty());

    other_desk.create_appointment(&visit(patient_id)).await;

    // front_desk's cached list is still empty here.
    let refused = front_desk.delete_patient(patient_id).await;
    assert_eq!(refused.code.as_deref(), Some("HAS_DEPENDENTS"));
    assert_eq!(front_desk.patients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn server_refuses_delete_without_any_client_side_check() {
    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(store.clone()).await;
    let desk = ClinicClient::new(base.clone()).unwrap();

    let patient_id = desk.create_patient(&ana()).await.id.unwrap();
    assert!(desk.create_appointment(&visit(patient_id)).await.success);
    let writes = store.write_count().await;

    // A caller that never looks at the appointment list.
    let response = reqwest::Client::new()
        .delete(format!("{base}/api/v1/patients"))
        .json(&serde_json::json!({ "id": patient_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "HAS_DEPENDENTS");

    assert_eq!(store.write_count().await, writes);
    assert_eq!(desk.patients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn domain_refusals_keep_their_codes() {
    let store = Arc::new(MemoryStore::new());
    let client = ClinicClient::new(spawn_server(store).await).unwrap();

    let missing = client.rotate_status(404).await;
    assert!(!missing.success);
    assert_eq!(missing.code.as_deref(), Some("NOT_FOUND"));

    let orphan = client.create_appointment(&visit(12)).await;
    assert_eq!(orphan.code.as_deref(), Some("NOT_FOUND"));

    let invalid = client.delete_appointment(0).await;
    assert_eq!(invalid.code.as_deref(), Some("VALIDATION_ERROR"));
}

#[tokio::test]
async fn roster_is_served() {
    let client = ClinicClient::new(spawn_server(Arc::new(MemoryStore::new())).await).unwrap();
    assert_eq!(client.practitioners().await.unwrap(), vec!["Carlos Mendoza", "Juan Pérez"]);
}
