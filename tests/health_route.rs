use concept_server::routes::health::{HealthResponse, health_check};
use concept_server::test_support::TestRocketBuilder;
use rocket::http::Status;
use rocket::routes;

#[test]
fn health_endpoint_reports_store_backend() {
    let client = TestRocketBuilder::new()
        .mount_api_routes(routes![health_check])
        .blocking_client();

    let response = client.get("/api/v1/health").dispatch();
    assert_eq!(response.status(), Status::Ok);

    let payload: HealthResponse = response.into_json().expect("valid JSON payload");
    assert_eq!(payload.status, "ok");
    assert_eq!(payload.store, "memory");
}

#[test]
fn openapi_document_lists_thread_routes() {
    let client = TestRocketBuilder::new()
        .mount_api_routes(concept_server::routes::api_routes())
        .blocking_client();

    let response = client.get("/api/v1/openapi.json").dispatch();
    assert_eq!(response.status(), Status::Ok);

    let doc: serde_json::Value = response.into_json().expect("valid JSON payload");
    let paths = doc["paths"].as_object().expect("paths object");
    assert!(paths.contains_key("/threads/link"));
    assert!(paths.contains_key("/threads/items/{item}/next"));
    assert!(paths.contains_key("/journals/lookup"));
}
