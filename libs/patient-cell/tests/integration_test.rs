use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_config(mock_server: &MockServer) -> AppConfig {
    let base = TestConfig::default();
    AppConfig {
        store_url: mock_server.uri(),
        store_api_key: base.store_api_key,
        jwt_secret: base.jwt_secret,
        mail_api_url: String::new(),
        mail_api_key: String::new(),
    }
}

fn test_app(config: AppConfig) -> Router {
    patient_routes(Arc::new(config))
}

fn profile_json(user_id: Uuid) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "phone": "+353-1-555-0100",
        "date_of_birth": "1990-12-10",
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn patient_can_create_a_profile() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let patient = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("user_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([profile_json(patient.id)])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "phone": "+353-1-555-0100",
                "date_of_birth": "1990-12-10"
            })
            .to_string(),
        ))
        .unwrap();

    let response = test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    assert_eq!(body["user_id"], patient.id.to_string());
}

#[tokio::test]
async fn doctors_cannot_create_patient_profiles() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let doctor = TestUser::doctor("doc@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, Some(1));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({ "name": "Mallory", "email": "mallory@example.com" }).to_string(),
        ))
        .unwrap();

    let response = test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn updating_own_profile_returns_the_new_state() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let patient = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(1));

    let mut updated = profile_json(patient.id);
    updated["phone"] = json!("+353-1-555-0199");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patient_profiles"))
        .and(query_param("user_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PUT")
        .uri("/me")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "phone": "+353-1-555-0199" }).to_string()))
        .unwrap();

    let response = test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["phone"], "+353-1-555-0199");
}

#[tokio::test]
async fn own_profile_is_not_found_before_creation() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let patient = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_missing_profile_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = test_config(&mock_server);
    let patient = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(1));

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patient_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
