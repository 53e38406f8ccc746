use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AuthError, LoginRequest, LoginResponse, RegisterRequest};
use crate::services::account::AccountService;

fn map_auth_error(err: AuthError) -> AppError {
    match err {
        AuthError::EmailTaken(email) => {
            AppError::Conflict(format!("Account with email {} already exists", email))
        }
        AuthError::InvalidCredentials => AppError::Auth("Invalid email or password".to_string()),
        AuthError::ValidationError(msg) => AppError::ValidationError(msg),
        AuthError::DatabaseError(msg) => AppError::Database(msg),
        AuthError::TokenError(msg) => AppError::Internal(msg),
    }
}

pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    debug!("Handling registration request");

    let service = AccountService::new(&config);
    service.register(request).await.map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    debug!("Handling login request");

    let service = AccountService::new(&config);
    let response = service.login(request).await.map_err(map_auth_error)?;

    Ok(Json(response))
}
