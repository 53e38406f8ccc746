use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{Identity, Role};
use shared_models::error::AppError;

use crate::models::{
    CreatePatientProfileRequest, PatientError, PatientProfile, UpdatePatientProfileRequest,
};
use crate::services::profile::PatientProfileService;

fn map_patient_error(err: PatientError) -> AppError {
    match err {
        PatientError::ProfileExists => {
            AppError::Conflict("Patient profile already exists for this user".to_string())
        }
        PatientError::NotFound => AppError::NotFound("Patient profile not found".to_string()),
        PatientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_patient(identity: &Identity) -> Result<(), AppError> {
    if identity.role != Role::Patient {
        return Err(AppError::Forbidden(
            "Only patients can manage patient profiles".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreatePatientProfileRequest>,
) -> Result<(StatusCode, Json<PatientProfile>), AppError> {
    require_patient(&identity)?;
    debug!("Creating patient profile for user: {}", identity.user_id);

    let service = PatientProfileService::new(&config);
    let profile = service
        .create_profile(identity.user_id, request)
        .await
        .map_err(map_patient_error)?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_own_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<PatientProfile>, AppError> {
    require_patient(&identity)?;

    let service = PatientProfileService::new(&config);
    let profile = service
        .get_by_user(identity.user_id)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(profile))
}

pub async fn update_own_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdatePatientProfileRequest>,
) -> Result<Json<PatientProfile>, AppError> {
    require_patient(&identity)?;

    let service = PatientProfileService::new(&config);
    let profile = service
        .update_by_user(identity.user_id, request)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(profile))
}

pub async fn delete_own_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    require_patient(&identity)?;

    let service = PatientProfileService::new(&config);
    service
        .delete_by_user(identity.user_id)
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!({ "message": "Patient profile deleted" })))
}
