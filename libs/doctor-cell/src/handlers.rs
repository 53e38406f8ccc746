use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Identity, Role};
use shared_models::error::AppError;

use crate::models::{CreateDoctorProfileRequest, DoctorError, DoctorProfile, UpdateDoctorProfileRequest};
use crate::services::profile::DoctorProfileService;

fn map_doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::ProfileExists => {
            AppError::Conflict("Doctor profile already exists for this user".to_string())
        }
        DoctorError::NotFound => AppError::NotFound("Doctor profile not found".to_string()),
        DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_doctor(identity: &Identity) -> Result<(), AppError> {
    if identity.role != Role::Doctor {
        return Err(AppError::Forbidden(
            "Only doctors can manage doctor profiles".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateDoctorProfileRequest>,
) -> Result<(StatusCode, Json<DoctorProfile>), AppError> {
    require_doctor(&identity)?;
    debug!("Creating doctor profile for user: {}", identity.user_id);

    let service = DoctorProfileService::new(&config);
    let profile = service
        .create_profile(identity.user_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_own_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DoctorProfile>, AppError> {
    require_doctor(&identity)?;

    let service = DoctorProfileService::new(&config);
    let profile = service
        .get_by_user(identity.user_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(profile))
}

pub async fn update_own_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<DoctorProfile>, AppError> {
    require_doctor(&identity)?;

    let service = DoctorProfileService::new(&config);
    let profile = service
        .update_by_user(identity.user_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(profile))
}

pub async fn delete_own_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&identity)?;

    let service = DoctorProfileService::new(&config);
    service
        .delete_by_user(identity.user_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({ "message": "Doctor profile deleted" })))
}

pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<DoctorProfile>, AppError> {
    let service = DoctorProfileService::new(&config);
    let profile = service
        .get_by_id(profile_id)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(profile))
}
