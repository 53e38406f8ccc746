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

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, DoctorAvailabilityEntry,
    DoctorScheduleResponse,
};
use crate::services::scheduling::AppointmentService;

fn map_appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        AppointmentError::NotAvailable => AppError::ValidationError(
            "Doctor is not available at the requested time".to_string(),
        ),
        AppointmentError::SlotTaken => {
            AppError::Conflict("The requested slot is already booked".to_string())
        }
        AppointmentError::NotOwner => {
            AppError::Forbidden("Appointment belongs to a different patient".to_string())
        }
        AppointmentError::AlreadyClosed(status) => {
            AppError::Conflict(format!("Appointment is already {}", status))
        }
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn require_patient(identity: &Identity) -> Result<(), AppError> {
    if identity.role != Role::Patient {
        return Err(AppError::Forbidden(
            "Only patients can book or manage appointments".to_string(),
        ));
    }
    Ok(())
}

pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    require_patient(&identity)?;
    debug!("Booking appointment for patient: {}", identity.user_id);

    let service = AppointmentService::new(&config);
    let appointment = service
        .book(&identity, request)
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn list_own_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    require_patient(&identity)?;

    let service = AppointmentService::new(&config);
    let appointments = service
        .list_mine(&identity)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointments))
}

pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(identity): Extension<Identity>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_patient(&identity)?;
    debug!("Cancelling appointment: {}", appointment_id);

    let service = AppointmentService::new(&config);
    service
        .cancel(&identity, appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "message": "Appointment cancelled" })))
}

pub async fn get_doctor_schedule(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DoctorScheduleResponse>, AppError> {
    let service = AppointmentService::new(&config);
    let schedule = service
        .doctor_schedule(doctor_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(schedule))
}

pub async fn doctor_availability_report(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Vec<DoctorAvailabilityEntry>>, AppError> {
    let service = AppointmentService::new(&config);
    let report = service
        .doctor_availability_report()
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(report))
}
