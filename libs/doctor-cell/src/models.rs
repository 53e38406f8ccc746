use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::time::{hhmm, weekday};

/// One open window in a doctor's recurring weekly schedule. Windows are a
/// template, not instances: a Monday window applies to every Monday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    #[serde(with = "weekday")]
    pub day: Weekday,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub specialization: String,
    pub experience: Option<i32>,
    pub email: String,
    pub availability: Vec<AvailabilityWindow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDoctorProfileRequest {
    pub name: String,
    pub specialization: String,
    pub experience: Option<i32>,
    pub email: String,
    pub availability: Vec<AvailabilityWindow>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDoctorProfileRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub experience: Option<i32>,
    pub email: Option<String>,
    pub availability: Option<Vec<AvailabilityWindow>>,
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor profile already exists for this user")]
    ProfileExists,

    #[error("Doctor profile not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Every window must have a positive duration.
pub fn validate_windows(windows: &[AvailabilityWindow]) -> Result<(), DoctorError> {
    for window in windows {
        if window.start_time >= window.end_time {
            return Err(DoctorError::ValidationError(format!(
                "Availability window on {} must start before it ends",
                window.day
            )));
        }
    }
    Ok(())
}
