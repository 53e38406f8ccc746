use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{
    validate_windows, CreateDoctorProfileRequest, DoctorError, DoctorProfile,
    UpdateDoctorProfileRequest,
};

pub struct DoctorProfileService {
    store: StoreClient,
}

impl DoctorProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    pub async fn create_profile(
        &self,
        user_id: Uuid,
        request: CreateDoctorProfileRequest,
    ) -> Result<DoctorProfile, DoctorError> {
        debug!("Creating doctor profile for user: {}", user_id);

        validate_windows(&request.availability)?;

        // One profile per account.
        if self.find_by_user(user_id).await?.is_some() {
            return Err(DoctorError::ProfileExists);
        }

        let row = json!({
            "user_id": user_id,
            "name": request.name,
            "specialization": request.specialization,
            "experience": request.experience,
            "email": request.email,
            "availability": request.availability,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result = self
            .store
            .insert_returning("doctor_profiles", row)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let created = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("Failed to create profile".to_string()))?;

        serde_json::from_value(created).map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<DoctorProfile>, DoctorError> {
        let path = format!("/rest/v1/doctor_profiles?user_id=eq.{}", user_id);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| DoctorError::DatabaseError(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        self.find_by_user(user_id).await?.ok_or(DoctorError::NotFound)
    }

    pub async fn get_by_id(&self, profile_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        let path = format!("/rest/v1/doctor_profiles?id=eq.{}", profile_id);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row).map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }

    pub async fn update_by_user(
        &self,
        user_id: Uuid,
        request: UpdateDoctorProfileRequest,
    ) -> Result<DoctorProfile, DoctorError> {
        debug!("Updating doctor profile for user: {}", user_id);

        if let Some(windows) = &request.availability {
            validate_windows(windows)?;
        }

        let mut patch = serde_json::Map::new();
        if let Some(name) = request.name {
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(specialization) = request.specialization {
            patch.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(experience) = request.experience {
            patch.insert("experience".to_string(), json!(experience));
        }
        if let Some(email) = request.email {
            patch.insert("email".to_string(), json!(email));
        }
        if let Some(availability) = request.availability {
            patch.insert("availability".to_string(), json!(availability));
        }

        if patch.is_empty() {
            return self.get_by_user(user_id).await;
        }
        patch.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("user_id=eq.{}", user_id);
        let result = self
            .store
            .update_returning("doctor_profiles", &filter, Value::Object(patch))
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let updated = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(updated).map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }

    pub async fn delete_by_user(&self, user_id: Uuid) -> Result<(), DoctorError> {
        debug!("Deleting doctor profile for user: {}", user_id);

        let filter = format!("user_id=eq.{}", user_id);
        let deleted = self
            .store
            .delete_returning("doctor_profiles", &filter)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
            return Err(DoctorError::NotFound);
        }

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, "/rest/v1/doctor_profiles?order=name.asc", None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| DoctorError::DatabaseError(e.to_string()))
            })
            .collect()
    }
}
