use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{
    CreatePatientProfileRequest, PatientError, PatientProfile, UpdatePatientProfileRequest,
};

pub struct PatientProfileService {
    store: StoreClient,
}

impl PatientProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    pub async fn create_profile(
        &self,
        user_id: Uuid,
        request: CreatePatientProfileRequest,
    ) -> Result<PatientProfile, PatientError> {
        debug!("Creating patient profile for user: {}", user_id);

        if self.find_by_user(user_id).await?.is_some() {
            return Err(PatientError::ProfileExists);
        }

        let row = json!({
            "user_id": user_id,
            "name": request.name,
            "email": request.email,
            "phone": request.phone,
            "date_of_birth": request.date_of_birth,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result = self
            .store
            .insert_returning("patient_profiles", row)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let created = result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::DatabaseError("Failed to create profile".to_string()))?;

        serde_json::from_value(created).map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<PatientProfile>, PatientError> {
        let path = format!("/rest/v1/patient_profiles?user_id=eq.{}", user_id);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| PatientError::DatabaseError(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<PatientProfile, PatientError> {
        self.find_by_user(user_id).await?.ok_or(PatientError::NotFound)
    }

    pub async fn update_by_user(
        &self,
        user_id: Uuid,
        request: UpdatePatientProfileRequest,
    ) -> Result<PatientProfile, PatientError> {
        debug!("Updating patient profile for user: {}", user_id);

        let mut patch = serde_json::Map::new();
        if let Some(name) = request.name {
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(email) = request.email {
            patch.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            patch.insert("phone".to_string(), json!(phone));
        }
        if let Some(date_of_birth) = request.date_of_birth {
            patch.insert("date_of_birth".to_string(), json!(date_of_birth));
        }

        if patch.is_empty() {
            return self.get_by_user(user_id).await;
        }
        patch.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let filter = format!("user_id=eq.{}", user_id);
        let result = self
            .store
            .update_returning("patient_profiles", &filter, Value::Object(patch))
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let updated = result.into_iter().next().ok_or(PatientError::NotFound)?;
        serde_json::from_value(updated).map_err(|e| PatientError::DatabaseError(e.to_string()))
    }

    pub async fn delete_by_user(&self, user_id: Uuid) -> Result<(), PatientError> {
        debug!("Deleting patient profile for user: {}", user_id);

        let filter = format!("user_id=eq.{}", user_id);
        let deleted = self
            .store
            .delete_returning("patient_profiles", &filter)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
            return Err(PatientError::NotFound);
        }

        Ok(())
    }
}
