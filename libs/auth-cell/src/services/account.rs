use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::store::StoreClient;
use shared_utils::jwt::issue_token;

use crate::models::{AuthError, LoginRequest, LoginResponse, RegisterRequest, UserAccount};
use crate::services::password::{hash_password, verify_password};

pub struct AccountService {
    store: StoreClient,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<(), AuthError> {
        if !request.email.contains('@') {
            return Err(AuthError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        if request.password.len() < 8 {
            return Err(AuthError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        debug!("Registering account for: {}", request.email);

        let path = format!("/rest/v1/users?email=eq.{}", urlencoding::encode(&request.email));
        let existing: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(AuthError::EmailTaken(request.email));
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| AuthError::ValidationError(format!("Unusable password: {}", e)))?;

        let row = json!({
            "email": request.email,
            "password_hash": password_hash,
            "role": request.role,
        });

        let created = self
            .store
            .insert_returning("users", row)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if created.is_empty() {
            return Err(AuthError::DatabaseError(
                "Failed to create account".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        debug!("Login attempt for: {}", request.email);

        let path = format!("/rest/v1/users?email=eq.{}", urlencoding::encode(&request.email));
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        // Unknown email and bad password collapse into the same error so the
        // response does not reveal which accounts exist.
        let account: UserAccount = match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map_err(|e| AuthError::DatabaseError(e.to_string()))?,
            None => return Err(AuthError::InvalidCredentials),
        };

        let matches = verify_password(&request.password, &account.password_hash)
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(account.id, &account.email, account.role, &self.jwt_secret)
            .map_err(AuthError::TokenError)?;

        Ok(LoginResponse {
            token,
            role: account.role,
        })
    }
}
