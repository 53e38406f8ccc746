use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::store::StoreClient;
use crate::models::AppointmentError;

const LOCK_TIMEOUT_SECONDS: i64 = 30;
pub const MAX_LOCK_ATTEMPTS: u32 = 3;

/// Advisory per-doctor-day lock backed by a table with a unique `lock_key`.
/// Inserting the row acquires the lock; a second insert for the same key
/// fails at the store, which closes the check-then-act gap between the
/// conflict check and the appointment insert.
pub struct SlotLockService<'a> {
    store: &'a StoreClient,
}

impl<'a> SlotLockService<'a> {
    pub fn new(store: &'a StoreClient) -> Self {
        Self { store }
    }

    /// One lock per doctor and calendar date. Overlaps can span any two
    /// ranges on the same day, so the lock has to cover the whole day to
    /// serialize the conflict check against concurrent inserts.
    pub fn lock_key(doctor_id: Uuid, date: NaiveDate) -> String {
        format!("slot_{}_{}", doctor_id, date)
    }

    pub async fn acquire(&self, lock_key: &str, doctor_id: Uuid) -> Result<bool, AppointmentError> {
        if self.try_insert_lock(lock_key, doctor_id).await? {
            debug!("Slot lock acquired: {}", lock_key);
            return Ok(true);
        }

        // The holder may have died. Clean up an expired row and retry once.
        if self.cleanup_expired(lock_key).await? {
            let acquired = self.try_insert_lock(lock_key, doctor_id).await?;
            if acquired {
                debug!("Slot lock acquired after cleanup: {}", lock_key);
            }
            return Ok(acquired);
        }

        Ok(false)
    }

    pub async fn release(&self, lock_key: &str) -> Result<(), AppointmentError> {
        let _: Vec<Value> = self
            .store
            .delete_returning("slot_locks", &format!("lock_key=eq.{}", lock_key))
            .await
            .map_err(|e| AppointmentError::DatabaseError(format!("Lock release failed: {}", e)))?;

        debug!("Slot lock released: {}", lock_key);
        Ok(())
    }

    async fn try_insert_lock(
        &self,
        lock_key: &str,
        doctor_id: Uuid,
    ) -> Result<bool, AppointmentError> {
        let row = json!({
            "lock_key": lock_key,
            "doctor_id": doctor_id,
            "acquired_at": Utc::now().to_rfc3339(),
            "expires_at": (Utc::now() + Duration::seconds(LOCK_TIMEOUT_SECONDS)).to_rfc3339(),
            "holder": format!("scheduler_{}", Uuid::new_v4()),
        });

        // The unique constraint on lock_key turns a concurrent acquire into
        // an insert error.
        match self.store.insert_returning("slot_locks", row).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    /// Delete the lock row if its expiry has passed. Returns true when a row
    /// was cleaned up and an acquire retry is worthwhile.
    async fn cleanup_expired(&self, lock_key: &str) -> Result<bool, AppointmentError> {
        let path = format!("/rest/v1/slot_locks?lock_key=eq.{}", lock_key);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(format!("Lock check failed: {}", e)))?;

        if let Some(lock) = rows.first() {
            if let Some(expires_at) = lock
                .get("expires_at")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            {
                if expires_at.with_timezone(&Utc) < Utc::now() {
                    self.release(lock_key).await?;
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}
