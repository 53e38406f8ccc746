use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, warn};

use shared_database::store::StoreClient;

use crate::models::{AppointmentError, AppointmentStatus};

/// Flip every scheduled appointment whose date has passed to completed.
/// A single filtered update, not a table scan.
pub async fn reconcile_statuses(
    store: &StoreClient,
    today: NaiveDate,
) -> Result<usize, AppointmentError> {
    let filter = format!("status=eq.scheduled&appointment_date=lt.{}", today);
    let patch = json!({
        "status": "completed",
        "updated_at": Utc::now().to_rfc3339(),
    });

    let updated = store
        .update_returning("appointments", &filter, patch)
        .await
        .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

    if !updated.is_empty() {
        debug!("Reconciled {} stale appointments to completed", updated.len());
    }

    Ok(updated.len())
}

/// Reconciliation keeps reads fresh but must never fail the surrounding
/// request. A store hiccup here means callers see last-known statuses.
pub async fn reconcile_best_effort(store: &StoreClient, today: NaiveDate) {
    if let Err(e) = reconcile_statuses(store, today).await {
        warn!("Status reconciliation skipped: {}", e);
    }
}

/// Only scheduled appointments can be cancelled.
pub fn ensure_cancellable(status: AppointmentStatus) -> Result<(), AppointmentError> {
    if status.is_terminal() {
        return Err(AppointmentError::AlreadyClosed(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_can_be_cancelled() {
        assert!(ensure_cancellable(AppointmentStatus::Scheduled).is_ok());
    }

    #[test]
    fn terminal_states_cannot_be_cancelled() {
        assert!(matches!(
            ensure_cancellable(AppointmentStatus::Cancelled),
            Err(AppointmentError::AlreadyClosed(AppointmentStatus::Cancelled))
        ));
        assert!(matches!(
            ensure_cancellable(AppointmentStatus::Completed),
            Err(AppointmentError::AlreadyClosed(AppointmentStatus::Completed))
        ));
    }
}
