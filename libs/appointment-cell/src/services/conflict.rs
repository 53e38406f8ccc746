use chrono::{Datelike, NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::models::AvailabilityWindow;
use shared_database::store::StoreClient;

use crate::models::{Appointment, AppointmentError};

/// Half-open interval overlap: [a_start, a_end) intersects [b_start, b_end).
pub fn ranges_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// True iff the requested range falls entirely inside one of the doctor's
/// windows for the weekday of `date`.
pub fn within_availability(
    windows: &[AvailabilityWindow],
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> bool {
    let weekday = date.weekday();
    windows.iter().any(|window| {
        window.day == weekday && start_time >= window.start_time && end_time <= window.end_time
    })
}

/// All non-cancelled appointments for a doctor on a given date.
pub async fn get_active_appointments(
    store: &StoreClient,
    doctor_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Appointment>, AppointmentError> {
    let path = format!(
        "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=neq.cancelled",
        doctor_id, date
    );

    let rows: Vec<Value> = store
        .request(Method::GET, &path, None)
        .await
        .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| AppointmentError::DatabaseError(e.to_string()))
        })
        .collect()
}

/// True iff an existing non-cancelled appointment for the doctor on `date`
/// overlaps the requested range.
pub async fn has_conflict(
    store: &StoreClient,
    doctor_id: Uuid,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<bool, AppointmentError> {
    let existing = get_active_appointments(store, doctor_id, date).await?;

    let conflict = existing
        .iter()
        .any(|a| ranges_overlap(start_time, end_time, a.start_time, a.end_time));

    if conflict {
        debug!("Conflict detected for doctor {} on {}", doctor_id, date);
    }

    Ok(conflict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(day: Weekday, start: NaiveTime, end: NaiveTime) -> AvailabilityWindow {
        AvailabilityWindow {
            day,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn overlap_detects_partial_intersection() {
        assert!(ranges_overlap(t(9, 0), t(10, 0), t(9, 30), t(10, 30)));
        assert!(ranges_overlap(t(9, 30), t(10, 30), t(9, 0), t(10, 0)));
    }

    #[test]
    fn overlap_detects_containment() {
        assert!(ranges_overlap(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
        assert!(ranges_overlap(t(10, 0), t(11, 0), t(9, 0), t(12, 0)));
    }

    #[test]
    fn back_to_back_slots_do_not_overlap() {
        assert!(!ranges_overlap(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!ranges_overlap(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn disjoint_slots_do_not_overlap() {
        assert!(!ranges_overlap(t(9, 0), t(10, 0), t(13, 0), t(14, 0)));
    }

    #[test]
    fn availability_requires_matching_weekday() {
        let windows = vec![window(Weekday::Mon, t(9, 0), t(12, 0))];
        // 2026-09-07 is a Monday, 2026-09-08 a Tuesday.
        let monday = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 9, 8).unwrap();

        assert!(within_availability(&windows, monday, t(9, 0), t(10, 0)));
        assert!(!within_availability(&windows, tuesday, t(9, 0), t(10, 0)));
    }

    #[test]
    fn availability_requires_full_containment() {
        let windows = vec![window(Weekday::Mon, t(9, 0), t(12, 0))];
        let monday = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();

        assert!(within_availability(&windows, monday, t(9, 0), t(12, 0)));
        assert!(!within_availability(&windows, monday, t(8, 30), t(10, 0)));
        assert!(!within_availability(&windows, monday, t(11, 0), t(12, 30)));
        assert!(!within_availability(&windows, monday, t(13, 0), t(14, 0)));
    }

    #[test]
    fn availability_checks_every_window() {
        let windows = vec![
            window(Weekday::Mon, t(9, 0), t(12, 0)),
            window(Weekday::Mon, t(14, 0), t(17, 0)),
        ];
        let monday = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();

        assert!(within_availability(&windows, monday, t(14, 0), t(15, 0)));
        assert!(!within_availability(&windows, monday, t(12, 0), t(14, 30)));
    }
}
