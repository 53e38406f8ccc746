use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorProfile;
use doctor_cell::services::profile::DoctorProfileService;
use shared_config::AppConfig;
use shared_database::store::StoreClient;
use shared_models::auth::Identity;
use shared_models::time::format_hhmm;

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, BookedSlot, DoctorAvailabilityEntry,
    DoctorScheduleResponse, DoctorSummary,
};
use crate::services::conflict::{has_conflict, within_availability};
use crate::services::lifecycle::{ensure_cancellable, reconcile_best_effort};
use crate::services::locks::{SlotLockService, MAX_LOCK_ATTEMPTS};
use crate::services::notify::{MailerService, Notification};

pub struct AppointmentService {
    store: StoreClient,
    doctors: DoctorProfileService,
    mailer: MailerService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
            doctors: DoctorProfileService::new(config),
            mailer: MailerService::new(config),
        }
    }

    pub async fn book(
        &self,
        identity: &Identity,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.start_time >= request.end_time {
            return Err(AppointmentError::ValidationError(
                "Appointment must start before it ends".to_string(),
            ));
        }

        reconcile_best_effort(&self.store, Utc::now().date_naive()).await;

        let doctor = self
            .doctors
            .get_by_id(request.doctor_id)
            .await
            .map_err(|_| AppointmentError::DoctorNotFound)?;

        if !within_availability(
            &doctor.availability,
            request.appointment_date,
            request.start_time,
            request.end_time,
        ) {
            return Err(AppointmentError::NotAvailable);
        }

        let appointment = self.book_under_lock(identity, &request).await?;

        info!(
            "Appointment {} booked for patient {} with doctor {}",
            appointment.id, identity.user_id, doctor.id
        );

        self.mailer.send_in_background(vec![
            Notification::new(
                &doctor.email,
                "New Appointment Booked",
                format!(
                    "A new appointment has been booked on {} from {} to {}.",
                    appointment.appointment_date,
                    format_hhmm(appointment.start_time),
                    format_hhmm(appointment.end_time)
                ),
            ),
            Notification::new(
                &identity.email,
                "Appointment Confirmed",
                format!(
                    "Your appointment with Dr. {} on {} from {} to {} is confirmed.",
                    doctor.name,
                    appointment.appointment_date,
                    format_hhmm(appointment.start_time),
                    format_hhmm(appointment.end_time)
                ),
            ),
        ]);

        Ok(appointment)
    }

    /// Conflict check and insert run while holding the advisory slot lock,
    /// so two concurrent requests for the same slot cannot both pass the
    /// check before either row lands.
    async fn book_under_lock(
        &self,
        identity: &Identity,
        request: &BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let locks = SlotLockService::new(&self.store);
        let lock_key = SlotLockService::lock_key(request.doctor_id, request.appointment_date);

        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            debug!("Booking attempt {} for lock {}", attempt, lock_key);

            if !locks.acquire(&lock_key, request.doctor_id).await? {
                if attempt < MAX_LOCK_ATTEMPTS {
                    tokio::time::sleep(std::time::Duration::from_millis(100 * attempt as u64))
                        .await;
                    continue;
                }
                warn!("Could not acquire slot lock {} after {} attempts", lock_key, attempt);
                return Err(AppointmentError::SlotTaken);
            }

            let result = self.check_and_insert(identity, request).await;
            locks.release(&lock_key).await?;
            return result;
        }

        Err(AppointmentError::SlotTaken)
    }

    async fn check_and_insert(
        &self,
        identity: &Identity,
        request: &BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if has_conflict(
            &self.store,
            request.doctor_id,
            request.appointment_date,
            request.start_time,
            request.end_time,
        )
        .await?
        {
            return Err(AppointmentError::SlotTaken);
        }

        let row = json!({
            "doctor_id": request.doctor_id,
            "patient_id": identity.user_id,
            "appointment_date": request.appointment_date,
            "start_time": format_hhmm(request.start_time),
            "end_time": format_hhmm(request.end_time),
            "status": "scheduled",
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let created = self
            .store
            .insert_returning("appointments", row)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = created.into_iter().next().ok_or_else(|| {
            AppointmentError::DatabaseError("Failed to create appointment".to_string())
        })?;

        serde_json::from_value(appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn list_mine(&self, identity: &Identity) -> Result<Vec<Appointment>, AppointmentError> {
        reconcile_best_effort(&self.store, Utc::now().date_naive()).await;

        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.asc,start_time.asc",
            identity.user_id
        );

        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
            })
            .collect()
    }

    pub async fn cancel(
        &self,
        identity: &Identity,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(appointment_id).await?;

        if appointment.patient_id != identity.user_id {
            return Err(AppointmentError::NotOwner);
        }

        ensure_cancellable(appointment.status)?;

        let patch = json!({
            "status": "cancelled",
            "updated_at": Utc::now().to_rfc3339(),
        });

        let filter = format!("id=eq.{}", appointment_id);
        let updated = self
            .store
            .update_returning("appointments", &filter, patch)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let cancelled: Appointment = updated
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?
            .ok_or(AppointmentError::AppointmentNotFound)?;

        info!("Appointment {} cancelled by patient {}", appointment_id, identity.user_id);

        let slot = format!(
            "{} from {} to {}",
            cancelled.appointment_date,
            format_hhmm(cancelled.start_time),
            format_hhmm(cancelled.end_time)
        );

        let mut notifications = vec![Notification::new(
            &identity.email,
            "Appointment Cancellation Successful",
            format!("Your appointment on {} has been cancelled.", slot),
        )];
        match self.doctors.get_by_id(cancelled.doctor_id).await {
            Ok(doctor) => notifications.push(Notification::new(
                &doctor.email,
                "Appointment Cancelled",
                format!("The appointment on {} has been cancelled.", slot),
            )),
            Err(e) => warn!("Doctor lookup for cancellation notice failed: {}", e),
        }
        self.mailer.send_in_background(notifications);

        Ok(cancelled)
    }

    pub async fn doctor_schedule(
        &self,
        doctor_id: Uuid,
    ) -> Result<DoctorScheduleResponse, AppointmentError> {
        let doctor = self
            .doctors
            .get_by_id(doctor_id)
            .await
            .map_err(|_| AppointmentError::DoctorNotFound)?;

        reconcile_best_effort(&self.store, Utc::now().date_naive()).await;

        let booked = self.booked_slots(doctor.id).await?;

        Ok(DoctorScheduleResponse {
            doctor: DoctorSummary {
                id: doctor.id,
                name: doctor.name,
                specialization: doctor.specialization,
            },
            availability: doctor.availability,
            booked,
        })
    }

    pub async fn doctor_availability_report(
        &self,
    ) -> Result<Vec<DoctorAvailabilityEntry>, AppointmentError> {
        reconcile_best_effort(&self.store, Utc::now().date_naive()).await;

        let doctors = self
            .doctors
            .list_all()
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let mut report = Vec::with_capacity(doctors.len());
        for doctor in doctors {
            let booked = self.booked_slots(doctor.id).await?;
            report.push(entry_for(doctor, booked));
        }

        Ok(report)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(AppointmentError::AppointmentNotFound)?;

        serde_json::from_value(row).map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    /// Non-cancelled slots across all dates for one doctor, calendar order.
    async fn booked_slots(&self, doctor_id: Uuid) -> Result<Vec<BookedSlot>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=neq.cancelled&order=appointment_date.asc,start_time.asc",
            doctor_id
        );

        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        Ok(appointments.iter().map(BookedSlot::from).collect())
    }
}

fn entry_for(doctor: DoctorProfile, booked: Vec<BookedSlot>) -> DoctorAvailabilityEntry {
    DoctorAvailabilityEntry {
        doctor_id: doctor.id,
        doctor_name: doctor.name,
        specialization: doctor.specialization,
        availability: doctor.availability,
        booked,
    }
}
