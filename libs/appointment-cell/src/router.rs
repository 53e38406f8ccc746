use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/me", get(handlers::list_own_appointments))
        .route("/{id}", delete(handlers::cancel_appointment))
        .route("/doctor/{doctor_id}/schedule", get(handlers::get_doctor_schedule))
        .route("/doctor-availability", get(handlers::doctor_availability_report))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
