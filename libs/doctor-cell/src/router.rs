use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/profile", post(handlers::create_profile))
        .route(
            "/me",
            get(handlers::get_own_profile)
                .put(handlers::update_own_profile)
                .delete(handlers::delete_own_profile),
        )
        .route("/{id}", get(handlers::get_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
