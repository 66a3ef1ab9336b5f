pub mod auth;
pub mod deliveries;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route(
            "/api/v1/auth/reset-password",
            get(auth::check_reset_token).post(auth::reset_password),
        )
        // Deliveries
        .route(
            "/api/v1/deliveries",
            get(deliveries::list).post(deliveries::create),
        )
        .route("/api/v1/deliveries/summary", get(deliveries::summary))
        .route("/api/v1/deliveries/demo", post(deliveries::seed_demo))
        .route(
            "/api/v1/deliveries/{id}",
            get(deliveries::get).delete(deliveries::delete),
        )
        .route("/api/v1/deliveries/{id}/status", put(deliveries::update_status))
        .route("/api/v1/deliveries/{id}/restore", post(deliveries::restore))
        .route("/api/v1/deliveries/{id}/undo", post(deliveries::restore))
}
