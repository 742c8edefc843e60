use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use portfolio_core_contact_contracts::ContactFeatureService;
use serde::Serialize;

pub fn router(service: Arc<impl ContactFeatureService>) -> Router<()> {
    Router::new()
        .route("/health", routing::get(health))
        .with_state(service)
}

#[derive(Serialize)]
struct HealthResponse {
    http: bool,
    email: bool,
}

async fn health(service: State<Arc<impl ContactFeatureService>>) -> Response {
    let email = service.is_configured();

    let status = if email {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(HealthResponse { http: true, email })).into_response()
}
