use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{middlewares::request_id::RequestId, models::ApiMessage};

pub mod contact;
pub mod health;

pub const INTERNAL_SERVER_ERROR: &str = "Error interno del servidor.";

pub fn internal_server_error(request_id: RequestId, err: impl Into<anyhow::Error>) -> Response {
    let err = err.into();
    tracing::error!(%request_id, "internal server error: {err:#}");
    message(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR)
}

fn message(code: StatusCode, message: &'static str) -> Response {
    (code, Json(ApiMessage { message })).into_response()
}
