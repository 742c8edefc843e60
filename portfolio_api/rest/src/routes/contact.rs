use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use portfolio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use tracing::{debug, error, warn};

use super::{internal_server_error, message};
use crate::{
    middlewares::request_id::RequestId,
    models::contact::{validate_contact_message, ApiContactValidationErrors},
};

pub const MESSAGE_SENT: &str = "Mensaje enviado con éxito.";
pub const INVALID_JSON_BODY: &str = "El cuerpo de la petición está vacío o no es un JSON válido.";
pub const CONFIGURATION_MISSING: &str =
    "Configuración faltante: la clave de API del proveedor de correo no está definida en el servidor.";
pub const COULD_NOT_SEND_MESSAGE: &str = "No se pudo enviar el mensaje.";

pub fn router(service: Arc<impl ContactFeatureService>) -> Router<()> {
    Router::new()
        .route("/api/contact", routing::post(send_message))
        .with_state(service)
}

/// The body is taken as a `Result`, so bodies which cannot be read at all
/// (e.g. exceeding the size limit) still get the json error response.
async fn send_message(
    service: State<Arc<impl ContactFeatureService>>,
    request_id: RequestId,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if !service.is_configured() {
        return configuration_missing(request_id);
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!(%request_id, "rejecting unreadable contact request body: {rejection}");
            return message(StatusCode::BAD_REQUEST, INVALID_JSON_BODY);
        }
    };

    let Ok(body) = serde_json::from_slice::<serde_json::Value>(&body) else {
        debug!("rejecting contact request with malformed json body");
        return message(StatusCode::BAD_REQUEST, INVALID_JSON_BODY);
    };

    let contact_message = match validate_contact_message(&body) {
        Ok(contact_message) => contact_message,
        Err(errors) => {
            debug!(?errors, "rejecting invalid contact request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiContactValidationErrors { errors }),
            )
                .into_response();
        }
    };

    match service.send_message(contact_message).await {
        Ok(()) => message(StatusCode::OK, MESSAGE_SENT),
        Err(ContactSendMessageError::NotConfigured) => configuration_missing(request_id),
        Err(ContactSendMessageError::Send) => {
            warn!(%request_id, "contact message could not be delivered");
            message(StatusCode::INTERNAL_SERVER_ERROR, COULD_NOT_SEND_MESSAGE)
        }
        Err(ContactSendMessageError::Other(err)) => internal_server_error(request_id, err),
    }
}

fn configuration_missing(request_id: RequestId) -> Response {
    error!(%request_id, "cannot relay contact message: email provider api key is missing");
    message(StatusCode::INTERNAL_SERVER_ERROR, CONFIGURATION_MISSING)
}
