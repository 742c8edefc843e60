//! Fake implementation of the Resend email api.
//!
//! Accepted emails are kept in memory and can be fetched again via
//! `GET /emails/:id`. Emails addressed to a recipient whose local part is
//! `reject` are refused with a `422 validation_error`, which allows callers to
//! exercise the provider error path.
//!
//! Only the most recent [`MAX_STORED_EMAILS`] emails are kept, so the
//! standalone server does not grow without bound.

use std::{
    collections::{HashMap, VecDeque},
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
};

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;
use uuid::Uuid;

pub const EMAILS_ROUTE: &str = "/emails";
pub const REJECTED_LOCAL_PART: &str = "reject";
pub const MAX_STORED_EMAILS: usize = 1000;

pub async fn start_server(host: IpAddr, port: u16, api_key: String) -> anyhow::Result<()> {
    info!("Starting resend testing server on {host}:{port}");
    info!("Resend api endpoint: http://{host}:{port}/");
    info!("Api key: {api_key:?}");
    info!("Emails to \"{REJECTED_LOCAL_PART}@...\" are rejected with a validation error");

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(api_key))
        .await
        .context("Failed to start HTTP server")
}

/// Start the fake api on a random local port in the background and return
/// its address.
pub async fn spawn(api_key: impl Into<String>) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .await
        .context("Failed to bind to a local port")?;
    let addr = listener.local_addr()?;
    let router = router(api_key.into());
    tokio::spawn(async move { axum::serve(listener, router).await });
    Ok(addr)
}

pub fn router(api_key: String) -> Router<()> {
    let state = Arc::new(FakeResend {
        api_key,
        emails: Default::default(),
    });

    Router::new()
        .route(EMAILS_ROUTE, routing::post(send_email))
        .route("/emails/:id", routing::get(get_email))
        .with_state(state)
}

struct FakeResend {
    api_key: String,
    emails: Mutex<EmailStore>,
}

#[derive(Default)]
struct EmailStore {
    emails: HashMap<String, StoredEmail>,
    order: VecDeque<String>,
}

impl EmailStore {
    fn insert(&mut self, email: StoredEmail) {
        self.order.push_back(email.id.clone());
        self.emails.insert(email.id.clone(), email);

        while self.order.len() > MAX_STORED_EMAILS {
            if let Some(oldest) = self.order.pop_front() {
                self.emails.remove(&oldest);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&StoredEmail> {
        self.emails.get(id)
    }
}

#[derive(Deserialize)]
struct SendEmailRequest {
    from: Option<String>,
    #[serde(default)]
    to: Vec<String>,
    subject: Option<String>,
    reply_to: Option<String>,
    html: Option<String>,
    text: Option<String>,
}

#[derive(Clone, Serialize)]
struct StoredEmail {
    object: &'static str,
    id: String,
    from: String,
    to: Vec<String>,
    subject: String,
    reply_to: Option<Vec<String>>,
    html: Option<String>,
    text: Option<String>,
}

async fn send_email(
    state: State<Arc<FakeResend>>,
    headers: HeaderMap,
    Json(request): Json<SendEmailRequest>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let (Some(from), Some(subject)) = (request.from, request.subject) else {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Missing `from` or `subject` field.",
        );
    };

    if request.to.is_empty() {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Missing `to` field.",
        );
    }

    if request.to.iter().any(|to| is_rejected(to)) {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "Invalid `to` field.",
        );
    }

    let id = Uuid::new_v4().to_string();
    let email = StoredEmail {
        object: "email",
        id: id.clone(),
        from,
        to: request.to,
        subject,
        reply_to: request.reply_to.map(|reply_to| vec![reply_to]),
        html: request.html,
        text: request.text,
    };
    state
        .emails
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(email);

    Json(json!({ "id": id })).into_response()
}

async fn get_email(
    state: State<Arc<FakeResend>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let email = state
        .emails
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&id)
        .cloned();

    match email {
        Some(email) => Json(email).into_response(),
        None => error(StatusCode::NOT_FOUND, "not_found", "Email not found"),
    }
}

fn authorize(state: &FakeResend, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        None => Err(error(
            StatusCode::UNAUTHORIZED,
            "missing_api_key",
            "Missing API key in the authorization header.",
        )),
        Some(token) if token != state.api_key => Err(error(
            StatusCode::FORBIDDEN,
            "invalid_api_key",
            "API key is invalid.",
        )),
        Some(_) => Ok(()),
    }
}

fn is_rejected(recipient: &str) -> bool {
    let address = recipient
        .rsplit_once('<')
        .map_or(recipient, |(_, address)| address.trim_end_matches('>'));
    address
        .split_once('@')
        .is_some_and(|(local, _)| local == REJECTED_LOCAL_PART)
}

fn error(status: StatusCode, name: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "statusCode": status.as_u16(),
            "name": name,
            "message": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_evicts_oldest_emails() {
        let mut store = EmailStore::default();

        for i in 0..MAX_STORED_EMAILS + 2 {
            store.insert(make_email(&i.to_string()));
        }

        assert_eq!(store.emails.len(), MAX_STORED_EMAILS);
        assert!(store.get("0").is_none());
        assert!(store.get("1").is_none());
        assert!(store.get("2").is_some());
        assert!(store.get(&(MAX_STORED_EMAILS + 1).to_string()).is_some());
    }

    fn make_email(id: &str) -> StoredEmail {
        StoredEmail {
            object: "email",
            id: id.into(),
            from: "onboarding@resend.dev".into(),
            to: vec!["contact@example.com".into()],
            subject: "Test".into(),
            reply_to: None,
            html: None,
            text: Some("Test".into()),
        }
    }

    #[test]
    fn rejected_recipients() {
        assert!(is_rejected("reject@example.com"));
        assert!(is_rejected("Someone <reject@example.com>"));
        assert!(!is_rejected("contact@example.com"));
        assert!(!is_rejected("rejected@example.com"));
    }
}
