use std::sync::Arc;

use anyhow::Context;
use portfolio_email_contracts::{
    ContentType, Email, EmailReceipt, EmailSendError, EmailService, ProviderError,
};
use portfolio_models::{email_address::EmailAddressWithName, Sensitive};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::http::HttpClient;

pub mod http;

pub const RESEND_API_ENDPOINT: &str = "https://api.resend.com/";

/// Email service backed by the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendEmailServiceImpl {
    config: Arc<ResendEmailServiceConfig>,
    client: HttpClient,
}

#[derive(Debug, Clone)]
pub struct ResendEmailServiceConfig {
    /// Without an api key every send fails with [`EmailSendError::NotConfigured`].
    pub api_key: Option<Sensitive<String>>,
    pub from: EmailAddressWithName,
    /// Base url of the api, must end with a `/`.
    pub endpoint: Url,
}

impl ResendEmailServiceImpl {
    pub fn new(config: ResendEmailServiceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config: config.into(),
            client: HttpClient::new()?,
        })
    }
}

impl EmailService for ResendEmailServiceImpl {
    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn send(&self, email: Email) -> Result<EmailReceipt, EmailSendError> {
        let Some(api_key) = &self.config.api_key else {
            return Err(EmailSendError::NotConfigured);
        };

        let (html, text) = match email.content_type {
            ContentType::Html => (Some(email.body), None),
            ContentType::Text => (None, Some(email.body)),
        };

        let request = SendEmailRequest {
            from: self.config.from.to_string(),
            to: vec![email.recipient.to_string()],
            reply_to: email.reply_to.map(|reply_to| reply_to.to_string()),
            subject: email.subject,
            html,
            text,
        };

        let url = self
            .config
            .endpoint
            .join("emails")
            .context("Failed to build email provider url")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&**api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to email provider")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response from email provider")?;

        if !status.is_success() {
            return Err(EmailSendError::Rejected(provider_error(
                status.as_u16(),
                &body,
            )));
        }

        let SendEmailResponse { id } = serde_json::from_str(&body)
            .context("Failed to parse response from email provider")?;
        debug!(%id, "email accepted by provider");

        Ok(EmailReceipt { id })
    }
}

fn provider_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { name, message }) => ProviderError {
            status,
            name,
            message,
        },
        Err(_) => ProviderError {
            status,
            name: "unknown_error".into(),
            message: body.trim().into(),
        },
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    name: String,
    message: String,
}
