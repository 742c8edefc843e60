use std::future::Future;

use portfolio_models::email_address::EmailAddressWithName;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Return whether the credentials required to talk to the email provider
    /// are available.
    fn is_configured(&self) -> bool;

    /// Hand the email over to the provider for delivery.
    ///
    /// The provider is called exactly once. Failed sends are not retried.
    fn send(
        &self,
        email: Email,
    ) -> impl Future<Output = Result<EmailReceipt, EmailSendError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: EmailAddressWithName,
    pub subject: String,
    pub body: String,
    pub content_type: ContentType,
    pub reply_to: Option<EmailAddressWithName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Html,
}

/// Confirmation that the provider accepted an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    /// Provider-assigned id of the accepted email.
    pub id: String,
}

#[derive(Debug, Error)]
pub enum EmailSendError {
    #[error("No api key has been configured for the email provider.")]
    NotConfigured,
    /// The provider answered with an error object.
    #[error("The email provider rejected the email: {0}")]
    Rejected(ProviderError),
    /// The request could not be completed, e.g. because of a network failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} (status {status}): {message}")]
pub struct ProviderError {
    pub status: u16,
    pub name: String,
    pub message: String,
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_is_configured(mut self, result: bool) -> Self {
        self.expect_is_configured().return_const(result);
        self
    }

    pub fn with_send(mut self, email: Email, result: Result<EmailReceipt, EmailSendError>) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}
