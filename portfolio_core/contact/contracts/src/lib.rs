use std::future::Future;

use portfolio_models::contact::ContactMessage;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Return whether contact messages can be relayed at all, i.e. whether
    /// the email provider has been configured.
    fn is_configured(&self) -> bool;

    /// Relay a validated contact message to the site owner via email.
    ///
    /// Every call results in a separate email. Identical messages are not
    /// deduplicated.
    fn send_message(
        &self,
        message: ContactMessage,
    ) -> impl Future<Output = Result<(), ContactSendMessageError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactSendMessageError {
    #[error("The email provider has not been configured.")]
    NotConfigured,
    #[error("Failed to send message.")]
    Send,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_is_configured(mut self, result: bool) -> Self {
        self.expect_is_configured().return_const(result);
        self
    }

    pub fn with_send_message(
        mut self,
        message: ContactMessage,
        result: Result<(), ContactSendMessageError>,
    ) -> Self {
        self.expect_send_message()
            .once()
            .with(mockall::predicate::eq(message))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}
