use std::sync::Arc;

use portfolio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use portfolio_email_contracts::{ContentType, Email, EmailSendError, EmailService};
use portfolio_models::{contact::ContactMessage, email_address::EmailAddressWithName};
use portfolio_templates_contracts::{ContactMessageTemplate, TemplateService};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<Email, Template> {
    email: Email,
    template: Template,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    /// Mailbox which receives the contact messages.
    pub recipient: Arc<EmailAddressWithName>,
    /// Set the submitter's address as `Reply-To` so the message can be
    /// answered directly.
    pub reply_to_submitter: bool,
}

impl<EmailS, Template> ContactFeatureServiceImpl<EmailS, Template> {
    pub fn new(email: EmailS, template: Template, config: ContactFeatureConfig) -> Self {
        Self {
            email,
            template,
            config,
        }
    }
}

impl<EmailS, Template> ContactFeatureService for ContactFeatureServiceImpl<EmailS, Template>
where
    EmailS: EmailService,
    Template: TemplateService,
{
    fn is_configured(&self) -> bool {
        self.email.is_configured()
    }

    async fn send_message(&self, message: ContactMessage) -> Result<(), ContactSendMessageError> {
        let ContactMessage { author, content } = message;

        let subject = format!("Nuevo mensaje de contacto de {}", *author.name);
        let body = self.template.render(&ContactMessageTemplate {
            name: author.name.into_inner(),
            email: author.email.to_string(),
            message: content.into_inner(),
        })?;

        let email = Email {
            recipient: (*self.config.recipient).clone(),
            subject,
            body,
            content_type: ContentType::Html,
            reply_to: self.config.reply_to_submitter.then(|| author.email.into()),
        };

        match self.email.send(email).await {
            Ok(receipt) => {
                info!(email_id = %receipt.id, "relayed contact message");
                Ok(())
            }
            Err(EmailSendError::NotConfigured) => Err(ContactSendMessageError::NotConfigured),
            Err(EmailSendError::Rejected(err)) => {
                error!(
                    status = err.status,
                    name = %err.name,
                    "email provider rejected contact message: {}",
                    err.message
                );
                Err(ContactSendMessageError::Send)
            }
            Err(EmailSendError::Other(err)) => {
                error!("failed to send contact message: {err:#}");
                Err(ContactSendMessageError::Send)
            }
        }
    }
}
