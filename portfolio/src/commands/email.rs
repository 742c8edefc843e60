use anyhow::Context;
use clap::Subcommand;
use portfolio_config::Config;
use portfolio_email_contracts::{ContentType, Email, EmailReceipt, EmailService};
use portfolio_models::email_address::EmailAddressWithName;
use tracing::info;

use crate::environment;

#[derive(Debug, Subcommand)]
pub enum EmailCommand {
    /// Test email deliverability
    Test { recipient: EmailAddressWithName },
}

impl EmailCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            EmailCommand::Test { recipient } => {
                let receipt = send_test_email(&config, recipient).await?;
                info!("Email has been accepted by the provider (id: {})", receipt.id);
                Ok(())
            }
        }
    }
}

async fn send_test_email(
    config: &Config,
    recipient: EmailAddressWithName,
) -> anyhow::Result<EmailReceipt> {
    let email_service = environment::email_service(config)?;

    email_service
        .send(Email {
            recipient,
            subject: "Email Deliverability Test".into(),
            body: "Email deliverability seems to be working!".into(),
            content_type: ContentType::Text,
            reply_to: None,
        })
        .await
        .context("Failed to send email")
}
