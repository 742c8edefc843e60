use anyhow::Context;
use axum::http::HeaderValue;
use portfolio_api_rest::{AllowedOrigins, RestServerConfig};
use portfolio_config::{Config, DEFAULT_FROM, DEFAULT_RECIPIENT};
use portfolio_core_contact_impl::ContactFeatureConfig;
use portfolio_email_impl::ResendEmailServiceConfig;
use portfolio_models::email_address::EmailAddressWithName;
use tracing::{info, warn};
use types::{ContactFeature, Email, RestServer, Template};

pub mod types;

/// Wire up the rest server and all of its dependencies.
pub fn rest_server(config: &Config) -> anyhow::Result<RestServer> {
    let email = email_service(config)?;
    let template = Template::new()?;

    let contact_feature_config = ContactFeatureConfig {
        recipient: recipient(config)?.into(),
        reply_to_submitter: config.contact.reply_to_submitter,
    };
    let contact = ContactFeature::new(email, template, contact_feature_config);

    let rest_server_config = RestServerConfig {
        addr: config.http.address,
        allowed_origins: allowed_origins(&config.http.allowed_origins)?,
    };

    Ok(RestServer::new(rest_server_config, contact))
}

pub fn email_service(config: &Config) -> anyhow::Result<Email> {
    if config.email.api_key.is_some() {
        info!("Email provider api key is set");
    } else {
        warn!("Email provider api key is not set, contact messages cannot be delivered");
    }

    let from = match &config.email.from {
        Some(from) => from.clone(),
        None => {
            warn!("No sender address configured, falling back to {DEFAULT_FROM}");
            DEFAULT_FROM.parse()?
        }
    };

    Email::new(ResendEmailServiceConfig {
        api_key: config.email.api_key.clone(),
        from,
        endpoint: config.email.endpoint.clone(),
    })
    .context("Failed to create email client")
}

fn recipient(config: &Config) -> anyhow::Result<EmailAddressWithName> {
    match &config.contact.email {
        Some(recipient) => Ok(recipient.clone()),
        None => {
            warn!("No recipient address configured, falling back to {DEFAULT_RECIPIENT}");
            DEFAULT_RECIPIENT.parse().map_err(Into::into)
        }
    }
}

fn allowed_origins(origins: &[String]) -> anyhow::Result<AllowedOrigins> {
    if origins.is_empty() {
        return Ok(AllowedOrigins::None);
    }
    if origins.iter().any(|origin| origin == "*") {
        return Ok(AllowedOrigins::Any);
    }

    origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid allowed origin {origin:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()
        .map(AllowedOrigins::List)
}

#[cfg(test)]
mod tests {
    use portfolio_config::EnvOverrides;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn allowed_origins_none() {
        assert_eq!(allowed_origins(&[]).unwrap(), AllowedOrigins::None);
    }

    #[test]
    fn allowed_origins_any() {
        let origins = ["https://kennysk.dev".to_owned(), "*".to_owned()];
        assert_eq!(allowed_origins(&origins).unwrap(), AllowedOrigins::Any);
    }

    #[test]
    fn allowed_origins_list() {
        let origins = ["https://kennysk.dev".to_owned()];
        assert_eq!(
            allowed_origins(&origins).unwrap(),
            AllowedOrigins::List(vec![HeaderValue::from_static("https://kennysk.dev")])
        );
    }

    #[test]
    fn allowed_origins_invalid() {
        let origins = ["https://kennysk.dev\n".to_owned()];
        assert!(allowed_origins(&origins).is_err());
    }

    #[test]
    fn recipient_defaults() {
        let config = load(EnvOverrides::default());

        let result = recipient(&config).unwrap();

        assert_eq!(result.email(), DEFAULT_RECIPIENT);
    }

    #[test]
    fn recipient_from_config() {
        let config = load(EnvOverrides {
            recipient: Some("kenny@example.com".into()),
            ..Default::default()
        });

        let result = recipient(&config).unwrap();

        assert_eq!(result.email(), "kenny@example.com");
    }

    #[test]
    fn rest_server_without_api_key() {
        let config = load(EnvOverrides::default());

        let result = rest_server(&config);

        assert!(result.is_ok());
    }

    fn load(overrides: EnvOverrides) -> Config {
        portfolio_config::load_with_overrides(&[] as &[&str], overrides).unwrap()
    }
}
