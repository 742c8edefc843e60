use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use config::{File, FileFormat};
use portfolio_models::{email_address::EmailAddressWithName, Sensitive};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_CONFIG: &str = include_str!("../../config.toml");

/// Colon separated list of additional config files.
pub const CONFIG_PATHS_ENV: &str = "PORTFOLIO_CONFIG";
pub const API_KEY_ENV: &str = "RESEND_API_KEY";
pub const FROM_ENV: &str = "RESEND_FROM_EMAIL";
pub const RECIPIENT_ENV: &str = "SEND_TO_EMAIL";

/// Sender used if `email.from` is not set. Resend accepts this address for
/// every account.
pub const DEFAULT_FROM: &str = "Portfolio Contact <onboarding@resend.dev>";
/// Recipient used if `contact.email` is not set.
pub const DEFAULT_RECIPIENT: &str = "contact@example.com";

/// Load the config from the embedded defaults, the files listed in
/// `PORTFOLIO_CONFIG` and the environment overrides.
pub fn load() -> anyhow::Result<Config> {
    let paths = std::env::var(CONFIG_PATHS_ENV).unwrap_or_default();
    let paths = paths
        .split(':')
        .filter(|path| !path.is_empty())
        .collect::<Vec<_>>();

    load_with_overrides(&paths, EnvOverrides::from_env())
}

pub fn load_with_overrides(
    paths: &[impl AsRef<Path>],
    overrides: EnvOverrides,
) -> anyhow::Result<Config> {
    let sources = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    build(&sources, overrides)
}

fn build(sources: &[impl AsRef<str>], overrides: EnvOverrides) -> anyhow::Result<Config> {
    sources
        .iter()
        .fold(
            config::Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)),
            |builder, content| builder.add_source(File::from_str(content.as_ref(), FileFormat::Toml)),
        )
        .set_override_option("email.api_key", overrides.api_key)?
        .set_override_option("email.from", overrides.from)?
        .set_override_option("contact.email", overrides.recipient)?
        .build()?
        .try_deserialize::<Config>()
        .context("Failed to load config")
        .map(Config::without_empty_values)
}

/// Values taken from the environment which take precedence over every config
/// file. Empty values count as unset.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub recipient: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        Self {
            api_key: var(API_KEY_ENV),
            from: var(FROM_ENV),
            recipient: var(RECIPIENT_ENV),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub email: EmailConfig,
    pub contact: ContactConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub address: SocketAddr,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub api_key: Option<Sensitive<String>>,
    pub from: Option<EmailAddressWithName>,
    pub endpoint: Url,
    pub require_api_key: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub email: Option<EmailAddressWithName>,
    pub reply_to_submitter: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No api key for the email provider has been configured (set RESEND_API_KEY)")]
    MissingApiKey,
}

impl Config {
    /// Blank values in config files count as unset, like empty environment
    /// variables do.
    fn without_empty_values(mut self) -> Self {
        self.email.api_key = self
            .email
            .api_key
            .filter(|api_key| !api_key.trim().is_empty());
        self
    }

    /// Check the constraints which cannot be expressed by the config types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email.require_api_key && self.email.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use portfolio_utils::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = build(&[] as &[&str], EnvOverrides::default()).unwrap();

        assert_eq!(config.http.address, "127.0.0.1:8000".parse().unwrap());
        assert!(config.http.allowed_origins.is_empty());
        assert_eq!(config.email.api_key, None);
        assert_eq!(config.email.from, None);
        assert_eq!(config.email.endpoint.as_str(), "https://api.resend.com/");
        assert!(config.email.require_api_key);
        assert_eq!(config.contact.email, None);
        assert!(config.contact.reply_to_submitter);
    }

    #[test]
    fn default_constants_are_valid() {
        assert!(DEFAULT_FROM.parse::<EmailAddressWithName>().is_ok());
        assert!(DEFAULT_RECIPIENT.parse::<EmailAddressWithName>().is_ok());
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let sources = [
            r#"
            [http]
            address = "0.0.0.0:8080"
            allowed_origins = ["https://kennysk.dev"]

            [contact]
            email = "first@example.com"
            "#,
            r#"
            [contact]
            email = "second@example.com"
            reply_to_submitter = false
            "#,
        ];

        let config = build(&sources, EnvOverrides::default()).unwrap();

        assert_eq!(config.http.address, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.http.allowed_origins, ["https://kennysk.dev"]);
        assert_eq!(
            config.contact.email.unwrap().email(),
            "second@example.com"
        );
        assert!(!config.contact.reply_to_submitter);
    }

    #[test]
    fn env_overrides_win() {
        let sources = [r#"
            [email]
            api_key = "re_from_file"
            from = "file@example.com"
            "#];
        let overrides = EnvOverrides {
            api_key: Some("re_from_env".into()),
            from: Some("Kenny <hello@kennysk.dev>".into()),
            recipient: Some("kenny@example.com".into()),
        };

        let config = build(&sources, overrides).unwrap();

        assert_eq!(config.email.api_key.as_deref().map(String::as_str), Some("re_from_env"));
        assert_eq!(
            config.email.from.unwrap().to_string(),
            "Kenny <hello@kennysk.dev>"
        );
        assert_eq!(config.contact.email.unwrap().email(), "kenny@example.com");
    }

    #[test]
    fn invalid_from_address() {
        let overrides = EnvOverrides {
            from: Some("not an address".into()),
            ..Default::default()
        };

        let result = build(&[] as &[&str], overrides);

        assert!(result.is_err());
    }

    #[test]
    fn missing_file() {
        let result = load_with_overrides(&["/nonexistent/portfolio.toml"], EnvOverrides::default());

        assert!(result.is_err());
    }

    #[test]
    fn blank_api_key_in_file_is_unset() {
        let sources = ["[email]\napi_key = \"  \""];

        let config = build(&sources, EnvOverrides::default()).unwrap();

        assert_eq!(config.email.api_key, None);
        assert_matches!(config.validate(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn validate_requires_api_key() {
        let config = build(&[] as &[&str], EnvOverrides::default()).unwrap();

        assert_matches!(config.validate(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn validate_optional_api_key() {
        let sources = ["[email]\nrequire_api_key = false"];

        let config = build(&sources, EnvOverrides::default()).unwrap();

        assert_matches!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_ok() {
        let overrides = EnvOverrides {
            api_key: Some("re_123".into()),
            ..Default::default()
        };

        let config = build(&[] as &[&str], overrides).unwrap();

        assert_matches!(config.validate(), Ok(()));
    }

    #[test]
    fn api_key_is_redacted() {
        let overrides = EnvOverrides {
            api_key: Some("re_very_secret".into()),
            ..Default::default()
        };

        let config = build(&[] as &[&str], overrides).unwrap();

        assert!(!format!("{config:?}").contains("re_very_secret"));
    }
}
