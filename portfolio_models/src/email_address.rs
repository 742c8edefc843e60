use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An email address (`local@domain`) which can actually be delivered to.
///
/// On top of the RFC 5322 syntax accepted by lettre, the domain must be a
/// dotted host name ending in an alphabetic top level domain of at least two
/// letters. Quoted local parts and ip literals are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct EmailAddress(lettre::Address);

/// An email address with an optional display name (`Name <local@domain>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressWithName(pub lettre::message::Mailbox);

#[derive(Debug, Error)]
pub enum EmailAddressError {
    #[error(transparent)]
    Syntax(#[from] lettre::address::AddressError),
    #[error("Quoted local parts are not supported.")]
    QuotedLocalPart,
    #[error("The domain must be a host name with a top level domain.")]
    Domain,
}

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl EmailAddressWithName {
    pub fn email(&self) -> &str {
        self.0.email.as_ref()
    }
}

impl From<EmailAddress> for EmailAddressWithName {
    fn from(value: EmailAddress) -> Self {
        Self(lettre::message::Mailbox::new(None, value.0))
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for EmailAddressWithName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EmailAddress {
    type Err = EmailAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = s.parse::<lettre::Address>()?;

        if address.user().starts_with('"') {
            return Err(EmailAddressError::QuotedLocalPart);
        }
        if !is_host_name(address.domain()) {
            return Err(EmailAddressError::Domain);
        }

        Ok(Self(address))
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for EmailAddressWithName {
    type Err = <lettre::message::Mailbox as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

fn is_host_name(domain: &str) -> bool {
    let Some((labels, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    tld.len() >= 2
        && tld.bytes().all(|b| b.is_ascii_alphabetic())
        && labels.split('.').all(|label| {
            label
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_alphanumeric())
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_email_address() {
        for (input, valid) in [
            ("ana@x.com", true),
            ("max.mustermann@example.de", true),
            ("ana+portfolio@mail.example.co.uk", true),
            ("bad", false),
            ("", false),
            ("@example.com", false),
            ("ana@", false),
            ("ana @x.com", false),
            ("ana@localhost", false),
            ("ana@x", false),
            ("ana@x.c", false),
            ("ana@x.c0m", false),
            ("ana@-x.com", false),
            ("\"a b\"@x.com", false),
            ("ana@[127.0.0.1]", false),
        ] {
            assert_eq!(input.parse::<EmailAddress>().is_ok(), valid, "{input:?}");
        }
    }

    #[test]
    fn deserialize_checks_domain() {
        assert!(serde_json::from_str::<EmailAddress>(r#""ana@x.com""#).is_ok());
        assert!(serde_json::from_str::<EmailAddress>(r#""ana@localhost""#).is_err());
    }

    #[test]
    fn parse_email_address_with_name() {
        let mailbox = "Portfolio Contact <onboarding@resend.dev>"
            .parse::<EmailAddressWithName>()
            .unwrap();
        assert_eq!(mailbox.email(), "onboarding@resend.dev");
        assert_eq!(mailbox.0.name.as_deref(), Some("Portfolio Contact"));

        let bare = "contact@example.com".parse::<EmailAddressWithName>().unwrap();
        assert_eq!(bare.email(), "contact@example.com");
        assert_eq!(bare.0.name, None);
    }
}
