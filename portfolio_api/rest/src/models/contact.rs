use portfolio_models::{
    contact::{
        ContactMessage, ContactMessageAuthor, ContactMessageAuthorName, ContactMessageContent,
    },
    email_address::EmailAddress,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ApiContactValidationErrors {
    pub errors: ApiContactFieldErrors,
}

/// Error messages per field of the contact form. Fields without errors are
/// omitted.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApiContactFieldErrors {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub message: Vec<&'static str>,
}

struct FieldMessages {
    required: &'static str,
    not_a_string: &'static str,
    invalid: &'static str,
}

const NAME: FieldMessages = FieldMessages {
    required: "El nombre es obligatorio.",
    not_a_string: "El nombre debe ser texto.",
    invalid: "El nombre no puede estar vacío.",
};

const EMAIL: FieldMessages = FieldMessages {
    required: "El email es obligatorio.",
    not_a_string: "El email debe ser texto.",
    invalid: "El formato del correo no es válido.",
};

const MESSAGE: FieldMessages = FieldMessages {
    required: "El mensaje es obligatorio.",
    not_a_string: "El mensaje debe ser texto.",
    invalid: "El mensaje no puede estar vacío.",
};

/// Validate the json body of a contact request.
///
/// Every field is checked, so the error contains an entry for each invalid
/// field rather than just the first one. A body which is not a json object is
/// treated like an object without any fields.
pub fn validate_contact_message(body: &Value) -> Result<ContactMessage, ApiContactFieldErrors> {
    let name = string_field(body, "name", &NAME).and_then(|name| {
        ContactMessageAuthorName::try_new(name).map_err(|_| NAME.invalid)
    });
    let email = string_field(body, "email", &EMAIL)
        .and_then(|email| email.parse::<EmailAddress>().map_err(|_| EMAIL.invalid));
    let content = string_field(body, "message", &MESSAGE).and_then(|content| {
        ContactMessageContent::try_new(content).map_err(|_| MESSAGE.invalid)
    });

    match (name, email, content) {
        (Ok(name), Ok(email), Ok(content)) => Ok(ContactMessage {
            author: ContactMessageAuthor { name, email },
            content,
        }),
        (name, email, content) => Err(ApiContactFieldErrors {
            name: name.err().into_iter().collect(),
            email: email.err().into_iter().collect(),
            message: content.err().into_iter().collect(),
        }),
    }
}

fn string_field<'a>(
    body: &'a Value,
    key: &str,
    messages: &FieldMessages,
) -> Result<&'a str, &'static str> {
    match body.get(key) {
        None => Err(messages.required),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(messages.not_a_string),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn valid() {
        let result =
            validate_contact_message(&json!({"name": "Ana", "email": "ana@x.com", "message": "Hi"}))
                .unwrap();

        assert_eq!(*result.author.name, "Ana");
        assert_eq!(result.author.email.as_str(), "ana@x.com");
        assert_eq!(*result.content, "Hi");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let result = validate_contact_message(&json!({
            "name": "Ana",
            "email": "ana@x.com",
            "message": "Hi",
            "subject": 42,
        }));

        assert!(result.is_ok());
    }

    #[test]
    fn all_fields_invalid() {
        let result = validate_contact_message(&json!({"name": "", "email": "bad", "message": ""}));

        assert_eq!(
            result.unwrap_err(),
            ApiContactFieldErrors {
                name: vec!["El nombre no puede estar vacío."],
                email: vec!["El formato del correo no es válido."],
                message: vec!["El mensaje no puede estar vacío."],
            }
        );
    }

    #[test]
    fn only_invalid_fields_are_reported() {
        for email in [
            "ana@",
            "ana@localhost",
            "ana@x",
            "ana@x.c",
            "\"a b\"@x.com",
            "ana@[127.0.0.1]",
        ] {
            let result =
                validate_contact_message(&json!({"name": "Ana", "email": email, "message": "Hi"}));

            assert_eq!(
                result.unwrap_err(),
                ApiContactFieldErrors {
                    email: vec!["El formato del correo no es válido."],
                    ..Default::default()
                },
                "{email:?}"
            );
        }
    }

    #[test]
    fn missing_fields() {
        let result = validate_contact_message(&json!({"email": "ana@x.com"}));

        assert_eq!(
            result.unwrap_err(),
            ApiContactFieldErrors {
                name: vec!["El nombre es obligatorio."],
                message: vec!["El mensaje es obligatorio."],
                ..Default::default()
            }
        );
    }

    #[test]
    fn wrong_types() {
        let result =
            validate_contact_message(&json!({"name": 42, "email": null, "message": ["Hi"]}));

        assert_eq!(
            result.unwrap_err(),
            ApiContactFieldErrors {
                name: vec!["El nombre debe ser texto."],
                email: vec!["El email debe ser texto."],
                message: vec!["El mensaje debe ser texto."],
            }
        );
    }

    #[test]
    fn not_an_object() {
        for body in [json!(null), json!([]), json!("Ana"), json!(7)] {
            let result = validate_contact_message(&body);

            assert_eq!(
                result.unwrap_err(),
                ApiContactFieldErrors {
                    name: vec!["El nombre es obligatorio."],
                    email: vec!["El email es obligatorio."],
                    message: vec!["El mensaje es obligatorio."],
                }
            );
        }
    }

    #[test]
    fn serialize_omits_valid_fields() {
        let errors = ApiContactFieldErrors {
            email: vec!["El formato del correo no es válido."],
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(ApiContactValidationErrors { errors }).unwrap(),
            json!({"errors": {"email": ["El formato del correo no es válido."]}})
        );
    }
}
