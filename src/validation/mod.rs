//! Validation gate for inbound resource payloads.
//!
//! A payload is checked against the writable fields of a [`ResourceSchema`]
//! before anything reaches the repository. Unrecognized keys and system
//! columns are dropped; the surviving fields come back as a [`Payload`].

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use thiserror::Error;

use crate::database::schema::{FieldKind, FieldSpec, ResourceSchema};
use crate::database::store::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Required fields must be present
    Create,
    /// Any non-empty subset of writable fields
    Patch,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Payload must be a JSON object")]
    NotAnObject,

    #[error("Payload contains no recognized {kind} fields")]
    NoRecognizedFields { kind: &'static str },

    #[error("Invalid {kind} payload")]
    InvalidFields {
        kind: &'static str,
        field_errors: BTreeMap<String, String>,
    },
}

impl ValidationError {
    pub fn field_errors(&self) -> HashMap<String, String> {
        match self {
            ValidationError::InvalidFields { field_errors, .. } => field_errors
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => HashMap::new(),
        }
    }
}

/// Writable fields that passed the gate
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(Row);

impl Payload {
    pub fn fields(&self) -> &Row {
        &self.0
    }

    pub fn into_row(self) -> Row {
        self.0
    }
}

pub fn validate_create(payload: &Value, schema: &ResourceSchema) -> Result<Payload, ValidationError> {
    validate(payload, schema, Mode::Create)
}

pub fn validate_patch(payload: &Value, schema: &ResourceSchema) -> Result<Payload, ValidationError> {
    validate(payload, schema, Mode::Patch)
}

pub fn validate(payload: &Value, schema: &ResourceSchema, mode: Mode) -> Result<Payload, ValidationError> {
    let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let mut accepted = Row::new();
    let mut field_errors = BTreeMap::new();

    for (key, value) in object {
        let Some(spec) = schema.field(key) else {
            tracing::debug!("Dropping unrecognized {} field '{}'", schema.kind, key);
            continue;
        };
        match check_field(spec, value) {
            Ok(()) => {
                accepted.insert(key.clone(), value.clone());
            }
            Err(msg) => {
                field_errors.insert(key.clone(), msg);
            }
        }
    }

    if accepted.is_empty() && field_errors.is_empty() {
        return Err(ValidationError::NoRecognizedFields { kind: schema.kind });
    }

    if mode == Mode::Create {
        for spec in schema.required_fields() {
            if !object.contains_key(spec.name) {
                field_errors.insert(spec.name.to_string(), "This field is required".to_string());
            }
        }
    }

    if !field_errors.is_empty() {
        return Err(ValidationError::InvalidFields {
            kind: schema.kind,
            field_errors,
        });
    }

    Ok(Payload(accepted))
}

fn check_field(spec: &FieldSpec, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return if spec.nullable {
            Ok(())
        } else {
            Err("Must not be null".to_string())
        };
    }

    match spec.kind {
        FieldKind::Text { max_len } => {
            let s = value.as_str().ok_or_else(|| "Must be a string".to_string())?;
            if spec.required && s.trim().is_empty() {
                return Err("Must not be empty".to_string());
            }
            if s.chars().count() > max_len {
                return Err(format!("Must be at most {} characters", max_len));
            }
            Ok(())
        }
        FieldKind::Email => {
            let s = value.as_str().ok_or_else(|| "Must be a string".to_string())?;
            if s.chars().count() > 150 {
                return Err("Must be at most 150 characters".to_string());
            }
            if !looks_like_email(s) {
                return Err(format!("Invalid email address: {}", s));
            }
            Ok(())
        }
        FieldKind::Reference => match value.as_i64() {
            Some(id) if id > 0 => Ok(()),
            _ => Err("Must be a positive integer".to_string()),
        },
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Contact, Message};
    use crate::database::schema::Resource;
    use serde_json::json;

    #[test]
    fn create_requires_name_and_email() {
        let err = validate_create(&json!({ "name": "Jest" }), &Contact::SCHEMA).unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("email"));
    }

    #[test]
    fn create_accepts_full_contact_and_drops_extras() {
        let payload = json!({
            "name": "Jest2",
            "email": "jest2@contacts.com",
            "phone": "22999626792",
            "accountId": 42,
            "status": "REMOVED",
            "street": "Rua Prefeito Jose Guida"
        });
        let valid = validate_create(&payload, &Contact::SCHEMA).unwrap();
        let keys: Vec<_> = valid.fields().keys().cloned().collect();
        assert_eq!(keys, vec!["email", "name", "phone"]);
    }

    #[test]
    fn unrecognized_only_payload_is_rejected_for_both_kinds() {
        let payload = json!({ "street": "Rua Prefeito Jose Guida" });
        for mode in [Mode::Create, Mode::Patch] {
            assert!(matches!(
                validate(&payload, &Contact::SCHEMA, mode),
                Err(ValidationError::NoRecognizedFields { kind: "contact" })
            ));
            assert!(matches!(
                validate(&payload, &Message::SCHEMA, mode),
                Err(ValidationError::NoRecognizedFields { kind: "message" })
            ));
        }
    }

    #[test]
    fn patch_skips_required_checks() {
        let valid = validate_patch(&json!({ "name": "Guilherme" }), &Contact::SCHEMA).unwrap();
        assert_eq!(valid.fields()["name"], "Guilherme");

        let valid = validate_patch(&json!({ "subject": "Subject alterado" }), &Message::SCHEMA).unwrap();
        assert_eq!(valid.fields().len(), 1);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            validate_patch(&json!(["name"]), &Contact::SCHEMA),
            Err(ValidationError::NotAnObject)
        ));
    }

    #[test]
    fn type_errors_are_reported_per_field() {
        let err = validate_create(
            &json!({ "name": 12, "email": "not-an-email", "phone": null }),
            &Contact::SCHEMA,
        )
        .unwrap_err();
        let errors = err.field_errors();
        assert_eq!(errors["name"], "Must be a string");
        assert!(errors["email"].starts_with("Invalid email address"));
        assert!(!errors.contains_key("phone"));
    }

    #[test]
    fn message_reference_must_be_positive_integer() {
        assert!(validate_create(&json!({ "accountEmailId": 0 }), &Message::SCHEMA).is_err());
        assert!(validate_create(&json!({ "accountEmailId": "7" }), &Message::SCHEMA).is_err());
        assert!(validate_create(&json!({ "accountEmailId": 7, "body": null }), &Message::SCHEMA).is_ok());
    }

    #[test]
    fn null_is_rejected_for_required_fields_on_patch() {
        let err = validate_patch(&json!({ "email": null }), &Contact::SCHEMA).unwrap_err();
        assert_eq!(err.field_errors()["email"], "Must not be null");
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("jest@contacts.com"));
        assert!(!looks_like_email("jest@contacts"));
        assert!(!looks_like_email("@contacts.com"));
        assert!(!looks_like_email("a b@contacts.com"));
        assert!(!looks_like_email("a@b@c.com"));
    }
}
