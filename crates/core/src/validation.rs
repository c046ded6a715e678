use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Characters rejected inside a domain name.
const DOMAIN_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\x0b', '\x0c'];

pub const BLANK_MESSAGE: &str = "This field cannot be blank.";
pub const DOMAIN_WHITESPACE_MESSAGE: &str = "The domain name cannot contain any spaces or tabs.";

/// Custom rule run after the built-in required/length checks.
pub type Validator = fn(&str) -> Result<(), String>;

/// Declarative cleaning rules for one text column.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub max_length: usize,
    pub validators: &'static [Validator],
}

impl FieldSpec {
    /// Verbose name with its first letter capitalised, used in prompts.
    pub fn label(&self) -> String {
        let mut chars = self.verbose_name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Validation failure for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {}", messages.join("; "))]
pub struct ValidationError {
    pub field: &'static str,
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            messages: vec![message.into()],
        }
    }
}

/// Collection of field failures reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Returns `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Rejects domain names containing ASCII whitespace. Empty values pass; the
/// required check reports those.
pub fn validate_domain_name(value: &str) -> Result<(), String> {
    if value.contains(DOMAIN_WHITESPACE) {
        return Err(DOMAIN_WHITESPACE_MESSAGE.to_string());
    }
    Ok(())
}

/// Cleans a required text value against its field rules.
///
/// A blank value stops at the required check; otherwise the length limit and
/// every custom validator run and all of their messages are collected.
pub fn clean_char_field(field: &FieldSpec, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field.name, BLANK_MESSAGE));
    }

    let mut messages = Vec::new();
    let length = value.chars().count();
    if length > field.max_length {
        messages.push(format!(
            "Ensure this value has at most {} characters (it has {length}).",
            field.max_length
        ));
    }
    for validator in field.validators {
        if let Err(message) = validator(value) {
            messages.push(message);
        }
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            field: field.name,
            messages,
        })
    }
}
