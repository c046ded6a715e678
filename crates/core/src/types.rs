use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{
    clean_char_field, validate_domain_name, FieldSpec, ValidationError, ValidationErrors, Validator,
};

pub const DOMAIN_MAX_LENGTH: usize = 128;
pub const NAME_MAX_LENGTH: usize = 128;
pub const POLL_CONTENT_MAX_LENGTH: usize = 256;
pub const POLL_OPTION_MAX_LENGTH: usize = 256;

/// Cleaning rules for `Domain.domain`.
pub const DOMAIN_FIELD: FieldSpec = FieldSpec {
    name: "domain",
    verbose_name: "domain",
    max_length: DOMAIN_MAX_LENGTH,
    validators: &[validate_domain_name as Validator],
};

/// Cleaning rules for `Domain.name`.
pub const NAME_FIELD: FieldSpec = FieldSpec {
    name: "name",
    verbose_name: "name",
    max_length: NAME_MAX_LENGTH,
    validators: &[],
};

/// Cleaning rules for `Poll.content`.
pub const POLL_CONTENT_FIELD: FieldSpec = FieldSpec {
    name: "content",
    verbose_name: "content",
    max_length: POLL_CONTENT_MAX_LENGTH,
    validators: &[],
};

/// Cleaning rules for `PollOption.value`.
pub const POLL_OPTION_FIELD: FieldSpec = FieldSpec {
    name: "value",
    verbose_name: "value",
    max_length: POLL_OPTION_MAX_LENGTH,
    validators: &[],
};

/// A tenant, identified by the HTTP host it is served under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: i64,
    pub domain: String,
    pub name: String,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

/// Field values for creating or replacing a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInput {
    pub domain: String,
    pub name: String,
}

impl DomainInput {
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// Runs every field's cleaning rules and collects all failures.
    pub fn clean(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Err(err) = clean_char_field(&DOMAIN_FIELD, &self.domain) {
            errors.push(err);
        }
        if let Err(err) = clean_char_field(&NAME_FIELD, &self.name) {
            errors.push(err);
        }
        errors.into_result()
    }
}

/// A question owned by exactly one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub content: String,
    pub domain_id: i64,
}

impl fmt::Display for Poll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// One selectable answer of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: i64,
    pub poll_id: i64,
    pub value: String,
}

impl fmt::Display for PollOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Inline edit applied to the options of an existing poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionChange {
    Add { value: String },
    Rename { id: i64, value: String },
    Delete { id: i64 },
}

impl OptionChange {
    /// Validates the option value carried by the change, if any.
    pub fn clean(&self) -> Result<(), ValidationError> {
        match self {
            Self::Add { value } | Self::Rename { value, .. } => {
                clean_char_field(&POLL_OPTION_FIELD, value)
            }
            Self::Delete { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_identifying_field() {
        let domain = Domain {
            id: 1,
            domain: "example.com".to_string(),
            name: "Example".to_string(),
        };
        assert_eq!(domain.to_string(), "example.com");

        let poll = Poll {
            id: 2,
            content: "Tabs or spaces?".to_string(),
            domain_id: 1,
        };
        assert_eq!(poll.to_string(), "Tabs or spaces?");
    }

    #[test]
    fn domain_input_reports_every_field() {
        let errors = DomainInput::new("bad domain", "").clean().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|err| err.field).collect();
        assert_eq!(fields, vec!["domain", "name"]);
    }

    #[test]
    fn domain_serializes_as_flat_object() {
        let domain = Domain {
            id: 7,
            domain: "polls.test".to_string(),
            name: "Polls".to_string(),
        };
        let value = serde_json::to_value(&domain).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"id": 7, "domain": "polls.test", "name": "Polls"})
        );
    }

    #[test]
    fn delete_change_needs_no_value() {
        assert!(OptionChange::Delete { id: 3 }.clean().is_ok());
        assert!(OptionChange::Add {
            value: String::new()
        }
        .clean()
        .is_err());
    }
}
