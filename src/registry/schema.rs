//! Option schema for transforms

use crate::core::Options;
use crate::registry::TransformError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape and constraints of one option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionKind {
    Boolean,
    Integer { min: i64, max: i64 },
    Text,
    Choice { choices: Vec<String> },
}

/// Definition of a single transform option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Key in the options record
    pub key: String,

    /// Human-readable label
    pub label: String,

    #[serde(flatten)]
    pub kind: OptionKind,
}

impl OptionSpec {
    pub fn boolean(key: &str, label: &str) -> Self {
        Self::new(key, label, OptionKind::Boolean)
    }

    pub fn integer(key: &str, label: &str, min: i64, max: i64) -> Self {
        Self::new(key, label, OptionKind::Integer { min, max })
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, OptionKind::Text)
    }

    pub fn choice(key: &str, label: &str, choices: &[&str]) -> Self {
        Self::new(
            key,
            label,
            OptionKind::Choice {
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    fn new(key: &str, label: &str, kind: OptionKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
        }
    }

    /// Check a value against this option's constraints
    pub fn check(&self, value: &Value) -> Result<(), TransformError> {
        match &self.kind {
            OptionKind::Boolean => {
                if !value.is_boolean() {
                    return Err(TransformError::invalid_option(&self.key, "expected a boolean"));
                }
            }
            OptionKind::Integer { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| TransformError::invalid_option(&self.key, "expected an integer"))?;
                if n < *min || n > *max {
                    return Err(TransformError::invalid_option(
                        &self.key,
                        format!("must be between {} and {}", min, max),
                    ));
                }
            }
            OptionKind::Text => {
                if !value.is_string() {
                    return Err(TransformError::invalid_option(&self.key, "expected a string"));
                }
            }
            OptionKind::Choice { choices } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| TransformError::invalid_option(&self.key, "expected a string"))?;
                if !choices.iter().any(|c| c == s) {
                    return Err(TransformError::invalid_option(
                        &self.key,
                        format!("must be one of: {}", choices.join(", ")),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Validate every option the schema knows about. Unknown keys are ignored.
pub fn check_options(schema: &[OptionSpec], options: &Options) -> Result<(), TransformError> {
    for spec in schema {
        if let Some(value) = options.get(&spec.key) {
            spec.check(value)?;
        }
    }
    Ok(())
}

pub fn option_bool(options: &Options, key: &str, default: bool) -> bool {
    options.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn option_integer(options: &Options, key: &str, default: i64) -> i64 {
    options.get(key).and_then(Value::as_i64).unwrap_or(default)
}

pub fn option_text<'a>(options: &'a Options, key: &str, default: &'a str) -> &'a str {
    options.get(key).and_then(Value::as_str).unwrap_or(default)
}
