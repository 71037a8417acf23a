//! Option schemas and the coercion routine that applies them.
//!
//! Every section kind declares a static table of [`OptionSpec`]s. Raw
//! values (as parsed from YAML) pass through [`instantiate`] exactly once,
//! at construction, and come out as an [`Options`] record in which every
//! declared field is present and type-correct.

use std::fmt;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Declared value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Str,
    Int,
    Bool,
    List,
}

impl OptionType {
    fn label(self) -> &'static str {
        match self {
            OptionType::Str => "a string",
            OptionType::Int => "an integer",
            OptionType::Bool => "a boolean",
            OptionType::List => "a list of strings",
        }
    }
}

/// Value applied when an option is absent from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Field stays unset.
    Unset,
    Bool(bool),
    Int(i64),
    EmptyList,
}

/// One declared option of a section schema.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub required: bool,
    pub ty: OptionType,
    pub default: FieldDefault,
}

impl OptionSpec {
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            ty: OptionType::Str,
            default: FieldDefault::Unset,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            ty: OptionType::Int,
            default: FieldDefault::Unset,
        }
    }

    pub const fn flag(name: &'static str, default: bool) -> Self {
        Self {
            name,
            required: false,
            ty: OptionType::Bool,
            default: FieldDefault::Bool(default),
        }
    }

    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            ty: OptionType::List,
            default: FieldDefault::Unset,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_int(mut self, value: i64) -> Self {
        self.default = FieldDefault::Int(value);
        self
    }

    pub const fn default_empty(mut self) -> Self {
        self.default = FieldDefault::EmptyList;
        self
    }

    fn default_value(&self) -> Option<OptionValue> {
        match self.default {
            FieldDefault::Unset => None,
            FieldDefault::Bool(b) => Some(OptionValue::Bool(b)),
            FieldDefault::Int(n) => Some(OptionValue::Int(n)),
            FieldDefault::EmptyList => Some(OptionValue::List(Vec::new())),
        }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A coerced, type-correct option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => f.write_str(s),
            OptionValue::Int(n) => write!(f, "{n}"),
            OptionValue::Bool(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            OptionValue::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

/// Typed options of one section, in schema declaration order.
///
/// Every declared option has an entry; `None` means "unset and no default".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Options {
    entries: Vec<(String, Option<OptionValue>)>,
}

impl Options {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn string(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Some(OptionValue::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(OptionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Boolean option; unset reads as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(OptionValue::Bool(true)))
    }

    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        match self.get(name) {
            Some(OptionValue::List(items)) => Some(items.clone()),
            _ => None,
        }
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&OptionValue>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Validate and coerce `raw` against `schema`.
///
/// `section` names the section in error messages only.
pub fn instantiate(
    section: &str,
    schema: &[OptionSpec],
    raw: &Mapping,
) -> Result<Options, ValidationError> {
    for key in raw.keys() {
        let name = scalar_text(key).unwrap_or_default();
        if !schema.iter().any(|spec| spec.name == name) {
            return Err(ValidationError::UnknownOption {
                section: section.to_string(),
                option: name,
            });
        }
    }

    let mut entries = Vec::with_capacity(schema.len());
    for spec in schema {
        let value = match raw.get(spec.name) {
            None | Some(Value::Null) => None,
            Some(v) => Some(coerce(section, spec, v)?),
        };
        let value = match value {
            Some(v) => Some(v),
            None if spec.required => {
                return Err(ValidationError::MissingField {
                    section: section.to_string(),
                    option: spec.name.to_string(),
                });
            }
            None => spec.default_value(),
        };
        entries.push((spec.name.to_string(), value));
    }
    Ok(Options { entries })
}

fn coerce(section: &str, spec: &OptionSpec, raw: &Value) -> Result<OptionValue, ValidationError> {
    let invalid = || ValidationError::InvalidValue {
        section: section.to_string(),
        option: spec.name.to_string(),
        expected: spec.ty.label(),
        found: describe(raw),
    };

    match spec.ty {
        OptionType::Str => scalar_text(raw).map(OptionValue::Str).ok_or_else(invalid),
        OptionType::Int => match raw {
            Value::Number(n) => n.as_i64().map(OptionValue::Int).ok_or_else(invalid),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        },
        OptionType::Bool => match raw {
            Value::Bool(b) => Ok(OptionValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(OptionValue::Bool(false)),
                Some(1) => Ok(OptionValue::Bool(true)),
                _ => Err(invalid()),
            },
            Value::String(s) => parse_flag(s).map(OptionValue::Bool).ok_or_else(invalid),
            _ => Err(invalid()),
        },
        OptionType::List => match raw {
            Value::Sequence(items) => items
                .iter()
                .map(|item| scalar_text(item).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(OptionValue::List),
            // UCI allows a single scalar where a list is declared.
            other => scalar_text(other)
                .map(|s| OptionValue::List(vec![s]))
                .ok_or_else(invalid),
        },
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn describe(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("'{s}'"),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(_) => "a tagged value".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
