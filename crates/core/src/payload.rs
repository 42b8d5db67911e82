use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::ValidationError;

/// A tool payload decoded from the agent's raw argument string.
///
/// Tool arguments arrive as JSON text produced by a language model, so the
/// accessors treat "present" strictly: a field counts as supplied only when it
/// is there, non-null, and non-empty (blank strings, zero quantities, and
/// empty lists all read as missing).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|source| ValidationError::MalformedPayload(source.to_string()))?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ValidationError::MalformedPayload(format!(
                "expected a JSON object, found {}",
                type_name(&other)
            ))),
        }
    }

    pub fn from_object(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Non-blank string value, trimmed.
    pub fn text(&self, name: &str) -> Option<&str> {
        text_in(&self.fields, name)
    }

    pub fn required_text(&self, name: &'static str) -> Result<&str, ValidationError> {
        self.text(name).ok_or(ValidationError::MissingField(name))
    }

    /// Numeric value, accepting JSON numbers and numeric strings.
    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        decimal_in(&self.fields, name)
    }

    /// Non-empty array value.
    pub fn list(&self, name: &str) -> Option<&[Value]> {
        match self.fields.get(name) {
            Some(Value::Array(entries)) if !entries.is_empty() => Some(entries),
            _ => None,
        }
    }

    /// Non-empty object value.
    pub fn object(&self, name: &str) -> Option<&Map<String, Value>> {
        match self.fields.get(name) {
            Some(Value::Object(entries)) if !entries.is_empty() => Some(entries),
            _ => None,
        }
    }

    /// Boolean-ish value; numbers and numeric strings coerce the way ERP
    /// check-fields do (0 and "0" are off, anything else is on).
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.fields.get(name)? {
            Value::Bool(on) => Some(*on),
            Value::Number(number) => Some(number.as_f64().is_some_and(|n| n != 0.0)),
            Value::String(text) => match text.trim() {
                "" | "0" | "false" => Some(false),
                _ => Some(true),
            },
            _ => None,
        }
    }
}

pub(crate) fn text_in<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    match fields.get(name) {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        _ => None,
    }
}

pub(crate) fn decimal_in(fields: &Map<String, Value>, name: &str) -> Option<Decimal> {
    match fields.get(name)? {
        Value::Number(number) => number.to_string().parse().ok(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
