//! Ordered validation pipeline.
//!
//! A [`Pipeline`] holds named predicate/message pairs and evaluates them
//! against a candidate record in insertion order, stopping at the first
//! rule that does not hold.

use serde_json::{json, Map, Value};

/// Field name used for rules that span more than one field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        Self::new(NON_FIELD_ERRORS, message)
    }

    /// Response body in the `{"field": ["message"]}` shape.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert(self.field.to_string(), json!([self.message]));
        Value::Object(body)
    }
}

struct Rule<'a, T: ?Sized> {
    field: &'static str,
    message: String,
    check: Box<dyn Fn(&T) -> bool + 'a>,
}

pub struct Pipeline<'a, T: ?Sized> {
    rules: Vec<Rule<'a, T>>,
}

impl<'a, T: ?Sized> Default for Pipeline<'a, T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<'a, T: ?Sized> Pipeline<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; `check` returns `true` when the candidate is valid.
    pub fn rule<F>(mut self, field: &'static str, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.rules.push(Rule {
            field,
            message: message.into(),
            check: Box::new(check),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn validate(&self, candidate: &T) -> Result<(), ValidationError> {
        match self.rules.iter().find(|rule| !(rule.check)(candidate)) {
            Some(rule) => Err(ValidationError::new(rule.field, rule.message.clone())),
            None => Ok(()),
        }
    }
}

/// Shared text rule: non-blank and at most `max` characters.
pub fn text_within(value: &str, max: usize) -> bool {
    !value.trim().is_empty() && value.chars().count() <= max
}
