//! Explicit validation pass over request payloads.
//!
//! Payload types expose every field as optional so that a single pass can
//! report all violated constraints at once.

use crate::error::ApiError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    /// Required on create: the field must be present.
    pub fn required<T>(&mut self, field: &str, value: Option<&T>) {
        if value.is_none() {
            self.push(field, "is required");
        }
    }

    /// Text must be non-blank whenever it is present.
    pub fn not_blank(&mut self, field: &str, value: Option<&String>) {
        if value.is_some_and(|v| v.trim().is_empty()) {
            self.push(field, "must not be empty");
        }
    }

    pub fn range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(v) = value {
            if !v.is_finite() || v < min || v > max {
                self.push(field, format!("must be between {min} and {max}"));
            }
        }
    }

    pub fn at_least(&mut self, field: &str, value: Option<i64>, min: i64) {
        if let Some(v) = value {
            if v < min {
                self.push(field, format!("must be at least {min}"));
            }
        }
    }

    pub fn finite(&mut self, field: &str, value: Option<f64>) {
        if value.is_some_and(|v| !v.is_finite()) {
            self.push(field, "must be a finite number");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_violations() {
        let mut v = Violations::new();
        v.required::<String>("name", None);
        v.range("discount", Some(150.0), 1.0, 100.0);
        v.at_least("usageLimit", Some(0), 1);
        v.not_blank("code", Some(&"  ".to_string()));

        match v.into_result() {
            Err(ApiError::Validation(list)) => {
                let fields: Vec<_> = list.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, ["name", "discount", "usageLimit", "code"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn absent_optional_values_pass() {
        let mut v = Violations::new();
        v.range("discount", None, 1.0, 100.0);
        v.at_least("usageLimit", None, 1);
        v.not_blank("code", None);
        assert!(v.is_empty());
        assert!(v.into_result().is_ok());
    }
}
