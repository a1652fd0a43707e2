//! Input/output contract validation for the execution pipeline.
//!
//! The pipeline validates through the [`Validator`] capability rather than a
//! concrete library. [`SchemaValidator`] backs it with the `validator`
//! crate's derive rules; [`RuleSet`] wraps caller-supplied custom-field
//! checks; [`ValidatorChain`] composes both.

use validator::{Validate, ValidationErrors};

use crate::error::DomainError;

/// A single violated field with its message.
#[derive(Debug, Clone, PartialEq, Eq)]
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

/// Validation capability over a contract type.
pub trait Validator<T>: Send + Sync {
    fn validate(&self, value: &T) -> Result<(), Vec<FieldViolation>>;
}

/// Validator backed by the `validator` crate's derive rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl<T: Validate> Validator<T> for SchemaValidator {
    fn validate(&self, value: &T) -> Result<(), Vec<FieldViolation>> {
        match Validate::validate(value) {
            Ok(()) => Ok(()),
            Err(errors) => Err(collect_field_violations(&errors)),
        }
    }
}

/// Validator that accepts every value. The default output contract: shape
/// is already guaranteed by the output type itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl<T> Validator<T> for AlwaysValid {
    fn validate(&self, _value: &T) -> Result<(), Vec<FieldViolation>> {
        Ok(())
    }
}

/// Ad-hoc rule set built from a closure, for caller-supplied custom-field
/// checks attached to a use case.
pub struct RuleSet<T> {
    check: Box<dyn Fn(&T) -> Result<(), Vec<FieldViolation>> + Send + Sync>,
}

impl<T> RuleSet<T> {
    pub fn new(
        check: impl Fn(&T) -> Result<(), Vec<FieldViolation>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            check: Box::new(check),
        }
    }
}

impl<T> Validator<T> for RuleSet<T> {
    fn validate(&self, value: &T) -> Result<(), Vec<FieldViolation>> {
        (self.check)(value)
    }
}

/// Runs validators in order; the first failing validator wins.
pub struct ValidatorChain<T> {
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T> ValidatorChain<T> {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn with(mut self, validator: impl Validator<T> + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl<T> Default for ValidatorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator<T> for ValidatorChain<T> {
    fn validate(&self, value: &T) -> Result<(), Vec<FieldViolation>> {
        for validator in &self.validators {
            validator.validate(value)?;
        }
        Ok(())
    }
}

/// Fail-fast mapping: the first violation becomes the field-scoped
/// validation error returned by the pipeline.
pub fn first_violation_error(violations: Vec<FieldViolation>) -> DomainError {
    match violations.into_iter().next() {
        Some(violation) => DomainError::validation_field(violation.field, violation.message),
        None => DomainError::validation("Validation failed"),
    }
}

fn collect_field_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldViolation {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field)),
            })
        })
        .collect();
    // field_errors() iterates in hash order; sort so the first reported
    // violation is deterministic.
    violations.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
    violations
}
