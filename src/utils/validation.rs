//! Ordered field validation.
//!
//! Rule lists are declared separately from the stored records so each request
//! shape can be checked on its own. Violations come back in rule order, at most
//! one per field, and [`normalize`] turns a storage failure into the flat
//! message list returned to clients.

use crate::db::StoreError;

/// What went wrong with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    Empty,
    Format,
    Mismatch,
    Unique,
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }

    pub fn unique(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, ViolationKind::Unique, message)
    }
}

/// Anything whose fields can be looked up by their wire name
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    Required {
        missing: &'static str,
        empty: &'static str,
    },
    Email(&'static str),
    /// Only checked when both fields are supplied.
    Matches {
        other: &'static str,
        message: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: &'static str,
    pub check: Check,
}

impl Rule {
    pub const fn required(field: &'static str, missing: &'static str, empty: &'static str) -> Self {
        Self {
            field,
            check: Check::Required { missing, empty },
        }
    }

    pub const fn email(field: &'static str, message: &'static str) -> Self {
        Self {
            field,
            check: Check::Email(message),
        }
    }

    pub const fn matches(field: &'static str, other: &'static str, message: &'static str) -> Self {
        Self {
            field,
            check: Check::Matches { other, message },
        }
    }

    fn apply<S: FieldSource + ?Sized>(&self, source: &S) -> Option<FieldViolation> {
        let value = source.field(self.field);

        match self.check {
            Check::Required { missing, empty } => match value {
                None => Some(FieldViolation::new(self.field, ViolationKind::Missing, missing)),
                Some(v) if v.trim().is_empty() => {
                    Some(FieldViolation::new(self.field, ViolationKind::Empty, empty))
                }
                Some(_) => None,
            },
            Check::Email(message) => value
                .filter(|v| !v.trim().is_empty() && !looks_like_email(v))
                .map(|_| FieldViolation::new(self.field, ViolationKind::Format, message)),
            Check::Matches { other, message } => match (value, source.field(other)) {
                (Some(a), Some(b)) if a != b => Some(FieldViolation::new(
                    self.field,
                    ViolationKind::Mismatch,
                    message,
                )),
                _ => None,
            },
        }
    }
}

/// Run `rules` in order against `source`.
pub fn validate<S: FieldSource + ?Sized>(rules: &[Rule], source: &S) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = Vec::new();

    for rule in rules {
        if violations.iter().any(|v| v.field == rule.field) {
            continue;
        }
        if let Some(violation) = rule.apply(source) {
            violations.push(violation);
        }
    }

    violations
}

/// Flatten violations into client-facing messages, preserving order.
pub fn messages(violations: &[FieldViolation]) -> Vec<String> {
    violations.iter().map(|v| v.message.clone()).collect()
}

/// Convert a storage validation failure into messages. Any other storage
/// failure is handed back untouched.
pub fn normalize(error: StoreError) -> Result<Vec<String>, StoreError> {
    match error {
        StoreError::Validation(violations) => Ok(messages(&violations)),
        other => Err(other),
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
