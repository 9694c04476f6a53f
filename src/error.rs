use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::constraint::StringFormat;
use crate::path::JsonPath;

/// JSON kinds a spec can demand. Numeric kinds are told apart by what the literal decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsonKind {
    Boolean,
    Integer,
    Long,
    BigInteger,
    Double,
    Decimal,
    String,
    Instant,
    Binary,
    Object,
    Array,
}

impl JsonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonKind::Boolean => "boolean",
            JsonKind::Integer => "integer",
            JsonKind::Long => "long",
            JsonKind::BigInteger => "big-integer",
            JsonKind::Double => "double",
            JsonKind::Decimal => "decimal",
            JsonKind::String => "string",
            JsonKind::Instant => "instant",
            JsonKind::Binary => "binary",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque error produced by a user predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl PredicateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ------------------------------ Taxonomy --------------------------------- //

/// Every violation either derivation can report.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ErrorKind {
    #[error("value is required")]
    Required,
    #[error("null is not allowed")]
    NullNotAllowed,
    #[error("expected {expected}")]
    KindExpected { expected: JsonKind },
    #[error("expected constant {expected}")]
    ConstantMismatch { expected: Value },
    #[error("value is below minimum {minimum}")]
    BelowMinimum { minimum: String },
    #[error("value is above maximum {maximum}")]
    AboveMaximum { maximum: String },
    #[error("length is below minimum length {min_length}")]
    BelowMinLength { min_length: usize },
    #[error("length is above maximum length {max_length}")]
    AboveMaxLength { max_length: usize },
    #[error("value does not match pattern {pattern}")]
    PatternMismatch { pattern: String },
    #[error("value is not a valid {format}")]
    FormatMismatch { format: StringFormat },
    #[error("fewer than {min_items} items")]
    BelowMinItems { min_items: usize },
    #[error("more than {max_items} items")]
    AboveMaxItems { max_items: usize },
    #[error("duplicate items present")]
    DuplicateItems,
    #[error("expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("expected {expected} elements, found {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("{error}")]
    Predicate { error: PredicateError },
    #[error("{reason}")]
    Structural { reason: String },
    #[error("required key missing: {key}")]
    RequiredKeyMissing { key: String },
    #[error("unknown key: {key}")]
    UnknownKey { key: String },
    #[error("unresolved spec reference: {name}")]
    UnresolvedReference { name: String },
}

impl ErrorKind {
    pub fn kind(expected: JsonKind) -> Self {
        ErrorKind::KindExpected { expected }
    }

    pub fn structural(reason: impl Into<String>) -> Self {
        ErrorKind::Structural { reason: reason.into() }
    }

    /// True for schema wiring mistakes, as opposed to bad input data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ErrorKind::UnresolvedReference { .. })
    }

    /// True for range/shape/predicate checks run on an already decoded value.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            ErrorKind::BelowMinimum { .. }
                | ErrorKind::AboveMaximum { .. }
                | ErrorKind::BelowMinLength { .. }
                | ErrorKind::AboveMaxLength { .. }
                | ErrorKind::PatternMismatch { .. }
                | ErrorKind::FormatMismatch { .. }
                | ErrorKind::SizeMismatch { .. }
                | ErrorKind::Predicate { .. }
        )
    }
}

// ------------------------------ Verdicts --------------------------------- //

/// Whole-value error record: what was offered and why it was refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub value: Value,
    pub kind: ErrorKind,
}

impl Violation {
    pub fn new(value: Value, kind: ErrorKind) -> Self {
        Self { value, kind }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (got {})", self.kind, self.value)
    }
}

/// A violation tagged with where in the document it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub path: JsonPath,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn new(path: JsonPath, kind: ErrorKind) -> Self {
        Self { path, kind }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Outcome of validating a materialized value.
///
/// Objects and maps report every offending member (`Located`); everything else
/// answers for the value as a whole (`Single`).
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Single(Option<Violation>),
    Located(Vec<ValidationError>),
}

impl Verdict {
    pub fn ok() -> Self { Verdict::Single(None) }

    pub fn is_valid(&self) -> bool {
        match self {
            Verdict::Single(violation) => violation.is_none(),
            Verdict::Located(errors) => errors.is_empty(),
        }
    }

    pub fn error_count(&self) -> usize {
        match self {
            Verdict::Single(violation) => usize::from(violation.is_some()),
            Verdict::Located(errors) => errors.len(),
        }
    }

    pub fn first_kind(&self) -> Option<&ErrorKind> {
        match self {
            Verdict::Single(violation) => violation.as_ref().map(|v| &v.kind),
            Verdict::Located(errors) => errors.first().map(|e| &e.kind),
        }
    }

    /// Flatten into located errors; a single violation is placed at `path`.
    pub fn into_errors(self, path: &JsonPath) -> Vec<ValidationError> {
        match self {
            Verdict::Single(None) => Vec::new(),
            Verdict::Single(Some(violation)) => vec![ValidationError::new(path.clone(), violation.kind)],
            Verdict::Located(errors) => errors,
        }
    }
}

// ------------------------------- Parsing --------------------------------- //

/// First violation met while parsing; parsing never recovers from one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at {path} (offset {offset})")]
pub struct ParseError {
    pub offset: usize,
    pub path: JsonPath,
    pub kind: ErrorKind,
}

impl ParseError {
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { offset, path: JsonPath::root(), kind }
    }

    pub fn structural(reason: impl Into<String>, offset: usize) -> Self {
        Self::new(ErrorKind::structural(reason), offset)
    }

    /// Attach a location unless a deeper one is already recorded.
    pub fn at(mut self, path: &JsonPath) -> Self {
        if self.path.is_root() {
            self.path = path.clone();
        }
        self
    }
}

// ---------------------------- Construction ------------------------------- //

/// Raised while building a spec; never surfaces during validation or parsing.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("minimum {minimum} is greater than maximum {maximum}")]
    InvalidRange { minimum: String, maximum: String },

    #[error("bound {bound} cannot be ordered")]
    UnorderedBound { bound: String },

    #[error("min length {min_length} is greater than max length {max_length}")]
    InvalidLength { min_length: usize, max_length: usize },

    #[error("min items {min_items} is greater than max items {max_items}")]
    InvalidItems { min_items: usize, max_items: usize },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{kind} specs cannot be made nullable")]
    NullableNotAllowed { kind: &'static str },

    #[error("{constraint} constraint cannot be attached to a {spec} spec")]
    ConstraintKind { constraint: &'static str, spec: &'static str },

    #[error("{predicate} predicate cannot be attached to a {spec} spec")]
    PredicateKind { predicate: &'static str, spec: &'static str },

    #[error("field declared twice: {0}")]
    DuplicateField(String),

    #[error("required key is not a declared field: {0}")]
    UndeclaredRequiredKey(String),
}

/// Problems wiring named specs together.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("spec already registered: {0}")]
    DuplicateName(String),

    #[error("no spec registered under {0}")]
    UnknownName(String),

    #[error("spec {referenced_from} references unregistered spec {name}")]
    Unresolved { name: String, referenced_from: String },

    #[error("named specs only alias each other: {}", .0.join(" -> "))]
    AliasCycle(Vec<String>),

    #[error("a process-wide registry is already installed")]
    AlreadyInstalled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_flattens_single_violation_at_path() {
        let verdict = Verdict::Single(Some(Violation::new(Value::from(3), ErrorKind::NullNotAllowed)));
        let path = JsonPath::root().key("x");
        let errors = verdict.into_errors(&path);
        assert_eq!(errors, vec![ValidationError::new(path, ErrorKind::NullNotAllowed)]);
    }

    #[test]
    fn parse_error_keeps_deepest_path() {
        let inner = JsonPath::root().key("a").index(1);
        let err = ParseError::new(ErrorKind::DuplicateItems, 7)
            .at(&inner)
            .at(&JsonPath::root().key("a"));
        assert_eq!(err.path, inner);
        assert_eq!(err.to_string(), "duplicate items present at $.a[1] (offset 7)");
    }

    #[test]
    fn error_kind_serializes_with_tag() {
        let kind = ErrorKind::kind(JsonKind::BigInteger);
        assert_eq!(
            serde_json::to_value(&kind).unwrap(),
            serde_json::json!({"kind": "kind-expected", "expected": "big-integer"})
        );
    }

    #[test]
    fn only_unresolved_reference_is_configuration() {
        assert!(ErrorKind::UnresolvedReference { name: "n".into() }.is_configuration_error());
        assert!(!ErrorKind::Required.is_configuration_error());
        assert!(ErrorKind::BelowMinimum { minimum: "0".into() }.is_constraint());
        assert!(!ErrorKind::kind(JsonKind::Integer).is_constraint());
    }
}
