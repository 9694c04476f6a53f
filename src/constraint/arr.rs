use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde_json::{Map, Value};

use super::Constraint;
use crate::error::{ErrorKind, SpecError};

/// Size bounds and uniqueness for arrays (and for the values of maps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayConstraint {
    min_items: Option<usize>,
    max_items: Option<usize>,
    unique_items: bool,
}

impl ArrayConstraint {
    pub fn new(
        min_items: Option<usize>,
        max_items: Option<usize>,
        unique_items: bool,
    ) -> Result<Self, SpecError> {
        if let (Some(min_items), Some(max_items)) = (min_items, max_items) {
            if max_items < min_items {
                return Err(SpecError::InvalidItems { min_items, max_items });
            }
        }
        Ok(Self { min_items, max_items, unique_items })
    }

    pub fn items(min_items: usize, max_items: usize) -> Result<Self, SpecError> {
        Self::new(Some(min_items), Some(max_items), false)
    }

    pub fn unique() -> Self {
        Self { unique_items: true, ..Self::default() }
    }

    pub fn min_items(&self) -> Option<usize> { self.min_items }

    pub fn max_items(&self) -> Option<usize> { self.max_items }

    pub fn unique_items(&self) -> bool { self.unique_items }

    pub(crate) fn check_min(&self, len: usize) -> Option<ErrorKind> {
        match self.min_items {
            Some(min_items) if len < min_items => Some(ErrorKind::BelowMinItems { min_items }),
            _ => None,
        }
    }

    pub(crate) fn check_max(&self, len: usize) -> Option<ErrorKind> {
        match self.max_items {
            Some(max_items) if len > max_items => Some(ErrorKind::AboveMaxItems { max_items }),
            _ => None,
        }
    }

    fn check_items<'a>(&self, len: usize, items: impl Iterator<Item = &'a Value>) -> Option<ErrorKind> {
        if let Some(kind) = self.check_min(len).or_else(|| self.check_max(len)) {
            return Some(kind);
        }
        if self.unique_items {
            let mut seen = ItemSet::default();
            for item in items {
                if !seen.insert(item) {
                    return Some(ErrorKind::DuplicateItems);
                }
            }
        }
        None
    }
}

impl Constraint<[Value]> for ArrayConstraint {
    fn check(&self, value: &[Value]) -> Option<ErrorKind> {
        self.check_items(value.len(), value.iter())
    }
}

impl Constraint<Map<String, Value>> for ArrayConstraint {
    fn check(&self, value: &Map<String, Value>) -> Option<ErrorKind> {
        self.check_items(value.len(), value.values())
    }
}

/// Exact byte length for fixed-length binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLength(pub usize);

impl Constraint<[u8]> for FixedLength {
    fn check(&self, value: &[u8]) -> Option<ErrorKind> {
        (value.len() != self.0).then(|| ErrorKind::SizeMismatch { expected: self.0, actual: value.len() })
    }
}

// ------------------------------ Uniqueness ------------------------------- //

/// Hashable view of a JSON value: numerically equal numbers collide, object
/// key order is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum ValueKey {
    Null,
    Bool(bool),
    /// Exact `digits * 10^-scale` with trailing zeros stripped.
    Number(BigInt, i64),
    /// Literal that does not decode exactly; compared as written.
    Literal(String),
    Str(String),
    Arr(Vec<ValueKey>),
    Obj(BTreeMap<String, ValueKey>),
}

fn key_of(value: &Value) -> ValueKey {
    match value {
        Value::Null => ValueKey::Null,
        Value::Bool(b) => ValueKey::Bool(*b),
        Value::Number(n) => {
            let text = n.to_string();
            match BigDecimal::from_str(&text) {
                Ok(exact) => {
                    let (digits, scale) = exact.normalized().into_bigint_and_exponent();
                    ValueKey::Number(digits, scale)
                }
                Err(_) => ValueKey::Literal(text),
            }
        }
        Value::String(s) => ValueKey::Str(s.clone()),
        Value::Array(xs) => ValueKey::Arr(xs.iter().map(key_of).collect()),
        Value::Object(m) => ValueKey::Obj(m.iter().map(|(k, v)| (k.clone(), key_of(v))).collect()),
    }
}

/// Incremental duplicate detection, shared by validation and streaming parsing.
#[derive(Debug, Default)]
pub(crate) struct ItemSet {
    seen: HashSet<ValueKey>,
}

impl ItemSet {
    /// False when an equal item was already inserted.
    pub(crate) fn insert(&mut self, value: &Value) -> bool {
        self.seen.insert(key_of(value))
    }

    /// Forget an item whose slot was overwritten (a repeated map key).
    pub(crate) fn remove(&mut self, value: &Value) {
        self.seen.remove(&key_of(value));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn max_below_min_fails_at_construction() {
        assert!(matches!(
            ArrayConstraint::items(3, 1),
            Err(SpecError::InvalidItems { min_items: 3, max_items: 1 })
        ));
    }

    #[test]
    fn size_bounds() {
        let c = ArrayConstraint::items(1, 2).unwrap();
        let empty: Vec<Value> = vec![];
        assert_eq!(c.check(empty.as_slice()), Some(ErrorKind::BelowMinItems { min_items: 1 }));
        let three = vec![json!(1), json!(2), json!(3)];
        assert_eq!(c.check(three.as_slice()), Some(ErrorKind::AboveMaxItems { max_items: 2 }));
    }

    #[test]
    fn numerically_equal_numbers_are_duplicates() {
        let c = ArrayConstraint::unique();
        let items: Vec<Value> = serde_json::from_str("[1, 2, 1.0]").unwrap();
        assert_eq!(c.check(items.as_slice()), Some(ErrorKind::DuplicateItems));
    }

    #[test]
    fn object_key_order_does_not_matter_for_uniqueness() {
        let c = ArrayConstraint::unique();
        let items: Vec<Value> = serde_json::from_str(r#"[{"a":1,"b":2},{"b":2,"a":1}]"#).unwrap();
        assert_eq!(c.check(items.as_slice()), Some(ErrorKind::DuplicateItems));
        let items = vec![json!({"a": 1}), json!({"a": 2})];
        assert_eq!(c.check(items.as_slice()), None);
    }

    #[test]
    fn huge_integers_are_not_collapsed() {
        let c = ArrayConstraint::unique();
        let items: Vec<Value> =
            serde_json::from_str("[123456789012345678901234567890123456789012, 123456789012345678901234567890123456789013]")
                .unwrap();
        assert_eq!(c.check(items.as_slice()), None);
    }

    #[test]
    fn numbers_compare_exactly() {
        let c = ArrayConstraint::unique();
        let close: Vec<Value> = serde_json::from_str("[0.1, 0.10000000000000001]").unwrap();
        assert_eq!(c.check(close.as_slice()), None);

        let equal: Vec<Value> =
            serde_json::from_str("[1e40, 10000000000000000000000000000000000000000]").unwrap();
        assert_eq!(c.check(equal.as_slice()), Some(ErrorKind::DuplicateItems));

        let zeros: Vec<Value> = serde_json::from_str("[0, -0.0, 0e5]").unwrap();
        assert_eq!(c.check(&zeros[..2]), Some(ErrorKind::DuplicateItems));
        assert_eq!(c.check(&zeros[1..]), Some(ErrorKind::DuplicateItems));
    }

    #[test]
    fn removed_items_can_return() {
        let mut seen = ItemSet::default();
        assert!(seen.insert(&json!(1)));
        seen.remove(&json!(1.0));
        assert!(seen.insert(&json!(1)));
        assert!(!seen.insert(&json!(1)));
    }

    #[test]
    fn map_values_are_checked() {
        let c = ArrayConstraint::new(None, Some(1), false).unwrap();
        let map = json!({"a": 1, "b": 2});
        assert_eq!(
            c.check(map.as_object().unwrap()),
            Some(ErrorKind::AboveMaxItems { max_items: 1 })
        );
    }

    #[test]
    fn fixed_length() {
        assert_eq!(FixedLength(2).check(&[1u8, 2][..]), None);
        assert_eq!(
            FixedLength(2).check(&[1u8][..]),
            Some(ErrorKind::SizeMismatch { expected: 2, actual: 1 })
        );
    }
}
