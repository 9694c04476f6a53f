use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use bigdecimal::BigDecimal;
use serde_json::{Map, Value};

use super::SpecKind;
use crate::error::{PredicateError, SpecError};

type PredicateFn<T> = dyn Fn(&T) -> Result<(), PredicateError> + Send + Sync;

/// User check run on a decoded value once kind and constraints have passed.
///
/// Held behind an `Arc`, so specs stay cheap to clone and safe to share; the
/// closure itself must not carry mutable state.
pub struct Predicate<T: ?Sized>(Arc<PredicateFn<T>>);

impl<T: ?Sized + 'static> Predicate<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<(), PredicateError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn test(&self, value: &T) -> Result<(), PredicateError> {
        (self.0)(value)
    }

    /// Both must pass; `self` runs first.
    pub(crate) fn and(self, next: Predicate<T>) -> Self {
        Self::new(move |value: &T| {
            self.test(value)?;
            next.test(value)
        })
    }
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self { Self(Arc::clone(&self.0)) }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

pub(crate) fn push_predicate<T: ?Sized + 'static>(slot: &mut Option<Predicate<T>>, predicate: Predicate<T>) {
    *slot = Some(match slot.take() {
        Some(previous) => previous.and(predicate),
        None => predicate,
    });
}

/// Native value types a predicate can be written against, and the spec kinds
/// that decode into them.
pub trait PredicateTarget: 'static {
    const NAME: &'static str;

    fn attach(kind: &mut SpecKind, predicate: Predicate<Self>) -> Result<(), SpecError>;
}

macro_rules! primitive_target {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl PredicateTarget for $ty {
            const NAME: &'static str = $name;

            fn attach(kind: &mut SpecKind, predicate: Predicate<Self>) -> Result<(), SpecError> {
                match kind {
                    SpecKind::$variant(primitive) => {
                        push_predicate(&mut primitive.predicate, predicate);
                        Ok(())
                    }
                    other => Err(SpecError::PredicateKind { predicate: Self::NAME, spec: other.name() }),
                }
            }
        }
    };
}

primitive_target!(bool, Boolean, "boolean");
primitive_target!(i32, Integer, "integer");
primitive_target!(i64, Long, "long");
primitive_target!(BigInt, BigInteger, "big-integer");
primitive_target!(f64, Double, "double");
primitive_target!(BigDecimal, Decimal, "decimal");
primitive_target!(str, String, "string");
primitive_target!(DateTime<Utc>, Instant, "instant");
primitive_target!([u8], Binary, "binary");

impl PredicateTarget for [Value] {
    const NAME: &'static str = "array";

    fn attach(kind: &mut SpecKind, predicate: Predicate<Self>) -> Result<(), SpecError> {
        match kind {
            SpecKind::Array(array) => push_predicate(&mut array.predicate, predicate),
            SpecKind::Tuple(tuple) => push_predicate(&mut tuple.predicate, predicate),
            other => return Err(SpecError::PredicateKind { predicate: Self::NAME, spec: other.name() }),
        }
        Ok(())
    }
}

impl PredicateTarget for Map<String, Value> {
    const NAME: &'static str = "object";

    fn attach(kind: &mut SpecKind, predicate: Predicate<Self>) -> Result<(), SpecError> {
        match kind {
            SpecKind::Object(object) => push_predicate(&mut object.predicate, predicate),
            SpecKind::Map(map) => push_predicate(&mut map.predicate, predicate),
            other => return Err(SpecError::PredicateKind { predicate: Self::NAME, spec: other.name() }),
        }
        Ok(())
    }
}

/// A predicate over the raw value turns `any` into `any matching`.
impl PredicateTarget for Value {
    const NAME: &'static str = "any";

    fn attach(kind: &mut SpecKind, predicate: Predicate<Self>) -> Result<(), SpecError> {
        if matches!(kind, SpecKind::Any) {
            *kind = SpecKind::AnyMatching(predicate);
            return Ok(());
        }
        match kind {
            SpecKind::AnyMatching(existing) => *existing = existing.clone().and(predicate),
            other => return Err(SpecError::PredicateKind { predicate: Self::NAME, spec: other.name() }),
        }
        Ok(())
    }
}
