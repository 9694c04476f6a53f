//! The closed family of spec kinds.
//!
//! A `Spec` is built once, then shared: validation (`validate.rs`) and parser
//! derivation (`parse.rs`) both dispatch on the same `SpecKind` with
//! exhaustive matches, so a new kind cannot be added to one path only.
pub mod object;
pub mod predicate;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use bigdecimal::BigDecimal;
use serde_json::{Map, Value};

use crate::constraint::{
    ArrayConstraint, BigIntConstraint, DecimalConstraint, DoubleConstraint, FixedLength,
    InstantConstraint, IntConstraint, LongConstraint, StringConstraint, Unconstrained,
};
use crate::error::{PredicateError, SpecError};

pub use object::{ObjectBuilder, ObjectSpec};
pub use predicate::{Predicate, PredicateTarget};

// -------------------------------- Kinds ---------------------------------- //

/// Optional constraint plus optional predicate over a decoded native `T`.
pub struct Primitive<T: ?Sized, C> {
    pub(crate) constraint: Option<C>,
    pub(crate) predicate: Option<Predicate<T>>,
}

impl<T: ?Sized, C> Primitive<T, C> {
    pub fn constraint(&self) -> Option<&C> { self.constraint.as_ref() }

    pub fn predicate(&self) -> Option<&Predicate<T>> { self.predicate.as_ref() }
}

impl<T: ?Sized, C> Default for Primitive<T, C> {
    fn default() -> Self { Self { constraint: None, predicate: None } }
}

impl<T: ?Sized, C: Clone> Clone for Primitive<T, C> {
    fn clone(&self) -> Self {
        Self { constraint: self.constraint.clone(), predicate: self.predicate.clone() }
    }
}

impl<T: ?Sized, C: fmt::Debug> fmt::Debug for Primitive<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("constraint", &self.constraint)
            .field("predicate", &self.predicate)
            .finish()
    }
}

/// Homogeneous array: every element matches `element`.
#[derive(Debug, Clone)]
pub struct ArraySpec {
    pub(crate) element: Spec,
    pub(crate) constraint: Option<ArrayConstraint>,
    pub(crate) predicate: Option<Predicate<[Value]>>,
}

impl ArraySpec {
    pub fn element(&self) -> &Spec { &self.element }

    pub fn constraint(&self) -> Option<&ArrayConstraint> { self.constraint.as_ref() }
}

/// Fixed-arity positional array.
#[derive(Debug, Clone)]
pub struct TupleSpec {
    pub(crate) elements: Vec<Spec>,
    pub(crate) predicate: Option<Predicate<[Value]>>,
}

impl TupleSpec {
    pub fn elements(&self) -> &[Spec] { &self.elements }

    pub fn arity(&self) -> usize { self.elements.len() }
}

/// String-keyed map whose every value matches `value`.
#[derive(Debug, Clone)]
pub struct MapSpec {
    pub(crate) value: Spec,
    pub(crate) constraint: Option<ArrayConstraint>,
    pub(crate) predicate: Option<Predicate<Map<String, Value>>>,
}

impl MapSpec {
    pub fn value(&self) -> &Spec { &self.value }

    pub fn constraint(&self) -> Option<&ArrayConstraint> { self.constraint.as_ref() }
}

#[derive(Debug, Clone)]
pub enum SpecKind {
    Boolean(Primitive<bool, Unconstrained>),
    Integer(Primitive<i32, IntConstraint>),
    Long(Primitive<i64, LongConstraint>),
    BigInteger(Primitive<BigInt, BigIntConstraint>),
    Double(Primitive<f64, DoubleConstraint>),
    Decimal(Primitive<BigDecimal, DecimalConstraint>),
    String(Primitive<str, StringConstraint>),
    Instant(Primitive<DateTime<Utc>, InstantConstraint>),
    /// Base64 in JSON; `FixedLength` makes it fixed-length binary.
    Binary(Primitive<[u8], FixedLength>),
    Constant(Value),
    /// Any present value, null included.
    Any,
    /// Any present value the predicate accepts, null included.
    AnyMatching(Predicate<Value>),
    Array(ArraySpec),
    Tuple(TupleSpec),
    Map(MapSpec),
    Object(ObjectSpec),
    /// Resolved through the registry when first reached.
    Named(String),
}

impl SpecKind {
    pub fn name(&self) -> &'static str {
        match self {
            SpecKind::Boolean(_) => "boolean",
            SpecKind::Integer(_) => "integer",
            SpecKind::Long(_) => "long",
            SpecKind::BigInteger(_) => "big-integer",
            SpecKind::Double(_) => "double",
            SpecKind::Decimal(_) => "decimal",
            SpecKind::String(_) => "string",
            SpecKind::Instant(_) => "instant",
            SpecKind::Binary(p) if p.constraint.is_some() => "fixed-length binary",
            SpecKind::Binary(_) => "binary",
            SpecKind::Constant(_) => "constant",
            SpecKind::Any => "any",
            SpecKind::AnyMatching(_) => "any matching",
            SpecKind::Array(_) => "array",
            SpecKind::Tuple(_) => "tuple",
            SpecKind::Map(_) => "map",
            SpecKind::Object(_) => "object",
            SpecKind::Named(_) => "named",
        }
    }

    /// Kinds whose value is one token: boolean through binary.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SpecKind::Boolean(_)
                | SpecKind::Integer(_)
                | SpecKind::Long(_)
                | SpecKind::BigInteger(_)
                | SpecKind::Double(_)
                | SpecKind::Decimal(_)
                | SpecKind::String(_)
                | SpecKind::Instant(_)
                | SpecKind::Binary(_)
        )
    }
}

// -------------------------------- Spec ----------------------------------- //

/// Immutable description of an acceptable JSON value plus its nullability.
/// Cloning is cheap; clones share the same kind.
#[derive(Debug, Clone)]
pub struct Spec {
    kind: Arc<SpecKind>,
    nullable: bool,
}

impl Spec {
    pub(crate) fn from_kind(kind: SpecKind) -> Self {
        Self { kind: Arc::new(kind), nullable: false }
    }

    pub fn kind(&self) -> &SpecKind { &self.kind }

    pub fn is_nullable(&self) -> bool { self.nullable }

    pub fn boolean() -> Self { Self::from_kind(SpecKind::Boolean(Primitive::default())) }

    pub fn integer() -> Self { Self::from_kind(SpecKind::Integer(Primitive::default())) }

    pub fn long() -> Self { Self::from_kind(SpecKind::Long(Primitive::default())) }

    pub fn big_integer() -> Self { Self::from_kind(SpecKind::BigInteger(Primitive::default())) }

    pub fn double() -> Self { Self::from_kind(SpecKind::Double(Primitive::default())) }

    pub fn decimal() -> Self { Self::from_kind(SpecKind::Decimal(Primitive::default())) }

    pub fn string() -> Self { Self::from_kind(SpecKind::String(Primitive::default())) }

    pub fn instant() -> Self { Self::from_kind(SpecKind::Instant(Primitive::default())) }

    pub fn binary() -> Self { Self::from_kind(SpecKind::Binary(Primitive::default())) }

    pub fn fixed_binary(size: usize) -> Self {
        Self::from_kind(SpecKind::Binary(Primitive { constraint: Some(FixedLength(size)), predicate: None }))
    }

    pub fn constant(value: impl Into<Value>) -> Self { Self::from_kind(SpecKind::Constant(value.into())) }

    pub fn any() -> Self { Self::from_kind(SpecKind::Any) }

    pub fn any_matching<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<(), PredicateError> + Send + Sync + 'static,
    {
        Self::from_kind(SpecKind::AnyMatching(Predicate::new(f)))
    }

    pub fn array(element: Spec) -> Self {
        Self::from_kind(SpecKind::Array(ArraySpec { element, constraint: None, predicate: None }))
    }

    pub fn tuple(elements: impl IntoIterator<Item = Spec>) -> Self {
        Self::from_kind(SpecKind::Tuple(TupleSpec { elements: elements.into_iter().collect(), predicate: None }))
    }

    pub fn map(value: Spec) -> Self {
        Self::from_kind(SpecKind::Map(MapSpec { value, constraint: None, predicate: None }))
    }

    pub fn object() -> ObjectBuilder { ObjectBuilder::new() }

    /// Reference to a spec registered under `name`, looked up at first use.
    pub fn named(name: impl Into<String>) -> Self { Self::from_kind(SpecKind::Named(name.into())) }

    /// Same spec, but JSON null is now accepted.
    ///
    /// Constant, any and any-matching specs already decide about null
    /// themselves; asking for it there is a construction error.
    pub fn nullable(self) -> Result<Self, SpecError> {
        if matches!(*self.kind, SpecKind::Constant(_) | SpecKind::Any | SpecKind::AnyMatching(_)) {
            return Err(SpecError::NullableNotAllowed { kind: self.kind.name() });
        }
        Ok(Self { nullable: true, ..self })
    }

    /// Attach (replace) the constraint of the matching category.
    pub fn constrained<C: ConstraintTarget>(mut self, constraint: C) -> Result<Self, SpecError> {
        constraint.attach(Arc::make_mut(&mut self.kind))?;
        Ok(self)
    }

    /// Attach a predicate over the decoded native value. A second predicate
    /// runs after the first.
    pub fn with_predicate<T, F>(mut self, f: F) -> Result<Self, SpecError>
    where
        T: PredicateTarget + ?Sized,
        F: Fn(&T) -> Result<(), PredicateError> + Send + Sync + 'static,
    {
        T::attach(Arc::make_mut(&mut self.kind), Predicate::new(f))?;
        Ok(self)
    }

    /// Names this spec refers to directly (not through other names).
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_references(self, &mut out);
        out
    }
}

fn collect_references<'a>(spec: &'a Spec, out: &mut Vec<&'a str>) {
    match spec.kind() {
        SpecKind::Named(name) => out.push(name),
        SpecKind::Array(array) => collect_references(&array.element, out),
        SpecKind::Map(map) => collect_references(&map.value, out),
        SpecKind::Tuple(tuple) => tuple.elements.iter().for_each(|e| collect_references(e, out)),
        SpecKind::Object(object) => object.fields.values().for_each(|f| collect_references(f, out)),
        SpecKind::Boolean(_)
        | SpecKind::Integer(_)
        | SpecKind::Long(_)
        | SpecKind::BigInteger(_)
        | SpecKind::Double(_)
        | SpecKind::Decimal(_)
        | SpecKind::String(_)
        | SpecKind::Instant(_)
        | SpecKind::Binary(_)
        | SpecKind::Constant(_)
        | SpecKind::Any
        | SpecKind::AnyMatching(_) => {}
    }
}

// ----------------------------- Constraints ------------------------------- //

/// Constraint records and the spec kinds they belong to.
pub trait ConstraintTarget {
    const NAME: &'static str;

    fn attach(self, kind: &mut SpecKind) -> Result<(), SpecError>;
}

macro_rules! constraint_target {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl ConstraintTarget for $ty {
            const NAME: &'static str = $name;

            fn attach(self, kind: &mut SpecKind) -> Result<(), SpecError> {
                match kind {
                    SpecKind::$variant(primitive) => {
                        primitive.constraint = Some(self);
                        Ok(())
                    }
                    other => Err(SpecError::ConstraintKind { constraint: Self::NAME, spec: other.name() }),
                }
            }
        }
    };
}

constraint_target!(IntConstraint, Integer, "integer");
constraint_target!(LongConstraint, Long, "long");
constraint_target!(BigIntConstraint, BigInteger, "big-integer");
constraint_target!(DoubleConstraint, Double, "double");
constraint_target!(DecimalConstraint, Decimal, "decimal");
constraint_target!(StringConstraint, String, "string");
constraint_target!(InstantConstraint, Instant, "instant");
constraint_target!(FixedLength, Binary, "fixed-length");

impl ConstraintTarget for ArrayConstraint {
    const NAME: &'static str = "array";

    fn attach(self, kind: &mut SpecKind) -> Result<(), SpecError> {
        match kind {
            SpecKind::Array(array) => array.constraint = Some(self),
            SpecKind::Map(map) => map.constraint = Some(self),
            other => return Err(SpecError::ConstraintKind { constraint: Self::NAME, spec: other.name() }),
        }
        Ok(())
    }
}

impl ArraySpec {
    pub fn predicate(&self) -> Option<&Predicate<[Value]>> { self.predicate.as_ref() }
}

impl TupleSpec {
    pub fn predicate(&self) -> Option<&Predicate<[Value]>> { self.predicate.as_ref() }
}

impl MapSpec {
    pub fn predicate(&self) -> Option<&Predicate<Map<String, Value>>> { self.predicate.as_ref() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::StringFormat;

    #[test]
    fn nullable_is_idempotent() {
        let once = Spec::integer().nullable().unwrap();
        let twice = once.clone().nullable().unwrap();
        assert!(once.is_nullable() && twice.is_nullable());
        assert!(!Spec::integer().is_nullable());
    }

    #[test]
    fn nullable_is_refused_for_constant_and_any() {
        for spec in [Spec::constant(1), Spec::any(), Spec::any_matching(|_| Ok(()))] {
            assert!(matches!(spec.nullable(), Err(SpecError::NullableNotAllowed { .. })));
        }
        assert!(Spec::named("node").nullable().is_ok());
    }

    #[test]
    fn constraint_must_match_category() {
        let err = Spec::string().constrained(IntConstraint::between(0, 1).unwrap()).unwrap_err();
        assert!(matches!(err, SpecError::ConstraintKind { constraint: "integer", spec: "string" }));
        assert!(Spec::map(Spec::integer()).constrained(ArrayConstraint::unique()).is_ok());
    }

    #[test]
    fn predicate_must_match_category() {
        let err = Spec::long().with_predicate(|_: &i32| Ok(())).unwrap_err();
        assert!(matches!(err, SpecError::PredicateKind { predicate: "integer", spec: "long" }));
        assert!(Spec::string().with_predicate(|s: &str| if s.is_empty() {
            Err(PredicateError::new("empty"))
        } else {
            Ok(())
        })
        .is_ok());
    }

    #[test]
    fn predicate_on_any_becomes_any_matching() {
        let spec = Spec::any().with_predicate(|_: &Value| Ok(())).unwrap();
        assert!(matches!(spec.kind(), SpecKind::AnyMatching(_)));
    }

    #[test]
    fn constraining_does_not_touch_shared_clones() {
        let base = Spec::string();
        let constrained = base
            .clone()
            .constrained(StringConstraint::format(StringFormat::Email).unwrap())
            .unwrap();
        let SpecKind::String(p) = base.kind() else { panic!() };
        assert!(p.constraint().is_none());
        let SpecKind::String(p) = constrained.kind() else { panic!() };
        assert!(p.constraint().is_some());
    }

    #[test]
    fn references_are_collected_through_composites() {
        let spec = Spec::object()
            .field("children", Spec::array(Spec::named("node")))
            .field("meta", Spec::map(Spec::tuple([Spec::named("tag"), Spec::integer()])))
            .build()
            .unwrap();
        assert_eq!(spec.references(), ["node", "tag"]);
    }
}
