//! Constraint model: immutable range/shape restrictions, one record type per
//! primitive category.
//!
//! Every constructor checks the restriction is self-consistent and fails right
//! there, so a spec holding a constraint can never be observed with inverted
//! bounds. Checks are pure: decoded native value in, optional violation out.
pub mod arr;
pub mod num;
pub mod str;

use crate::error::ErrorKind;

pub use arr::{ArrayConstraint, FixedLength};
pub use num::{
    BigIntConstraint, DecimalConstraint, DoubleConstraint, InstantConstraint, IntConstraint,
    LongConstraint, RangeBound, RangeConstraint,
};
pub use str::{StringConstraint, StringConstraintBuilder, StringFormat};

/// The seam every constraint type implements.
pub trait Constraint<T: ?Sized> {
    fn check(&self, value: &T) -> Option<ErrorKind>;
}

/// Marker for categories that carry no constraint (booleans).
/// Uninhabited, so `Option<Unconstrained>` is always `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unconstrained {}

impl<T: ?Sized> Constraint<T> for Unconstrained {
    fn check(&self, _value: &T) -> Option<ErrorKind> {
        match *self {}
    }
}
