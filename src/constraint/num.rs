use std::fmt;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use bigdecimal::BigDecimal;

use super::Constraint;
use crate::error::{ErrorKind, SpecError};

/// Native types that can bound a range.
pub trait RangeBound: PartialOrd + Clone + fmt::Display + fmt::Debug {
    /// False for values that compare with nothing (NaN).
    fn is_ordered(&self) -> bool { true }
}

impl RangeBound for i32 {}
impl RangeBound for i64 {}
impl RangeBound for BigInt {}
impl RangeBound for BigDecimal {}
impl RangeBound for DateTime<Utc> {}

impl RangeBound for f64 {
    fn is_ordered(&self) -> bool { !self.is_nan() }
}

/// Inclusive `[minimum, maximum]`; either end may be open.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeConstraint<T> {
    minimum: Option<T>,
    maximum: Option<T>,
}

pub type IntConstraint = RangeConstraint<i32>;
pub type LongConstraint = RangeConstraint<i64>;
pub type BigIntConstraint = RangeConstraint<BigInt>;
pub type DoubleConstraint = RangeConstraint<f64>;
pub type DecimalConstraint = RangeConstraint<BigDecimal>;
pub type InstantConstraint = RangeConstraint<DateTime<Utc>>;

impl<T: RangeBound> RangeConstraint<T> {
    pub fn new(minimum: Option<T>, maximum: Option<T>) -> Result<Self, SpecError> {
        for bound in minimum.iter().chain(maximum.iter()) {
            if !bound.is_ordered() {
                return Err(SpecError::UnorderedBound { bound: bound.to_string() });
            }
        }
        if let (Some(lo), Some(hi)) = (&minimum, &maximum) {
            if lo > hi {
                return Err(SpecError::InvalidRange {
                    minimum: lo.to_string(),
                    maximum: hi.to_string(),
                });
            }
        }
        Ok(Self { minimum, maximum })
    }

    pub fn between(minimum: T, maximum: T) -> Result<Self, SpecError> {
        Self::new(Some(minimum), Some(maximum))
    }

    pub fn at_least(minimum: T) -> Result<Self, SpecError> {
        Self::new(Some(minimum), None)
    }

    pub fn at_most(maximum: T) -> Result<Self, SpecError> {
        Self::new(None, Some(maximum))
    }

    pub fn minimum(&self) -> Option<&T> { self.minimum.as_ref() }

    pub fn maximum(&self) -> Option<&T> { self.maximum.as_ref() }
}

impl<T: RangeBound> Constraint<T> for RangeConstraint<T> {
    fn check(&self, value: &T) -> Option<ErrorKind> {
        if let Some(minimum) = &self.minimum {
            if value < minimum {
                return Some(ErrorKind::BelowMinimum { minimum: minimum.to_string() });
            }
        }
        if let Some(maximum) = &self.maximum {
            if value > maximum {
                return Some(ErrorKind::AboveMaximum { maximum: maximum.to_string() });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn inverted_bounds_fail_at_construction() {
        let err = IntConstraint::between(10, 5).unwrap_err();
        assert!(matches!(err, SpecError::InvalidRange { ref minimum, ref maximum } if minimum == "10" && maximum == "5"));
    }

    #[test]
    fn nan_bound_is_rejected() {
        assert!(matches!(
            DoubleConstraint::at_least(f64::NAN),
            Err(SpecError::UnorderedBound { .. })
        ));
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let c = IntConstraint::between(0, 130).unwrap();
        assert_eq!(c.check(&0), None);
        assert_eq!(c.check(&130), None);
        assert_eq!(c.check(&-1), Some(ErrorKind::BelowMinimum { minimum: "0".into() }));
        assert_eq!(c.check(&131), Some(ErrorKind::AboveMaximum { maximum: "130".into() }));
    }

    #[test]
    fn open_ended_ranges() {
        let c = LongConstraint::at_most(i64::MAX - 1).unwrap();
        assert_eq!(c.check(&i64::MIN), None);
        assert!(c.check(&i64::MAX).is_some());
    }

    #[test]
    fn big_and_decimal_ranges() {
        let big = BigIntConstraint::at_least(BigInt::from_str("100000000000000000000").unwrap()).unwrap();
        assert!(big.check(&BigInt::from(5)).is_some());

        let dec = DecimalConstraint::between(BigDecimal::from_str("0.5").unwrap(), BigDecimal::from(2)).unwrap();
        assert_eq!(dec.check(&BigDecimal::from_str("1.25").unwrap()), None);
        assert!(dec.check(&BigDecimal::from_str("0.49").unwrap()).is_some());

        let wide = DecimalConstraint::at_most(BigDecimal::from_str("1e30").unwrap()).unwrap();
        assert_eq!(wide.check(&BigDecimal::from_str("999999999999999999999999999999.9").unwrap()), None);
        assert!(wide.check(&BigDecimal::from_str("1000000000000000000000000000000.1").unwrap()).is_some());
    }

    #[test]
    fn instant_range() {
        let lo: DateTime<Utc> = "2020-01-01T00:00:00Z".parse().unwrap();
        let hi: DateTime<Utc> = "2019-01-01T00:00:00Z".parse().unwrap();
        assert!(InstantConstraint::between(lo, hi).is_err());
        let c = InstantConstraint::at_least(lo).unwrap();
        assert!(c.check(&hi).is_some());
    }
}
