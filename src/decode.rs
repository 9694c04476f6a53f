//! Literal decoders shared by validation and parsing.
//!
//! Validation feeds them the text of a materialized `Number`/`String`; the
//! parser feeds them the reader's current token. Same function, same verdict.
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use bigdecimal::BigDecimal;
use serde_json::{Number, Value};

fn is_integral(literal: &str) -> bool {
    !literal.contains(['.', 'e', 'E'])
}

pub fn int(literal: &str) -> Option<i32> {
    if !is_integral(literal) {
        return None;
    }
    literal.parse().ok()
}

pub fn long(literal: &str) -> Option<i64> {
    if !is_integral(literal) {
        return None;
    }
    literal.parse().ok()
}

pub fn big_integer(literal: &str) -> Option<BigInt> {
    if !is_integral(literal) {
        return None;
    }
    BigInt::from_str(literal).ok()
}

/// Finite doubles only; `1e400` does not decode.
pub fn double(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Arbitrary precision, so every JSON number decodes.
pub fn decimal(literal: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(literal).ok()
}

pub fn instant(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Standard, padded base64.
pub fn binary(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text).ok()
}

/// Exact number value for a literal the reader already validated.
pub fn number(literal: &str) -> Option<Value> {
    Number::from_str(literal).ok().map(Value::Number)
}
