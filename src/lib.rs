//! Declare the shape of a JSON value once, then use that single declaration
//! two ways:
//!
//! - **validate** an already materialized [`serde_json::Value`], getting one
//!   error for scalar-like specs or a located list for objects and maps;
//! - **parse** a token stream, decoding and checking in one pass and stopping
//!   at the first violation with its byte offset.
//!
//! ```
//! use json_spec::{IntConstraint, Spec};
//! use serde_json::json;
//!
//! let person = Spec::object()
//!     .required_field("name", Spec::string())
//!     .field("age", Spec::integer().constrained(IntConstraint::between(0, 150)?)?)
//!     .strict()
//!     .build()?;
//!
//! assert!(person.validate(&json!({"name": "Ada", "age": 36})).is_valid());
//! let err = person.parse_str(r#"{"name": "Ada", "age": 200}"#).unwrap_err();
//! assert_eq!(err.path.to_string(), "$.age");
//! # Ok::<(), json_spec::SpecError>(())
//! ```
pub mod config;
pub mod constraint;
pub mod decode;
pub mod error;
pub mod export;
pub mod parse;
pub mod path;
pub mod reader;
pub mod registry;
pub mod spec;
pub mod validate;

pub use config::{ReaderConfig, RegistryConfig};
pub use constraint::{
    ArrayConstraint, BigIntConstraint, Constraint, DecimalConstraint, DoubleConstraint, FixedLength,
    InstantConstraint, IntConstraint, LongConstraint, RangeConstraint, StringConstraint, StringFormat,
};
pub use error::{
    ErrorKind, JsonKind, ParseError, PredicateError, RegistryError, SpecError, ValidationError, Verdict, Violation,
};
pub use parse::read_any;
pub use path::{JsonPath, PathSegment};
pub use reader::{JsonReader, Token, TokenReader};
pub use registry::{Registry, RegistryBuilder};
pub use spec::{ObjectBuilder, ObjectSpec, Predicate, PredicateTarget, Spec, SpecKind};
