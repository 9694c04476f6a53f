//! Parser derivation: decode and validate in one pass over a token stream.
//!
//! Each step starts with the reader on the value's first token and leaves it
//! on the value's last token. The first violation aborts the whole parse.
use std::io::Read;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::constraint::arr::ItemSet;
use crate::decode;
use crate::error::{ErrorKind, JsonKind, ParseError};
use crate::path::JsonPath;
use crate::reader::{JsonReader, Token, TokenReader};
use crate::registry::{self, Registry};
use crate::spec::{ArraySpec, MapSpec, ObjectSpec, Spec, SpecKind, TupleSpec};
use crate::validate::{check_predicate, check_scalar, resolve};

/// Read any JSON value without checking it against a spec.
pub fn read_any<T: TokenReader + ?Sized>(reader: &mut T, path: &JsonPath) -> Result<Value, ParseError> {
    match reader.current() {
        Token::BeginArray => {
            let mut items = Vec::new();
            if reader.advance()? != Token::EndArray {
                loop {
                    items.push(read_any(reader, &path.index(items.len()))?);
                    if !next_element(reader, Token::EndArray, path)? {
                        break;
                    }
                }
            }
            Ok(Value::Array(items))
        }
        Token::BeginObject => {
            let mut entries = Map::new();
            if reader.advance()? != Token::EndObject {
                loop {
                    let key = read_entry_key(reader, path)?;
                    let item = read_any(reader, &path.key(&key))?;
                    entries.insert(key, item);
                    if !next_element(reader, Token::EndObject, path)? {
                        break;
                    }
                }
            }
            Ok(Value::Object(entries))
        }
        _ => scalar_token(reader, path),
    }
}

/// Value of a single-token literal. Container openers yield an empty
/// container so kind checks can reject them without reading further.
fn scalar_token<T: TokenReader + ?Sized>(reader: &T, path: &JsonPath) -> Result<Value, ParseError> {
    let offset = reader.offset();
    match reader.current() {
        Token::String => Ok(Value::String(reader.text().to_owned())),
        Token::Number => decode::number(reader.text()).ok_or_else(|| {
            ParseError::structural(format!("invalid number {}", reader.text()), offset).at(path)
        }),
        Token::True => Ok(Value::Bool(true)),
        Token::False => Ok(Value::Bool(false)),
        Token::Null => Ok(Value::Null),
        Token::BeginArray => Ok(Value::Array(Vec::new())),
        Token::BeginObject => Ok(Value::Object(Map::new())),
        other @ (Token::EndArray | Token::EndObject | Token::Colon | Token::Comma | Token::End) => {
            Err(ParseError::structural(format!("expected a value, found {other}"), offset).at(path))
        }
    }
}

/// After an element: true on ',' (reader moved to the next element), false on `close`.
fn next_element<T: TokenReader + ?Sized>(
    reader: &mut T,
    close: Token,
    path: &JsonPath,
) -> Result<bool, ParseError> {
    match reader.advance()? {
        Token::Comma => {
            reader.advance()?;
            Ok(true)
        }
        token if token == close => Ok(false),
        other => {
            let reason = format!("expected ',' or {close}, found {other}");
            Err(ParseError::structural(reason, reader.offset()).at(path))
        }
    }
}

/// Key, then ':', then the reader is left on the entry value's first token.
fn read_entry_key<T: TokenReader + ?Sized>(reader: &mut T, path: &JsonPath) -> Result<String, ParseError> {
    let key = reader.read_key().map_err(|err| err.at(path))?;
    reader.expect(Token::Colon).map_err(|err| err.at(path))?;
    reader.advance()?;
    Ok(key)
}

pub(crate) struct Parser<'r> {
    registry: &'r Registry,
}

impl<'r> Parser<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self { Self { registry } }

    pub(crate) fn value<T: TokenReader + ?Sized>(
        &self,
        spec: &Spec,
        reader: &mut T,
        path: &JsonPath,
    ) -> Result<Value, ParseError> {
        let offset = reader.offset();
        let fail = |kind: ErrorKind| ParseError::new(kind, offset).at(path);
        let token = reader.current();

        // Checked before the registry is consulted.
        if token == Token::Null && spec.is_nullable() {
            return Ok(Value::Null);
        }
        let (spec, nullable) = resolve(self.registry, spec).map_err(fail)?;
        if token == Token::Null {
            if nullable {
                return Ok(Value::Null);
            }
            if !matches!(spec.kind(), SpecKind::Constant(_) | SpecKind::Any | SpecKind::AnyMatching(_)) {
                return Err(fail(ErrorKind::NullNotAllowed));
            }
        }

        match spec.kind() {
            SpecKind::Boolean(_)
            | SpecKind::Integer(_)
            | SpecKind::Long(_)
            | SpecKind::BigInteger(_)
            | SpecKind::Double(_)
            | SpecKind::Decimal(_)
            | SpecKind::String(_)
            | SpecKind::Instant(_)
            | SpecKind::Binary(_) => {
                let value = scalar_token(reader, path)?;
                match check_scalar(spec.kind(), &value) {
                    Some(Err(kind)) => Err(fail(kind)),
                    _ => Ok(value),
                }
            }
            SpecKind::Constant(expected) => {
                let value = read_any(reader, path)?;
                if &value == expected {
                    Ok(value)
                } else {
                    Err(fail(ErrorKind::ConstantMismatch { expected: expected.clone() }))
                }
            }
            SpecKind::Any => read_any(reader, path),
            SpecKind::AnyMatching(predicate) => {
                let value = read_any(reader, path)?;
                match check_predicate(Some(predicate), &value) {
                    Some(kind) => Err(fail(kind)),
                    None => Ok(value),
                }
            }
            SpecKind::Array(array) => self.array(array, reader, path),
            SpecKind::Tuple(tuple) => self.tuple(tuple, reader, path),
            SpecKind::Map(map) => self.map(map, reader, path),
            SpecKind::Object(object) => self.object(object, reader, path),
            SpecKind::Named(name) => Err(fail(ErrorKind::UnresolvedReference { name: name.clone() })),
        }
    }

    fn open<T: TokenReader + ?Sized>(
        reader: &T,
        open: Token,
        kind: JsonKind,
        path: &JsonPath,
    ) -> Result<(), ParseError> {
        match reader.current() {
            token if token == open => Ok(()),
            Token::String | Token::Number | Token::True | Token::False | Token::Null | Token::BeginArray
            | Token::BeginObject => Err(ParseError::new(ErrorKind::kind(kind), reader.offset()).at(path)),
            other => {
                let reason = format!("expected a value, found {other}");
                Err(ParseError::structural(reason, reader.offset()).at(path))
            }
        }
    }

    fn array<T: TokenReader + ?Sized>(
        &self,
        array: &ArraySpec,
        reader: &mut T,
        path: &JsonPath,
    ) -> Result<Value, ParseError> {
        Self::open(reader, Token::BeginArray, JsonKind::Array, path)?;
        let constraint = array.constraint.as_ref();
        let mut seen = constraint.filter(|c| c.unique_items()).map(|_| ItemSet::default());
        let mut items = Vec::new();

        if reader.advance()? != Token::EndArray {
            loop {
                let item_offset = reader.offset();
                // One element too many fails before the element itself is read.
                if let Some(kind) = constraint.and_then(|c| c.check_max(items.len() + 1)) {
                    return Err(ParseError::new(kind, item_offset).at(path));
                }
                let item = self.value(&array.element, reader, &path.index(items.len()))?;
                if seen.as_mut().is_some_and(|seen| !seen.insert(&item)) {
                    return Err(ParseError::new(ErrorKind::DuplicateItems, item_offset).at(path));
                }
                items.push(item);
                if !next_element(reader, Token::EndArray, path)? {
                    break;
                }
            }
        }

        let close = reader.offset();
        if let Some(kind) = constraint.and_then(|c| c.check_min(items.len())) {
            return Err(ParseError::new(kind, close).at(path));
        }
        if let Some(kind) = check_predicate(array.predicate.as_ref(), items.as_slice()) {
            return Err(ParseError::new(kind, close).at(path));
        }
        Ok(Value::Array(items))
    }

    fn tuple<T: TokenReader + ?Sized>(
        &self,
        tuple: &TupleSpec,
        reader: &mut T,
        path: &JsonPath,
    ) -> Result<Value, ParseError> {
        Self::open(reader, Token::BeginArray, JsonKind::Array, path)?;
        let arity = tuple.elements.len();
        let mut items = Vec::with_capacity(arity);

        if reader.advance()? != Token::EndArray {
            loop {
                let Some(element) = tuple.elements.get(items.len()) else {
                    let kind = ErrorKind::ArityMismatch { expected: arity, actual: arity + 1 };
                    return Err(ParseError::new(kind, reader.offset()).at(path));
                };
                items.push(self.value(element, reader, &path.index(items.len()))?);
                if !next_element(reader, Token::EndArray, path)? {
                    break;
                }
            }
        }

        let close = reader.offset();
        if items.len() != arity {
            let kind = ErrorKind::ArityMismatch { expected: arity, actual: items.len() };
            return Err(ParseError::new(kind, close).at(path));
        }
        if let Some(kind) = check_predicate(tuple.predicate.as_ref(), items.as_slice()) {
            return Err(ParseError::new(kind, close).at(path));
        }
        Ok(Value::Array(items))
    }

    fn map<T: TokenReader + ?Sized>(
        &self,
        map: &MapSpec,
        reader: &mut T,
        path: &JsonPath,
    ) -> Result<Value, ParseError> {
        Self::open(reader, Token::BeginObject, JsonKind::Object, path)?;
        let constraint = map.constraint.as_ref();
        let mut seen = constraint.filter(|c| c.unique_items()).map(|_| ItemSet::default());
        let mut entries = Map::new();

        if reader.advance()? != Token::EndObject {
            loop {
                let key = read_entry_key(reader, path)?;
                let entry_offset = reader.offset();
                // A repeated key replaces its entry, as in the materialized value.
                let replaced = entries.get(&key);
                let len = entries.len() + usize::from(replaced.is_none());
                if let Some(kind) = constraint.and_then(|c| c.check_max(len)) {
                    return Err(ParseError::new(kind, entry_offset).at(path));
                }
                if let (Some(seen), Some(old)) = (seen.as_mut(), replaced) {
                    seen.remove(old);
                }
                let item = self.value(&map.value, reader, &path.key(&key))?;
                if seen.as_mut().is_some_and(|seen| !seen.insert(&item)) {
                    return Err(ParseError::new(ErrorKind::DuplicateItems, entry_offset).at(path));
                }
                entries.insert(key, item);
                if !next_element(reader, Token::EndObject, path)? {
                    break;
                }
            }
        }

        let close = reader.offset();
        if let Some(kind) = constraint.and_then(|c| c.check_min(entries.len())) {
            return Err(ParseError::new(kind, close).at(path));
        }
        if let Some(kind) = check_predicate(map.predicate.as_ref(), &entries) {
            return Err(ParseError::new(kind, close).at(path));
        }
        Ok(Value::Object(entries))
    }

    /// Keys fail the moment they are read. A scalar field's constraint or
    /// predicate failure is held until the closing brace, and dropped if a
    /// later occurrence of the same key replaces the value.
    fn object<T: TokenReader + ?Sized>(
        &self,
        object: &ObjectSpec,
        reader: &mut T,
        path: &JsonPath,
    ) -> Result<Value, ParseError> {
        Self::open(reader, Token::BeginObject, JsonKind::Object, path)?;
        let mut entries = Map::new();
        let mut held: IndexMap<String, ParseError> = IndexMap::new();

        if reader.advance()? != Token::EndObject {
            loop {
                let key_offset = reader.offset();
                let key = reader.read_key().map_err(|err| err.at(path))?;
                let field_path = path.key(&key);
                let field = object.fields.get(&key);
                if field.is_none() && object.strict {
                    return Err(ParseError::new(ErrorKind::UnknownKey { key }, key_offset).at(&field_path));
                }
                reader.expect(Token::Colon).map_err(|err| err.at(path))?;
                reader.advance()?;
                held.shift_remove(&key);

                let item = match field {
                    Some(spec) => match self.value(spec, reader, &field_path) {
                        Ok(item) => item,
                        Err(err) if err.kind.is_constraint() && self.is_scalar(spec) => {
                            held.insert(key.clone(), err);
                            Value::Null
                        }
                        Err(err) => return Err(err),
                    },
                    None => read_any(reader, &field_path)?,
                };
                entries.insert(key, item);
                if !next_element(reader, Token::EndObject, path)? {
                    break;
                }
            }
        }

        if let Some((_, err)) = held.shift_remove_index(0) {
            return Err(err);
        }
        let close = reader.offset();
        if let Some(missing) = object.required.iter().find(|name| !entries.contains_key(name.as_str())) {
            let kind = ErrorKind::RequiredKeyMissing { key: missing.clone() };
            return Err(ParseError::new(kind, close).at(&path.key(missing)));
        }
        if let Some(kind) = check_predicate(object.predicate.as_ref(), &entries) {
            return Err(ParseError::new(kind, close).at(path));
        }
        Ok(Value::Object(entries))
    }

    fn is_scalar(&self, spec: &Spec) -> bool {
        self.registry.peel(spec).is_some_and(|target| target.kind().is_scalar())
    }
}

// ---------------------------- Entry points ------------------------------- //

impl Spec {
    /// Parse the next value from `reader` against the process-wide registry.
    /// The reader is left on the value's last token.
    pub fn parse<T: TokenReader + ?Sized>(&self, reader: &mut T) -> Result<Value, ParseError> {
        self.parse_in(registry::global(), reader)
    }

    pub fn parse_in<T: TokenReader + ?Sized>(
        &self,
        registry: &Registry,
        reader: &mut T,
    ) -> Result<Value, ParseError> {
        reader.advance()?;
        Parser::new(registry)
            .value(self, reader, &JsonPath::root())
            .inspect_err(|err| {
                tracing::trace!(offset = err.offset, path = %err.path, reason = %err.kind, "parse rejected");
            })
    }

    /// Parse a complete document; trailing content is an error.
    pub fn parse_str(&self, input: &str) -> Result<Value, ParseError> {
        self.parse_slice(input.as_bytes())
    }

    pub fn parse_str_in(&self, registry: &Registry, input: &str) -> Result<Value, ParseError> {
        self.parse_slice_in(registry, input.as_bytes())
    }

    pub fn parse_slice(&self, input: &[u8]) -> Result<Value, ParseError> {
        self.parse_slice_in(registry::global(), input)
    }

    pub fn parse_slice_in(&self, registry: &Registry, input: &[u8]) -> Result<Value, ParseError> {
        self.parse_document(registry, &mut JsonReader::from_slice(input))
    }

    pub fn parse_reader<R: Read>(&self, input: R) -> Result<Value, ParseError> {
        self.parse_reader_in(registry::global(), input)
    }

    pub fn parse_reader_in<R: Read>(&self, registry: &Registry, input: R) -> Result<Value, ParseError> {
        self.parse_document(registry, &mut JsonReader::new(input))
    }

    fn parse_document<T: TokenReader + ?Sized>(
        &self,
        registry: &Registry,
        reader: &mut T,
    ) -> Result<Value, ParseError> {
        let value = self.parse_in(registry, reader)?;
        match reader.advance()? {
            Token::End => Ok(value),
            other => Err(ParseError::structural(format!("trailing {other} after value"), reader.offset())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::constraint::{ArrayConstraint, IntConstraint};
    use crate::error::PredicateError;
    use crate::registry::RegistryBuilder;

    fn bounded_int() -> Spec {
        Spec::integer().constrained(IntConstraint::between(0, 10).unwrap()).unwrap()
    }

    fn person() -> Spec {
        Spec::object()
            .required_field("name", Spec::string())
            .field("age", Spec::integer().constrained(IntConstraint::between(0, 150).unwrap()).unwrap())
            .strict()
            .build()
            .unwrap()
    }

    #[test]
    fn array_fails_at_first_bad_element() {
        let err = Spec::array(bounded_int()).parse_str("[5, 20, -1]").unwrap_err();
        assert_eq!(err.offset, 4);
        assert_eq!(err.kind, ErrorKind::AboveMaximum { maximum: "10".into() });
        assert_eq!(err.path.to_string(), "$[1]");
    }

    #[test]
    fn array_fails_fast_before_malformed_tail() {
        let err = Spec::array(bounded_int()).parse_str("[5, 20, oops").unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn unknown_key_fails_before_held_field_error() {
        let input = r#"{"name": "A", "age": 200, "note": "x"}"#;
        let err = person().parse_str(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownKey { key: "note".into() });
        assert_eq!(err.offset, input.find("\"note\"").unwrap());
    }

    #[test]
    fn held_field_error_is_reported_at_close() {
        let input = r#"{"age": 200, "name": "A"}"#;
        let err = person().parse_str(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AboveMaximum { maximum: "150".into() });
        assert_eq!(err.offset, input.find("200").unwrap());
        assert_eq!(err.path.to_string(), "$.age");
    }

    #[test]
    fn field_kind_errors_are_immediate() {
        let err = person().parse_str(r#"{"age": "old", "note": 1}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::kind(JsonKind::Integer));
    }

    #[test]
    fn missing_required_key_is_reported_at_close() {
        let input = r#"{"age": 3}"#;
        let err = person().parse_str(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequiredKeyMissing { key: "name".into() });
        assert_eq!(err.offset, input.len() - 1);
    }

    #[test]
    fn non_strict_objects_keep_unknown_keys() {
        let spec = Spec::object().field("a", Spec::integer()).build().unwrap();
        let value = spec.parse_str(r#"{"a": 1, "extra": {"deep": [true, null]}}"#).unwrap();
        assert_eq!(value, json!({"a": 1, "extra": {"deep": [true, null]}}));
    }

    #[test]
    fn tuple_arity_in_both_directions() {
        let spec = Spec::tuple([Spec::integer(), Spec::string(), Spec::boolean()]);
        let short = spec.parse_str(r#"[1, "a"]"#).unwrap_err();
        assert_eq!(short.kind, ErrorKind::ArityMismatch { expected: 3, actual: 2 });
        let long = spec.parse_str(r#"[1, "a", true, 4]"#).unwrap_err();
        assert_eq!(long.kind, ErrorKind::ArityMismatch { expected: 3, actual: 4 });
        assert_eq!(long.offset, 15);
        assert_eq!(spec.parse_str(r#"[1, "a", true]"#).unwrap(), json!([1, "a", true]));
    }

    #[test]
    fn array_size_and_uniqueness_are_checked_inline() {
        let spec = Spec::array(Spec::integer())
            .constrained(ArrayConstraint::new(Some(2), Some(3), true).unwrap())
            .unwrap();
        let dup = spec.parse_str("[1, 2, 1]").unwrap_err();
        assert_eq!((dup.kind, dup.offset), (ErrorKind::DuplicateItems, 7));
        let over = spec.parse_str("[1, 2, 3, 4]").unwrap_err();
        assert_eq!((over.kind, over.offset), (ErrorKind::AboveMaxItems { max_items: 3 }, 10));
        let under = spec.parse_str("[1]").unwrap_err();
        assert_eq!((under.kind, under.offset), (ErrorKind::BelowMinItems { min_items: 2 }, 2));
    }

    #[test]
    fn extra_element_fails_before_it_is_read() {
        let spec = Spec::array(Spec::integer())
            .constrained(ArrayConstraint::new(None, Some(1), false).unwrap())
            .unwrap();
        let err = spec.parse_str(r#"[1, "x"]"#).unwrap_err();
        assert_eq!((err.kind.clone(), err.offset), (ErrorKind::AboveMaxItems { max_items: 1 }, 4));
        assert_eq!(spec.validate(&json!([1, "x"])).first_kind(), Some(&err.kind));

        let map = Spec::map(Spec::integer())
            .constrained(ArrayConstraint::new(None, Some(1), false).unwrap())
            .unwrap();
        let input = r#"{"a": 1, "b": "x"}"#;
        let err = map.parse_str(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AboveMaxItems { max_items: 1 });
        assert_eq!(err.offset, input.find("\"x\"").unwrap());
        assert_eq!(map.parse_str(r#"{"a": 1, "a": 2}"#).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn repeated_map_key_replaces_its_entry() {
        let spec = Spec::map(Spec::integer()).constrained(ArrayConstraint::unique()).unwrap();
        assert_eq!(spec.parse_str(r#"{"a": 1, "a": 1}"#).unwrap(), json!({"a": 1}));
        let err = spec.parse_str(r#"{"a": 1, "b": 2, "a": 2}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateItems);
    }

    #[test]
    fn repeated_field_drops_the_held_error() {
        let value = person().parse_str(r#"{"name": "A", "age": 200, "age": 1}"#).unwrap();
        assert_eq!(value, json!({"name": "A", "age": 1}));
        assert!(person().validate(&value).is_valid());

        let input = r#"{"age": 1, "age": 300, "name": "A"}"#;
        let err = person().parse_str(input).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AboveMaximum { maximum: "150".into() });
        assert_eq!(err.offset, input.find("300").unwrap());
    }

    #[test]
    fn decimals_parse_without_precision_loss() {
        for input in ["1e30", "123456789012345678901234567890", "-1.000000000000000000000000000000001"] {
            let value = Spec::decimal().parse_str(input).unwrap();
            assert_eq!(value.to_string(), input);
        }
    }

    #[test]
    fn map_entries_carry_their_path() {
        let spec = Spec::map(bounded_int());
        let err = spec.parse_str(r#"{"a": 1, "b": 11}"#).unwrap_err();
        assert_eq!(err.path.to_string(), "$.b");
        assert_eq!(spec.parse_str(r#"{"a": 1, "b": 2}"#).unwrap(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn predicates_run_after_decoding() {
        let spec = Spec::string()
            .with_predicate(|s: &str| {
                if s.starts_with('#') { Ok(()) } else { Err(PredicateError::new("expected a tag")) }
            })
            .unwrap();
        assert_eq!(spec.parse_str(r##""#x""##).unwrap(), json!("#x"));
        assert!(matches!(spec.parse_str(r#""x""#).unwrap_err().kind, ErrorKind::Predicate { .. }));
        assert_eq!(spec.parse_str("7").unwrap_err().kind, ErrorKind::kind(JsonKind::String));
    }

    #[test]
    fn scalars_reject_containers_at_the_opening_token() {
        let err = Spec::integer().parse_str(r#"  {"a": 1}"#).unwrap_err();
        assert_eq!((err.kind, err.offset), (ErrorKind::kind(JsonKind::Integer), 2));
    }

    #[test]
    fn trailing_content_is_rejected() {
        assert!(Spec::integer().parse_str("1 2").is_err());
        assert!(Spec::integer().parse_str("1 ").is_ok());
        assert!(Spec::integer().parse_str("").is_err());
    }

    #[test]
    fn parse_leaves_reader_after_value() {
        let mut reader = JsonReader::from_slice(b"[1] [2]");
        let spec = Spec::array(Spec::integer());
        assert_eq!(spec.parse(&mut reader).unwrap(), json!([1]));
        assert_eq!(spec.parse(&mut reader).unwrap(), json!([2]));
    }

    #[test]
    fn exact_numbers_survive() {
        let value = Spec::decimal().parse_str("12.50").unwrap();
        assert_eq!(value.to_string(), "12.50");
        let value = Spec::big_integer().parse_str("123456789012345678901234567890").unwrap();
        assert_eq!(value.to_string(), "123456789012345678901234567890");
    }

    #[test]
    fn recursive_named_specs_parse() {
        let node = Spec::object()
            .required_field("value", Spec::integer())
            .field("next", Spec::named("list").nullable().unwrap())
            .build()
            .unwrap();
        let mut builder = RegistryBuilder::new();
        builder.register("list", node).unwrap();
        let registry = builder.freeze().unwrap();

        let root = Spec::named("list");
        let input = r#"{"value": 1, "next": {"value": 2, "next": null}}"#;
        assert_eq!(root.parse_str_in(&registry, input).unwrap(), json!({"value": 1, "next": {"value": 2, "next": null}}));

        let err = root.parse_str_in(&registry, r#"{"value": 1, "next": {"next": null}}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RequiredKeyMissing { key: "value".into() });
        assert_eq!(err.path.to_string(), "$.next.value");
    }

    #[test]
    fn unresolved_reference_surfaces_when_reached() {
        let registry = Registry::empty();
        let spec = Spec::array(Spec::named("ghost"));
        assert_eq!(spec.parse_str_in(&registry, "[]").unwrap(), json!([]));
        let err = spec.parse_str_in(&registry, "[1]").unwrap_err();
        assert!(err.kind.is_configuration_error());
    }
}
