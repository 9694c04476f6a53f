//! JSON-Schema-shaped description of a spec, for interchange.
//!
//! Predicates have no schema form and are left out, so an exported schema can
//! be looser than the spec it came from.
use serde_json::{json, Map, Number, Value};

use crate::constraint::{ArrayConstraint, RangeBound, RangeConstraint};
use crate::decode;
use crate::registry::Registry;
use crate::spec::{Spec, SpecKind};

const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Bound as an exact JSON number where possible, else as its text.
fn bound(text: String) -> Value {
    decode::number(&text).unwrap_or(Value::String(text))
}

fn with_range<T: RangeBound>(
    mut o: Value,
    range: Option<&RangeConstraint<T>>,
    min_key: &str,
    max_key: &str,
) -> Value {
    if let Some(range) = range {
        if let Some(m) = range.minimum() { o[min_key] = bound(m.to_string()); }
        if let Some(m) = range.maximum() { o[max_key] = bound(m.to_string()); }
    }
    o
}

fn with_items(
    mut o: Value,
    c: Option<&ArrayConstraint>,
    min_key: &str,
    max_key: &str,
    unique: bool,
) -> Value {
    if let Some(c) = c {
        if let Some(m) = c.min_items() { o[min_key] = Value::from(m); }
        if let Some(m) = c.max_items() { o[max_key] = Value::from(m); }
        if unique && c.unique_items() { o["uniqueItems"] = Value::Bool(true); }
    }
    o
}

fn nullable(inner: Value) -> Value {
    json!({ "oneOf": [inner, { "type": "null" }] })
}

fn schema_of(spec: &Spec) -> Value {
    let schema = match spec.kind() {
        SpecKind::Boolean(_) => json!({ "type": "boolean" }),
        SpecKind::Integer(p) => with_range(
            json!({ "type": "integer", "format": "int32" }),
            p.constraint(),
            "minimum",
            "maximum",
        ),
        SpecKind::Long(p) => with_range(
            json!({ "type": "integer", "format": "int64" }),
            p.constraint(),
            "minimum",
            "maximum",
        ),
        SpecKind::BigInteger(p) => with_range(json!({ "type": "integer" }), p.constraint(), "minimum", "maximum"),
        SpecKind::Double(p) => {
            let mut o = json!({ "type": "number", "format": "double" });
            if let Some(range) = p.constraint() {
                if let Some(m) = range.minimum().and_then(|m| Number::from_f64(*m)) { o["minimum"] = Value::Number(m); }
                if let Some(m) = range.maximum().and_then(|m| Number::from_f64(*m)) { o["maximum"] = Value::Number(m); }
            }
            o
        }
        SpecKind::Decimal(p) => with_range(json!({ "type": "number" }), p.constraint(), "minimum", "maximum"),
        SpecKind::String(p) => {
            let mut o = json!({ "type": "string" });
            if let Some(c) = p.constraint() {
                if let Some(m) = c.min_length() { o["minLength"] = Value::from(m); }
                if let Some(m) = c.max_length() { o["maxLength"] = Value::from(m); }
                if let Some(rx) = c.pattern_source() { o["pattern"] = Value::from(format!("^(?:{rx})$")); }
                if let Some(format) = c.string_format() { o["format"] = Value::from(format.as_str()); }
            }
            o
        }
        SpecKind::Instant(p) => {
            let mut o = json!({ "type": "string", "format": "date-time" });
            if let Some(range) = p.constraint() {
                if let Some(m) = range.minimum() { o["formatMinimum"] = Value::from(m.to_rfc3339()); }
                if let Some(m) = range.maximum() { o["formatMaximum"] = Value::from(m.to_rfc3339()); }
            }
            o
        }
        SpecKind::Binary(p) => {
            let mut o = json!({ "type": "string", "contentEncoding": "base64" });
            if let Some(fixed) = p.constraint() {
                // Padded base64 length of exactly `n` bytes.
                let encoded = fixed.0.div_ceil(3) * 4;
                o["minLength"] = Value::from(encoded);
                o["maxLength"] = Value::from(encoded);
            }
            o
        }
        SpecKind::Constant(value) => json!({ "const": value }),
        SpecKind::Any | SpecKind::AnyMatching(_) => json!({}),
        SpecKind::Array(array) => with_items(
            json!({ "type": "array", "items": schema_of(array.element()) }),
            array.constraint(),
            "minItems",
            "maxItems",
            true,
        ),
        SpecKind::Tuple(tuple) => json!({
            "type": "array",
            "prefixItems": tuple.elements().iter().map(schema_of).collect::<Vec<_>>(),
            "items": false,
            "minItems": tuple.arity(),
            "maxItems": tuple.arity(),
        }),
        SpecKind::Map(map) => with_items(
            json!({ "type": "object", "additionalProperties": schema_of(map.value()) }),
            map.constraint(),
            "minProperties",
            "maxProperties",
            false,
        ),
        SpecKind::Object(object) => {
            let mut o = Map::new();
            o.insert("type".into(), Value::from("object"));
            let props: Map<String, Value> =
                object.fields().iter().map(|(name, field)| (name.clone(), schema_of(field))).collect();
            o.insert("properties".into(), Value::Object(props));
            let required: Vec<Value> = object.required().map(Value::from).collect();
            if !required.is_empty() {
                o.insert("required".into(), Value::Array(required));
            }
            if object.is_strict() {
                o.insert("additionalProperties".into(), Value::Bool(false));
            }
            Value::Object(o)
        }
        SpecKind::Named(name) => json!({ "$ref": format!("#/$defs/{name}") }),
    };
    if spec.is_nullable() { nullable(schema) } else { schema }
}

impl Spec {
    /// Schema for this spec alone; named references point into `$defs`.
    pub fn to_json_schema(&self) -> Value {
        schema_of(self)
    }
}

impl Registry {
    /// Schema for `root` with every registered spec under `$defs`.
    pub fn to_json_schema(&self, root: &Spec) -> Value {
        let defs: Map<String, Value> = self.iter().map(|(name, spec)| (name.to_owned(), schema_of(spec))).collect();
        let mut schema = Map::new();
        schema.insert("$schema".into(), Value::from(DIALECT));
        match schema_of(root) {
            Value::Object(body) => schema.extend(body),
            other => {
                schema.insert("allOf".into(), Value::Array(vec![other]));
            }
        }
        if !defs.is_empty() {
            schema.insert("$defs".into(), Value::Object(defs));
        }
        Value::Object(schema)
    }
}
