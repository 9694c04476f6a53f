//! Validation engine: walk a materialized `Value` against a `Spec`.
//!
//! Every kind follows the same ladder: absent, null, JSON kind, constraint,
//! predicate. The first rung that fails ends the check for that value.
use serde_json::{Map, Value};

use crate::constraint::Constraint;
use crate::decode;
use crate::error::{ErrorKind, JsonKind, ValidationError, Verdict, Violation};
use crate::path::JsonPath;
use crate::registry::{self, Registry};
use crate::spec::{Predicate, Primitive, Spec, SpecKind};

/// Constraint first, then predicate, on an already decoded native value.
pub(crate) fn check_primitive<T, C>(primitive: &Primitive<T, C>, native: &T) -> Option<ErrorKind>
where
    T: ?Sized + 'static,
    C: Constraint<T>,
{
    if let Some(kind) = primitive.constraint.as_ref().and_then(|c| c.check(native)) {
        return Some(kind);
    }
    check_predicate(primitive.predicate.as_ref(), native)
}

pub(crate) fn check_predicate<T: ?Sized + 'static>(
    predicate: Option<&Predicate<T>>,
    native: &T,
) -> Option<ErrorKind> {
    predicate.and_then(|p| p.test(native).err()).map(|error| ErrorKind::Predicate { error })
}

/// Decode `value` for a scalar kind and run its checks.
///
/// `None` when `kind` is not a scalar kind.
pub(crate) fn check_scalar(kind: &SpecKind, value: &Value) -> Option<Result<(), ErrorKind>> {
    fn run(outcome: Option<ErrorKind>) -> Result<(), ErrorKind> {
        outcome.map_or(Ok(()), Err)
    }

    fn number(value: &Value, expected: JsonKind) -> Result<String, ErrorKind> {
        match value {
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(ErrorKind::kind(expected)),
        }
    }

    fn text(value: &Value, expected: JsonKind) -> Result<&str, ErrorKind> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(ErrorKind::kind(expected)),
        }
    }

    let outcome = match kind {
        SpecKind::Boolean(p) => match value {
            Value::Bool(b) => run(check_primitive(p, b)),
            _ => Err(ErrorKind::kind(JsonKind::Boolean)),
        },
        SpecKind::Integer(p) => number(value, JsonKind::Integer).and_then(|literal| {
            let native = decode::int(&literal).ok_or(ErrorKind::kind(JsonKind::Integer))?;
            run(check_primitive(p, &native))
        }),
        SpecKind::Long(p) => number(value, JsonKind::Long).and_then(|literal| {
            let native = decode::long(&literal).ok_or(ErrorKind::kind(JsonKind::Long))?;
            run(check_primitive(p, &native))
        }),
        SpecKind::BigInteger(p) => number(value, JsonKind::BigInteger).and_then(|literal| {
            let native = decode::big_integer(&literal).ok_or(ErrorKind::kind(JsonKind::BigInteger))?;
            run(check_primitive(p, &native))
        }),
        SpecKind::Double(p) => number(value, JsonKind::Double).and_then(|literal| {
            let native = decode::double(&literal).ok_or(ErrorKind::kind(JsonKind::Double))?;
            run(check_primitive(p, &native))
        }),
        SpecKind::Decimal(p) => number(value, JsonKind::Decimal).and_then(|literal| {
            let native = decode::decimal(&literal).ok_or(ErrorKind::kind(JsonKind::Decimal))?;
            run(check_primitive(p, &native))
        }),
        SpecKind::String(p) => text(value, JsonKind::String).and_then(|s| run(check_primitive(p, s))),
        SpecKind::Instant(p) => text(value, JsonKind::Instant).and_then(|s| {
            let native = decode::instant(s).ok_or(ErrorKind::kind(JsonKind::Instant))?;
            run(check_primitive(p, &native))
        }),
        SpecKind::Binary(p) => text(value, JsonKind::Binary).and_then(|s| {
            let native = decode::binary(s).ok_or(ErrorKind::kind(JsonKind::Binary))?;
            run(check_primitive(p, native.as_slice()))
        }),
        SpecKind::Constant(_)
        | SpecKind::Any
        | SpecKind::AnyMatching(_)
        | SpecKind::Array(_)
        | SpecKind::Tuple(_)
        | SpecKind::Map(_)
        | SpecKind::Object(_)
        | SpecKind::Named(_) => return None,
    };
    Some(outcome)
}

/// Follow named references to a structural spec.
///
/// The result is nullable if any spec along the chain is.
pub(crate) fn resolve<'a>(registry: &'a Registry, spec: &'a Spec) -> Result<(&'a Spec, bool), ErrorKind> {
    let mut current = spec;
    let mut nullable = spec.is_nullable();
    let mut hops = 0;
    while let SpecKind::Named(name) = current.kind() {
        hops += 1;
        let target = match registry.get(name) {
            Some(target) if hops <= registry.len() => target,
            _ => {
                tracing::warn!(name = %name, "unresolved spec reference");
                return Err(ErrorKind::UnresolvedReference { name: name.clone() });
            }
        };
        nullable |= target.is_nullable();
        current = target;
    }
    Ok((current, nullable))
}

pub(crate) struct Validator<'r> {
    registry: &'r Registry,
}

impl<'r> Validator<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self { Self { registry } }

    pub(crate) fn check(&self, spec: &Spec, value: Option<&Value>, path: &JsonPath) -> Verdict {
        // Absence and permitted null are settled before the registry is
        // consulted, so neither depends on the target being registered.
        let peeled_located = || self.registry.peel(spec).is_some_and(is_located);
        let Some(value) = value else {
            return if peeled_located() {
                Verdict::Located(vec![ValidationError::new(path.clone(), ErrorKind::Required)])
            } else {
                single(None, ErrorKind::Required)
            };
        };
        if spec.is_nullable() && value.is_null() {
            return if peeled_located() { Verdict::Located(Vec::new()) } else { Verdict::ok() };
        }
        let (spec, nullable) = match resolve(self.registry, spec) {
            Ok(resolved) => resolved,
            Err(kind) => return single(Some(value), kind),
        };
        let located = is_located(spec);
        let fail = |kind: ErrorKind| {
            if located {
                Verdict::Located(vec![ValidationError::new(path.clone(), kind)])
            } else {
                single(Some(value), kind)
            }
        };

        if value.is_null() {
            if nullable {
                return if located { Verdict::Located(Vec::new()) } else { Verdict::ok() };
            }
            if !matches!(spec.kind(), SpecKind::Constant(_) | SpecKind::Any | SpecKind::AnyMatching(_)) {
                return fail(ErrorKind::NullNotAllowed);
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
            | SpecKind::Binary(_) => match check_scalar(spec.kind(), value) {
                Some(Err(kind)) => fail(kind),
                _ => Verdict::ok(),
            },
            SpecKind::Constant(expected) => {
                if value == expected {
                    Verdict::ok()
                } else {
                    fail(ErrorKind::ConstantMismatch { expected: expected.clone() })
                }
            }
            SpecKind::Any => Verdict::ok(),
            SpecKind::AnyMatching(predicate) => check_predicate(Some(predicate), value).map_or_else(Verdict::ok, fail),
            SpecKind::Array(array) => {
                let Value::Array(items) = value else {
                    return fail(ErrorKind::kind(JsonKind::Array));
                };
                if let Some(kind) = array.constraint.as_ref().and_then(|c| c.check(items.as_slice())) {
                    return fail(kind);
                }
                if let Some(violation) = self.first_element_violation(items.iter().map(|item| (&array.element, item)), path) {
                    return Verdict::Single(Some(violation));
                }
                check_predicate(array.predicate.as_ref(), items.as_slice()).map_or_else(Verdict::ok, fail)
            }
            SpecKind::Tuple(tuple) => {
                let Value::Array(items) = value else {
                    return fail(ErrorKind::kind(JsonKind::Array));
                };
                if items.len() != tuple.elements.len() {
                    return fail(ErrorKind::ArityMismatch { expected: tuple.elements.len(), actual: items.len() });
                }
                if let Some(violation) = self.first_element_violation(tuple.elements.iter().zip(items), path) {
                    return Verdict::Single(Some(violation));
                }
                check_predicate(tuple.predicate.as_ref(), items.as_slice()).map_or_else(Verdict::ok, fail)
            }
            SpecKind::Map(map) => {
                let Value::Object(entries) = value else {
                    return fail(ErrorKind::kind(JsonKind::Object));
                };
                let mut errors = Vec::new();
                if let Some(kind) = map.constraint.as_ref().and_then(|c| c.check(entries)) {
                    errors.push(ValidationError::new(path.clone(), kind));
                }
                for (key, item) in entries {
                    let entry_path = path.key(key);
                    errors.extend(self.check(&map.value, Some(item), &entry_path).into_errors(&entry_path));
                }
                located_with_predicate(errors, map.predicate.as_ref(), entries, path)
            }
            SpecKind::Object(object) => {
                let Value::Object(entries) = value else {
                    return fail(ErrorKind::kind(JsonKind::Object));
                };
                let mut errors = Vec::new();
                for (name, field) in &object.fields {
                    let field_path = path.key(name);
                    match entries.get(name) {
                        None if object.is_required(name) => errors.push(ValidationError::new(
                            field_path,
                            ErrorKind::RequiredKeyMissing { key: name.clone() },
                        )),
                        None => {}
                        Some(item) => {
                            errors.extend(self.check(field, Some(item), &field_path).into_errors(&field_path))
                        }
                    }
                }
                if object.strict {
                    errors.extend(
                        entries
                            .keys()
                            .filter(|key| !object.fields.contains_key(*key))
                            .map(|key| ValidationError::new(path.key(key), ErrorKind::UnknownKey { key: key.clone() })),
                    );
                }
                located_with_predicate(errors, object.predicate.as_ref(), entries, path)
            }
            SpecKind::Named(name) => fail(ErrorKind::UnresolvedReference { name: name.clone() }),
        }
    }

    /// First failing element; a located element result is reduced to its first entry.
    fn first_element_violation<'s, 'v>(
        &self,
        elements: impl Iterator<Item = (&'s Spec, &'v Value)>,
        path: &JsonPath,
    ) -> Option<Violation> {
        elements.enumerate().find_map(|(index, (spec, item))| match self.check(spec, Some(item), &path.index(index)) {
            Verdict::Single(violation) => violation,
            Verdict::Located(errors) => {
                errors.into_iter().next().map(|error| Violation::new(item.clone(), error.kind))
            }
        })
    }
}

fn is_located(spec: &Spec) -> bool {
    matches!(spec.kind(), SpecKind::Object(_) | SpecKind::Map(_))
}

fn single(value: Option<&Value>, kind: ErrorKind) -> Verdict {
    Verdict::Single(Some(Violation::new(value.cloned().unwrap_or(Value::Null), kind)))
}

fn located_with_predicate(
    mut errors: Vec<ValidationError>,
    predicate: Option<&Predicate<Map<String, Value>>>,
    entries: &Map<String, Value>,
    path: &JsonPath,
) -> Verdict {
    if errors.is_empty() {
        if let Some(kind) = check_predicate(predicate, entries) {
            errors.push(ValidationError::new(path.clone(), kind));
        }
    }
    Verdict::Located(errors)
}

// ---------------------------- Entry points ------------------------------- //

impl Spec {
    /// Validate against the process-wide registry.
    pub fn validate(&self, value: &Value) -> Verdict { self.validate_in(registry::global(), value) }

    pub fn validate_in(&self, registry: &Registry, value: &Value) -> Verdict {
        Validator::new(registry).check(self, Some(value), &JsonPath::root())
    }

    /// Verdict for a value that was never supplied (as opposed to JSON null).
    pub fn validate_absent(&self) -> Verdict { self.validate_absent_in(registry::global()) }

    pub fn validate_absent_in(&self, registry: &Registry) -> Verdict {
        Validator::new(registry).check(self, None, &JsonPath::root())
    }

    /// Every violation as a located error, single verdicts placed at `$`.
    pub fn errors(&self, value: &Value) -> Vec<ValidationError> { self.errors_in(registry::global(), value) }

    pub fn errors_in(&self, registry: &Registry, value: &Value) -> Vec<ValidationError> {
        self.validate_in(registry, value).into_errors(&JsonPath::root())
    }

    pub fn is_valid(&self, value: &Value) -> bool { self.validate(value).is_valid() }
}
