use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use super::predicate::{Predicate, push_predicate};
use super::{Spec, SpecKind};
use crate::error::{PredicateError, SpecError};

/// Named fields bound to sub-specs, in declaration order.
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    pub(crate) fields: IndexMap<String, Spec>,
    pub(crate) required: IndexSet<String>,
    pub(crate) strict: bool,
    pub(crate) predicate: Option<Predicate<Map<String, Value>>>,
}

impl ObjectSpec {
    pub fn fields(&self) -> &IndexMap<String, Spec> { &self.fields }

    pub fn field(&self, name: &str) -> Option<&Spec> { self.fields.get(name) }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn is_required(&self, name: &str) -> bool { self.required.contains(name) }

    /// Strict objects reject keys that are not declared fields.
    pub fn is_strict(&self) -> bool { self.strict }

    pub fn predicate(&self) -> Option<&Predicate<Map<String, Value>>> { self.predicate.as_ref() }
}

/// Collects fields for an object spec; `build` checks the declaration is coherent.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    fields: IndexMap<String, Spec>,
    required: IndexSet<String>,
    duplicate: Option<String>,
    strict: bool,
    predicate: Option<Predicate<Map<String, Value>>>,
}

impl ObjectBuilder {
    pub fn new() -> Self { Self::default() }

    /// Declare an optional field.
    pub fn field(mut self, name: impl Into<String>, spec: Spec) -> Self {
        let name = name.into();
        if self.fields.contains_key(&name) && self.duplicate.is_none() {
            self.duplicate = Some(name.clone());
        }
        self.fields.insert(name, spec);
        self
    }

    /// Declare a field that must be present.
    pub fn required_field(self, name: impl Into<String>, spec: Spec) -> Self {
        let name = name.into();
        self.field(name.clone(), spec).require([name])
    }

    /// Mark already (or later) declared fields as required.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn strict(self) -> Self { self.strict_mode(true) }

    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whole-object check, run last and only when nothing else failed.
    pub fn predicate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Result<(), PredicateError> + Send + Sync + 'static,
    {
        push_predicate(&mut self.predicate, Predicate::new(f));
        self
    }

    pub fn build(self) -> Result<Spec, SpecError> {
        if let Some(name) = self.duplicate {
            return Err(SpecError::DuplicateField(name));
        }
        if let Some(name) = self.required.iter().find(|name| !self.fields.contains_key(*name)) {
            return Err(SpecError::UndeclaredRequiredKey(name.clone()));
        }
        Ok(Spec::from_kind(SpecKind::Object(ObjectSpec {
            fields: self.fields,
            required: self.required,
            strict: self.strict,
            predicate: self.predicate,
        })))
    }
}
