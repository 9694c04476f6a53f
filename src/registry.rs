//! Named-spec registry.
//!
//! Two phases: a [`RegistryBuilder`] collects specs during initialization,
//! `freeze` turns it into an immutable [`Registry`] that is read without locks.
//! One frozen registry may be installed as the process-wide instance that the
//! plain `validate`/`parse` entry points consult.
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::{Lazy, OnceCell};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::spec::{Spec, SpecKind};

static GLOBAL: OnceCell<Registry> = OnceCell::new();
static EMPTY: Lazy<Registry> = Lazy::new(Registry::empty);

/// Open phase: names may still be added.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    specs: IndexMap<String, Spec>,
    config: RegistryConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self { specs: IndexMap::new(), config }
    }

    /// Bind `name` to `spec`. The spec may reference names not registered yet.
    pub fn register(&mut self, name: impl Into<String>, spec: Spec) -> Result<(), RegistryError> {
        let name = name.into();
        if self.specs.contains_key(&name) && !self.config.allow_redefinition {
            return Err(RegistryError::DuplicateName(name));
        }
        tracing::debug!(name = %name, kind = spec.kind().name(), "registered spec");
        self.specs.insert(name, spec);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// End the registration phase.
    pub fn freeze(self) -> Result<Registry, RegistryError> {
        if self.config.verify_references {
            for (name, spec) in &self.specs {
                if let Some(missing) = spec.references().into_iter().find(|r| !self.specs.contains_key(*r)) {
                    return Err(RegistryError::Unresolved {
                        name: missing.to_owned(),
                        referenced_from: name.clone(),
                    });
                }
            }
            if let Some(cycle) = alias_cycle(&self.specs) {
                return Err(RegistryError::AliasCycle(cycle));
            }
        }
        tracing::debug!(specs = self.specs.len(), "froze spec registry");
        Ok(Registry { specs: Arc::new(self.specs) })
    }
}

/// A chain of names that only point at each other, e.g. `a -> b -> a`.
fn alias_cycle(specs: &IndexMap<String, Spec>) -> Option<Vec<String>> {
    for start in specs.keys() {
        let mut chain = vec![start.clone()];
        let mut current = start;
        while let Some(SpecKind::Named(next)) = specs.get(current).map(Spec::kind) {
            if let Some(at) = chain.iter().position(|seen| seen == next) {
                let mut cycle = chain.split_off(at);
                cycle.push(next.clone());
                return Some(cycle);
            }
            chain.push(next.clone());
            current = next;
        }
    }
    None
}

/// Frozen phase: immutable and cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: Arc<IndexMap<String, Spec>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Spec> {
        self.specs.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<&Spec, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::UnknownName(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Spec)> {
        self.specs.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Follow named references without reporting; `None` if the chain breaks.
    pub(crate) fn peel<'a>(&'a self, spec: &'a Spec) -> Option<&'a Spec> {
        let mut current = spec;
        for _ in 0..=self.specs.len() {
            match current.kind() {
                SpecKind::Named(name) => current = self.specs.get(name)?,
                _ => return Some(current),
            }
        }
        None
    }

    /// Publish as the process-wide registry. Only the first call succeeds.
    pub fn install(self) -> Result<&'static Registry, RegistryError> {
        let specs = self.len();
        GLOBAL.set(self).map_err(|_| RegistryError::AlreadyInstalled)?;
        tracing::debug!(specs, "installed process-wide spec registry");
        Ok(Self::global())
    }

    /// The installed registry, or an empty one.
    pub fn global() -> &'static Registry {
        GLOBAL.get().unwrap_or_else(|| &*EMPTY)
    }
}

pub(crate) fn global() -> &'static Registry {
    Registry::global()
}
