//! Name-keyed entity registry.
//!
//! One registry per entity kind and domain. Declared attributes and resolved
//! handles live in separate maps and are never conflated.

use super::types::{DuplicatePolicy, EntityKind, RegistryError};
use crate::utils::options::Attrs;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug)]
pub struct Registry<K, H> {
    kind: EntityKind,
    policy: DuplicatePolicy,
    /// Declare-phase attributes, keyed by name
    declared: BTreeMap<K, Attrs>,
    /// Inject-phase handles, keyed by the same names
    resolved: BTreeMap<K, H>,
}

impl<K, H> Registry<K, H>
where
    K: Ord + Clone + fmt::Display,
{
    pub fn new(kind: EntityKind, policy: DuplicatePolicy) -> Self {
        Registry {
            kind,
            policy,
            declared: BTreeMap::new(),
            resolved: BTreeMap::new(),
        }
    }

    /// Record a declaration and return its key for chaining
    pub fn declare(&mut self, key: K, attrs: Attrs) -> Result<K, RegistryError> {
        if self.declared.contains_key(&key) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(RegistryError::DuplicateName {
                        kind: self.kind,
                        name: key.to_string(),
                    });
                }
                DuplicatePolicy::Overwrite => {
                    log::debug!("Overwriting earlier declaration of {} '{}'", self.kind, key);
                }
            }
        }
        self.declared.insert(key.clone(), attrs);
        Ok(key)
    }

    pub fn is_declared(&self, key: &K) -> bool {
        self.declared.contains_key(key)
    }

    /// Iterate declarations in key order
    pub fn declarations(&self) -> impl Iterator<Item = (&K, &Attrs)> {
        self.declared.iter()
    }

    pub fn declared_len(&self) -> usize {
        self.declared.len()
    }

    /// Bind a live handle to a declared key. Called only while injecting.
    pub(crate) fn bind(&mut self, key: K, handle: H) {
        debug_assert!(self.declared.contains_key(&key), "binding undeclared {}", key);
        self.resolved.insert(key, handle);
    }

    /// Look up the handle bound to `key`
    pub fn resolve(&self, key: &K) -> Result<&H, RegistryError> {
        self.resolved.get(key).ok_or_else(|| RegistryError::UnknownName {
            kind: self.kind,
            name: key.to_string(),
        })
    }

    pub fn get(&self, key: &K) -> Option<&H> {
        self.resolved.get(key)
    }

    /// All resolved handles. Callers must not depend on the order.
    pub fn handles(&self) -> impl Iterator<Item = &H> {
        self.resolved.values()
    }

    pub fn resolved_keys(&self) -> impl Iterator<Item = &K> {
        self.resolved.keys()
    }

    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }
}
