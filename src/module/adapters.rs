//! External and global adapters
//!
//! The container never reaches outside itself on its own; hosts plug in an
//! `ExternalResolver` for third-party libraries and a `GlobalResolver` for
//! process-ambient values. The adapters here cover the common cases.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;

use crate::module::traits::{value, ExternalResolver, GlobalResolver, Value};
use crate::utils::env::env_opt;

/// A fixed table of named values
///
/// Works as either adapter. Handy for tests and for hosts that construct
/// their clients up front.
#[derive(Clone, Default)]
pub struct ValueTable {
    values: BTreeMap<String, Value>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ValueTable::insert`]
    pub fn with(mut self, id: impl Into<String>, value: Value) -> Self {
        self.insert(id, value);
        self
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, id: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(id.into(), value)
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.values.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ValueTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl ExternalResolver for ValueTable {
    fn resolve(&self, id: &str) -> anyhow::Result<Value> {
        self.get(id).ok_or_else(|| anyhow!("no value registered for [{}]", id))
    }

    fn known_ids(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl GlobalResolver for ValueTable {
    fn resolve(&self, id: &str) -> Option<Value> {
        self.get(id)
    }

    fn known_ids(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// External resolver used until the host configures one
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternals;

impl ExternalResolver for NoExternals {
    fn resolve(&self, id: &str) -> anyhow::Result<Value> {
        Err(anyhow!(
            "no external resolver configured; cannot provide [{}]",
            id
        ))
    }
}

/// Globals read from the process environment
///
/// Values are the variable's text as a `String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvGlobals;

impl GlobalResolver for EnvGlobals {
    fn resolve(&self, id: &str) -> Option<Value> {
        env_opt(id).map(value)
    }

    fn known_ids(&self) -> Vec<String> {
        std::env::vars().map(|(key, _)| key).collect()
    }
}

impl<F> ExternalResolver for F
where
    F: Fn(&str) -> anyhow::Result<Value>,
{
    fn resolve(&self, id: &str) -> anyhow::Result<Value> {
        self(id)
    }
}

/// Closure form of a global resolver
///
/// A separate wrapper keeps it from overlapping the closure impl of
/// [`ExternalResolver`].
pub struct GlobalFn<F>(pub F);

impl<F> GlobalResolver for GlobalFn<F>
where
    F: Fn(&str) -> Option<Value>,
{
    fn resolve(&self, id: &str) -> Option<Value> {
        (self.0)(id)
    }
}
