//! Resolver handed to module initializers
//!
//! A resolver only sees what its module declared: resolved local dependencies,
//! declared externals and declared globals. Anything else is a lookup failure
//! with suggestions drawn from what the module could have asked for.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::module::id::{Namespace, NormalizedId};
use crate::module::registry::mapping::ModuleMapping;
use crate::module::suggest::Suggestions;
use crate::module::traits::{downcast, GlobalResolver, ModuleError, Value};

/// Capability object for one module initialization
pub struct Resolver<'a> {
    mapping: &'a ModuleMapping,
    locals: HashMap<String, Value>,
    /// Local keys in declaration order, for suggestions
    local_ids: Vec<String>,
    externals: &'a HashMap<String, Value>,
    globals: &'a dyn GlobalResolver,
    threshold: usize,
    exports: Option<Value>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        mapping: &'a ModuleMapping,
        resolved: Vec<(String, Value)>,
        externals: &'a HashMap<String, Value>,
        globals: &'a dyn GlobalResolver,
        threshold: usize,
    ) -> Self {
        let mut locals = HashMap::with_capacity(resolved.len());
        let mut local_ids = Vec::with_capacity(resolved.len());
        for (key, value) in resolved {
            if locals.insert(key.clone(), value).is_none() {
                local_ids.push(key);
            }
        }
        Self {
            mapping,
            locals,
            local_ids,
            externals,
            globals,
            threshold,
            exports: None,
        }
    }

    /// Id of the module being initialized
    pub fn module_id(&self) -> &str {
        self.mapping.id()
    }

    /// A resolved local dependency, by id or alias (case-insensitive)
    pub fn local(&self, id: &str) -> Result<Value, ModuleError> {
        let key = NormalizedId::parse(id)?;
        self.locals
            .get(key.canonical_key())
            .cloned()
            .ok_or_else(|| ModuleError::MissingImport {
                id: id.to_string(),
                module: self.mapping.id().to_string(),
                failures: Vec::new(),
                suggestions: self.suggest(id, &self.local_ids),
            })
    }

    /// A declared external dependency
    pub fn external(&self, id: &str) -> Result<Value, ModuleError> {
        let declared = self.mapping.externals();
        if !declared.iter().any(|e| e == id) {
            return Err(ModuleError::MissingExternal {
                id: id.to_string(),
                module: Some(self.mapping.id().to_string()),
                detail: None,
                suggestions: self.suggest(id, declared),
            });
        }
        // Declared externals are resolved when the module is registered
        self.externals
            .get(id)
            .cloned()
            .ok_or_else(|| ModuleError::MissingExternal {
                id: id.to_string(),
                module: Some(self.mapping.id().to_string()),
                detail: Some("declared but never resolved".to_string()),
                suggestions: Suggestions::none(),
            })
    }

    /// A declared global, fetched from the host's global resolver
    pub fn global(&self, id: &str) -> Result<Value, ModuleError> {
        let declared = self.mapping.globals();
        if !declared.iter().any(|g| g == id) {
            return Err(ModuleError::MissingGlobal {
                id: id.to_string(),
                module: Some(self.mapping.id().to_string()),
                suggestions: self.suggest(id, declared),
            });
        }
        self.globals.resolve(id).ok_or_else(|| ModuleError::MissingGlobal {
            id: id.to_string(),
            module: Some(self.mapping.id().to_string()),
            suggestions: self.suggest(id, &self.globals.known_ids()),
        })
    }

    /// Look up `id` in locals, then externals, then globals
    ///
    /// A `lib::` or `global::` prefix restricts the lookup to that namespace.
    pub fn import(&self, id: &str) -> Result<Value, ModuleError> {
        let normalized = NormalizedId::parse(id)?;
        match normalized.namespace() {
            Some(Namespace::External) => return self.external(normalized.name()),
            Some(Namespace::Global) => return self.global(normalized.name()),
            Some(Namespace::Local) => {}
            None => {
                return Err(ModuleError::UnknownNamespace {
                    id: id.to_string(),
                    namespace: normalized.prefix().to_string(),
                    suggestions: self.suggest(normalized.prefix(), &Namespace::PREFIXES),
                })
            }
        }

        let mut failures = Vec::with_capacity(3);
        match self.local(id) {
            Ok(v) => return Ok(v),
            Err(e) => failures.push(e),
        }
        match self.external(id) {
            Ok(v) => return Ok(v),
            Err(e) => failures.push(e),
        }
        match self.global(id) {
            Ok(v) => return Ok(v),
            Err(e) => failures.push(e),
        }

        let everything = self
            .local_ids
            .iter()
            .chain(self.mapping.externals())
            .chain(self.mapping.globals());
        Err(ModuleError::MissingImport {
            id: id.to_string(),
            module: self.mapping.id().to_string(),
            failures,
            suggestions: Suggestions::find(id, everything, self.threshold),
        })
    }

    pub fn local_as<T: Any>(&self, id: &str) -> Result<Rc<T>, ModuleError> {
        downcast(id, self.local(id)?)
    }

    pub fn external_as<T: Any>(&self, id: &str) -> Result<Rc<T>, ModuleError> {
        downcast(id, self.external(id)?)
    }

    pub fn global_as<T: Any>(&self, id: &str) -> Result<Rc<T>, ModuleError> {
        downcast(id, self.global(id)?)
    }

    pub fn import_as<T: Any>(&self, id: &str) -> Result<Rc<T>, ModuleError> {
        downcast(id, self.import(id)?)
    }

    /// Set the value the module exports when its initializer returns `None`
    ///
    /// A value returned from the initializer takes precedence.
    pub fn set_exports(&mut self, value: Value) {
        self.exports = Some(value);
    }

    pub fn exports(&self) -> Option<&Value> {
        self.exports.as_ref()
    }

    pub(crate) fn take_exports(&mut self) -> Option<Value> {
        self.exports.take()
    }

    fn suggest<S: AsRef<str>>(&self, id: &str, candidates: &[S]) -> Suggestions {
        Suggestions::find(id, candidates, self.threshold)
    }
}
