//! Mapping registry
//!
//! Stores one immutable `ModuleMapping` per canonical id and tracks the main
//! module. Registration is additive; there is no removal.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

use crate::module::id::{
    id_from_source_location, Namespace, NormalizedId, DEFAULT_SOURCE_EXTENSIONS,
};
use crate::module::registry::descriptor::{Initializer, ModuleDescriptor, Scope};
use crate::module::resolver::Resolver;
use crate::module::suggest::{Suggestions, DEFAULT_SUGGESTION_THRESHOLD};
use crate::module::traits::{ModuleError, Value};

/// A local dependency of a mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedDependency {
    id: NormalizedId,
    alias: Option<String>,
}

impl MappedDependency {
    pub fn id(&self) -> &NormalizedId {
        &self.id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Key the resolved value is stored under in the initializer's resolver
    pub fn key(&self) -> String {
        match &self.alias {
            Some(alias) => alias.to_lowercase(),
            None => self.id.canonical_key().to_string(),
        }
    }
}

/// Registered module record
pub struct ModuleMapping {
    id: String,
    key: String,
    source_location: Option<String>,
    dependencies: Vec<MappedDependency>,
    scope: Scope,
    externals: Vec<String>,
    globals: Vec<String>,
    is_main: bool,
    initializer: Initializer,
}

impl ModuleMapping {
    /// Id as declared or derived
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn canonical_key(&self) -> &str {
        &self.key
    }

    pub fn source_location(&self) -> Option<&str> {
        self.source_location.as_deref()
    }

    pub fn dependencies(&self) -> &[MappedDependency] {
        &self.dependencies
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn externals(&self) -> &[String] {
        &self.externals
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub(crate) fn initialize(&self, resolver: &mut Resolver<'_>) -> anyhow::Result<Option<Value>> {
        (self.initializer)(resolver)
    }
}

impl fmt::Debug for ModuleMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleMapping")
            .field("id", &self.id)
            .field("source_location", &self.source_location)
            .field("dependencies", &self.dependencies)
            .field("scope", &self.scope)
            .field("externals", &self.externals)
            .field("globals", &self.globals)
            .field("is_main", &self.is_main)
            .finish_non_exhaustive()
    }
}

/// Registry of module mappings keyed by canonical id
pub struct MappingRegistry {
    mappings: HashMap<String, Rc<ModuleMapping>>,
    /// Canonical keys in registration order
    order: Vec<String>,
    main_module: Option<String>,
    threshold: usize,
    /// Extensions stripped when an id is derived from a source location
    source_extensions: Vec<String>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_SUGGESTION_THRESHOLD)
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            mappings: HashMap::new(),
            order: Vec::new(),
            main_module: None,
            threshold,
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    /// Turn a descriptor into a mapping without registering it
    ///
    /// Derives the id, normalizes every dependency and moves `lib::` and
    /// `global::` dependencies into the external and global sets. A repeated
    /// local dependency is kept once; two different modules may not share the
    /// key their value is exposed under. Fails if the mapping could not be
    /// registered as things stand.
    pub fn build_mapping(
        &self,
        descriptor: ModuleDescriptor,
        id_prefix: Option<&str>,
        source_location: Option<&str>,
        default_scope: Scope,
    ) -> Result<ModuleMapping, ModuleError> {
        let id = match (descriptor.id, source_location) {
            (Some(id), _) => id,
            (None, Some(location)) => {
                id_from_source_location(location, id_prefix, &self.source_extensions)?
            }
            (None, None) => {
                return Err(ModuleError::MalformedId {
                    id: String::new(),
                    reason: "descriptor has neither an id nor a source location".to_string(),
                })
            }
        };

        let normalized = NormalizedId::parse(&id)?;
        if !normalized.prefix().is_empty() {
            return Err(ModuleError::MalformedId {
                id,
                reason: "module ids cannot carry a namespace prefix".to_string(),
            });
        }

        let mut externals = descriptor.externals;
        let mut globals = descriptor.globals;
        let mut dependencies: Vec<MappedDependency> =
            Vec::with_capacity(descriptor.dependencies.len());
        for dependency in descriptor.dependencies {
            let dep_id = NormalizedId::parse(&dependency.id)?;
            match dep_id.namespace() {
                Some(Namespace::Local) => {
                    let mapped = MappedDependency {
                        id: dep_id,
                        alias: dependency.alias,
                    };
                    let key = mapped.key();
                    if let Some(clash) = dependencies.iter().find(|d| d.key() == key) {
                        if clash.id().canonical_key() == mapped.id().canonical_key() {
                            continue;
                        }
                        return Err(ModuleError::Schema {
                            key: "dependencies".to_string(),
                            detail: format!(
                                "[{}] and [{}] are both exposed as [{}] in module [{}]",
                                clash.id(),
                                mapped.id(),
                                key,
                                id
                            ),
                            suggestions: Suggestions::none(),
                        });
                    }
                    dependencies.push(mapped);
                }
                Some(Namespace::External) => push_unique(&mut externals, dep_id.name()),
                Some(Namespace::Global) => push_unique(&mut globals, dep_id.name()),
                None => {
                    return Err(ModuleError::UnknownNamespace {
                        suggestions: Suggestions::find(
                            dep_id.prefix(),
                            Namespace::PREFIXES,
                            self.threshold,
                        ),
                        namespace: dep_id.prefix().to_string(),
                        id: dependency.id,
                    })
                }
            }
        }

        let mapping = ModuleMapping {
            key: normalized.canonical_key().to_string(),
            id,
            source_location: source_location.map(str::to_string),
            dependencies,
            scope: descriptor.scope.unwrap_or(default_scope),
            externals,
            globals,
            is_main: descriptor.is_main,
            initializer: descriptor.initializer,
        };
        self.ensure_insertable(&mapping)?;
        Ok(mapping)
    }

    /// Register a mapping
    pub fn add_mapping(
        &mut self,
        mapping: ModuleMapping,
    ) -> Result<Rc<ModuleMapping>, ModuleError> {
        self.ensure_insertable(&mapping)?;
        if mapping.is_main {
            self.set_main(&mapping.id)?;
        }

        let key = mapping.key.clone();
        let mapping = Rc::new(mapping);
        self.mappings.insert(key.clone(), Rc::clone(&mapping));
        self.order.push(key);
        debug!(
            "Registered module [{}] ({}, {} dependencies)",
            mapping.id,
            mapping.scope,
            mapping.dependencies.len()
        );
        Ok(mapping)
    }

    /// Record the main module id
    pub fn set_main(&mut self, id: &str) -> Result<(), ModuleError> {
        if let Some(existing) = &self.main_module {
            return Err(ModuleError::MainAlreadySet {
                id: id.to_string(),
                existing: existing.clone(),
            });
        }
        self.main_module = Some(id.to_string());
        Ok(())
    }

    /// Find a mapping by any spelling of its id
    pub fn find_mapping(&self, id: &str) -> Option<Rc<ModuleMapping>> {
        let normalized = NormalizedId::parse(id).ok()?;
        self.get(normalized.canonical_key())
    }

    /// Find a mapping by canonical key
    pub fn get(&self, key: &str) -> Option<Rc<ModuleMapping>> {
        self.mappings.get(key).cloned()
    }

    /// Declared ids of every mapping, in registration order
    pub fn all_ids(&self) -> Vec<String> {
        self.iter().map(|m| m.id.clone()).collect()
    }

    /// Mappings in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rc<ModuleMapping>> {
        self.order.iter().filter_map(|key| self.mappings.get(key))
    }

    /// Ids of the modules that declare `id` as a local dependency
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        let Ok(target) = NormalizedId::parse(id) else {
            return Vec::new();
        };
        self.iter()
            .filter(|m| {
                m.dependencies
                    .iter()
                    .any(|d| d.id.canonical_key() == target.canonical_key())
            })
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn main_module_id(&self) -> Option<&str> {
        self.main_module.as_deref()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn ensure_insertable(&self, mapping: &ModuleMapping) -> Result<(), ModuleError> {
        if let Some(existing) = self.mappings.get(&mapping.key) {
            return Err(ModuleError::DuplicateMapping {
                id: mapping.id.clone(),
                previous: existing.source_location.clone(),
            });
        }
        if mapping.is_main {
            if let Some(existing) = &self.main_module {
                return Err(ModuleError::MainAlreadySet {
                    id: mapping.id.clone(),
                    existing: existing.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}
