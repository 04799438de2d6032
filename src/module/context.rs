//! Resolution engine
//!
//! A `Context` owns everything one dependency graph needs: the mapping
//! registry, the external cache, the singleton cache and the resolving stack.
//! Contexts share nothing, so each one can be built and thrown away on its own.
//!
//! Resolution is a depth-first walk. Dependencies load in declaration order
//! before their dependent's initializer runs, and a module found on the
//! resolving stack a second time is a circular dependency.

use std::any::Any;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, info};

use crate::config::ContainerConfig;
use crate::module::adapters::{EnvGlobals, NoExternals};
use crate::module::id::NormalizedId;
use crate::module::registry::{
    MappingRegistry, ModuleDescriptor, ModuleMapping, ScannedModule, Scope,
};
use crate::module::resolver::Resolver;
use crate::module::suggest::Suggestions;
use crate::module::traits::{downcast, ExternalResolver, GlobalResolver, ModuleError, Value};
use crate::module::validation::DescriptorValidator;

/// Indentation added per level by [`Context::print_dependencies`]
pub const PRINT_INDENT: &str = "--";

/// Dependency injection context
pub struct Context {
    config: ContainerConfig,
    registry: MappingRegistry,
    external_resolver: Box<dyn ExternalResolver>,
    global_resolver: Box<dyn GlobalResolver>,
    /// Resolved externals by id, shared by every module that declares them
    externals: HashMap<String, Value>,
    /// Resolved singletons by canonical key
    resolved: HashMap<String, Value>,
    /// Canonical keys currently being resolved, outermost first
    resolving: Vec<String>,
}

impl Context {
    /// Create a context with the default configuration
    ///
    /// Globals come from the process environment; externals fail until an
    /// external resolver is set.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: MappingRegistry::with_threshold(config.suggestion_threshold)
                .with_source_extensions(config.source_extensions.clone()),
            config,
            external_resolver: Box::new(NoExternals),
            global_resolver: Box::new(EnvGlobals),
            externals: HashMap::new(),
            resolved: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    /// Replace the external resolver
    ///
    /// Only affects externals registered afterwards.
    pub fn with_external_resolver(mut self, resolver: impl ExternalResolver + 'static) -> Self {
        self.external_resolver = Box::new(resolver);
        self
    }

    pub fn with_global_resolver(mut self, resolver: impl GlobalResolver + 'static) -> Self {
        self.global_resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Register a module
    ///
    /// The id comes from the descriptor or, failing that, from `source_location`
    /// (with `id_prefix` prepended). Declared externals are resolved now, so a
    /// missing library fails registration rather than first use. Returns the
    /// registered mapping.
    pub fn add_mapping(
        &mut self,
        descriptor: ModuleDescriptor,
        id_prefix: Option<&str>,
        source_location: Option<&str>,
    ) -> Result<Rc<ModuleMapping>, ModuleError> {
        let mapping = self.registry.build_mapping(
            descriptor,
            id_prefix,
            source_location,
            self.config.default_scope,
        )?;

        for external in mapping.externals() {
            self.resolve_external(external, mapping.id())?;
        }

        self.registry.add_mapping(mapping)
    }

    /// Register a module described by a TOML table
    pub fn add_mapping_from_table<F>(
        &mut self,
        table: &toml::Table,
        init: F,
        source_location: Option<&str>,
    ) -> Result<Rc<ModuleMapping>, ModuleError>
    where
        F: Fn(&mut Resolver<'_>) -> anyhow::Result<Option<Value>> + 'static,
    {
        let fields = DescriptorValidator::with_threshold(self.config.suggestion_threshold)
            .parse_table(table)?;
        let descriptor = ModuleDescriptor::from_fields(fields, init);
        let prefix = self.config.id_prefix.clone();
        self.add_mapping(descriptor, prefix.as_deref(), source_location)
    }

    /// Register scanned modules in the order given
    ///
    /// Stops at the first failure. Returns the source locations registered.
    pub fn add_scanned<I>(&mut self, modules: I) -> Result<Vec<String>, ModuleError>
    where
        I: IntoIterator<Item = ScannedModule>,
    {
        let prefix = self.config.id_prefix.clone();
        let mut locations = Vec::new();
        for scanned in modules {
            let location = Some(scanned.source_location.as_str());
            self.add_mapping(scanned.descriptor, prefix.as_deref(), location)?;
            locations.push(scanned.source_location);
        }
        debug!("Registered {} scanned modules", locations.len());
        Ok(locations)
    }

    /// Resolve a module by id
    pub fn load_module(&mut self, id: &str) -> Result<Value, ModuleError> {
        self.load(id, None)
    }

    pub fn load_module_as<T: Any>(&mut self, id: &str) -> Result<Rc<T>, ModuleError> {
        let value = self.load_module(id)?;
        downcast(id, value)
    }

    /// Resolve the module registered as main
    pub fn load_main_module(&mut self) -> Result<Value, ModuleError> {
        let id = self
            .registry
            .main_module_id()
            .map(str::to_string)
            .ok_or(ModuleError::NoMainModule)?;
        let value = self.load(&id, None)?;
        info!("Loaded main module [{}]", id);
        Ok(value)
    }

    pub fn load_main_module_as<T: Any>(&mut self) -> Result<Rc<T>, ModuleError> {
        let value = self.load_main_module()?;
        let id = self.registry.main_module_id().unwrap_or_default().to_string();
        downcast(&id, value)
    }

    /// Write the dependency tree under `id`, one module per line
    ///
    /// Each level is indented by another `--`. A dependency already on the
    /// current path is marked ` (cycle)` and not expanded; an unregistered
    /// dependency is marked ` (missing)`. Resolution state is not touched.
    pub fn print_dependencies<W: Write>(
        &self,
        id: &str,
        prefix: &str,
        out: &mut W,
    ) -> anyhow::Result<()> {
        if self.registry.find_mapping(id).is_none() {
            return Err(self.missing_dependency(id, None).into());
        }
        let mut path = Vec::new();
        self.print_tree(id, prefix, &mut path, out)
    }

    fn print_tree<W: Write>(
        &self,
        id: &str,
        prefix: &str,
        path: &mut Vec<String>,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let Some(mapping) = self.registry.find_mapping(id) else {
            writeln!(out, "{}{} (missing)", prefix, id)?;
            return Ok(());
        };
        let key = mapping.canonical_key().to_string();
        if path.contains(&key) {
            writeln!(out, "{}{} (cycle)", prefix, id)?;
            return Ok(());
        }

        writeln!(out, "{}{}", prefix, id)?;
        path.push(key);
        let nested = format!("{}{}", prefix, PRINT_INDENT);
        for dependency in mapping.dependencies() {
            self.print_tree(dependency.id().raw(), &nested, path, out)?;
        }
        path.pop();
        Ok(())
    }

    /// Ids of registered modules that depend on `id`
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        self.registry.dependents_of(id)
    }

    /// Every registered id, in registration order
    pub fn all_ids(&self) -> Vec<String> {
        self.registry.all_ids()
    }

    pub fn find_mapping(&self, id: &str) -> Option<Rc<ModuleMapping>> {
        self.registry.find_mapping(id)
    }

    pub fn main_module_id(&self) -> Option<&str> {
        self.registry.main_module_id()
    }

    /// Whether `id` is a singleton that has already been resolved
    pub fn is_resolved(&self, id: &str) -> bool {
        NormalizedId::parse(id)
            .map(|n| self.resolved.contains_key(n.canonical_key()))
            .unwrap_or(false)
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn resolve_external(&mut self, id: &str, module: &str) -> Result<(), ModuleError> {
        if self.externals.contains_key(id) {
            return Ok(());
        }
        match self.external_resolver.resolve(id) {
            Ok(value) => {
                debug!("Resolved external [{}] for [{}]", id, module);
                self.externals.insert(id.to_string(), value);
                Ok(())
            }
            Err(e) => Err(ModuleError::MissingExternal {
                id: id.to_string(),
                module: Some(module.to_string()),
                detail: Some(e.to_string()),
                suggestions: Suggestions::find(
                    id,
                    self.external_resolver.known_ids(),
                    self.config.suggestion_threshold,
                ),
            }),
        }
    }

    fn missing_dependency(&self, id: &str, parent: Option<&str>) -> ModuleError {
        ModuleError::MissingDependency {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            suggestions: Suggestions::find(
                id,
                self.registry.all_ids(),
                self.config.suggestion_threshold,
            ),
        }
    }

    fn load(&mut self, id: &str, parent: Option<&str>) -> Result<Value, ModuleError> {
        let normalized = NormalizedId::parse(id)?;
        let mapping = self
            .registry
            .get(normalized.canonical_key())
            .ok_or_else(|| self.missing_dependency(id, parent))?;
        let key = mapping.canonical_key();

        if mapping.scope() == Scope::Singleton {
            if let Some(value) = self.resolved.get(key) {
                debug!("Module [{}] already resolved", mapping.id());
                return Ok(Rc::clone(value));
            }
        }

        if let Some(start) = self.resolving.iter().position(|k| k == key) {
            let mut chain = self.resolving[start..].to_vec();
            chain.push(key.to_string());
            return Err(ModuleError::CircularDependency { chain });
        }

        let depth = self.resolving.len();
        self.resolving.push(key.to_string());
        let result = self.instantiate(&mapping);
        self.resolving.truncate(depth);
        let value = result?;

        if mapping.scope() == Scope::Singleton {
            self.resolved.insert(key.to_string(), Rc::clone(&value));
        }
        debug!("Resolved module [{}] ({})", mapping.id(), mapping.scope());
        Ok(value)
    }

    fn instantiate(&mut self, mapping: &ModuleMapping) -> Result<Value, ModuleError> {
        let mut locals = Vec::with_capacity(mapping.dependencies().len());
        for dependency in mapping.dependencies() {
            let value = self.load(dependency.id().raw(), Some(mapping.id()))?;
            locals.push((dependency.key(), value));
        }

        let mut resolver = Resolver::new(
            mapping,
            locals,
            &self.externals,
            &*self.global_resolver,
            self.config.suggestion_threshold,
        );
        let returned = mapping
            .initialize(&mut resolver)
            .map_err(|e| ModuleError::from_initializer(mapping.id(), e))?;

        Ok(returned
            .or_else(|| resolver.take_exports())
            .unwrap_or_else(|| Rc::new(())))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
