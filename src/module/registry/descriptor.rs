//! Module descriptors
//!
//! A descriptor is what a module author hands to the container: an initializer
//! plus the ids it depends on. Descriptors are built in code with the builder
//! methods, or from a TOML table whose keys are checked against the
//! recognized schema.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::module::resolver::Resolver;
use crate::module::suggest::{Suggestions, DEFAULT_SUGGESTION_THRESHOLD};
use crate::module::traits::{ModuleError, Value};
use crate::module::validation::{DescriptorFields, DescriptorValidator};

/// Module initializer
///
/// Returns `Some(value)` to export a value directly, or `None` to fall back to
/// whatever was stored with [`Resolver::set_exports`].
pub type Initializer = Rc<dyn Fn(&mut Resolver<'_>) -> anyhow::Result<Option<Value>>>;

/// Lifetime policy of a module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Scope {
    /// Initialized once per context, then memoized
    #[default]
    Singleton,
    /// Initialized again every time it is resolved
    Instance,
}

impl Scope {
    /// Recognized scope names
    pub const NAMES: [&'static str; 2] = ["singleton", "instance"];

    pub fn name(&self) -> &'static str {
        match self {
            Scope::Singleton => "singleton",
            Scope::Instance => "instance",
        }
    }

    /// Parse a scope name (case-insensitive)
    pub fn parse(name: &str, threshold: usize) -> Result<Self, ModuleError> {
        match name.to_lowercase().as_str() {
            "singleton" => Ok(Scope::Singleton),
            "instance" => Ok(Scope::Instance),
            _ => Err(ModuleError::InvalidScope {
                scope: name.to_string(),
                id: None,
                suggestions: Suggestions::find(name, Self::NAMES, threshold),
            }),
        }
    }
}

impl FromStr for Scope {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::parse(s, DEFAULT_SUGGESTION_THRESHOLD)
    }
}

impl TryFrom<String> for Scope {
    type Error = ModuleError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Scope::parse(&name, DEFAULT_SUGGESTION_THRESHOLD)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared dependency, optionally exposed to the initializer under an alias
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl Dependency {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: None,
        }
    }

    pub fn aliased(id: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            alias: Some(alias.into()),
        }
    }
}

impl From<&str> for Dependency {
    fn from(id: &str) -> Self {
        Dependency::new(id)
    }
}

impl From<String> for Dependency {
    fn from(id: String) -> Self {
        Dependency::new(id)
    }
}

/// Author-supplied module definition
#[derive(Clone)]
pub struct ModuleDescriptor {
    pub(crate) id: Option<String>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) externals: Vec<String>,
    pub(crate) globals: Vec<String>,
    pub(crate) scope: Option<Scope>,
    pub(crate) is_main: bool,
    pub(crate) initializer: Initializer,
}

impl ModuleDescriptor {
    /// Create a descriptor around an initializer
    pub fn new<F>(init: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> anyhow::Result<Option<Value>> + 'static,
    {
        Self {
            id: None,
            dependencies: Vec::new(),
            externals: Vec::new(),
            globals: Vec::new(),
            scope: None,
            is_main: false,
            initializer: Rc::new(init),
        }
    }

    /// A module that always resolves to `value`
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| Ok(Some(value.clone())))
    }

    /// Build a descriptor from a TOML document, validating its keys
    pub fn from_toml_str<F>(text: &str, init: F) -> Result<Self, ModuleError>
    where
        F: Fn(&mut Resolver<'_>) -> anyhow::Result<Option<Value>> + 'static,
    {
        let table: toml::Table = toml::from_str(text).map_err(|e| ModuleError::Schema {
            key: "<document>".to_string(),
            detail: format!("Failed to parse descriptor TOML: {}", e),
            suggestions: Suggestions::none(),
        })?;
        Self::from_table(&table, init)
    }

    /// Build a descriptor from a TOML table, validating its keys
    pub fn from_table<F>(table: &toml::Table, init: F) -> Result<Self, ModuleError>
    where
        F: Fn(&mut Resolver<'_>) -> anyhow::Result<Option<Value>> + 'static,
    {
        let fields = DescriptorValidator::new().parse_table(table)?;
        Ok(Self::from_fields(fields, init))
    }

    /// Attach an initializer to already-validated fields
    pub fn from_fields<F>(fields: DescriptorFields, init: F) -> Self
    where
        F: Fn(&mut Resolver<'_>) -> anyhow::Result<Option<Value>> + 'static,
    {
        let mut descriptor = Self::new(init);
        descriptor.id = fields.id;
        descriptor.dependencies = fields.dependencies;
        for external in fields.externals {
            descriptor = descriptor.external(external);
        }
        for global in fields.globals {
            descriptor = descriptor.global(global);
        }
        descriptor.scope = fields.scope;
        descriptor.is_main = fields.is_main;
        descriptor
    }

    /// Override the id that would otherwise be derived from the source location
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn depends_on(mut self, dependency: impl Into<Dependency>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Depend on `id`, exposed to the initializer as `alias`
    pub fn depends_on_as(self, id: impl Into<String>, alias: impl Into<String>) -> Self {
        self.depends_on(Dependency::aliased(id, alias))
    }

    pub fn external(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.externals.contains(&id) {
            self.externals.push(id);
        }
        self
    }

    pub fn global(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.globals.contains(&id) {
            self.globals.push(id);
        }
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Mark this module as the application entry point
    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("externals", &self.externals)
            .field("globals", &self.globals)
            .field("scope", &self.scope)
            .field("is_main", &self.is_main)
            .finish_non_exhaustive()
    }
}
