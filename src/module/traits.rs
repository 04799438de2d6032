//! Module system traits and interfaces
//!
//! Defines the value type modules resolve to, the adapter traits the host
//! plugs in for externals and globals, and the error taxonomy.

use std::any::{type_name, Any};
use std::rc::Rc;
use thiserror::Error;

use crate::module::suggest::Suggestions;

/// A resolved module, external or global
///
/// Resolution is single-threaded, so values are reference counted without
/// atomics and may hold interior-mutable state.
pub type Value = Rc<dyn Any>;

/// Wrap a plain value
pub fn value<T: Any>(v: T) -> Value {
    Rc::new(v)
}

/// Downcast a resolved value to a concrete type
pub fn downcast<T: Any>(id: &str, value: Value) -> Result<Rc<T>, ModuleError> {
    value.downcast::<T>().map_err(|_| ModuleError::TypeMismatch {
        id: id.to_string(),
        expected: type_name::<T>(),
    })
}

/// Host-supplied lookup for external dependencies (third-party libraries, clients, ...)
///
/// Called at most once per external id per context; the result is cached.
pub trait ExternalResolver {
    /// Resolve an external id, failing if the host cannot provide it
    fn resolve(&self, id: &str) -> anyhow::Result<Value>;

    /// Every id this resolver could provide, used for suggestions
    fn known_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Host-supplied lookup for process-ambient values
///
/// Consulted on every `global` lookup; nothing is cached.
pub trait GlobalResolver {
    /// Look up a global; `None` means the host has no such value
    fn resolve(&self, id: &str) -> Option<Value>;

    /// Every id this resolver could provide, used for suggestions
    fn known_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Module system errors
///
/// Every error is fatal to the `add_mapping` / `load_module` call that raised
/// it; nothing is retried.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Invalid module descriptor key: [{key}]: {detail}{suggestions}")]
    Schema {
        key: String,
        detail: String,
        suggestions: Suggestions,
    },

    #[error("Already had mapping for [{id}]{}", see_location(.previous))]
    DuplicateMapping { id: String, previous: Option<String> },

    #[error("Unrecognized scope: [{scope}]{}{suggestions}", for_id(.id))]
    InvalidScope {
        scope: String,
        id: Option<String>,
        suggestions: Suggestions,
    },

    #[error("Could not make [{id}] the main module; [{existing}] was already defined as the main module")]
    MainAlreadySet { id: String, existing: String },

    #[error("Could not find dependency [{id}]{}{suggestions}", in_dependencies_for(.parent))]
    MissingDependency {
        id: String,
        parent: Option<String>,
        suggestions: Suggestions,
    },

    #[error(
        "Could not find import [{id}] from module [{module}]{}{suggestions}",
        render_failures(.failures)
    )]
    MissingImport {
        id: String,
        module: String,
        /// Per-namespace failures when raised by `import`
        failures: Vec<ModuleError>,
        suggestions: Suggestions,
    },

    #[error(
        "Could not find external dependency [{id}]{}{}{suggestions}",
        from_module(.module),
        with_detail(.detail)
    )]
    MissingExternal {
        id: String,
        module: Option<String>,
        detail: Option<String>,
        suggestions: Suggestions,
    },

    #[error("Could not find global [{id}]{}{suggestions}", from_module(.module))]
    MissingGlobal {
        id: String,
        module: Option<String>,
        suggestions: Suggestions,
    },

    #[error("Circular dependency detected! [{}]", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("No main module was found")]
    NoMainModule,

    #[error("Invalid ID: [{id}]: {reason}")]
    MalformedId { id: String, reason: String },

    #[error("Unrecognized namespace [{namespace}] in [{id}]{suggestions}")]
    UnknownNamespace {
        id: String,
        namespace: String,
        suggestions: Suggestions,
    },

    #[error("Module [{id}] is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    #[error("Initializer for module [{id}] failed: {source}")]
    Initializer {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ModuleError {
    /// Suggestions carried by the error, empty for kinds that have none
    pub fn suggestions(&self) -> &[String] {
        match self {
            ModuleError::Schema { suggestions, .. }
            | ModuleError::InvalidScope { suggestions, .. }
            | ModuleError::MissingDependency { suggestions, .. }
            | ModuleError::MissingImport { suggestions, .. }
            | ModuleError::MissingExternal { suggestions, .. }
            | ModuleError::MissingGlobal { suggestions, .. }
            | ModuleError::UnknownNamespace { suggestions, .. } => suggestions.as_slice(),
            _ => &[],
        }
    }

    /// Recover a `ModuleError` raised inside an initializer, wrapping anything else
    pub(crate) fn from_initializer(id: &str, error: anyhow::Error) -> Self {
        match error.downcast::<ModuleError>() {
            Ok(module_error) => module_error,
            Err(source) => ModuleError::Initializer {
                id: id.to_string(),
                source,
            },
        }
    }
}

fn see_location(previous: &Option<String>) -> String {
    previous
        .as_ref()
        .map(|p| format!(" ; see [{}]", p))
        .unwrap_or_default()
}

fn for_id(id: &Option<String>) -> String {
    id.as_ref()
        .map(|i| format!(" for ID [{}]", i))
        .unwrap_or_default()
}

fn in_dependencies_for(parent: &Option<String>) -> String {
    parent
        .as_ref()
        .map(|p| format!(" in dependencies for [{}]", p))
        .unwrap_or_default()
}

fn from_module(module: &Option<String>) -> String {
    module
        .as_ref()
        .map(|m| format!(" from module [{}]", m))
        .unwrap_or_default()
}

fn with_detail(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

fn render_failures(failures: &[ModuleError]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
    format!(" ({})", rendered.join("; "))
}
