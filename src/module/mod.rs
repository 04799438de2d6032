//! Module system for wireup
//!
//! Modules are registered as descriptors, turned into immutable mappings, and
//! resolved on demand by a [`Context`].
//!
//! ## Architecture
//!
//! - **Registry**: one mapping per case-insensitive id, plus the main module
//! - **Resolution**: depth-first, declaration order, with cycle detection
//! - **Scopes**: singletons are memoized per context; instances are rebuilt on every resolution
//! - **Capabilities**: an initializer sees only the locals, externals and globals it declared
//! - **Diagnostics**: every lookup failure carries "maybe you meant" suggestions

pub mod adapters;
pub mod context;
pub mod id;
pub mod registry;
pub mod resolver;
pub mod single;
pub mod suggest;
pub mod traits;
pub mod validation;

pub use adapters::{EnvGlobals, GlobalFn, NoExternals, ValueTable};
pub use context::Context;
pub use id::{Namespace, NormalizedId};
pub use registry::{
    Dependency, MappingRegistry, ModuleDescriptor, ModuleMapping, ScannedModule, Scope,
};
pub use resolver::Resolver;
pub use single::SingleModuleContext;
pub use suggest::{suggest, Suggestions, DEFAULT_SUGGESTION_THRESHOLD};
pub use traits::{downcast, value, ExternalResolver, GlobalResolver, ModuleError, Value};
