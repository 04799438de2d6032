//! wireup - a small dependency injection container
//!
//! Modules declare an id, the modules they depend on, the external libraries
//! and process globals they need, and an initializer. A [`Context`] registers
//! them and resolves any module on demand, initializing its dependencies first.
//!
//! ## Design Principles
//!
//! 1. **Explicit Wiring**: dependencies are declared, never inferred
//! 2. **Fail At Startup**: missing ids, duplicates and cycles are errors, with suggestions
//! 3. **Isolated State**: each `Context` owns its caches; nothing is process-global
//! 4. **Single-Threaded**: resolution is a plain recursive call
//!
//! ## Example
//!
//! ```rust
//! use wireup::{value, Context, ModuleDescriptor};
//!
//! let mut ctx = Context::new();
//! ctx.add_mapping(ModuleDescriptor::constant(value(1i32)).with_id("a"), None, None)?;
//! ctx.add_mapping(
//!     ModuleDescriptor::new(|r| Ok(Some(value(*r.local_as::<i32>("a")? + 1))))
//!         .with_id("b")
//!         .depends_on("a"),
//!     None,
//!     None,
//! )?;
//! assert_eq!(*ctx.load_module_as::<i32>("b")?, 2);
//! # Ok::<(), wireup::ModuleError>(())
//! ```

pub mod config;
pub mod module;
pub mod utils;

pub use config::{ContainerConfig, LoggingConfig};
pub use module::{
    downcast, value, Context, Dependency, EnvGlobals, ExternalResolver, GlobalFn, GlobalResolver,
    ModuleDescriptor, ModuleError, NoExternals, Resolver, ScannedModule, Scope,
    SingleModuleContext, Value, ValueTable,
};
