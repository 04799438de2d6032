//! Module registry
//!
//! Handles module descriptors, id derivation, and the mapping registry.

pub mod descriptor;
pub mod mapping;

pub use descriptor::{Dependency, Initializer, ModuleDescriptor, Scope};
pub use mapping::{MappedDependency, MappingRegistry, ModuleMapping};

/// One descriptor handed over by a scanner, with where it came from
///
/// Scanning itself (walking directories, loading files) belongs to the host;
/// the container only registers what it is given, in order.
#[derive(Debug, Clone)]
pub struct ScannedModule {
    pub descriptor: ModuleDescriptor,
    /// Relative location the module id is derived from, e.g. `services/mailer.rs`
    pub source_location: String,
}

impl ScannedModule {
    pub fn new(descriptor: ModuleDescriptor, source_location: impl Into<String>) -> Self {
        Self {
            descriptor,
            source_location: source_location.into(),
        }
    }
}
