//! Build a single module in isolation
//!
//! Unit tests for a module rarely want the whole graph. `SingleModuleContext`
//! stands in fixed values for its locals, externals and globals and resolves
//! just that one module against them.

use std::any::Any;
use std::rc::Rc;

use crate::module::adapters::ValueTable;
use crate::module::context::Context;
use crate::module::registry::ModuleDescriptor;
use crate::module::traits::{downcast, ModuleError, Value};

/// Id given to the module under test when its descriptor has none
pub const DEFAULT_MODULE_ID: &str = "module-under-test";

/// Test harness resolving one module against fixed values
#[derive(Debug, Default)]
pub struct SingleModuleContext {
    locals: Vec<(String, Value)>,
    externals: ValueTable,
    globals: ValueTable,
}

impl SingleModuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a local dependency; it is registered as a constant module
    pub fn with_local(mut self, id: impl Into<String>, value: Value) -> Self {
        self.locals.push((id.into(), value));
        self
    }

    pub fn with_external(mut self, id: impl Into<String>, value: Value) -> Self {
        self.externals.insert(id, value);
        self
    }

    pub fn with_global(mut self, id: impl Into<String>, value: Value) -> Self {
        self.globals.insert(id, value);
        self
    }

    /// Register the locals and `descriptor` in a fresh context and resolve it
    ///
    /// A dependency, external or global the harness was not given fails the
    /// same way it would in a full context, suggestions included.
    pub fn build_module(&self, descriptor: ModuleDescriptor) -> Result<Value, ModuleError> {
        let mut context = Context::new()
            .with_external_resolver(self.externals.clone())
            .with_global_resolver(self.globals.clone());

        for (id, value) in &self.locals {
            let local = ModuleDescriptor::constant(Rc::clone(value)).with_id(id.as_str());
            context.add_mapping(local, None, None)?;
        }

        let descriptor = match descriptor.id() {
            Some(_) => descriptor,
            None => descriptor.with_id(DEFAULT_MODULE_ID),
        };
        let mapping = context.add_mapping(descriptor, None, None)?;
        context.load_module(mapping.id())
    }

    pub fn build_module_as<T: Any>(
        &self,
        descriptor: ModuleDescriptor,
    ) -> Result<Rc<T>, ModuleError> {
        let id = descriptor.id().unwrap_or(DEFAULT_MODULE_ID).to_string();
        downcast(&id, self.build_module(descriptor)?)
    }
}
