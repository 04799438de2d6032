//! Shared helpers for integration tests
#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use wireup::{value, Context, ModuleDescriptor, ModuleError, Scope};

/// Counts initializer runs
#[derive(Clone, Default)]
pub struct CallCounter(Rc<Cell<usize>>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    fn bump(&self) -> usize {
        self.0.set(self.0.get() + 1);
        self.0.get()
    }
}

/// Module that resolves to `v` and has no dependencies
pub fn constant(id: &str, v: i32) -> ModuleDescriptor {
    ModuleDescriptor::constant(value(v)).with_id(id)
}

/// Module that resolves to unit and depends on `deps`
pub fn node(id: &str, deps: &[&str]) -> ModuleDescriptor {
    deps.iter()
        .fold(ModuleDescriptor::new(|_| Ok(None)).with_id(id), |d, dep| d.depends_on(*dep))
}

/// Module that sums its dependencies plus one, counting each run
pub fn counting_sum(
    id: &str,
    deps: &[&str],
    scope: Scope,
    counter: &CallCounter,
) -> ModuleDescriptor {
    let counter = counter.clone();
    let names: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
    let descriptor = ModuleDescriptor::new(move |r| {
        counter.bump();
        let mut total = 1i32;
        for name in &names {
            total += *r.local_as::<i32>(name)?;
        }
        Ok(Some(value(total)))
    })
    .with_id(id)
    .scope(scope);
    deps.iter().fold(descriptor, |d, dep| d.depends_on(*dep))
}

/// Register every descriptor with no prefix or location
pub fn register_all(
    ctx: &mut Context,
    descriptors: Vec<ModuleDescriptor>,
) -> Result<(), ModuleError> {
    for descriptor in descriptors {
        ctx.add_mapping(descriptor, None, None)?;
    }
    Ok(())
}
