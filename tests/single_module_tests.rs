//! Building one module in isolation

use std::cell::RefCell;
use std::rc::Rc;
use wireup::{value, ModuleDescriptor, ModuleError, Scope, SingleModuleContext};

/// A module under test: formats a greeting from a local template and a global
fn greeter() -> ModuleDescriptor {
    ModuleDescriptor::new(|r| {
        let template = r.local_as::<String>("templates.greeting")?;
        let user = r.import_as::<String>("USER")?;
        Ok(Some(value(template.replace("{}", &user))))
    })
    .with_id("greeter")
    .depends_on("templates.greeting")
    .global("USER")
}

#[test]
fn test_build_module_with_stand_ins() {
    let harness = SingleModuleContext::new()
        .with_local("templates.greeting", value("hello, {}".to_string()))
        .with_global("USER", value("ada".to_string()));

    let greeting = harness.build_module_as::<String>(greeter()).unwrap();
    assert_eq!(greeting.as_str(), "hello, ada");
}

#[test]
fn test_missing_global_suggests_supplied_ids() {
    let harness = SingleModuleContext::new()
        .with_local("templates.greeting", value("hi {}".to_string()))
        .with_global("USERS", value("nobody".to_string()));

    match harness.build_module(greeter()).unwrap_err() {
        ModuleError::MissingImport { failures, .. } => {
            let global = failures
                .iter()
                .find(|f| matches!(f, ModuleError::MissingGlobal { .. }))
                .unwrap();
            assert_eq!(global.suggestions(), &["USERS".to_string()]);
        }
        e => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_each_build_starts_fresh() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let harness = SingleModuleContext::new().with_local("n", value(1i32));
    let descriptor = ModuleDescriptor::new(move |r| {
        sink.borrow_mut().push(*r.local_as::<i32>("n")?);
        Ok(None)
    })
    .depends_on("n")
    .scope(Scope::Singleton);

    harness.build_module(descriptor.clone()).unwrap();
    harness.build_module(descriptor).unwrap();
    assert_eq!(*log.borrow(), vec![1, 1]);
}

#[test]
fn test_unnamed_module_gets_default_id() {
    let harness = SingleModuleContext::new();
    let err = harness
        .build_module_as::<String>(ModuleDescriptor::constant(value(7u8)))
        .unwrap_err();
    match err {
        ModuleError::TypeMismatch { id, .. } => assert_eq!(id, "module-under-test"),
        e => panic!("unexpected error: {}", e),
    }
}
