//! Resolution engine integration tests

use std::cell::RefCell;
use std::rc::Rc;
use wireup::{value, Context, ModuleDescriptor, ModuleError, Scope};
mod common;
use common::*;

#[test]
fn test_dependency_value_flows_into_dependent() {
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![
            constant("a", 1),
            ModuleDescriptor::new(|r| Ok(Some(value(*r.local_as::<i32>("a")? + 1))))
                .with_id("b")
                .depends_on("a"),
        ],
    )
    .unwrap();

    assert_eq!(*ctx.load_module_as::<i32>("b").unwrap(), 2);
}

#[test]
fn test_mutual_dependency_is_circular() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![node("a", &["b"]), node("b", &["a"])]).unwrap();

    match ctx.load_module("a").unwrap_err() {
        ModuleError::CircularDependency { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
        e => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_three_module_cycle_starts_at_first_occurrence() {
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![
            node("entry", &["a"]),
            node("a", &["b"]),
            node("b", &["c"]),
            node("c", &["a"]),
        ],
    )
    .unwrap();

    let err = ctx.load_module("entry").unwrap_err();
    assert_eq!(err.to_string(), "Circular dependency detected! [a -> b -> c -> a]");
}

#[test]
fn test_self_dependency_is_circular() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![node("loop", &["LOOP"])]).unwrap();
    match ctx.load_module("loop").unwrap_err() {
        ModuleError::CircularDependency { chain } => assert_eq!(chain, vec!["loop", "loop"]),
        e => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_context_usable_after_failure() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![node("a", &["b"]), node("b", &["a"]), constant("ok", 3)]).unwrap();

    assert!(ctx.load_module("a").is_err());
    assert_eq!(*ctx.load_module_as::<i32>("ok").unwrap(), 3);
}

#[test]
fn test_no_main_module() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![constant("a", 1)]).unwrap();
    assert!(matches!(ctx.load_main_module(), Err(ModuleError::NoMainModule)));
    assert_eq!(ctx.main_module_id(), None);
}

#[test]
fn test_main_module_loaded() {
    let mut ctx = Context::new();
    let app = counting_sum("app", &["config"], Scope::Singleton, &CallCounter::new()).main();
    register_all(&mut ctx, vec![constant("config", 41), app]).unwrap();

    assert_eq!(ctx.main_module_id(), Some("app"));
    assert_eq!(*ctx.load_main_module_as::<i32>().unwrap(), 42);
}

#[test]
fn test_missing_id_suggests_close_match_only() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![constant("fooo", 1), constant("bar", 2)]).unwrap();

    let err = ctx.load_module("foo").unwrap_err();
    assert!(matches!(err, ModuleError::MissingDependency { parent: None, .. }));
    assert!(err.suggestions().contains(&"fooo".to_string()));
    assert!(!err.suggestions().contains(&"bar".to_string()));
}

#[test]
fn test_duplicate_ignores_case() {
    let mut ctx = Context::new();
    ctx.add_mapping(constant("Foo.Bar", 1), None, Some("foo/bar.rs")).unwrap();
    let err = ctx.add_mapping(constant("foo.bar", 2), None, None).unwrap_err();
    assert_eq!(err.to_string(), "Already had mapping for [foo.bar] ; see [foo/bar.rs]");
    assert_eq!(ctx.len(), 1);
}

#[test]
fn test_singleton_initialized_once_across_dependents() {
    let shared = CallCounter::new();
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![
            counting_sum("shared", &[], Scope::Singleton, &shared),
            counting_sum("left", &["shared"], Scope::Singleton, &CallCounter::new()),
            counting_sum("right", &["shared"], Scope::Singleton, &CallCounter::new()),
            counting_sum("top", &["left", "right"], Scope::Singleton, &CallCounter::new()),
        ],
    )
    .unwrap();

    // shared = 1, left = right = 2, top = 5
    assert_eq!(*ctx.load_module_as::<i32>("top").unwrap(), 5);
    ctx.load_module("shared").unwrap();
    assert_eq!(shared.get(), 1);
}

#[test]
fn test_instance_initialized_per_resolution() {
    let per_call = CallCounter::new();
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![
            counting_sum("request", &[], Scope::Instance, &per_call),
            counting_sum("a", &["request"], Scope::Singleton, &CallCounter::new()),
            counting_sum("b", &["request"], Scope::Singleton, &CallCounter::new()),
            counting_sum("root", &["a", "b"], Scope::Singleton, &CallCounter::new()),
        ],
    )
    .unwrap();

    ctx.load_module("root").unwrap();
    assert_eq!(per_call.get(), 2);
    ctx.load_module("request").unwrap();
    assert_eq!(per_call.get(), 3);
    assert!(!ctx.is_resolved("request"));
}

#[test]
fn test_dependencies_initialize_in_declaration_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let recorder = |id: &'static str, order: &Rc<RefCell<Vec<&'static str>>>| {
        let order = Rc::clone(order);
        ModuleDescriptor::new(move |_| {
            order.borrow_mut().push(id);
            Ok(None)
        })
        .with_id(id)
    };

    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![
            recorder("z", &order),
            recorder("y", &order).depends_on("z"),
            recorder("x", &order),
            recorder("root", &order).depends_on("y").depends_on("x"),
        ],
    )
    .unwrap();

    ctx.load_module("root").unwrap();
    assert_eq!(*order.borrow(), vec!["z", "y", "x", "root"]);
}

#[test]
fn test_aliased_dependency() {
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![
            constant("services.config.port", 8080),
            ModuleDescriptor::new(|r| Ok(Some(r.local("port")?)))
                .with_id("server")
                .depends_on_as("services.config.port", "port"),
        ],
    )
    .unwrap();

    assert_eq!(*ctx.load_module_as::<i32>("server").unwrap(), 8080);
}

#[test]
fn test_alias_shadowing_another_dependency_rejected() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![constant("x", 1), constant("y", 2)]).unwrap();

    let err = ctx
        .add_mapping(
            ModuleDescriptor::new(|r| Ok(Some(r.local("y")?)))
                .with_id("app")
                .depends_on_as("x", "y")
                .depends_on("y"),
            None,
            None,
        )
        .unwrap_err();

    assert!(matches!(err, ModuleError::Schema { .. }));
    assert!(err.to_string().contains("[x] and [y] are both exposed as [y] in module [app]"));
    assert!(ctx.find_mapping("app").is_none());
}

#[test]
fn test_initializer_error_wrapped() {
    let mut ctx = Context::new();
    ctx.add_mapping(
        ModuleDescriptor::new(|_| Err(anyhow::anyhow!("connection refused"))).with_id("db"),
        None,
        None,
    )
    .unwrap();

    match ctx.load_module("db").unwrap_err() {
        ModuleError::Initializer { id, source } => {
            assert_eq!(id, "db");
            assert_eq!(source.to_string(), "connection refused");
        }
        e => panic!("unexpected error: {}", e),
    }
    assert!(!ctx.is_resolved("db"));
}

#[test]
fn test_resolver_error_propagates_unchanged() {
    let mut ctx = Context::new();
    ctx.add_mapping(
        ModuleDescriptor::new(|r| Ok(Some(r.local("missing")?))).with_id("broken"),
        None,
        None,
    )
    .unwrap();

    assert!(matches!(
        ctx.load_module("broken"),
        Err(ModuleError::MissingImport { .. })
    ));
}

#[test]
fn test_type_mismatch() {
    let mut ctx = Context::new();
    register_all(&mut ctx, vec![constant("n", 1)]).unwrap();
    assert!(matches!(
        ctx.load_module_as::<String>("n"),
        Err(ModuleError::TypeMismatch { .. })
    ));
}

#[test]
fn test_print_dependencies_indents_each_level() {
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![constant("c", 0), node("b", &["c"]), node("a", &["b", "c"])],
    )
    .unwrap();

    let mut out = Vec::new();
    ctx.print_dependencies("a", ">", &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), ">a\n>--b\n>----c\n>--c\n");
}

#[test]
fn test_dependents_of() {
    let mut ctx = Context::new();
    register_all(
        &mut ctx,
        vec![constant("config", 0), node("db", &["config"]), node("web", &["db"])],
    )
    .unwrap();

    assert_eq!(ctx.dependents_of("CONFIG"), vec!["db".to_string()]);
    assert_eq!(ctx.dependents_of("db"), vec!["web".to_string()]);
    assert!(ctx.dependents_of("web").is_empty());
}
