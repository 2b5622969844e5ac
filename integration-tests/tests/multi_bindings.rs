//! Test for registration laws and multi bindings
//!
//! This test verifies:
//! 1. Registering a non-multi token twice keeps only the last binding
//! 2. Multi bindings resolve to every instance in registration order
//! 3. A single request on a token with several bindings is ambiguous
//! 4. A multi request with no bindings yields an empty list
//! 5. Multi dependencies reach factories as lists

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use toni_di::{Binding, Dependency, Injector, InjectorError, Scope, Token};

trait Plugin: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
}

#[derive(Debug)]
struct Auth;
#[derive(Debug)]
struct Metrics;

impl Plugin for Auth {
    fn name(&self) -> &'static str {
        "auth"
    }
}

impl Plugin for Metrics {
    fn name(&self) -> &'static str {
        "metrics"
    }
}

type DynPlugin = Box<dyn Plugin>;

const PLUGINS: Token<DynPlugin> = Token::new("PLUGINS");

// ============= Overwrite Law =============

#[test]
fn test_last_registration_wins() {
    let injector = Injector::new("app");
    injector.register("MODE", Binding::value("debug"));
    injector.register("MODE", Binding::value("release"));

    let mode = injector.resolve(&Token::<&'static str>::new("MODE")).unwrap();
    assert_eq!(*mode, "release");
    assert_eq!(injector.bindings(&"MODE".into()).len(), 1);
}

#[test]
fn test_single_registration_replaces_multi_list() {
    let injector = Injector::new("app");
    injector.register("LIST", Binding::value(1_u8).multi());
    injector.register("LIST", Binding::value(2_u8).multi());
    injector.register("LIST", Binding::value(3_u8));

    assert_eq!(*injector.resolve(&Token::<u8>::new("LIST")).unwrap(), 3);
}

// ============= Multi Law =============

#[test]
fn test_multi_in_registration_order() {
    let injector = Injector::new("app");
    injector.register(&PLUGINS, Binding::value(Box::new(Auth) as DynPlugin).multi());
    injector.register(
        &PLUGINS,
        Binding::factory(|_| Ok(Box::new(Metrics) as DynPlugin)).multi(),
    );

    let plugins = injector.resolve_multi(&PLUGINS).unwrap();
    let names: Vec<_> = plugins.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["auth", "metrics"]);
}

#[test]
fn test_single_request_with_many_bindings_is_ambiguous() {
    let injector = Injector::new("app");
    injector.register(&PLUGINS, Binding::value(Box::new(Auth) as DynPlugin).multi());
    injector.register(&PLUGINS, Binding::value(Box::new(Metrics) as DynPlugin).multi());

    let err = injector.resolve(&PLUGINS).unwrap_err();
    assert!(err.is_ambiguous());
    assert!(matches!(
        err,
        InjectorError::AmbiguousBinding { candidates: 2, .. }
    ));
}

#[test]
fn test_single_request_with_one_multi_binding() {
    let injector = Injector::new("app");
    injector.register(&PLUGINS, Binding::value(Box::new(Auth) as DynPlugin).multi());

    let plugin = injector.resolve(&PLUGINS).unwrap();
    assert_eq!(plugin.name(), "auth");
}

#[test]
fn test_duplicate_entries_are_not_merged() {
    let injector = Injector::new("app");
    let shared: Arc<u8> = Arc::new(1);
    injector.register("SAME", Binding::instance(shared.clone()).multi());
    injector.register("SAME", Binding::instance(shared).multi());

    let err = injector.resolve(&Token::<u8>::new("SAME")).unwrap_err();
    assert!(err.is_ambiguous());
}

#[test]
fn test_empty_multi_request() {
    let injector = Injector::new("app");
    let plugins = injector.resolve_multi(&PLUGINS).unwrap();
    assert!(plugins.is_empty());
}

#[test]
fn test_multi_token_wrapper() {
    let injector = Injector::new("app");
    injector.register("N", Binding::value(1_i32).multi());
    injector.register("N", Binding::value(2_i32).multi());

    let resolved = injector.get(&Token::<i32>::new("N").multi(), None).unwrap();
    assert_eq!(resolved.len(), 2);
}

// ============= Multi Dependencies =============

#[test]
fn test_factory_receives_multi_dependency() {
    let injector = Injector::new("app");
    injector.register(&PLUGINS, Binding::value(Box::new(Auth) as DynPlugin).multi());
    injector.register(&PLUGINS, Binding::value(Box::new(Metrics) as DynPlugin).multi());
    injector.register(
        "SUMMARY",
        Binding::factory_with([Dependency::multi(&PLUGINS)], |mut args| {
            let plugins = args.next_multi::<DynPlugin>()?;
            Ok(plugins
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(","))
        }),
    );

    let summary = injector.resolve(&Token::<String>::new("SUMMARY")).unwrap();
    assert_eq!(*summary, "auth,metrics");
}

#[test]
fn test_multi_siblings_each_build_their_dependencies() {
    let injector = Injector::new("app");
    let built = Arc::new(AtomicUsize::new(0));

    let counter = built.clone();
    injector.register(
        "CONN",
        Binding::factory(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
            .scope(Scope::Prototype),
    );
    for _ in 0..3 {
        injector.register(
            "WORKERS",
            Binding::factory_with(["CONN"], |mut args| Ok(*args.next::<usize>()?)).multi(),
        );
    }

    let workers = injector
        .resolve_multi(&Token::<usize>::new("WORKERS"))
        .unwrap();
    let ids: Vec<_> = workers.iter().map(|w| **w).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(built.load(Ordering::SeqCst), 3);
}
