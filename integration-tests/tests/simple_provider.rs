//! Test for the basic provider kinds
//!
//! This test verifies:
//! 1. Value bindings resolve to the stored value
//! 2. Factory bindings receive their declared dependencies in order
//! 3. Class bindings are constructed with their dependencies injected
//! 4. Unregistered tokens fail with a missing definition error
//! 5. `construct` builds unregistered types

use std::sync::Arc;

use toni_di::{
    Arguments, Binding, Dependency, Injectable, Injector, InjectorError, Symbol, Token, TokenKey,
};

const GREETING: Token<String> = Token::new("GREETING");

// ============= Test Services =============

#[derive(Debug)]
struct Greeter {
    greeting: Arc<String>,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.greeting, name)
    }
}

impl Injectable for Greeter {
    fn dependencies() -> Option<Vec<Dependency>> {
        Some(vec![GREETING.dependency()])
    }

    fn construct(mut args: Arguments) -> anyhow::Result<Self> {
        Ok(Self {
            greeting: args.next::<String>()?,
        })
    }
}

struct Welcome {
    greeter: Arc<Greeter>,
}

impl Injectable for Welcome {
    fn dependencies() -> Option<Vec<Dependency>> {
        Some(vec![TokenKey::of::<Greeter>().into()])
    }

    fn construct(mut args: Arguments) -> anyhow::Result<Self> {
        Ok(Self {
            greeter: args.next::<Greeter>()?,
        })
    }
}

struct Undeclared;

impl Injectable for Undeclared {
    fn construct(args: Arguments) -> anyhow::Result<Self> {
        assert_eq!(args.remaining(), 0);
        Ok(Undeclared)
    }
}

// ============= Value =============

#[test]
fn test_value_provider() {
    let injector = Injector::new("app");
    injector.register(&GREETING, Binding::value("hi".to_string()));

    let greeting = injector.resolve(&GREETING).unwrap();
    assert_eq!(*greeting, "hi");
}

#[test]
fn test_value_is_shared() {
    let injector = Injector::new("app");
    let shared: Arc<String> = Arc::new("shared".to_string());
    injector.register(&GREETING, Binding::instance(shared.clone()));

    let resolved = injector.resolve(&GREETING).unwrap();
    assert!(Arc::ptr_eq(&resolved, &shared));
}

// ============= Factory =============

#[test]
fn test_factory_with_dependencies() {
    let injector = Injector::new("app");
    injector.register("A", Binding::factory(|_| Ok(1_i32)));
    injector.register(
        "B",
        Binding::factory_with(["A"], |mut args| Ok(*args.next::<i32>()? + 1)),
    );

    let b = injector.resolve(&Token::<i32>::new("B")).unwrap();
    assert_eq!(*b, 2);
}

#[test]
fn test_factory_arguments_keep_declared_order() {
    let injector = Injector::new("app");
    injector.register("FIRST", Binding::value("first"));
    injector.register("SECOND", Binding::value("second"));
    injector.register(
        "JOINED",
        Binding::factory_with(["SECOND", "FIRST"], |mut args| {
            let second = args.next::<&'static str>()?;
            let first = args.next::<&'static str>()?;
            Ok(format!("{}-{}", second, first))
        }),
    );

    let joined = injector.resolve(&Token::<String>::new("JOINED")).unwrap();
    assert_eq!(*joined, "second-first");
}

#[test]
fn test_factory_error_is_reported() {
    let injector = Injector::new("app");
    injector.register(
        "BROKEN",
        Binding::factory(|_| -> anyhow::Result<u8> { anyhow::bail!("connection refused") }),
    );

    let err = injector.resolve(&Token::<u8>::new("BROKEN")).unwrap_err();
    assert!(matches!(err, InjectorError::Construction(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_factory_surfaces_nested_missing_definition() {
    let injector = Injector::new("app");
    injector.register(
        "NEEDS_DB",
        Binding::factory_with(["DB"], |mut args| Ok(*args.next::<u8>()?)),
    );

    let err = injector.resolve(&Token::<u8>::new("NEEDS_DB")).unwrap_err();
    assert!(err.is_missing_definition());
    assert!(err.to_string().contains("DB"));
}

// ============= Class =============

#[test]
fn test_class_provider() {
    let injector = Injector::new("app");
    injector.register(&GREETING, Binding::value("Hello".to_string()));
    injector.register(TokenKey::of::<Greeter>(), Binding::class::<Greeter>());
    injector.register(TokenKey::of::<Welcome>(), Binding::class::<Welcome>());

    let welcome = injector.resolve(&Token::<Welcome>::of()).unwrap();
    assert_eq!(welcome.greeter.greet("world"), "Hello, world!");
}

#[test]
fn test_class_under_symbol_token() {
    let injector = Injector::new("app");
    let symbol = Symbol::new("greeter");
    injector.register(&GREETING, Binding::value("Hey".to_string()));
    injector.register(&symbol, Binding::class::<Greeter>());

    let token = Token::<Greeter>::from_key(&symbol);
    assert_eq!(injector.resolve(&token).unwrap().greet("you"), "Hey, you!");

    let lookalike = Token::<Greeter>::from_key(Symbol::new("greeter"));
    assert!(injector.resolve(&lookalike).unwrap_err().is_missing_definition());
}

#[test]
fn test_undeclared_dependencies_are_empty() {
    let injector = Injector::new("app");
    injector.register(TokenKey::of::<Undeclared>(), Binding::class::<Undeclared>());
    assert!(injector.resolve(&Token::<Undeclared>::of()).is_ok());
}

#[test]
fn test_construct_unregistered_type() {
    let injector = Injector::new("app");
    injector.register(&GREETING, Binding::value("Hi".to_string()));

    let greeter = injector.construct::<Greeter>().unwrap();
    assert_eq!(greeter.greet("there"), "Hi, there!");
    assert!(!injector.contains(&TokenKey::of::<Greeter>()));
}

// ============= Errors =============

#[test]
fn test_missing_definition() {
    let injector = Injector::new("app");
    let err = injector.resolve(&GREETING).unwrap_err();

    assert!(err.is_missing_definition());
    assert_eq!(
        err.to_string(),
        "Unable to instantiate token GREETING - missing definition"
    );
}

#[test]
fn test_wrong_requested_type() {
    let injector = Injector::new("app");
    injector.register("PORT", Binding::value(8080_u16));

    let err = injector.resolve(&Token::<String>::new("PORT")).unwrap_err();
    assert!(matches!(err, InjectorError::TypeMismatch { .. }));
}
