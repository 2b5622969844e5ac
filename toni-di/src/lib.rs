//! Token-based dependency resolution
//!
//! Bindings are registered on an [`Injector`] under a token and resolved on
//! demand. Each binding is produced by a class, a factory, a stored value or a
//! redirect to another token, and cached according to its [`Scope`].
//!
//! ```rust
//! use toni_di::{Binding, Injector, Token};
//!
//! const GREETING: Token<String> = Token::new("GREETING");
//!
//! let app = Injector::new("app");
//! app.register(&GREETING, Binding::value("hi".to_string()));
//!
//! let request = Injector::with_parent("request", &app);
//! assert_eq!(*request.resolve(&GREETING).unwrap(), "hi");
//! ```

mod circular;
pub mod config;
mod context;
pub mod declare;
mod error;
pub mod injector;
mod instance;
pub mod metadata;
pub mod scope;
mod slot;
pub mod token;

pub use circular::CircularDetector;
pub use config::InjectorConfig;
pub use context::{inject, inject_multi};
pub use declare::{Configuration, Declaration, Declarations};
pub use error::{InjectorError, Result};
pub use injector::Injector;
pub use instance::{Arguments, Instance, Resolved};
pub use metadata::{
    Binding, Constructible, Constructor, Factory, ForwardRef, Injectable, Provider, ProviderKind,
    RedirectTarget, TokenMetadata,
};
pub use scope::{
    CachingScope, KeyProvider, PrototypeScope, Scope, ScopeFactory, ScopeProvider, SingletonScope,
    WeakCachingScope,
};
pub use token::{Dependency, Symbol, Token, TokenKey};

// Re-exported so `Injectable` and factory signatures do not need a direct dependency
pub use anyhow;
