//! Bindings and the provider kinds they dispatch to
//!
//! A [`Binding`] is what callers hand to `Injector::register`; the injector turns
//! it into a [`TokenMetadata`] that owns the binding's scope state for as long
//! as the binding stays registered.

use std::{any::Any, fmt, sync::Arc};

use crate::{
    circular::CircularDetector,
    error::Result,
    injector::Injector,
    instance::{Arguments, Instance},
    scope::{Scope, ScopeProvider},
    slot,
    token::{Dependency, TokenKey},
};

/// A type the injector knows how to construct.
///
/// `dependencies` lists the tokens passed to `construct`, in parameter order.
/// Returning `None` means nothing was declared and is treated like an empty
/// list.
///
/// ```rust
/// use toni_di::{Arguments, Dependency, Injectable};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Injectable for Greeter {
///     fn dependencies() -> Option<Vec<Dependency>> {
///         Some(vec!["GREETING".into()])
///     }
///
///     fn construct(mut args: Arguments) -> anyhow::Result<Self> {
///         let greeting = args.next::<String>()?;
///         Ok(Self { greeting: greeting.to_string() })
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + Sized + 'static {
    fn dependencies() -> Option<Vec<Dependency>> {
        None
    }

    fn construct(args: Arguments) -> anyhow::Result<Self>;
}

/// Something the injector can invoke with resolved arguments
pub trait Constructor {
    fn name(&self) -> String;

    /// Declared parameter tokens, `None` when nothing was declared
    fn dependencies(&self) -> Option<Vec<Dependency>>;

    fn invoke(&self, args: Arguments) -> anyhow::Result<Instance>;
}

/// Type-erased constructible for the `Class` provider kind
#[derive(Clone)]
pub struct Constructible {
    name: &'static str,
    key: TokenKey,
    dependencies: fn() -> Option<Vec<Dependency>>,
    construct: fn(Arguments) -> anyhow::Result<Instance>,
}

fn construct_erased<T: Injectable>(args: Arguments) -> anyhow::Result<Instance> {
    Ok(Arc::new(T::construct(args)?))
}

impl Constructible {
    pub fn of<T: Injectable>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            key: TokenKey::of::<T>(),
            dependencies: T::dependencies,
            construct: construct_erased::<T>,
        }
    }

    /// The token of the type itself
    pub fn key(&self) -> &TokenKey {
        &self.key
    }
}

impl Constructor for Constructible {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn dependencies(&self) -> Option<Vec<Dependency>> {
        (self.dependencies)()
    }

    fn invoke(&self, args: Arguments) -> anyhow::Result<Instance> {
        (self.construct)(args)
    }
}

impl fmt::Debug for Constructible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructible({})", self.name)
    }
}

type FactoryFn = Arc<dyn Fn(Arguments) -> anyhow::Result<Instance> + Send + Sync>;

/// A callable plus the tokens its arguments are resolved from
#[derive(Clone)]
pub struct Factory {
    name: String,
    call: FactoryFn,
    dependencies: Option<Vec<Dependency>>,
}

impl Factory {
    /// Wraps a callable returning a plain value; the value is shared as an
    /// `Arc<T>` once produced.
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: format!("factory of {}", std::any::type_name::<T>()),
            call: Arc::new(move |args: Arguments| -> anyhow::Result<Instance> {
                Ok(Arc::new(factory(args)?))
            }),
            dependencies: None,
        }
    }

    pub fn with_dependencies<D>(mut self, dependencies: impl IntoIterator<Item = D>) -> Self
    where
        D: Into<Dependency>,
    {
        self.dependencies = Some(dependencies.into_iter().map(Into::into).collect());
        self
    }

    pub fn declared_dependencies(&self) -> Option<&[Dependency]> {
        self.dependencies.as_deref()
    }
}

impl Constructor for Factory {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn dependencies(&self) -> Option<Vec<Dependency>> {
        self.dependencies.clone()
    }

    fn invoke(&self, args: Arguments) -> anyhow::Result<Instance> {
        (self.call)(args)
    }
}

/// Lazily produced redirect target, for bindings declared before their target
#[derive(Clone)]
pub struct ForwardRef(Arc<dyn Fn() -> TokenKey + Send + Sync>);

impl ForwardRef {
    pub fn new<K, F>(target: F) -> Self
    where
        K: Into<TokenKey>,
        F: Fn() -> K + Send + Sync + 'static,
    {
        Self(Arc::new(move || -> TokenKey { target().into() }))
    }

    pub fn resolve(&self) -> TokenKey {
        (self.0)()
    }
}

#[derive(Clone)]
pub enum RedirectTarget {
    Token(TokenKey),
    Forward(ForwardRef),
}

impl RedirectTarget {
    pub fn key(&self) -> TokenKey {
        match self {
            RedirectTarget::Token(key) => key.clone(),
            RedirectTarget::Forward(forward) => forward.resolve(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Class,
    Factory,
    Value,
    Redirect,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Factory => write!(f, "factory"),
            Self::Value => write!(f, "value"),
            Self::Redirect => write!(f, "redirect"),
        }
    }
}

/// How a binding produces its instance
#[derive(Clone)]
pub enum Provider {
    Class(Constructible),
    Factory(Factory),
    Value(Instance),
    Redirect(RedirectTarget),
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Class(_) => ProviderKind::Class,
            Provider::Factory(_) => ProviderKind::Factory,
            Provider::Value(_) => ProviderKind::Value,
            Provider::Redirect(_) => ProviderKind::Redirect,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Class(constructible) => fmt::Debug::fmt(constructible, f),
            Provider::Factory(factory) => write!(f, "Factory({})", factory.name),
            Provider::Value(_) => f.write_str("Value"),
            Provider::Redirect(RedirectTarget::Token(key)) => write!(f, "Redirect({})", key),
            Provider::Redirect(RedirectTarget::Forward(_)) => f.write_str("Redirect(forward)"),
        }
    }
}

/// Options for one registration
///
/// ```rust
/// use toni_di::{Binding, Injector, Scope, Token};
///
/// let injector = Injector::new("app");
/// injector.register("A", Binding::factory(|_| Ok(1_i32)));
/// injector.register(
///     "B",
///     Binding::factory_with(["A"], |mut args| Ok(*args.next::<i32>()? + 1))
///         .scope(Scope::Prototype),
/// );
///
/// let b = injector.resolve(&Token::<i32>::new("B")).unwrap();
/// assert_eq!(*b, 2);
/// ```
#[derive(Clone, Debug)]
pub struct Binding {
    provider: Provider,
    multi: bool,
    tags: Vec<String>,
    scope: Option<Scope>,
}

impl Binding {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            multi: false,
            tags: Vec::new(),
            scope: None,
        }
    }

    pub fn class<T: Injectable>() -> Self {
        Self::new(Provider::Class(Constructible::of::<T>()))
    }

    /// A factory with no declared dependencies
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::new(Provider::Factory(Factory::new(factory)))
    }

    pub fn factory_with<T, F, D>(dependencies: impl IntoIterator<Item = D>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
        D: Into<Dependency>,
    {
        Self::new(Provider::Factory(
            Factory::new(factory).with_dependencies(dependencies),
        ))
    }

    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::new(Provider::Value(Arc::new(value)))
    }

    /// A value that is already shared elsewhere
    pub fn instance(instance: Instance) -> Self {
        Self::new(Provider::Value(instance))
    }

    pub fn redirect(target: impl Into<TokenKey>) -> Self {
        Self::new(Provider::Redirect(RedirectTarget::Token(target.into())))
    }

    pub fn forward<K, F>(target: F) -> Self
    where
        K: Into<TokenKey>,
        F: Fn() -> K + Send + Sync + 'static,
    {
        Self::new(Provider::Redirect(RedirectTarget::Forward(ForwardRef::new(
            target,
        ))))
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }
}

/// One registered binding
pub struct TokenMetadata {
    provider: Provider,
    multi: bool,
    tags: Vec<String>,
    scope_name: String,
    instances: Box<dyn ScopeProvider>,
}

impl TokenMetadata {
    /// `default_scope` applies when the binding did not pick one
    pub fn new(binding: Binding, default_scope: &Scope) -> Self {
        let scope = binding.scope.unwrap_or_else(|| default_scope.clone());
        Self {
            provider: binding.provider,
            multi: binding.multi,
            tags: binding.tags,
            scope_name: scope.to_string(),
            instances: scope.into_provider(),
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// Cached-or-new instance according to the binding's scope
    pub fn get(&self, injector: &Injector, detector: &CircularDetector) -> Result<Instance> {
        slot::producing(detector, || {
            self.instances
                .get(&|| self.instantiate(injector, detector))
        })
    }

    /// Always produces a new instance (or the stored value)
    pub fn instantiate(&self, injector: &Injector, detector: &CircularDetector) -> Result<Instance> {
        match &self.provider {
            Provider::Class(constructible) => {
                injector.create_instance(constructible, None, Some(detector))
            }
            Provider::Factory(factory) => injector.create_instance(
                factory,
                factory.declared_dependencies(),
                Some(detector),
            ),
            Provider::Value(value) => Ok(value.clone()),
            Provider::Redirect(target) => {
                injector.get_single(Dependency::single(target.key()), Some(detector))
            }
        }
    }
}

impl fmt::Debug for TokenMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMetadata")
            .field("provider", &self.provider)
            .field("multi", &self.multi)
            .field("tags", &self.tags)
            .field("scope", &self.scope_name)
            .finish()
    }
}
