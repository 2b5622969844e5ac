//! Lifetime strategies deciding whether a binding reuses or recreates its instance
//!
//! - **Singleton**: created on first resolution, reused forever (default)
//! - **Prototype**: created on every resolution, never cached
//! - **Cached**: one instance per key produced by a key provider, e.g. the id of
//!   the ambient request or session
//! - **WeakCached**: like `Cached`, but the cache does not keep instances alive
//! - **Custom**: any [`ScopeProvider`] implementation

use std::{
    fmt,
    sync::{Arc, Weak},
};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{
    error::{InjectorError, Result},
    instance::Instance,
    slot::Slot,
};

/// Produces the cache key for keyed scopes
pub type KeyProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Builds fresh state for a custom scope, once per binding
pub type ScopeFactory = Arc<dyn Fn() -> Box<dyn ScopeProvider> + Send + Sync>;

/// Decides between a cached instance and a call to `create`.
///
/// Implementations must call `create` at most once per cache slot and must
/// not cache a failed creation.
pub trait ScopeProvider: Send + Sync {
    fn get(&self, create: &dyn Fn() -> Result<Instance>) -> Result<Instance>;
}

#[derive(Default)]
pub struct SingletonScope {
    instance: Slot<Option<Instance>>,
}

impl SingletonScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopeProvider for SingletonScope {
    fn get(&self, create: &dyn Fn() -> Result<Instance>) -> Result<Instance> {
        let slot = self.instance.lock()?;
        if let Some(instance) = slot.borrow().as_ref() {
            trace!("singleton cache hit");
            return Ok(instance.clone());
        }

        let instance = create()?;
        let mut stored = slot.borrow_mut();
        Ok(stored.get_or_insert(instance).clone())
    }
}

#[derive(Default)]
pub struct PrototypeScope;

impl ScopeProvider for PrototypeScope {
    fn get(&self, create: &dyn Fn() -> Result<Instance>) -> Result<Instance> {
        create()
    }
}

/// One instance per key. Entries are never evicted.
pub struct CachingScope {
    key_provider: KeyProvider,
    cache: Slot<FxHashMap<String, Instance>>,
}

impl CachingScope {
    pub fn new(key_provider: KeyProvider) -> Self {
        Self {
            key_provider,
            cache: Slot::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScopeProvider for CachingScope {
    fn get(&self, create: &dyn Fn() -> Result<Instance>) -> Result<Instance> {
        let key = (self.key_provider)();
        let cache = self.cache.lock()?;
        if let Some(instance) = cache.borrow().get(&key) {
            trace!(key = %key, "keyed cache hit");
            return Ok(instance.clone());
        }

        trace!(key = %key, "keyed cache miss");
        let instance = create()?;
        let mut entries = cache.borrow_mut();
        Ok(entries.entry(key).or_insert(instance).clone())
    }
}

/// One instance per key, held through weak references only.
///
/// Once every consumer drops an instance it is reclaimed, and the next lookup
/// with the same key creates a new one.
pub struct WeakCachingScope {
    key_provider: KeyProvider,
    cache: Slot<FxHashMap<String, Weak<dyn std::any::Any + Send + Sync>>>,
}

impl WeakCachingScope {
    pub fn new(key_provider: KeyProvider) -> Self {
        Self {
            key_provider,
            cache: Slot::default(),
        }
    }
}

impl ScopeProvider for WeakCachingScope {
    fn get(&self, create: &dyn Fn() -> Result<Instance>) -> Result<Instance> {
        let key = (self.key_provider)();
        let cache = self.cache.lock()?;
        let alive = cache.borrow().get(&key).and_then(Weak::upgrade);
        if let Some(instance) = alive {
            trace!(key = %key, "weak cache hit");
            return Ok(instance);
        }

        trace!(key = %key, "weak cache miss");
        let instance = create()?;
        let mut entries = cache.borrow_mut();
        entries.retain(|_, weak| weak.strong_count() > 0);
        entries.insert(key, Arc::downgrade(&instance));
        Ok(instance)
    }
}

/// The lifetime strategy chosen for a binding
#[derive(Clone, Default)]
pub enum Scope {
    /// Created once and reused for every resolution.
    /// This is the default and most common scope.
    #[default]
    Singleton,

    /// Created every time the binding is resolved. Never cached.
    Prototype,

    /// One instance per key returned by the key provider.
    Cached(KeyProvider),

    /// Same as `Cached` without keeping instances alive.
    WeakCached(KeyProvider),

    /// A user supplied strategy, instantiated once per binding.
    Custom(ScopeFactory),
}

impl Scope {
    pub fn cached(key_provider: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Cached(Arc::new(key_provider))
    }

    pub fn weak_cached(key_provider: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::WeakCached(Arc::new(key_provider))
    }

    pub fn custom<S, F>(factory: F) -> Self
    where
        S: ScopeProvider + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(move || Box::new(factory()) as Box<dyn ScopeProvider>))
    }

    /// Fresh strategy state for one binding
    pub fn into_provider(self) -> Box<dyn ScopeProvider> {
        match self {
            Scope::Singleton => Box::new(SingletonScope::new()),
            Scope::Prototype => Box::new(PrototypeScope),
            Scope::Cached(key_provider) => Box::new(CachingScope::new(key_provider)),
            Scope::WeakCached(key_provider) => Box::new(WeakCachingScope::new(key_provider)),
            Scope::Custom(factory) => factory(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Prototype => write!(f, "prototype"),
            Self::Cached(_) => write!(f, "cached"),
            Self::WeakCached(_) => write!(f, "weak-cached"),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({})", self)
    }
}

impl std::str::FromStr for Scope {
    type Err = InjectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "prototype" => Ok(Self::Prototype),
            _ => Err(InjectorError::UnsupportedScope(s.to_string())),
        }
    }
}
