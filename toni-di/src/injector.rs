use std::{
    any::Any,
    fmt,
    sync::{Arc, LazyLock},
};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{
    circular::CircularDetector,
    config::InjectorConfig,
    error::{InjectorError, Result},
    instance::{self, Arguments, Instance, Resolved},
    metadata::{Binding, Constructible, Constructor, Injectable, TokenMetadata},
    scope::Scope,
    token::{Dependency, Token, TokenKey},
};

static ROOT: LazyLock<Arc<Injector>> = LazyLock::new(|| Injector::new("root"));

/// Hierarchical registry of bindings.
///
/// Lookups that find no binding at all for a token fall through to the parent
/// injector. A local binding always shadows the parent's, even when it yields
/// no instances.
pub struct Injector {
    name: String,
    parent: Option<Arc<Injector>>,
    default_scope: Scope,
    bindings: RwLock<FxHashMap<TokenKey, Vec<Arc<TokenMetadata>>>>,
}

impl Injector {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_config(InjectorConfig::new(name), None)
    }

    pub fn with_parent(name: impl Into<String>, parent: &Arc<Injector>) -> Arc<Self> {
        Self::with_config(InjectorConfig::new(name), Some(parent))
    }

    pub fn with_config(config: InjectorConfig, parent: Option<&Arc<Injector>>) -> Arc<Self> {
        debug!(
            injector = %config.name,
            parent = parent.map(|p| p.name.as_str()),
            default_scope = %config.default_scope,
            "creating injector"
        );
        Arc::new(Self {
            name: config.name,
            parent: parent.cloned(),
            default_scope: config.default_scope,
            bindings: RwLock::new(FxHashMap::default()),
        })
    }

    /// The process-wide root injector
    pub fn root() -> Arc<Injector> {
        ROOT.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Injector>> {
        self.parent.as_ref()
    }

    /// Registers a binding for `token`.
    ///
    /// A non-multi binding replaces whatever the token had (last registration
    /// wins); a multi binding is appended to the token's list.
    pub fn register(&self, token: impl Into<TokenKey>, binding: Binding) {
        let token = token.into();
        let metadata = Arc::new(TokenMetadata::new(binding, &self.default_scope));
        debug!(
            injector = %self.name,
            token = %token,
            kind = %metadata.kind(),
            multi = metadata.is_multi(),
            scope = metadata.scope_name(),
            "registering binding"
        );

        let mut bindings = self.bindings.write();
        if metadata.is_multi() {
            bindings.entry(token).or_default().push(metadata);
        } else {
            bindings.insert(token, vec![metadata]);
        }
    }

    /// Whether this injector (not its ancestors) has a binding for `token`
    pub fn contains(&self, token: &TokenKey) -> bool {
        self.bindings
            .read()
            .get(token)
            .is_some_and(|list| !list.is_empty())
    }

    /// The local bindings of `token`, in registration order
    pub fn bindings(&self, token: &TokenKey) -> Vec<Arc<TokenMetadata>> {
        self.bindings.read().get(token).cloned().unwrap_or_default()
    }

    /// Resolves one dependency.
    ///
    /// A multi request returns every instance (possibly none). A single request
    /// fails when nothing is reachable, or when more than one candidate is.
    /// `detector` carries the chain of the resolution this call is nested in.
    pub fn get(
        &self,
        dependency: impl Into<Dependency>,
        detector: Option<&CircularDetector>,
    ) -> Result<Resolved> {
        let dependency = dependency.into();
        let mut detector = match detector {
            Some(detector) => detector.fork(),
            None => CircularDetector::new(self.to_string()),
        };

        let metadatas = self.bindings(&dependency.key);
        let instances = if !metadatas.is_empty() {
            trace!(injector = %self.name, token = %dependency, "resolving local binding");
            detector.handle_token(&dependency.key)?;
            self.instantiate_all(&metadatas, &detector)?
        } else if let Some(parent) = &self.parent {
            trace!(injector = %self.name, token = %dependency, "delegating to parent");
            parent.get(dependency.clone(), Some(&detector))?.into_instances()
        } else {
            Vec::new()
        };

        if dependency.multi {
            return Ok(Resolved::Multiple(instances));
        }

        let candidates = instances.len();
        match (instances.into_iter().next(), candidates) {
            (Some(instance), 1) => Ok(Resolved::Single(instance)),
            (None, _) => Err(InjectorError::MissingDefinition {
                token: dependency.key.to_string(),
            }),
            _ => Err(InjectorError::AmbiguousBinding {
                token: dependency.key.to_string(),
                candidates,
            }),
        }
    }

    pub(crate) fn get_single(
        &self,
        dependency: Dependency,
        detector: Option<&CircularDetector>,
    ) -> Result<Instance> {
        let token = dependency.key.to_string();
        match self.get(dependency, detector)? {
            Resolved::Single(instance) => Ok(instance),
            Resolved::Multiple(_) => Err(InjectorError::TypeMismatch {
                target: token,
                expected: "a single instance",
            }),
        }
    }

    fn instantiate_all(
        &self,
        metadatas: &[Arc<TokenMetadata>],
        detector: &CircularDetector,
    ) -> Result<Vec<Instance>> {
        if let [metadata] = metadatas {
            return Ok(vec![metadata.get(self, detector)?]);
        }

        // Siblings only share the ancestor chain.
        metadatas
            .iter()
            .map(|metadata| metadata.get(self, &detector.fork()))
            .collect()
    }

    /// Resolves `dependencies` in order.
    ///
    /// Each entry extends `detector` independently, so two parameters sharing
    /// a dependency are not mistaken for a cycle.
    pub fn get_all(
        &self,
        dependencies: &[Dependency],
        detector: Option<&CircularDetector>,
    ) -> Result<Vec<Resolved>> {
        dependencies
            .iter()
            .map(|dependency| self.get(dependency.clone(), detector))
            .collect()
    }

    /// Resolves the arguments of `target` and invokes it.
    ///
    /// Explicit `dependencies` take precedence over the ones `target` declares.
    pub fn create_instance(
        &self,
        target: &dyn Constructor,
        dependencies: Option<&[Dependency]>,
        detector: Option<&CircularDetector>,
    ) -> Result<Instance> {
        let declared;
        let dependencies = match dependencies {
            Some(dependencies) => dependencies,
            None => {
                declared = target.dependencies().unwrap_or_default();
                declared.as_slice()
            }
        };

        let values = self.get_all(dependencies, detector)?;
        let instance = target.invoke(Arguments::new(target.name(), values))?;
        Ok(instance)
    }

    /// Resolves `token` to exactly one instance of `T`
    pub fn resolve<T: Any + Send + Sync>(&self, token: &Token<T>) -> Result<Arc<T>> {
        self.get(Dependency::single(token.key()), None)?
            .downcast(&token.key().to_string())
    }

    /// Resolves every instance bound to `token`, in registration order
    pub fn resolve_multi<T: Any + Send + Sync>(&self, token: &Token<T>) -> Result<Vec<Arc<T>>> {
        self.get(Dependency::multi(token.key()), None)?
            .downcast_all(&token.key().to_string())
    }

    /// Builds a `T` with its dependencies injected, without registering it
    pub fn construct<T: Injectable>(&self) -> Result<Arc<T>> {
        let constructible = Constructible::of::<T>();
        let instance = self.create_instance(&constructible, None, None)?;
        instance::downcast(instance, std::any::type_name::<T>())
    }
}

impl fmt::Display for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Injector[{}]", self.name)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field("tokens", &self.bindings.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: Token<String> = Token::new("GREETING");

    #[test]
    fn test_value_binding() {
        let injector = Injector::new("test");
        injector.register(&GREETING, Binding::value("hi".to_string()));
        assert_eq!(*injector.resolve(&GREETING).unwrap(), "hi");
    }

    #[test]
    fn test_missing_definition() {
        let injector = Injector::new("test");
        let err = injector.resolve(&GREETING).unwrap_err();
        assert!(err.is_missing_definition());
        assert_eq!(
            err.to_string(),
            "Unable to instantiate token GREETING - missing definition"
        );
    }

    #[test]
    fn test_last_single_registration_wins() {
        let injector = Injector::new("test");
        injector.register(&GREETING, Binding::value("a".to_string()));
        injector.register(&GREETING, Binding::value("b".to_string()));
        assert_eq!(injector.bindings(GREETING.key()).len(), 1);
        assert_eq!(*injector.resolve(&GREETING).unwrap(), "b");
    }

    #[test]
    fn test_multi_registration_appends() {
        let injector = Injector::new("test");
        injector.register("LIST", Binding::value(1_u8).multi());
        injector.register("LIST", Binding::value(2_u8).multi());

        let token = Token::<u8>::new("LIST");
        let values = injector.resolve_multi(&token).unwrap();
        assert_eq!(values.iter().map(|v| **v).collect::<Vec<_>>(), vec![1, 2]);

        let err = injector.resolve(&token).unwrap_err();
        assert!(matches!(
            err,
            InjectorError::AmbiguousBinding { candidates: 2, .. }
        ));
    }

    #[test]
    fn test_multi_request_on_unknown_token_is_empty() {
        let injector = Injector::new("test");
        let resolved = injector.get(Dependency::multi("NOTHING"), None).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_display() {
        let injector = Injector::new("test");
        assert_eq!(injector.to_string(), "Injector[test]");
    }

    #[test]
    fn test_contains_is_local() {
        let parent = Injector::new("parent");
        parent.register("X", Binding::value(1_i32));
        let child = Injector::with_parent("child", &parent);
        assert!(parent.contains(&TokenKey::from("X")));
        assert!(!child.contains(&TokenKey::from("X")));
        assert_eq!(*child.resolve(&Token::<i32>::new("X")).unwrap(), 1);
    }
}
