use std::env;

use crate::{error::Result, scope::Scope};

pub const DEFAULT_SCOPE_VAR: &str = "TONI_DI_DEFAULT_SCOPE";
pub const INJECTOR_NAME_VAR: &str = "TONI_DI_INJECTOR_NAME";

const DEFAULT_NAME: &str = "injector";

/// Settings applied when an injector is created
#[derive(Clone, Debug)]
pub struct InjectorConfig {
    pub name: String,

    /// Applied to bindings that do not pick a scope themselves
    pub default_scope: Scope,
}

impl InjectorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_scope: Scope::Singleton,
        }
    }

    pub fn default_scope(mut self, scope: Scope) -> Self {
        self.default_scope = scope;
        self
    }

    /// Reads `TONI_DI_INJECTOR_NAME` and `TONI_DI_DEFAULT_SCOPE`.
    ///
    /// Unset variables keep their defaults; a scope keyword other than
    /// `singleton` or `prototype` is rejected.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = env::var(INJECTOR_NAME_VAR) {
            config.name = name;
        }
        if let Ok(scope) = env::var(DEFAULT_SCOPE_VAR) {
            config.default_scope = scope.parse()?;
        }

        Ok(config)
    }
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}
