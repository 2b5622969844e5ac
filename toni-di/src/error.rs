/// Errors raised while registering or resolving bindings.
///
/// Every variant is a local, synchronous failure. Nothing is retried: the
/// binding state does not change between two calls, so neither would the
/// outcome.
#[derive(Debug, thiserror::Error)]
pub enum InjectorError {
    #[error("Unable to instantiate token {token} - missing definition")]
    MissingDefinition { token: String },

    #[error("More than one inject candidate for token {token} ({candidates} found)")]
    AmbiguousBinding { token: String, candidates: usize },

    #[error("Circular dependency detected: [{}] on {injector}", path.join(" --> "))]
    CircularDependency { path: Vec<String>, injector: String },

    #[error("Unsupported scope: '{0}'. Must be 'singleton' or 'prototype'")]
    UnsupportedScope(String),

    #[error("Wrong usage - {0}")]
    Misuse(String),

    #[error("Type mismatch for {target}: expected {expected}")]
    TypeMismatch {
        target: String,
        expected: &'static str,
    },

    #[error("Missing argument {position} for {target}")]
    MissingArgument { target: String, position: usize },

    #[error("Failed to construct instance: {0}")]
    Construction(anyhow::Error),
}

impl InjectorError {
    pub fn is_missing_definition(&self) -> bool {
        matches!(self, Self::MissingDefinition { .. })
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousBinding { .. })
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }
}

// Engine errors raised inside user constructors travel through anyhow; unwrap
// them so callers still see the engine error kind.
impl From<anyhow::Error> for InjectorError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<InjectorError>() {
            Ok(injector_error) => injector_error,
            Err(other) => Self::Construction(other),
        }
    }
}

pub type Result<T, E = InjectorError> = std::result::Result<T, E>;
