//! Builder-style declaration of bindings
//!
//! [`Declaration`] registers one binding on an explicit injector or on the
//! current one. [`Configuration`] groups bindings whose factories are backed
//! by a shared instance, the way a module groups its providers.

use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{InjectorError, Result},
    injector::Injector,
    metadata::{Binding, Provider},
    token::TokenKey,
};

/// Where and under which token a binding is declared
///
/// ```rust
/// use toni_di::{Binding, Declaration, Injector, Token};
///
/// let injector = Injector::new("app");
/// Declaration::token("PORT")
///     .injector(&injector)
///     .bind(Binding::value(8080_u16))
///     .unwrap();
///
/// assert_eq!(*injector.resolve(&Token::<u16>::new("PORT")).unwrap(), 8080);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Declaration {
    token: Option<TokenKey>,
    injector: Option<Arc<Injector>>,
}

impl Declaration {
    /// A declaration without a token; only class bindings can use it
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(token: impl Into<TokenKey>) -> Self {
        Self {
            token: Some(token.into()),
            injector: None,
        }
    }

    /// Targets `injector` instead of the current one
    pub fn injector(mut self, injector: &Arc<Injector>) -> Self {
        self.injector = Some(injector.clone());
        self
    }

    /// Registers `binding` and returns the token it was registered under.
    ///
    /// Without a token, a class binding is registered under its own type;
    /// every other provider kind is rejected.
    pub fn bind(self, binding: Binding) -> Result<TokenKey> {
        let token = match (self.token, binding.provider()) {
            (Some(token), _) => token,
            (None, Provider::Class(constructible)) => constructible.key().clone(),
            (None, provider) => {
                return Err(InjectorError::Misuse(format!(
                    "token not specified for {} injectable",
                    provider.kind()
                )));
            }
        };

        let injector = self.injector.unwrap_or_else(Injector::current);
        injector.register(&token, binding);
        Ok(token)
    }
}

/// A group of bindings contributed together.
///
/// `configure` receives the shared instance, so factories can capture it and
/// call its methods on every instantiation.
pub trait Configuration: Send + Sync + 'static {
    fn configure(self: Arc<Self>, declare: &mut Declarations) -> Result<()>;
}

/// The declaration target handed to [`Configuration::configure`]
pub struct Declarations {
    injector: Arc<Injector>,
    declared: Vec<TokenKey>,
}

impl Declarations {
    fn new(injector: Arc<Injector>) -> Self {
        Self {
            injector,
            declared: Vec::new(),
        }
    }

    pub fn injector(&self) -> &Arc<Injector> {
        &self.injector
    }

    /// Registers `binding` under `token`
    pub fn bind(&mut self, token: impl Into<TokenKey>, binding: Binding) -> &mut Self {
        let token = token.into();
        self.injector.register(&token, binding);
        self.declared.push(token);
        self
    }

    /// Registers `binding`, under its own type when `token` is `None`
    pub fn declare(&mut self, token: Option<TokenKey>, binding: Binding) -> Result<TokenKey> {
        let declaration = match token {
            Some(token) => Declaration::token(token),
            None => Declaration::new(),
        };
        let token = declaration.injector(&self.injector).bind(binding)?;
        self.declared.push(token.clone());
        Ok(token)
    }

    /// Tokens declared so far, in declaration order
    pub fn declared(&self) -> &[TokenKey] {
        &self.declared
    }
}

impl Injector {
    /// Installs every binding `configuration` contributes.
    ///
    /// Bindings declared before a failure stay registered.
    pub fn configure<C: Configuration>(
        self: &Arc<Self>,
        configuration: Arc<C>,
    ) -> Result<Vec<TokenKey>> {
        let mut declarations = Declarations::new(self.clone());
        configuration.configure(&mut declarations)?;
        debug!(
            injector = %self,
            configuration = std::any::type_name::<C>(),
            declared = declarations.declared.len(),
            "configuration installed"
        );
        Ok(declarations.declared)
    }
}
