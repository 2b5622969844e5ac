//! Token identities used to look up bindings in an injector
//!
//! A [`TokenKey`] is the raw identity a binding is stored under. A
//! [`Dependency`] pairs a key with the `multi` flag a requester uses to ask for
//! every matching binding, and a [`Token`] is the typed handle most code uses.

use std::{
    any::TypeId,
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique symbolic identity.
///
/// Two symbols are only equal when they come from the same `Symbol::new` call,
/// whatever their description.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    pub fn new(description: &str) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Arc::from(description),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})#{}", self.description, self.id)
    }
}

/// The identity a binding is registered under
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TokenKey {
    /// "API_KEY" - compared by string value
    Name(Cow<'static, str>),
    /// Compared by identity, see [`Symbol`]
    Symbol(Symbol),
    /// A constructible type used as its own token
    Type { id: TypeId, name: &'static str },
}

impl TokenKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TokenKey::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKey::Name(name) => f.write_str(name),
            TokenKey::Symbol(symbol) => write!(f, "Symbol({})", symbol.description),
            TokenKey::Type { name, .. } => f.write_str(name),
        }
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKey::Name(name) => write!(f, "{:?}", name),
            TokenKey::Symbol(symbol) => fmt::Debug::fmt(symbol, f),
            TokenKey::Type { name, .. } => write!(f, "Type({})", name),
        }
    }
}

impl From<&str> for TokenKey {
    fn from(name: &str) -> Self {
        TokenKey::Name(Cow::Owned(name.to_owned()))
    }
}

impl From<String> for TokenKey {
    fn from(name: String) -> Self {
        TokenKey::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for TokenKey {
    fn from(symbol: Symbol) -> Self {
        TokenKey::Symbol(symbol)
    }
}

impl From<&Symbol> for TokenKey {
    fn from(symbol: &Symbol) -> Self {
        TokenKey::Symbol(symbol.clone())
    }
}

impl From<&TokenKey> for TokenKey {
    fn from(key: &TokenKey) -> Self {
        key.clone()
    }
}

impl<T> From<&Token<T>> for TokenKey {
    fn from(token: &Token<T>) -> Self {
        token.key.clone()
    }
}

/// A token value wrapped with the `multi` flag.
///
/// Resolving a bare key is the same as resolving it with `multi = false`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub key: TokenKey,
    pub multi: bool,
}

impl Dependency {
    pub fn single(key: impl Into<TokenKey>) -> Self {
        Self {
            key: key.into(),
            multi: false,
        }
    }

    pub fn multi(key: impl Into<TokenKey>) -> Self {
        Self {
            key: key.into(),
            multi: true,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.multi {
            write!(f, "{}[]", self.key)
        } else {
            fmt::Display::fmt(&self.key, f)
        }
    }
}

impl From<TokenKey> for Dependency {
    fn from(key: TokenKey) -> Self {
        Dependency::single(key)
    }
}

impl From<&TokenKey> for Dependency {
    fn from(key: &TokenKey) -> Self {
        Dependency::single(key.clone())
    }
}

impl From<&str> for Dependency {
    fn from(name: &str) -> Self {
        Dependency::single(name)
    }
}

impl From<String> for Dependency {
    fn from(name: String) -> Self {
        Dependency::single(name)
    }
}

impl From<Symbol> for Dependency {
    fn from(symbol: Symbol) -> Self {
        Dependency::single(symbol)
    }
}

impl From<&Symbol> for Dependency {
    fn from(symbol: &Symbol) -> Self {
        Dependency::single(symbol)
    }
}

impl<T> From<&Token<T>> for Dependency {
    fn from(token: &Token<T>) -> Self {
        token.dependency()
    }
}

impl<T> From<Token<T>> for Dependency {
    fn from(token: Token<T>) -> Self {
        Dependency {
            key: token.key,
            multi: token.multi,
        }
    }
}

/// A typed token for identifying bindings in an injector
///
/// The token carries the key, the `multi` flag and a phantom type parameter
/// naming what resolving it yields.
///
/// # Examples
///
/// ```rust
/// use toni_di::Token;
///
/// pub const GREETING: Token<String> = Token::new("GREETING");
/// let listeners: Token<String> = Token::new("LISTENERS").multi();
/// assert!(listeners.is_multi());
/// ```
pub struct Token<T> {
    key: TokenKey,
    multi: bool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Token<T> {
    /// Creates a string token
    ///
    /// This is a const function, so tokens can be defined as constants.
    pub const fn new(name: &'static str) -> Self {
        Self {
            key: TokenKey::Name(Cow::Borrowed(name)),
            multi: false,
            _phantom: PhantomData,
        }
    }

    /// Creates a token backed by a fresh [`Symbol`]
    pub fn symbol(description: &str) -> Self {
        Self::from_key(TokenKey::Symbol(Symbol::new(description)))
    }

    pub fn from_key(key: impl Into<TokenKey>) -> Self {
        Self {
            key: key.into(),
            multi: false,
            _phantom: PhantomData,
        }
    }

    /// Marks the token as a request for every matching binding
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn key(&self) -> &TokenKey {
        &self.key
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn dependency(&self) -> Dependency {
        Dependency {
            key: self.key.clone(),
            multi: self.multi,
        }
    }
}

impl<T: 'static> Token<T> {
    /// The token a constructible type is registered under by default
    pub fn of() -> Self {
        Self::from_key(TokenKey::of::<T>())
    }
}

impl<T> Clone for Token<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            multi: self.multi,
            _phantom: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("multi", &self.multi)
            .finish()
    }
}

impl<T> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.multi == other.multi
    }
}

impl<T> Eq for Token<T> {}

impl<T> Hash for Token<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.multi.hash(state);
    }
}
