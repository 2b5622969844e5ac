//! The ambient "current injector" consulted by [`inject`].
//!
//! The current injector is tracked per thread. [`Injector::run_in_context`]
//! installs an injector for the duration of a closure and restores the previous
//! one on the way out, including when the closure panics.

use std::{any::Any, cell::RefCell, sync::Arc};

use tracing::trace;

use crate::{error::Result, injector::Injector, token::Token};

thread_local! {
    static CURRENT: RefCell<Option<Arc<Injector>>> = const { RefCell::new(None) };
}

struct ContextGuard {
    previous: Option<Arc<Injector>>,
}

impl ContextGuard {
    fn enter(injector: Arc<Injector>) -> Self {
        let previous = CURRENT.with(|current| current.replace(Some(injector)));
        Self { previous }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| {
            *current.borrow_mut() = previous;
        });
    }
}

impl Injector {
    /// The injector installed by the innermost `run_in_context` on this
    /// thread, or the root injector outside of any.
    pub fn current() -> Arc<Injector> {
        CURRENT
            .with(|current| current.borrow().clone())
            .unwrap_or_else(Injector::root)
    }

    /// Runs `f` with `self` as the current injector.
    ///
    /// The result of `f` is returned as is; the previous current injector is
    /// restored whether `f` returns or unwinds.
    pub fn run_in_context<R>(self: &Arc<Self>, f: impl FnOnce() -> R) -> R {
        trace!(injector = %self, "entering context");
        let _guard = ContextGuard::enter(self.clone());
        f()
    }
}

/// Resolves `token` against the current injector
pub fn inject<T: Any + Send + Sync>(token: &Token<T>) -> Result<Arc<T>> {
    Injector::current().resolve(token)
}

/// Resolves every binding of `token` against the current injector
pub fn inject_multi<T: Any + Send + Sync>(token: &Token<T>) -> Result<Vec<Arc<T>>> {
    Injector::current().resolve_multi(token)
}
