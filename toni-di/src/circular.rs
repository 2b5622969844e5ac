use rustc_hash::FxHashSet;

use crate::{
    error::{InjectorError, Result},
    token::TokenKey,
};

/// Tokens on the active resolution chain of one top-level request.
///
/// A detector is forked for every nested resolution, so sibling branches see
/// their shared ancestors but never each other's descendants.
#[derive(Clone, Debug)]
pub struct CircularDetector {
    injector: String,
    chain: Vec<TokenKey>,
    visited: FxHashSet<TokenKey>,
}

impl CircularDetector {
    pub fn new(injector: impl Into<String>) -> Self {
        Self {
            injector: injector.into(),
            chain: Vec::new(),
            visited: FxHashSet::default(),
        }
    }

    /// A new detector pre-populated with this chain
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Fails if `token` is already being resolved, otherwise records it
    pub fn handle_token(&mut self, token: &TokenKey) -> Result<()> {
        if self.visited.contains(token) {
            return Err(InjectorError::CircularDependency {
                path: self.cycle_path(token),
                injector: self.injector.clone(),
            });
        }

        self.visited.insert(token.clone());
        self.chain.push(token.clone());
        Ok(())
    }

    pub fn chain(&self) -> &[TokenKey] {
        &self.chain
    }

    pub fn contains(&self, token: &TokenKey) -> bool {
        self.visited.contains(token)
    }

    pub(crate) fn injector(&self) -> &str {
        &self.injector
    }

    // Minimal cyclic suffix: from the earlier occurrence through the end,
    // closed by the repeated token.
    fn cycle_path(&self, repeated: &TokenKey) -> Vec<String> {
        let start = self
            .chain
            .iter()
            .position(|token| token == repeated)
            .unwrap_or(0);

        self.chain[start..]
            .iter()
            .chain(std::iter::once(repeated))
            .map(ToString::to_string)
            .collect()
    }
}
