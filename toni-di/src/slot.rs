//! Creation slots shared by the caching scopes
//!
//! A slot stays locked while its instance is created, so other threads wait for
//! the first creation instead of running their own. Before waiting, a thread
//! follows the chain of holders: if the holder of the slot (possibly through
//! other waiting threads) waits for a slot this thread holds, the wait could
//! never end and a circular dependency is reported instead.

use std::{
    cell::RefCell,
    ops::Deref,
    sync::{
        LazyLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, ThreadId},
};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{
    circular::CircularDetector,
    error::{InjectorError, Result},
};

thread_local! {
    // Chains of the bindings being produced on this thread, innermost last.
    static PRODUCING: RefCell<Vec<CircularDetector>> = const { RefCell::new(Vec::new()) };
}

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

static WAIT_GRAPH: LazyLock<Mutex<WaitGraph>> = LazyLock::new(Default::default);

/// Runs `f` with `detector` recorded as the chain of the binding it produces
pub(crate) fn producing<R>(detector: &CircularDetector, f: impl FnOnce() -> R) -> R {
    PRODUCING.with(|stack| stack.borrow_mut().push(detector.clone()));
    let _guard = ProducingGuard;
    f()
}

struct ProducingGuard;

impl Drop for ProducingGuard {
    fn drop(&mut self) {
        PRODUCING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

fn current_chain() -> Option<CircularDetector> {
    PRODUCING.with(|stack| stack.borrow().last().cloned())
}

struct Waiting {
    slot: u64,
    chain: CircularDetector,
}

#[derive(Default)]
struct WaitGraph {
    // slot -> holding thread and re-entry depth
    holders: FxHashMap<u64, (ThreadId, usize)>,
    waiting: FxHashMap<ThreadId, Waiting>,
}

impl WaitGraph {
    fn hold(&mut self, slot: u64, thread: ThreadId) {
        self.holders.entry(slot).or_insert((thread, 0)).1 += 1;
    }

    fn release(&mut self, slot: u64) {
        if let Some((_, depth)) = self.holders.get_mut(&slot) {
            *depth -= 1;
            if *depth == 0 {
                self.holders.remove(&slot);
            }
        }
    }

    /// Fails when waiting for `slot` would close a loop back to `me`.
    ///
    /// The reported path continues `chain` with the tokens each holder
    /// resolved after taking the slot the previous thread waits for.
    fn check_wait(&self, slot: u64, me: ThreadId, chain: &CircularDetector) -> Result<()> {
        let mut path = chain.fork();
        let mut wanted = slot;
        let mut token = chain.chain().last().cloned();

        for _ in 0..=self.waiting.len() {
            let Some(&(holder, _)) = self.holders.get(&wanted) else {
                return Ok(());
            };
            if holder == me {
                return Err(InjectorError::CircularDependency {
                    path: path.chain().iter().map(ToString::to_string).collect(),
                    injector: path.injector().to_string(),
                });
            }
            let Some(waiting) = self.waiting.get(&holder) else {
                return Ok(());
            };

            let held = waiting.chain.chain();
            let start = token
                .as_ref()
                .and_then(|token| held.iter().position(|key| key == token))
                .map_or(0, |position| position + 1);
            for key in &held[start..] {
                path.handle_token(key)?;
            }

            token = held.last().cloned();
            wanted = waiting.slot;
        }

        Ok(())
    }
}

/// A value locked for the whole creation of an instance
pub(crate) struct Slot<T> {
    id: u64,
    value: ReentrantMutex<RefCell<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            value: ReentrantMutex::new(RefCell::new(value)),
        }
    }

    /// Locks the slot, waiting for another thread's creation unless that wait
    /// would never end.
    pub(crate) fn lock(&self) -> Result<SlotGuard<'_, T>> {
        let me = thread::current().id();
        {
            let mut graph = WAIT_GRAPH.lock();
            if let Some(guard) = self.value.try_lock() {
                graph.hold(self.id, me);
                return Ok(SlotGuard { id: self.id, guard });
            }
            if let Some(chain) = current_chain() {
                graph.check_wait(self.id, me, &chain)?;
                graph.waiting.insert(
                    me,
                    Waiting {
                        slot: self.id,
                        chain,
                    },
                );
            }
        }

        trace!(slot = self.id, "waiting for a creation on another thread");
        let guard = self.value.lock();
        let mut graph = WAIT_GRAPH.lock();
        graph.waiting.remove(&me);
        graph.hold(self.id, me);
        Ok(SlotGuard { id: self.id, guard })
    }

    /// Reads the value without taking part in creation
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.lock();
        let value = guard.borrow();
        f(&value)
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

pub(crate) struct SlotGuard<'a, T> {
    id: u64,
    guard: ReentrantMutexGuard<'a, RefCell<T>>,
}

impl<T> Deref for SlotGuard<'_, T> {
    type Target = RefCell<T>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> Drop for SlotGuard<'_, T> {
    fn drop(&mut self) {
        WAIT_GRAPH.lock().release(self.id);
    }
}
