//! Synchronization utilities for once-only resolution.
//!
//! This module provides the primitive behind the binding cache and the static initialization of
//! types: a cell that runs its initializer exactly once, no matter how many threads race for it.
//!
//! # Key Components
//!
//! - [`ResolutionCell`] - A once-only cell with an explicit state machine and blocking waiters
//! - [`CellState`] - The externally observable state of a cell
//!
//! # Design Principles
//!
//! - **Single Winner**: The `Unresolved -> Resolving` transition is a compare-and-set, exactly one
//!   thread runs the initializer
//! - **Blocking Losers**: Threads losing the race park on a condition variable until the winner
//!   publishes, they never observe a partial value
//! - **Lock-Free Reads**: Once published, reads are an acquire load plus a `OnceLock` read
//! - **Fail-Fast**: A panicking initializer poisons the cell and wakes every waiter with an error
//!   instead of leaving them blocked forever

use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Condvar, Mutex, OnceLock, PoisonError,
    },
    thread::{self, ThreadId},
};

use crate::{Error, Result};

const UNRESOLVED: u8 = 0;
const RESOLVING: u8 = 1;
const RESOLVED: u8 = 2;
const POISONED: u8 = 3;

/// Observable state of a [`ResolutionCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CellState {
    /// No thread has started the initializer yet
    Unresolved,
    /// One thread is running the initializer, others wait
    Resolving,
    /// The value is published (terminal)
    Resolved,
    /// The initializer panicked or the lock faulted (terminal)
    Poisoned,
}

/// A cell whose value is produced exactly once, under concurrency.
///
/// Unlike `OnceLock::get_or_init`, the cell exposes its state, detects re-entrant initialization
/// from the resolving thread, and turns a panicking initializer into a sticky error for every
/// other thread.
///
/// # Examples
///
/// ```rust,ignore
/// use bindscope::utils::synchronization::ResolutionCell;
/// use std::sync::Arc;
/// use std::thread;
///
/// let cell = Arc::new(ResolutionCell::new());
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let cell = Arc::clone(&cell);
///         thread::spawn(move || *cell.get_or_resolve(|| 42).unwrap())
///     })
///     .collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), 42);
/// }
/// ```
pub struct ResolutionCell<T> {
    /// Current state, one of the constants above
    state: AtomicU8,
    /// The published value
    value: OnceLock<T>,
    /// Resolving thread, also the mutex waiters park on
    owner: Mutex<Option<ThreadId>>,
    /// Condition variable for blocking/waking waiters
    condvar: Condvar,
}

impl<T> ResolutionCell<T> {
    /// Creates a new, unresolved cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(UNRESOLVED),
            value: OnceLock::new(),
            owner: Mutex::new(None),
            condvar: Condvar::new(),
        }
    }

    /// The current state of the cell
    pub fn state(&self) -> CellState {
        match self.state.load(Ordering::Acquire) {
            UNRESOLVED => CellState::Unresolved,
            RESOLVING => CellState::Resolving,
            RESOLVED => CellState::Resolved,
            _ => CellState::Poisoned,
        }
    }

    /// The published value, without blocking.
    ///
    /// Returns `None` while the cell is unresolved, resolving or poisoned.
    pub fn get(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) == RESOLVED {
            self.value.get()
        } else {
            None
        }
    }

    /// Return the published value, running `resolve` first if no thread has done so yet.
    ///
    /// Exactly one caller ever runs `resolve`. Concurrent callers block until it returns and
    /// then observe the same value.
    ///
    /// # Arguments
    ///
    /// * `resolve` - Produces the value, only called on the winning thread
    ///
    /// # Errors
    ///
    /// * [`Error::ReentrantResolution`] if `resolve` (transitively) calls back into this cell
    /// * [`Error::ConcurrentResolutionFailure`] if the resolving thread panicked or the
    ///   internal lock was poisoned
    pub fn get_or_resolve<F>(&self, resolve: F) -> Result<&T>
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        match self
            .state
            .compare_exchange(UNRESOLVED, RESOLVING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => self.resolve(resolve),
            Err(_) => self.wait(),
        }
    }

    fn resolve<F>(&self, resolve: F) -> Result<&T>
    where
        F: FnOnce() -> T,
    {
        {
            let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
            *owner = Some(thread::current().id());
        }

        let mut guard = AbortGuard {
            cell: self,
            armed: true,
        };

        let value = resolve();
        if self.value.set(value).is_err() {
            return Err(Error::ConcurrentResolutionFailure(
                "Value was published by a thread that did not win the resolution".to_string(),
            ));
        }

        self.state.store(RESOLVED, Ordering::Release);
        guard.armed = false;
        self.wake();

        self.value.get().ok_or_else(|| {
            Error::ConcurrentResolutionFailure("Published value is missing".to_string())
        })
    }

    fn wait(&self) -> Result<&T> {
        let owner = self.owner.lock().map_err(|_| {
            Error::ConcurrentResolutionFailure("Resolution lock was poisoned".to_string())
        })?;

        if self.state.load(Ordering::Acquire) == RESOLVING && *owner == Some(thread::current().id())
        {
            return Err(Error::ReentrantResolution(
                "the resolving thread requested its own result".to_string(),
            ));
        }

        let _owner = self
            .condvar
            .wait_while(owner, |_| {
                let state = self.state.load(Ordering::Acquire);
                state == RESOLVING || state == UNRESOLVED
            })
            .map_err(|_| {
                Error::ConcurrentResolutionFailure("Resolution lock was poisoned".to_string())
            })?;

        match self.state.load(Ordering::Acquire) {
            RESOLVED => self.value.get().ok_or_else(|| {
                Error::ConcurrentResolutionFailure("Published value is missing".to_string())
            }),
            _ => Err(Error::ConcurrentResolutionFailure(
                "The resolving thread aborted".to_string(),
            )),
        }
    }

    fn wake(&self) {
        let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        *owner = None;
        self.condvar.notify_all();
    }
}

impl<T> Default for ResolutionCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Poisons the cell if the resolving thread unwinds before publishing.
struct AbortGuard<'a, T> {
    cell: &'a ResolutionCell<T>,
    armed: bool,
}

impl<T> Drop for AbortGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.cell.state.store(POISONED, Ordering::Release);
            self.cell.wake();
        }
    }
}
