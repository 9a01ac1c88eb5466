//! Once-only binding cache.
//!
//! The [`BindingCache`] maps member descriptors to the outcome of their resolution. Every key is
//! resolved at most once per runtime, no matter how many threads access the member for the first
//! time at once, and the outcome (a binding, or the error that ended the walk) is kept forever.
//!
//! # Architecture
//!
//! Entries live in a lock-free [`crossbeam_skiplist::SkipMap`]. Each entry owns a
//! [`ResolutionCell`] which carries the `Unresolved -> Resolving -> Resolved | Failed` state
//! machine. Lookups of resolved members touch no lock at all: one skip-list search and one acquire
//! load.
//!
//! # Thread Safety
//!
//! - Inserting an entry is a `get_or_insert`, two racing threads share whichever entry won
//! - Exactly one thread resolves an entry, the others block on the entry's condition variable
//! - Outcomes are immutable once published, entries are never removed

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use rayon::prelude::*;
use tracing::{trace, warn};

use crate::{
    binding::{resolver::BindingResolver, Binding},
    config::BindingConfig,
    metadata::{member::MemberDescriptor, typesystem::BindType},
    utils::synchronization::{CellState, ResolutionCell},
    Error, Result,
};

/// Resolution state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EntryState {
    /// The member has never been accessed
    Unresolved,
    /// A thread is walking the ancestor chain for the member
    Resolving,
    /// A binding was published (terminal)
    Resolved,
    /// Resolution ended with an error, returned to every caller (terminal)
    Failed,
}

/// Counters describing the work a [`BindingCache`] has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Lookups answered from a published outcome
    pub hits: u64,
    /// Lookups that had to resolve or wait for a resolution
    pub misses: u64,
    /// Entries resolved to a binding
    pub resolved: u64,
    /// Entries resolved to an error
    pub failed: u64,
}

impl CacheStatistics {
    /// Fraction of lookups answered without resolving or waiting
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = self.hits as f64 / total as f64;
            rate
        }
    }
}

struct CacheEntry {
    cell: ResolutionCell<std::result::Result<Arc<Binding>, Error>>,
    /// Set by the first lookup answered from the published outcome
    hit: AtomicBool,
}

/// Cache of resolved bindings, shared by every type of a runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// # fn example(runtime: &BindingRuntime, ty: &BindType) -> bindscope::Result<()> {
/// runtime.cache().warm(ty);
/// let stats = runtime.cache().statistics();
/// println!("{} bindings, {} failures", stats.resolved, stats.failed);
/// # Ok(())
/// # }
/// ```
pub struct BindingCache {
    entries: SkipMap<MemberDescriptor, Arc<CacheEntry>>,
    resolver: BindingResolver,
    hits: AtomicU64,
    misses: AtomicU64,
    resolved: AtomicU64,
    failed: AtomicU64,
}

impl BindingCache {
    /// Create an empty cache resolving under `config`
    #[must_use]
    pub fn new(config: BindingConfig) -> Self {
        BindingCache {
            entries: SkipMap::new(),
            resolver: BindingResolver::new(config),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Return the binding of `descriptor`, resolving it on first use.
    ///
    /// The two accessors of an event share one entry, so their binding is resolved once, as a
    /// unit, and both observe the same [`crate::binding::EventBinding`].
    ///
    /// ## Arguments
    /// * 'declaring' - The type that declared the member
    /// * 'descriptor' - The accessor to resolve
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if `declaring` did not declare `descriptor`, the error
    /// that ended the resolution walk (the same one on every call), or
    /// [`Error::ConcurrentResolutionFailure`] / [`Error::ReentrantResolution`] when the
    /// resolution itself could not run.
    pub fn get_binding(
        &self,
        declaring: &BindType,
        descriptor: &MemberDescriptor,
    ) -> Result<Arc<Binding>> {
        if !declaring.declares(descriptor) {
            return Err(Error::MemberNotFound {
                type_name: declaring.fullname(),
                member: descriptor.to_string(),
            });
        }

        let key = descriptor.binding_key();
        let entry = self.entry(&key);

        if let Some(outcome) = entry.cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if !entry.hit.load(Ordering::Relaxed) && !entry.hit.swap(true, Ordering::Relaxed) {
                trace!(member = %key, declaring = %declaring.fullname(), "binding cache entry hit");
            }
            return outcome.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let outcome = entry.cell.get_or_resolve(|| {
            let outcome = self.resolver.resolve(declaring, &key);
            match &outcome {
                Ok(_) => {
                    self.resolved.fetch_add(1, Ordering::Relaxed);
                }
                Err(error) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(member = %key, error = %error, "binding resolution failed");
                }
            }
            outcome
        })?;

        outcome.clone()
    }

    /// The resolution state of `descriptor`, without resolving it
    #[must_use]
    pub fn state(&self, descriptor: &MemberDescriptor) -> EntryState {
        let key = descriptor.binding_key();
        let Some(entry) = self.entries.get(key.as_ref()) else {
            return EntryState::Unresolved;
        };

        let cell = &entry.value().cell;
        match cell.state() {
            CellState::Unresolved => EntryState::Unresolved,
            CellState::Resolving => EntryState::Resolving,
            CellState::Resolved => match cell.get() {
                Some(Ok(_)) => EntryState::Resolved,
                _ => EntryState::Failed,
            },
            CellState::Poisoned => EntryState::Failed,
        }
    }

    /// Resolve every bodyless member of `ty` in parallel.
    ///
    /// Failures are not returned, they are recorded in the cache and surface on the first access
    /// of the member.
    pub fn warm(&self, ty: &BindType) {
        let descriptors = ty.descriptors();
        trace!(
            declaring = %ty.fullname(),
            members = descriptors.len(),
            "warming binding cache"
        );

        descriptors.par_iter().for_each(|descriptor| {
            let _ = self.get_binding(ty, descriptor);
        });
    }

    /// Number of entries, event accessor pairs count once
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no member was ever accessed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the cache counters
    #[must_use]
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn entry(&self, key: &MemberDescriptor) -> Arc<CacheEntry> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }

        let entry = self.entries.get_or_insert(
            key.clone(),
            Arc::new(CacheEntry {
                cell: ResolutionCell::new(),
                hit: AtomicBool::new(false),
            }),
        );
        Arc::clone(entry.value())
    }
}

impl Default for BindingCache {
    fn default() -> Self {
        Self::new(BindingConfig::default())
    }
}
