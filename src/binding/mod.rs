//! Binding resolution for bodyless members.
//!
//! A bodyless member is declared without an implementation: a property without accessor bodies,
//! a method without a body, an event without add/remove bodies. Its implementation is a
//! [`Binding`], produced on demand by the [`BindingProvider`] of one of the declaring type's
//! ancestors and kept in the [`BindingCache`] for the lifetime of the runtime.
//!
//! # Key Components
//!
//! - [`Binding`] / [`BindingShape`] - The callable implementation and its tag
//! - [`BindingProvider`] / [`BindingRequest`] - The protocol between the resolver and base types
//! - [`BindingCache`] - Once-only, concurrent resolution with sticky outcomes
//!
//! # Resolution Flow
//!
//! ```text
//! shim access ──► BindingCache::get_binding ──► published? ──yes──► Binding
//!                                                  │ no
//!                                                  ▼
//!                          walk ancestors (immediate base first)
//!                                                  │
//!                          provider.resolve_*  ──► Binding │ Unsupported (next) │ Error (stop)
//! ```

pub mod cache;
pub mod provider;
mod resolver;
pub mod types;

pub use cache::{BindingCache, CacheStatistics, EntryState};
pub use provider::{BindingProvider, BindingRequest};
pub use types::{Binding, BindingShape, EventBinding, GetterFn, HandlerFn, InvokerFn, SetterFn};
