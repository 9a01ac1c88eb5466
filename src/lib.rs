// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # bindscope
//!
//! Binding resolution and dispatch for bodyless members.
//!
//! A bodyless member is a property, method or event declared without an implementation. Instead
//! of a body, it gets a **binding**: a callable manufactured on demand by a **binding provider**
//! attached to one of the declaring type's ancestors. `bindscope` finds the right provider,
//! resolves each member exactly once no matter how many threads reach it first, caches the
//! result for the lifetime of the runtime, and dispatches every get, set, invoke, add and remove
//! through it.
//!
//! ## Features
//!
//! - **Ancestor-provided implementations** - Providers on base types implement the bodyless
//!   members of all their descendants, nearest ancestor first
//! - **Once-only resolution** - Concurrent first accesses resolve a member once and all observe
//!   the identical binding, failures are sticky
//! - **Lock-free hot path** - Resolved bindings are read with a skip-list lookup and an acquire load
//! - **Data slots** - Typed per-instance and per-type storage providers can bind to directly
//! - **Static members and events** - Static receivers, add/remove pairs resolved as one unit
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bindscope::prelude::*;
//! use std::sync::Arc;
//!
//! /// Stores every bodyless property in its data slot
//! struct Storage;
//!
//! impl BindingProvider for Storage {
//!     fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
//!         let slot = request.slot().ok_or_else(|| request.unsupported())?;
//!         Ok(Binding::getter(move |receiver| Ok(receiver.slot(slot)?.get())))
//!     }
//!
//!     fn resolve_setter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
//!         let slot = request.slot().ok_or_else(|| request.unsupported())?;
//!         Ok(Binding::setter(move |receiver, value| {
//!             receiver.slot(slot)?.set(value).map(|_| ())
//!         }))
//!     }
//! }
//!
//! let runtime = BindingRuntime::new(BindingConfig::default());
//! let model = TypeBuilder::new("App", "Model")
//!     .provider(Arc::new(Storage))
//!     .define(&runtime)?;
//! let counter = TypeBuilder::new("App", "Counter")
//!     .extends(&model)
//!     .member(MemberDecl::property("Count", ValueFlavor::I4))
//!     .define(&runtime)?;
//!
//! let c = runtime.instantiate(&counter)?;
//! c.set("Count", 5)?;
//! assert_eq!(c.get("Count")?, Value::I32(5));
//! # Ok::<(), bindscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Member declarations, descriptors, tokens and the type system
//! - [`binding`] - Bindings, the provider protocol, the resolver and the once-only cache
//! - [`runtime`] - The runtime owning types, instances, values, data slots and dispatch shims
//! - [`utils`] - The once-only synchronization primitive
//!
//! ## Logging
//!
//! `bindscope` emits [`tracing`] events (type definitions, resolutions, declined requests and
//! failures) and installs no subscriber. Attach one in the application to see them.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

mod config;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// let runtime = BindingRuntime::new(BindingConfig::default());
/// let ty = TypeBuilder::new("App", "Empty").define(&runtime)?;
/// # Ok::<(), bindscope::Error>(())
/// ```
pub mod prelude;

/// Member declarations, descriptors and the type system
///
/// # Key Components
///
/// - [`metadata::member`] - [`metadata::member::MemberDecl`] and the unforgeable
///   [`metadata::member::MemberDescriptor`]
/// - [`metadata::typesystem`] - [`metadata::typesystem::BindType`],
///   [`metadata::typesystem::TypeBuilder`] and [`metadata::typesystem::TypeRegistry`]
/// - [`metadata::token`] - Tokens identifying types
pub mod metadata;

/// Bindings and their resolution
///
/// See [`binding::BindingProvider`] for the provider protocol and [`binding::BindingCache`] for
/// the once-only resolution guarantees.
pub mod binding;

/// Types at runtime: instances, values, data slots and dispatch
pub mod runtime;

/// Synchronization utilities
pub mod utils;

/// `bindscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::{Result, runtime::Instance};
///
/// fn title_of(document: &Instance) -> Result<String> {
///     Ok(document.get("Title")?.to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `bindscope` Error type
///
/// The main error type for all operations in this crate, from declaration validation through
/// binding resolution to dispatch.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::{Error, runtime::Instance};
///
/// # fn example(document: &Instance) {
/// match document.get("Title") {
///     Ok(title) => println!("Title: {}", title),
///     Err(Error::NoProviderFound { member, declaring }) => {
///         println!("{} on {} has no implementation", member, declaring)
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// # }
/// ```
pub use error::Error;

/// Configuration of a binding runtime
///
/// See [`BindingConfig::lazy`], [`BindingConfig::eager`], [`BindingConfig::change_tracking`] and
/// [`BindingConfig::minimal`] for the available presets.
pub use config::BindingConfig;
