//! Type system for bind types.
//!
//! This module provides the types whose bodyless members get their implementation from bindings.
//! A [`BindType`] knows its base, the provider it offers to its descendants, the shims of the
//! members it declares, and the data slot layouts of its instances and statics.
//!
//! # Key Components
//!
//! - [`BindType`]: A defined type, immutable after definition
//! - [`TypeBuilder`]: Validates member declarations and defines new types
//! - [`TypeRegistry`]: All types of one runtime, by token and by full name
//! - [`ValueFlavor`]: Static type of the values flowing through members
//!
//! # Type System Features
//!
//! - **Single inheritance**: Each type has at most one base, ancestors are walked nearest first
//! - **Provider per type**: A type may offer one [`BindingProvider`] to its descendants
//! - **Member shadowing**: A member declared on a derived type hides a base member of the same
//!   name in name lookups
//! - **Lazy statics**: Static default values are applied once, on first static access
//!
//! # Examples
//!
//! ```rust,no_run
//! use bindscope::prelude::*;
//!
//! # fn example(runtime: &BindingRuntime, base: &BindTypeRc) -> bindscope::Result<()> {
//! let counter = TypeBuilder::new("App", "Counter")
//!     .extends(base)
//!     .member(MemberDecl::property("Instances", ValueFlavor::I4).as_static())
//!     .member(MemberDecl::method("Reset", vec![], ValueFlavor::Void).as_static())
//!     .define(runtime)?;
//!
//! counter.set_static("Instances", 3)?;
//! counter.invoke_static("Reset", &[])?;
//! println!("{}", counter.get_static("Instances")?);
//! # Ok(())
//! # }
//! ```

mod builder;
mod flavor;
mod registry;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Weak},
};

use tracing::debug;

pub use builder::TypeBuilder;
pub use flavor::ValueFlavor;
pub use registry::TypeRegistry;

use crate::{
    binding::{Binding, BindingCache, BindingProvider, EntryState},
    config::BindingConfig,
    metadata::{
        member::{MemberDescriptor, MemberDescriptorRc, MemberKind},
        token::Token,
    },
    runtime::{
        Delegate, MemberHandle, MemberShim, Receiver, SlotIndex, SlotLayout, SlotTable, Value,
    },
    utils::synchronization::ResolutionCell,
    Error, Result,
};

/// Reference to a `BindType`
pub type BindTypeRc = Arc<BindType>;

/// A type with bodyless members.
///
/// Created by [`TypeBuilder::define`] and never mutated afterwards, except for the contents of
/// its static data slots.
pub struct BindType {
    registry: u64,
    token: Token,
    namespace: String,
    name: String,
    base: Option<BindTypeRc>,
    provider: Option<Arc<dyn BindingProvider>>,
    members: Vec<Arc<MemberShim>>,
    member_index: HashMap<String, usize>,
    instance_layout: SlotLayout,
    statics: SlotTable,
    static_init: ResolutionCell<Result<()>>,
    cache: Arc<BindingCache>,
    config: BindingConfig,
    this: Weak<BindType>,
}

impl BindType {
    /// The token identifying the type within its runtime
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// Id of the registry the type was defined in
    #[must_use]
    pub fn registry(&self) -> u64 {
        self.registry
    }

    /// The namespace, may be empty
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The simple name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace-qualified name
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// The immediate base type
    #[must_use]
    pub fn base(&self) -> Option<&BindTypeRc> {
        self.base.as_ref()
    }

    /// The provider this type offers to its descendants
    #[must_use]
    pub fn provider(&self) -> Option<&Arc<dyn BindingProvider>> {
        self.provider.as_ref()
    }

    /// All ancestors, from the immediate base up to the root. The type itself is not included.
    pub fn ancestors(&self) -> impl Iterator<Item = &BindTypeRc> {
        std::iter::successors(self.base.as_ref(), |ty| ty.base.as_ref())
    }

    /// Returns `true` if `token` names this type or one of its ancestors
    #[must_use]
    pub fn is_assignable_to(&self, token: Token) -> bool {
        self.token == token || self.ancestors().any(|ancestor| ancestor.token == token)
    }

    /// Returns `true` if `other` is this type or one of its ancestors
    #[must_use]
    pub fn derives_from(&self, other: &BindType) -> bool {
        self.registry == other.registry && self.is_assignable_to(other.token)
    }

    /// Returns `true` if `descriptor` was produced when this type was defined
    #[must_use]
    pub fn declares(&self, descriptor: &MemberDescriptor) -> bool {
        descriptor.registry() == self.registry && descriptor.owning_type() == self.token
    }

    /// The shims of the members declared on this type, in declaration order
    #[must_use]
    pub fn members(&self) -> &[Arc<MemberShim>] {
        &self.members
    }

    /// Descriptors of every accessor declared on this type
    #[must_use]
    pub fn descriptors(&self) -> Vec<MemberDescriptorRc> {
        self.members
            .iter()
            .flat_map(|shim| shim.descriptors())
            .collect()
    }

    /// The descriptor of accessor `kind` of the member `name` declared on this type
    #[must_use]
    pub fn descriptor(&self, name: &str, kind: MemberKind) -> Option<MemberDescriptorRc> {
        let index = self.member_index.get(name)?;
        self.members[*index].descriptor(kind).cloned()
    }

    /// The data slot reserved for the member `descriptor` belongs to, if it is a property of this
    /// type
    #[must_use]
    pub fn slot_of(&self, descriptor: &MemberDescriptor) -> Option<SlotIndex> {
        if !self.declares(descriptor) {
            return None;
        }

        let index = self.member_index.get(descriptor.name())?;
        self.members[*index].slot()
    }

    /// The binding of an accessor declared on this type, resolved on first use.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if the descriptor was not declared by this type, or the
    /// (sticky) resolution error of the member.
    pub fn binding(&self, descriptor: &MemberDescriptor) -> Result<Arc<Binding>> {
        if !self.declares(descriptor) {
            return Err(Error::MemberNotFound {
                type_name: self.fullname(),
                member: descriptor.to_string(),
            });
        }

        self.cache.get_binding(self, descriptor)
    }

    /// The resolution state of an accessor, without resolving it
    #[must_use]
    pub fn binding_state(&self, descriptor: &MemberDescriptor) -> EntryState {
        self.cache.state(descriptor)
    }

    /// Layout of the data slots every instance of this type carries
    #[must_use]
    pub fn instance_layout(&self) -> &SlotLayout {
        &self.instance_layout
    }

    /// The static data slots of this type
    #[must_use]
    pub fn statics(&self) -> &SlotTable {
        &self.statics
    }

    /// The configuration of the runtime that defined the type
    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Returns `true` if `name` is declared on this type or an ancestor
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.member_index.contains_key(name)
            || self
                .ancestors()
                .any(|ancestor| ancestor.member_index.contains_key(name))
    }

    /// Look up the member `name`, on this type first and then on its ancestors.
    ///
    /// # Errors
    /// Returns [`Error::MemberNotFound`] if no type in the chain declares `name`.
    pub fn member(&self, name: &str) -> Result<MemberHandle> {
        if let Some(index) = self.member_index.get(name) {
            let this = self
                .this
                .upgrade()
                .ok_or_else(|| Error::TypeNotFound(self.fullname()))?;
            return Ok(MemberHandle::new(this, Arc::clone(&self.members[*index])));
        }

        for ancestor in self.ancestors() {
            if let Some(index) = ancestor.member_index.get(name) {
                return Ok(MemberHandle::new(
                    Arc::clone(ancestor),
                    Arc::clone(&ancestor.members[*index]),
                ));
            }
        }

        Err(Error::MemberNotFound {
            type_name: self.fullname(),
            member: name.to_string(),
        })
    }

    /// Apply the default values of the static properties declared on this type.
    ///
    /// Runs once per type, every static access calls it. The outcome of the first run, success
    /// or error, is returned to every later call.
    ///
    /// # Errors
    /// Returns the error of the first default value that could not be routed through its setter.
    pub fn initialize_statics(&self) -> Result<()> {
        self.static_init
            .get_or_resolve(|| {
                let receiver = Receiver::Static(self);
                for shim in self.members.iter().filter(|shim| shim.is_static()) {
                    shim.apply_default(self, &receiver)?;
                }

                debug!(declaring = %self.fullname(), "static defaults applied");
                Ok(())
            })?
            .clone()
    }

    /// Read the static property `name`
    ///
    /// # Errors
    /// See [`MemberHandle::get_static`].
    pub fn get_static(&self, name: &str) -> Result<Value> {
        self.member(name)?.get_static()
    }

    /// Write the static property `name`
    ///
    /// # Errors
    /// See [`MemberHandle::set_static`].
    pub fn set_static(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.member(name)?.set_static(value.into())
    }

    /// Invoke the static method `name`
    ///
    /// # Errors
    /// See [`MemberHandle::invoke_static`].
    pub fn invoke_static(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.member(name)?.invoke_static(args)
    }

    /// Subscribe `handler` to the static event `name`
    ///
    /// # Errors
    /// See [`MemberHandle::add_static_handler`].
    pub fn add_static_handler(&self, name: &str, handler: &Delegate) -> Result<()> {
        self.member(name)?.add_static_handler(handler)
    }

    /// Unsubscribe `handler` from the static event `name`
    ///
    /// # Errors
    /// See [`MemberHandle::remove_static_handler`].
    pub fn remove_static_handler(&self, name: &str, handler: &Delegate) -> Result<()> {
        self.member(name)?.remove_static_handler(handler)
    }
}

impl fmt::Debug for BindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindType")
            .field("token", &self.token)
            .field("fullname", &self.fullname())
            .field("base", &self.base.as_ref().map(|base| base.fullname()))
            .field(
                "provider",
                &self.provider.as_ref().map(|provider| provider.name()),
            )
            .field("members", &self.members.len())
            .finish()
    }
}

impl fmt::Display for BindType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname())
    }
}
