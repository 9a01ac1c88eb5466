//! Instances of bind types and the receivers bindings operate on.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    metadata::typesystem::{BindType, BindTypeRc},
    runtime::{Delegate, Slot, SlotIndex, SlotTable, Value},
    Result,
};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Reference to an `Instance`
pub type InstanceRc = Arc<Instance>;

/// An object of a bind type.
///
/// Instances own one data slot per bodyless instance property of their type and all of its
/// ancestors. Everything else about them (where values really live, what methods do) is up to
/// the bindings of their members.
///
/// Instances are created through [`crate::runtime::BindingRuntime::instantiate`], which also
/// routes declared default values through the property setters.
pub struct Instance {
    id: u64,
    ty: BindTypeRc,
    slots: SlotTable,
}

impl Instance {
    pub(crate) fn new(ty: BindTypeRc, retain_previous: bool) -> InstanceRc {
        let slots = SlotTable::new(ty.instance_layout(), retain_previous);
        Arc::new(Instance {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            ty,
            slots,
        })
    }

    /// Process-wide unique identity of the instance
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The concrete type of the instance
    #[must_use]
    pub fn bind_type(&self) -> &BindTypeRc {
        &self.ty
    }

    /// The data slots of the instance
    #[must_use]
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Read the property `name`
    ///
    /// # Errors
    /// Returns [`crate::Error::MemberNotFound`] for unknown names, [`crate::Error::MemberAccess`]
    /// if the member is not a readable instance property, or the resolution / binding error.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.ty.member(name)?.get(self)
    }

    /// Write the property `name`
    ///
    /// # Errors
    /// See [`Instance::get`], plus [`crate::Error::ValueMismatch`] for values of the wrong flavor.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.ty.member(name)?.set(self, value.into())
    }

    /// Invoke the method `name`
    ///
    /// # Errors
    /// See [`Instance::get`], plus [`crate::Error::ValueMismatch`] for wrong arguments.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.ty.member(name)?.invoke(self, args)
    }

    /// Subscribe `handler` to the event `name`
    ///
    /// # Errors
    /// See [`Instance::get`].
    pub fn add_handler(&self, name: &str, handler: &Delegate) -> Result<()> {
        self.ty.member(name)?.add_handler(self, handler)
    }

    /// Unsubscribe `handler` from the event `name`
    ///
    /// # Errors
    /// See [`Instance::get`].
    pub fn remove_handler(&self, name: &str, handler: &Delegate) -> Result<()> {
        self.ty.member(name)?.remove_handler(self, handler)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("type", &self.ty.fullname())
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// The target a binding operates on.
///
/// Instance members receive the instance, static members receive the type that declared them.
#[derive(Debug, Clone, Copy)]
pub enum Receiver<'a> {
    /// An instance member was accessed on this instance
    Instance(&'a Instance),
    /// A static member was accessed, on this declaring type
    Static(&'a BindType),
}

impl<'a> Receiver<'a> {
    /// The data slot at `index`, from the instance or the type's static slots.
    ///
    /// # Errors
    /// Returns [`crate::Error::SlotNotFound`] if the receiver has no such slot.
    pub fn slot(&self, index: SlotIndex) -> Result<&'a Slot> {
        match *self {
            Receiver::Instance(instance) => instance.slots().get(index),
            Receiver::Static(ty) => ty.statics().get(index),
        }
    }

    /// The instance, unless this is a static receiver
    #[must_use]
    pub fn instance(&self) -> Option<&'a Instance> {
        match *self {
            Receiver::Instance(instance) => Some(instance),
            Receiver::Static(_) => None,
        }
    }

    /// Returns `true` for static receivers
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, Receiver::Static(_))
    }

    /// The concrete type of the instance, or the static receiver's type
    #[must_use]
    pub fn type_of(&self) -> &'a BindType {
        match *self {
            Receiver::Instance(instance) => instance.bind_type().as_ref(),
            Receiver::Static(ty) => ty,
        }
    }

    /// The instance id, `None` for static receivers
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        self.instance().map(Instance::id)
    }
}
