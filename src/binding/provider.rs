//! The binding provider protocol.
//!
//! A type that supplies implementations for the bodyless members of its descendants attaches a
//! [`BindingProvider`] when it is defined. The resolver asks providers along the ancestor chain,
//! nearest first, until one of them answers with a [`Binding`].

use crate::{
    binding::Binding,
    metadata::{member::MemberDescriptor, typesystem::BindType},
    runtime::SlotIndex,
    Error, Result,
};

/// Everything a provider gets to see when it is asked for a binding.
///
/// # Examples
///
/// ```rust,ignore
/// fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
///     let Some(slot) = request.slot() else {
///         return Err(Error::unsupported(request.descriptor()));
///     };
///     Ok(Binding::getter(move |receiver| Ok(receiver.slot(slot)?.get())))
/// }
/// ```
#[derive(Clone, Copy)]
pub struct BindingRequest<'a> {
    descriptor: &'a MemberDescriptor,
    declaring: &'a BindType,
    provider_owner: &'a BindType,
    slot: Option<SlotIndex>,
}

impl<'a> BindingRequest<'a> {
    pub(crate) fn new(
        descriptor: &'a MemberDescriptor,
        declaring: &'a BindType,
        provider_owner: &'a BindType,
        slot: Option<SlotIndex>,
    ) -> Self {
        BindingRequest {
            descriptor,
            declaring,
            provider_owner,
            slot,
        }
    }

    /// The descriptor of the member being resolved
    #[must_use]
    pub fn descriptor(&self) -> &'a MemberDescriptor {
        self.descriptor
    }

    /// The concrete type that declared the member
    #[must_use]
    pub fn declaring_type(&self) -> &'a BindType {
        self.declaring
    }

    /// The ancestor whose provider is being asked
    #[must_use]
    pub fn provider_owner(&self) -> &'a BindType {
        self.provider_owner
    }

    /// The data slot reserved for the member, if it has one.
    ///
    /// Properties get a slot on every owner (instances, or the type for static members). The
    /// index is fixed for the lifetime of the declaring type and valid on every receiver the
    /// binding will ever see.
    #[must_use]
    pub fn slot(&self) -> Option<SlotIndex> {
        self.slot
    }

    /// Shorthand for declining this request
    #[must_use]
    pub fn unsupported(&self) -> Error {
        Error::unsupported(self.descriptor)
    }
}

/// Capability of a base type to manufacture bindings for bodyless members of its descendants.
///
/// All four operations are optional. The default implementations decline with
/// [`Error::UnsupportedMember`], which makes the resolver continue with the next ancestor.
///
/// # Contract
///
/// - An operation returns a [`Binding`] whose shape matches the descriptor kind, or declines
///   with [`Error::UnsupportedMember`]. Any other error is terminal for the member.
/// - Providers must be deterministic with respect to the descriptor. The binding cache calls a
///   provider at most once per member, so providers need no protection against concurrent or
///   repeated resolution.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// struct Constant;
///
/// impl BindingProvider for Constant {
///     fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
///         if request.descriptor().name() != "Answer" {
///             return Err(request.unsupported());
///         }
///         Ok(Binding::getter(|_| Ok(Value::I32(42))))
///     }
/// }
/// ```
pub trait BindingProvider: Send + Sync {
    /// Produce a [`Binding::Getter`] for a property getter
    ///
    /// # Errors
    /// Declines with [`Error::UnsupportedMember`] unless overridden.
    fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        Err(request.unsupported())
    }

    /// Produce a [`Binding::Setter`] for a property setter
    ///
    /// # Errors
    /// Declines with [`Error::UnsupportedMember`] unless overridden.
    fn resolve_setter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        Err(request.unsupported())
    }

    /// Produce a [`Binding::Invoker`] for a method
    ///
    /// # Errors
    /// Declines with [`Error::UnsupportedMember`] unless overridden.
    fn resolve_invoker(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        Err(request.unsupported())
    }

    /// Produce a [`Binding::Event`] for an event's add/remove pair
    ///
    /// # Errors
    /// Declines with [`Error::UnsupportedMember`] unless overridden.
    fn resolve_event(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        Err(request.unsupported())
    }

    /// Name used in log output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
