//! Core binding types.
//!
//! - [`Binding`]: The closed variant of callable shapes a provider produces
//! - [`BindingShape`]: The tag of a binding, checked against the member kind
//! - [`EventBinding`]: The add/remove pair implementing an event
//! - [`GetterFn`], [`SetterFn`], [`InvokerFn`], [`HandlerFn`]: Closure aliases

use std::{fmt, sync::Arc};

use strum::{EnumCount, EnumIter};

use crate::{
    runtime::{Delegate, Receiver, Value},
    Result,
};

/// Type alias for getter closures.
///
/// Getters receive the receiver (an instance, or the declaring type for static members) and
/// return the current value.
///
/// # Thread Safety
///
/// Bindings are shared by every thread touching the member, so closures must be `Send + Sync`.
pub type GetterFn = Arc<dyn Fn(&Receiver<'_>) -> Result<Value> + Send + Sync>;

/// Type alias for setter closures.
pub type SetterFn = Arc<dyn Fn(&Receiver<'_>, Value) -> Result<()> + Send + Sync>;

/// Type alias for method invoker closures.
///
/// Arguments are passed in declaration order, without the receiver.
pub type InvokerFn = Arc<dyn Fn(&Receiver<'_>, &[Value]) -> Result<Value> + Send + Sync>;

/// Type alias for one half of an event binding.
pub type HandlerFn = Arc<dyn Fn(&Receiver<'_>, &Delegate) -> Result<()> + Send + Sync>;

/// The tag of a [`Binding`].
///
/// Every [`crate::metadata::member::MemberKind`] maps to exactly one shape, and a provider that
/// answers with a different shape is rejected with [`crate::Error::ShapeMismatch`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, strum::Display,
)]
pub enum BindingShape {
    /// Produces a value from a receiver
    Getter,
    /// Stores a value on a receiver
    Setter,
    /// Invokes a method on a receiver
    Invoker,
    /// Adds and removes event handlers on a receiver
    Event,
}

/// The add/remove pair implementing an event.
///
/// Both halves are resolved together, as one unit, so a handler added through a binding is always
/// removed through the same binding.
#[derive(Clone)]
pub struct EventBinding {
    add: HandlerFn,
    remove: HandlerFn,
}

impl EventBinding {
    /// Create an event binding from its two halves
    pub fn new<A, R>(add: A, remove: R) -> Self
    where
        A: Fn(&Receiver<'_>, &Delegate) -> Result<()> + Send + Sync + 'static,
        R: Fn(&Receiver<'_>, &Delegate) -> Result<()> + Send + Sync + 'static,
    {
        EventBinding {
            add: Arc::new(add),
            remove: Arc::new(remove),
        }
    }

    /// Subscribe `handler` on `receiver`
    ///
    /// # Errors
    /// Propagates whatever the bound behavior reports.
    pub fn add(&self, receiver: &Receiver<'_>, handler: &Delegate) -> Result<()> {
        (self.add)(receiver, handler)
    }

    /// Unsubscribe `handler` from `receiver`
    ///
    /// # Errors
    /// Propagates whatever the bound behavior reports.
    pub fn remove(&self, receiver: &Receiver<'_>, handler: &Delegate) -> Result<()> {
        (self.remove)(receiver, handler)
    }
}

/// A concrete implementation for one bodyless member.
///
/// Bindings are produced by a [`crate::binding::BindingProvider`] exactly once per member and then
/// owned by the binding cache. They are never mutated after creation.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// let getter = Binding::getter(|_receiver| Ok(Value::I32(42)));
/// assert_eq!(getter.shape(), BindingShape::Getter);
/// ```
#[derive(Clone)]
pub enum Binding {
    /// Implementation of a property getter
    Getter(GetterFn),
    /// Implementation of a property setter
    Setter(SetterFn),
    /// Implementation of a method
    Invoker(InvokerFn),
    /// Implementation of an event
    Event(EventBinding),
}

impl Binding {
    /// Build a [`Binding::Getter`] from a closure
    pub fn getter<F>(f: F) -> Self
    where
        F: Fn(&Receiver<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Binding::Getter(Arc::new(f))
    }

    /// Build a [`Binding::Setter`] from a closure
    pub fn setter<F>(f: F) -> Self
    where
        F: Fn(&Receiver<'_>, Value) -> Result<()> + Send + Sync + 'static,
    {
        Binding::Setter(Arc::new(f))
    }

    /// Build a [`Binding::Invoker`] from a closure
    pub fn invoker<F>(f: F) -> Self
    where
        F: Fn(&Receiver<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Binding::Invoker(Arc::new(f))
    }

    /// Build a [`Binding::Event`] from its add and remove closures
    pub fn event<A, R>(add: A, remove: R) -> Self
    where
        A: Fn(&Receiver<'_>, &Delegate) -> Result<()> + Send + Sync + 'static,
        R: Fn(&Receiver<'_>, &Delegate) -> Result<()> + Send + Sync + 'static,
    {
        Binding::Event(EventBinding::new(add, remove))
    }

    /// The tag of this binding
    #[must_use]
    pub fn shape(&self) -> BindingShape {
        match self {
            Binding::Getter(_) => BindingShape::Getter,
            Binding::Setter(_) => BindingShape::Setter,
            Binding::Invoker(_) => BindingShape::Invoker,
            Binding::Event(_) => BindingShape::Event,
        }
    }

    /// The getter closure, if this is a getter
    #[must_use]
    pub fn as_getter(&self) -> Option<&GetterFn> {
        match self {
            Binding::Getter(f) => Some(f),
            _ => None,
        }
    }

    /// The setter closure, if this is a setter
    #[must_use]
    pub fn as_setter(&self) -> Option<&SetterFn> {
        match self {
            Binding::Setter(f) => Some(f),
            _ => None,
        }
    }

    /// The invoker closure, if this is an invoker
    #[must_use]
    pub fn as_invoker(&self) -> Option<&InvokerFn> {
        match self {
            Binding::Invoker(f) => Some(f),
            _ => None,
        }
    }

    /// The event pair, if this is an event binding
    #[must_use]
    pub fn as_event(&self) -> Option<&EventBinding> {
        match self {
            Binding::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&self.shape()).finish()
    }
}

impl fmt::Debug for EventBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinding").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_shapes() {
        assert_eq!(
            Binding::getter(|_| Ok(Value::Void)).shape(),
            BindingShape::Getter
        );
        assert_eq!(Binding::setter(|_, _| Ok(())).shape(), BindingShape::Setter);
        assert_eq!(
            Binding::invoker(|_, _| Ok(Value::Void)).shape(),
            BindingShape::Invoker
        );
        assert_eq!(
            Binding::event(|_, _| Ok(()), |_, _| Ok(())).shape(),
            BindingShape::Event
        );
        assert_eq!(BindingShape::COUNT, 4);
    }

    #[test]
    fn test_binding_accessors() {
        let getter = Binding::getter(|_| Ok(Value::I32(1)));
        assert!(getter.as_getter().is_some());
        assert!(getter.as_setter().is_none());
        assert!(getter.as_invoker().is_none());
        assert!(getter.as_event().is_none());
    }

    #[test]
    fn test_binding_debug() {
        let setter = Binding::setter(|_, _| Ok(()));
        assert_eq!(format!("{:?}", setter), "Binding(Setter)");
    }
}
