//! Value flavors for bodyless member signatures.
//!
//! A [`ValueFlavor`] is the static type information a member descriptor carries about the values
//! that flow through it: the property type, the event handler type, or the parameter and return
//! types of a method. It mirrors the small subset of CLR element types the binding runtime can
//! move through a [`crate::runtime::Value`].

use std::fmt;

use crate::{metadata::token::Token, runtime::Value};

/// Static type of a value flowing through a bodyless member.
///
/// # Value Mapping
///
/// | Flavor | Accepted values | Default |
/// |--------|-----------------|---------|
/// | [`Void`](Self::Void) | [`Value::Void`] | `Void` |
/// | [`Boolean`](Self::Boolean) | [`Value::Bool`] | `false` |
/// | [`Char`](Self::Char) | [`Value::Char`] | `'\0'` |
/// | [`I4`](Self::I4) | [`Value::I32`] | `0` |
/// | [`I8`](Self::I8) | [`Value::I64`] | `0` |
/// | [`R8`](Self::R8) | [`Value::F64`] | `0.0` |
/// | [`String`](Self::String) | [`Value::String`], `null` | `null` |
/// | [`Delegate`](Self::Delegate) | [`Value::Delegate`], `null` | `null` |
/// | [`Class`](Self::Class) | instances of the type or a subtype, `null` | `null` |
/// | [`Object`](Self::Object) | every non-void value | `null` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueFlavor {
    /// No value, only valid as a method return type
    Void,
    /// `System.Boolean`
    Boolean,
    /// `System.Char`
    Char,
    /// `System.Int32`
    I4,
    /// `System.Int64`
    I8,
    /// `System.Double`
    R8,
    /// `System.String`
    String,
    /// A callable handler, used by events
    Delegate,
    /// Instances of a specific type (or one of its subtypes)
    Class(Token),
    /// `System.Object`, accepts anything but `void`
    Object,
}

impl ValueFlavor {
    /// Returns `true` if the flavor describes a reference type, which admits `null`
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ValueFlavor::String | ValueFlavor::Delegate | ValueFlavor::Class(_) | ValueFlavor::Object
        )
    }

    /// Check whether `value` can be stored in or passed as this flavor
    ///
    /// ## Arguments
    /// * 'value' - The value to check
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueFlavor::Void, Value::Void) => true,
            (_, Value::Null) => self.is_reference(),
            (ValueFlavor::Object, Value::Void) => false,
            (ValueFlavor::Object, _) => true,
            (ValueFlavor::Boolean, Value::Bool(_))
            | (ValueFlavor::Char, Value::Char(_))
            | (ValueFlavor::I4, Value::I32(_))
            | (ValueFlavor::I8, Value::I64(_))
            | (ValueFlavor::R8, Value::F64(_))
            | (ValueFlavor::String, Value::String(_))
            | (ValueFlavor::Delegate, Value::Delegate(_)) => true,
            (ValueFlavor::Class(token), Value::Object(instance)) => {
                instance.bind_type().is_assignable_to(*token)
            }
            _ => false,
        }
    }

    /// The value a freshly allocated storage cell of this flavor holds
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            ValueFlavor::Void => Value::Void,
            ValueFlavor::Boolean => Value::Bool(false),
            ValueFlavor::Char => Value::Char('\0'),
            ValueFlavor::I4 => Value::I32(0),
            ValueFlavor::I8 => Value::I64(0),
            ValueFlavor::R8 => Value::F64(0.0),
            ValueFlavor::String
            | ValueFlavor::Delegate
            | ValueFlavor::Class(_)
            | ValueFlavor::Object => Value::Null,
        }
    }
}

impl fmt::Display for ValueFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueFlavor::Void => f.write_str("Void"),
            ValueFlavor::Boolean => f.write_str("Boolean"),
            ValueFlavor::Char => f.write_str("Char"),
            ValueFlavor::I4 => f.write_str("I4"),
            ValueFlavor::I8 => f.write_str("I8"),
            ValueFlavor::R8 => f.write_str("R8"),
            ValueFlavor::String => f.write_str("String"),
            ValueFlavor::Delegate => f.write_str("Delegate"),
            ValueFlavor::Class(token) => write!(f, "Class({})", token),
            ValueFlavor::Object => f.write_str("Object"),
        }
    }
}
