//! Runtime values flowing through bindings.
//!
//! [`Value`] is what getters return, setters receive and methods take and return. It covers the
//! primitive flavors a bodyless member can declare plus references to instances and delegates.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{metadata::typesystem::ValueFlavor, runtime::InstanceRc, Result};

static NEXT_DELEGATE_ID: AtomicU64 = AtomicU64::new(1);

/// Runtime value of a bodyless member.
///
/// # Flavor Mapping
///
/// | Variant | Flavor |
/// |---------|--------|
/// | [`Value::Void`] | [`ValueFlavor::Void`] |
/// | [`Value::Null`] | [`ValueFlavor::Object`] (accepted by every reference flavor) |
/// | [`Value::Bool`] | [`ValueFlavor::Boolean`] |
/// | [`Value::Char`] | [`ValueFlavor::Char`] |
/// | [`Value::I32`] | [`ValueFlavor::I4`] |
/// | [`Value::I64`] | [`ValueFlavor::I8`] |
/// | [`Value::F64`] | [`ValueFlavor::R8`] |
/// | [`Value::String`] | [`ValueFlavor::String`] |
/// | [`Value::Object`] | [`ValueFlavor::Class`] of the instance's type |
/// | [`Value::Delegate`] | [`ValueFlavor::Delegate`] |
///
/// # Equality
///
/// Primitives and strings compare by value, objects and delegates by identity.
#[derive(Clone)]
pub enum Value {
    /// No value, returned by void methods and setters
    Void,
    /// The null reference
    Null,
    /// Boolean
    Bool(bool),
    /// UTF-16 code unit, represented as a Rust `char`
    Char(char),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// Immutable string
    String(Arc<str>),
    /// Reference to an instance of a bind type
    Object(InstanceRc),
    /// Callable handler
    Delegate(Delegate),
}

impl Value {
    /// The flavor describing this value
    #[must_use]
    pub fn flavor(&self) -> ValueFlavor {
        match self {
            Value::Void => ValueFlavor::Void,
            Value::Null => ValueFlavor::Object,
            Value::Bool(_) => ValueFlavor::Boolean,
            Value::Char(_) => ValueFlavor::Char,
            Value::I32(_) => ValueFlavor::I4,
            Value::I64(_) => ValueFlavor::I8,
            Value::F64(_) => ValueFlavor::R8,
            Value::String(_) => ValueFlavor::String,
            Value::Object(instance) => ValueFlavor::Class(instance.bind_type().token()),
            Value::Delegate(_) => ValueFlavor::Delegate,
        }
    }

    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for [`Value::Void`]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// The boolean, if this is one
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The char, if this is one
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(v) => Some(*v),
            _ => None,
        }
    }

    /// The 32-bit integer, if this is one
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer widened to 64 bits, if this is a 32 or 64-bit integer
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is one
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// The string slice, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// The referenced instance, if this is an object
    #[must_use]
    pub fn as_object(&self) -> Option<&InstanceRc> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// The delegate, if this is one
    #[must_use]
    pub fn as_delegate(&self) -> Option<&Delegate> {
        match self {
            Value::Delegate(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Delegate(a), Value::Delegate(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("Void"),
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Char(v) => write!(f, "Char({v:?})"),
            Value::I32(v) => write!(f, "I32({v})"),
            Value::I64(v) => write!(f, "I64({v})"),
            Value::F64(v) => write!(f, "F64({v})"),
            Value::String(v) => write!(f, "String({v:?})"),
            Value::Object(instance) => write!(
                f,
                "Object({}#{})",
                instance.bind_type().fullname(),
                instance.id()
            ),
            Value::Delegate(delegate) => write!(f, "Delegate(#{})", delegate.id()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{v}'"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}L"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::Object(instance) => {
                write!(f, "{}#{}", instance.bind_type().fullname(), instance.id())
            }
            Value::Delegate(delegate) => write!(f, "delegate#{}", delegate.id()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<InstanceRc> for Value {
    fn from(value: InstanceRc) -> Self {
        Value::Object(value)
    }
}

impl From<Delegate> for Value {
    fn from(value: Delegate) -> Self {
        Value::Delegate(value)
    }
}

type DelegateFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A callable event handler.
///
/// Every delegate gets a process-wide unique id at creation. Clones share the id, so a clone of
/// the delegate passed to `add` removes the handler again.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// let handler = Delegate::new(|args| {
///     println!("changed: {:?}", args);
///     Ok(Value::Void)
/// });
/// let same = handler.clone();
/// assert_eq!(handler, same);
/// ```
#[derive(Clone)]
pub struct Delegate {
    id: u64,
    target: DelegateFn,
}

impl Delegate {
    /// Wrap a closure into a new delegate
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Delegate {
            id: NEXT_DELEGATE_ID.fetch_add(1, Ordering::Relaxed),
            target: Arc::new(target),
        }
    }

    /// Identity of the delegate, shared by its clones
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Call the delegate
    ///
    /// # Errors
    /// Propagates the error of the wrapped closure.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.target)(args)
    }
}

impl PartialEq for Delegate {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Delegate {}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate").field("id", &self.id).finish()
    }
}
