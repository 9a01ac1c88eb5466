//! Inbound declarations of bodyless members.
//!
//! A [`MemberDecl`] is what the surface-syntax side hands to a
//! [`crate::metadata::typesystem::TypeBuilder`]: a member name, its shape, its modifiers and an
//! optional initial value. Declarations are validated once, when the type is defined, and turned
//! into [`MemberDescriptor`]s carrying the token of the declaring type.

use std::sync::Arc;

use crate::{
    metadata::{
        member::{MemberDescriptor, MemberFlags, MemberKind, MemberSignature},
        token::Token,
        typesystem::ValueFlavor,
    },
    runtime::Value,
    Result,
};

/// The shape of a declared bodyless member.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclShape {
    /// A property with a getter and/or setter
    Property {
        /// Property value type
        flavor: ValueFlavor,
        /// Declares a getter
        readable: bool,
        /// Declares a setter
        writable: bool,
    },
    /// A method
    Method {
        /// Parameter types
        params: Vec<ValueFlavor>,
        /// Return type
        returns: ValueFlavor,
    },
    /// An event with its add/remove pair
    Event {
        /// Handler type
        handler: ValueFlavor,
    },
}

/// Declaration of one bodyless member.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// let title = MemberDecl::property("Title", ValueFlavor::String)
///     .with_default(Value::from("Default Title"));
/// let count = MemberDecl::property("Instances", ValueFlavor::I4).as_static();
/// let run = MemberDecl::method("Run", vec![ValueFlavor::I4], ValueFlavor::Boolean);
/// let changed = MemberDecl::event("Changed");
/// ```
#[derive(Debug, Clone)]
pub struct MemberDecl {
    pub(crate) name: String,
    pub(crate) shape: DeclShape,
    pub(crate) flags: MemberFlags,
    pub(crate) default: Option<Value>,
}

impl MemberDecl {
    /// Declare a read/write property
    ///
    /// ## Arguments
    /// * 'name' - The property name
    /// * 'flavor' - The property value type
    pub fn property(name: impl Into<String>, flavor: ValueFlavor) -> Self {
        Self::with_shape(
            name,
            DeclShape::Property {
                flavor,
                readable: true,
                writable: true,
            },
        )
    }

    /// Declare a method
    ///
    /// ## Arguments
    /// * 'name' - The method name
    /// * 'params' - Parameter types, in order
    /// * 'returns' - Return type (`Void` for none)
    pub fn method(name: impl Into<String>, params: Vec<ValueFlavor>, returns: ValueFlavor) -> Self {
        Self::with_shape(name, DeclShape::Method { params, returns })
    }

    /// Declare an event taking delegate handlers
    ///
    /// ## Arguments
    /// * 'name' - The event name
    pub fn event(name: impl Into<String>) -> Self {
        Self::with_shape(
            name,
            DeclShape::Event {
                handler: ValueFlavor::Delegate,
            },
        )
    }

    fn with_shape(name: impl Into<String>, shape: DeclShape) -> Self {
        MemberDecl {
            name: name.into(),
            shape,
            flags: MemberFlags::empty(),
            default: None,
        }
    }

    /// Drop the setter of a property
    #[must_use]
    pub fn read_only(mut self) -> Self {
        if let DeclShape::Property { writable, .. } = &mut self.shape {
            *writable = false;
        }
        self
    }

    /// Drop the getter of a property
    #[must_use]
    pub fn write_only(mut self) -> Self {
        if let DeclShape::Property { readable, .. } = &mut self.shape {
            *readable = false;
        }
        self
    }

    /// Declare the member static
    #[must_use]
    pub fn as_static(mut self) -> Self {
        self.flags |= MemberFlags::STATIC;
        self
    }

    /// Add declaration modifiers
    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the initial value, routed through the setter binding when the owner is created
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// The declared member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared shape
    #[must_use]
    pub fn shape(&self) -> &DeclShape {
        &self.shape
    }

    /// Returns `true` if the member is declared static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    /// Check the declaration for contradictions.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidMember`] if the member is abstract or extern, has no name,
    /// has no accessor, or carries a default value that can not be routed through a setter.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(invalid_member!("Bodyless member without a name"));
        }

        if self.flags.contains(MemberFlags::ABSTRACT) {
            return Err(invalid_member!(
                "Bodyless member '{}' can not be abstract, its body is supplied by a binding",
                self.name
            ));
        }

        if self.flags.contains(MemberFlags::EXTERN) {
            return Err(invalid_member!(
                "Bodyless member '{}' can not be extern, its body is supplied by a binding",
                self.name
            ));
        }

        match &self.shape {
            DeclShape::Property {
                flavor,
                readable,
                writable,
            } => {
                if !readable && !writable {
                    return Err(invalid_member!(
                        "Property '{}' declares neither a getter nor a setter",
                        self.name
                    ));
                }
                if *flavor == ValueFlavor::Void {
                    return Err(invalid_member!("Property '{}' can not be void", self.name));
                }
                if let Some(default) = &self.default {
                    if !writable {
                        return Err(invalid_member!(
                            "Property '{}' has a default value but no setter to route it through",
                            self.name
                        ));
                    }
                    if !flavor.accepts(default) {
                        return Err(invalid_member!(
                            "Default value of '{}' is {}, expected {}",
                            self.name,
                            default.flavor(),
                            flavor
                        ));
                    }
                }
            }
            DeclShape::Method { params, .. } => {
                if params.contains(&ValueFlavor::Void) {
                    return Err(invalid_member!(
                        "Method '{}' declares a void parameter",
                        self.name
                    ));
                }
                if self.default.is_some() {
                    return Err(invalid_member!(
                        "Method '{}' can not have a default value",
                        self.name
                    ));
                }
            }
            DeclShape::Event { .. } => {
                if self.default.is_some() {
                    return Err(invalid_member!(
                        "Event '{}' can not have a default value",
                        self.name
                    ));
                }
            }
        }

        Ok(())
    }

    /// Produce the descriptors of every accessor, owned by `owner`.
    ///
    /// The declaration must have passed [`MemberDecl::validate`].
    pub(crate) fn descriptors(&self, registry: u64, owner: Token) -> Vec<MemberDescriptor> {
        let name: Arc<str> = Arc::from(self.name.as_str());
        let describe = |kind, signature| {
            MemberDescriptor::new(registry, owner, name.clone(), kind, signature, self.flags)
        };

        match &self.shape {
            DeclShape::Property {
                flavor,
                readable,
                writable,
            } => {
                let mut result = Vec::with_capacity(2);
                if *readable {
                    result.push(describe(MemberKind::Get, MemberSignature::Value(*flavor)));
                }
                if *writable {
                    result.push(describe(MemberKind::Set, MemberSignature::Value(*flavor)));
                }
                result
            }
            DeclShape::Method { params, returns } => vec![describe(
                MemberKind::Invoke,
                MemberSignature::Method {
                    params: Arc::from(params.as_slice()),
                    returns: *returns,
                },
            )],
            DeclShape::Event { handler } => vec![
                describe(MemberKind::EventAdd, MemberSignature::Value(*handler)),
                describe(MemberKind::EventRemove, MemberSignature::Value(*handler)),
            ],
        }
    }
}
