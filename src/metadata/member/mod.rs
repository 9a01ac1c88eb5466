//! Member descriptors for bodyless members.
//!
//! A [`MemberDescriptor`] is the immutable identity of one accessor of a bodyless member: the
//! getter or setter of a property, the invoker of a method, or the add/remove accessor of an
//! event. Descriptors are what binding providers receive when they are asked to manufacture an
//! implementation, and they key the binding cache.
//!
//! # Key Components
//!
//! - [`MemberDescriptor`] - Identity of one accessor (owning type, name, kind, signature, flags)
//! - [`MemberKind`] - The accessor kind (`Get`, `Set`, `Invoke`, `EventAdd`, `EventRemove`)
//! - [`MemberSignature`] - The value flavor(s) flowing through the accessor
//! - [`MemberFlags`] - Declaration modifiers (static, abstract, extern)
//! - [`MemberDecl`] - The inbound declaration a descriptor is produced from
//!
//! # Unforgeable Descriptors
//!
//! Descriptors have no public constructor. They are produced exclusively by
//! [`crate::metadata::typesystem::TypeBuilder::define`], after the declaration passed validation.
//! A provider can therefore only ever be asked to resolve members that really were declared,
//! on the type that really declared them. Every descriptor handed out corresponds to a
//! non-abstract, non-extern member.
//!
//! # Equality
//!
//! Two descriptors are equal iff all of their fields are equal. Structurally identical members on
//! two different types differ in their owning type token, or, for types of two runtimes, in the
//! id of the registry that issued the token. Bindings therefore never leak across types.

mod decl;

use std::{borrow::Cow, fmt, sync::Arc};

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

pub use decl::{DeclShape, MemberDecl};

use crate::{
    binding::BindingShape,
    metadata::{token::Token, typesystem::ValueFlavor},
};

/// Reference to a `MemberDescriptor`
pub type MemberDescriptorRc = Arc<MemberDescriptor>;

/// The accessor kind a descriptor identifies.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumCount,
    strum::Display,
)]
pub enum MemberKind {
    /// Property getter
    #[strum(to_string = "get")]
    Get,
    /// Property setter
    #[strum(to_string = "set")]
    Set,
    /// Method invocation
    #[strum(to_string = "invoke")]
    Invoke,
    /// Event handler subscription
    #[strum(to_string = "add")]
    EventAdd,
    /// Event handler removal
    #[strum(to_string = "remove")]
    EventRemove,
}

impl MemberKind {
    /// The binding shape a provider has to produce for this kind
    #[must_use]
    pub fn shape(&self) -> BindingShape {
        match self {
            MemberKind::Get => BindingShape::Getter,
            MemberKind::Set => BindingShape::Setter,
            MemberKind::Invoke => BindingShape::Invoker,
            MemberKind::EventAdd | MemberKind::EventRemove => BindingShape::Event,
        }
    }

    /// Returns `true` for the two event accessors
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self, MemberKind::EventAdd | MemberKind::EventRemove)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    /// Declaration modifiers of a bodyless member
    pub struct MemberFlags: u32 {
        /// Member belongs to the type, not to an instance
        const STATIC = 0x0010;
        /// Member is declared abstract (contradicts a bodyless declaration)
        const ABSTRACT = 0x0400;
        /// Member is implemented externally (contradicts a bodyless declaration)
        const EXTERN = 0x2000;
    }
}

/// The value flavor(s) flowing through an accessor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberSignature {
    /// Property value type, or handler type for events
    Value(ValueFlavor),
    /// Parameter and return types of a method
    Method {
        /// Parameter types, in declaration order
        params: Arc<[ValueFlavor]>,
        /// Return type, `Void` if the method returns nothing
        returns: ValueFlavor,
    },
}

/// Immutable identity of one accessor of a bodyless member.
///
/// See the [module documentation](self) for the construction and equality rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberDescriptor {
    registry: u64,
    owning_type: Token,
    name: Arc<str>,
    kind: MemberKind,
    signature: MemberSignature,
    flags: MemberFlags,
}

impl MemberDescriptor {
    pub(crate) fn new(
        registry: u64,
        owning_type: Token,
        name: Arc<str>,
        kind: MemberKind,
        signature: MemberSignature,
        flags: MemberFlags,
    ) -> Self {
        MemberDescriptor {
            registry,
            owning_type,
            name,
            kind,
            signature,
            flags,
        }
    }

    /// Token of the type that declared the member
    #[must_use]
    pub fn owning_type(&self) -> Token {
        self.owning_type
    }

    /// Id of the registry the owning type was defined in
    #[must_use]
    pub fn registry(&self) -> u64 {
        self.registry
    }

    /// The member name, without accessor prefix
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The accessor kind
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// The accessor signature
    #[must_use]
    pub fn signature(&self) -> &MemberSignature {
        &self.signature
    }

    /// Declaration modifiers
    #[must_use]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Returns `true` if the member belongs to the type rather than to instances
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    /// The property type or event handler type, `None` for methods
    #[must_use]
    pub fn value_flavor(&self) -> Option<ValueFlavor> {
        match &self.signature {
            MemberSignature::Value(flavor) => Some(*flavor),
            MemberSignature::Method { .. } => None,
        }
    }

    /// Parameter types of a method, empty for every other member
    #[must_use]
    pub fn params(&self) -> &[ValueFlavor] {
        match &self.signature {
            MemberSignature::Method { params, .. } => params,
            MemberSignature::Value(_) => &[],
        }
    }

    /// Return type of the accessor (`Void` for setters and event accessors)
    #[must_use]
    pub fn returns(&self) -> ValueFlavor {
        match (&self.signature, self.kind) {
            (MemberSignature::Method { returns, .. }, _) => *returns,
            (MemberSignature::Value(flavor), MemberKind::Get) => *flavor,
            (MemberSignature::Value(_), _) => ValueFlavor::Void,
        }
    }

    /// The CLR-style accessor name, e.g. `get_Title` or `add_Changed`
    #[must_use]
    pub fn accessor_name(&self) -> String {
        match self.kind {
            MemberKind::Invoke => self.name.to_string(),
            MemberKind::Get => format!("get_{}", self.name),
            MemberKind::Set => format!("set_{}", self.name),
            MemberKind::EventAdd => format!("add_{}", self.name),
            MemberKind::EventRemove => format!("remove_{}", self.name),
        }
    }

    /// The key this descriptor's binding is cached under.
    ///
    /// Event accessors resolve as one unit: the remove accessor shares the entry of its add
    /// accessor, so both always observe the same [`crate::binding::EventBinding`]. Every other
    /// descriptor is its own key.
    #[must_use]
    pub fn binding_key(&self) -> Cow<'_, MemberDescriptor> {
        if self.kind == MemberKind::EventRemove {
            Cow::Owned(self.sibling(MemberKind::EventAdd))
        } else {
            Cow::Borrowed(self)
        }
    }

    /// Another accessor of the same member
    pub(crate) fn sibling(&self, kind: MemberKind) -> MemberDescriptor {
        MemberDescriptor {
            registry: self.registry,
            owning_type: self.owning_type,
            name: self.name.clone(),
            kind,
            signature: self.signature.clone(),
            flags: self.flags,
        }
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static() {
            write!(f, "static {}::{}", self.owning_type, self.accessor_name())
        } else {
            write!(f, "{}::{}", self.owning_type, self.accessor_name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn descriptor(owner: u32, name: &str, kind: MemberKind) -> MemberDescriptor {
        MemberDescriptor::new(
            1,
            Token::type_def(owner),
            Arc::from(name),
            kind,
            MemberSignature::Value(ValueFlavor::I4),
            MemberFlags::empty(),
        )
    }

    #[test]
    fn test_descriptor_equality() {
        assert_eq!(
            descriptor(1, "Count", MemberKind::Get),
            descriptor(1, "Count", MemberKind::Get)
        );
        assert_ne!(
            descriptor(1, "Count", MemberKind::Get),
            descriptor(2, "Count", MemberKind::Get)
        );
        assert_ne!(
            descriptor(1, "Count", MemberKind::Get),
            descriptor(1, "Count", MemberKind::Set)
        );

        // Same token, issued by another registry
        let foreign = MemberDescriptor::new(
            2,
            Token::type_def(1),
            Arc::from("Count"),
            MemberKind::Get,
            MemberSignature::Value(ValueFlavor::I4),
            MemberFlags::empty(),
        );
        assert_ne!(descriptor(1, "Count", MemberKind::Get), foreign);
        assert_ne!(*foreign.binding_key(), descriptor(1, "Count", MemberKind::Get));
    }

    #[test]
    fn test_kind_shapes() {
        for kind in MemberKind::iter() {
            let shape = kind.shape();
            match kind {
                MemberKind::Get => assert_eq!(shape, BindingShape::Getter),
                MemberKind::Set => assert_eq!(shape, BindingShape::Setter),
                MemberKind::Invoke => assert_eq!(shape, BindingShape::Invoker),
                MemberKind::EventAdd | MemberKind::EventRemove => {
                    assert_eq!(shape, BindingShape::Event)
                }
            }
        }
        assert_eq!(MemberKind::COUNT, 5);
    }

    #[test]
    fn test_event_binding_key() {
        let add = descriptor(1, "Changed", MemberKind::EventAdd);
        let remove = descriptor(1, "Changed", MemberKind::EventRemove);
        assert_eq!(*remove.binding_key(), add);
        assert!(matches!(add.binding_key(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_accessor_names() {
        assert_eq!(descriptor(1, "Title", MemberKind::Get).accessor_name(), "get_Title");
        assert_eq!(descriptor(1, "Title", MemberKind::Set).accessor_name(), "set_Title");
        assert_eq!(
            descriptor(1, "Changed", MemberKind::EventRemove).accessor_name(),
            "remove_Changed"
        );
        assert_eq!(descriptor(1, "Run", MemberKind::Invoke).accessor_name(), "Run");
    }

    #[test]
    fn test_returns() {
        assert_eq!(descriptor(1, "X", MemberKind::Get).returns(), ValueFlavor::I4);
        assert_eq!(descriptor(1, "X", MemberKind::Set).returns(), ValueFlavor::Void);

        let method = MemberDescriptor::new(
            1,
            Token::type_def(1),
            Arc::from("Add"),
            MemberKind::Invoke,
            MemberSignature::Method {
                params: Arc::from(vec![ValueFlavor::I4, ValueFlavor::I4]),
                returns: ValueFlavor::I4,
            },
            MemberFlags::empty(),
        );
        assert_eq!(method.params(), &[ValueFlavor::I4, ValueFlavor::I4]);
        assert_eq!(method.returns(), ValueFlavor::I4);
        assert_eq!(method.value_flavor(), None);
    }

    #[test]
    fn test_display() {
        let getter = descriptor(3, "Count", MemberKind::Get);
        assert_eq!(getter.to_string(), "0x02000003::get_Count");

        let static_getter = MemberDescriptor::new(
            1,
            Token::type_def(3),
            Arc::from("Instances"),
            MemberKind::Get,
            MemberSignature::Value(ValueFlavor::I4),
            MemberFlags::STATIC,
        );
        assert_eq!(static_getter.to_string(), "static 0x02000003::get_Instances");
    }
}
