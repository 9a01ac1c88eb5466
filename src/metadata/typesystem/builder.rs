//! Builder for bind types.
//!
//! This module provides the [`TypeBuilder`] struct, the only way to create a [`BindType`]. It
//! collects the base type, the provider and the bodyless member declarations, validates the
//! declarations and produces the member descriptors, shims and data slot layouts of the new type
//! in one step.
//!
//! # Example
//!
//! ```rust,no_run
//! use bindscope::prelude::*;
//!
//! # fn example(runtime: &BindingRuntime, base: &BindTypeRc) -> bindscope::Result<()> {
//! let document = TypeBuilder::new("App", "Document")
//!     .extends(base)
//!     .member(MemberDecl::property("Title", ValueFlavor::String)
//!         .with_default(Value::from("Default Title")))
//!     .member(MemberDecl::method("Save", vec![ValueFlavor::String], ValueFlavor::Boolean))
//!     .member(MemberDecl::event("Saved"))
//!     .define(runtime)?;
//! # Ok(())
//! # }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use tracing::debug;

use crate::{
    binding::BindingProvider,
    metadata::{
        member::MemberDecl,
        typesystem::{BindType, BindTypeRc},
    },
    runtime::{BindingRuntime, MemberShim, SlotLayout, SlotTable},
    utils::synchronization::ResolutionCell,
    Error, Result,
};

/// Provides a fluent API for defining bind types
pub struct TypeBuilder {
    /// Namespace of the new type
    namespace: String,
    /// Simple name of the new type
    name: String,
    /// Immediate base type
    base: Option<BindTypeRc>,
    /// Provider offered to descendants
    provider: Option<Arc<dyn BindingProvider>>,
    /// Bodyless member declarations, in order
    members: Vec<MemberDecl>,
}

impl TypeBuilder {
    /// Start a new type
    ///
    /// ## Arguments
    /// * 'namespace' - The namespace, may be empty
    /// * 'name' - The simple type name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeBuilder {
            namespace: namespace.into(),
            name: name.into(),
            base: None,
            provider: None,
            members: Vec::new(),
        }
    }

    /// Derive the new type from `base`
    #[must_use]
    pub fn extends(mut self, base: &BindTypeRc) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Offer `provider` to the descendants of the new type
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn BindingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Declare a bodyless member
    #[must_use]
    pub fn member(mut self, decl: MemberDecl) -> Self {
        self.members.push(decl);
        self
    }

    /// Declare several bodyless members
    #[must_use]
    pub fn members(mut self, decls: impl IntoIterator<Item = MemberDecl>) -> Self {
        self.members.extend(decls);
        self
    }

    /// Validate the declarations and register the new type with `runtime`.
    ///
    /// With [`crate::BindingConfig::eager_resolution`] every member is resolved before this
    /// returns. Resolution failures do not fail the definition, they surface on first access.
    ///
    /// # Errors
    /// - [`Error::InvalidMember`] if a declaration is invalid or declared twice
    /// - [`Error::TypeNotFound`] if the base type belongs to another runtime
    /// - [`Error::TypeInsert`] if the name is empty or already taken
    /// - [`Error::TypeTableFull`] if the runtime has no type token left
    pub fn define(self, runtime: &BindingRuntime) -> Result<BindTypeRc> {
        if self.name.is_empty() {
            return Err(Error::TypeInsert("Type without a name".to_string()));
        }

        if let Some(base) = &self.base {
            if !runtime.types().contains(base) {
                return Err(Error::TypeNotFound(format!(
                    "{} is not defined in this runtime",
                    base.fullname()
                )));
            }
        }

        let mut member_index = HashMap::with_capacity(self.members.len());
        for (position, decl) in self.members.iter().enumerate() {
            decl.validate()?;
            if member_index.insert(decl.name().to_string(), position).is_some() {
                return Err(invalid_member!(
                    "Member '{}' is declared more than once on {}.{}",
                    decl.name(),
                    self.namespace,
                    self.name
                ));
            }
        }

        let config = *runtime.config();
        let registry = runtime.types().id();
        let token = runtime.types().next_token()?;
        let mut instance_layout = self
            .base
            .as_ref()
            .map(|base| SlotLayout::extending(base.instance_layout()))
            .unwrap_or_default();
        let mut static_layout = SlotLayout::new();

        let members = self
            .members
            .iter()
            .map(|decl| {
                MemberShim::build(decl, registry, token, &mut instance_layout, &mut static_layout)
                    .map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;

        let statics = SlotTable::new(&static_layout, config.retain_previous_values);
        let new_type = Arc::new_cyclic(|this: &Weak<BindType>| BindType {
            registry,
            token,
            namespace: self.namespace,
            name: self.name,
            base: self.base,
            provider: self.provider,
            members,
            member_index,
            instance_layout,
            statics,
            static_init: ResolutionCell::new(),
            cache: Arc::clone(runtime.cache()),
            config,
            this: this.clone(),
        });

        runtime.types().insert(&new_type)?;

        debug!(
            declaring = %new_type.fullname(),
            token = %new_type.token(),
            members = new_type.members().len(),
            "defined type"
        );

        if config.eager_resolution {
            runtime.warm(&new_type);
        }

        Ok(new_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BindingConfig,
        metadata::{
            member::{MemberFlags, MemberKind},
            typesystem::ValueFlavor,
        },
        runtime::Value,
    };

    #[test]
    fn test_define_with_members() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let ty = TypeBuilder::new("App", "Document")
            .member(MemberDecl::property("Title", ValueFlavor::String))
            .member(MemberDecl::method("Save", vec![], ValueFlavor::Boolean))
            .member(MemberDecl::event("Saved"))
            .member(MemberDecl::property("Opened", ValueFlavor::I4).as_static())
            .define(&runtime)
            .unwrap();

        assert_eq!(ty.fullname(), "App.Document");
        assert!(ty.token().is_type_def());
        assert_eq!(ty.members().len(), 4);
        assert_eq!(ty.descriptors().len(), 7);
        assert_eq!(ty.instance_layout().len(), 1);
        assert_eq!(ty.statics().len(), 1);
        assert!(ty
            .descriptors()
            .iter()
            .all(|d| d.owning_type() == ty.token()));
    }

    #[test]
    fn test_derived_layout_extends_base() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let base = TypeBuilder::new("App", "Base")
            .member(MemberDecl::property("Name", ValueFlavor::String))
            .define(&runtime)
            .unwrap();
        let derived = TypeBuilder::new("App", "Derived")
            .extends(&base)
            .member(MemberDecl::property("Count", ValueFlavor::I4))
            .define(&runtime)
            .unwrap();

        assert_eq!(derived.instance_layout().len(), 2);
        let count = derived.descriptor("Count", MemberKind::Get).unwrap();
        assert_eq!(derived.slot_of(&count).map(|s| s.index()), Some(1));

        let name = base.descriptor("Name", MemberKind::Get).unwrap();
        assert_eq!(base.slot_of(&name).map(|s| s.index()), Some(0));
        assert_eq!(derived.slot_of(&name), None);
    }

    #[test]
    fn test_identical_members_on_two_types_differ() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let first = TypeBuilder::new("App", "First")
            .member(MemberDecl::property("Count", ValueFlavor::I4))
            .define(&runtime)
            .unwrap();
        let second = TypeBuilder::new("App", "Second")
            .member(MemberDecl::property("Count", ValueFlavor::I4))
            .define(&runtime)
            .unwrap();

        let a = first.descriptor("Count", MemberKind::Get).unwrap();
        let b = second.descriptor("Count", MemberKind::Get).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_reject_duplicate_member() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let result = TypeBuilder::new("App", "Twice")
            .member(MemberDecl::property("Value", ValueFlavor::I4))
            .member(MemberDecl::method("Value", vec![], ValueFlavor::Void))
            .define(&runtime);
        assert!(matches!(result, Err(Error::InvalidMember { .. })));
        assert!(runtime.types().is_empty());
    }

    #[test]
    fn test_reject_abstract_and_extern() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let abstract_member = TypeBuilder::new("App", "Abstract")
            .member(
                MemberDecl::property("Value", ValueFlavor::I4).with_flags(MemberFlags::ABSTRACT),
            )
            .define(&runtime);
        assert!(matches!(abstract_member, Err(Error::InvalidMember { .. })));

        let extern_member = TypeBuilder::new("App", "Extern")
            .member(
                MemberDecl::method("Native", vec![], ValueFlavor::Void)
                    .with_flags(MemberFlags::EXTERN),
            )
            .define(&runtime);
        assert!(matches!(extern_member, Err(Error::InvalidMember { .. })));
    }

    #[test]
    fn test_reject_default_on_read_only() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        let result = TypeBuilder::new("App", "ReadOnly")
            .member(
                MemberDecl::property("Title", ValueFlavor::String)
                    .read_only()
                    .with_default(Value::from("x")),
            )
            .define(&runtime);
        assert!(matches!(result, Err(Error::InvalidMember { .. })));
    }

    #[test]
    fn test_reject_foreign_base() {
        let one = BindingRuntime::new(BindingConfig::default());
        let other = BindingRuntime::new(BindingConfig::default());
        let base = TypeBuilder::new("App", "Base").define(&one).unwrap();

        let result = TypeBuilder::new("App", "Derived")
            .extends(&base)
            .define(&other);
        assert!(matches!(result, Err(Error::TypeNotFound(_))));
    }

    #[test]
    fn test_reject_empty_name() {
        let runtime = BindingRuntime::new(BindingConfig::default());
        assert!(matches!(
            TypeBuilder::new("App", "").define(&runtime),
            Err(Error::TypeInsert(_))
        ));
    }
}
