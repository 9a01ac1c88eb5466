//! Dispatch shims for bodyless members.
//!
//! A shim is the body the runtime gives a bodyless member. It knows the member's descriptors,
//! fetches the resolved binding from the cache on every call and forwards the receiver and
//! arguments to it. Shims hold no binding themselves: the cache is the single owner, so a shim
//! never observes a half-resolved member.
//!
//! # Key Components
//!
//! - [`MemberShim`] - The shim of one member: property, method or event
//! - [`MemberHandle`] - A member bound to its declaring type, reusable across calls and receivers
//!
//! # Dispatch Checks
//!
//! Before a binding is called, the shim checks that the member supports the access (reading a
//! write-only property or invoking an event fails with [`Error::MemberAccess`]) and, when
//! [`crate::BindingConfig::validate_values`] is set, that arguments and results match the
//! declared flavors ([`Error::ValueMismatch`]).

use std::{fmt, sync::Arc};

use crate::{
    binding::Binding,
    metadata::{
        member::{DeclShape, MemberDecl, MemberDescriptor, MemberDescriptorRc, MemberKind},
        token::Token,
        typesystem::{BindType, BindTypeRc, ValueFlavor},
    },
    runtime::{Delegate, Instance, Receiver, SlotIndex, SlotLayout, Value},
    Error, Result,
};

/// Shim of a bodyless property.
#[derive(Debug)]
pub struct PropertyShim {
    name: Arc<str>,
    flavor: ValueFlavor,
    getter: Option<MemberDescriptorRc>,
    setter: Option<MemberDescriptorRc>,
    default: Option<Value>,
    slot: SlotIndex,
    is_static: bool,
}

impl PropertyShim {
    /// The property type
    #[must_use]
    pub fn flavor(&self) -> ValueFlavor {
        self.flavor
    }

    /// Descriptor of the getter, `None` for write-only properties
    #[must_use]
    pub fn getter(&self) -> Option<&MemberDescriptorRc> {
        self.getter.as_ref()
    }

    /// Descriptor of the setter, `None` for read-only properties
    #[must_use]
    pub fn setter(&self) -> Option<&MemberDescriptorRc> {
        self.setter.as_ref()
    }

    /// The declared initial value
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The data slot reserved for the property on each owner
    #[must_use]
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }
}

/// Shim of a bodyless method.
#[derive(Debug)]
pub struct MethodShim {
    descriptor: MemberDescriptorRc,
}

impl MethodShim {
    /// Descriptor of the invoker
    #[must_use]
    pub fn descriptor(&self) -> &MemberDescriptorRc {
        &self.descriptor
    }
}

/// Shim of a bodyless event.
#[derive(Debug)]
pub struct EventShim {
    add: MemberDescriptorRc,
    remove: MemberDescriptorRc,
}

impl EventShim {
    /// Descriptor of the add accessor
    #[must_use]
    pub fn add(&self) -> &MemberDescriptorRc {
        &self.add
    }

    /// Descriptor of the remove accessor
    #[must_use]
    pub fn remove(&self) -> &MemberDescriptorRc {
        &self.remove
    }
}

/// The dispatch shim of one bodyless member.
#[derive(Debug)]
pub enum MemberShim {
    /// A property with getter and/or setter
    Property(PropertyShim),
    /// A method
    Method(MethodShim),
    /// An event with add/remove accessors
    Event(EventShim),
}

impl MemberShim {
    /// Build the shim of a validated declaration on the type `owner` of `registry`.
    ///
    /// Properties reserve their data slot in `instance_layout` or `static_layout`.
    pub(crate) fn build(
        decl: &MemberDecl,
        registry: u64,
        owner: Token,
        instance_layout: &mut SlotLayout,
        static_layout: &mut SlotLayout,
    ) -> Result<MemberShim> {
        let mut descriptors = decl
            .descriptors(registry, owner)
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();

        let take = |descriptors: &mut Vec<MemberDescriptorRc>, kind: MemberKind| {
            descriptors
                .iter()
                .position(|d| d.kind() == kind)
                .map(|position| descriptors.swap_remove(position))
        };

        match decl.shape() {
            DeclShape::Property { flavor, .. } => {
                let getter = take(&mut descriptors, MemberKind::Get);
                let setter = take(&mut descriptors, MemberKind::Set);
                let Some(any) = getter.as_ref().or(setter.as_ref()) else {
                    return Err(invalid_member!(
                        "Property '{}' declares neither a getter nor a setter",
                        decl.name()
                    ));
                };

                let layout = if decl.is_static() {
                    static_layout
                } else {
                    instance_layout
                };
                let slot = layout.allocate(any, *flavor);

                Ok(MemberShim::Property(PropertyShim {
                    name: Arc::from(decl.name()),
                    flavor: *flavor,
                    getter,
                    setter,
                    default: decl.default.clone(),
                    slot,
                    is_static: decl.is_static(),
                }))
            }
            DeclShape::Method { .. } => {
                let descriptor = take(&mut descriptors, MemberKind::Invoke).ok_or_else(|| {
                    invalid_member!("Method '{}' produced no invoker", decl.name())
                })?;
                Ok(MemberShim::Method(MethodShim { descriptor }))
            }
            DeclShape::Event { .. } => {
                let add = take(&mut descriptors, MemberKind::EventAdd);
                let remove = take(&mut descriptors, MemberKind::EventRemove);
                match (add, remove) {
                    (Some(add), Some(remove)) => Ok(MemberShim::Event(EventShim { add, remove })),
                    _ => Err(invalid_member!(
                        "Event '{}' needs both add and remove accessors",
                        decl.name()
                    )),
                }
            }
        }
    }

    /// The member name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MemberShim::Property(property) => &property.name,
            MemberShim::Method(method) => method.descriptor.name(),
            MemberShim::Event(event) => event.add.name(),
        }
    }

    /// Returns `true` if the member belongs to its type rather than to instances
    #[must_use]
    pub fn is_static(&self) -> bool {
        match self {
            MemberShim::Property(property) => property.is_static,
            MemberShim::Method(method) => method.descriptor.is_static(),
            MemberShim::Event(event) => event.add.is_static(),
        }
    }

    /// Descriptors of all accessors of the member
    #[must_use]
    pub fn descriptors(&self) -> Vec<MemberDescriptorRc> {
        match self {
            MemberShim::Property(property) => property
                .getter
                .iter()
                .chain(property.setter.iter())
                .cloned()
                .collect(),
            MemberShim::Method(method) => vec![method.descriptor.clone()],
            MemberShim::Event(event) => vec![event.add.clone(), event.remove.clone()],
        }
    }

    /// The descriptor of the accessor `kind`, if the member has one
    #[must_use]
    pub fn descriptor(&self, kind: MemberKind) -> Option<&MemberDescriptorRc> {
        match (self, kind) {
            (MemberShim::Property(property), MemberKind::Get) => property.getter.as_ref(),
            (MemberShim::Property(property), MemberKind::Set) => property.setter.as_ref(),
            (MemberShim::Method(method), MemberKind::Invoke) => Some(&method.descriptor),
            (MemberShim::Event(event), MemberKind::EventAdd) => Some(&event.add),
            (MemberShim::Event(event), MemberKind::EventRemove) => Some(&event.remove),
            _ => None,
        }
    }

    /// The data slot of a property
    #[must_use]
    pub fn slot(&self) -> Option<SlotIndex> {
        match self {
            MemberShim::Property(property) => Some(property.slot),
            _ => None,
        }
    }

    pub(crate) fn get(&self, declaring: &BindType, receiver: &Receiver<'_>) -> Result<Value> {
        let descriptor = self.accessor(declaring, MemberKind::Get)?;
        let binding = declaring.binding(descriptor)?;
        let getter = binding
            .as_getter()
            .ok_or_else(|| shape_error(descriptor, &binding))?;

        let value = getter(receiver)?;
        if declaring.config().validate_values {
            check_value(descriptor, descriptor.returns(), &value)?;
        }
        Ok(value)
    }

    pub(crate) fn set(
        &self,
        declaring: &BindType,
        receiver: &Receiver<'_>,
        value: Value,
    ) -> Result<()> {
        let descriptor = self.accessor(declaring, MemberKind::Set)?;
        if declaring.config().validate_values {
            if let Some(flavor) = descriptor.value_flavor() {
                check_value(descriptor, flavor, &value)?;
            }
        }

        let binding = declaring.binding(descriptor)?;
        let setter = binding
            .as_setter()
            .ok_or_else(|| shape_error(descriptor, &binding))?;
        setter(receiver, value)
    }

    pub(crate) fn invoke(
        &self,
        declaring: &BindType,
        receiver: &Receiver<'_>,
        args: &[Value],
    ) -> Result<Value> {
        let descriptor = self.accessor(declaring, MemberKind::Invoke)?;
        let validate = declaring.config().validate_values;
        if validate {
            check_arguments(descriptor, args)?;
        }

        let binding = declaring.binding(descriptor)?;
        let invoker = binding
            .as_invoker()
            .ok_or_else(|| shape_error(descriptor, &binding))?;

        let result = invoker(receiver, args)?;
        match descriptor.returns() {
            ValueFlavor::Void => Ok(Value::Void),
            returns => {
                if validate {
                    check_value(descriptor, returns, &result)?;
                }
                Ok(result)
            }
        }
    }

    pub(crate) fn add_handler(
        &self,
        declaring: &BindType,
        receiver: &Receiver<'_>,
        handler: &Delegate,
    ) -> Result<()> {
        let descriptor = self.accessor(declaring, MemberKind::EventAdd)?;
        let binding = declaring.binding(descriptor)?;
        let event = binding
            .as_event()
            .ok_or_else(|| shape_error(descriptor, &binding))?;
        event.add(receiver, handler)
    }

    pub(crate) fn remove_handler(
        &self,
        declaring: &BindType,
        receiver: &Receiver<'_>,
        handler: &Delegate,
    ) -> Result<()> {
        let descriptor = self.accessor(declaring, MemberKind::EventRemove)?;
        let binding = declaring.binding(descriptor)?;
        let event = binding
            .as_event()
            .ok_or_else(|| shape_error(descriptor, &binding))?;
        event.remove(receiver, handler)
    }

    /// Route the declared default value through the setter binding
    pub(crate) fn apply_default(&self, declaring: &BindType, receiver: &Receiver<'_>) -> Result<()> {
        match self {
            MemberShim::Property(PropertyShim {
                default: Some(default),
                ..
            }) => self.set(declaring, receiver, default.clone()),
            _ => Ok(()),
        }
    }

    fn accessor(&self, declaring: &BindType, kind: MemberKind) -> Result<&MemberDescriptorRc> {
        self.descriptor(kind).ok_or_else(|| Error::MemberAccess {
            member: format!("{}::{}", declaring.fullname(), self.name()),
            access: kind,
        })
    }
}

fn shape_error(descriptor: &MemberDescriptor, binding: &Binding) -> Error {
    Error::ShapeMismatch {
        member: descriptor.to_string(),
        expected: descriptor.kind().shape(),
        found: binding.shape(),
    }
}

fn check_value(descriptor: &MemberDescriptor, expected: ValueFlavor, value: &Value) -> Result<()> {
    if expected.accepts(value) {
        Ok(())
    } else {
        Err(Error::ValueMismatch {
            member: descriptor.to_string(),
            expected,
            found: value.flavor(),
        })
    }
}

fn check_arguments(descriptor: &MemberDescriptor, args: &[Value]) -> Result<()> {
    let params = descriptor.params();
    for (position, param) in params.iter().enumerate() {
        let Some(arg) = args.get(position) else {
            return Err(Error::ValueMismatch {
                member: format!("{descriptor} argument {position}"),
                expected: *param,
                found: ValueFlavor::Void,
            });
        };
        if !param.accepts(arg) {
            return Err(Error::ValueMismatch {
                member: format!("{descriptor} argument {position}"),
                expected: *param,
                found: arg.flavor(),
            });
        }
    }

    if let Some(extra) = args.get(params.len()) {
        return Err(Error::ValueMismatch {
            member: format!("{descriptor} argument {}", params.len()),
            expected: ValueFlavor::Void,
            found: extra.flavor(),
        });
    }

    Ok(())
}

/// A bodyless member together with the type that declared it.
///
/// Returned by [`BindType::member`]. The member lookup happens once, when the handle is created,
/// so repeated calls through a handle only pay for the cache lookup and the binding call.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// # fn example(ty: &BindType, instances: &[InstanceRc]) -> bindscope::Result<()> {
/// let count = ty.member("Count")?;
/// for instance in instances {
///     let current = count.get(instance)?.as_i32().unwrap_or_default();
///     count.set(instance, Value::I32(current + 1))?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemberHandle {
    declaring: BindTypeRc,
    shim: Arc<MemberShim>,
}

impl MemberHandle {
    pub(crate) fn new(declaring: BindTypeRc, shim: Arc<MemberShim>) -> Self {
        MemberHandle { declaring, shim }
    }

    /// The member name
    #[must_use]
    pub fn name(&self) -> &str {
        self.shim.name()
    }

    /// The type that declared the member
    #[must_use]
    pub fn declaring_type(&self) -> &BindTypeRc {
        &self.declaring
    }

    /// The member's shim
    #[must_use]
    pub fn shim(&self) -> &MemberShim {
        &self.shim
    }

    /// Returns `true` for static members
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.shim.is_static()
    }

    /// Read an instance property
    ///
    /// # Errors
    /// [`Error::MemberAccess`] if the member is static or has no getter, plus any resolution or
    /// binding error.
    pub fn get(&self, instance: &Instance) -> Result<Value> {
        let receiver = self.instance_receiver(instance, MemberKind::Get)?;
        self.shim.get(&self.declaring, &receiver)
    }

    /// Write an instance property
    ///
    /// # Errors
    /// [`Error::MemberAccess`] if the member is static or has no setter,
    /// [`Error::ValueMismatch`] for values of the wrong flavor, plus any resolution or binding
    /// error.
    pub fn set(&self, instance: &Instance, value: Value) -> Result<()> {
        let receiver = self.instance_receiver(instance, MemberKind::Set)?;
        self.shim.set(&self.declaring, &receiver, value)
    }

    /// Invoke an instance method
    ///
    /// # Errors
    /// [`Error::MemberAccess`] if the member is static or not a method,
    /// [`Error::ValueMismatch`] for wrong arguments, plus any resolution or binding error.
    pub fn invoke(&self, instance: &Instance, args: &[Value]) -> Result<Value> {
        let receiver = self.instance_receiver(instance, MemberKind::Invoke)?;
        self.shim.invoke(&self.declaring, &receiver, args)
    }

    /// Subscribe to an instance event
    ///
    /// # Errors
    /// [`Error::MemberAccess`] if the member is static or not an event, plus any resolution or
    /// binding error.
    pub fn add_handler(&self, instance: &Instance, handler: &Delegate) -> Result<()> {
        let receiver = self.instance_receiver(instance, MemberKind::EventAdd)?;
        self.shim.add_handler(&self.declaring, &receiver, handler)
    }

    /// Unsubscribe from an instance event
    ///
    /// # Errors
    /// See [`MemberHandle::add_handler`].
    pub fn remove_handler(&self, instance: &Instance, handler: &Delegate) -> Result<()> {
        let receiver = self.instance_receiver(instance, MemberKind::EventRemove)?;
        self.shim.remove_handler(&self.declaring, &receiver, handler)
    }

    /// Read a static property
    ///
    /// # Errors
    /// [`Error::MemberAccess`] if the member is not static or has no getter, plus any error of
    /// the type's static initialization, resolution or binding.
    pub fn get_static(&self) -> Result<Value> {
        let receiver = self.static_receiver(MemberKind::Get)?;
        self.shim.get(&self.declaring, &receiver)
    }

    /// Write a static property
    ///
    /// # Errors
    /// See [`MemberHandle::get_static`], plus [`Error::ValueMismatch`].
    pub fn set_static(&self, value: Value) -> Result<()> {
        let receiver = self.static_receiver(MemberKind::Set)?;
        self.shim.set(&self.declaring, &receiver, value)
    }

    /// Invoke a static method
    ///
    /// # Errors
    /// See [`MemberHandle::get_static`], plus [`Error::ValueMismatch`].
    pub fn invoke_static(&self, args: &[Value]) -> Result<Value> {
        let receiver = self.static_receiver(MemberKind::Invoke)?;
        self.shim.invoke(&self.declaring, &receiver, args)
    }

    /// Subscribe to a static event
    ///
    /// # Errors
    /// See [`MemberHandle::get_static`].
    pub fn add_static_handler(&self, handler: &Delegate) -> Result<()> {
        let receiver = self.static_receiver(MemberKind::EventAdd)?;
        self.shim.add_handler(&self.declaring, &receiver, handler)
    }

    /// Unsubscribe from a static event
    ///
    /// # Errors
    /// See [`MemberHandle::get_static`].
    pub fn remove_static_handler(&self, handler: &Delegate) -> Result<()> {
        let receiver = self.static_receiver(MemberKind::EventRemove)?;
        self.shim.remove_handler(&self.declaring, &receiver, handler)
    }

    fn instance_receiver<'a>(
        &self,
        instance: &'a Instance,
        access: MemberKind,
    ) -> Result<Receiver<'a>> {
        if self.shim.is_static() {
            return Err(self.access_error(access));
        }

        if !instance.bind_type().derives_from(&self.declaring) {
            return Err(Error::MemberNotFound {
                type_name: instance.bind_type().fullname(),
                member: self.name().to_string(),
            });
        }

        Ok(Receiver::Instance(instance))
    }

    fn static_receiver(&self, access: MemberKind) -> Result<Receiver<'_>> {
        if !self.shim.is_static() {
            return Err(self.access_error(access));
        }

        self.declaring.initialize_statics()?;
        Ok(Receiver::Static(&self.declaring))
    }

    fn access_error(&self, access: MemberKind) -> Error {
        Error::MemberAccess {
            member: format!("{}::{}", self.declaring.fullname(), self.name()),
            access,
        }
    }
}

impl fmt::Debug for MemberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberHandle")
            .field("declaring", &self.declaring.fullname())
            .field("member", &self.name())
            .field("static", &self.is_static())
            .finish()
    }
}
