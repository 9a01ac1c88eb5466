//! Data slots backing bodyless properties.
//!
//! Every bodyless property gets one typed storage cell per owner: per instance for instance
//! properties, per type for static ones. Providers that want plain storage semantics read and
//! write these cells through [`crate::runtime::Receiver::slot`] with the index they were handed in
//! the [`crate::binding::BindingRequest`].
//!
//! # Layout
//!
//! Slot indices are fixed when the declaring type is defined. The instance layout of a derived
//! type starts with the complete instance layout of its base, so an index allocated by a base
//! type is valid on every instance of every subtype.
//!
//! ```text
//! Base     [ 0: Name ]
//! Derived  [ 0: Name | 1: Count | 2: Title ]
//! ```

use std::{fmt, sync::Arc, sync::RwLock};

use crate::{
    metadata::{member::MemberDescriptor, typesystem::ValueFlavor},
    runtime::Value,
    Error, Result,
};

/// Index of a data slot within its owner's [`SlotTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(usize);

impl SlotIndex {
    /// The raw position in the slot table
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct SlotEntry {
    name: Arc<str>,
    flavor: ValueFlavor,
}

/// The shape of a slot table, shared by all owners of one type.
#[derive(Debug, Clone, Default)]
pub struct SlotLayout {
    entries: Vec<SlotEntry>,
}

impl SlotLayout {
    /// Create an empty layout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layout starting with all slots of `base`
    #[must_use]
    pub fn extending(base: &SlotLayout) -> Self {
        base.clone()
    }

    /// Reserve a slot for a property.
    ///
    /// ## Arguments
    /// * 'descriptor' - Any accessor of the property the slot belongs to
    /// * 'flavor' - The property type, enforced on every write
    pub fn allocate(&mut self, descriptor: &MemberDescriptor, flavor: ValueFlavor) -> SlotIndex {
        self.entries.push(SlotEntry {
            name: Arc::from(descriptor.name()),
            flavor,
        });
        SlotIndex(self.entries.len() - 1)
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the layout has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
struct SlotState {
    current: Value,
    previous: Option<Value>,
    version: u64,
}

/// A typed storage cell owned by exactly one (owner, property) pair.
pub struct Slot {
    name: Arc<str>,
    flavor: ValueFlavor,
    retain_previous: bool,
    state: RwLock<SlotState>,
}

impl Slot {
    fn new(entry: &SlotEntry, retain_previous: bool) -> Self {
        Slot {
            name: entry.name.clone(),
            flavor: entry.flavor,
            retain_previous,
            state: RwLock::new(SlotState {
                current: entry.flavor.default_value(),
                previous: None,
                version: 0,
            }),
        }
    }

    /// Name of the property the slot belongs to
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type of the slot
    #[must_use]
    pub fn flavor(&self) -> ValueFlavor {
        self.flavor
    }

    /// The current value
    #[must_use]
    pub fn get(&self) -> Value {
        read_lock!(self.state).current.clone()
    }

    /// Replace the current value, returning the value it replaced.
    ///
    /// # Errors
    /// Returns [`Error::ValueMismatch`] if `value` does not fit the slot's flavor.
    pub fn set(&self, value: Value) -> Result<Value> {
        if !self.flavor.accepts(&value) {
            return Err(Error::ValueMismatch {
                member: self.name.to_string(),
                expected: self.flavor,
                found: value.flavor(),
            });
        }

        let mut state = write_lock!(self.state);
        let replaced = std::mem::replace(&mut state.current, value);
        state.version += 1;
        if self.retain_previous {
            state.previous = Some(replaced.clone());
        }
        Ok(replaced)
    }

    /// The value before the last write.
    ///
    /// Always `None` unless the runtime retains previous values, see
    /// [`crate::BindingConfig::retain_previous_values`].
    #[must_use]
    pub fn previous(&self) -> Option<Value> {
        read_lock!(self.state).previous.clone()
    }

    /// Number of writes since the slot was created
    #[must_use]
    pub fn version(&self) -> u64 {
        read_lock!(self.state).version
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("flavor", &self.flavor)
            .field("value", &self.get())
            .finish()
    }
}

/// The materialised slots of one owner.
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    /// Create the cells of `layout`, each holding its flavor's default value
    ///
    /// ## Arguments
    /// * 'layout' - The layout to materialise
    /// * 'retain_previous' - Remember the value before the last write of each slot
    #[must_use]
    pub fn new(layout: &SlotLayout, retain_previous: bool) -> Self {
        SlotTable {
            slots: layout
                .entries
                .iter()
                .map(|entry| Slot::new(entry, retain_previous))
                .collect(),
        }
    }

    /// The slot at `index`
    ///
    /// # Errors
    /// Returns [`Error::SlotNotFound`] if the index is not part of this table.
    pub fn get(&self, index: SlotIndex) -> Result<&Slot> {
        self.slots
            .get(index.0)
            .ok_or(Error::SlotNotFound(index.0))
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the owner has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over all slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }
}
