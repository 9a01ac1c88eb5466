//! # bindscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the bindscope library. Import this module to get quick access to everything needed to
//! declare types with bodyless members, write binding providers and dispatch through them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all bindscope operations
pub use crate::Error;

/// The result type used throughout bindscope
pub use crate::Result;

/// Configuration of a binding runtime
pub use crate::BindingConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Owner of types, instances and resolved bindings
pub use crate::runtime::BindingRuntime;

/// Fluent definition of new types
pub use crate::metadata::typesystem::TypeBuilder;

// ================================================================================================
// Declarations and Types
// ================================================================================================

/// Bodyless member declarations
pub use crate::metadata::member::{DeclShape, MemberDecl};

/// Member descriptors and their parts
pub use crate::metadata::member::{
    MemberDescriptor, MemberDescriptorRc, MemberFlags, MemberKind, MemberSignature,
};

/// Types and their registry
pub use crate::metadata::typesystem::{BindType, BindTypeRc, TypeRegistry, ValueFlavor};

/// Tokens identifying types
pub use crate::metadata::token::Token;

// ================================================================================================
// Bindings and Providers
// ================================================================================================

/// Binding variants and closures
pub use crate::binding::{Binding, BindingShape, EventBinding};

/// The provider protocol
pub use crate::binding::{BindingProvider, BindingRequest};

/// The once-only cache and its introspection
pub use crate::binding::{BindingCache, CacheStatistics, EntryState};

// ================================================================================================
// Runtime
// ================================================================================================

/// Instances and binding receivers
pub use crate::runtime::{Instance, InstanceRc, Receiver};

/// Runtime values
pub use crate::runtime::{Delegate, Value};

/// Data slots
pub use crate::runtime::{Slot, SlotIndex, SlotTable};

/// Reusable member accessors
pub use crate::runtime::MemberHandle;
