use thiserror::Error;

use crate::{
    binding::BindingShape,
    metadata::{member::MemberKind, typesystem::ValueFlavor},
};

macro_rules! invalid_member {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidMember {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidMember {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The enum is `Clone`: a failed resolution is stored once and the very same error is handed to
/// every current and future caller of the affected member.
///
/// # Error Categories
///
/// ## Resolution Errors
/// - [`Error::UnsupportedMember`] - A single provider declined a member (walk continues)
/// - [`Error::NoProviderFound`] - No ancestor accepted the member (terminal, sticky)
/// - [`Error::ShapeMismatch`] - A provider returned a binding of the wrong shape (terminal)
/// - [`Error::ConcurrentResolutionFailure`] - The once-only primitive faulted (terminal)
/// - [`Error::ReentrantResolution`] - A member's resolution recursively required itself
/// - [`Error::RecursionLimit`] - The ancestor chain exceeded the configured depth
///
/// ## Declaration Errors
/// - [`Error::InvalidMember`] - A member declaration is contradictory (abstract, extern, ...)
/// - [`Error::TypeInsert`] - A type could not be registered
/// - [`Error::TypeNotFound`] - A type lookup failed
/// - [`Error::TypeTableFull`] - The runtime ran out of type tokens
///
/// ## Dispatch Errors
/// - [`Error::MemberNotFound`] - No member with that name exists on the type chain
/// - [`Error::MemberAccess`] - The member exists but does not support the requested access
/// - [`Error::ValueMismatch`] - A value does not match the declared value flavor
/// - [`Error::SlotNotFound`] - A data slot index is out of range for its owner
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::{Error, prelude::*};
///
/// # fn example(instance: &Instance) {
/// match instance.get("Title") {
///     Ok(value) => println!("Title = {}", value),
///     Err(Error::NoProviderFound { member, .. }) => {
///         eprintln!("Nobody implements {}", member);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Resolution errors
    /// A binding provider declined to implement a member.
    ///
    /// Providers return this from any `resolve_*` operation they do not support (wrong kind,
    /// unknown naming convention, ...). It is not terminal: the resolver moves on to the next
    /// ancestor in the chain.
    #[error("Member is not supported by this provider - {0}")]
    UnsupportedMember(String),

    /// No ancestor of the declaring type supplied a binding for the member.
    ///
    /// This is terminal for the member. The cache entry moves to the failed state and this
    /// exact error is returned to every later access without consulting any provider again.
    #[error("No provider found for {member} declared on {declaring}")]
    NoProviderFound {
        /// Display form of the unresolved member
        member: String,
        /// Full name of the declaring type
        declaring: String,
    },

    /// A provider returned a binding whose shape does not match the member kind.
    ///
    /// Treated as a defect in the provider and surfaced at resolution time, before any value
    /// could be miscast at invocation time.
    #[error("Provider returned a {found} binding for {member}, expected {expected}")]
    ShapeMismatch {
        /// Display form of the member being resolved
        member: String,
        /// The shape the member kind requires
        expected: BindingShape,
        /// The shape the provider produced
        found: BindingShape,
    },

    /// The synchronization primitive guarding a resolution faulted.
    ///
    /// Happens when the resolving thread panicked or a lock was poisoned. The pending resolution
    /// is aborted and the entry stays unusable.
    #[error("Concurrent resolution failed - {0}")]
    ConcurrentResolutionFailure(String),

    /// Resolving a member required the resolution of the same member on the same thread.
    #[error("Re-entrant resolution of {0}")]
    ReentrantResolution(String),

    /// Recursion limit reached.
    ///
    /// The ancestor walk is bounded by [`crate::BindingConfig::max_ancestor_depth`]. The
    /// associated value shows the limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    // Declaration errors
    /// A member declaration is invalid and can not produce descriptors.
    ///
    /// The error includes the source location where the problem was detected.
    #[error("Invalid member - {file}:{line}: {message}")]
    InvalidMember {
        /// Description of the declaration problem
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to insert new type into the `TypeRegistry`.
    #[error("Failed to insert new type into TypeRegistry - {0}")]
    TypeInsert(String),

    /// Failed to find type in the `TypeRegistry`.
    #[error("Failed to find type in TypeRegistry - {0}")]
    TypeNotFound(String),

    /// Every row of the 24-bit type table is taken. The associated value is the last valid row.
    #[error("TypeRegistry is full - no type token left after row {0}")]
    TypeTableFull(u32),

    // Dispatch errors
    /// No member with the requested name exists on the type or its ancestors.
    #[error("Type {type_name} has no member named '{member}'")]
    MemberNotFound {
        /// Full name of the type that was searched
        type_name: String,
        /// The requested member name
        member: String,
    },

    /// The member exists, but can not be used the way it was requested.
    ///
    /// Examples are writing a get-only property, invoking a property, or reaching a static
    /// member through an instance.
    #[error("{member} does not support {access}")]
    MemberAccess {
        /// Display form of the member
        member: String,
        /// The access that was attempted
        access: MemberKind,
    },

    /// A value does not match the flavor declared for the member.
    #[error("Value of flavor {found} does not match {expected} for {member}")]
    ValueMismatch {
        /// Display form of the member or slot
        member: String,
        /// The declared flavor
        expected: ValueFlavor,
        /// The flavor of the offending value
        found: ValueFlavor,
    },

    /// A data slot index does not exist in the owner's slot table.
    #[error("Data slot {0} does not exist")]
    SlotNotFound(usize),

    /// Generic error for miscellaneous failures.
    ///
    /// Providers and the behavior they bind use this to report their own failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Create the decline error for a member a provider does not implement.
    ///
    /// ```rust,ignore
    /// fn resolve_invoker(&self, request: &BindingRequest<'_>) -> Result<Binding> {
    ///     Err(Error::unsupported(request.descriptor()))
    /// }
    /// ```
    #[must_use]
    pub fn unsupported(member: impl std::fmt::Display) -> Self {
        Error::UnsupportedMember(member.to_string())
    }

    /// Returns `true` for the non-terminal decline signal of a provider.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedMember(_))
    }
}
