//! Runtime configuration for binding resolution and dispatch
//!
//! This module provides the knobs of a [`crate::runtime::BindingRuntime`]: how far the resolver
//! may walk up an inheritance chain, when bindings are resolved, and how much checking the
//! dispatch shims do before they call into a binding.

/// Configuration of a binding runtime
///
/// The defaults resolve lazily on first access, validate every value crossing a shim, and keep
/// no history in data slots.
///
/// # Examples
///
/// ```rust,no_run
/// use bindscope::prelude::*;
///
/// let config = BindingConfig::eager().with_max_ancestor_depth(16);
/// let runtime = BindingRuntime::new(config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct BindingConfig {
    /// Maximum number of ancestors the resolver visits for one member (default: 64)
    pub max_ancestor_depth: usize,

    /// Resolve every bodyless member of a type as soon as it is defined.
    /// Resolution failures are then logged at definition time and surfaced again on first access.
    pub eager_resolution: bool,

    /// Keep the value a data slot held before its last write (for change-tracking providers)
    pub retain_previous_values: bool,

    /// Check argument counts and value flavors in the dispatch shims
    pub validate_values: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 64,
            eager_resolution: false,
            retain_previous_values: false,
            validate_values: true,
        }
    }
}

impl BindingConfig {
    /// Creates the default configuration, resolving each member on its first access
    #[must_use]
    pub fn lazy() -> Self {
        Self::default()
    }

    /// Creates a configuration resolving all members when their type is defined
    ///
    /// Moves the resolution cost out of the first access, at the price of resolving members that
    /// may never be used.
    #[must_use]
    pub fn eager() -> Self {
        Self {
            eager_resolution: true,
            ..Self::default()
        }
    }

    /// Creates a configuration for providers that observe value changes
    ///
    /// Data slots remember their previous value, see [`crate::runtime::Slot::previous`].
    #[must_use]
    pub fn change_tracking() -> Self {
        Self {
            retain_previous_values: true,
            ..Self::default()
        }
    }

    /// Creates a configuration with the least overhead per call
    ///
    /// **Warning**: Without value validation a binding may receive values of the wrong flavor,
    /// it has to cope with that itself.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            max_ancestor_depth: 64,
            eager_resolution: false,
            retain_previous_values: false,
            validate_values: false,
        }
    }

    /// Set the maximum ancestor depth
    #[must_use]
    pub fn with_max_ancestor_depth(mut self, depth: usize) -> Self {
        self.max_ancestor_depth = depth;
        self
    }

    /// Enable or disable eager resolution
    #[must_use]
    pub fn with_eager_resolution(mut self, eager: bool) -> Self {
        self.eager_resolution = eager;
        self
    }

    /// Enable or disable previous value retention in data slots
    #[must_use]
    pub fn with_retain_previous_values(mut self, retain: bool) -> Self {
        self.retain_previous_values = retain;
        self
    }

    /// Enable or disable value validation in the dispatch shims
    #[must_use]
    pub fn with_validate_values(mut self, validate: bool) -> Self {
        self.validate_values = validate;
        self
    }
}
