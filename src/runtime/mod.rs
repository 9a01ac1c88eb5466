//! Runtime side of bodyless members.
//!
//! This module holds everything that exists after types are defined: the [`BindingRuntime`]
//! owning the type registry and the binding cache, instances and their data slots, the values
//! flowing through bindings, and the dispatch shims connecting call sites to bindings.
//!
//! # Key Components
//!
//! - [`BindingRuntime`] - Owner of types, cache and configuration
//! - [`Instance`] / [`Receiver`] - Objects and the targets bindings operate on
//! - [`Value`] / [`Delegate`] - Runtime values and event handlers
//! - [`SlotLayout`] / [`SlotTable`] / [`Slot`] - Per-owner storage of bodyless properties
//! - [`MemberShim`] / [`MemberHandle`] - Dispatch from call sites to resolved bindings
//!
//! # Examples
//!
//! ```rust,no_run
//! use bindscope::prelude::*;
//! use std::sync::Arc;
//!
//! # fn example(provider: Arc<dyn BindingProvider>) -> bindscope::Result<()> {
//! let runtime = BindingRuntime::new(BindingConfig::default());
//! let base = TypeBuilder::new("App", "Model").provider(provider).define(&runtime)?;
//! let document = TypeBuilder::new("App", "Document")
//!     .extends(&base)
//!     .member(MemberDecl::property("Title", ValueFlavor::String))
//!     .define(&runtime)?;
//!
//! let doc = runtime.instantiate(&document)?;
//! doc.set("Title", "Quarterly Report")?;
//! println!("{}", doc.get("Title")?);
//! # Ok(())
//! # }
//! ```

mod instance;
mod shim;
mod slots;
mod value;

use std::sync::{Arc, OnceLock};

use tracing::debug;

pub use instance::{Instance, InstanceRc, Receiver};
pub use shim::{EventShim, MemberHandle, MemberShim, MethodShim, PropertyShim};
pub use slots::{Slot, SlotIndex, SlotLayout, SlotTable};
pub use value::{Delegate, Value};

use crate::{
    binding::BindingCache,
    config::BindingConfig,
    metadata::typesystem::{BindType, BindTypeRc, TypeRegistry},
    Result,
};

static GLOBAL: OnceLock<BindingRuntime> = OnceLock::new();

/// Owner of a set of bind types and of the bindings resolved for them.
///
/// Types, their instances and their bindings belong to exactly one runtime. Two runtimes never
/// share cache entries, even for types with identical names.
pub struct BindingRuntime {
    registry: TypeRegistry,
    cache: Arc<BindingCache>,
    config: BindingConfig,
}

impl BindingRuntime {
    /// Create an empty runtime
    #[must_use]
    pub fn new(config: BindingConfig) -> Self {
        BindingRuntime {
            registry: TypeRegistry::new(),
            cache: Arc::new(BindingCache::new(config)),
            config,
        }
    }

    /// The process-wide runtime, created with the default configuration on first use
    pub fn global() -> &'static BindingRuntime {
        GLOBAL.get_or_init(|| BindingRuntime::new(BindingConfig::default()))
    }

    /// The configuration the runtime was created with
    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// All types defined in this runtime
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The binding cache shared by all types of this runtime
    #[must_use]
    pub fn cache(&self) -> &Arc<BindingCache> {
        &self.cache
    }

    /// Create an instance of `ty`.
    ///
    /// Data slots are allocated first. Then every declared default value is routed through its
    /// property's setter binding, ancestors first, each exactly once.
    ///
    /// # Errors
    /// Returns the resolution or binding error of a default value's setter.
    pub fn instantiate(&self, ty: &BindTypeRc) -> Result<InstanceRc> {
        let instance = Instance::new(Arc::clone(ty), self.config.retain_previous_values);

        let mut chain: Vec<&BindType> = ty.ancestors().map(|ancestor| &**ancestor).collect();
        chain.reverse();
        chain.push(ty);

        let receiver = Receiver::Instance(&instance);
        for declaring in chain {
            for shim in declaring.members().iter().filter(|shim| !shim.is_static()) {
                shim.apply_default(declaring, &receiver)?;
            }
        }

        debug!(
            instance = instance.id(),
            declaring = %ty.fullname(),
            "instantiated"
        );
        Ok(instance)
    }

    /// Resolve every bodyless member of `ty` now instead of on first access.
    ///
    /// See [`BindingCache::warm`].
    pub fn warm(&self, ty: &BindType) {
        self.cache.warm(ty);
    }
}

impl Default for BindingRuntime {
    fn default() -> Self {
        Self::new(BindingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            member::MemberDecl,
            typesystem::{TypeBuilder, ValueFlavor},
        },
        test::{CountingProvider, RecordingProvider},
        Error,
    };

    #[test]
    fn test_instantiate_routes_defaults_through_setter() {
        let runtime = BindingRuntime::default();
        let provider = Arc::new(RecordingProvider::new());
        let model = TypeBuilder::new("App", "Model")
            .provider(provider.clone())
            .define(&runtime)
            .unwrap();
        let document = TypeBuilder::new("App", "Document")
            .extends(&model)
            .member(
                MemberDecl::property("Title", ValueFlavor::String)
                    .with_default(Value::from("Default Title")),
            )
            .member(MemberDecl::property("Pages", ValueFlavor::I4))
            .define(&runtime)
            .unwrap();

        let doc = runtime.instantiate(&document).unwrap();

        assert_eq!(
            provider.writes(),
            vec![("Title".to_string(), Value::from("Default Title"))]
        );
        assert_eq!(doc.get("Title").unwrap(), Value::from("Default Title"));
        assert_eq!(doc.get("Pages").unwrap(), Value::I32(0));
    }

    #[test]
    fn test_instantiate_applies_ancestor_defaults_first() {
        let runtime = BindingRuntime::default();
        let provider = Arc::new(RecordingProvider::new());
        let model = TypeBuilder::new("App", "Model")
            .provider(provider.clone())
            .define(&runtime)
            .unwrap();
        let base = TypeBuilder::new("App", "Base")
            .extends(&model)
            .member(MemberDecl::property("Kind", ValueFlavor::I4).with_default(Value::I32(1)))
            .define(&runtime)
            .unwrap();
        let derived = TypeBuilder::new("App", "Derived")
            .extends(&base)
            .member(MemberDecl::property("Level", ValueFlavor::I4).with_default(Value::I32(2)))
            .define(&runtime)
            .unwrap();

        runtime.instantiate(&derived).unwrap();

        assert_eq!(
            provider.writes(),
            vec![
                ("Kind".to_string(), Value::I32(1)),
                ("Level".to_string(), Value::I32(2)),
            ]
        );
    }

    #[test]
    fn test_instantiate_fails_without_provider() {
        let runtime = BindingRuntime::default();
        let orphan = TypeBuilder::new("App", "Orphan")
            .member(
                MemberDecl::property("Name", ValueFlavor::String).with_default(Value::from("x")),
            )
            .define(&runtime)
            .unwrap();

        let result = runtime.instantiate(&orphan);
        assert!(matches!(result, Err(Error::NoProviderFound { .. })));
    }

    #[test]
    fn test_runtimes_do_not_share_bindings() {
        let first = BindingRuntime::default();
        let second = BindingRuntime::default();
        let provider = Arc::new(CountingProvider::new());

        for runtime in [&first, &second] {
            let model = TypeBuilder::new("App", "Model")
                .provider(provider.clone())
                .define(runtime)
                .unwrap();
            let counter = TypeBuilder::new("App", "Counter")
                .extends(&model)
                .member(MemberDecl::property("Count", ValueFlavor::I4))
                .define(runtime)
                .unwrap();
            let c = runtime.instantiate(&counter).unwrap();
            c.get("Count").unwrap();
        }

        assert_eq!(provider.total_calls(), 2);
        assert_eq!(first.cache().len(), 1);
        assert_eq!(second.cache().len(), 1);
    }

    #[test]
    fn test_warm_resolves_everything() {
        let runtime = BindingRuntime::default();
        let provider = Arc::new(CountingProvider::new());
        let model = TypeBuilder::new("App", "Model")
            .provider(provider.clone())
            .define(&runtime)
            .unwrap();
        let widget = TypeBuilder::new("App", "Widget")
            .extends(&model)
            .member(MemberDecl::property("Width", ValueFlavor::I4))
            .member(MemberDecl::method("Draw", vec![], ValueFlavor::Void))
            .member(MemberDecl::event("Resized"))
            .define(&runtime)
            .unwrap();

        runtime.warm(&widget);

        assert_eq!(provider.total_calls(), 4);
        let w = runtime.instantiate(&widget).unwrap();
        w.set("Width", 3).unwrap();
        assert_eq!(w.invoke("Draw", &[]).unwrap(), Value::Void);
        assert_eq!(provider.total_calls(), 4);
    }

    #[test]
    fn test_global_runtime_is_shared() {
        assert!(std::ptr::eq(BindingRuntime::global(), BindingRuntime::global()));
    }
}
