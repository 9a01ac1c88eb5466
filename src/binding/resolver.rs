//! Ancestor walk producing a binding for one member.
//!
//! The [`BindingResolver`] asks the providers of the declaring type's ancestors, nearest first,
//! for an implementation of a member. The declaring type's own provider is never consulted: a
//! provider implements members for its descendants, not for its own type.
//!
//! # Walk Rules
//!
//! - Ancestors without a provider are skipped
//! - A provider declining with [`Error::UnsupportedMember`] passes the request on to the next
//!   ancestor
//! - Any other provider error ends the walk and becomes the member's outcome
//! - A binding of the wrong shape ends the walk with [`Error::ShapeMismatch`]
//! - Running out of ancestors ends the walk with [`Error::NoProviderFound`]
//! - Visiting more than [`BindingConfig::max_ancestor_depth`] ancestors ends the walk with
//!   [`Error::RecursionLimit`]

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    binding::{Binding, BindingProvider, BindingRequest, BindingShape},
    config::BindingConfig,
    metadata::{member::MemberDescriptor, typesystem::BindType},
    Error, Result,
};

/// Walks the ancestor chain of a declaring type to find a binding for a member
pub(crate) struct BindingResolver {
    config: BindingConfig,
}

impl BindingResolver {
    /// Create a resolver bounded by `config`
    pub(crate) fn new(config: BindingConfig) -> Self {
        BindingResolver { config }
    }

    /// Produce the binding of `descriptor`, declared on `declaring`.
    ///
    /// # Errors
    /// See the [module documentation](self) for the terminal outcomes of a walk.
    pub(crate) fn resolve(
        &self,
        declaring: &BindType,
        descriptor: &MemberDescriptor,
    ) -> Result<Arc<Binding>> {
        let expected = descriptor.kind().shape();
        let slot = declaring.slot_of(descriptor);

        for (depth, ancestor) in declaring.ancestors().enumerate() {
            if depth >= self.config.max_ancestor_depth {
                return Err(Error::RecursionLimit(self.config.max_ancestor_depth));
            }

            let Some(provider) = ancestor.provider() else {
                continue;
            };

            let request = BindingRequest::new(descriptor, declaring, ancestor, slot);
            match Self::ask(provider.as_ref(), expected, &request) {
                Ok(binding) => {
                    if binding.shape() != expected {
                        return Err(Error::ShapeMismatch {
                            member: descriptor.to_string(),
                            expected,
                            found: binding.shape(),
                        });
                    }

                    debug!(
                        member = %descriptor,
                        declaring = %declaring.fullname(),
                        provider = provider.name(),
                        ancestor = %ancestor.fullname(),
                        "resolved binding"
                    );
                    return Ok(Arc::new(binding));
                }
                Err(error) if error.is_unsupported() => {
                    trace!(
                        member = %descriptor,
                        ancestor = %ancestor.fullname(),
                        "provider declined"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        Err(Error::NoProviderFound {
            member: descriptor.to_string(),
            declaring: declaring.fullname(),
        })
    }

    fn ask(
        provider: &dyn BindingProvider,
        shape: BindingShape,
        request: &BindingRequest<'_>,
    ) -> Result<Binding> {
        match shape {
            BindingShape::Getter => provider.resolve_getter(request),
            BindingShape::Setter => provider.resolve_setter(request),
            BindingShape::Invoker => provider.resolve_invoker(request),
            BindingShape::Event => provider.resolve_event(request),
        }
    }
}
