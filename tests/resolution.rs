//! Integration tests for the provider walk along the ancestor chain.

use bindscope::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Answers every getter with a fixed value and records who asked
struct Fixed {
    value: i32,
    asked: AtomicUsize,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl Fixed {
    fn new(value: i32) -> Arc<Self> {
        Arc::new(Fixed {
            value,
            asked: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl BindingProvider for Fixed {
    fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            request.descriptor().name().to_string(),
            request.declaring_type().name().to_string(),
            request.provider_owner().name().to_string(),
        ));
        let value = self.value;
        Ok(Binding::getter(move |_| Ok(Value::I32(value))))
    }
}

/// Declines everything, counting the requests
#[derive(Default)]
struct Decline {
    asked: AtomicUsize,
}

impl BindingProvider for Decline {
    fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Err(request.unsupported())
    }
}

/// Fails with a provider-defined error
struct Broken;

impl BindingProvider for Broken {
    fn resolve_getter(&self, _request: &BindingRequest<'_>) -> Result<Binding> {
        Err(Error::Error("backing store unavailable".to_string()))
    }
}

/// Answers getters with an invoker
struct Confused;

impl BindingProvider for Confused {
    fn resolve_getter(&self, _request: &BindingRequest<'_>) -> Result<Binding> {
        Ok(Binding::invoker(|_, _| Ok(Value::I32(0))))
    }
}

/// Asks for the binding it is currently resolving
#[derive(Default)]
struct Recursive {
    asked: AtomicUsize,
}

impl BindingProvider for Recursive {
    fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        let inner = request.declaring_type().binding(request.descriptor())?;
        Ok((*inner).clone())
    }

    fn resolve_event(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        // The remove accessor shares the entry being resolved
        let remove = request
            .declaring_type()
            .descriptor(request.descriptor().name(), MemberKind::EventRemove)
            .ok_or_else(|| request.unsupported())?;
        let inner = request.declaring_type().binding(&remove)?;
        Ok((*inner).clone())
    }
}

fn value_property() -> MemberDecl {
    MemberDecl::property("Value", ValueFlavor::I4).read_only()
}

#[test]
fn test_immediate_base_wins() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let grandparent_provider = Fixed::new(1);
    let parent_provider = Fixed::new(2);

    let grandparent = TypeBuilder::new("Walk", "Grandparent")
        .provider(grandparent_provider.clone())
        .define(&runtime)?;
    let parent = TypeBuilder::new("Walk", "Parent")
        .extends(&grandparent)
        .provider(parent_provider.clone())
        .define(&runtime)?;
    let child = TypeBuilder::new("Walk", "Child")
        .extends(&parent)
        .member(value_property())
        .define(&runtime)?;

    let c = runtime.instantiate(&child)?;
    assert_eq!(c.get("Value")?, Value::I32(2));
    assert_eq!(parent_provider.asked(), 1);
    assert_eq!(grandparent_provider.asked(), 0);

    // The request names the declaring type and the ancestor being asked
    assert_eq!(
        parent_provider.requests.lock().unwrap().as_slice(),
        &[(
            "Value".to_string(),
            "Child".to_string(),
            "Parent".to_string()
        )]
    );

    Ok(())
}

#[test]
fn test_declining_and_providerless_ancestors_are_skipped() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let root_provider = Fixed::new(7);
    let decline = Arc::new(Decline::default());

    let root = TypeBuilder::new("Walk", "Root")
        .provider(root_provider.clone())
        .define(&runtime)?;
    let declining = TypeBuilder::new("Walk", "Declining")
        .extends(&root)
        .provider(decline.clone())
        .define(&runtime)?;
    let plain = TypeBuilder::new("Walk", "Plain")
        .extends(&declining)
        .define(&runtime)?;
    let leaf = TypeBuilder::new("Walk", "Leaf")
        .extends(&plain)
        .member(value_property())
        .define(&runtime)?;

    let l = runtime.instantiate(&leaf)?;
    assert_eq!(l.get("Value")?, Value::I32(7));
    assert_eq!(decline.asked.load(Ordering::SeqCst), 1);
    assert_eq!(root_provider.asked(), 1);

    Ok(())
}

#[test]
fn test_own_provider_not_consulted() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let own = Fixed::new(3);
    let lonely = TypeBuilder::new("Walk", "Lonely")
        .provider(own.clone())
        .member(value_property())
        .define(&runtime)?;

    let l = runtime.instantiate(&lonely)?;
    assert!(matches!(
        l.get("Value"),
        Err(Error::NoProviderFound { .. })
    ));
    assert_eq!(own.asked(), 0);

    // Its provider does serve derived types
    let derived = TypeBuilder::new("Walk", "Derived")
        .extends(&lonely)
        .member(MemberDecl::property("Other", ValueFlavor::I4).read_only())
        .define(&runtime)?;
    let d = runtime.instantiate(&derived)?;
    assert_eq!(d.get("Other")?, Value::I32(3));

    Ok(())
}

#[test]
fn test_no_provider_found() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let decline = Arc::new(Decline::default());
    let base = TypeBuilder::new("Walk", "Base")
        .provider(decline.clone())
        .define(&runtime)?;
    let derived = TypeBuilder::new("Walk", "Derived")
        .extends(&base)
        .member(value_property())
        .define(&runtime)?;

    let d = runtime.instantiate(&derived)?;
    let first = d.get("Value").unwrap_err();
    match &first {
        Error::NoProviderFound { member, declaring } => {
            assert!(member.contains("Value"));
            assert_eq!(declaring, "Walk.Derived");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(d.get("Value").unwrap_err(), first);
    assert_eq!(decline.asked.load(Ordering::SeqCst), 1);

    Ok(())
}

#[test]
fn test_provider_error_ends_walk() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let root_provider = Fixed::new(1);
    let root = TypeBuilder::new("Walk", "Root")
        .provider(root_provider.clone())
        .define(&runtime)?;
    let broken = TypeBuilder::new("Walk", "Broken")
        .extends(&root)
        .provider(Arc::new(Broken))
        .define(&runtime)?;
    let leaf = TypeBuilder::new("Walk", "Leaf")
        .extends(&broken)
        .member(value_property())
        .define(&runtime)?;

    let l = runtime.instantiate(&leaf)?;
    assert_eq!(
        l.get("Value").unwrap_err(),
        Error::Error("backing store unavailable".to_string())
    );
    assert_eq!(root_provider.asked(), 0);

    Ok(())
}

#[test]
fn test_shape_mismatch_at_resolution() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let base = TypeBuilder::new("Walk", "Base")
        .provider(Arc::new(Confused))
        .define(&runtime)?;
    let derived = TypeBuilder::new("Walk", "Derived")
        .extends(&base)
        .member(value_property())
        .define(&runtime)?;

    // Resolving directly, without dispatching, already reports the mismatch
    let descriptor = derived.descriptor("Value", MemberKind::Get).unwrap();
    let error = derived.binding(&descriptor).unwrap_err();
    assert!(matches!(
        error,
        Error::ShapeMismatch {
            expected: BindingShape::Getter,
            found: BindingShape::Invoker,
            ..
        }
    ));
    assert_eq!(derived.binding_state(&descriptor), EntryState::Failed);

    let d = runtime.instantiate(&derived)?;
    assert_eq!(d.get("Value").unwrap_err(), error);

    Ok(())
}

#[test]
fn test_ancestor_depth_limit() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default().with_max_ancestor_depth(2));
    let root_provider = Fixed::new(1);
    let mut ty = TypeBuilder::new("Walk", "Level0")
        .provider(root_provider.clone())
        .define(&runtime)?;
    for level in 1..4 {
        ty = TypeBuilder::new("Walk", format!("Level{level}"))
            .extends(&ty)
            .define(&runtime)?;
    }
    let deep = TypeBuilder::new("Walk", "Deep")
        .extends(&ty)
        .member(value_property())
        .define(&runtime)?;

    let d = runtime.instantiate(&deep)?;
    assert_eq!(d.get("Value").unwrap_err(), Error::RecursionLimit(2));
    assert_eq!(root_provider.asked(), 0);

    Ok(())
}

#[test]
fn test_eager_runtime_resolves_at_definition() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::eager());
    let provider = Fixed::new(5);
    let base = TypeBuilder::new("Walk", "Base")
        .provider(provider.clone())
        .define(&runtime)?;
    let derived = TypeBuilder::new("Walk", "Derived")
        .extends(&base)
        .member(value_property())
        .define(&runtime)?;

    assert_eq!(provider.asked(), 1);
    let descriptor = derived.descriptor("Value", MemberKind::Get).unwrap();
    assert_eq!(derived.binding_state(&descriptor), EntryState::Resolved);

    let d = runtime.instantiate(&derived)?;
    assert_eq!(d.get("Value")?, Value::I32(5));
    assert_eq!(provider.asked(), 1);

    Ok(())
}

#[test]
fn test_structurally_identical_members_bind_separately() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let provider = Fixed::new(9);
    let base = TypeBuilder::new("Walk", "Base")
        .provider(provider.clone())
        .define(&runtime)?;
    let left = TypeBuilder::new("Walk", "Left")
        .extends(&base)
        .member(value_property())
        .define(&runtime)?;
    let right = TypeBuilder::new("Walk", "Right")
        .extends(&base)
        .member(value_property())
        .define(&runtime)?;

    let left_descriptor = left.descriptor("Value", MemberKind::Get).unwrap();
    let right_descriptor = right.descriptor("Value", MemberKind::Get).unwrap();
    assert_ne!(left_descriptor, right_descriptor);

    let l = left.binding(&left_descriptor)?;
    let r = right.binding(&right_descriptor)?;
    assert!(!Arc::ptr_eq(&l, &r));
    assert_eq!(provider.asked(), 2);

    // A descriptor is only valid on the type that declared it
    assert!(matches!(
        left.binding(&right_descriptor),
        Err(Error::MemberNotFound { .. })
    ));

    Ok(())
}

#[test]
fn test_reentrant_resolution_fails_the_member() -> Result<()> {
    let runtime = BindingRuntime::new(BindingConfig::default());
    let provider = Arc::new(Recursive::default());
    let base = TypeBuilder::new("Walk", "Base")
        .provider(provider.clone())
        .define(&runtime)?;
    let derived = TypeBuilder::new("Walk", "Derived")
        .extends(&base)
        .member(value_property())
        .member(MemberDecl::event("Changed"))
        .define(&runtime)?;

    let d = runtime.instantiate(&derived)?;
    let error = d.get("Value").unwrap_err();
    assert!(matches!(error, Error::ReentrantResolution(_)));

    let getter = derived.descriptor("Value", MemberKind::Get).unwrap();
    assert_eq!(derived.binding_state(&getter), EntryState::Failed);
    assert_eq!(d.get("Value").unwrap_err(), error);
    assert_eq!(provider.asked.load(Ordering::SeqCst), 1);

    let add = derived.descriptor("Changed", MemberKind::EventAdd).unwrap();
    assert!(matches!(
        derived.binding(&add),
        Err(Error::ReentrantResolution(_))
    ));
    assert_eq!(derived.binding_state(&add), EntryState::Failed);
    assert_eq!(provider.asked.load(Ordering::SeqCst), 2);

    Ok(())
}
