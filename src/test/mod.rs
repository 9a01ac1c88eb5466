//! Binding providers shared by the unit tests.
//!
//! - [`ConstantProvider`] - Answers every getter with a fixed value
//! - [`DecliningProvider`] - Declines everything
//! - [`WrongShapeProvider`] - Answers getters with an invoker
//! - [`CountingProvider`] - Slot-backed storage that counts its resolutions per member kind
//! - [`RecordingProvider`] - Slot-backed storage that records every setter call

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use strum::EnumCount;

use crate::{
    binding::{Binding, BindingProvider, BindingRequest},
    metadata::member::MemberKind,
    runtime::Value,
    Result,
};

/// Answers every getter with the same value
pub struct ConstantProvider {
    value: Value,
}

impl ConstantProvider {
    pub fn new(value: Value) -> Self {
        ConstantProvider { value }
    }
}

impl BindingProvider for ConstantProvider {
    fn resolve_getter(&self, _request: &BindingRequest<'_>) -> Result<Binding> {
        let value = self.value.clone();
        Ok(Binding::getter(move |_| Ok(value.clone())))
    }
}

/// Declines every request
pub struct DecliningProvider;

impl BindingProvider for DecliningProvider {}

/// Produces an invoker when asked for a getter
pub struct WrongShapeProvider;

impl BindingProvider for WrongShapeProvider {
    fn resolve_getter(&self, _request: &BindingRequest<'_>) -> Result<Binding> {
        Ok(Binding::invoker(|_, _| Ok(Value::Void)))
    }
}

/// Slot-backed provider counting how often each member kind was resolved
pub struct CountingProvider {
    calls: [AtomicUsize; MemberKind::COUNT],
    delay: Option<Duration>,
}

impl CountingProvider {
    pub fn new() -> Self {
        CountingProvider {
            calls: Default::default(),
            delay: None,
        }
    }

    /// Takes a while per resolution, to widen race windows
    pub fn slow() -> Self {
        CountingProvider {
            calls: Default::default(),
            delay: Some(Duration::from_millis(25)),
        }
    }

    pub fn calls(&self, kind: MemberKind) -> usize {
        self.calls[kind as usize].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    fn record(&self, request: &BindingRequest<'_>) {
        self.calls[request.descriptor().kind() as usize].fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}

impl BindingProvider for CountingProvider {
    fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.record(request);
        let slot = request.slot().ok_or_else(|| request.unsupported())?;
        Ok(Binding::getter(move |receiver| Ok(receiver.slot(slot)?.get())))
    }

    fn resolve_setter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.record(request);
        let slot = request.slot().ok_or_else(|| request.unsupported())?;
        Ok(Binding::setter(move |receiver, value| {
            receiver.slot(slot)?.set(value).map(|_| ())
        }))
    }

    fn resolve_invoker(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.record(request);
        let returns = request.descriptor().returns();
        Ok(Binding::invoker(move |_, _| Ok(returns.default_value())))
    }

    fn resolve_event(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        self.record(request);
        Ok(Binding::event(|_, _| Ok(()), |_, _| Ok(())))
    }
}

/// Slot-backed provider recording `(member, value)` for every setter call
#[derive(Default)]
pub struct RecordingProvider {
    writes: Arc<Mutex<Vec<(String, Value)>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().unwrap().clone()
    }
}

impl BindingProvider for RecordingProvider {
    fn resolve_getter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        let slot = request.slot().ok_or_else(|| request.unsupported())?;
        Ok(Binding::getter(move |receiver| Ok(receiver.slot(slot)?.get())))
    }

    fn resolve_setter(&self, request: &BindingRequest<'_>) -> Result<Binding> {
        let slot = request.slot().ok_or_else(|| request.unsupported())?;
        let name = request.descriptor().name().to_string();
        let writes = Arc::clone(&self.writes);
        Ok(Binding::setter(move |receiver, value| {
            writes.lock().unwrap().push((name.clone(), value.clone()));
            receiver.slot(slot)?.set(value).map(|_| ())
        }))
    }
}
