//! Utility functionality shared across the crate.
//!
//! - [`synchronization`] - The once-only [`synchronization::ResolutionCell`] behind the binding
//!   cache and static initialization

pub mod synchronization;
