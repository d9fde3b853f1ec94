//! Context propagation across pipeline assembly and subscription.
//!
//! Reactive pipelines assemble in one context and run in another: a
//! stage is built while a request scope is active, subscribed later
//! from an event loop and delivers signals from worker threads. This
//! module closes that gap. [`wrap_publisher`] captures the context
//! active at assembly time and wraps a stage so that subscription,
//! connection and every delivered signal observe the captured context,
//! with the caller's own context restored afterwards.
//!
//! [`install`] registers the wrapping step with the operator lift
//! registry so every stage assembled afterwards is covered without
//! touching pipeline code.

mod publisher;
mod subscriber;

pub use publisher::{wrap_publisher, ScopedPublisher};
pub use subscriber::ScopedSubscriber;

use crate::errors::LiftError;
use crate::lift::{register_lift, unregister_lift, LiftRegistration};
use std::sync::Arc;
use tracing::debug;

/// Registry id under which context propagation installs its lift.
pub const CONTEXT_LIFT_ID: &str = "scopeflow.context-propagation";

/// Installs context propagation into the operator lift registry.
///
/// Every publisher assembled after this call is classified and wrapped
/// by [`wrap_publisher`]. Calling `install` again replaces the previous
/// registration in place and invalidates its handle.
#[must_use]
pub fn install() -> LiftRegistration {
    debug!(id = CONTEXT_LIFT_ID, "Installing context propagation lift");
    register_lift(CONTEXT_LIFT_ID, Arc::new(wrap_publisher))
}

/// Removes a previously installed context propagation lift.
///
/// Publishers wrapped while the lift was installed keep propagating
/// their captured contexts; only future assemblies are affected.
pub fn uninstall(registration: LiftRegistration) -> Result<(), LiftError> {
    debug!(id = registration.id(), "Uninstalling context propagation lift");
    unregister_lift(registration)
}
