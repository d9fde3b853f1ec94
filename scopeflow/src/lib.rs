//! # Scopeflow
//!
//! Context propagation for reactive pipeline stages.
//!
//! Scopeflow carries an ambient, immutable context from the point where
//! a pipeline stage is assembled to wherever its signals are delivered:
//!
//! - **Immutable contexts**: Derive-on-write key/value contexts shared
//!   cheaply across threads
//! - **Scope management**: Thread-local scopes with guard-based,
//!   unwind-safe restoration
//! - **Snapshots**: Capture a context once, replay it around callbacks
//!   on any thread
//! - **Stage wrapping**: Shape-preserving publisher wrappers that
//!   replay the assembly context around subscription, connection and
//!   every delivered signal
//! - **Assembly hooks**: A process-wide operator lift registry that
//!   applies wrapping to every stage as it is assembled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scopeflow::prelude::*;
//!
//! // Install propagation once at startup
//! let registration = install();
//!
//! // Assemble a stage while a request context is active
//! let key = ContextKey::new("request-id");
//! let context = Context::current().with_value(&key, "r-1".to_string());
//! let guard = context.attach();
//! let stage = on_assembly(build_stage());
//! guard.close();
//!
//! // Signals observe the request context, wherever they are delivered
//! stage.subscribe(subscriber);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod errors;
pub mod lift;
pub mod propagation;
pub mod stream;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{Context, ContextKey, ContextSnapshot, ContextValue, ScopeGuard};
    pub use crate::errors::LiftError;
    pub use crate::lift::{
        on_assembly, register_lift, registered_lift_ids, unregister_lift, LiftRegistration,
        OperatorLift,
    };
    pub use crate::propagation::{
        install, uninstall, wrap_publisher, ScopedPublisher, ScopedSubscriber, CONTEXT_LIFT_ID,
    };
    pub use crate::stream::{
        ConnectablePublisher, Disposable, GroupKey, GroupedPublisher, Item, ManyPublisher,
        ParallelPublisher, Publisher, SinglePublisher, StreamError, Subscriber, Subscription,
    };
}
