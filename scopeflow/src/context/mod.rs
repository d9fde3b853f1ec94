//! Context management for reactive pipeline stages.
//!
//! This module provides:
//! - Immutable contexts holding ambient values under identity-based keys
//! - A per-thread current-context stack with RAII scope guards
//! - Snapshots that capture a context once and replay it anywhere

mod current;
mod key;
mod snapshot;

pub use current::{Context, ContextValue, ScopeGuard};
pub use key::ContextKey;
pub use snapshot::ContextSnapshot;
