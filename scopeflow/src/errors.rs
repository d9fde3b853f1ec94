//! Error types for the scopeflow layer.
//!
//! The propagation layer itself is deliberately quiet: errors raised by
//! wrapped stages and consumers pass through untouched, and the only
//! fallible operations of this crate are the ones that mutate the global
//! operator-lift registry.

use thiserror::Error;

/// Errors from the operator-lift registry.
#[derive(Debug, Error)]
pub enum LiftError {
    /// No lift is registered under the handle's id.
    #[error("no operator lift registered under id '{id}'")]
    NotRegistered {
        /// The registry id the handle referred to.
        id: String,
    },

    /// The handle's id was re-registered after the handle was issued, so
    /// the handle no longer refers to the live registration.
    #[error("operator lift registration '{id}' is stale; the id was re-registered")]
    StaleRegistration {
        /// The registry id the handle referred to.
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LiftError::NotRegistered {
            id: "demo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no operator lift registered under id 'demo'"
        );

        let err = LiftError::StaleRegistration {
            id: "demo".to_string(),
        };
        assert!(err.to_string().contains("stale"));
    }
}
