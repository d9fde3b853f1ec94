//! The global operator-lift registry.
//!
//! An operator lift is a transform applied to every newly assembled
//! pipeline stage across the process. The pipeline runtime calls
//! [`on_assembly`] once per new stage; every registered lift is folded
//! over the stage in registration order.
//!
//! The registry is process-wide state with an explicit lifecycle:
//! [`register_lift`] returns a handle and [`unregister_lift`] takes it
//! back. Callers are responsible for pairing the two, typically once at
//! process start and once at shutdown. There is no reference counting;
//! re-registering an id replaces the lift in place and invalidates the
//! handles issued before.

use crate::errors::LiftError;
use crate::stream::Publisher;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A transform applied to each newly assembled stage publisher.
pub type OperatorLift = Arc<dyn Fn(Arc<dyn Publisher>) -> Arc<dyn Publisher> + Send + Sync>;

/// One registered lift, keyed by id and guarded by a handle token.
struct LiftEntry {
    id: String,
    token: Uuid,
    lift: OperatorLift,
}

/// Registered lifts in registration order. Mutated at process start and
/// shutdown only; the assembly hot path takes the read side.
static LIFT_REGISTRY: RwLock<Vec<LiftEntry>> = RwLock::new(Vec::new());

/// Serializes tests that touch the process-wide registry.
#[cfg(test)]
pub(crate) static REGISTRY_TEST_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

/// A handle for one registration, passed back at teardown.
///
/// The handle names the registration it was issued for; if the same id
/// is registered again later, handles issued earlier become stale and
/// can no longer unregister the id.
#[derive(Debug, Clone)]
pub struct LiftRegistration {
    id: String,
    token: Uuid,
}

impl LiftRegistration {
    /// Returns the registry id this handle refers to.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Installs `lift` as a process-wide transform under the given id.
///
/// Registering an id that is already present replaces the lift in place,
/// keeping its position in the application order and invalidating every
/// handle issued for the previous registration.
pub fn register_lift(id: impl Into<String>, lift: OperatorLift) -> LiftRegistration {
    let id = id.into();
    let token = Uuid::new_v4();
    let mut registry = LIFT_REGISTRY.write();
    if let Some(entry) = registry.iter_mut().find(|entry| entry.id == id) {
        debug!(id = %id, "Replacing operator lift");
        entry.token = token;
        entry.lift = lift;
    } else {
        debug!(id = %id, "Registering operator lift");
        registry.push(LiftEntry {
            id: id.clone(),
            token,
            lift,
        });
    }
    LiftRegistration { id, token }
}

/// Removes the registration the handle was issued for.
///
/// # Errors
///
/// Returns [`LiftError::NotRegistered`] if no lift is registered under
/// the handle's id, and [`LiftError::StaleRegistration`] if the id was
/// re-registered after this handle was issued.
pub fn unregister_lift(registration: LiftRegistration) -> Result<(), LiftError> {
    let mut registry = LIFT_REGISTRY.write();
    match registry.iter().position(|entry| entry.id == registration.id) {
        None => Err(LiftError::NotRegistered {
            id: registration.id,
        }),
        Some(position) if registry[position].token != registration.token => {
            Err(LiftError::StaleRegistration {
                id: registration.id,
            })
        }
        Some(position) => {
            registry.remove(position);
            debug!(id = %registration.id, "Unregistered operator lift");
            Ok(())
        }
    }
}

/// Applies every registered lift to a newly assembled stage publisher.
///
/// Lifts run in registration order, each receiving the previous one's
/// result. With nothing registered the publisher is returned unchanged.
/// The registry lock is released before any lift runs.
#[must_use]
pub fn on_assembly(publisher: Arc<dyn Publisher>) -> Arc<dyn Publisher> {
    let lifts: Vec<OperatorLift> = LIFT_REGISTRY
        .read()
        .iter()
        .map(|entry| Arc::clone(&entry.lift))
        .collect();
    lifts
        .into_iter()
        .fold(publisher, |publisher, lift| lift(publisher))
}

/// Returns the ids of all registered lifts, in application order.
#[must_use]
pub fn registered_lift_ids() -> Vec<String> {
    LIFT_REGISTRY
        .read()
        .iter()
        .map(|entry| entry.id.clone())
        .collect()
}
