//! Immutable context snapshots for later replay.

use super::{Context, ScopeGuard};
use chrono::{DateTime, Utc};

/// A context captured at one instant, replayed many times.
///
/// Snapshots are taken when a pipeline stage is assembled and replayed
/// every time that stage later delivers an event, from whatever thread
/// delivery happens on. The captured context is never replaced: every
/// replay of a snapshot activates exactly the context that was current
/// at capture time.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    context: Context,
    captured_at: DateTime<Utc>,
}

impl ContextSnapshot {
    /// Captures the context currently active on the calling thread.
    #[must_use]
    pub fn capture() -> Self {
        Self::new(Context::current())
    }

    /// Creates a snapshot of the given context.
    #[must_use]
    pub fn new(context: Context) -> Self {
        Self {
            context,
            captured_at: Utc::now(),
        }
    }

    /// Returns the captured context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the instant the snapshot was taken.
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Replays the captured context as current on the calling thread.
    ///
    /// The returned guard restores the previously-current context when
    /// dropped, exactly like [`Context::attach`].
    #[must_use = "the snapshot stays current only while the guard is held"]
    pub fn attach(&self) -> ScopeGuard {
        self.context.attach()
    }
}
