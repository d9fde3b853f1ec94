//! Identity-based keys for context entries.

use std::fmt;
use uuid::Uuid;

/// A key identifying one well-known entry in a [`Context`](super::Context).
///
/// Keys carry a name for diagnostics and a generated id for identity:
/// two keys created with the same name are distinct and never collide.
/// Create a key once (typically in a `static` or at process start) and
/// share clones of it everywhere the entry is read or written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    name: String,
    id: Uuid,
}

impl ContextKey {
    /// Creates a new key with the given diagnostic name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4(),
        }
    }

    /// Returns the diagnostic name of this key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique id of this key.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
