//! The current-context stack and its scope guards.
//!
//! Each thread owns an independent stack of active contexts. Attaching a
//! context pushes it and returns a [`ScopeGuard`]; dropping the guard pops
//! the entry and restores whatever was current before, on every exit path
//! including panics. Context never crosses threads through this stack -
//! cross-thread propagation happens by replaying a
//! [`ContextSnapshot`](super::ContextSnapshot) on the destination thread.

use super::ContextKey;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::error;

/// A value stored in a context entry, shared and type-erased.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// An entry on a thread's context stack.
struct ScopeEntry {
    scope_id: u64,
    context: Context,
}

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ScopeEntry>> = RefCell::new(Vec::new());
}

/// Monotonic ids pairing each guard with its stack entry.
static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// The designated empty context returned when no scope is active.
static ROOT_CONTEXT: OnceLock<Context> = OnceLock::new();

/// An immutable mapping of ambient values associated with a logical
/// execution (for example an active trace span).
///
/// A context never mutates after creation: [`Context::with_value`] returns
/// a new context and leaves the original untouched. Values are shared, so
/// cloning a context or deriving one from it is cheap.
#[derive(Clone)]
pub struct Context {
    entries: Arc<HashMap<ContextKey, ContextValue>>,
}

impl Context {
    /// Returns the designated empty root context.
    ///
    /// Every call returns the same shared instance, so
    /// [`Context::ptr_eq`] holds between root contexts.
    #[must_use]
    pub fn root() -> Self {
        ROOT_CONTEXT
            .get_or_init(|| Self {
                entries: Arc::new(HashMap::new()),
            })
            .clone()
    }

    /// Returns the context currently active on the calling thread, or the
    /// root context when no scope is active.
    #[must_use]
    pub fn current() -> Self {
        SCOPE_STACK
            .with(|stack| stack.borrow().last().map(|entry| entry.context.clone()))
            .unwrap_or_else(Self::root)
    }

    /// Returns a new context with the given entry added, leaving this
    /// context unchanged.
    #[must_use]
    pub fn with_value<T>(&self, key: &ContextKey, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        let mut entries: HashMap<ContextKey, ContextValue> = (*self.entries).clone();
        entries.insert(key.clone(), Arc::new(value));
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the value stored under `key`, if present and of type `T`.
    #[must_use]
    pub fn get<T>(&self, key: &ContextKey) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.entries
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Returns true if an entry is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &ContextKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of entries in this context.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this context holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if both contexts are the same instance.
    ///
    /// Contexts compare by identity, not by content: two contexts built
    /// from the same entries are still distinct.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Activates this context as current on the calling thread.
    ///
    /// The returned guard restores the previously-current context when
    /// dropped. Guards are per-thread and must be dropped in the reverse
    /// order they were created.
    #[must_use = "the context stays current only while the guard is held"]
    pub fn attach(&self) -> ScopeGuard {
        let scope_id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeEntry {
                scope_id,
                context: self.clone(),
            });
        });
        ScopeGuard {
            scope_id,
            _not_send: PhantomData,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// A live activation of a context as current on one thread.
///
/// Dropping the guard restores the previously-current context; an explicit
/// [`ScopeGuard::close`] consumes the guard, so closing twice cannot be
/// expressed. Guards stay on the thread that created them.
#[must_use = "the context stays current only while the guard is held"]
pub struct ScopeGuard {
    scope_id: u64,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    /// Restores the previously-current context now.
    ///
    /// Equivalent to dropping the guard.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // try_with: a guard dropped during thread teardown after the stack
        // itself was destroyed has nothing left to restore.
        let _ = SCOPE_STACK.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.last().map(|entry| entry.scope_id) == Some(self.scope_id) {
                stack.pop();
                return;
            }
            // Not on top: either dropped out of LIFO order, or this entry
            // was already discarded by an out-of-order outer guard.
            if let Some(position) = stack
                .iter()
                .rposition(|entry| entry.scope_id == self.scope_id)
            {
                let discarded = stack.len() - position - 1;
                error!(
                    scope_id = self.scope_id,
                    discarded, "Scope guard dropped out of LIFO order; restoring its attach depth"
                );
                stack.truncate(position);
                if !std::thread::panicking() {
                    debug_assert!(false, "scope guard dropped out of LIFO order");
                }
            }
        });
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("scope_id", &self.scope_id)
            .finish()
    }
}
