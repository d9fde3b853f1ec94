//! Mock subscribers and subscriptions for testing.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::stream::{Disposable, Item, StreamError, Subscriber, Subscription};

/// The kind of a recorded signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// A subscription handshake.
    Subscribe,
    /// A delivered item.
    Next,
    /// A terminal error.
    Error,
    /// A terminal completion.
    Complete,
}

/// One signal observed by a [`RecordingSubscriber`], together with the
/// context that was current at delivery time.
#[derive(Clone)]
pub enum RecordedSignal {
    /// A subscription handshake and its payload.
    Subscribe {
        /// The context current when the handshake arrived.
        context: Context,
        /// The subscription that was handed over.
        subscription: Arc<dyn Subscription>,
    },
    /// A delivered item and its payload.
    Next {
        /// The context current when the item arrived.
        context: Context,
        /// The delivered item.
        item: Item,
    },
    /// A terminal error and its payload.
    Error {
        /// The context current when the error arrived.
        context: Context,
        /// The delivered error.
        error: StreamError,
    },
    /// A terminal completion.
    Complete {
        /// The context current when completion arrived.
        context: Context,
    },
}

impl RecordedSignal {
    /// Returns the kind of this signal.
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Subscribe { .. } => SignalKind::Subscribe,
            Self::Next { .. } => SignalKind::Next,
            Self::Error { .. } => SignalKind::Error,
            Self::Complete { .. } => SignalKind::Complete,
        }
    }

    /// Returns the context current when the signal arrived.
    #[must_use]
    pub fn context(&self) -> &Context {
        match self {
            Self::Subscribe { context, .. }
            | Self::Next { context, .. }
            | Self::Error { context, .. }
            | Self::Complete { context } => context,
        }
    }
}

impl fmt::Debug for RecordedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedSignal")
            .field("kind", &self.kind())
            .field("context", self.context())
            .finish_non_exhaustive()
    }
}

/// A subscriber that records every signal and the context it arrived
/// under.
#[derive(Debug, Default)]
pub struct RecordingSubscriber {
    signals: Mutex<Vec<RecordedSignal>>,
    terminal: Condvar,
}

impl RecordingSubscriber {
    /// Creates a new recording subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded signal in arrival order.
    #[must_use]
    pub fn signals(&self) -> Vec<RecordedSignal> {
        self.signals.lock().clone()
    }

    /// Returns the kinds of every recorded signal in arrival order.
    #[must_use]
    pub fn kinds(&self) -> Vec<SignalKind> {
        self.signals.lock().iter().map(RecordedSignal::kind).collect()
    }

    /// Returns the context observed by each signal in arrival order.
    #[must_use]
    pub fn observed_contexts(&self) -> Vec<Context> {
        self.signals
            .lock()
            .iter()
            .map(|signal| signal.context().clone())
            .collect()
    }

    /// Returns the delivered items in arrival order.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.signals
            .lock()
            .iter()
            .filter_map(|signal| match signal {
                RecordedSignal::Next { item, .. } => Some(Arc::clone(item)),
                _ => None,
            })
            .collect()
    }

    /// Returns the terminal error, if one arrived.
    #[must_use]
    pub fn error(&self) -> Option<StreamError> {
        self.signals.lock().iter().find_map(|signal| match signal {
            RecordedSignal::Error { error, .. } => Some(Arc::clone(error)),
            _ => None,
        })
    }

    /// Returns whether a completion signal arrived.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.signals
            .lock()
            .iter()
            .any(|signal| signal.kind() == SignalKind::Complete)
    }

    /// Returns the subscription received in the handshake, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<Arc<dyn Subscription>> {
        self.signals.lock().iter().find_map(|signal| match signal {
            RecordedSignal::Subscribe { subscription, .. } => Some(Arc::clone(subscription)),
            _ => None,
        })
    }

    /// Blocks until a terminal signal arrives or the timeout elapses.
    ///
    /// Returns `true` if a terminal signal was observed in time.
    #[must_use]
    pub fn wait_for_terminal(&self, timeout: Duration) -> bool {
        let mut signals = self.signals.lock();
        !self
            .terminal
            .wait_while_for(
                &mut signals,
                |signals| !signals.iter().any(Self::is_terminal),
                timeout,
            )
            .timed_out()
    }

    fn is_terminal(signal: &RecordedSignal) -> bool {
        matches!(signal.kind(), SignalKind::Error | SignalKind::Complete)
    }

    fn record(&self, signal: RecordedSignal) {
        let terminal = Self::is_terminal(&signal);
        self.signals.lock().push(signal);
        if terminal {
            self.terminal.notify_all();
        }
    }
}

impl Subscriber for RecordingSubscriber {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.record(RecordedSignal::Subscribe {
            context: Context::current(),
            subscription,
        });
    }

    fn on_next(&self, item: Item) {
        self.record(RecordedSignal::Next {
            context: Context::current(),
            item,
        });
    }

    fn on_error(&self, error: StreamError) {
        self.record(RecordedSignal::Error {
            context: Context::current(),
            error,
        });
    }

    fn on_complete(&self) {
        self.record(RecordedSignal::Complete {
            context: Context::current(),
        });
    }
}

/// A subscription that records demand and cancellation.
#[derive(Debug, Default)]
pub struct MockSubscription {
    requested: Mutex<Vec<u64>>,
    cancelled: AtomicBool,
}

impl MockSubscription {
    /// Creates a new mock subscription.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every demand request in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<u64> {
        self.requested.lock().clone()
    }

    /// Returns whether the subscription was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Subscription for MockSubscription {
    fn request(&self, count: u64) {
        self.requested.lock().push(count);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// A disposable that records disposal.
#[derive(Debug, Default)]
pub struct MockDisposable {
    disposed: AtomicBool,
}

impl MockDisposable {
    /// Creates a new mock disposable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Disposable for MockDisposable {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
