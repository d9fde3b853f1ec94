//! Consumer-side contracts of the reactive stream protocol.

use crate::context::Context;
use std::any::Any;
use std::sync::Arc;

/// An item delivered through a stream, shared and type-erased.
pub type Item = Arc<dyn Any + Send + Sync>;

/// An error delivered through a stream, passed along unchanged.
pub type StreamError = Arc<dyn std::error::Error + Send + Sync>;

/// The demand channel handed to a subscriber when delivery begins.
pub trait Subscription: Send + Sync {
    /// Requests up to `n` more items from the producer.
    fn request(&self, n: u64);

    /// Stops the producer from delivering further items.
    fn cancel(&self);
}

/// A handle that stops an ongoing production when disposed.
pub trait Disposable: Send + Sync {
    /// Stops the production this handle controls.
    fn dispose(&self);

    /// Returns true once the handle has been disposed.
    fn is_disposed(&self) -> bool;
}

/// A consumer of stream events.
///
/// A subscriber receives exactly one subscription acknowledgement,
/// then any number of items, then at most one terminal signal (error
/// or completion). Implementations must tolerate callbacks arriving
/// from different threads over the subscriber's lifetime.
pub trait Subscriber: Send + Sync {
    /// Acknowledges that delivery is about to begin.
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// Delivers one item.
    fn on_next(&self, item: Item);

    /// Terminates the stream with an error.
    fn on_error(&self, error: StreamError);

    /// Terminates the stream normally.
    fn on_complete(&self);

    /// The context this subscriber wants current during its callbacks.
    ///
    /// Defaults to whatever is current on the calling thread; proxies
    /// that replay a captured context override this to report it.
    fn context(&self) -> Context {
        Context::current()
    }

    /// Returns true if this subscriber already replays a captured
    /// context around its callbacks.
    ///
    /// Used to avoid wrapping the same subscriber twice.
    fn is_scoped(&self) -> bool {
        false
    }
}
