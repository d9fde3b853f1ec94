//! The reactive stream contracts this layer wraps.
//!
//! This module defines the public shapes of pipeline stages and their
//! consumers. The propagation layer never changes these contracts: a
//! wrapped publisher satisfies exactly the same shape contract as the
//! original, and a wrapped subscriber receives exactly the signals the
//! original would.

mod publisher;
mod subscriber;

pub use publisher::{
    ConnectablePublisher, GroupKey, GroupedPublisher, ManyPublisher, ParallelPublisher, Publisher,
    SinglePublisher,
};
pub use subscriber::{Disposable, Item, StreamError, Subscriber, Subscription};
