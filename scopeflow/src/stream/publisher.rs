//! Producer-side contracts: the publisher shape family.
//!
//! Every pipeline stage is a [`Publisher`]. Shapes refine the base
//! contract: single-value, many-valued, connectable (broadcast),
//! grouped (keyed) and parallel (fanned out over lanes). A publisher
//! reports its shape through the `as_*` probes, which default to
//! `None`; a publisher that overrides none of them has an unknown
//! shape and is left alone by the propagation layer.

use super::{Disposable, Subscriber};
use std::sync::Arc;

/// The key identifying a grouped publisher within its parent stream.
pub type GroupKey = serde_json::Value;

/// A producer of stream events to a [`Subscriber`].
pub trait Publisher: Send + Sync {
    /// Begins delivering events to the given subscriber.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>);

    /// Returns true if this publisher participates in the fused
    /// fast-path protocol with its subscriber.
    ///
    /// The flag is a capability marker only; it changes no behavior in
    /// this crate but must survive wrapping, because consumers that
    /// probe for it fall back to a slower general path when it is lost.
    fn is_fuseable(&self) -> bool {
        false
    }

    /// Probes whether this publisher is single-valued.
    fn as_single(self: Arc<Self>) -> Option<Arc<dyn SinglePublisher>> {
        None
    }

    /// Probes whether this publisher is many-valued.
    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        None
    }

    /// Probes whether this publisher is connectable.
    fn as_connectable(self: Arc<Self>) -> Option<Arc<dyn ConnectablePublisher>> {
        None
    }

    /// Probes whether this publisher is grouped.
    fn as_grouped(self: Arc<Self>) -> Option<Arc<dyn GroupedPublisher>> {
        None
    }

    /// Probes whether this publisher is parallelized.
    fn as_parallel(self: Arc<Self>) -> Option<Arc<dyn ParallelPublisher>> {
        None
    }
}

/// A publisher delivering at most one item before terminating.
pub trait SinglePublisher: Publisher {}

/// A publisher delivering zero or more items before terminating.
pub trait ManyPublisher: Publisher {}

/// A many-valued publisher that buffers until explicitly connected.
///
/// Subscribing registers interest; production starts only when
/// [`ConnectablePublisher::connect`] is invoked, which is a second
/// execution-boundary entry point independent of subscription.
pub trait ConnectablePublisher: ManyPublisher {
    /// Starts producing events to every registered subscriber.
    ///
    /// Returns a handle that stops production when disposed.
    fn connect(&self) -> Arc<dyn Disposable>;
}

/// A many-valued publisher carrying the key of its group.
pub trait GroupedPublisher: ManyPublisher {
    /// Returns the key this group was split out under.
    fn key(&self) -> GroupKey;
}

/// A publisher fanning events out over a fixed number of parallel lanes.
pub trait ParallelPublisher: Publisher {
    /// Returns the number of parallel lanes.
    fn parallelism(&self) -> usize;

    /// Begins delivering events to one subscriber per lane.
    fn subscribe_lanes(&self, subscribers: Vec<Arc<dyn Subscriber>>);
}
