//! Fixture publishers covering every pipeline stage shape.

use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

use crate::context::Context;
use crate::stream::{
    ConnectablePublisher, Disposable, GroupKey, GroupedPublisher, Item, ManyPublisher,
    ParallelPublisher, Publisher, SinglePublisher, StreamError, Subscriber,
};
use crate::testing::{MockDisposable, MockSubscription};

/// Boxes a payload value as a stream item.
#[must_use]
pub fn item<T>(value: T) -> Item
where
    T: Any + Send + Sync,
{
    Arc::new(value)
}

/// A single-valued publisher that delivers at most one item
/// synchronously on subscribe.
pub struct ValuePublisher {
    value: Option<Item>,
    fused: bool,
}

impl ValuePublisher {
    /// Creates a publisher delivering one item.
    #[must_use]
    pub fn new(value: Item) -> Self {
        Self {
            value: Some(value),
            fused: false,
        }
    }

    /// Creates a publisher completing without an item.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            value: None,
            fused: false,
        }
    }

    /// Creates a fused publisher delivering one item.
    #[must_use]
    pub fn fuseable(value: Item) -> Self {
        Self {
            value: Some(value),
            fused: true,
        }
    }
}

impl Publisher for ValuePublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        subscriber.on_subscribe(Arc::new(MockSubscription::new()));
        if let Some(value) = &self.value {
            subscriber.on_next(Arc::clone(value));
        }
        subscriber.on_complete();
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_single(self: Arc<Self>) -> Option<Arc<dyn SinglePublisher>> {
        Some(self)
    }
}

impl SinglePublisher for ValuePublisher {}

/// A many-valued publisher that delivers a fixed sequence
/// synchronously on subscribe, terminating with an error if one is
/// configured.
pub struct EmitPublisher {
    items: Vec<Item>,
    error: Option<StreamError>,
    fused: bool,
}

impl EmitPublisher {
    /// Creates a publisher delivering `items` then completing.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            error: None,
            fused: false,
        }
    }

    /// Creates a fused publisher delivering `items` then completing.
    #[must_use]
    pub fn fuseable(items: Vec<Item>) -> Self {
        Self {
            items,
            error: None,
            fused: true,
        }
    }

    /// Creates a publisher delivering `items` then failing with
    /// `error`.
    #[must_use]
    pub fn failing(items: Vec<Item>, error: StreamError) -> Self {
        Self {
            items,
            error: Some(error),
            fused: false,
        }
    }
}

impl Publisher for EmitPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        subscriber.on_subscribe(Arc::new(MockSubscription::new()));
        for item in &self.items {
            subscriber.on_next(Arc::clone(item));
        }
        match &self.error {
            Some(error) => subscriber.on_error(Arc::clone(error)),
            None => subscriber.on_complete(),
        }
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        Some(self)
    }
}

impl ManyPublisher for EmitPublisher {}

/// A connectable publisher that registers subscribers on subscribe and
/// broadcasts its items when connected.
pub struct BroadcastPublisher {
    items: Vec<Item>,
    fused: bool,
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
    connect_contexts: Mutex<Vec<Context>>,
    disposable: Arc<MockDisposable>,
}

impl BroadcastPublisher {
    /// Creates a publisher broadcasting `items` on connect.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            fused: false,
            subscribers: Mutex::new(Vec::new()),
            connect_contexts: Mutex::new(Vec::new()),
            disposable: Arc::new(MockDisposable::new()),
        }
    }

    /// Creates a fused publisher broadcasting `items` on connect.
    #[must_use]
    pub fn fuseable(items: Vec<Item>) -> Self {
        Self {
            fused: true,
            ..Self::new(items)
        }
    }

    /// Returns the context observed by each connect call.
    #[must_use]
    pub fn connect_contexts(&self) -> Vec<Context> {
        self.connect_contexts.lock().clone()
    }

    /// Returns the disposable handed out by connect.
    #[must_use]
    pub fn disposable(&self) -> Arc<MockDisposable> {
        Arc::clone(&self.disposable)
    }
}

impl Publisher for BroadcastPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        subscriber.on_subscribe(Arc::new(MockSubscription::new()));
        self.subscribers.lock().push(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        Some(self)
    }

    fn as_connectable(self: Arc<Self>) -> Option<Arc<dyn ConnectablePublisher>> {
        Some(self)
    }
}

impl ManyPublisher for BroadcastPublisher {}

impl ConnectablePublisher for BroadcastPublisher {
    fn connect(&self) -> Arc<dyn Disposable> {
        self.connect_contexts.lock().push(Context::current());
        let subscribers = self.subscribers.lock().clone();
        for subscriber in subscribers {
            for item in &self.items {
                subscriber.on_next(Arc::clone(item));
            }
            subscriber.on_complete();
        }
        Arc::clone(&self.disposable) as Arc<dyn Disposable>
    }
}

/// A grouped publisher delivering one key's worth of items.
pub struct KeyedPublisher {
    key: GroupKey,
    items: Vec<Item>,
    fused: bool,
}

impl KeyedPublisher {
    /// Creates a publisher for `key` delivering `items`.
    #[must_use]
    pub fn new(key: GroupKey, items: Vec<Item>) -> Self {
        Self {
            key,
            items,
            fused: false,
        }
    }

    /// Creates a fused publisher for `key` delivering `items`.
    #[must_use]
    pub fn fuseable(key: GroupKey, items: Vec<Item>) -> Self {
        Self {
            key,
            items,
            fused: true,
        }
    }
}

impl Publisher for KeyedPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        subscriber.on_subscribe(Arc::new(MockSubscription::new()));
        for item in &self.items {
            subscriber.on_next(Arc::clone(item));
        }
        subscriber.on_complete();
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        Some(self)
    }

    fn as_grouped(self: Arc<Self>) -> Option<Arc<dyn GroupedPublisher>> {
        Some(self)
    }
}

impl ManyPublisher for KeyedPublisher {}

impl GroupedPublisher for KeyedPublisher {
    fn key(&self) -> GroupKey {
        self.key.clone()
    }
}

/// A parallel publisher with one item sequence per lane.
pub struct LanesPublisher {
    lanes: Vec<Vec<Item>>,
    fused: bool,
}

impl LanesPublisher {
    /// Creates a publisher with the given lanes.
    #[must_use]
    pub fn new(lanes: Vec<Vec<Item>>) -> Self {
        Self {
            lanes,
            fused: false,
        }
    }

    /// Creates a fused publisher with the given lanes.
    #[must_use]
    pub fn fuseable(lanes: Vec<Vec<Item>>) -> Self {
        Self { lanes, fused: true }
    }

    fn deliver(items: &[Item], subscriber: &Arc<dyn Subscriber>) {
        subscriber.on_subscribe(Arc::new(MockSubscription::new()));
        for item in items {
            subscriber.on_next(Arc::clone(item));
        }
        subscriber.on_complete();
    }
}

impl Publisher for LanesPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        let merged: Vec<Item> = self.lanes.iter().flatten().map(Arc::clone).collect();
        Self::deliver(&merged, &subscriber);
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_parallel(self: Arc<Self>) -> Option<Arc<dyn ParallelPublisher>> {
        Some(self)
    }
}

impl ParallelPublisher for LanesPublisher {
    fn parallelism(&self) -> usize {
        self.lanes.len()
    }

    fn subscribe_lanes(&self, subscribers: Vec<Arc<dyn Subscriber>>) {
        for (items, subscriber) in self.lanes.iter().zip(&subscribers) {
            Self::deliver(items, subscriber);
        }
    }
}

/// A many-valued publisher that delivers from a spawned task instead of
/// the subscribing thread.
pub struct TaskPublisher {
    items: Vec<Item>,
}

impl TaskPublisher {
    /// Creates a publisher delivering `items` from a spawned task.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

impl Publisher for TaskPublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        let items = self.items.clone();
        tokio::spawn(async move {
            subscriber.on_subscribe(Arc::new(MockSubscription::new()));
            for item in items {
                subscriber.on_next(item);
            }
            subscriber.on_complete();
        });
    }

    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        Some(self)
    }
}

impl ManyPublisher for TaskPublisher {}

/// A many-valued publisher whose subscribe panics.
#[derive(Debug)]
pub struct PanickingPublisher {
    message: String,
}

impl PanickingPublisher {
    /// Creates a publisher that panics with `message` on subscribe.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Publisher for PanickingPublisher {
    fn subscribe(&self, _subscriber: Arc<dyn Subscriber>) {
        panic!("{}", self.message);
    }

    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        Some(self)
    }
}

impl ManyPublisher for PanickingPublisher {}

/// A publisher answering no shape probe at all.
#[derive(Debug, Default)]
pub struct OpaquePublisher;

impl OpaquePublisher {
    /// Creates a publisher with an unrecognized shape.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Publisher for OpaquePublisher {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        subscriber.on_subscribe(Arc::new(MockSubscription::new()));
        subscriber.on_complete();
    }
}
