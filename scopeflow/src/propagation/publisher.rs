//! The scope-replaying publisher wrapper family.
//!
//! One generic wrapper covers every publisher shape. [`ScopedPublisher`]
//! holds a captured snapshot and a delegate of some shape; per-shape
//! trait impls forward the informational surface of that shape untouched
//! and override only the entry points that cross an execution boundary:
//! subscription for every shape, connection for connectable publishers
//! and the lane fan-out for parallel publishers. The fused fast-path
//! flag is mirrored from the delegate at construction, so a wrapped
//! publisher answers the capability probe exactly like its delegate.

use crate::context::ContextSnapshot;
use crate::propagation::ScopedSubscriber;
use crate::stream::{
    ConnectablePublisher, Disposable, GroupKey, GroupedPublisher, ManyPublisher,
    ParallelPublisher, Publisher, SinglePublisher, Subscriber,
};
use std::sync::Arc;
use tracing::trace;

/// A publisher that replays a captured context around the execution
/// boundaries of its delegate.
///
/// The scope opened around `subscribe` (and `connect`) covers only the
/// synchronous side effects of starting delivery; steady-state
/// propagation is the wrapped subscriber's job, which re-opens the same
/// snapshot around every later callback.
pub struct ScopedPublisher<P: ?Sized> {
    snapshot: ContextSnapshot,
    fused: bool,
    delegate: Arc<P>,
}

impl<P> ScopedPublisher<P>
where
    P: Publisher + ?Sized,
{
    /// Wraps `delegate`, capturing its fused capability flag.
    #[must_use]
    pub fn new(snapshot: ContextSnapshot, delegate: Arc<P>) -> Self {
        let fused = delegate.is_fuseable();
        Self {
            snapshot,
            fused,
            delegate,
        }
    }

    /// Returns the snapshot replayed around execution boundaries.
    #[must_use]
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    /// Returns the wrapped publisher.
    #[must_use]
    pub fn delegate(&self) -> &Arc<P> {
        &self.delegate
    }

    /// Subscribes the delegate to a scope-replaying proxy of
    /// `subscriber`, inside a scope opened with the snapshot.
    fn scoped_subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        let _scope = self.snapshot.attach();
        self.delegate
            .subscribe(ScopedSubscriber::wrap(self.snapshot.clone(), subscriber));
    }
}

impl Publisher for ScopedPublisher<dyn SinglePublisher> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.scoped_subscribe(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_single(self: Arc<Self>) -> Option<Arc<dyn SinglePublisher>> {
        Some(self)
    }
}

impl SinglePublisher for ScopedPublisher<dyn SinglePublisher> {}

impl Publisher for ScopedPublisher<dyn ManyPublisher> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.scoped_subscribe(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_many(self: Arc<Self>) -> Option<Arc<dyn ManyPublisher>> {
        Some(self)
    }
}

impl ManyPublisher for ScopedPublisher<dyn ManyPublisher> {}

impl Publisher for ScopedPublisher<dyn ConnectablePublisher> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.scoped_subscribe(subscriber);
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

impl ManyPublisher for ScopedPublisher<dyn ConnectablePublisher> {}

impl ConnectablePublisher for ScopedPublisher<dyn ConnectablePublisher> {
    fn connect(&self) -> Arc<dyn Disposable> {
        let _scope = self.snapshot.attach();
        self.delegate.connect()
    }
}

impl Publisher for ScopedPublisher<dyn GroupedPublisher> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.scoped_subscribe(subscriber);
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

impl ManyPublisher for ScopedPublisher<dyn GroupedPublisher> {}

impl GroupedPublisher for ScopedPublisher<dyn GroupedPublisher> {
    fn key(&self) -> GroupKey {
        self.delegate.key()
    }
}

impl Publisher for ScopedPublisher<dyn ParallelPublisher> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.scoped_subscribe(subscriber);
    }

    fn is_fuseable(&self) -> bool {
        self.fused
    }

    fn as_parallel(self: Arc<Self>) -> Option<Arc<dyn ParallelPublisher>> {
        Some(self)
    }
}

impl ParallelPublisher for ScopedPublisher<dyn ParallelPublisher> {
    fn parallelism(&self) -> usize {
        self.delegate.parallelism()
    }

    fn subscribe_lanes(&self, subscribers: Vec<Arc<dyn Subscriber>>) {
        let _scope = self.snapshot.attach();
        let wrapped = subscribers
            .into_iter()
            .map(|lane| ScopedSubscriber::wrap(self.snapshot.clone(), lane))
            .collect();
        self.delegate.subscribe_lanes(wrapped);
    }
}

/// Captures the current context and wraps `publisher` in the variant
/// matching its shape.
///
/// Shapes are probed in a fixed priority order: single, parallel,
/// connectable, grouped, then generic many-valued. Connectable and
/// grouped publishers also satisfy the many-valued contract, so their
/// probes must run before the generic one. The fused capability flag is
/// read independently of shape and mirrored onto the wrapper. A
/// publisher matching no probe is returned unchanged; no context
/// propagation is provided for such a stage.
#[must_use]
pub fn wrap_publisher(publisher: Arc<dyn Publisher>) -> Arc<dyn Publisher> {
    let snapshot = ContextSnapshot::capture();

    if let Some(single) = Arc::clone(&publisher).as_single() {
        trace!(
            shape = "single",
            fuseable = single.is_fuseable(),
            "Wrapping pipeline stage"
        );
        return Arc::new(ScopedPublisher::new(snapshot, single));
    }
    if let Some(parallel) = Arc::clone(&publisher).as_parallel() {
        trace!(
            shape = "parallel",
            fuseable = parallel.is_fuseable(),
            "Wrapping pipeline stage"
        );
        return Arc::new(ScopedPublisher::new(snapshot, parallel));
    }
    if let Some(connectable) = Arc::clone(&publisher).as_connectable() {
        trace!(
            shape = "connectable",
            fuseable = connectable.is_fuseable(),
            "Wrapping pipeline stage"
        );
        return Arc::new(ScopedPublisher::new(snapshot, connectable));
    }
    if let Some(grouped) = Arc::clone(&publisher).as_grouped() {
        trace!(
            shape = "grouped",
            fuseable = grouped.is_fuseable(),
            "Wrapping pipeline stage"
        );
        return Arc::new(ScopedPublisher::new(snapshot, grouped));
    }
    if let Some(many) = Arc::clone(&publisher).as_many() {
        trace!(
            shape = "many",
            fuseable = many.is_fuseable(),
            "Wrapping pipeline stage"
        );
        return Arc::new(ScopedPublisher::new(snapshot, many));
    }

    trace!("Publisher shape not recognized; passing through unwrapped");
    publisher
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, ContextKey};
    use crate::testing::{
        item, BroadcastPublisher, EmitPublisher, KeyedPublisher, LanesPublisher, OpaquePublisher,
        PanickingPublisher, RecordingSubscriber, SignalKind, ValuePublisher,
    };
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn span_context(name: &str) -> Context {
        let key = ContextKey::new("active-span");
        Context::root().with_value(&key, name.to_string())
    }

    fn wrap_under(context: &Context, publisher: Arc<dyn Publisher>) -> Arc<dyn Publisher> {
        let guard = context.attach();
        let wrapped = wrap_publisher(publisher);
        guard.close();
        wrapped
    }

    #[test]
    fn test_single_shape_is_preserved() {
        let context = span_context("assembly");
        let wrapped = wrap_under(&context, Arc::new(ValuePublisher::new(item(1_u32))));

        assert!(Arc::clone(&wrapped).as_single().is_some());
        assert!(Arc::clone(&wrapped).as_many().is_none());
        assert!(!wrapped.is_fuseable());
    }

    #[test]
    fn test_many_shape_is_preserved() {
        let context = span_context("assembly");
        let wrapped = wrap_under(&context, Arc::new(EmitPublisher::new(vec![item(1_u32)])));

        assert!(Arc::clone(&wrapped).as_many().is_some());
        assert!(Arc::clone(&wrapped).as_single().is_none());
        assert!(Arc::clone(&wrapped).as_connectable().is_none());
    }

    #[test]
    fn test_connectable_probes_before_many() {
        let context = span_context("assembly");
        let wrapped = wrap_under(&context, Arc::new(BroadcastPublisher::new(vec![item(1_u32)])));

        assert!(Arc::clone(&wrapped).as_connectable().is_some());
        assert!(Arc::clone(&wrapped).as_many().is_some());
    }

    #[test]
    fn test_grouped_forwards_its_key() {
        let context = span_context("assembly");
        let key = serde_json::json!("user-42");
        let wrapped = wrap_under(
            &context,
            Arc::new(KeyedPublisher::new(key.clone(), vec![item(1_u32)])),
        );

        let grouped = Arc::clone(&wrapped).as_grouped().unwrap();
        assert_eq!(grouped.key(), key);
        assert!(Arc::clone(&wrapped).as_many().is_some());
    }

    #[test]
    fn test_parallel_forwards_its_parallelism() {
        let context = span_context("assembly");
        let lanes = vec![vec![item(1_u32)], vec![item(2_u32)], vec![item(3_u32)]];
        let wrapped = wrap_under(&context, Arc::new(LanesPublisher::new(lanes)));

        let parallel = Arc::clone(&wrapped).as_parallel().unwrap();
        assert_eq!(parallel.parallelism(), 3);
    }

    #[test]
    fn test_fuseable_flag_is_mirrored_for_every_shape() {
        let context = span_context("assembly");
        let group = serde_json::json!(1);

        let fused: Vec<Arc<dyn Publisher>> = vec![
            Arc::new(ValuePublisher::fuseable(item(1_u32))),
            Arc::new(EmitPublisher::fuseable(vec![item(1_u32)])),
            Arc::new(BroadcastPublisher::fuseable(vec![item(1_u32)])),
            Arc::new(KeyedPublisher::fuseable(group.clone(), vec![item(1_u32)])),
            Arc::new(LanesPublisher::fuseable(vec![vec![item(1_u32)]])),
        ];
        for publisher in fused {
            assert!(wrap_under(&context, publisher).is_fuseable());
        }

        let plain: Vec<Arc<dyn Publisher>> = vec![
            Arc::new(ValuePublisher::new(item(1_u32))),
            Arc::new(EmitPublisher::new(vec![item(1_u32)])),
            Arc::new(BroadcastPublisher::new(vec![item(1_u32)])),
            Arc::new(KeyedPublisher::new(group, vec![item(1_u32)])),
            Arc::new(LanesPublisher::new(vec![vec![item(1_u32)]])),
        ];
        for publisher in plain {
            assert!(!wrap_under(&context, publisher).is_fuseable());
        }
    }

    #[test]
    fn test_unknown_shape_passes_through_unwrapped() {
        let context = span_context("assembly");
        let publisher: Arc<dyn Publisher> = Arc::new(OpaquePublisher::new());
        let out = wrap_under(&context, Arc::clone(&publisher));

        assert!(Arc::ptr_eq(&publisher, &out));
    }

    #[test]
    fn test_subscribe_replays_the_assembly_context() {
        let c1 = span_context("assembly");
        let wrapped = wrap_under(&c1, Arc::new(EmitPublisher::new(vec![item(1_u32)])));

        let recording = Arc::new(RecordingSubscriber::new());
        wrapped.subscribe(recording.clone());

        assert_eq!(
            recording.kinds(),
            vec![SignalKind::Subscribe, SignalKind::Next, SignalKind::Complete]
        );
        for context in recording.observed_contexts() {
            assert!(context.ptr_eq(&c1));
        }
    }

    #[test]
    fn test_subscribe_restores_the_callers_context() {
        let c1 = span_context("assembly");
        let c2 = span_context("subscription");
        let wrapped = wrap_under(&c1, Arc::new(EmitPublisher::new(vec![item(1_u32)])));

        let guard = c2.attach();
        wrapped.subscribe(Arc::new(RecordingSubscriber::new()));
        assert!(Context::current().ptr_eq(&c2));
        guard.close();
    }

    #[test]
    fn test_connect_replays_and_restores() {
        let c1 = span_context("assembly");
        let c3 = span_context("connection");
        let delegate = Arc::new(BroadcastPublisher::new(vec![item(1_u32)]));
        let wrapped = wrap_under(&c1, delegate.clone());
        let connectable = Arc::clone(&wrapped).as_connectable().unwrap();

        let guard = c3.attach();
        let disposable = connectable.connect();
        assert!(Context::current().ptr_eq(&c3));
        guard.close();

        let connect_contexts = delegate.connect_contexts();
        assert_eq!(connect_contexts.len(), 1);
        assert!(connect_contexts[0].ptr_eq(&c1));

        disposable.dispose();
        assert!(delegate.disposable().is_disposed());
    }

    #[test]
    fn test_lane_subscribers_replay_the_assembly_context() {
        let c1 = span_context("assembly");
        let lanes = vec![vec![item(1_u32)], vec![item(2_u32)]];
        let wrapped = wrap_under(&c1, Arc::new(LanesPublisher::new(lanes)));
        let parallel = Arc::clone(&wrapped).as_parallel().unwrap();

        let first = Arc::new(RecordingSubscriber::new());
        let second = Arc::new(RecordingSubscriber::new());
        parallel.subscribe_lanes(vec![first.clone(), second.clone()]);

        for lane in [first, second] {
            assert!(lane.completed());
            for context in lane.observed_contexts() {
                assert!(context.ptr_eq(&c1));
            }
        }
    }

    #[test]
    fn test_chained_wrapping_does_not_nest_subscriber_proxies() {
        let c1 = span_context("assembly");
        let inner = wrap_under(&c1, Arc::new(EmitPublisher::new(vec![item(1_u32)])));
        let outer = wrap_under(&c1, inner);

        let recording = Arc::new(RecordingSubscriber::new());
        outer.subscribe(recording.clone());

        // The inner wrapper sees an already-scoped proxy and keeps it.
        assert_eq!(
            recording.kinds(),
            vec![SignalKind::Subscribe, SignalKind::Next, SignalKind::Complete]
        );
        for context in recording.observed_contexts() {
            assert!(context.ptr_eq(&c1));
        }
    }

    #[test]
    fn test_delegate_panic_passes_through_and_scope_closes() {
        let c1 = span_context("assembly");
        let wrapped = wrap_under(&c1, Arc::new(PanickingPublisher::new("subscription failed")));
        let before = Context::current();

        let result = catch_unwind(AssertUnwindSafe(|| {
            wrapped.subscribe(Arc::new(RecordingSubscriber::new()));
        }));

        let payload = result.unwrap_err();
        let message = payload.downcast_ref::<String>().cloned();
        assert_eq!(message.as_deref(), Some("subscription failed"));
        assert!(Context::current().ptr_eq(&before));
    }

    #[test]
    fn test_wrapper_exposes_snapshot_and_delegate() {
        let c1 = span_context("assembly");
        let delegate: Arc<dyn ManyPublisher> = Arc::new(EmitPublisher::new(vec![item(1_u32)]));
        let guard = c1.attach();
        let wrapped = ScopedPublisher::new(ContextSnapshot::capture(), Arc::clone(&delegate));
        guard.close();

        assert!(wrapped.snapshot().context().ptr_eq(&c1));
        assert!(Arc::ptr_eq(wrapped.delegate(), &delegate));
    }
}
