//! The scope-replaying subscriber proxy.

use crate::context::{Context, ContextSnapshot};
use crate::stream::{Item, StreamError, Subscriber, Subscription};
use std::sync::Arc;

/// A proxy that replays a captured context around every callback of the
/// subscriber it wraps.
///
/// Each signal (`on_subscribe`, `on_next`, `on_error`, `on_complete`)
/// opens a scope with the snapshot, forwards to the inner subscriber
/// and closes the scope when the callback returns, whether delivery
/// happens synchronously in the caller's stack or later on a different
/// worker. Signals and their payloads pass through untouched.
pub struct ScopedSubscriber {
    snapshot: ContextSnapshot,
    inner: Arc<dyn Subscriber>,
}

impl ScopedSubscriber {
    /// Wraps `subscriber` so its callbacks run under the snapshot's
    /// context.
    ///
    /// Wrapping is idempotent: a subscriber that already replays a
    /// captured context is returned unchanged, even when the snapshots
    /// differ. The first wrap wins, so chained wrapped stages share one
    /// scope per callback instead of nesting redundant ones.
    #[must_use]
    pub fn wrap(snapshot: ContextSnapshot, subscriber: Arc<dyn Subscriber>) -> Arc<dyn Subscriber> {
        if subscriber.is_scoped() {
            return subscriber;
        }
        Arc::new(Self {
            snapshot,
            inner: subscriber,
        })
    }

    /// Returns the snapshot replayed around each callback.
    #[must_use]
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    /// Returns the wrapped subscriber.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Subscriber> {
        &self.inner
    }
}

impl Subscriber for ScopedSubscriber {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        let _scope = self.snapshot.attach();
        self.inner.on_subscribe(subscription);
    }

    fn on_next(&self, item: Item) {
        let _scope = self.snapshot.attach();
        self.inner.on_next(item);
    }

    fn on_error(&self, error: StreamError) {
        let _scope = self.snapshot.attach();
        self.inner.on_error(error);
    }

    fn on_complete(&self) {
        let _scope = self.snapshot.attach();
        self.inner.on_complete();
    }

    fn context(&self) -> Context {
        self.snapshot.context().clone()
    }

    fn is_scoped(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextKey;
    use crate::testing::{item, MockSubscription, RecordingSubscriber, SignalKind};

    fn snapshot_of(context: &Context) -> ContextSnapshot {
        ContextSnapshot::new(context.clone())
    }

    #[test]
    fn test_every_signal_replays_the_snapshot() {
        let key = ContextKey::new("active-span");
        let captured = Context::root().with_value(&key, "captured".to_string());
        let recording = Arc::new(RecordingSubscriber::new());
        let wrapped = ScopedSubscriber::wrap(snapshot_of(&captured), recording.clone());

        wrapped.on_subscribe(Arc::new(MockSubscription::new()));
        wrapped.on_next(item(1_u32));
        wrapped.on_complete();

        let contexts = recording.observed_contexts();
        assert_eq!(contexts.len(), 3);
        for context in contexts {
            assert!(context.ptr_eq(&captured));
        }
    }

    #[test]
    fn test_error_signal_replays_the_snapshot() {
        let key = ContextKey::new("active-span");
        let captured = Context::root().with_value(&key, "captured".to_string());
        let recording = Arc::new(RecordingSubscriber::new());
        let wrapped = ScopedSubscriber::wrap(snapshot_of(&captured), recording.clone());

        let error: StreamError = Arc::new(std::io::Error::other("stage failed"));
        wrapped.on_error(Arc::clone(&error));

        assert_eq!(recording.kinds(), vec![SignalKind::Error]);
        assert!(recording.observed_contexts()[0].ptr_eq(&captured));
        assert!(Arc::ptr_eq(&recording.error().unwrap(), &error));
    }

    #[test]
    fn test_caller_context_restored_after_each_callback() {
        let key = ContextKey::new("active-span");
        let captured = Context::root().with_value(&key, "captured".to_string());
        let ambient = Context::root().with_value(&key, "ambient".to_string());
        let recording = Arc::new(RecordingSubscriber::new());
        let wrapped = ScopedSubscriber::wrap(snapshot_of(&captured), recording.clone());

        let guard = ambient.attach();
        wrapped.on_next(item(1_u32));
        assert!(Context::current().ptr_eq(&ambient));
        guard.close();
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let recording = Arc::new(RecordingSubscriber::new());
        let once = ScopedSubscriber::wrap(ContextSnapshot::capture(), recording);
        let twice = ScopedSubscriber::wrap(ContextSnapshot::capture(), Arc::clone(&once));

        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_wrapped_subscriber_reports_scoped() {
        let recording = Arc::new(RecordingSubscriber::new());
        assert!(!recording.is_scoped());

        let wrapped = ScopedSubscriber::wrap(ContextSnapshot::capture(), recording);
        assert!(wrapped.is_scoped());
    }

    #[test]
    fn test_context_reports_the_snapshot() {
        let key = ContextKey::new("active-span");
        let captured = Context::root().with_value(&key, "captured".to_string());
        let recording = Arc::new(RecordingSubscriber::new());
        let wrapped = ScopedSubscriber::wrap(snapshot_of(&captured), recording);

        assert!(wrapped.context().ptr_eq(&captured));
    }

    #[test]
    fn test_payloads_pass_through_unchanged() {
        let recording = Arc::new(RecordingSubscriber::new());
        let wrapped = ScopedSubscriber::wrap(ContextSnapshot::capture(), recording.clone());

        let subscription: Arc<dyn Subscription> = Arc::new(MockSubscription::new());
        let delivered = item("payload".to_string());

        wrapped.on_subscribe(Arc::clone(&subscription));
        wrapped.on_next(Arc::clone(&delivered));

        assert!(Arc::ptr_eq(
            &recording.subscription().unwrap(),
            &subscription
        ));
        assert!(Arc::ptr_eq(&recording.items()[0], &delivered));
    }
}
