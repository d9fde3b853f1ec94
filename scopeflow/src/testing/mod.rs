//! Testing utilities for context propagation.
//!
//! This module provides:
//! - Recording subscribers and mock subscriptions
//! - Fixture publishers for every stage shape
//! - Helpers for boxing payload values

mod fixtures;
mod mocks;

pub use fixtures::{
    item, BroadcastPublisher, EmitPublisher, KeyedPublisher, LanesPublisher, OpaquePublisher,
    PanickingPublisher, TaskPublisher, ValuePublisher,
};
pub use mocks::{
    MockDisposable, MockSubscription, RecordedSignal, RecordingSubscriber, SignalKind,
};
