//! In-process event bus.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use closet_core::{Attributes, Clock, EngineError, EngineResult, SystemClock};

use crate::bus::EventPublisher;
use crate::event::DomainEvent;
use crate::history::{EventHistory, EventHistoryEntry};
use crate::pattern::is_interested;
use crate::subscriber::{Subscriber, SubscriberInfo};

/// Bus behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusOptions {
    /// Log each publication at `info`.
    pub log_events: bool,
    /// History ring-buffer capacity.
    pub max_history: usize,
    /// Keep delivering after a handler fails. When false, delivery stops at the
    /// failing handler and `publish` returns [`EngineError::HandlerFailure`].
    pub skip_invalid: bool,
}

impl Default for BusOptions {
    fn default() -> Self {
        Self {
            log_events: true,
            max_history: 100,
            skip_invalid: true,
        }
    }
}

/// Snapshot of bus state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusStats {
    pub total_subscribers: usize,
    pub total_events_fired: usize,
    pub event_counts: BTreeMap<String, usize>,
    pub most_fired_event: Option<String>,
    pub options: BusOptions,
}

/// In-memory synchronous pub/sub bus.
///
/// - Handlers run on the publishing thread in registration order
/// - Subscribers are snapshotted before delivery, so handlers may subscribe or
///   unsubscribe without deadlocking
/// - Exactly one history entry per `publish`, whatever the handlers do
pub struct InMemoryEventBus {
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
    history: Mutex<EventHistory>,
    options: RwLock<BusOptions>,
    clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("subscribers", &self.subscriber_names())
            .field("history", &self.ring().len())
            .field("options", &self.options())
            .finish()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_options(BusOptions::default())
    }

    pub fn with_options(options: BusOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Bus stamping history entries with `clock`.
    pub fn with_clock(options: BusOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: Mutex::new(EventHistory::new(options.max_history)),
            options: RwLock::new(options),
            clock,
        }
    }

    fn ring(&self) -> MutexGuard<'_, EventHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscriber_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|s| s.name().to_string()).collect()
    }

    /// Registers `subscriber` unless one with the same name exists.
    /// Returns whether it was added.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if subscribers.iter().any(|s| s.name() == subscriber.name()) {
            return false;
        }

        tracing::info!(
            subscriber = subscriber.name(),
            interests = ?subscriber.interests(),
            "subscriber registered"
        );
        subscribers.push(subscriber);
        true
    }

    /// Removes the subscriber named `name`. Unknown names are a no-op.
    pub fn unsubscribe(&self, name: &str) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|s| s.name() != name);
        let removed = subscribers.len() < before;
        if removed {
            tracing::info!(subscriber = name, "subscriber removed");
        }
        removed
    }

    pub fn unsubscribe_all(&self) {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let count = subscribers.len();
        subscribers.clear();
        tracing::info!(count, "all subscribers removed");
    }

    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        self.snapshot()
            .iter()
            .map(|s| SubscriberInfo {
                name: s.name().to_string(),
                interests: s.interests(),
            })
            .collect()
    }

    /// Publishes `name` with `payload`. See [`EventPublisher::publish`].
    pub fn emit(&self, name: &str, payload: Attributes) -> EngineResult<Uuid> {
        self.dispatch(DomainEvent::new(name, payload))
    }

    fn dispatch(&self, event: DomainEvent) -> EngineResult<Uuid> {
        let options = self.options();
        let subscribers = self.snapshot();

        if options.log_events {
            tracing::info!(
                event = %event.name,
                entity = event.entity(),
                data_keys = ?event.payload.keys().collect::<Vec<_>>(),
                "event published"
            );
        }

        let mut notified = Vec::new();
        let mut failure = None;

        for subscriber in &subscribers {
            if !is_interested(&subscriber.interests(), &event.name) {
                continue;
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| {
                subscriber.handle(&event.name, &event.payload)
            }));
            let reason = match outcome {
                Ok(Ok(())) => {
                    tracing::debug!(subscriber = subscriber.name(), event = %event.name, "subscriber notified");
                    notified.push(subscriber.name().to_string());
                    continue;
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };

            tracing::error!(
                subscriber = subscriber.name(),
                event = %event.name,
                error = %reason,
                "subscriber failed"
            );
            if !options.skip_invalid {
                failure = Some(EngineError::HandlerFailure {
                    subscriber: subscriber.name().to_string(),
                    event: event.name.clone(),
                    reason,
                });
                break;
            }
        }

        let event_id = Uuid::now_v7();
        let notified_count = notified.len();
        self.ring().push(EventHistoryEntry {
            event_id,
            event: event.name.clone(),
            payload: event.payload,
            timestamp: self.clock.now(),
            notified,
        });

        if options.log_events {
            tracing::info!(
                event = %event.name,
                %event_id,
                subscribers_notified = notified_count,
                total_subscribers = subscribers.len(),
                "event delivery finished"
            );
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(event_id),
        }
    }

    /// Most recent `limit` history entries, oldest first; everything for
    /// `None` or `Some(0)`.
    pub fn history(&self, limit: Option<usize>) -> Vec<EventHistoryEntry> {
        self.ring().recent(limit)
    }

    pub fn clear_history(&self) {
        self.ring().clear();
        tracing::info!("event history cleared");
    }

    pub fn stats(&self) -> BusStats {
        let history = self.ring();
        BusStats {
            total_subscribers: self.snapshot().len(),
            total_events_fired: history.len(),
            event_counts: history.counts(),
            most_fired_event: history.most_fired(),
            options: self.options(),
        }
    }

    pub fn options(&self) -> BusOptions {
        *self.options.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the options. A smaller `max_history` evicts the oldest
    /// entries immediately.
    pub fn configure(&self, options: BusOptions) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = options;
        self.ring().set_capacity(options.max_history);
        tracing::info!(?options, "event bus configured");
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: DomainEvent) -> EngineResult<Uuid> {
        self.dispatch(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::FnSubscriber;
    use chrono::{TimeZone, Utc};
    use closet_core::FixedClock;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(name: &str, interests: &[&str], hits: Arc<AtomicUsize>) -> Arc<dyn Subscriber> {
        Arc::new(FnSubscriber::new(name, interests, move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
    }

    fn payload(value: serde_json::Value) -> Attributes {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn publish_without_subscribers_records_entry() {
        let bus = InMemoryEventBus::new();
        let id = bus.emit("item.created", payload(json!({"item_id": 1}))).unwrap();

        let history = bus.history(None);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_id, id);
        assert_eq!(history[0].event, "item.created");
        assert!(history[0].notified.is_empty());
    }

    #[test]
    fn only_matching_subscribers_run() {
        let bus = InMemoryEventBus::new();
        let items = Arc::new(AtomicUsize::new(0));
        let budgets = Arc::new(AtomicUsize::new(0));
        let all = Arc::new(AtomicUsize::new(0));
        bus.subscribe(counting("items", &["item.*"], items.clone()));
        bus.subscribe(counting("budgets", &["budget.*"], budgets.clone()));
        bus.subscribe(counting("all", &[], all.clone()));

        bus.emit("item.worn", Attributes::new()).unwrap();

        assert_eq!(items.load(Ordering::SeqCst), 1);
        assert_eq!(budgets.load(Ordering::SeqCst), 0);
        assert_eq!(all.load(Ordering::SeqCst), 1);
        assert_eq!(bus.history(None)[0].notified, vec!["items", "all"]);
    }

    #[test]
    fn subscribe_is_idempotent_by_name() {
        let bus = InMemoryEventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        assert!(bus.subscribe(counting("dup", &[], hits.clone())));
        assert!(!bus.subscribe(counting("dup", &[], hits.clone())));

        bus.emit("x", Attributes::new()).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscribers().len(), 1);
    }

    #[test]
    fn failing_and_panicking_handlers_are_isolated() {
        let bus = InMemoryEventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(FnSubscriber::new("broken", &[], |_, _| {
            anyhow::bail!("boom")
        })));
        bus.subscribe(Arc::new(FnSubscriber::new("panicky", &[], |_, _| {
            panic!("handler exploded")
        })));
        bus.subscribe(counting("healthy", &[], hits.clone()));

        bus.emit("item.created", Attributes::new()).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let entry = &bus.history(None)[0];
        assert_eq!(entry.notified, vec!["healthy"]);
    }

    #[test]
    fn strict_mode_stops_and_reports_failure() {
        let bus = InMemoryEventBus::with_options(BusOptions {
            skip_invalid: false,
            ..BusOptions::default()
        });
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(FnSubscriber::new("broken", &[], |_, _| {
            anyhow::bail!("missing item_id")
        })));
        bus.subscribe(counting("after", &[], hits.clone()));

        let err = bus.emit("item.created", Attributes::new()).unwrap_err();
        match err {
            EngineError::HandlerFailure { subscriber, event, reason } => {
                assert_eq!(subscriber, "broken");
                assert_eq!(event, "item.created");
                assert!(reason.contains("missing item_id"));
            }
            other => panic!("expected HandlerFailure, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.history(None).len(), 1);
    }

    #[test]
    fn handlers_may_unsubscribe_during_delivery() {
        let bus = Arc::new(InMemoryEventBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe(Arc::new(FnSubscriber::new("once", &[], move |_, _| {
            inner.unsubscribe("once");
            Ok(())
        })));

        bus.emit("a", Attributes::new()).unwrap();
        bus.emit("b", Attributes::new()).unwrap();

        let history = bus.history(None);
        assert_eq!(history[0].notified, vec!["once"]);
        assert!(history[1].notified.is_empty());
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let bus = InMemoryEventBus::new();
        assert!(!bus.unsubscribe("ghost"));
        bus.subscribe(counting("a", &[], Arc::new(AtomicUsize::new(0))));
        bus.subscribe(counting("b", &[], Arc::new(AtomicUsize::new(0))));
        bus.unsubscribe_all();
        assert!(bus.subscribers().is_empty());
    }

    #[test]
    fn reducing_max_history_evicts_immediately() {
        let bus = InMemoryEventBus::new();
        for i in 0..5 {
            bus.emit(&format!("e{i}"), Attributes::new()).unwrap();
        }
        bus.configure(BusOptions {
            max_history: 2,
            ..bus.options()
        });
        let names: Vec<_> = bus.history(None).into_iter().map(|e| e.event).collect();
        assert_eq!(names, vec!["e3", "e4"]);
    }

    #[test]
    fn stats_summarise_history() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let bus = InMemoryEventBus::with_clock(BusOptions::default(), Arc::new(FixedClock::new(at)));
        bus.subscribe(counting("all", &[], Arc::new(AtomicUsize::new(0))));
        bus.emit("item.worn", Attributes::new()).unwrap();
        bus.emit("item.created", Attributes::new()).unwrap();
        bus.emit("item.worn", Attributes::new()).unwrap();

        let stats = bus.stats();
        assert_eq!(stats.total_subscribers, 1);
        assert_eq!(stats.total_events_fired, 3);
        assert_eq!(stats.event_counts["item.worn"], 2);
        assert_eq!(stats.most_fired_event.as_deref(), Some("item.worn"));
        assert_eq!(bus.history(Some(1))[0].timestamp, at);

        bus.clear_history();
        assert_eq!(bus.stats().total_events_fired, 0);
    }

    #[test]
    fn publisher_trait_works_through_arc() {
        let bus = Arc::new(InMemoryEventBus::new());
        let publisher: Arc<dyn EventPublisher> = bus.clone();
        publisher.publish(DomainEvent::named("purchase.made")).unwrap();
        assert_eq!(bus.history(None)[0].event, "purchase.made");
    }

    #[test]
    fn options_reject_unknown_keys() {
        let parsed: Result<BusOptions, _> = serde_json::from_value(json!({"max_history": 5, "async": true}));
        assert!(parsed.is_err());
        let parsed: BusOptions = serde_json::from_value(json!({"max_history": 5})).unwrap();
        assert_eq!(parsed.max_history, 5);
        assert!(parsed.skip_invalid);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// One entry per publish, bounded by `max_history`.
        #[test]
        fn one_entry_per_publish(max_history in 1usize..16, publishes in 0usize..40) {
            let bus = InMemoryEventBus::with_options(BusOptions {
                log_events: false,
                max_history,
                skip_invalid: true,
            });
            bus.subscribe(Arc::new(FnSubscriber::new("flaky", &[], |event, _| {
                if event.ends_with('3') { anyhow::bail!("unlucky") } else { Ok(()) }
            })));

            for i in 0..publishes {
                bus.emit(&format!("event.{i}"), Attributes::new()).unwrap();
            }
            prop_assert_eq!(bus.stats().total_events_fired, publishes.min(max_history));
        }
    }
}
