//! Domain event bus.
//!
//! In-process, synchronous publish/subscribe for `<entity>.<verb>` events, with
//! glob interest matching and a bounded history of what was published.

pub mod bus;
pub mod event;
pub mod history;
pub mod in_memory_bus;
pub mod observers;
pub mod pattern;
pub mod subscriber;

pub use bus::EventPublisher;
pub use event::{DomainEvent, names};
pub use history::{EventHistory, EventHistoryEntry};
pub use in_memory_bus::{BusOptions, BusStats, InMemoryEventBus};
pub use observers::{BudgetObserver, ItemObserver};
pub use pattern::{glob_match, is_interested};
pub use subscriber::{FnSubscriber, Subscriber, SubscriberInfo};
