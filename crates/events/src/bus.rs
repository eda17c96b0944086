//! Event publishing abstraction.
//!
//! Orchestration code depends on [`EventPublisher`] rather than on a concrete
//! bus, so tests can substitute a recording publisher and the in-memory bus can
//! be shared behind an `Arc`.
//!
//! ## Delivery
//!
//! - **Synchronous**: `publish` returns after every matching handler has run.
//! - **In-process only**: no persistence of undelivered events, no retries.
//! - **Isolated failures**: a failing subscriber does not stop the others
//!   unless the bus is configured with `skip_invalid: false`.

use std::sync::Arc;

use uuid::Uuid;

use closet_core::EngineResult;

use crate::event::DomainEvent;

/// Publishes domain events to interested subscribers.
///
/// Returns the id of the history entry recorded for the publication.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent) -> EngineResult<Uuid>;
}

impl<B> EventPublisher for Arc<B>
where
    B: EventPublisher + ?Sized,
{
    fn publish(&self, event: DomainEvent) -> EngineResult<Uuid> {
        (**self).publish(event)
    }
}
