use serde::Serialize;

use closet_core::Attributes;

/// A named handler for domain events.
///
/// Handlers run synchronously on the publishing thread. A handler that returns
/// an error or panics is isolated by the bus; other subscribers still run.
pub trait Subscriber: Send + Sync {
    /// Stable name. The bus keeps at most one subscriber per name.
    fn name(&self) -> &str;

    /// Exact event names or glob patterns (`item.*`). Empty means every event.
    fn interests(&self) -> Vec<String>;

    fn handle(&self, event: &str, payload: &Attributes) -> anyhow::Result<()>;
}

type Handler = Box<dyn Fn(&str, &Attributes) -> anyhow::Result<()> + Send + Sync>;

/// Subscriber backed by a closure.
pub struct FnSubscriber {
    name: String,
    interests: Vec<String>,
    handler: Handler,
}

impl FnSubscriber {
    pub fn new<F>(name: impl Into<String>, interests: &[&str], handler: F) -> Self
    where
        F: Fn(&str, &Attributes) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            handler: Box::new(handler),
        }
    }
}

impl core::fmt::Debug for FnSubscriber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnSubscriber")
            .field("name", &self.name)
            .field("interests", &self.interests)
            .finish_non_exhaustive()
    }
}

impl Subscriber for FnSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn interests(&self) -> Vec<String> {
        self.interests.clone()
    }

    fn handle(&self, event: &str, payload: &Attributes) -> anyhow::Result<()> {
        (self.handler)(event, payload)
    }
}

/// Listing view of a registered subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberInfo {
    pub name: String,
    pub interests: Vec<String>,
}
