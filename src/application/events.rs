use crate::error::Result;
use std::collections::HashMap;
use uuid::Uuid;

/// State changes worth announcing to the rest of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    PaymentConfirmed {
        transaction_id: String,
        order_id: Uuid,
    },
    PaymentRejected {
        transaction_id: String,
    },
    OrderPlaced {
        order_id: Uuid,
        brand_ids: Vec<i32>,
    },
    OrderSent {
        order_id: Uuid,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PaymentConfirmed,
    PaymentRejected,
    OrderPlaced,
    OrderSent,
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::PaymentConfirmed { .. } => EventKind::PaymentConfirmed,
            DomainEvent::PaymentRejected { .. } => EventKind::PaymentRejected,
            DomainEvent::OrderPlaced { .. } => EventKind::OrderPlaced,
            DomainEvent::OrderSent { .. } => EventKind::OrderSent,
        }
    }
}

pub type EventHandler = Box<dyn Fn(&DomainEvent) -> Result<()> + Send + Sync>;

/// Publish/subscribe registry mapping an event kind to an ordered list of
/// handlers.
///
/// An explicit value owned by the composition root and injected where
/// needed; there is no global registry. Handlers run synchronously in
/// registration order and a handler error propagates straight to the
/// dispatch caller, with no isolation between handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `kind`.
    pub fn register<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&DomainEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Invokes every handler registered for the event's kind, in
    /// registration order. The first handler error aborts the remainder.
    pub fn dispatch(&self, event: &DomainEvent) -> Result<()> {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler(event)?;
            }
        }
        Ok(())
    }
}
