use std::cell::{Cell, RefCell};

use log::trace;

use crate::event::{ErasingEvent, ErasingPhase, EventControl, EventHandler};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    phase: ErasingPhase,
    /// `None` while the handler is running
    handler: Option<Box<dyn EventHandler>>,
}

/// Dispatches erasing events to the handlers registered for their phase.
///
/// Handlers run synchronously in registration order. A handler may subscribe or
/// unsubscribe while an event is dispatched: new handlers first see the next
/// event, and removed ones are not called again.
pub struct EventBus {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.subscriptions.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            subscriptions: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Subscribe a closure to one phase
    pub fn subscribe<F>(&self, phase: ErasingPhase, handler: F) -> SubscriptionId
    where
        F: FnMut(&ErasingEvent<'_>, &mut EventControl) + 'static,
    {
        self.subscribe_handler(phase, Box::new(handler))
    }

    /// Subscribe a boxed handler to one phase
    pub fn subscribe_handler(&self, phase: ErasingPhase, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            id,
            phase,
            handler: Some(handler),
        });
        id
    }

    /// Returns `false` if the subscription was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        subscriptions.len() != before
    }

    pub fn handler_count(&self, phase: ErasingPhase) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|subscription| subscription.phase == phase)
            .count()
    }

    /// Emit an event; the returned control tells whether a handler prevented the default
    pub fn emit(&self, event: &ErasingEvent<'_>) -> EventControl {
        let phase = event.phase();
        let mut control = EventControl::new(phase.is_cancelable());
        let ids: Vec<SubscriptionId> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|subscription| subscription.phase == phase)
            .map(|subscription| subscription.id)
            .collect();

        for id in ids {
            // the list is not borrowed while the handler runs
            let Some(mut handler) = self.take_handler(id) else {
                continue;
            };
            handler.handle_event(event, &mut control);
            self.restore_handler(id, handler);
        }
        trace!("{:?} dispatched, default prevented: {}", phase, control.default_prevented());
        control
    }

    fn take_handler(&self, id: SubscriptionId) -> Option<Box<dyn EventHandler>> {
        self.subscriptions
            .borrow_mut()
            .iter_mut()
            .find(|subscription| subscription.id == id)
            .and_then(|subscription| subscription.handler.take())
    }

    /// Puts a handler back unless it unsubscribed itself while running
    fn restore_handler(&self, id: SubscriptionId, handler: Box<dyn EventHandler>) {
        if let Some(subscription) = self
            .subscriptions
            .borrow_mut()
            .iter_mut()
            .find(|subscription| subscription.id == id)
        {
            subscription.handler = Some(handler);
        }
    }
}
