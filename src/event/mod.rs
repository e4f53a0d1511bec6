mod bus;
mod events;

pub use bus::{EventBus, SubscriptionId};
pub use events::*;

pub trait EventHandler {
    fn handle_event(&mut self, event: &ErasingEvent<'_>, control: &mut EventControl);
}

impl<F> EventHandler for F
where
    F: FnMut(&ErasingEvent<'_>, &mut EventControl),
{
    fn handle_event(&mut self, event: &ErasingEvent<'_>, control: &mut EventControl) {
        self(event, control)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in ["first", "second"] {
            let log = Rc::clone(&log);
            bus.subscribe(ErasingPhase::Cancel, move |_, _| log.borrow_mut().push(name));
        }
        bus.emit(&ErasingEvent::Cancel);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_cancel_cannot_be_prevented() {
        let bus = EventBus::new();
        bus.subscribe(ErasingPhase::Cancel, |_, control| control.prevent_default());
        bus.subscribe(ErasingPhase::Redraw, |_, control| control.prevent_default());
        assert!(!bus.emit(&ErasingEvent::Cancel).default_prevented());
        assert!(bus.emit(&ErasingEvent::Redraw(RedrawKind::Start)).default_prevented());
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let id = bus.subscribe(ErasingPhase::Redraw, |_, control| control.prevent_default());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.handler_count(ErasingPhase::Redraw), 0);
        assert!(!bus.emit(&ErasingEvent::Redraw(RedrawKind::Render)).default_prevented());
    }

    #[test]
    fn test_handlers_can_change_subscriptions_while_dispatching() {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let own_id = Rc::new(RefCell::new(None));
        let id = {
            let bus_handle = Rc::clone(&bus);
            let log = Rc::clone(&log);
            let own_id = Rc::clone(&own_id);
            bus.subscribe(ErasingPhase::Cancel, move |_, _| {
                log.borrow_mut().push("once");
                if let Some(id) = own_id.borrow_mut().take() {
                    bus_handle.unsubscribe(id);
                }
                let log = Rc::clone(&log);
                bus_handle.subscribe(ErasingPhase::Cancel, move |_, _| log.borrow_mut().push("late"));
            })
        };
        *own_id.borrow_mut() = Some(id);

        bus.emit(&ErasingEvent::Cancel);
        assert_eq!(*log.borrow(), vec!["once"]);
        assert_eq!(bus.handler_count(ErasingPhase::Cancel), 1);

        bus.emit(&ErasingEvent::Cancel);
        assert_eq!(*log.borrow(), vec!["once", "late"]);
    }
}
