use std::fmt::Debug;

/// An event carried by an [`EventBus`]. Subscribers register per kind.
pub trait BusEvent {
    type Kind: Copy + PartialEq + Debug;

    fn kind(&self) -> Self::Kind;
}

pub type EventHandler<E, C> = fn(&mut C, &E);

/// Gives the bus access to the context it is stored in.
pub trait EventContext<E: BusEvent>: Sized {
    fn bus(&self) -> &EventBus<E, Self>;
}

/// Synchronous publish/subscribe.
///
/// `emit` runs every subscriber of the event's kind, in subscription order,
/// before it returns. Handlers receive the whole context and may emit
/// further events; those are delivered depth-first.
pub struct EventBus<E: BusEvent, C> {
    subscribers: Vec<(E::Kind, EventHandler<E, C>)>,
}

impl<E: BusEvent, C> Default for EventBus<E, C> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<E: BusEvent, C> std::fmt::Debug for EventBus<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}

impl<E: BusEvent, C: EventContext<E>> EventBus<E, C> {
    pub fn subscribe(&mut self, kind: E::Kind, handler: EventHandler<E, C>) {
        self.subscribers.push((kind, handler));
    }

    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.subscribers
            .iter()
            .filter(|(subscribed, _)| *subscribed == kind)
            .count()
    }

    pub fn emit(context: &mut C, event: E) {
        let kind = event.kind();
        let mut index = 0;
        loop {
            let handler = {
                let subscribers = &context.bus().subscribers;
                match subscribers.get(index) {
                    Some((subscribed, handler)) => (*subscribed == kind).then_some(*handler),
                    None => break,
                }
            };
            if let Some(handler) = handler {
                handler(context, &event);
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum TestKind {
        Ping,
        Pong,
    }

    #[derive(Debug)]
    enum TestEvent {
        Ping(u32),
        Pong(u32),
    }

    impl BusEvent for TestEvent {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                TestEvent::Ping(_) => TestKind::Ping,
                TestEvent::Pong(_) => TestKind::Pong,
            }
        }
    }

    #[derive(Default)]
    struct Context {
        bus: EventBus<TestEvent, Context>,
        log: Vec<String>,
    }

    impl EventContext<TestEvent> for Context {
        fn bus(&self) -> &EventBus<TestEvent, Self> {
            &self.bus
        }
    }

    fn first(context: &mut Context, event: &TestEvent) {
        if let TestEvent::Ping(value) = event {
            context.log.push(format!("first:{value}"));
            EventBus::emit(context, TestEvent::Pong(*value + 1));
        }
    }

    fn second(context: &mut Context, event: &TestEvent) {
        if let TestEvent::Ping(value) = event {
            context.log.push(format!("second:{value}"));
        }
    }

    fn pong(context: &mut Context, event: &TestEvent) {
        if let TestEvent::Pong(value) = event {
            context.log.push(format!("pong:{value}"));
        }
    }

    #[test]
    fn handlers_run_in_subscription_order_before_emit_returns() {
        let mut context = Context::default();
        context.bus.subscribe(TestKind::Ping, first);
        context.bus.subscribe(TestKind::Ping, second);
        context.bus.subscribe(TestKind::Pong, pong);

        EventBus::emit(&mut context, TestEvent::Ping(1));

        assert_eq!(context.log, vec!["first:1", "pong:2", "second:1"]);
    }

    #[test]
    fn events_without_subscribers_are_dropped() {
        let mut context = Context::default();
        context.bus.subscribe(TestKind::Ping, second);
        EventBus::emit(&mut context, TestEvent::Pong(5));
        assert!(context.log.is_empty());
        assert_eq!(context.bus.subscriber_count(TestKind::Ping), 1);
        assert_eq!(context.bus.subscriber_count(TestKind::Pong), 0);
    }
}
