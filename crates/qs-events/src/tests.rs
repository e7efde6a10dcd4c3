//! Unit tests for qs-events.

#[cfg(test)]
mod bus {
    use std::sync::{Arc, Mutex};

    use qs_core::{AgentId, LinkId, Tick};

    use crate::{Event, EventBus, EventKind, EventLog, EventSubscriber, SubscriberId};

    /// Records `(subscriber tag, event kind)` into a shared trace.
    struct Tagged {
        tag:   u8,
        trace: Arc<Mutex<Vec<(u8, EventKind)>>>,
        ends:  u32,
    }

    impl EventSubscriber for Tagged {
        fn handle(&mut self, event: &Event) {
            self.trace.lock().unwrap().push((self.tag, event.kind));
        }

        fn on_interval_end(&mut self, _tick: Tick) {
            self.ends += 1;
        }
    }

    #[test]
    fn dispatch_in_registration_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let a = bus.subscribe(Tagged { tag: 1, trace: trace.clone(), ends: 0 });
        let b = bus.subscribe(Tagged { tag: 2, trace: trace.clone(), ends: 0 });
        assert_eq!((a, b), (SubscriberId(0), SubscriberId(1)));

        bus.emit_all(&[
            Event::left(Tick(3), AgentId(0), LinkId(1)),
            Event::entered(Tick(3), AgentId(0), LinkId(2)),
        ]);
        assert_eq!(
            *trace.lock().unwrap(),
            vec![
                (1, EventKind::LinkLeft),
                (2, EventKind::LinkLeft),
                (1, EventKind::LinkEntered),
                (2, EventKind::LinkEntered),
            ]
        );
        assert_eq!(bus.emitted(), 2);
    }

    #[test]
    fn shared_handle_sees_events() {
        let log = Arc::new(Mutex::new(EventLog::new()));
        let mut bus = EventBus::new();
        bus.subscribe(log.clone());
        bus.emit(&Event::stuck(Tick(9), AgentId(4), LinkId(0)));
        bus.end_interval(Tick(9));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn poisoned_handle_still_receives() {
        let log = Arc::new(Mutex::new(EventLog::new()));
        let held = log.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            panic!("subscriber owner panicked");
        })
        .join();
        assert!(panicked.is_err());
        assert!(log.is_poisoned());

        let mut bus = EventBus::new();
        bus.subscribe(log.clone());
        bus.emit(&Event::stuck(Tick(9), AgentId(4), LinkId(0)));
        let len = log.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len();
        assert_eq!(len, 1);
    }
}

#[cfg(test)]
mod log {
    use qs_core::{AgentId, LinkId, Tick};

    use crate::{Event, EventKind, EventLog};

    #[test]
    fn queries_preserve_order() {
        let mut log = EventLog::new();
        log.push(Event::departed(Tick(0), AgentId(0), LinkId(0)));
        log.push(Event::entered(Tick(0), AgentId(0), LinkId(0)));
        log.push(Event::entered(Tick(1), AgentId(1), LinkId(0)));
        log.push(Event::left(Tick(10), AgentId(0), LinkId(0)));
        log.push(Event::arrived(Tick(10), AgentId(0), LinkId(0)));

        assert_eq!(log.count(EventKind::LinkEntered), 2);
        let kinds: Vec<_> = log.for_agent(AgentId(0)).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [EventKind::Departed, EventKind::LinkEntered, EventKind::LinkLeft, EventKind::Arrived]
        );
        assert_eq!(log.on_link(LinkId(0)).count(), 5);
    }

    #[test]
    fn display() {
        let e = Event::entered(Tick(4), AgentId(2), LinkId(1));
        assert_eq!(e.to_string(), "T4 linkEntered AgentId(2) LinkId(1)");
    }
}
