//! Dispatch-order, cancellation, phase and failure semantics of a single bus.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use eventvisor::{
    Event, EventBus, EventInfo, EventRegistry, EventState, EventType, ListenerEntry, Priority,
};

static TICK: EventInfo = EventInfo::new("TickEvent").cancelable();

struct TickEvent {
    state: EventState,
}

impl TickEvent {
    fn new() -> Self {
        Self {
            state: EventState::new(),
        }
    }
}

impl Event for TickEvent {
    fn event_type(&self) -> EventType {
        EventType::new(&TICK)
    }
    fn state(&self) -> &EventState {
        &self.state
    }
    fn state_mut(&mut self) -> &mut EventState {
        &mut self.state
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn isolated_bus() -> EventBus {
    match EventBus::builder().with_registry(EventRegistry::new()).build() {
        Ok(bus) => bus,
        Err(err) => panic!("default builder config must be valid: {err}"),
    }
}

type Probe = Arc<Mutex<Vec<String>>>;

fn probing_listener(
    probe: &Probe,
    name: &'static str,
) -> impl Fn(&mut dyn Event) -> Result<(), eventvisor::ListenerError> + Send + Sync + 'static {
    let probe = Arc::clone(probe);
    move |event| {
        let phase = match event.phase() {
            Some(p) => p.to_string(),
            None => "none".into(),
        };
        probe.lock().push(format!("{name}@{phase}"));
        Ok(())
    }
}

#[test]
fn test_listeners_run_highest_to_lowest_with_phases() {
    let bus = isolated_bus();
    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    let ty = EventType::new(&TICK);

    // Registration order deliberately differs from priority order.
    bus.add_listener_at(ty, Priority::Normal, probing_listener(&probe, "normal"))
        .unwrap();
    bus.add_listener_at(ty, Priority::High, probing_listener(&probe, "high"))
        .unwrap();
    bus.add_listener_at(ty, Priority::High, probing_listener(&probe, "high2"))
        .unwrap();

    let mut event = TickEvent::new();
    assert!(!bus.post(&mut event).unwrap());

    assert_eq!(
        *probe.lock(),
        vec!["high@high", "high2@high", "normal@normal"]
    );
    // The event keeps the last phase that dispatched.
    assert_eq!(event.state().phase(), Some(Priority::Normal));
}

#[test]
fn test_post_reports_cancellation() {
    let bus = isolated_bus();
    let ty = EventType::new(&TICK);
    bus.add_listener(ty, |event| {
        event.set_canceled(true);
        Ok(())
    })
    .unwrap();

    let mut event = TickEvent::new();
    assert!(bus.post(&mut event).unwrap());
    assert!(event.state().is_canceled());
}

#[test]
fn test_canceled_events_skip_listeners_unless_opted_in() {
    let bus = isolated_bus();
    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    let ty = EventType::new(&TICK);

    bus.add_listener_at(ty, Priority::Highest, |event| {
        event.set_canceled(true);
        Ok(())
    })
    .unwrap();
    bus.add_listener_at(ty, Priority::Normal, probing_listener(&probe, "default"))
        .unwrap();
    bus.add_listener_with(
        ty,
        Priority::Low,
        true,
        probing_listener(&probe, "opted-in"),
    )
    .unwrap();

    assert!(bus.post(&mut TickEvent::new()).unwrap());
    assert_eq!(*probe.lock(), vec!["opted-in@low"]);
}

#[test]
fn test_phase_tracking_can_be_disabled() {
    let bus = EventBus::builder()
        .with_registry(EventRegistry::new())
        .with_track_phases(false)
        .build()
        .unwrap();
    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    bus.add_listener(EventType::new(&TICK), probing_listener(&probe, "l"))
        .unwrap();

    let mut event = TickEvent::new();
    bus.post(&mut event).unwrap();
    assert_eq!(*probe.lock(), vec!["l@none"]);
    assert_eq!(event.state().phase(), None);
}

#[test]
fn test_shutdown_bus_ignores_posts_until_started() {
    let bus = isolated_bus();
    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    bus.add_listener(EventType::new(&TICK), probing_listener(&probe, "l"))
        .unwrap();

    bus.shutdown();
    assert!(bus.is_shutdown());
    assert!(!bus.post(&mut TickEvent::new()).unwrap());
    assert!(probe.lock().is_empty());

    bus.start();
    bus.post(&mut TickEvent::new()).unwrap();
    assert_eq!(probe.lock().len(), 1);
}

#[test]
fn test_bus_built_shut_down_delivers_nothing() {
    let bus = EventBus::builder()
        .with_registry(EventRegistry::new())
        .start_shutdown()
        .build()
        .unwrap();
    assert!(bus.is_shutdown());
    assert!(!bus.post(&mut TickEvent::new()).unwrap());
}

#[test]
fn test_listener_failure_is_fail_fast_and_reported() {
    let seen: Arc<Mutex<Option<(usize, usize, String)>>> = Arc::new(Mutex::new(None));
    let handler_seen = Arc::clone(&seen);
    let bus = EventBus::builder()
        .with_registry(EventRegistry::new())
        .with_exception_handler(Arc::new(
            move |_bus, _event, entries: &[ListenerEntry], index, error| {
                *handler_seen.lock() = Some((index, entries.len(), error.to_string()));
            },
        ))
        .build()
        .unwrap();

    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    let ty = EventType::new(&TICK);
    bus.add_listener_at(ty, Priority::Highest, probing_listener(&probe, "first"))
        .unwrap();
    bus.add_listener_at(ty, Priority::Normal, |_| Err("boom".into()))
        .unwrap();
    bus.add_listener_at(ty, Priority::Lowest, probing_listener(&probe, "third"))
        .unwrap();

    let err = bus.post(&mut TickEvent::new()).unwrap_err();
    assert_eq!(err.as_label(), "post_listener_failed");

    // Only the listener before the failure ran.
    assert_eq!(*probe.lock(), vec!["first@highest"]);

    // Snapshot: [marker, first, marker, failing, marker, third].
    let (index, entries, message) = seen.lock().take().unwrap();
    assert_eq!(index, 3);
    assert_eq!(entries, 6);
    assert_eq!(message, "boom");
}

#[test]
fn test_default_handler_propagates_the_error() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let bus = isolated_bus();
    bus.add_listener(EventType::new(&TICK), |_| Err("kaput".into()))
        .unwrap();

    // The default handler only logs; the original error reaches the poster.
    let err = bus.post(&mut TickEvent::new()).unwrap_err();
    let inner = err.into_listener_error().unwrap();
    assert_eq!(inner.to_string(), "kaput");
}

#[test]
fn test_post_with_wraps_every_invocation() {
    let bus = isolated_bus();
    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    let ty = EventType::new(&TICK);
    bus.add_listener_at(ty, Priority::High, probing_listener(&probe, "a"))
        .unwrap();
    bus.add_listener_at(ty, Priority::Low, probing_listener(&probe, "b"))
        .unwrap();

    let wrapped = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&wrapped);
    bus.post_with(&mut TickEvent::new(), |listener, event| {
        *counter.lock() += 1;
        listener.invoke(event)
    })
    .unwrap();

    assert_eq!(*wrapped.lock(), 2);
    assert_eq!(*probe.lock(), vec!["a@high", "b@low"]);
}

#[test]
fn test_listener_added_mid_post_not_seen_by_that_post() {
    let bus = Arc::new(isolated_bus());
    let probe: Probe = Arc::new(Mutex::new(Vec::new()));
    let ty = EventType::new(&TICK);

    let inner_bus = Arc::clone(&bus);
    let inner_probe = Arc::clone(&probe);
    bus.add_listener_at(ty, Priority::Highest, move |_| {
        inner_bus
            .add_listener_at(ty, Priority::Lowest, probing_listener(&inner_probe, "late"))
            .map(|_| ())
            .map_err(Into::into)
    })
    .unwrap();

    bus.post(&mut TickEvent::new()).unwrap();
    assert!(probe.lock().is_empty());

    // The next post uses the rebuilt snapshot and sees it.
    bus.post(&mut TickEvent::new()).unwrap();
    assert_eq!(*probe.lock(), vec!["late@lowest"]);
}
