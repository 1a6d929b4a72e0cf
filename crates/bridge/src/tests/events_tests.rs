use super::*;

use std::sync::atomic::AtomicUsize;

use anyhow::anyhow;
use shared::{
    domain::{LogEntry, LogLevel, RefreshState, WindowState},
    protocol::channels,
};

fn log_event(message: &str) -> BridgeEvent {
    BridgeEvent::LogAppended(LogEntry::now(LogLevel::Info, message))
}

fn counting_listener(
    counter: &Arc<AtomicUsize>,
) -> impl Fn(&BridgeEvent) -> anyhow::Result<()> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_event: &BridgeEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn unsubscribing_one_listener_leaves_the_other_receiving() {
    let hub = EventHub::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let first_sub = hub.subscribe(EventKind::Log, counting_listener(&first));
    let _second_sub = hub.subscribe(EventKind::Log, counting_listener(&second));

    hub.publish(&log_event("one"));
    assert!(first_sub.unsubscribe());
    hub.publish(&log_event("two"));

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 2);
}

#[test]
fn unsubscribe_is_idempotent() {
    let hub = EventHub::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let sub = hub.subscribe(EventKind::RefreshState, counting_listener(&counter));

    assert!(sub.is_active());
    assert!(sub.unsubscribe());
    assert!(!sub.unsubscribe());
    assert!(!sub.is_active());
    assert_eq!(hub.listener_count(channels::REFRESH_STATE), 0);
    assert_eq!(hub.listener_count(channels::REFRESH_STATE_LEGACY), 0);
}

#[test]
fn failing_listener_does_not_block_other_listeners() {
    let hub = EventHub::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let _failing = hub.subscribe(EventKind::Log, |_event| Err(anyhow!("listener broke")));
    let _counting = hub.subscribe(EventKind::Log, counting_listener(&counter));

    let report = hub.publish(&log_event("first"));
    assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });

    hub.publish(&log_event("second"));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn panicking_listener_is_contained() {
    let hub = EventHub::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let _panicking = hub.subscribe(EventKind::WindowState, |_event| {
        panic!("listener exploded");
    });
    let _counting = hub.subscribe(EventKind::WindowState, counting_listener(&counter));

    let event = BridgeEvent::WindowStateChanged(WindowState::Maximized);
    let report = hub.publish(&event);
    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 1);

    hub.publish(&event);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn aliased_channels_deliver_once_per_physical_event() {
    let hub = EventHub::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let _sub = hub.subscribe(EventKind::Log, counting_listener(&counter));

    assert_eq!(hub.listener_count(channels::LOG_APPEND), 1);
    assert_eq!(hub.listener_count(channels::LOG_APPEND_LEGACY), 1);

    let event = log_event("twice");
    hub.emit(channels::LOG_APPEND, &event);
    hub.emit(channels::LOG_APPEND_LEGACY, &event);

    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn events_on_a_mismatched_channel_are_dropped() {
    let hub = EventHub::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let _sub = hub.subscribe(EventKind::Log, counting_listener(&counter));

    let report = hub.emit(
        channels::LOG_APPEND,
        &BridgeEvent::RefreshStateChanged(RefreshState::default()),
    );

    assert_eq!(report, DeliveryReport::default());
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn listener_may_unsubscribe_itself_during_delivery() {
    let hub = EventHub::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let listener_slot = Arc::clone(&slot);
    let listener_counter = Arc::clone(&counter);
    let sub = hub.subscribe(EventKind::Log, move |_event| {
        listener_counter.fetch_add(1, Ordering::SeqCst);
        if let Some(sub) = listener_slot.lock().expect("slot").as_ref() {
            sub.unsubscribe();
        }
        Ok(())
    });
    *slot.lock().expect("slot") = Some(sub);

    hub.publish(&log_event("first"));
    hub.publish(&log_event("second"));

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn subscription_outliving_hub_reports_detached() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sub = {
        let hub = EventHub::new();
        hub.subscribe(EventKind::Log, counting_listener(&counter))
    };
    assert!(!sub.unsubscribe());
}
