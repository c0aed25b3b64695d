#![forbid(unsafe_code)]

//! Logging policy: every engine event goes to an `fpop.*` target with
//! structured fields, and diagnostics surface at warn/error.
//!
//! Run:
//!   cargo test -p fpop-runtime --test tracing_targets

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fpop_core::{Params, PopupEvent};
use fpop_runtime::Popup;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_events(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

#[test]
fn engine_events_use_fpop_targets() {
    let events = with_captured_events(|| {
        let mut popup = Popup::new();
        popup.fire(Params::new().title("x").timer(10));
        popup.dispatch(PopupEvent::Visibility(false));
        popup.dispatch(PopupEvent::Visibility(true));
        popup.click_confirm();
    });
    assert!(!events.is_empty());
    for event in &events {
        assert!(
            event.target.starts_with("fpop."),
            "unexpected target {} for {:?}",
            event.target,
            event.message()
        );
    }
}

#[test]
fn lifecycle_transitions_carry_instance_and_phase() {
    let events = with_captured_events(|| {
        let mut popup = Popup::new();
        popup.fire(Params::new());
        popup.close(None);
    });
    let phases: Vec<&str> = events
        .iter()
        .filter(|e| e.target == "fpop.lifecycle" && e.message() == "phase")
        .map(|e| {
            assert_eq!(e.fields.get("instance").map(String::as_str), Some("#1"));
            e.fields["phase"].as_str()
        })
        .collect();
    assert_eq!(phases, vec!["open", "resolving", "closing", "closed"]);
}

#[test]
fn diagnostics_are_logged_at_warn_and_error() {
    let events = with_captured_events(|| {
        let mut popup = Popup::new();
        popup.fire_json(r#"{"bogus": 1}"#).unwrap();
        popup.fire_json(r#"["t", 7]"#).unwrap();
        popup.update(Params::new().timer(5));
        popup.fire(Params::new().on_open(|_| Err("nope".into())));
    });
    let at = |target: &str, level: tracing::Level| {
        events
            .iter()
            .filter(|e| e.target == target && e.level == level)
            .map(|e| e.message().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(
        at("fpop.params", tracing::Level::WARN),
        vec![
            "Unknown parameter \"bogus\"".to_string(),
            "Invalid parameter to update: \"timer\"".to_string(),
        ]
    );
    assert_eq!(at("fpop.params", tracing::Level::ERROR).len(), 1);
    assert_eq!(
        at("fpop.hooks", tracing::Level::WARN),
        vec!["onOpen failed: nope".to_string()]
    );
}
