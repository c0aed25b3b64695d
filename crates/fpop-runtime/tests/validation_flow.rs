#![forbid(unsafe_code)]

//! Confirm-time validation: built-in checks, caller validators,
//! pre-confirm verdicts and deferred option producers.

use std::cell::RefCell;
use std::rc::Rc;

use fpop_core::params::{InputKind, InputOptions, OptionEntries, PreConfirmVerdict, Reply};
use fpop_core::{KeyCode, KeyEvent, Params, PopupEvent, PopupResult, Settler, deferred};
use fpop_dom::Region;
use fpop_runtime::Popup;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn type_into(popup: &mut Popup, text: &str) {
    let input = popup.get_input().unwrap();
    popup.document_mut().set_value(input, text);
    popup.dispatch(PopupEvent::Input(input));
}

fn message(popup: &Popup) -> Option<String> {
    let node = popup.get_validation_message()?;
    let doc = popup.document();
    (!doc.hides_itself(node)).then(|| doc.text_content(node))
}

fn aria_invalid(popup: &Popup) -> bool {
    let input = popup.get_input().unwrap();
    popup.document().attribute(input, "aria-invalid") == Some("true")
}

fn not_ok(value: &Value) -> Reply<Option<String>> {
    Reply::Ready((value.as_str() != Some("ok")).then(|| "nope".to_string()))
}

#[test]
fn sync_validator_keeps_popup_open_until_valid() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Text).input_validator(not_ok));

    type_into(&mut popup, "bad");
    popup.click_confirm();
    assert!(!outcome.is_settled());
    assert_eq!(message(&popup).as_deref(), Some("nope"));
    assert!(aria_invalid(&popup));

    type_into(&mut popup, "  ok ");
    assert_eq!(message(&popup), None);
    assert!(!aria_invalid(&popup));

    popup.click_confirm();
    assert_eq!(outcome.try_result().unwrap().to_json(), json!({"value": "ok"}));
}

#[test]
fn empty_validator_message_counts_as_valid() {
    let mut popup = Popup::new();
    let outcome = popup.fire(
        Params::new()
            .input(InputKind::Text)
            .input_validator(|_| Reply::Ready(Some(String::new()))),
    );
    popup.click_confirm();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed("")));
}

#[test]
fn auto_trim_can_be_disabled() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Text).input_auto_trim(false));
    type_into(&mut popup, " padded ");
    popup.click_confirm();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed(" padded ")));
}

#[test]
fn builtin_email_check_and_message_override() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Email));
    type_into(&mut popup, "not-an-email");
    popup.click_confirm();
    assert_eq!(message(&popup).as_deref(), Some("Invalid email address"));

    popup.update(Params::new().input(InputKind::Email));
    assert_eq!(message(&popup), None);
    assert!(popup.diagnostics().is_empty());

    let outcome2 = popup.fire(
        Params::new()
            .input(InputKind::Email)
            .validation_message("Bad!"),
    );
    assert!(outcome.is_settled());
    type_into(&mut popup, "x");
    popup.click_confirm();
    assert_eq!(message(&popup).as_deref(), Some("Bad!"));

    type_into(&mut popup, "someone@example.com");
    popup.click_confirm();
    assert_eq!(
        outcome2.try_result(),
        Some(PopupResult::confirmed("someone@example.com"))
    );
}

#[test]
fn builtin_url_check_wants_a_lowercase_top_level_label() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Url));
    type_into(&mut popup, "https://example.COM");
    popup.click_confirm();
    assert_eq!(message(&popup).as_deref(), Some("Invalid URL"));
    assert!(!outcome.is_settled());

    type_into(&mut popup, "https://example.com/docs?page=2");
    popup.click_confirm();
    assert_eq!(
        outcome.try_result(),
        Some(PopupResult::confirmed("https://example.com/docs?page=2"))
    );
}

#[test]
fn caller_validator_replaces_builtin_format_checks() {
    let mut popup = Popup::new();
    let outcome = popup.fire(
        Params::new()
            .input(InputKind::Url)
            .input_validator(|_| Reply::Ready(None)),
    );
    type_into(&mut popup, "not a url");
    popup.click_confirm();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed("not a url")));
}

#[test]
fn number_input_yields_a_number() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Number));
    type_into(&mut popup, "4.5");
    popup.click_confirm();
    assert_eq!(outcome.try_result().unwrap().to_json(), json!({"value": 4.5}));
}

#[test]
fn enter_on_text_input_confirms() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Text).input_value("hi"));
    let input = popup.get_input().unwrap();
    popup.dispatch(PopupEvent::Key(KeyEvent::new(KeyCode::Enter).with_target(input)));
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed("hi")));
}

#[test]
fn enter_on_textarea_does_not_confirm() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Textarea));
    let input = popup.get_input().unwrap();
    popup.dispatch(PopupEvent::Key(KeyEvent::new(KeyCode::Enter).with_target(input)));
    assert!(!outcome.is_settled());
}

// ============================================================================
// Deferred validation
// ============================================================================

type Settlers<T> = Rc<RefCell<Vec<Settler<T>>>>;

fn later_validator(settlers: &Settlers<Option<String>>) -> Params {
    let settlers = Rc::clone(settlers);
    Params::new()
        .input(InputKind::Text)
        .input_validator(move |_| {
            let (settler, reply) = deferred();
            settlers.borrow_mut().push(settler);
            Reply::Later(reply)
        })
}

#[test]
fn deferred_validator_marks_the_popup_busy() {
    let settlers: Settlers<Option<String>> = Rc::default();
    let mut popup = Popup::new();
    let outcome = popup.fire(later_validator(&settlers));
    type_into(&mut popup, "v");
    popup.click_confirm();

    let popup_el = popup.get_popup().unwrap();
    let confirm = popup.get_confirm_button().unwrap();
    let loader = popup.get_loader().unwrap();
    let input = popup.get_input().unwrap();
    {
        let doc = popup.document();
        assert!(popup.is_loading());
        assert_eq!(doc.attribute(popup_el, "aria-busy"), Some("true"));
        assert!(doc.is_disabled(confirm));
        assert!(doc.is_disabled(input));
        assert!(!doc.hides_itself(loader));
    }

    // Re-entry is suppressed while validating.
    popup.click_confirm();
    assert_eq!(settlers.borrow().len(), 1);

    settlers.borrow()[0].settle(Some("server says no".into()));
    popup.pump();
    assert!(!outcome.is_settled());
    assert_eq!(message(&popup).as_deref(), Some("server says no"));
    assert!(!popup.is_loading());
    assert!(!popup.document().is_disabled(input));

    popup.click_confirm();
    settlers.borrow()[1].settle(None);
    popup.pump();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed("v")));
}

#[test]
fn late_result_after_dismissal_is_discarded() {
    let settlers: Settlers<Option<String>> = Rc::default();
    let mut popup = Popup::new();
    let outcome = popup.fire(later_validator(&settlers));
    popup.click_confirm();
    popup.dispatch(PopupEvent::Key(KeyEvent::new(KeyCode::Escape)));
    assert_eq!(outcome.try_result().unwrap().to_json(), json!({"dismiss": "esc"}));

    settlers.borrow()[0].settle(None);
    popup.pump();
    assert_eq!(outcome.try_result().unwrap().to_json(), json!({"dismiss": "esc"}));
    assert!(!popup.is_visible());
}

#[test]
fn timer_expiry_wins_over_pending_validation() {
    let settlers: Settlers<Option<String>> = Rc::default();
    let mut popup = Popup::new();
    let outcome = popup.fire(later_validator(&settlers).timer(100));
    popup.click_confirm();
    popup.advance(std::time::Duration::from_millis(100));
    assert_eq!(outcome.try_result().unwrap().to_json(), json!({"dismiss": "timer"}));
}

#[test]
fn loader_replaces_confirm_when_requested() {
    let settlers: Settlers<Option<String>> = Rc::default();
    let mut popup = Popup::new();
    popup.fire(later_validator(&settlers).show_loader_on_confirm(true));
    popup.click_confirm();
    let confirm = popup.get_confirm_button().unwrap();
    assert!(popup.document().hides_itself(confirm));
    settlers.borrow()[0].settle(Some("again".into()));
    popup.pump();
    assert!(!popup.document().hides_itself(confirm));
}

// ============================================================================
// Pre-confirm
// ============================================================================

#[test]
fn pre_confirm_verdicts() {
    let mut popup = Popup::new();
    let veto = popup.fire(Params::new().pre_confirm(|_| Reply::Ready(PreConfirmVerdict::Veto)));
    popup.click_confirm();
    assert!(!veto.is_settled());
    assert!(popup.is_visible());
    assert!(!popup.is_loading());
    assert_eq!(message(&popup), None);

    let replaced = popup.fire(
        Params::new().pre_confirm(|v| Reply::Ready(PreConfirmVerdict::Replace(json!({"was": v})))),
    );
    popup.click_confirm();
    assert_eq!(
        replaced.try_result().unwrap().to_json(),
        json!({"value": {"was": true}})
    );

    let rejected = popup.fire(
        Params::new().pre_confirm(|_| Reply::Ready(PreConfirmVerdict::Reject("try later".into()))),
    );
    popup.click_confirm();
    assert!(!rejected.is_settled());
    assert_eq!(message(&popup).as_deref(), Some("try later"));
}

#[test]
fn deferred_pre_confirm_keeps_the_input_value() {
    let settlers: Settlers<PreConfirmVerdict> = Rc::default();
    let params = {
        let settlers = Rc::clone(&settlers);
        Params::new()
            .input(InputKind::Text)
            .input_value("kept")
            .pre_confirm(move |_| {
                let (settler, reply) = deferred();
                settlers.borrow_mut().push(settler);
                Reply::Later(reply)
            })
    };
    let mut popup = Popup::new();
    let outcome = popup.fire(params);
    popup.click_confirm();
    assert!(popup.is_loading());
    settlers.borrow()[0].settle(PreConfirmVerdict::Keep);
    popup.pump();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed("kept")));
}

// ============================================================================
// Choice inputs
// ============================================================================

#[test]
fn radio_scenario() {
    let mut popup = Popup::new();
    let outcome = popup
        .fire_json(r#"{"input": "radio", "inputOptions": {"one": "One", "two": "Two"}}"#)
        .unwrap();
    let group = popup.get_input().unwrap();
    let doc = popup.document();
    let radios = doc.elements_by_tag(group, "input");
    let values: Vec<_> = radios.iter().map(|&r| doc.attribute(r, "value")).collect();
    assert_eq!(values, vec![Some("one"), Some("two")]);

    let two = radios[1];
    popup.document_mut().set_checked(two, true);
    popup.click_confirm();
    assert_eq!(outcome.try_result().unwrap().to_json(), json!({"value": "two"}));
}

#[test]
fn radio_without_selection_yields_null() {
    let mut popup = Popup::new();
    let outcome = popup.fire(
        Params::new()
            .input(InputKind::Radio)
            .input_options(InputOptions::from_pairs([("a", "A")])),
    );
    popup.click_confirm();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed(Value::Null)));
}

#[test]
fn checkbox_yields_one_or_zero() {
    let mut popup = Popup::new();
    let outcome = popup.fire(Params::new().input(InputKind::Checkbox).input_value(1));
    popup.click_confirm();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed(1)));
}

#[test]
fn deferred_options_hold_the_popup_until_settled() {
    let (settler, options) = deferred::<OptionEntries>();
    let mut popup = Popup::new();
    let outcome = popup.fire(
        Params::new()
            .input(InputKind::Select)
            .input_options(options)
            .input_value("b"),
    );
    let select = popup.get_input().unwrap();
    assert!(popup.is_loading());
    assert!(popup.document().is_disabled(select));
    popup.click_confirm();
    assert!(!outcome.is_settled());

    popup.pump();
    assert!(popup.is_loading());

    settler.settle(vec![("a".into(), "A".into()), ("b".into(), "B".into())]);
    popup.pump();
    assert!(!popup.is_loading());
    assert!(!popup.document().is_disabled(select));
    let loader = popup.region(Region::Loader).unwrap();
    assert!(popup.document().hides_itself(loader));

    popup.click_confirm();
    assert_eq!(outcome.try_result(), Some(PopupResult::confirmed("b")));
}

#[test]
fn malformed_options_are_diagnosed_and_render_empty() {
    let mut popup = Popup::new();
    popup
        .fire_json(r#"{"input": "select", "inputOptions": 5}"#)
        .unwrap();
    let diagnostics = popup.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "Unexpected type of inputOptions! Expected object, Map or Promise, got number"
    );
    let select = popup.get_input().unwrap();
    assert!(popup.document().children(select).is_empty());
}
