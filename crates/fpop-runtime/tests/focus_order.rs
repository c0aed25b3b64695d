#![forbid(unsafe_code)]

//! Focus ordering, trapping and restoration against a live engine.

use fpop_core::{KeyCode, KeyEvent, Modifiers, Params, PopupEvent};
use fpop_dom::{Document, NodeId};
use fpop_runtime::Popup;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&n| doc.attribute(n, "id").unwrap_or("?").to_string())
        .collect()
}

fn key(popup: &mut Popup, code: KeyCode) {
    popup.dispatch(PopupEvent::Key(KeyEvent::new(code)));
}

fn focused_id(popup: &Popup) -> String {
    let doc = popup.document();
    doc.focused()
        .and_then(|n| doc.attribute(n, "id"))
        .unwrap_or("?")
        .to_string()
}

const MIXED: &str = r#"<button id="u1">u1</button>
<div tabindex="2" id="a2">a</div>
<div tabindex="0" id="z0">z</div>
<div tabindex="2" id="b2">b</div>
<input id="u2">
<div tabindex="1" id="c1">c</div>
<div tabindex="3" id="d3">d</div>
<button id="off" disabled>off</button>
<div tabindex="-1" id="neg">neg</div>
<a id="nohref">plain link</a>"#;

#[test]
fn positive_tabindex_first_then_document_order() {
    let mut popup = Popup::new();
    popup.fire(Params::new().html(MIXED));
    let order = popup.get_focusable_elements();
    assert_eq!(
        ids(popup.document(), &order),
        // The trailing "?" is the confirm button.
        vec!["c1", "a2", "b2", "d3", "u1", "z0", "u2", "?"]
    );
}

#[test]
fn hidden_regions_are_skipped() {
    let mut popup = Popup::new();
    popup.fire(Params::new().html(r#"<div style="display:none"><button id="x">x</button></div><button id="y" hidden>y</button>"#));
    let confirm = popup.get_confirm_button().unwrap();
    assert_eq!(popup.get_focusable_elements(), vec![confirm]);
}

#[test]
fn tab_cycles_and_wraps_in_both_directions() {
    let mut popup = Popup::new();
    popup.fire(
        Params::new()
            .html(r#"<button id="first">1</button>"#)
            .show_cancel_button(true),
    );
    let doc = popup.document();
    let confirm = popup.get_confirm_button().unwrap();
    let cancel = popup.get_cancel_button().unwrap();
    assert_eq!(doc.focused(), Some(confirm));

    key(&mut popup, KeyCode::Tab);
    assert_eq!(popup.document().focused(), Some(cancel));
    key(&mut popup, KeyCode::Tab);
    assert_eq!(focused_id(&popup), "first");
    key(&mut popup, KeyCode::BackTab);
    assert_eq!(popup.document().focused(), Some(cancel));

    let shift_tab = KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
    popup.dispatch(PopupEvent::Key(shift_tab));
    assert_eq!(popup.document().focused(), Some(confirm));
}

#[test]
fn arrow_keys_move_between_buttons() {
    let mut popup = Popup::new();
    popup.fire(Params::new().show_cancel_button(true));
    let confirm = popup.get_confirm_button().unwrap();
    let cancel = popup.get_cancel_button().unwrap();
    key(&mut popup, KeyCode::Right);
    assert_eq!(popup.document().focused(), Some(cancel));
    key(&mut popup, KeyCode::Right);
    assert_eq!(popup.document().focused(), Some(confirm));
    key(&mut popup, KeyCode::Up);
    assert_eq!(popup.document().focused(), Some(cancel));
}

#[test]
fn initial_focus_priority() {
    let mut popup = Popup::new();
    popup.fire(Params::new().show_cancel_button(true).focus_cancel(true));
    assert_eq!(popup.document().focused(), popup.get_cancel_button());

    popup.fire(Params::new().html(r#"<button id="auto" autofocus>a</button>"#));
    assert_eq!(focused_id(&popup), "auto");

    popup.fire(Params::new().focus_confirm(false).html(r#"<button id="b">b</button>"#));
    assert_eq!(focused_id(&popup), "b");

    popup.fire(Params::new().show_confirm_button(false));
    assert_eq!(popup.document().focused(), popup.get_popup());
}

#[test]
fn text_input_takes_initial_focus() {
    let mut popup = Popup::new();
    popup.fire(Params::new().input(fpop_core::InputKind::Text));
    assert_eq!(popup.document().focused(), popup.get_input());
}

#[test]
fn closing_restores_previous_focus() {
    let mut doc = Document::new();
    let body = doc.body();
    let outside = doc.create_element("button");
    doc.append_child(body, outside).unwrap();
    doc.focus(outside);

    let mut popup = Popup::new().with_document(doc);
    popup.fire(Params::new());
    assert_ne!(popup.document().focused(), Some(outside));
    popup.click_confirm();
    assert_eq!(popup.document().focused(), Some(outside));
}

#[test]
fn toasts_do_not_trap_or_steal_focus() {
    let mut doc = Document::new();
    let body = doc.body();
    let outside = doc.create_element("button");
    doc.append_child(body, outside).unwrap();
    doc.focus(outside);

    let mut popup = Popup::new().with_document(doc);
    popup.fire(Params::new().toast(true));
    assert_eq!(popup.document().focused(), Some(outside));
    assert!(!popup.dispatch(PopupEvent::Key(KeyEvent::new(KeyCode::Tab))));
}

#[test]
fn enter_key_disabled_leaves_nothing_focused() {
    let mut popup = Popup::new();
    popup.fire(Params::new().allow_enter_key(false));
    assert_eq!(popup.document().focused(), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Positive tabindex entries come first, sorted, stable on ties; the
    /// rest keep document order.
    #[test]
    fn focus_order_matches_tabindex_rule(tabindexes in prop::collection::vec(0u8..4, 1..12)) {
        let html: String = tabindexes
            .iter()
            .enumerate()
            .map(|(i, t)| format!(r#"<div tabindex="{t}" id="n{i}">x</div>"#))
            .collect();
        let mut popup = Popup::new();
        popup.fire(Params::new().html(html).show_confirm_button(false));

        let mut expected: Vec<(u8, usize)> = tabindexes
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t > 0)
            .map(|(i, &t)| (t, i))
            .collect();
        expected.sort_by_key(|&(t, _)| t);
        let mut expected: Vec<String> = expected.into_iter().map(|(_, i)| format!("n{i}")).collect();
        expected.extend(
            tabindexes
                .iter()
                .enumerate()
                .filter(|&(_, &t)| t == 0)
                .map(|(i, _)| format!("n{i}")),
        );

        let order = popup.get_focusable_elements();
        prop_assert_eq!(ids(popup.document(), &order), expected);
    }
}
