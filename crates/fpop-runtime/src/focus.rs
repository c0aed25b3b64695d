#![forbid(unsafe_code)]

//! Focus trap and keyboard focus order.
//!
//! The trap never caches the focus order. Every query walks the live
//! document, so showing or hiding a button, disabling the input, or
//! rewriting the html region is reflected on the very next Tab.
//!
//! # Invariants
//!
//! 1. **Ordering**: positive `tabindex` first, ascending, ties in document
//!    order; then `tabindex=0` or unset, in document order.
//! 2. **Trap**: while armed and modal, Tab/Shift+Tab cycle within the popup
//!    and wrap at both ends.
//! 3. **Restoration**: releasing the trap refocuses whatever was focused
//!    when it was armed.
//!
//! # Failure Modes
//!
//! - The previously focused element was removed while the popup was open:
//!   focus is cleared instead of restored.
//! - Nothing in the popup is focusable: the popup element itself (which
//!   carries `tabindex="-1"`) takes focus, and Tab keeps it there.

use fpop_dom::{Document, NodeId, PopupRegions, Region};
use smallvec::SmallVec;

const INTERACTIVE_TAGS: [&str; 5] = ["button", "input", "select", "textarea", "summary"];

fn tab_index(doc: &Document, node: NodeId) -> Option<i32> {
    doc.attribute(node, "tabindex")
        .and_then(|v| v.trim().parse().ok())
}

/// Whether `node` can take keyboard focus.
pub fn is_focusable(doc: &Document, node: NodeId) -> bool {
    let Some(tag) = doc.tag(node) else {
        return false;
    };
    let tabindex = tab_index(doc, node);
    let interactive = INTERACTIVE_TAGS.contains(&tag)
        || (tag == "a" && doc.has_attribute(node, "href"))
        || doc
            .attribute(node, "contenteditable")
            .is_some_and(|v| v != "false")
        || tabindex.is_some();
    interactive
        && !(tag == "input" && doc.attribute(node, "type") == Some("hidden"))
        && !doc.is_disabled(node)
        && tabindex.is_none_or(|t| t >= 0)
        && doc.is_rendered(node)
}

/// Focusable descendants of `root` in tab order.
pub fn focusable_elements(doc: &Document, root: NodeId) -> Vec<NodeId> {
    let mut ordered: Vec<(i32, NodeId)> = Vec::new();
    let mut natural: Vec<NodeId> = Vec::new();
    for node in doc.descendants(root) {
        if !is_focusable(doc, node) {
            continue;
        }
        match tab_index(doc, node) {
            Some(t) if t > 0 => ordered.push((t, node)),
            _ => natural.push(node),
        }
    }
    // Stable: equal tabindex keeps document order.
    ordered.sort_by_key(|&(t, _)| t);
    ordered
        .into_iter()
        .map(|(_, n)| n)
        .chain(natural)
        .collect()
}

/// Element that should take focus when the popup opens.
///
/// Priority: `autofocus`, cancel (if `focus_cancel`), confirm (if
/// `focus_confirm`), first focusable, the popup itself.
pub fn initial_focus(
    doc: &Document,
    regions: &PopupRegions,
    focus_confirm: bool,
    focus_cancel: bool,
) -> NodeId {
    let popup = regions.popup();
    let focusable = focusable_elements(doc, popup);
    let usable = |n: NodeId| focusable.contains(&n);
    if let Some(&auto) = focusable
        .iter()
        .find(|&&n| doc.has_attribute(n, "autofocus"))
    {
        return auto;
    }
    let cancel = regions.get(Region::CancelButton);
    if focus_cancel && usable(cancel) {
        return cancel;
    }
    let confirm = regions.get(Region::ConfirmButton);
    if focus_confirm && usable(confirm) {
        return confirm;
    }
    focusable.first().copied().unwrap_or(popup)
}

/// Focus trap state for one popup instance.
#[derive(Debug, Clone, Default)]
pub struct FocusTrap {
    root: Option<NodeId>,
    previous: Option<NodeId>,
    modal: bool,
}

impl FocusTrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current focus and start managing focus inside `root`.
    pub fn arm(&mut self, doc: &Document, root: NodeId, modal: bool) {
        self.previous = doc.focused().filter(|&f| !doc.is_inclusive_ancestor(root, f));
        self.root = Some(root);
        self.modal = modal;
        tracing::trace!(
            target: "fpop.focus",
            root = root.index(),
            previous = ?self.previous.map(NodeId::index),
            modal,
            "focus trap armed"
        );
    }

    /// Stop managing focus and restore the remembered element.
    pub fn release(&mut self, doc: &mut Document) {
        let Some(root) = self.root.take() else {
            return;
        };
        let restored = self.previous.take().is_some_and(|prev| doc.focus(prev));
        if !restored && doc.focused().is_some_and(|f| doc.is_inclusive_ancestor(root, f)) {
            doc.blur();
        }
        tracing::trace!(target: "fpop.focus", restored, "focus trap released");
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.root.is_some()
    }

    /// Whether Tab is currently confined to the popup.
    #[inline]
    pub fn is_trapping(&self) -> bool {
        self.is_armed() && self.modal
    }

    /// The element focused before arming.
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    /// Move focus one step through the tab order, wrapping. Returns the new
    /// focus, or `None` when the trap is not confining Tab.
    pub fn cycle(&self, doc: &mut Document, forward: bool) -> Option<NodeId> {
        if !self.is_trapping() {
            return None;
        }
        let root = self.root?;
        let order = focusable_elements(doc, root);
        let target = if order.is_empty() {
            root
        } else {
            let len = order.len();
            let next = match doc.focused().and_then(|f| order.iter().position(|&n| n == f)) {
                Some(i) if forward => (i + 1) % len,
                Some(i) => (i + len - 1) % len,
                None if forward => 0,
                None => len - 1,
            };
            order[next]
        };
        doc.focus(target);
        tracing::trace!(target: "fpop.focus", node = target.index(), forward, "tab");
        Some(target)
    }

    /// Arrow-key navigation between the visible action buttons. Only acts
    /// when a button already has focus.
    pub fn step_buttons(
        &self,
        doc: &mut Document,
        regions: &PopupRegions,
        forward: bool,
    ) -> Option<NodeId> {
        if !self.is_armed() {
            return None;
        }
        let current = doc.focused()?;
        let buttons: SmallVec<[NodeId; 2]> = doc
            .children(regions.get(Region::Actions))
            .iter()
            .copied()
            .filter(|&n| doc.tag(n) == Some("button") && is_focusable(doc, n))
            .collect();
        let i = buttons.iter().position(|&b| b == current)?;
        let len = buttons.len();
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        let target = buttons[next];
        doc.focus(target);
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpop_dom::{DefaultDomBuilder, DomBuilder};

    fn container(html: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, root).unwrap();
        doc.set_inner_html(root, html).unwrap();
        (doc, root)
    }

    fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|&n| doc.attribute(n, "id").unwrap_or("?").to_string())
            .collect()
    }

    #[test]
    fn positive_tabindex_first_then_document_order() {
        let (doc, root) = container(
            r#"<button id="u1"></button>
               <div tabindex="2" id="t2a"></div>
               <input id="u2">
               <div tabindex="1" id="t1"></div>
               <div tabindex="2" id="t2b"></div>
               <div tabindex="0" id="z"></div>
               <div tabindex="3" id="t3"></div>
               <select id="u3"></select>"#,
        );
        let order = focusable_elements(&doc, root);
        assert_eq!(
            ids(&doc, &order),
            ["t1", "t2a", "t2b", "t3", "u1", "u2", "z", "u3"]
        );
    }

    #[test]
    fn excluded_elements() {
        let (doc, root) = container(
            r#"<button id="dis" disabled></button>
               <button id="neg" tabindex="-1"></button>
               <div style="display:none"><button id="hidden-parent"></button></div>
               <button id="invisible" style="visibility: hidden"></button>
               <button id="attr" hidden></button>
               <input type="hidden" id="hid">
               <a id="nohref"></a>
               <a id="link" href="x"></a>
               <span id="span"></span>
               <div id="edit" contenteditable="true"></div>"#,
        );
        assert_eq!(ids(&doc, &focusable_elements(&doc, root)), ["link", "edit"]);
    }

    #[test]
    fn cycle_wraps_both_ways() {
        let (mut doc, root) = container(r#"<button id="a"></button><button id="b"></button>"#);
        let mut trap = FocusTrap::new();
        trap.arm(&doc, root, true);
        let a = trap.cycle(&mut doc, true).unwrap();
        assert_eq!(doc.attribute(a, "id"), Some("a"));
        let b = trap.cycle(&mut doc, true).unwrap();
        assert_eq!(doc.attribute(b, "id"), Some("b"));
        assert_eq!(trap.cycle(&mut doc, true), Some(a));
        assert_eq!(trap.cycle(&mut doc, false), Some(b));
    }

    #[test]
    fn non_modal_trap_does_not_cycle() {
        let (mut doc, root) = container(r#"<button id="a"></button>"#);
        let mut trap = FocusTrap::new();
        trap.arm(&doc, root, false);
        assert!(trap.is_armed());
        assert_eq!(trap.cycle(&mut doc, true), None);
    }

    #[test]
    fn release_restores_previous_focus() {
        let (mut doc, root) = container(r#"<button id="inside"></button>"#);
        let outside = doc.create_element("button");
        let body = doc.body();
        doc.append_child(body, outside).unwrap();
        doc.focus(outside);
        let mut trap = FocusTrap::new();
        trap.arm(&doc, root, true);
        trap.cycle(&mut doc, true);
        assert_ne!(doc.focused(), Some(outside));
        trap.release(&mut doc);
        assert_eq!(doc.focused(), Some(outside));
        assert!(!trap.is_armed());
    }

    #[test]
    fn release_after_previous_removed_clears_focus() {
        let (mut doc, root) = container(r#"<button id="inside"></button>"#);
        let outside = doc.create_element("button");
        let body = doc.body();
        doc.append_child(body, outside).unwrap();
        doc.focus(outside);
        let mut trap = FocusTrap::new();
        trap.arm(&doc, root, true);
        trap.cycle(&mut doc, true);
        doc.remove(outside).unwrap();
        trap.release(&mut doc);
        assert_eq!(doc.focused(), None);
    }

    #[test]
    fn initial_focus_priority() {
        let mut doc = Document::new();
        let body = doc.body();
        let regions = DefaultDomBuilder.build(&mut doc, body, false).unwrap();
        let confirm = regions.get(Region::ConfirmButton);
        let cancel = regions.get(Region::CancelButton);
        // Nothing visible: the popup itself.
        doc.show(regions.popup(), "flex");
        assert_eq!(initial_focus(&doc, &regions, true, false), regions.popup());
        for region in [Region::Actions, Region::ConfirmButton, Region::CancelButton] {
            doc.show(regions.get(region), "inline-block");
        }
        assert_eq!(initial_focus(&doc, &regions, true, false), confirm);
        assert_eq!(initial_focus(&doc, &regions, true, true), cancel);
        assert_eq!(initial_focus(&doc, &regions, false, false), confirm);
        let html = regions.get(Region::HtmlContainer);
        doc.show(regions.get(Region::Content), "block");
        doc.show(html, "block");
        doc.set_inner_html(html, "<input autofocus>").unwrap();
        let auto = doc.elements_by_tag(html, "input")[0];
        assert_eq!(initial_focus(&doc, &regions, true, true), auto);
    }

    #[test]
    fn arrows_move_between_buttons() {
        let mut doc = Document::new();
        let body = doc.body();
        let regions = DefaultDomBuilder.build(&mut doc, body, false).unwrap();
        for region in [Region::Popup, Region::Actions, Region::ConfirmButton, Region::CancelButton] {
            doc.show(regions.get(region), "block");
        }
        let mut trap = FocusTrap::new();
        trap.arm(&doc, regions.popup(), true);
        let confirm = regions.get(Region::ConfirmButton);
        let cancel = regions.get(Region::CancelButton);
        doc.focus(confirm);
        assert_eq!(trap.step_buttons(&mut doc, &regions, true), Some(cancel));
        assert_eq!(trap.step_buttons(&mut doc, &regions, true), Some(confirm));
        assert_eq!(trap.step_buttons(&mut doc, &regions, false), Some(cancel));
    }
}
