#![forbid(unsafe_code)]

//! Arena-backed document tree.
//!
//! The document models the small slice of a browser DOM the popup engine
//! needs: elements with attributes, class lists and inline styles, text
//! nodes, form-control state (`value`, `checked`), and a single focused
//! element.
//!
//! # Invariants
//!
//! 1. A removed node's id stays dead. Slots are recycled through a free
//!    list, but every reuse bumps the slot generation, so a stale id held by
//!    a finished popup never aliases a new element.
//! 2. Every live node except the document element has at most one parent,
//!    and the parent lists it exactly once among its children.
//! 3. `focused()` is either `None` or a live, connected element.
//!
//! # Failure Modes
//!
//! - Structural operations on dead ids return [`DomError::UnknownNode`].
//! - Attribute, class and style setters on dead ids are silent no-ops; the
//!   engine treats a vanished node the same as a hidden one.

use smallvec::SmallVec;

/// Opaque handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    slot: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot of this node. Slots are reused after removal.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.slot
    }
}

/// Errors raised by structural document operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The id does not refer to a live node.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    /// The operation needs an element but got a text node.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// Inserting `child` under `parent` would create a cycle.
    #[error("cannot insert {child:?} under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    /// A collaborator could not find a node it expected to exist.
    #[error("missing {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: SmallVec<[String; 4]>,
    styles: Vec<(String, String)>,
    value: String,
    checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Tags that render no closing tag when serialized.
pub(crate) const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// In-memory document with an `<html>` root and a `<body>`.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    /// Vacant slot indices, reused before the arena grows.
    free_list: Vec<usize>,
    root: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing `<html><body></body></html>`.
    pub fn new() -> Self {
        let placeholder = NodeId {
            slot: 0,
            generation: 0,
        };
        let mut doc = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: placeholder,
            body: placeholder,
            focused: None,
        };
        let root = doc.create_element("html");
        let body = doc.create_element("body");
        doc.root = root;
        doc.body = body;
        doc.link(root, body, None);
        doc
    }

    /// The `<html>` element.
    #[inline]
    pub fn document_element(&self) -> NodeId {
        self.root
    }

    /// The `<body>` element.
    #[inline]
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live nodes (for diagnostics and leak tests).
    pub fn live_nodes(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Number of arena slots, live or vacant.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    // --- Construction -------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..ElementData::default()
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = Node {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(slot) = self.free_list.pop() {
            let entry = &mut self.slots[slot];
            entry.node = Some(node);
            return NodeId {
                slot,
                generation: entry.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            slot: self.slots.len() - 1,
            generation: 0,
        }
    }

    // --- Structure ----------------------------------------------------------

    /// Whether `id` refers to a live node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether `id` is attached under the document element.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == self.root {
                return true;
            }
            cur = self.node(n).and_then(|node| node.parent);
        }
        false
    }

    /// Parent of `id`, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id` in order (empty for dead ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Sibling immediately before `id`.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Sibling immediately after `id`.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (append when `None`
    /// or when `reference` is not a child of `parent`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_live(parent)?;
        self.check_live(child)?;
        if matches!(self.node(parent).map(|n| &n.data), Some(NodeData::Text(_))) {
            return Err(DomError::NotAnElement(parent));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.unlink(child);
        self.link(parent, child, reference);
        Ok(())
    }

    /// Detach `id` from its parent, keeping the subtree alive.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        self.check_live(id)?;
        self.unlink(id);
        if self.focused.is_some_and(|f| self.is_inclusive_ancestor(id, f)) {
            self.focused = None;
        }
        Ok(())
    }

    /// Detach `id` and free its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(entry) = self
                .slots
                .get_mut(n.slot)
                .filter(|e| e.generation == n.generation)
            else {
                continue;
            };
            if let Some(node) = entry.node.take() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free_list.push(n.slot);
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Remove every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            let _ = self.remove(child);
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if let Some(p) = self.node_mut(parent) {
            let at = reference
                .and_then(|r| p.children.iter().position(|&c| c == r))
                .unwrap_or(p.children.len());
            p.children.insert(at, child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.parent(child) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
    }

    // --- Element data -------------------------------------------------------

    /// Lowercase tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Whether `id` is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Attribute value.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// All attributes in insertion order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map_or(&[], |e| e.attrs.as_slice())
    }

    /// Set (or replace) an attribute. `class` and `style` are routed to the
    /// class list and inline style map.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        match name {
            "class" => {
                if let Some(el) = self.element_mut(id) {
                    el.classes = value.split_whitespace().map(str::to_string).collect();
                }
            }
            "style" => {
                if let Some(el) = self.element_mut(id) {
                    el.styles = parse_style(value);
                }
            }
            _ => {
                if let Some(el) = self.element_mut(id) {
                    if name == "value" {
                        el.value = value.to_string();
                    }
                    if name == "checked" {
                        el.checked = true;
                    }
                    match el.attrs.iter_mut().find(|(k, _)| k == name) {
                        Some(slot) => slot.1 = value.to_string(),
                        None => el.attrs.push((name.to_string(), value.to_string())),
                    }
                }
            }
        }
    }

    /// Remove an attribute.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    /// Set or remove a boolean attribute.
    pub fn toggle_attribute(&mut self, id: NodeId, name: &str, on: bool) {
        if on {
            if !self.has_attribute(id, name) {
                self.set_attribute(id, name, "");
            }
        } else {
            self.remove_attribute(id, name);
        }
    }

    /// Class list in order.
    pub fn classes(&self, id: NodeId) -> &[String] {
        self.element(id).map_or(&[], |e| e.classes.as_slice())
    }

    /// Whether the element carries `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    /// Add a class (no duplicates).
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if class.is_empty() {
            return;
        }
        if let Some(el) = self.element_mut(id)
            && !el.classes.iter().any(|c| c == class)
        {
            el.classes.push(class.to_string());
        }
    }

    /// Remove a class.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(el) = self.element_mut(id) {
            el.classes.retain(|c| c != class);
        }
    }

    /// Add or remove a class.
    pub fn toggle_class(&mut self, id: NodeId, class: &str, on: bool) {
        if on {
            self.add_class(id, class);
        } else {
            self.remove_class(id, class);
        }
    }

    /// Inline style property.
    pub fn style(&self, id: NodeId, prop: &str) -> Option<&str> {
        self.element(id)?
            .styles
            .iter()
            .find(|(k, _)| k == prop)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style property; an empty value removes it.
    pub fn set_style(&mut self, id: NodeId, prop: &str, value: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if value.is_empty() {
            el.styles.retain(|(k, _)| k != prop);
            return;
        }
        match el.styles.iter_mut().find(|(k, _)| k == prop) {
            Some(slot) => slot.1 = value.to_string(),
            None => el.styles.push((prop.to_string(), value.to_string())),
        }
    }

    /// Remove an inline style property.
    pub fn remove_style(&mut self, id: NodeId, prop: &str) {
        self.set_style(id, prop, "");
    }

    /// Show an element with the given `display` value.
    pub fn show(&mut self, id: NodeId, display: &str) {
        self.set_style(id, "display", display);
    }

    /// Hide an element (`display: none`).
    pub fn hide(&mut self, id: NodeId) {
        self.set_style(id, "display", "none");
    }

    /// Show or hide with a single flag.
    pub fn toggle_display(&mut self, id: NodeId, visible: bool, display: &str) {
        if visible {
            self.show(id, display);
        } else {
            self.hide(id);
        }
    }

    /// Whether the element hides itself (ignoring ancestors).
    pub fn hides_itself(&self, id: NodeId) -> bool {
        self.style(id, "display") == Some("none")
            || self.style(id, "visibility") == Some("hidden")
            || self.has_attribute(id, "hidden")
    }

    /// Whether the node is connected and neither it nor any ancestor is hidden.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.is_element(n) && self.hides_itself(n) {
                return false;
            }
            cur = self.parent(n);
        }
        true
    }

    /// Whether the element has the `disabled` attribute.
    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.has_attribute(id, "disabled")
    }

    /// Set or clear `disabled`.
    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        self.toggle_attribute(id, "disabled", disabled);
    }

    /// Current form-control value.
    pub fn value(&self, id: NodeId) -> &str {
        self.element(id).map_or("", |e| e.value.as_str())
    }

    /// Set the form-control value (property, not attribute).
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
        }
    }

    /// Whether a checkbox/radio control is checked.
    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.checked)
    }

    /// Set the checked state. Checking a radio unchecks the other radios
    /// sharing its `name`.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        let radio_group = (checked && self.attribute(id, "type") == Some("radio"))
            .then(|| self.attribute(id, "name").map(str::to_string))
            .flatten();
        if let Some(name) = radio_group {
            let peers: Vec<NodeId> = self
                .descendants(self.tree_root(id))
                .into_iter()
                .filter(|&n| {
                    n != id
                        && self.attribute(n, "type") == Some("radio")
                        && self.attribute(n, "name") == Some(name.as_str())
                })
                .collect();
            for peer in peers {
                if let Some(el) = self.element_mut(peer) {
                    el.checked = false;
                }
            }
        }
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    // --- Text & markup ------------------------------------------------------

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.node(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) => out.push_str(t),
            Some(NodeData::Element(_)) => {
                for &c in self.children(id) {
                    self.collect_text(c, out);
                }
            }
            None => {}
        }
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if !self.is_element(id) {
            return;
        }
        self.clear_children(id);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.link(id, t, None);
        }
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &c in self.children(id) {
            self.serialize(c, &mut out);
        }
        out
    }

    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(t) => out.push_str(&crate::markup::escape_text(t)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                if !el.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&el.classes.join(" "));
                    out.push('"');
                }
                for (k, v) in &el.attrs {
                    out.push(' ');
                    out.push_str(k);
                    if !v.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&crate::markup::escape_attr(v));
                        out.push('"');
                    }
                }
                if !el.styles.is_empty() {
                    out.push_str(" style=\"");
                    let decls: Vec<String> =
                        el.styles.iter().map(|(k, v)| format!("{k}: {v};")).collect();
                    out.push_str(&decls.join(" "));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                for &c in &node.children {
                    self.serialize(c, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    /// Replace the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        self.clear_children(id);
        for fragment in crate::markup::parse_fragment(html) {
            self.append_markup(id, &fragment)?;
        }
        Ok(())
    }

    /// Materialize a markup tree under `parent`; returns the new node.
    pub fn append_markup(
        &mut self,
        parent: NodeId,
        markup: &crate::markup::Markup,
    ) -> Result<NodeId, DomError> {
        use crate::markup::Markup;
        let id = match markup {
            Markup::Text(t) => self.create_text(t),
            Markup::Element {
                tag,
                attrs,
                children,
            } => {
                let el = self.create_element(tag);
                for (k, v) in attrs {
                    self.set_attribute(el, k, v);
                }
                for child in children {
                    self.append_markup(el, child)?;
                }
                el
            }
        };
        self.append_child(parent, id)?;
        Ok(id)
    }

    // --- Traversal ----------------------------------------------------------

    /// Element descendants of `root` in document (pre-)order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            if self.is_element(n) {
                out.push(n);
            }
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// First descendant element of `root` matching `pred`.
    pub fn find_first(&self, root: NodeId, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(root).into_iter().find(|&n| pred(self, n))
    }

    /// Descendant elements of `root` carrying `class`.
    pub fn elements_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    /// Descendant elements of `root` with tag `tag`.
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.tag(n) == Some(tag))
            .collect()
    }

    /// Topmost ancestor of `id` (the document element when connected).
    fn tree_root(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            cur = parent;
        }
        cur
    }

    // --- Focus --------------------------------------------------------------

    /// Currently focused element.
    #[inline]
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|&f| self.is_connected(f))
    }

    /// Focus an element. Returns `false` (leaving focus unchanged) for
    /// dead, detached, or non-element nodes.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.is_element(id) || !self.is_connected(id) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    /// Clear focus.
    pub fn blur(&mut self) {
        self.focused = None;
    }

    // --- Internals ----------------------------------------------------------

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.slot)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.slot)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.node.as_mut())
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    fn check_live(&self, id: NodeId) -> Result<(), DomError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(DomError::UnknownNode(id))
        }
    }
}

fn parse_style(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let (k, v) = (k.trim(), v.trim());
            (!k.is_empty() && !v.is_empty()).then(|| (k.to_string(), v.to_string()))
        })
        .collect()
}
