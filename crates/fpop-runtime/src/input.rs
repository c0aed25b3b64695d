#![forbid(unsafe_code)]

//! Input widgets.
//!
//! One closed enum covers every input kind. Each variant knows how to
//! render into the input region, read its value, take an initial value,
//! enable/disable itself and report built-in validity. The engine only
//! ever talks to [`InputWidget`]; adding a kind means adding a variant.
//!
//! # Value rules
//!
//! | Kind | Value |
//! |------|-------|
//! | text, email, password, tel, url, textarea | string (trimmed unless `inputAutoTrim: false`) |
//! | number, range | number when the text parses, the raw string otherwise |
//! | select, radio | selected option value, or `null` |
//! | checkbox (no options) | `1` when checked, `0` otherwise |
//! | checkbox (with options) | array of checked option values |
//! | custom | whatever the control reads |

use std::sync::LazyLock;

use fpop_core::params::{Attributes, CustomInput, InputKind, OptionEntries};
use fpop_dom::{Document, DomError, NodeId, class_name};
use regex::Regex;
use serde_json::{Number, Value};

/// Id given to the primary control so the input label can point at it.
pub const CONTROL_ID: &str = "fpop-input-control";

const RADIO_NAME: &str = "fpop-radio";
const CHECKBOX_NAME: &str = "fpop-checkbox";

/// What to render.
#[derive(Debug, Clone, Copy)]
pub struct InputSpec<'a> {
    pub kind: InputKind,
    pub placeholder: Option<&'a str>,
    pub attributes: Option<&'a Attributes>,
    pub custom: Option<&'a CustomInput>,
    /// Checkbox rendered as a group of options rather than a single box.
    pub has_options: bool,
}

/// A rendered input.
#[derive(Debug, Clone)]
pub enum InputWidget {
    TextLike { kind: InputKind, control: NodeId },
    Range { control: NodeId, output: NodeId },
    Select { control: NodeId },
    Radio { group: NodeId },
    Checkbox { control: NodeId },
    CheckboxGroup { group: NodeId },
    Custom { control: NodeId, custom: CustomInput },
}

impl InputWidget {
    /// Replace the contents of `host` with a fresh widget.
    pub fn render(doc: &mut Document, host: NodeId, spec: &InputSpec<'_>) -> Result<Self, DomError> {
        doc.clear_children(host);
        let widget = match spec.kind {
            kind if kind.is_text_like() => {
                let control = if kind == InputKind::Textarea {
                    doc.create_element("textarea")
                } else {
                    let c = doc.create_element("input");
                    doc.set_attribute(c, "type", kind.as_str());
                    c
                };
                doc.set_attribute(control, "autofocus", "");
                if let Some(p) = spec.placeholder {
                    doc.set_attribute(control, "placeholder", p);
                }
                doc.append_child(host, control)?;
                InputWidget::TextLike { kind, control }
            }
            InputKind::Range => {
                let control = doc.create_element("input");
                doc.set_attribute(control, "type", "range");
                let output = doc.create_element("output");
                doc.append_child(host, control)?;
                doc.append_child(host, output)?;
                InputWidget::Range { control, output }
            }
            InputKind::Select => {
                let control = doc.create_element("select");
                if let Some(p) = spec.placeholder {
                    let option = doc.create_element("option");
                    doc.set_attribute(option, "value", "");
                    doc.set_attribute(option, "disabled", "");
                    doc.set_text_content(option, p);
                    doc.append_child(control, option)?;
                }
                doc.append_child(host, control)?;
                InputWidget::Select { control }
            }
            InputKind::Radio => {
                let group = doc.create_element("div");
                doc.add_class(group, &class_name("radio"));
                doc.append_child(host, group)?;
                InputWidget::Radio { group }
            }
            InputKind::Checkbox if spec.has_options => {
                let group = doc.create_element("div");
                doc.add_class(group, &class_name("checkbox-group"));
                doc.append_child(host, group)?;
                InputWidget::CheckboxGroup { group }
            }
            InputKind::Checkbox => {
                let label = doc.create_element("label");
                doc.add_class(label, &class_name("checkbox"));
                let control = doc.create_element("input");
                doc.set_attribute(control, "type", "checkbox");
                let text = doc.create_element("span");
                doc.add_class(text, &class_name("label"));
                if let Some(p) = spec.placeholder {
                    doc.set_text_content(text, p);
                }
                doc.append_child(label, control)?;
                doc.append_child(label, text)?;
                doc.append_child(host, label)?;
                InputWidget::Checkbox { control }
            }
            _ => {
                let custom = spec.custom.ok_or(DomError::Missing("custom input control"))?;
                let control = custom.0.render(doc, host)?;
                InputWidget::Custom {
                    control,
                    custom: custom.clone(),
                }
            }
        };
        let primary = widget.primary(doc);
        if let Some(primary) = primary {
            doc.set_attribute(primary, "id", CONTROL_ID);
            if let Some(attrs) = spec.attributes {
                for (name, value) in &attrs.0 {
                    doc.set_attribute(primary, name, value);
                }
            }
        }
        Ok(widget)
    }

    /// The input kind this widget renders.
    pub fn kind(&self) -> InputKind {
        match self {
            InputWidget::TextLike { kind, .. } => *kind,
            InputWidget::Range { .. } => InputKind::Range,
            InputWidget::Select { .. } => InputKind::Select,
            InputWidget::Radio { .. } => InputKind::Radio,
            InputWidget::Checkbox { .. } | InputWidget::CheckboxGroup { .. } => InputKind::Checkbox,
            InputWidget::Custom { .. } => InputKind::Custom,
        }
    }

    /// Whether Enter in this widget confirms.
    pub fn confirms_on_enter(&self) -> bool {
        matches!(self, InputWidget::TextLike { kind, .. } if *kind != InputKind::Textarea)
    }

    /// The element `getInput()` returns: the control, or the group
    /// container for option groups.
    pub fn element(&self) -> NodeId {
        match self {
            InputWidget::TextLike { control, .. }
            | InputWidget::Range { control, .. }
            | InputWidget::Select { control }
            | InputWidget::Checkbox { control }
            | InputWidget::Custom { control, .. } => *control,
            InputWidget::Radio { group } | InputWidget::CheckboxGroup { group } => *group,
        }
    }

    /// The first focusable control, if any options exist yet.
    pub fn primary(&self, doc: &Document) -> Option<NodeId> {
        match self {
            InputWidget::Radio { group } | InputWidget::CheckboxGroup { group } => {
                doc.elements_by_tag(*group, "input").first().copied()
            }
            other => Some(other.element()),
        }
    }

    /// Every form control the widget owns.
    fn controls(&self, doc: &Document) -> Vec<NodeId> {
        match self {
            InputWidget::Radio { group } | InputWidget::CheckboxGroup { group } => {
                doc.elements_by_tag(*group, "input")
            }
            other => vec![other.element()],
        }
    }

    /// Whether `node` is (inside) this widget.
    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_inclusive_ancestor(self.element(), node)
    }

    /// Render option entries. Replaces any previous options.
    pub fn set_options(&self, doc: &mut Document, entries: &OptionEntries) -> Result<(), DomError> {
        match self {
            InputWidget::Select { control } => {
                let stale: Vec<NodeId> = doc
                    .children(*control)
                    .iter()
                    .copied()
                    .filter(|&o| !doc.is_disabled(o) || doc.attribute(o, "value") != Some(""))
                    .collect();
                for node in stale {
                    doc.remove(node)?;
                }
                for (value, label) in entries {
                    let option = doc.create_element("option");
                    doc.set_attribute(option, "value", value);
                    doc.set_text_content(option, label);
                    doc.append_child(*control, option)?;
                }
                let has_placeholder = !doc.children(*control).is_empty()
                    && doc.children(*control).len() > entries.len();
                let first = if has_placeholder {
                    String::new()
                } else {
                    entries.first().map(|(v, _)| v.clone()).unwrap_or_default()
                };
                doc.set_value(*control, &first);
            }
            InputWidget::Radio { group } | InputWidget::CheckboxGroup { group } => {
                let (kind, name) = match self {
                    InputWidget::Radio { .. } => ("radio", RADIO_NAME),
                    _ => ("checkbox", CHECKBOX_NAME),
                };
                doc.clear_children(*group);
                for (value, label) in entries {
                    let wrapper = doc.create_element("label");
                    let input = doc.create_element("input");
                    doc.set_attribute(input, "type", kind);
                    doc.set_attribute(input, "name", name);
                    doc.set_attribute(input, "value", value);
                    let text = doc.create_element("span");
                    doc.add_class(text, &class_name("label"));
                    doc.set_text_content(text, label);
                    doc.append_child(wrapper, input)?;
                    doc.append_child(wrapper, text)?;
                    doc.append_child(*group, wrapper)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply `inputValue`.
    pub fn set_initial(&self, doc: &mut Document, value: &Value) {
        match self {
            InputWidget::TextLike { control, .. } | InputWidget::Select { control } => {
                if let Some(text) = scalar_text(value) {
                    let known = !matches!(self, InputWidget::Select { .. })
                        || doc
                            .children(*control)
                            .iter()
                            .any(|&o| doc.attribute(o, "value") == Some(text.as_str()));
                    if known {
                        doc.set_value(*control, &text);
                    }
                }
            }
            InputWidget::Range { control, output } => {
                if let Some(text) = scalar_text(value) {
                    doc.set_value(*control, &text);
                    doc.set_text_content(*output, &text);
                }
            }
            InputWidget::Checkbox { control } => doc.set_checked(*control, truthy(value)),
            InputWidget::Radio { group } | InputWidget::CheckboxGroup { group } => {
                let wanted: Vec<String> = match value {
                    Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
                    other => scalar_text(other).into_iter().collect(),
                };
                for input in doc.elements_by_tag(*group, "input") {
                    let on = doc
                        .attribute(input, "value")
                        .is_some_and(|v| wanted.iter().any(|w| w == v));
                    if on {
                        doc.set_checked(input, true);
                    }
                }
            }
            InputWidget::Custom { control, custom } => custom.0.set_initial(doc, *control, value),
        }
    }

    /// Enable or disable every control.
    pub fn set_enabled(&self, doc: &mut Document, enabled: bool) {
        for control in self.controls(doc) {
            doc.set_disabled(control, !enabled);
        }
    }

    /// Whether the primary control is disabled.
    pub fn is_enabled(&self, doc: &Document) -> bool {
        self.primary(doc).is_none_or(|p| !doc.is_disabled(p))
    }

    /// Read the current value.
    pub fn read(&self, doc: &Document, auto_trim: bool) -> Value {
        match self {
            InputWidget::TextLike { kind, control } => {
                let raw = doc.value(*control);
                let text = if auto_trim { raw.trim() } else { raw };
                if *kind == InputKind::Number {
                    numeric_or_string(text)
                } else {
                    Value::String(text.to_string())
                }
            }
            InputWidget::Range { control, .. } => numeric_or_string(doc.value(*control)),
            InputWidget::Select { control } => match doc.value(*control) {
                "" => Value::Null,
                v => Value::String(v.to_string()),
            },
            InputWidget::Radio { group } => doc
                .elements_by_tag(*group, "input")
                .into_iter()
                .find(|&i| doc.is_checked(i))
                .and_then(|i| doc.attribute(i, "value"))
                .map_or(Value::Null, |v| Value::String(v.to_string())),
            InputWidget::Checkbox { control } => Value::from(u8::from(doc.is_checked(*control))),
            InputWidget::CheckboxGroup { group } => Value::Array(
                doc.elements_by_tag(*group, "input")
                    .into_iter()
                    .filter(|&i| doc.is_checked(i))
                    .filter_map(|i| doc.attribute(i, "value"))
                    .map(|v| Value::String(v.to_string()))
                    .collect(),
            ),
            InputWidget::Custom { control, custom } => custom.0.read(doc, *control),
        }
    }

    /// Built-in validity. `format_checks` enables the default email/url
    /// validators (used when the caller supplied no validator).
    /// `message` overrides the built-in wording.
    pub fn report_validity(
        &self,
        doc: &Document,
        format_checks: bool,
        message: Option<&str>,
    ) -> Option<String> {
        let failure = match self {
            InputWidget::TextLike { kind, control } => {
                let text = doc.value(*control).trim();
                match kind {
                    InputKind::Email if format_checks && !is_email(text) => {
                        Some("Invalid email address")
                    }
                    InputKind::Url if format_checks && !is_url(text) => Some("Invalid URL"),
                    InputKind::Number if !text.is_empty() && text.parse::<f64>().is_err() => {
                        Some("Please enter a number")
                    }
                    _ => None,
                }
            }
            InputWidget::Custom { control, custom } => {
                return custom
                    .0
                    .report_validity(doc, *control)
                    .map(|m| message.map_or(m, str::to_string));
            }
            _ => None,
        };
        failure.map(|default| message.unwrap_or(default).to_string())
    }

    /// Set or clear `aria-invalid` on the controls.
    pub fn mark_invalid(&self, doc: &mut Document, invalid: bool) {
        for control in self.controls(doc) {
            if invalid {
                doc.set_attribute(control, "aria-invalid", "true");
            } else {
                doc.remove_attribute(control, "aria-invalid");
            }
        }
    }

    /// React to an input event on `node` (keeps the range readout in sync).
    pub fn on_input(&self, doc: &mut Document, node: NodeId) {
        if let InputWidget::Range { control, output } = self
            && node == *control
        {
            let value = doc.value(*control).to_string();
            doc.set_text_content(*output, &value);
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn numeric_or_string(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(text.to_string()), Value::Number)
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.+_-]+@[a-zA-Z0-9.-]+\.[a-zA-Z0-9-]{2,24}$").expect("email regex")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{2,256}\.[a-z]{2,63}\b([-a-zA-Z0-9@:%_+.~#?&/=]*)$",
    )
    .expect("url regex")
});

/// `local@domain.tld`, with a 2-24 character final label.
pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

/// `http(s)://host.tld[path]`, lowercase top-level label.
pub fn is_url(text: &str) -> bool {
    URL.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn host() -> (Document, NodeId) {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, host).unwrap();
        (doc, host)
    }

    fn spec(kind: InputKind) -> InputSpec<'static> {
        InputSpec {
            kind,
            placeholder: None,
            attributes: None,
            custom: None,
            has_options: false,
        }
    }

    fn entries(pairs: &[(&str, &str)]) -> OptionEntries {
        pairs
            .iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect()
    }

    #[test]
    fn text_is_trimmed_unless_disabled() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Text)).unwrap();
        w.set_initial(&mut doc, &json!("  hi "));
        assert_eq!(w.read(&doc, true), json!("hi"));
        assert_eq!(w.read(&doc, false), json!("  hi "));
        assert!(doc.has_attribute(w.element(), "autofocus"));
        assert!(w.confirms_on_enter());
    }

    #[test]
    fn number_parses_when_possible() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Number)).unwrap();
        doc.set_value(w.element(), "42");
        assert_eq!(w.read(&doc, true), json!(42));
        doc.set_value(w.element(), "1.5");
        assert_eq!(w.read(&doc, true), json!(1.5));
        doc.set_value(w.element(), "abc");
        assert_eq!(w.read(&doc, true), json!("abc"));
        assert_eq!(
            w.report_validity(&doc, true, None).as_deref(),
            Some("Please enter a number")
        );
    }

    #[test]
    fn select_with_placeholder_starts_null() {
        let (mut doc, host) = host();
        let s = InputSpec {
            placeholder: Some("Pick one"),
            ..spec(InputKind::Select)
        };
        let w = InputWidget::render(&mut doc, host, &s).unwrap();
        w.set_options(&mut doc, &entries(&[("a", "A"), ("b", "B")])).unwrap();
        assert_eq!(w.read(&doc, true), Value::Null);
        w.set_initial(&mut doc, &json!("b"));
        assert_eq!(w.read(&doc, true), json!("b"));
        w.set_initial(&mut doc, &json!("zzz"));
        assert_eq!(w.read(&doc, true), json!("b"));
    }

    #[test]
    fn select_without_placeholder_defaults_to_first_option() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Select)).unwrap();
        w.set_options(&mut doc, &entries(&[("a", "A"), ("b", "B")])).unwrap();
        assert_eq!(w.read(&doc, true), json!("a"));
    }

    #[test]
    fn radio_reads_checked_value() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Radio)).unwrap();
        w.set_options(&mut doc, &entries(&[("one", "one"), ("two", "two")])).unwrap();
        assert_eq!(w.read(&doc, true), Value::Null);
        let radios = doc.elements_by_tag(w.element(), "input");
        doc.set_checked(radios[1], true);
        assert_eq!(w.read(&doc, true), json!("two"));
        assert_eq!(w.primary(&doc), Some(radios[0]));
    }

    #[test]
    fn single_checkbox_is_one_or_zero() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Checkbox)).unwrap();
        assert_eq!(w.read(&doc, true), json!(0));
        w.set_initial(&mut doc, &json!(1));
        assert_eq!(w.read(&doc, true), json!(1));
    }

    #[test]
    fn checkbox_group_reads_array() {
        let (mut doc, host) = host();
        let s = InputSpec {
            has_options: true,
            ..spec(InputKind::Checkbox)
        };
        let w = InputWidget::render(&mut doc, host, &s).unwrap();
        w.set_options(&mut doc, &entries(&[("x", "X"), ("y", "Y"), ("z", "Z")])).unwrap();
        w.set_initial(&mut doc, &json!(["x", "z"]));
        assert_eq!(w.read(&doc, true), json!(["x", "z"]));
    }

    #[test]
    fn set_enabled_covers_every_control() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Radio)).unwrap();
        w.set_options(&mut doc, &entries(&[("a", "a"), ("b", "b")])).unwrap();
        w.set_enabled(&mut doc, false);
        assert!(doc
            .elements_by_tag(w.element(), "input")
            .iter()
            .all(|&i| doc.is_disabled(i)));
        assert!(!w.is_enabled(&doc));
    }

    #[test]
    fn attributes_land_on_primary_control() {
        let (mut doc, host) = host();
        let attrs: Attributes = [("maxlength", "10"), ("aria-label", "Type")].into_iter().collect();
        let s = InputSpec {
            attributes: Some(&attrs),
            ..spec(InputKind::Text)
        };
        let w = InputWidget::render(&mut doc, host, &s).unwrap();
        assert_eq!(doc.attribute(w.element(), "maxlength"), Some("10"));
        assert_eq!(doc.attribute(w.element(), "id"), Some(CONTROL_ID));
    }

    #[test]
    fn email_formats() {
        let cases = [
            ("a.b+c@example.com", true),
            ("user_name-1@sub.example.co.uk", true),
            ("x@y.museum", true),
            ("nope", false),
            ("a@b.c", false),
            ("@example.com", false),
            ("a b@example.com", false),
            ("a@example.com ", false),
            ("a@example.abcdefghijklmnopqrstuvwxy", false),
        ];
        for (text, expected) in cases {
            assert_eq!(is_email(text), expected, "{text:?}");
        }
    }

    #[test]
    fn url_formats() {
        let cases = [
            ("https://example.com/path?q=1", true),
            ("http://www.example.org", true),
            ("http://localhost.dev:8080", true),
            ("https://example.com/a-b_c~d#frag", true),
            ("ftp://example.com", false),
            ("https://nodot", false),
            ("https://example.COM", false),
            ("https://a.bc", false),
            ("https://example.com/a(b)", false),
            ("https://example.com/a b", false),
        ];
        for (text, expected) in cases {
            assert_eq!(is_url(text), expected, "{text:?}");
        }
    }

    #[test]
    fn validation_message_overrides_builtin() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Email)).unwrap();
        doc.set_value(w.element(), "bad");
        assert_eq!(
            w.report_validity(&doc, true, None).as_deref(),
            Some("Invalid email address")
        );
        assert_eq!(
            w.report_validity(&doc, true, Some("Custom")).as_deref(),
            Some("Custom")
        );
        assert_eq!(w.report_validity(&doc, false, None), None);
    }

    #[test]
    fn range_output_follows_input() {
        let (mut doc, host) = host();
        let w = InputWidget::render(&mut doc, host, &spec(InputKind::Range)).unwrap();
        w.set_initial(&mut doc, &json!(5));
        doc.set_value(w.element(), "7");
        w.on_input(&mut doc, w.element());
        let output = doc.elements_by_tag(host, "output")[0];
        assert_eq!(doc.text_content(output), "7");
        assert_eq!(w.read(&doc, true), json!(7));
    }
}
