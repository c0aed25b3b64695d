#![forbid(unsafe_code)]

//! Popup parameters.
//!
//! [`Params`] is the declarative configuration of one `fire`. Every field is
//! optional; `None` means "use the default" and the engine documents each
//! default where it applies it. Params can be built with the typed setters
//! or parsed from JSON with [`Params::from_json`], which is where unknown
//! keys and wrongly shaped values are diagnosed.
//!
//! # Invariants
//!
//! 1. [`KNOWN_PARAMS`] lists exactly the keys [`Params::from_json`] accepts.
//! 2. [`UPDATABLE_PARAMS`] is a subset of [`KNOWN_PARAMS`].
//! 3. Parsing never fails. A bad value is reported and treated as absent.
//! 4. `null` for any key is "absent" and reports nothing.

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use fpop_dom::{Content, Document, DomError, Markup, NodeId, Region};
use serde_json::Value;

use crate::control::PopupControl;
use crate::deferred::Deferred;
use crate::diagnostics::Diagnostic;

/// Error type hooks may return.
pub type HookError = Box<dyn std::error::Error>;

/// Return type of every lifecycle hook.
pub type HookResult = Result<(), HookError>;

/// A lifecycle hook.
pub type Hook = Rc<dyn Fn(&mut dyn PopupControl) -> HookResult>;

/// Ordered listeners for one lifecycle point.
pub type HookList = Vec<Hook>;

/// `(value, label)` pairs in display order.
pub type OptionEntries = Vec<(String, String)>;

/// JS-style `typeof` name of a JSON value, used in diagnostics.
pub fn js_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "object",
    }
}

/// Parse one parameter value. Implementations push their own diagnostics
/// and return `None` for anything they reject.
pub trait FromParam: Sized {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self>;
}

fn reject<T>(diags: &mut Vec<Diagnostic>, key: &str, expected: &str, value: &Value) -> Option<T> {
    diags.push(Diagnostic::invalid_type(key, expected, js_type(value)));
    None
}

impl FromParam for bool {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            other => reject(diags, key, "boolean", other),
        }
    }
}

impl FromParam for String {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => reject(diags, key, "string", other),
        }
    }
}

impl FromParam for u64 {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value.as_f64() {
            Some(n) if n >= 0.0 => Some(n as u64),
            _ => reject(diags, key, "non-negative number", value),
        }
    }
}

impl FromParam for Value {
    fn from_param(_: &str, value: &Value, _: &mut Vec<Diagnostic>) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromParam for Content {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::String(s) => Some(Content::Html(s.clone())),
            Value::Number(n) => Some(Content::Html(n.to_string())),
            other => {
                diags.push(Diagnostic::unexpected_shorthand(key, js_type(other)));
                None
            }
        }
    }
}

impl FromParam for Vec<String> {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        let items = value
            .as_array()
            .map(|a| a.iter().map(|v| v.as_str().map(str::to_string)).collect::<Option<Vec<_>>>());
        match items {
            Some(Some(items)) => Some(items),
            _ => reject(diags, key, "array of strings", value),
        }
    }
}

// --- Value types -------------------------------------------------------------

/// Icon shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    Success,
    Error,
    Warning,
    Info,
    Question,
}

impl IconKind {
    pub const ALL: [IconKind; 5] = [
        IconKind::Success,
        IconKind::Error,
        IconKind::Warning,
        IconKind::Info,
        IconKind::Question,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            IconKind::Success => "success",
            IconKind::Error => "error",
            IconKind::Warning => "warning",
            IconKind::Info => "info",
            IconKind::Question => "question",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl FromParam for IconKind {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value.as_str().and_then(IconKind::parse) {
            Some(kind) => Some(kind),
            None => reject(
                diags,
                key,
                "\"success\", \"error\", \"warning\", \"info\" or \"question\"",
                value,
            ),
        }
    }
}

/// Backdrop: shown, hidden, or shown with a CSS background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backdrop {
    Enabled,
    Disabled,
    Css(String),
}

impl Backdrop {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Backdrop::Disabled)
    }
}

impl From<bool> for Backdrop {
    fn from(b: bool) -> Self {
        if b { Backdrop::Enabled } else { Backdrop::Disabled }
    }
}

impl From<&str> for Backdrop {
    fn from(css: &str) -> Self {
        Backdrop::Css(css.to_string())
    }
}

impl FromParam for Backdrop {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Bool(b) => Some((*b).into()),
            Value::String(s) => Some(Backdrop::Css(s.clone())),
            other => reject(diags, key, "boolean or string", other),
        }
    }
}

/// A CSS length: numbers are pixels, strings pass through.
#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    Px(f64),
    Css(String),
}

impl Dimension {
    pub fn to_css(&self) -> String {
        match self {
            Dimension::Px(px) => format!("{px}px"),
            Dimension::Css(css) => css.clone(),
        }
    }
}

impl From<i32> for Dimension {
    fn from(px: i32) -> Self {
        Dimension::Px(f64::from(px))
    }
}

impl From<u32> for Dimension {
    fn from(px: u32) -> Self {
        Dimension::Px(f64::from(px))
    }
}

impl From<f64> for Dimension {
    fn from(px: f64) -> Self {
        Dimension::Px(px)
    }
}

impl From<&str> for Dimension {
    fn from(css: &str) -> Self {
        Dimension::Css(css.to_string())
    }
}

impl FromParam for Dimension {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(Dimension::Px),
            Value::String(s) => Some(Dimension::Css(s.clone())),
            other => reject(diags, key, "number or string", other),
        }
    }
}

/// `grow` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grow {
    Off,
    Row,
    Column,
    Fullscreen,
}

impl FromParam for Grow {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Bool(false) => Some(Grow::Off),
            Value::String(s) if s == "row" => Some(Grow::Row),
            Value::String(s) if s == "column" => Some(Grow::Column),
            Value::String(s) if s == "fullscreen" => Some(Grow::Fullscreen),
            other => reject(diags, key, "false, \"row\", \"column\" or \"fullscreen\"", other),
        }
    }
}

/// Caller classes per region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomClass {
    classes: AHashMap<Region, Vec<String>>,
}

impl CustomClass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add space-separated classes for `region`.
    #[must_use]
    pub fn region(mut self, region: Region, classes: &str) -> Self {
        self.classes
            .entry(region)
            .or_default()
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    /// Classes for `region` (empty if none).
    pub fn classes_for(&self, region: Region) -> &[String] {
        self.classes.get(&region).map_or(&[], Vec::as_slice)
    }
}

impl From<&str> for CustomClass {
    /// A bare string targets the popup.
    fn from(classes: &str) -> Self {
        CustomClass::new().region(Region::Popup, classes)
    }
}

impl FromParam for CustomClass {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.as_str().into()),
            Value::Object(map) => {
                let mut out = CustomClass::new();
                for (name, classes) in map {
                    let Some(region) = Region::from_custom_class_key(name) else {
                        continue;
                    };
                    match classes {
                        Value::Null => {}
                        Value::String(s) => out = out.region(region, s),
                        Value::Array(items) if items.iter().all(Value::is_string) => {
                            for item in items.iter().filter_map(Value::as_str) {
                                out = out.region(region, item);
                            }
                        }
                        other => {
                            let got = match other {
                                Value::Array(_) => "object",
                                v => js_type(v),
                            };
                            diags.push(Diagnostic::invalid_custom_class(name, got));
                        }
                    }
                }
                Some(out)
            }
            other => reject(diags, key, "string or object", other),
        }
    }
}

/// Boolean parameter that may be re-evaluated on every use.
#[derive(Clone)]
pub enum Predicate {
    Always(bool),
    Dynamic(Rc<dyn Fn() -> bool>),
}

impl Predicate {
    /// A predicate evaluated each time it is consulted.
    pub fn dynamic(f: impl Fn() -> bool + 'static) -> Self {
        Predicate::Dynamic(Rc::new(f))
    }

    pub fn eval(&self) -> bool {
        match self {
            Predicate::Always(b) => *b,
            Predicate::Dynamic(f) => f(),
        }
    }
}

impl From<bool> for Predicate {
    fn from(b: bool) -> Self {
        Predicate::Always(b)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always(b) => write!(f, "Always({b})"),
            Predicate::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl FromParam for Predicate {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Predicate::Always(*b)),
            other => reject(diags, key, "boolean or function", other),
        }
    }
}

// --- Input -------------------------------------------------------------------

/// Kind of input widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    Textarea,
    Range,
    Select,
    Radio,
    Checkbox,
    /// Caller-supplied control, see [`Params::custom_input`].
    Custom,
}

impl InputKind {
    const NAMED: [(&'static str, InputKind); 11] = [
        ("text", InputKind::Text),
        ("email", InputKind::Email),
        ("password", InputKind::Password),
        ("number", InputKind::Number),
        ("tel", InputKind::Tel),
        ("url", InputKind::Url),
        ("textarea", InputKind::Textarea),
        ("range", InputKind::Range),
        ("select", InputKind::Select),
        ("radio", InputKind::Radio),
        ("checkbox", InputKind::Checkbox),
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::NAMED
            .into_iter()
            .find_map(|(name, kind)| (name == s).then_some(kind))
    }

    pub fn as_str(self) -> &'static str {
        Self::NAMED
            .into_iter()
            .find_map(|(name, kind)| (kind == self).then_some(name))
            .unwrap_or("custom")
    }

    /// Kinds rendered as a single text-entry `<input>` (or textarea).
    pub const fn is_text_like(self) -> bool {
        matches!(
            self,
            InputKind::Text
                | InputKind::Email
                | InputKind::Password
                | InputKind::Number
                | InputKind::Tel
                | InputKind::Url
                | InputKind::Textarea
        )
    }

    /// Kinds that take `inputOptions`.
    pub const fn takes_options(self) -> bool {
        matches!(self, InputKind::Select | InputKind::Radio | InputKind::Checkbox)
    }
}

impl FromParam for InputKind {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value.as_str().and_then(InputKind::parse) {
            Some(kind) => Some(kind),
            None => {
                let expected = InputKind::NAMED
                    .iter()
                    .map(|(name, _)| format!("\"{name}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                reject(diags, key, &expected, value)
            }
        }
    }
}

/// Options for choice inputs: ready now, or produced later by the host.
#[derive(Debug, Clone)]
pub enum InputOptions {
    Ready(OptionEntries),
    Deferred(Deferred<OptionEntries>),
}

impl InputOptions {
    /// Options from `(value, label)` pairs.
    pub fn from_pairs<V: Into<String>, L: Into<String>>(
        pairs: impl IntoIterator<Item = (V, L)>,
    ) -> Self {
        InputOptions::Ready(
            pairs
                .into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        )
    }

    /// The entries if available now.
    pub fn entries(&self) -> Option<OptionEntries> {
        match self {
            InputOptions::Ready(entries) => Some(entries.clone()),
            InputOptions::Deferred(d) => d.get(),
        }
    }
}

impl From<Deferred<OptionEntries>> for InputOptions {
    fn from(d: Deferred<OptionEntries>) -> Self {
        InputOptions::Deferred(d)
    }
}

impl From<OptionEntries> for InputOptions {
    fn from(entries: OptionEntries) -> Self {
        InputOptions::Ready(entries)
    }
}

fn label_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FromParam for InputOptions {
    fn from_param(_: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Object(map) => Some(InputOptions::Ready(
                map.iter().map(|(k, v)| (k.clone(), label_text(v))).collect(),
            )),
            Value::Array(items) => {
                let pairs: Option<OptionEntries> = items
                    .iter()
                    .map(|item| match item.as_array().map(Vec::as_slice) {
                        Some([v, l]) => Some((label_text(v), label_text(l))),
                        _ => None,
                    })
                    .collect();
                match pairs {
                    Some(pairs) => Some(InputOptions::Ready(pairs)),
                    None => {
                        diags.push(Diagnostic::invalid_input_options("object"));
                        None
                    }
                }
            }
            other => {
                diags.push(Diagnostic::invalid_input_options(js_type(other)));
                None
            }
        }
    }
}

/// Extra attributes for the input control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(pub Vec<(String, String)>);

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl FromParam for Attributes {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), label_text(v))).collect()),
            other => reject(diags, key, "object", other),
        }
    }
}

/// A caller-supplied input control.
///
/// The engine hosts it inside the input region, reads it on confirm and
/// toggles its `disabled` attribute; everything else is up to the control.
pub trait CustomControl {
    /// Build the control under `host`; return the element that takes focus.
    fn render(&self, doc: &mut Document, host: NodeId) -> Result<NodeId, DomError>;

    /// Current value.
    fn read(&self, doc: &Document, control: NodeId) -> Value;

    /// Apply `inputValue`.
    fn set_initial(&self, doc: &mut Document, control: NodeId, value: &Value) {
        let _ = (doc, control, value);
    }

    /// Built-in validity check; `Some(message)` blocks confirmation.
    fn report_validity(&self, doc: &Document, control: NodeId) -> Option<String> {
        let _ = (doc, control);
        None
    }
}

/// Shared handle to a [`CustomControl`].
#[derive(Clone)]
pub struct CustomInput(pub Rc<dyn CustomControl>);

impl fmt::Debug for CustomInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomInput(..)")
    }
}

// --- Callbacks ---------------------------------------------------------------

/// A callback answer that is either immediate or host-settled later.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ready(T),
    Later(Deferred<T>),
}

/// What the pre-confirm hook decided.
#[derive(Debug, Clone, PartialEq)]
pub enum PreConfirmVerdict {
    /// Resolve with the input value.
    Keep,
    /// Resolve with this value instead.
    Replace(Value),
    /// Stay open and interactive without resolving.
    Veto,
    /// Show this message and stay open.
    Reject(String),
}

impl PreConfirmVerdict {
    /// JSON-style return: `false` vetoes, `null` keeps, anything else replaces.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Bool(false) => PreConfirmVerdict::Veto,
            Value::Null => PreConfirmVerdict::Keep,
            other => PreConfirmVerdict::Replace(other),
        }
    }
}

/// `inputValidator`: `Some(message)` means invalid.
#[derive(Clone)]
pub struct Validator(pub Rc<dyn Fn(&Value) -> Reply<Option<String>>>);

/// `preConfirm`.
#[derive(Clone)]
pub struct PreConfirm(pub Rc<dyn Fn(&Value) -> Reply<PreConfirmVerdict>>);

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

impl fmt::Debug for PreConfirm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreConfirm(..)")
    }
}

fn reject_function<T>(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<T> {
    reject(diags, key, "function", value)
}

impl FromParam for Validator {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        reject_function(key, value, diags)
    }
}

impl FromParam for PreConfirm {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        reject_function(key, value, diags)
    }
}

impl FromParam for HookList {
    fn from_param(key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> Option<Self> {
        reject_function(key, value, diags)
    }
}

// --- Params ------------------------------------------------------------------

macro_rules! define_params {
    (
        into { $( $(#[$idoc:meta])* $ifield:ident : $ity:ty => $ikey:literal, )* }
        raw { $( $(#[$rdoc:meta])* $rfield:ident : $rty:ty => $rkey:literal, )* }
        callbacks { $( $(#[$cdoc:meta])* $cfield:ident : $cty:ty => $ckey:literal, )* }
    ) => {
        /// Declarative configuration for one popup.
        #[derive(Clone, Default)]
        pub struct Params {
            $( $(#[$idoc])* pub $ifield: Option<$ity>, )*
            $( $(#[$rdoc])* pub $rfield: Option<$rty>, )*
            $( $(#[$cdoc])* pub $cfield: Option<$cty>, )*
            /// Control for [`InputKind::Custom`]. Not a JSON key.
            pub custom_input: Option<CustomInput>,
        }

        /// Every key [`Params::from_json`] recognizes.
        pub const KNOWN_PARAMS: &[&str] = &[ $($ikey,)* $($rkey,)* $($ckey,)* ];

        impl Params {
            $(
                $(#[$idoc])*
                #[must_use]
                pub fn $ifield(mut self, value: impl Into<$ity>) -> Self {
                    self.$ifield = Some(value.into());
                    self
                }
            )*
            $(
                $(#[$rdoc])*
                #[must_use]
                pub fn $rfield(mut self, value: $rty) -> Self {
                    self.$rfield = Some(value);
                    self
                }
            )*

            /// Keys that carry a value, in declaration order.
            pub fn set_keys(&self) -> Vec<&'static str> {
                let mut keys = Vec::new();
                $( if self.$ifield.is_some() { keys.push($ikey); } )*
                $( if self.$rfield.is_some() { keys.push($rkey); } )*
                $( if self.$cfield.is_some() { keys.push($ckey); } )*
                keys
            }

            /// `self` with every key set in `overlay` replaced.
            #[must_use]
            pub fn merge(&self, overlay: &Params) -> Params {
                Params {
                    $( $ifield: overlay.$ifield.clone().or_else(|| self.$ifield.clone()), )*
                    $( $rfield: overlay.$rfield.clone().or_else(|| self.$rfield.clone()), )*
                    $( $cfield: overlay.$cfield.clone().or_else(|| self.$cfield.clone()), )*
                    custom_input: overlay.custom_input.clone().or_else(|| self.custom_input.clone()),
                }
            }

            /// Unset `key`. Returns `false` for unknown keys.
            pub fn clear_key(&mut self, key: &str) -> bool {
                match key {
                    $( $ikey => self.$ifield = None, )*
                    $( $rkey => self.$rfield = None, )*
                    $( $ckey => self.$cfield = None, )*
                    _ => return false,
                }
                true
            }

            fn parse_key(&mut self, key: &str, value: &Value, diags: &mut Vec<Diagnostic>) -> bool {
                match key {
                    $( $ikey => self.$ifield = FromParam::from_param(key, value, diags), )*
                    $( $rkey => self.$rfield = FromParam::from_param(key, value, diags), )*
                    $( $ckey => self.$cfield = FromParam::from_param(key, value, diags), )*
                    _ => return false,
                }
                true
            }
        }
    };
}

define_params! {
    into {
        /// Title, inserted as markup.
        title: Content => "title",
        /// Title, inserted as plain text.
        title_text: String => "titleText",
        /// Body, inserted as plain text.
        text: String => "text",
        /// Body, inserted as markup.
        html: Content => "html",
        footer: Content => "footer",
        icon: IconKind => "icon",
        icon_html: Content => "iconHtml",
        /// Non-modal corner notification.
        toast: bool => "toast",
        animation: bool => "animation",
        show_class: Value => "showClass",
        hide_class: Value => "hideClass",
        custom_class: CustomClass => "customClass",
        target: String => "target",
        backdrop: Backdrop => "backdrop",
        height_auto: bool => "heightAuto",
        allow_outside_click: Predicate => "allowOutsideClick",
        allow_escape_key: Predicate => "allowEscapeKey",
        allow_enter_key: Predicate => "allowEnterKey",
        stop_keydown_propagation: bool => "stopKeydownPropagation",
        keydown_listener_capture: bool => "keydownListenerCapture",
        show_confirm_button: bool => "showConfirmButton",
        show_cancel_button: bool => "showCancelButton",
        confirm_button_text: Content => "confirmButtonText",
        confirm_button_aria_label: String => "confirmButtonAriaLabel",
        confirm_button_color: String => "confirmButtonColor",
        cancel_button_text: Content => "cancelButtonText",
        cancel_button_aria_label: String => "cancelButtonAriaLabel",
        cancel_button_color: String => "cancelButtonColor",
        buttons_styling: bool => "buttonsStyling",
        reverse_buttons: bool => "reverseButtons",
        focus_confirm: bool => "focusConfirm",
        focus_cancel: bool => "focusCancel",
        show_close_button: bool => "showCloseButton",
        close_button_html: Content => "closeButtonHtml",
        close_button_aria_label: String => "closeButtonAriaLabel",
        show_loader_on_confirm: bool => "showLoaderOnConfirm",
        image_url: String => "imageUrl",
        image_width: Dimension => "imageWidth",
        image_height: Dimension => "imageHeight",
        image_alt: String => "imageAlt",
        timer_progress_bar: bool => "timerProgressBar",
        width: Dimension => "width",
        padding: Dimension => "padding",
        background: String => "background",
        input: InputKind => "input",
        input_placeholder: String => "inputPlaceholder",
        input_label: String => "inputLabel",
        input_value: Value => "inputValue",
        input_options: InputOptions => "inputOptions",
        input_auto_trim: bool => "inputAutoTrim",
        validation_message: String => "validationMessage",
        grow: Grow => "grow",
        position: String => "position",
        progress_steps_distance: Dimension => "progressStepsDistance",
        scrollbar_padding: bool => "scrollbarPadding",
    }
    raw {
        /// Auto-dismiss after this many milliseconds.
        timer: u64 => "timer",
        input_attributes: Attributes => "inputAttributes",
        progress_steps: Vec<String> => "progressSteps",
        current_progress_step: u64 => "currentProgressStep",
    }
    callbacks {
        pre_confirm: PreConfirm => "preConfirm",
        input_validator: Validator => "inputValidator",
        on_before_open: HookList => "onBeforeOpen",
        on_open: HookList => "onOpen",
        on_render: HookList => "onRender",
        on_close: HookList => "onClose",
        on_after_close: HookList => "onAfterClose",
        on_destroy: HookList => "onDestroy",
    }
}

/// Keys `update` accepts.
pub const UPDATABLE_PARAMS: &[&str] = &[
    "allowEscapeKey",
    "allowOutsideClick",
    "buttonsStyling",
    "cancelButtonAriaLabel",
    "cancelButtonColor",
    "cancelButtonText",
    "closeButtonAriaLabel",
    "closeButtonHtml",
    "confirmButtonAriaLabel",
    "confirmButtonColor",
    "confirmButtonText",
    "currentProgressStep",
    "customClass",
    "footer",
    "hideClass",
    "html",
    "icon",
    "imageAlt",
    "imageHeight",
    "imageUrl",
    "imageWidth",
    "input",
    "inputOptions",
    "inputPlaceholder",
    "inputValue",
    "inputLabel",
    "inputAttributes",
    "progressSteps",
    "reverseButtons",
    "showCancelButton",
    "showCloseButton",
    "showConfirmButton",
    "text",
    "title",
    "titleText",
];

/// Whether `name` is a recognized parameter.
pub fn is_valid_parameter(name: &str) -> bool {
    KNOWN_PARAMS.contains(&name)
}

/// Whether `name` may be passed to `update`.
pub fn is_updatable_parameter(name: &str) -> bool {
    UPDATABLE_PARAMS.contains(&name)
}

fn hook(f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static) -> Hook {
    Rc::new(f)
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object. Never fails; see the module docs.
    pub fn from_json(value: &Value) -> (Params, Vec<Diagnostic>) {
        let mut params = Params::default();
        let mut diags = Vec::new();
        let Some(map) = value.as_object() else {
            if !value.is_null() {
                diags.push(Diagnostic::invalid_type("params", "object", js_type(value)));
            }
            return (params, diags);
        };
        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            if !params.parse_key(key, value, &mut diags) {
                diags.push(Diagnostic::unknown_parameter(key));
            }
        }
        (params, diags)
    }

    /// Use a caller-supplied control as the input.
    #[must_use]
    pub fn custom_input(mut self, control: impl CustomControl + 'static) -> Self {
        self.input = Some(InputKind::Custom);
        self.custom_input = Some(CustomInput(Rc::new(control)));
        self
    }

    /// `inputValidator`.
    #[must_use]
    pub fn input_validator(
        mut self,
        f: impl Fn(&Value) -> Reply<Option<String>> + 'static,
    ) -> Self {
        self.input_validator = Some(Validator(Rc::new(f)));
        self
    }

    /// `preConfirm`.
    #[must_use]
    pub fn pre_confirm(mut self, f: impl Fn(&Value) -> Reply<PreConfirmVerdict> + 'static) -> Self {
        self.pre_confirm = Some(PreConfirm(Rc::new(f)));
        self
    }

    /// Add an `onBeforeOpen` listener: popup built, not yet visible.
    #[must_use]
    pub fn on_before_open(
        mut self,
        f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static,
    ) -> Self {
        self.on_before_open.get_or_insert_with(Vec::new).push(hook(f));
        self
    }

    /// Add an `onRender` listener: after open and after every `update`.
    #[must_use]
    pub fn on_render(mut self, f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static) -> Self {
        self.on_render.get_or_insert_with(Vec::new).push(hook(f));
        self
    }

    /// Add an `onOpen` listener: popup visible and focused.
    #[must_use]
    pub fn on_open(mut self, f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static) -> Self {
        self.on_open.get_or_insert_with(Vec::new).push(hook(f));
        self
    }

    /// Add an `onClose` listener: outcome settled, DOM still mounted.
    #[must_use]
    pub fn on_close(mut self, f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static) -> Self {
        self.on_close.get_or_insert_with(Vec::new).push(hook(f));
        self
    }

    /// Add an `onAfterClose` listener: DOM unmounted.
    #[must_use]
    pub fn on_after_close(
        mut self,
        f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static,
    ) -> Self {
        self.on_after_close.get_or_insert_with(Vec::new).push(hook(f));
        self
    }

    /// Add an `onDestroy` listener: instance gone, also when replaced.
    #[must_use]
    pub fn on_destroy(mut self, f: impl Fn(&mut dyn PopupControl) -> HookResult + 'static) -> Self {
        self.on_destroy.get_or_insert_with(Vec::new).push(hook(f));
        self
    }

    /// Whether the popup is a toast.
    pub fn is_toast(&self) -> bool {
        self.toast.unwrap_or(false)
    }

    /// Auto-close delay in milliseconds. `timer: 0` means no timer.
    pub fn auto_close_ms(&self) -> Option<u64> {
        self.timer.filter(|&ms| ms > 0)
    }

    /// Whether the popup traps focus and blocks the page.
    pub fn is_modal(&self) -> bool {
        !self.is_toast() && self.backdrop.as_ref().is_none_or(Backdrop::is_enabled)
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params")
            .field("keys", &self.set_keys())
            .field("custom_input", &self.custom_input.is_some())
            .finish()
    }
}

// --- Positional shorthand ----------------------------------------------------

/// One argument to `fire_args`.
#[derive(Debug, Clone)]
pub enum FireArg {
    /// Full params; only honored as the first argument.
    Params(Params),
    /// Text for a positional slot.
    Text(String),
    /// Element for a positional slot.
    Element(Markup),
    /// Any other JSON value. An object as the first argument is parsed as
    /// params; anything else is reported.
    Json(Value),
    /// An explicitly absent slot.
    Undefined,
}

impl From<&str> for FireArg {
    fn from(s: &str) -> Self {
        FireArg::Text(s.to_string())
    }
}

impl From<Params> for FireArg {
    fn from(p: Params) -> Self {
        FireArg::Params(p)
    }
}

impl From<Markup> for FireArg {
    fn from(m: Markup) -> Self {
        FireArg::Element(m)
    }
}

impl From<Value> for FireArg {
    fn from(v: Value) -> Self {
        FireArg::Json(v)
    }
}

const SHORTHAND_SLOTS: [&str; 3] = ["title", "html", "icon"];

impl Params {
    /// Turn `fire(title, html, icon)`-style arguments into params.
    pub fn from_args(args: &[FireArg]) -> (Params, Vec<Diagnostic>) {
        match args.first() {
            Some(FireArg::Params(p)) => return (p.clone(), Vec::new()),
            Some(FireArg::Json(v)) if v.is_object() => return Params::from_json(v),
            _ => {}
        }
        let mut params = Params::default();
        let mut diags = Vec::new();
        for (slot, arg) in SHORTHAND_SLOTS.into_iter().zip(args) {
            let content = match arg {
                FireArg::Undefined | FireArg::Json(Value::Null) => continue,
                FireArg::Text(s) => Content::Html(s.clone()),
                FireArg::Element(m) => Content::Element(m.clone()),
                FireArg::Params(_) => {
                    diags.push(Diagnostic::unexpected_shorthand(slot, "object"));
                    continue;
                }
                FireArg::Json(Value::String(s)) => Content::Html(s.clone()),
                FireArg::Json(other) => {
                    diags.push(Diagnostic::unexpected_shorthand(slot, js_type(other)));
                    continue;
                }
            };
            match (slot, content) {
                ("title", c) => params.title = Some(c),
                ("html", c) => params.html = Some(c),
                (_, Content::Html(s)) => {
                    params.icon = IconKind::from_param("icon", &Value::String(s), &mut diags);
                }
                (_, _) => diags.push(Diagnostic::unexpected_shorthand(slot, "object")),
            }
        }
        (params, diags)
    }
}
