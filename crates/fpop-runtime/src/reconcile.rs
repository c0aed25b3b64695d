#![forbid(unsafe_code)]

//! Render reconciler.
//!
//! Paints a parameter set onto an already-built skeleton. The same entry
//! point serves the initial open and every `update()`: painting is a pure
//! function of the effective params plus the caller classes applied last
//! time, so repainting with unchanged params leaves the document unchanged.
//!
//! The input widget is the one stateful exception. It is only rebuilt when
//! the caller asks for it (open, or an update touching one of
//! [`INPUT_KEYS`]), so typed text and focus survive unrelated updates.
//!
//! # Invariants
//!
//! 1. Each region carries exactly the caller classes of the latest paint.
//! 2. The confirm button precedes the cancel button unless `reverseButtons`.
//! 3. While options are pending, the widget is disabled.
//! 4. Collaborator failures never abort a paint; the remaining regions are
//!    still painted.

use ahash::AHashMap;
use fpop_core::params::{
    Backdrop, CustomClass, Dimension, Grow, InputKind, InputOptions, OptionEntries,
};
use fpop_core::{Deferred, Diagnostic, Diagnostics, Params};
use fpop_dom::{Content, Document, NodeId, PopupRegions, Region, Services, class_name};

use crate::input::{CONTROL_ID, InputSpec, InputWidget};

/// Keys whose change rebuilds the input widget.
pub const INPUT_KEYS: &[&str] = &[
    "input",
    "inputOptions",
    "inputValue",
    "inputPlaceholder",
    "inputAttributes",
];

const POSITIONS: &[&str] = &[
    "top",
    "top-start",
    "top-end",
    "top-left",
    "top-right",
    "center",
    "center-start",
    "center-end",
    "center-left",
    "center-right",
    "bottom",
    "bottom-start",
    "bottom-end",
    "bottom-left",
    "bottom-right",
];

const GROW_CLASSES: [(Grow, &str); 3] = [
    (Grow::Row, "grow-row"),
    (Grow::Column, "grow-column"),
    (Grow::Fullscreen, "grow-fullscreen"),
];

/// Everything a paint touches.
pub struct PaintCx<'a> {
    pub doc: &'a mut Document,
    pub services: &'a Services,
    pub regions: PopupRegions,
    pub diagnostics: &'a mut Diagnostics,
}

impl PaintCx<'_> {
    #[inline]
    fn node(&self, region: Region) -> NodeId {
        self.regions.get(region)
    }

    fn insert(&mut self, region: Region, content: &Content) {
        let node = self.node(region);
        if let Err(err) = self.services.markup.insert(self.doc, node, content) {
            self.diagnostics
                .push(Diagnostic::collaborator_failed(&format!("insert {}", region.suffix()), &err));
        }
    }

    fn inline(&mut self, region: Region, prop: &str, value: Option<&str>) {
        let node = self.node(region);
        self.services.style.apply_inline(self.doc, node, prop, value);
    }

    /// Fill `region` with `content` and show it, or empty and hide it.
    fn fill(&mut self, region: Region, content: Option<&Content>, display: &str) {
        match content.filter(|c| !c.is_empty()) {
            Some(content) => {
                self.insert(region, content);
                let node = self.node(region);
                self.doc.show(node, display);
            }
            None => {
                let node = self.node(region);
                self.doc.clear_children(node);
                self.doc.hide(node);
            }
        }
    }
}

/// The input widget of one instance plus its pending option producer.
#[derive(Debug, Default)]
pub struct InputState {
    pub widget: Option<InputWidget>,
    pub pending_options: Option<Deferred<OptionEntries>>,
}

impl InputState {
    /// Whether options are still being produced.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending_options.is_some()
    }

    /// Render options that settled since the last call. Returns `true` when
    /// the widget became interactive.
    pub fn poll_options(&mut self, cx: &mut PaintCx<'_>, params: &Params) -> bool {
        let Some(entries) = self.pending_options.as_ref().and_then(Deferred::get) else {
            return false;
        };
        self.pending_options = None;
        let Some(widget) = &self.widget else {
            return false;
        };
        if let Err(err) = widget.set_options(cx.doc, &entries) {
            cx.diagnostics
                .push(Diagnostic::collaborator_failed("render input options", &err));
        }
        if let Some(value) = &params.input_value {
            widget.set_initial(cx.doc, value);
        }
        widget.set_enabled(cx.doc, true);
        tracing::debug!(target: "fpop.lifecycle", options = entries.len(), "input options settled");
        true
    }
}

/// Paints params onto a skeleton, remembering the caller classes it applied.
#[derive(Debug, Default)]
pub struct Reconciler {
    classes: AHashMap<Region, Vec<String>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller classes currently applied to `region`.
    pub fn applied_classes(&self, region: Region) -> &[String] {
        self.classes.get(&region).map_or(&[], Vec::as_slice)
    }

    /// Paint `params`. `rebuild_input` re-renders the input widget.
    pub fn paint(
        &mut self,
        cx: &mut PaintCx<'_>,
        params: &Params,
        rebuild_input: bool,
        input: &mut InputState,
    ) {
        self.select_icon(cx, params);
        self.paint_classes(cx, params);
        paint_popup(cx, params);
        paint_header(cx, params);
        paint_content(cx, params);
        paint_input(cx, params, rebuild_input, input);
        paint_actions(cx, params);
        cx.fill(Region::Footer, params.footer.as_ref(), "flex");
        let bar = cx.node(Region::TimerProgressBar);
        let show_bar =
            params.auto_close_ms().is_some() && params.timer_progress_bar.unwrap_or(false);
        cx.doc.toggle_display(bar, show_bar, "block");
        tracing::trace!(
            target: "fpop.lifecycle",
            keys = params.set_keys().len(),
            rebuild_input,
            "painted"
        );
    }

    /// Point [`Region::Icon`] at the node of `params.icon`, moving the
    /// caller's icon classes off the previous one. Without an icon the
    /// selection stays where it was.
    fn select_icon(&mut self, cx: &mut PaintCx<'_>, params: &Params) {
        let Some(next) = params.icon.and_then(|kind| cx.regions.icon(kind.as_str())) else {
            return;
        };
        let previous = cx.node(Region::Icon);
        if next == previous {
            return;
        }
        if let Some(applied) = self.classes.remove(&Region::Icon) {
            cx.services.dom.apply_classes(cx.doc, previous, &applied, &[]);
        }
        cx.regions.select_icon(next);
    }

    fn paint_classes(&mut self, cx: &mut PaintCx<'_>, params: &Params) {
        let none = CustomClass::default();
        let custom = params.custom_class.as_ref().unwrap_or(&none);
        for region in Region::ALL {
            if region.custom_class_key().is_none() {
                continue;
            }
            let next = custom.classes_for(region).to_vec();
            let previous = self.classes.remove(&region).unwrap_or_default();
            if previous != next {
                cx.services
                    .dom
                    .apply_classes(cx.doc, cx.regions.get(region), &previous, &next);
            }
            if !next.is_empty() {
                self.classes.insert(region, next);
            }
        }
    }
}

fn paint_popup(cx: &mut PaintCx<'_>, params: &Params) {
    let css = |d: &Option<Dimension>| d.as_ref().map(Dimension::to_css);
    cx.inline(Region::Popup, "width", css(&params.width).as_deref());
    cx.inline(Region::Popup, "padding", css(&params.padding).as_deref());
    cx.inline(Region::Popup, "background", params.background.as_deref());

    let backdrop = match &params.backdrop {
        Some(Backdrop::Css(css)) if !params.is_toast() => Some(css.as_str()),
        _ => None,
    };
    cx.inline(Region::Container, "background", backdrop);

    let container = cx.node(Region::Container);
    let position = match params.position.as_deref() {
        Some(p) if POSITIONS.contains(&p) => p,
        Some(p) => {
            tracing::debug!(target: "fpop.params", position = p, "unknown position, using center");
            "center"
        }
        None => "center",
    };
    for p in POSITIONS {
        cx.doc.toggle_class(container, &class_name(p), *p == position);
    }
    let grow = params.grow.unwrap_or(Grow::Off);
    for (mode, class) in GROW_CLASSES {
        cx.doc.toggle_class(container, &class_name(class), grow == mode);
    }
}

fn paint_header(cx: &mut PaintCx<'_>, params: &Params) {
    let header = cx.node(Region::Header);
    cx.doc.show(header, "flex");
    let close = cx.node(Region::CloseButton);
    let html = params
        .close_button_html
        .clone()
        .unwrap_or_else(|| Content::from("&times;"));
    cx.insert(Region::CloseButton, &html);
    let label = params
        .close_button_aria_label
        .as_deref()
        .unwrap_or("Close this dialog");
    cx.doc.set_attribute(close, "aria-label", label);
    cx.doc
        .toggle_display(close, params.show_close_button.unwrap_or(false), "flex");

    // Only the selected icon is ever shown.
    let active = params.icon.map(|_| cx.node(Region::Icon));
    let regions = cx.regions;
    for &icon in regions.icons() {
        if Some(icon) != active {
            cx.doc.clear_children(icon);
            cx.doc.hide(icon);
        }
    }
    if let Some(icon) = active {
        match &params.icon_html {
            Some(html) => cx.insert(Region::Icon, html),
            None => cx.doc.clear_children(icon),
        }
        cx.doc.show(icon, "flex");
    }

    let image = cx.node(Region::Image);
    match &params.image_url {
        Some(url) => {
            cx.doc.set_attribute(image, "src", url);
            cx.doc
                .set_attribute(image, "alt", params.image_alt.as_deref().unwrap_or(""));
            cx.doc.show(image, "block");
        }
        None => {
            cx.doc.remove_attribute(image, "src");
            cx.doc.remove_attribute(image, "alt");
            cx.doc.hide(image);
        }
    }
    let css = |d: &Option<Dimension>| d.as_ref().map(Dimension::to_css);
    cx.inline(Region::Image, "width", css(&params.image_width).as_deref());
    cx.inline(Region::Image, "height", css(&params.image_height).as_deref());

    // titleText wins over title.
    let title = params
        .title_text
        .clone()
        .map(Content::Text)
        .or_else(|| params.title.clone());
    cx.fill(Region::Title, title.as_ref(), "block");
}

fn paint_content(cx: &mut PaintCx<'_>, params: &Params) {
    let content = cx.node(Region::Content);
    cx.doc.show(content, "block");
    // html wins over text.
    let body = params
        .html
        .clone()
        .or_else(|| params.text.clone().map(Content::Text));
    cx.fill(Region::HtmlContainer, body.as_ref(), "block");
}

fn paint_input(cx: &mut PaintCx<'_>, params: &Params, rebuild: bool, input: &mut InputState) {
    let host = cx.node(Region::InputHost);
    let label = cx.node(Region::InputLabel);

    let Some(kind) = params.input else {
        if input.widget.take().is_some() {
            cx.doc.clear_children(host);
        }
        input.pending_options = None;
        cx.doc.hide(host);
        cx.doc.clear_children(label);
        cx.doc.hide(label);
        return;
    };

    if rebuild || input.widget.is_none() {
        let spec = InputSpec {
            kind,
            placeholder: params.input_placeholder.as_deref(),
            attributes: params.input_attributes.as_ref(),
            custom: params.custom_input.as_ref(),
            has_options: kind == InputKind::Checkbox && params.input_options.is_some(),
        };
        input.pending_options = None;
        input.widget = match InputWidget::render(cx.doc, host, &spec) {
            Ok(widget) => {
                if kind.takes_options() {
                    match &params.input_options {
                        Some(InputOptions::Ready(entries)) => {
                            if let Err(err) = widget.set_options(cx.doc, entries) {
                                cx.diagnostics
                                    .push(Diagnostic::collaborator_failed("render input options", &err));
                            }
                        }
                        Some(InputOptions::Deferred(d)) => {
                            widget.set_enabled(cx.doc, false);
                            input.pending_options = Some(d.clone());
                        }
                        None => {}
                    }
                }
                if input.pending_options.is_none()
                    && let Some(value) = &params.input_value
                {
                    widget.set_initial(cx.doc, value);
                }
                Some(widget)
            }
            Err(err) => {
                cx.diagnostics
                    .push(Diagnostic::collaborator_failed("render input", &err));
                None
            }
        };
        // Settled producers render right away.
        input.poll_options(cx, params);
    }
    cx.doc.toggle_display(host, input.widget.is_some(), "flex");

    match &params.input_label {
        Some(text) if input.widget.is_some() => {
            cx.doc.set_text_content(label, text);
            cx.doc.set_attribute(label, "for", CONTROL_ID);
            cx.doc.show(label, "block");
        }
        _ => {
            cx.doc.clear_children(label);
            cx.doc.remove_attribute(label, "for");
            cx.doc.hide(label);
        }
    }
}

struct ButtonSpec<'a> {
    region: Region,
    shown: bool,
    text: Option<&'a Content>,
    default_text: &'static str,
    aria_label: Option<&'a str>,
    color: Option<&'a str>,
}

fn paint_button(cx: &mut PaintCx<'_>, spec: &ButtonSpec<'_>, styled: bool) {
    let node = cx.node(spec.region);
    let default = Content::from(spec.default_text);
    cx.insert(spec.region, spec.text.unwrap_or(&default));
    match spec.aria_label {
        Some(label) => cx.doc.set_attribute(node, "aria-label", label),
        None => cx.doc.remove_attribute(node, "aria-label"),
    }
    cx.doc.toggle_class(node, &class_name("styled"), styled);
    cx.inline(
        spec.region,
        "background-color",
        spec.color.filter(|_| styled),
    );
    cx.doc.toggle_display(node, spec.shown, "inline-block");
}

fn paint_actions(cx: &mut PaintCx<'_>, params: &Params) {
    let styled = params.buttons_styling.unwrap_or(true);
    let confirm = ButtonSpec {
        region: Region::ConfirmButton,
        shown: params.show_confirm_button.unwrap_or(true),
        text: params.confirm_button_text.as_ref(),
        default_text: "OK",
        aria_label: params.confirm_button_aria_label.as_deref(),
        color: params.confirm_button_color.as_deref(),
    };
    let cancel = ButtonSpec {
        region: Region::CancelButton,
        shown: params.show_cancel_button.unwrap_or(false),
        text: params.cancel_button_text.as_ref(),
        default_text: "Cancel",
        aria_label: params.cancel_button_aria_label.as_deref(),
        color: params.cancel_button_color.as_deref(),
    };
    paint_button(cx, &confirm, styled);
    paint_button(cx, &cancel, styled);

    let actions = cx.node(Region::Actions);
    let (first, second) = if params.reverse_buttons.unwrap_or(false) {
        (cx.node(Region::CancelButton), cx.node(Region::ConfirmButton))
    } else {
        (cx.node(Region::ConfirmButton), cx.node(Region::CancelButton))
    };
    if let Err(err) = cx.doc.insert_before(actions, first, Some(second)) {
        cx.diagnostics
            .push(Diagnostic::collaborator_failed("order buttons", &err));
    }

    let loader = cx.node(Region::Loader);
    let visible = confirm.shown || cancel.shown || !cx.doc.hides_itself(loader);
    cx.doc.toggle_display(actions, visible, "flex");
}
