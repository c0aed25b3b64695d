#![forbid(unsafe_code)]

//! Collaborator services the popup engine calls synchronously.
//!
//! These are the seams between the lifecycle engine and everything it does
//! not own: the exact skeleton markup, page-level styling, and how content
//! is inserted. The engine never builds elements itself; it asks a
//! [`DomBuilder`] for a [`PopupRegions`] map and paints through it.
//!
//! # Failure Modes
//!
//! Every method may fail with a [`DomError`]. The engine logs the failure
//! under `fpop.dom`, records a diagnostic, and continues with whatever state
//! the document is in. A failing [`DomBuilder::build`] is the one exception:
//! without a skeleton there is nothing to open, so `fire` resolves the
//! outcome as a reason-less dismissal instead.

use crate::document::{Document, DomError, NodeId};
use crate::markup::{Content, Markup};
use crate::regions::{ICON_TYPES, PopupRegions, Region, class_name};

/// Builds and tears down the popup skeleton.
pub trait DomBuilder {
    /// Build a fresh skeleton under `target`, fully hidden.
    fn build(&self, doc: &mut Document, target: NodeId, toast: bool)
    -> Result<PopupRegions, DomError>;

    /// Remove a skeleton built by [`build`](Self::build).
    fn destroy(&self, doc: &mut Document, regions: &PopupRegions) -> Result<(), DomError>;

    /// Replace the caller-supplied classes on `node`: remove `previous`,
    /// add `next`. Engine-owned classes are untouched.
    fn apply_classes(&self, doc: &mut Document, node: NodeId, previous: &[String], next: &[String]) {
        for class in previous {
            doc.remove_class(node, class);
        }
        for class in next {
            doc.add_class(node, class);
        }
    }
}

/// Page-level styling requested while a popup is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStyle {
    pub toast: bool,
    pub backdrop: bool,
    pub height_auto: bool,
    pub scrollbar_padding: bool,
    /// Width of the page scrollbar in px, as measured by the host (0 = none).
    pub scrollbar_width: u32,
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            toast: false,
            backdrop: true,
            height_auto: true,
            scrollbar_padding: true,
            scrollbar_width: 0,
        }
    }
}

/// Page classes, scrollbar compensation and inline style pass-through.
pub trait StyleService {
    /// Apply page-level state when a popup becomes shown.
    fn on_open(&self, doc: &mut Document, style: &PageStyle) -> Result<(), DomError>;

    /// Undo everything [`on_open`](Self::on_open) did.
    fn on_close(&self, doc: &mut Document) -> Result<(), DomError>;

    /// Set (`Some`) or clear (`None`) an inline style property.
    fn apply_inline(&self, doc: &mut Document, node: NodeId, prop: &str, value: Option<&str>) {
        doc.set_style(node, prop, value.unwrap_or(""));
    }
}

/// Inserts region content as markup or as plain text.
pub trait MarkupService {
    /// Replace the children of `target` with `content`.
    fn insert(&self, doc: &mut Document, target: NodeId, content: &Content) -> Result<(), DomError>;
}

/// The three collaborators, boxed so hosts can swap any of them.
pub struct Services {
    pub dom: Box<dyn DomBuilder>,
    pub style: Box<dyn StyleService>,
    pub markup: Box<dyn MarkupService>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            dom: Box::new(DefaultDomBuilder),
            style: Box::new(DefaultStyleService),
            markup: Box::new(DefaultMarkupService),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

// --- Defaults ----------------------------------------------------------------

/// Stock skeleton:
///
/// ```text
/// div.fpop-container
/// └─ div.fpop-popup [role=dialog aria-modal tabindex=-1]
///    ├─ div.fpop-header
///    │  ├─ button.fpop-close
///    │  ├─ div.fpop-icon.fpop-{success,error,warning,info,question}
///    │  ├─ img.fpop-image
///    │  └─ h2.fpop-title
///    ├─ div.fpop-content
///    │  ├─ div.fpop-html-container
///    │  ├─ label.fpop-input-label
///    │  ├─ div.fpop-input
///    │  └─ div.fpop-validation-message
///    ├─ div.fpop-actions
///    │  ├─ div.fpop-loader
///    │  ├─ button.fpop-confirm
///    │  └─ button.fpop-cancel
///    ├─ div.fpop-footer
///    └─ div.fpop-timer-progress-bar
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDomBuilder;

const TITLE_ID: &str = "fpop-title";
const HTML_ID: &str = "fpop-html-container";

impl DefaultDomBuilder {
    fn skeleton(toast: bool) -> Markup {
        let el = |region: Region, tag: &str| Markup::element(tag).attr("class", region.class());
        let button = |region: Region| el(region, "button").attr("type", "button");

        let mut popup = el(Region::Popup, "div").attr("tabindex", "-1");
        popup = if toast {
            popup.attr("role", "alert").attr("aria-live", "polite")
        } else {
            popup
                .attr("role", "dialog")
                .attr("aria-modal", "true")
                .attr("aria-labelledby", TITLE_ID)
                .attr("aria-describedby", HTML_ID)
        };

        let mut header = el(Region::Header, "div").child(button(Region::CloseButton));
        for kind in ICON_TYPES {
            header = header.child(
                Markup::element("div")
                    .attr("class", format!("{} {}", Region::Icon.class(), class_name(kind))),
            );
        }
        let header = header
            .child(el(Region::Image, "img"))
            .child(el(Region::Title, "h2").attr("id", TITLE_ID));
        let content = el(Region::Content, "div")
            .child(el(Region::HtmlContainer, "div").attr("id", HTML_ID))
            .child(el(Region::InputLabel, "label"))
            .child(el(Region::InputHost, "div"))
            .child(el(Region::ValidationMessage, "div").attr("role", "alert"));
        let actions = el(Region::Actions, "div")
            .child(el(Region::Loader, "div"))
            .child(button(Region::ConfirmButton))
            .child(button(Region::CancelButton));

        el(Region::Container, "div").child(
            popup
                .child(header)
                .child(content)
                .child(actions)
                .child(el(Region::Footer, "div"))
                .child(el(Region::TimerProgressBar, "div")),
        )
    }
}

impl DomBuilder for DefaultDomBuilder {
    fn build(
        &self,
        doc: &mut Document,
        target: NodeId,
        toast: bool,
    ) -> Result<PopupRegions, DomError> {
        let root = doc.append_markup(target, &Self::skeleton(toast))?;
        let mut missing = None;
        let regions = PopupRegions::from_fn(|region| {
            let class = region.class();
            if doc.has_class(root, &class) {
                return root;
            }
            doc.find_first(root, |d, n| d.has_class(n, &class))
                .unwrap_or_else(|| {
                    missing.get_or_insert(region);
                    root
                })
        });
        let header = regions.get(Region::Header);
        let icon_class = Region::Icon.class();
        let icons = ICON_TYPES.map(|kind| {
            let kind = class_name(kind);
            doc.find_first(header, |d, n| d.has_class(n, &icon_class) && d.has_class(n, &kind))
        });
        if missing.is_some() || icons.contains(&None) {
            doc.remove(root)?;
            return Err(DomError::Missing("popup region"));
        }
        let regions = regions.with_icons(icons.map(|n| n.unwrap_or(root)));
        for (region, node) in regions.iter() {
            if region != Region::Container {
                doc.hide(node);
            }
        }
        for &icon in regions.icons() {
            doc.hide(icon);
        }
        if toast {
            doc.add_class(root, &class_name("toast-container"));
            doc.add_class(regions.popup(), &class_name("toast"));
        } else {
            doc.add_class(root, &class_name("backdrop-show"));
            doc.add_class(regions.popup(), &class_name("modal"));
        }
        tracing::trace!(target: "fpop.dom", root = root.index(), toast, "skeleton built");
        Ok(regions)
    }

    fn destroy(&self, doc: &mut Document, regions: &PopupRegions) -> Result<(), DomError> {
        doc.remove(regions.root())
    }
}

/// Default page styling: `fpop-shown`, `fpop-height-auto`,
/// `fpop-no-backdrop`, `fpop-toast-shown` on `<html>` and `<body>`, plus
/// body `padding-right` compensation for a hidden scrollbar.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStyleService;

/// Body attribute remembering the padding we replaced.
const SAVED_PADDING_ATTR: &str = "data-fpop-padding-right";

const PAGE_CLASSES: [&str; 4] = ["shown", "height-auto", "no-backdrop", "toast-shown"];

impl StyleService for DefaultStyleService {
    fn on_open(&self, doc: &mut Document, style: &PageStyle) -> Result<(), DomError> {
        let (html, body) = (doc.document_element(), doc.body());
        for node in [html, body] {
            doc.add_class(node, &class_name("shown"));
            doc.toggle_class(node, &class_name("toast-shown"), style.toast);
            doc.toggle_class(
                node,
                &class_name("height-auto"),
                style.height_auto && !style.toast,
            );
            doc.toggle_class(node, &class_name("no-backdrop"), !style.backdrop);
        }
        let compensate = style.scrollbar_padding && !style.toast && style.scrollbar_width > 0;
        if compensate && !doc.has_attribute(body, SAVED_PADDING_ATTR) {
            let previous = doc.style(body, "padding-right").unwrap_or("").to_string();
            let base: u32 = previous
                .trim_end_matches("px")
                .trim()
                .parse()
                .unwrap_or(0);
            doc.set_attribute(body, SAVED_PADDING_ATTR, &previous);
            doc.set_style(
                body,
                "padding-right",
                &format!("{}px", base + style.scrollbar_width),
            );
        }
        Ok(())
    }

    fn on_close(&self, doc: &mut Document) -> Result<(), DomError> {
        let (html, body) = (doc.document_element(), doc.body());
        for node in [html, body] {
            for class in PAGE_CLASSES {
                doc.remove_class(node, &class_name(class));
            }
        }
        if let Some(previous) = doc.attribute(body, SAVED_PADDING_ATTR).map(str::to_string) {
            doc.set_style(body, "padding-right", &previous);
            doc.remove_attribute(body, SAVED_PADDING_ATTR);
        }
        Ok(())
    }
}

/// Markup is parsed, text is inserted verbatim, elements are materialized.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMarkupService;

impl MarkupService for DefaultMarkupService {
    fn insert(&self, doc: &mut Document, target: NodeId, content: &Content) -> Result<(), DomError> {
        match content {
            Content::Html(html) => doc.set_inner_html(target, html),
            Content::Text(text) => {
                doc.set_text_content(target, text);
                Ok(())
            }
            Content::Element(markup) => {
                doc.clear_children(target);
                doc.append_markup(target, markup).map(|_| ())
            }
        }
    }
}
