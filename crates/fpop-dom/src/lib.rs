#![forbid(unsafe_code)]

//! Headless document layer for fpop.
//!
//! # Role in fpop
//! `fpop-dom` is the leaf of the workspace. It owns the in-memory document
//! the popup engine paints into, the markup fragment parser used for
//! `html`/`title`/`footer` content, the names of the popup regions, and the
//! three collaborator services the engine calls synchronously:
//!
//! - [`DomBuilder`]: builds and destroys the region skeleton, applies class lists.
//! - [`StyleService`]: page-level classes, scrollbar compensation, inline styles.
//! - [`MarkupService`]: safe plain-text vs. markup insertion.
//!
//! # How it fits in the system
//! `fpop-core` builds its parameter vocabulary on [`Content`] and [`Region`];
//! `fpop-runtime` drives the document through these services. Nothing here
//! knows about the popup lifecycle.

pub mod document;
pub mod markup;
pub mod regions;
pub mod services;

pub use document::{Document, DomError, NodeId};
pub use markup::{Content, Markup, escape_text, parse_fragment};
pub use regions::{CLASS_PREFIX, ICON_TYPES, PopupRegions, Region, class_name};
pub use services::{
    DefaultDomBuilder, DefaultMarkupService, DefaultStyleService, DomBuilder, MarkupService,
    PageStyle, Services, StyleService,
};
