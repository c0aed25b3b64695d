#![forbid(unsafe_code)]

//! fpop public facade crate.
//!
//! This crate provides the stable surface area for hosts. It re-exports the
//! common types from the internal crates and offers a prelude for
//! day-to-day usage.
//!
//! ```
//! use fpop::prelude::*;
//!
//! let mut popup = Popup::new();
//! let outcome = popup.fire(Params::new().title("Saved").show_cancel_button(true));
//! popup.click_cancel();
//! assert_eq!(
//!     outcome.try_result(),
//!     Some(PopupResult::dismissed(DismissReason::Cancel))
//! );
//! ```

// --- Core re-exports -------------------------------------------------------

pub use fpop_core::params::{
    Attributes, Backdrop, CustomClass, CustomControl, Dimension, Grow, IconKind, InputKind,
    InputOptions, OptionEntries, PreConfirmVerdict, Predicate, Reply,
};
pub use fpop_core::{
    Deferred, Diagnostic, DiagnosticKind, Diagnostics, DismissReason, FireArg, Hook, HookError,
    HookResult, KeyCode, KeyEvent, KeyEventKind, Modifiers, Outcome, Params, PopupControl,
    PopupEvent, PopupResult, Settler, Severity, Timer, deferred, is_updatable_parameter,
    is_valid_parameter,
};

// --- DOM re-exports --------------------------------------------------------

pub use fpop_dom::{
    Content, DomBuilder, DomError, Document, Markup, MarkupService, NodeId, PageStyle,
    PopupRegions, Region, Services, StyleService,
};

// --- Runtime re-exports ----------------------------------------------------

pub use fpop_runtime::{
    DefaultStrategy, Mixin, Phase, Popup, PopupConfig, PopupError, PopupStrategy,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for fpop hosts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine rejected its input.
    #[error(transparent)]
    Popup(#[from] PopupError),
    /// Document operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Standard result type for fpop APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Fire a popup from JSON text, mapping failures into [`Error`].
pub fn fire_json(popup: &mut Popup, json: &str) -> Result<Outcome> {
    Ok(popup.fire_json(json)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        DismissReason, Error, InputKind, KeyCode, KeyEvent, Outcome, Params, Popup, PopupConfig,
        PopupControl, PopupEvent, PopupResult, Region, Reply, Result,
    };

    pub use crate::{core, dom, runtime};
}

pub use fpop_core as core;
pub use fpop_dom as dom;
pub use fpop_runtime as runtime;
