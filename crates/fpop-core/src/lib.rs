#![forbid(unsafe_code)]

//! Core vocabulary for fpop.
//!
//! # Role in fpop
//! `fpop-core` holds the types every other crate speaks: host input events,
//! the result model and its one-shot channel, host-settled deferred values,
//! the countdown timer, non-fatal diagnostics, popup parameters, and the
//! control surface handed to lifecycle hooks.
//!
//! # How it fits in the system
//! `fpop-runtime` owns the engine and implements [`PopupControl`]. Hosts
//! mostly touch [`Params`], [`PopupEvent`] and [`Outcome`], usually through
//! the `fpop` facade.

pub mod control;
pub mod deferred;
pub mod diagnostics;
pub mod event;
pub mod params;
pub mod result;
pub mod timer;

pub use control::PopupControl;
pub use deferred::{Deferred, Settler, deferred};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers, PopupEvent};
pub use params::{
    Attributes, Backdrop, CustomClass, CustomControl, Dimension, FireArg, Grow, Hook, HookError,
    HookResult, IconKind, InputKind, InputOptions, KNOWN_PARAMS, OptionEntries, Params,
    PreConfirmVerdict, Predicate, Reply, UPDATABLE_PARAMS, is_updatable_parameter,
    is_valid_parameter,
};
pub use result::{DismissReason, Outcome, PopupResult, Resolver, outcome_channel};
pub use timer::Timer;
