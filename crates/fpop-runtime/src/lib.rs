#![forbid(unsafe_code)]

//! fpop runtime
//!
//! The popup engine and the machinery it drives.
//!
//! # Key Components
//!
//! - [`Popup`] - Single-instance engine: fire, update, close, events, time
//! - [`PopupStrategy`] - Seam for argument parsing and parameter defaults
//! - [`Reconciler`] - Paints parameters into the popup skeleton
//! - [`FocusTrap`] - Keeps keyboard focus inside a modal popup
//! - [`InputWidget`] - Renders, reads and validates the built-in inputs
//! - [`ValidationPipeline`] - Validator then pre-confirm, sync or deferred
//!
//! # Role in fpop
//! `fpop-runtime` is the orchestrator. It consumes [`PopupEvent`]s and
//! parameters from `fpop-core`, mutates the page through `fpop-dom`, and
//! settles each popup's [`Outcome`] exactly once.
//!
//! # How it fits in the system
//! The host owns the clock and the event loop. It calls
//! [`Popup::dispatch`], [`Popup::advance`] and [`Popup::pump`]; the engine
//! never blocks and never spawns.
//!
//! [`PopupEvent`]: fpop_core::PopupEvent
//! [`Outcome`]: fpop_core::Outcome

pub mod config;
pub mod error;
pub mod focus;
pub mod input;
pub mod lifecycle;
pub mod popup;
pub mod reconcile;
pub mod strategy;
pub mod validation;

pub use config::PopupConfig;
pub use error::PopupError;
pub use focus::{FocusTrap, focusable_elements, initial_focus, is_focusable};
pub use input::{CONTROL_ID, InputSpec, InputWidget};
pub use lifecycle::{HookPoint, InstanceId, Phase};
pub use popup::Popup;
pub use reconcile::{INPUT_KEYS, Reconciler};
pub use strategy::{DefaultStrategy, Mixin, PopupStrategy};
pub use validation::{AttemptRecord, ValidationPipeline, ValidationStep};
