#![forbid(unsafe_code)]

//! The handle lifecycle hooks receive.
//!
//! Hooks run in the middle of a transition, so they never get the engine
//! itself. They get a [`PopupControl`]: reads see the live document and the
//! current instance, while every state-changing call is queued and runs
//! after the current transition step finishes.

use fpop_dom::{Document, NodeId, Region};

use crate::params::Params;
use crate::result::{Outcome, PopupResult};

/// Control surface available to hooks.
pub trait PopupControl {
    /// The page document.
    fn document(&self) -> &Document;

    /// The page document, mutably. Structural edits inside the popup are
    /// allowed; removing popup regions is not.
    fn document_mut(&mut self) -> &mut Document;

    /// Node of `region` for the instance the hook belongs to, if mounted.
    fn region(&self, region: Region) -> Option<NodeId>;

    /// The dialog element, if mounted.
    fn popup(&self) -> Option<NodeId> {
        self.region(Region::Popup)
    }

    /// The active input control, if any.
    fn input(&self) -> Option<NodeId>;

    /// Whether the popup is currently shown.
    fn is_visible(&self) -> bool;

    /// The instance's result once settled (visible from `onClose` on).
    fn outcome(&self) -> Option<PopupResult>;

    /// Queue a new popup. The returned outcome belongs to the new popup.
    fn fire(&mut self, params: Params) -> Outcome;

    /// Queue a parameter patch for this instance.
    fn update(&mut self, patch: Params);

    /// Queue a programmatic close of this instance.
    fn close(&mut self, result: Option<PopupResult>);

    /// Queue a confirm click.
    fn click_confirm(&mut self);

    /// Queue a cancel click.
    fn click_cancel(&mut self);

    /// Queue showing a validation message.
    fn show_validation_message(&mut self, message: &str);
}
