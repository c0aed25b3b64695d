#![forbid(unsafe_code)]

//! Lifecycle vocabulary: phases, the live instance, queued actions, and the
//! control handle passed to hooks.
//!
//! ```text
//! Closed ──fire──► Opening ──► Open ──trigger──► Resolving ──► Closing ──► Closed
//!                                │ ▲
//!                                └─┘ update / validation / events
//! ```
//!
//! # Invariants
//!
//! 1. A phase only moves forward along the diagram above.
//! 2. Hooks never touch the engine directly. Every state change they request
//!    becomes an [`Action`] that runs after the current step returns.
//! 3. Every non-fire action names the instance it targets and is dropped if
//!    that instance is no longer current.

use std::collections::VecDeque;
use std::fmt;

use fpop_core::{Outcome, Params, PopupControl, PopupResult, Resolver, Timer, outcome_channel};
use fpop_dom::{Document, NodeId, PopupRegions, Region};

use crate::focus::FocusTrap;
use crate::reconcile::{InputState, Reconciler};
use crate::validation::ValidationPipeline;

/// Identifies one `fire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Closed,
    Opening,
    Open,
    Resolving,
    Closing,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Opening => "opening",
            Phase::Open => "open",
            Phase::Resolving => "resolving",
            Phase::Closing => "closing",
        }
    }

    /// Whether the instance can still be resolved.
    #[inline]
    pub const fn is_live(self) -> bool {
        matches!(self, Phase::Opening | Phase::Open)
    }
}

/// Lifecycle notification points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    BeforeOpen,
    Render,
    Open,
    Close,
    AfterClose,
    Destroy,
}

impl HookPoint {
    /// Parameter name of the listener list.
    pub const fn name(self) -> &'static str {
        match self {
            HookPoint::BeforeOpen => "onBeforeOpen",
            HookPoint::Render => "onRender",
            HookPoint::Open => "onOpen",
            HookPoint::Close => "onClose",
            HookPoint::AfterClose => "onAfterClose",
            HookPoint::Destroy => "onDestroy",
        }
    }

    /// Listeners registered for this point.
    pub fn listeners(self, params: &Params) -> Vec<fpop_core::Hook> {
        let list = match self {
            HookPoint::BeforeOpen => &params.on_before_open,
            HookPoint::Render => &params.on_render,
            HookPoint::Open => &params.on_open,
            HookPoint::Close => &params.on_close,
            HookPoint::AfterClose => &params.on_after_close,
            HookPoint::Destroy => &params.on_destroy,
        };
        list.clone().unwrap_or_default()
    }
}

/// A deferred request against the engine.
#[derive(Debug)]
pub enum Action {
    Fire {
        params: Params,
        resolver: Resolver,
    },
    Update {
        target: InstanceId,
        patch: Params,
    },
    Close {
        target: InstanceId,
        result: Option<PopupResult>,
    },
    ClickConfirm {
        target: InstanceId,
    },
    ClickCancel {
        target: InstanceId,
    },
    ShowValidationMessage {
        target: InstanceId,
        message: String,
    },
}

impl Action {
    /// Instance a non-fire action is bound to.
    pub fn target(&self) -> Option<InstanceId> {
        match self {
            Action::Fire { .. } => None,
            Action::Update { target, .. }
            | Action::Close { target, .. }
            | Action::ClickConfirm { target }
            | Action::ClickCancel { target }
            | Action::ShowValidationMessage { target, .. } => Some(*target),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Action::Fire { .. } => "fire",
            Action::Update { .. } => "update",
            Action::Close { .. } => "close",
            Action::ClickConfirm { .. } => "click_confirm",
            Action::ClickCancel { .. } => "click_cancel",
            Action::ShowValidationMessage { .. } => "show_validation_message",
        }
    }
}

/// The single live popup.
#[derive(Debug)]
pub struct Instance {
    pub id: InstanceId,
    pub phase: Phase,
    pub params: Params,
    pub regions: PopupRegions,
    pub resolver: Resolver,
    pub timer: Option<Timer>,
    pub focus: FocusTrap,
    pub input: InputState,
    pub validation: ValidationPipeline,
    pub reconciler: Reconciler,
    /// Loader shown and buttons disabled.
    pub loading: bool,
    /// While loading, the loader stands in for the confirm button.
    pub loader_replaces_confirm: bool,
}

impl Instance {
    pub fn new(id: InstanceId, params: Params, regions: PopupRegions, resolver: Resolver) -> Self {
        Self {
            id,
            phase: Phase::Opening,
            params,
            regions,
            resolver,
            timer: None,
            focus: FocusTrap::new(),
            input: InputState::default(),
            validation: ValidationPipeline::new(),
            reconciler: Reconciler::new(),
            loading: false,
            loader_replaces_confirm: false,
        }
    }

    /// Element returned by `get_input`.
    pub fn input_element(&self) -> Option<NodeId> {
        self.input.widget.as_ref().map(|w| w.element())
    }

    pub fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(
            target: "fpop.lifecycle",
            instance = %self.id,
            from = self.phase.as_str(),
            phase = phase.as_str(),
            "phase"
        );
        self.phase = phase;
    }
}

/// What a hook may observe about its instance, captured before it runs.
#[derive(Debug, Clone, Copy)]
pub struct HookView {
    pub target: InstanceId,
    pub regions: Option<PopupRegions>,
    pub input: Option<NodeId>,
    pub visible: bool,
}

/// [`PopupControl`] implementation handed to hooks.
pub struct HookCx<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) queue: &'a mut VecDeque<Action>,
    pub(crate) view: HookView,
    pub(crate) outcome: Outcome,
}

impl HookCx<'_> {
    fn push(&mut self, action: Action) {
        tracing::trace!(
            target: "fpop.lifecycle",
            instance = %self.view.target,
            action = action.name(),
            "queued from hook"
        );
        self.queue.push_back(action);
    }
}

impl PopupControl for HookCx<'_> {
    fn document(&self) -> &Document {
        &*self.doc
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut *self.doc
    }

    fn region(&self, region: Region) -> Option<NodeId> {
        self.view.regions.map(|r| r.get(region))
    }

    fn input(&self) -> Option<NodeId> {
        self.view.input
    }

    fn is_visible(&self) -> bool {
        self.view.visible
    }

    fn outcome(&self) -> Option<PopupResult> {
        self.outcome.try_result()
    }

    fn fire(&mut self, params: Params) -> Outcome {
        let (resolver, outcome) = outcome_channel();
        self.push(Action::Fire { params, resolver });
        outcome
    }

    fn update(&mut self, patch: Params) {
        let target = self.view.target;
        self.push(Action::Update { target, patch });
    }

    fn close(&mut self, result: Option<PopupResult>) {
        let target = self.view.target;
        self.push(Action::Close { target, result });
    }

    fn click_confirm(&mut self) {
        let target = self.view.target;
        self.push(Action::ClickConfirm { target });
    }

    fn click_cancel(&mut self) {
        let target = self.view.target;
        self.push(Action::ClickCancel { target });
    }

    fn show_validation_message(&mut self, message: &str) {
        let target = self.view.target;
        self.push(Action::ShowValidationMessage {
            target,
            message: message.to_string(),
        });
    }
}
