#![forbid(unsafe_code)]

//! The popup engine.
//!
//! [`Popup`] owns the page [`Document`], the collaborator [`Services`], and
//! at most one live [`Instance`]. Hosts drive it with three kinds of calls:
//!
//! - operations (`fire`, `update`, `close`, `click_confirm`, ...),
//! - input events ([`dispatch`](Popup::dispatch)),
//! - time and settlement ([`advance`](Popup::advance), [`pump`](Popup::pump)).
//!
//! Every operation is turned into an [`Action`] and run through one queue,
//! so work requested by hooks (which only ever see a
//! [`PopupControl`](fpop_core::PopupControl)) runs strictly after the step
//! that invoked them.
//!
//! # Open sequence
//!
//! ```text
//! build (hidden) ─► paint ─► onBeforeOpen ─► show + page style
//!   ─► focus trap ─► timer ─► Open ─► onRender ─► onOpen
//! ```
//!
//! # Close sequence
//!
//! ```text
//! Resolving: cancel validation, cancel timer, settle outcome
//! Closing:   onClose (DOM mounted) ─► release focus ─► page style off ─► unmount
//! Closed:    onAfterClose ─► onDestroy
//! ```
//!
//! # Invariants
//!
//! 1. At most one instance exists. A `fire` while one is live resolves it
//!    with a reason-less dismissal and runs its whole close sequence first.
//! 2. An instance's outcome is settled exactly once.
//! 3. Once resolved, no timer expiry, key, click or validation result can
//!    touch the instance again.
//! 4. Actions queued by hooks run after the current step, in order.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Skeleton build fails | Diagnostic; outcome resolves as `{}` |
//! | Hook returns `Err` | Diagnostic; remaining hooks and the transition continue |
//! | Style/markup collaborator fails | Diagnostic; transition continues |
//! | Action budget exhausted | Remaining queue dropped; queued fires resolve as `{}` |
//! | Operation with no popup | No-op |

use std::collections::VecDeque;
use std::time::Duration;

use fpop_core::params::{Backdrop, Predicate};
use fpop_core::{
    Diagnostic, Diagnostics, DismissReason, FireArg, KeyCode, KeyEvent, KeyEventKind, Outcome,
    Params, PopupEvent, PopupResult, Resolver, Timer, is_updatable_parameter, is_valid_parameter,
    outcome_channel,
};
use fpop_dom::{Content, Document, NodeId, PageStyle, Region, Services, class_name};
use serde_json::Value;
use web_time::Instant;

use crate::config::PopupConfig;
use crate::error::PopupError;
use crate::focus::{focusable_elements, initial_focus};
use crate::lifecycle::{Action, HookCx, HookPoint, HookView, Instance, InstanceId, Phase};
use crate::reconcile::{INPUT_KEYS, PaintCx};
use crate::strategy::{DefaultStrategy, Mixin, PopupStrategy};
use crate::validation::ValidationStep;

/// Positional slots of `fire(title, html, icon)`.
const MAX_POSITIONAL_ARGS: usize = 3;

/// Single-instance popup engine.
pub struct Popup {
    doc: Document,
    services: Services,
    config: PopupConfig,
    strategy: Box<dyn PopupStrategy>,
    diagnostics: Diagnostics,
    current: Option<Instance>,
    queue: VecDeque<Action>,
    next_id: u64,
    page_visible: bool,
    last_tick: Option<Instant>,
}

impl Default for Popup {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Popup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Popup")
            .field("config", &self.config)
            .field("current", &self.current.as_ref().map(|i| (i.id, i.phase)))
            .field("queued", &self.queue.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

impl Popup {
    /// Engine with a blank page and default collaborators.
    pub fn new() -> Self {
        Self::with_config(PopupConfig::default())
    }

    /// Engine with explicit configuration.
    pub fn with_config(config: PopupConfig) -> Self {
        Self {
            doc: Document::new(),
            services: Services::default(),
            page_visible: config.page_visible(),
            config,
            strategy: Box::new(DefaultStrategy),
            diagnostics: Diagnostics::new(),
            current: None,
            queue: VecDeque::new(),
            next_id: 0,
            last_tick: None,
        }
    }

    /// Replace the collaborators.
    #[must_use]
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Replace the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl PopupStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Mount popups into an existing page.
    #[must_use]
    pub fn with_document(mut self, doc: Document) -> Self {
        self.doc = doc;
        self
    }

    /// Apply `defaults` under every future `fire`. Stacks with earlier mixins.
    pub fn mixin(&mut self, defaults: Params) {
        let inner = std::mem::replace(&mut self.strategy, Box::new(DefaultStrategy));
        self.strategy = Box::new(Mixin::over(defaults, inner));
    }

    /// Whether `name` is a recognized parameter.
    pub fn is_valid_parameter(name: &str) -> bool {
        is_valid_parameter(name)
    }

    /// Whether `name` may be passed to [`update`](Self::update).
    pub fn is_updatable_parameter(name: &str) -> bool {
        is_updatable_parameter(name)
    }

    // --- Operations ----------------------------------------------------------

    /// Show a popup. Any live popup is dismissed first.
    pub fn fire(&mut self, params: Params) -> Outcome {
        let (resolver, outcome) = outcome_channel();
        self.queue.push_back(Action::Fire { params, resolver });
        self.drain();
        outcome
    }

    /// `fire(title, html, icon)` shorthand, or a single params argument.
    pub fn fire_args(&mut self, args: &[FireArg]) -> Outcome {
        let (params, diagnostics) = self.strategy.args_to_params(args);
        self.diagnostics.extend(diagnostics);
        self.fire(params)
    }

    /// Fire from JSON text: an object is params, an array is positional
    /// arguments, any other value is the title slot.
    pub fn fire_json(&mut self, json: &str) -> Result<Outcome, PopupError> {
        let value: Value = serde_json::from_str(json)?;
        let args: Vec<FireArg> = match value {
            Value::Array(items) if items.len() > MAX_POSITIONAL_ARGS => {
                return Err(PopupError::TooManyArguments {
                    max: MAX_POSITIONAL_ARGS,
                    got: items.len(),
                });
            }
            Value::Array(items) => items.into_iter().map(FireArg::Json).collect(),
            other => vec![FireArg::Json(other)],
        };
        Ok(self.fire_args(&args))
    }

    /// Patch the live popup. Non-updatable keys are reported and skipped.
    pub fn update(&mut self, patch: Params) {
        self.request(|target| Action::Update { target, patch });
    }

    /// Close the live popup, resolving with `result` or a reason-less
    /// dismissal.
    pub fn close(&mut self, result: Option<PopupResult>) {
        self.request(|target| Action::Close { target, result });
    }

    /// Act as if the confirm button was clicked.
    pub fn click_confirm(&mut self) {
        self.request(|target| Action::ClickConfirm { target });
    }

    /// Act as if the cancel button was clicked.
    pub fn click_cancel(&mut self) {
        self.request(|target| Action::ClickCancel { target });
    }

    /// Show `message` in the validation region.
    pub fn show_validation_message(&mut self, message: &str) {
        let message = message.to_string();
        self.request(|target| Action::ShowValidationMessage { target, message });
    }

    /// Hide the validation message and clear `aria-invalid`.
    pub fn reset_validation_message(&mut self) {
        self.reset_validation();
    }

    /// Put the popup in loading state, opening an empty one if needed.
    pub fn show_loading(&mut self) {
        if self.current.is_none() {
            self.fire(Params::new());
        }
        self.set_loading(true, true);
    }

    /// Leave loading state.
    pub fn hide_loading(&mut self) {
        self.set_loading(false, false);
    }

    pub fn disable_buttons(&mut self) {
        self.set_buttons_disabled(true);
    }

    pub fn enable_buttons(&mut self) {
        self.set_buttons_disabled(false);
    }

    pub fn disable_input(&mut self) {
        self.set_input_enabled(false);
    }

    pub fn enable_input(&mut self) {
        self.set_input_enabled(true);
    }

    // --- Timer ---------------------------------------------------------------

    /// Time left on the auto-close timer.
    pub fn get_timer_left(&self) -> Option<Duration> {
        self.timer().map(Timer::remaining)
    }

    /// Pause the timer; returns the time left.
    pub fn stop_timer(&mut self) -> Option<Duration> {
        self.timer_mut().map(Timer::stop)
    }

    /// Resume the timer; returns the time left.
    pub fn resume_timer(&mut self) -> Option<Duration> {
        self.timer_mut().map(Timer::resume)
    }

    /// Flip the timer between running and paused; returns the time left.
    pub fn toggle_timer(&mut self) -> Option<Duration> {
        self.timer_mut().map(Timer::toggle)
    }

    /// Add `delta` to the timer; returns the new time left.
    pub fn increase_timer(&mut self, delta: Duration) -> Option<Duration> {
        self.timer_mut().map(|t| t.increase(delta))
    }

    /// Whether the timer is running (page visibility aside).
    pub fn is_timer_running(&self) -> bool {
        self.timer().is_some_and(Timer::is_running)
    }

    fn timer(&self) -> Option<&Timer> {
        self.current
            .as_ref()
            .filter(|i| i.phase.is_live())
            .and_then(|i| i.timer.as_ref())
    }

    fn timer_mut(&mut self) -> Option<&mut Timer> {
        self.current
            .as_mut()
            .filter(|i| i.phase.is_live())
            .and_then(|i| i.timer.as_mut())
    }

    // --- Host driving --------------------------------------------------------

    /// Feed one host event. Returns whether the engine acted on it.
    pub fn dispatch(&mut self, event: PopupEvent) -> bool {
        let handled = match event {
            PopupEvent::Key(key) => self.on_key(key),
            PopupEvent::Click(node) => self.on_click(node),
            PopupEvent::Input(node) => self.on_input(node),
            PopupEvent::Visibility(visible) => {
                self.set_page_visible(visible);
                true
            }
        };
        self.drain();
        handled
    }

    /// Advance the clock by `dt`, then [`pump`](Self::pump).
    pub fn advance(&mut self, dt: Duration) {
        let expired = match self.current.as_mut() {
            Some(inst) if inst.phase == Phase::Open => match inst.timer.as_mut() {
                Some(timer) => {
                    let expired = timer.tick(dt);
                    let left = (1.0 - timer.progress()) * 100.0;
                    let bar = inst.regions.get(Region::TimerProgressBar);
                    self.services
                        .style
                        .apply_inline(&mut self.doc, bar, "width", Some(&format!("{left:.2}%")));
                    expired
                }
                None => false,
            },
            _ => false,
        };
        if expired {
            self.finish(PopupResult::dismissed(DismissReason::Timer));
        }
        self.pump();
    }

    /// Advance by the wall-clock time since the previous call.
    pub fn tick_now(&mut self) {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);
        self.advance(dt);
    }

    /// Let settled deferreds progress and run queued actions.
    pub fn pump(&mut self) {
        self.poll_options();
        self.poll_validation();
        self.drain();
    }

    /// Page visibility changed: hold or release the timer.
    pub fn set_page_visible(&mut self, visible: bool) {
        self.page_visible = visible;
        if let Some(timer) = self.current.as_mut().and_then(|i| i.timer.as_mut()) {
            if visible {
                timer.unsuspend();
            } else {
                timer.suspend();
            }
        }
        tracing::debug!(target: "fpop.lifecycle", visible, "page visibility");
    }

    pub fn is_page_visible(&self) -> bool {
        self.page_visible
    }

    // --- Queries -------------------------------------------------------------

    /// Whether a popup is shown.
    pub fn is_visible(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|i| self.doc.is_rendered(i.regions.popup()))
    }

    /// Whether the popup is loading (explicitly, or while options or
    /// validation are pending).
    pub fn is_loading(&self) -> bool {
        self.current.as_ref().is_some_and(|i| i.loading)
    }

    /// Phase of the current instance (`Closed` when there is none).
    pub fn phase(&self) -> Phase {
        self.current.as_ref().map_or(Phase::Closed, |i| i.phase)
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.current.as_ref().map(|i| i.id)
    }

    /// Effective params of the live popup.
    pub fn params(&self) -> Option<&Params> {
        self.current.as_ref().map(|i| &i.params)
    }

    /// The input element (the group container for radios/checkbox groups).
    pub fn get_input(&self) -> Option<NodeId> {
        self.current.as_ref().and_then(Instance::input_element)
    }

    /// Focusable elements of the popup in tab order.
    pub fn get_focusable_elements(&self) -> Vec<NodeId> {
        self.current
            .as_ref()
            .map(|i| focusable_elements(&self.doc, i.regions.popup()))
            .unwrap_or_default()
    }

    /// Node of `region` for the live popup.
    pub fn region(&self, region: Region) -> Option<NodeId> {
        self.current.as_ref().map(|i| i.regions.get(region))
    }

    pub fn get_container(&self) -> Option<NodeId> {
        self.region(Region::Container)
    }

    pub fn get_popup(&self) -> Option<NodeId> {
        self.region(Region::Popup)
    }

    pub fn get_title(&self) -> Option<NodeId> {
        self.region(Region::Title)
    }

    pub fn get_content(&self) -> Option<NodeId> {
        self.region(Region::Content)
    }

    pub fn get_html_container(&self) -> Option<NodeId> {
        self.region(Region::HtmlContainer)
    }

    /// The selected icon node, the first icon type until `icon` is set.
    pub fn get_icon(&self) -> Option<NodeId> {
        self.region(Region::Icon)
    }

    /// Every icon node, one per type, whether shown or not.
    pub fn get_icons(&self) -> Vec<NodeId> {
        self.current
            .as_ref()
            .map_or_else(Vec::new, |i| i.regions.icons().to_vec())
    }

    pub fn get_image(&self) -> Option<NodeId> {
        self.region(Region::Image)
    }

    pub fn get_close_button(&self) -> Option<NodeId> {
        self.region(Region::CloseButton)
    }

    pub fn get_actions(&self) -> Option<NodeId> {
        self.region(Region::Actions)
    }

    pub fn get_confirm_button(&self) -> Option<NodeId> {
        self.region(Region::ConfirmButton)
    }

    pub fn get_cancel_button(&self) -> Option<NodeId> {
        self.region(Region::CancelButton)
    }

    pub fn get_loader(&self) -> Option<NodeId> {
        self.region(Region::Loader)
    }

    pub fn get_footer(&self) -> Option<NodeId> {
        self.region(Region::Footer)
    }

    pub fn get_validation_message(&self) -> Option<NodeId> {
        self.region(Region::ValidationMessage)
    }

    pub fn get_timer_progress_bar(&self) -> Option<NodeId> {
        self.region(Region::TimerProgressBar)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The page document. Removing popup regions is not supported.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Drain recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    // --- Queue ---------------------------------------------------------------

    fn request(&mut self, make: impl FnOnce(InstanceId) -> Action) {
        let Some(target) = self.current.as_ref().map(|i| i.id) else {
            tracing::trace!(target: "fpop.lifecycle", "no popup, request ignored");
            return;
        };
        self.queue.push_back(make(target));
        self.drain();
    }

    fn drain(&mut self) {
        let mut budget = self.config.max_actions_per_drain();
        while let Some(action) = self.queue.pop_front() {
            if budget == 0 {
                self.queue.push_front(action);
                self.drop_queue();
                return;
            }
            budget -= 1;
            self.run(action);
        }
    }

    fn drop_queue(&mut self) {
        let dropped = self.queue.len();
        for action in self.queue.drain(..) {
            if let Action::Fire { resolver, .. } = action {
                resolver.resolve(PopupResult::dismissed_silently());
            }
        }
        tracing::warn!(
            target: "fpop.lifecycle",
            dropped,
            max = self.config.max_actions_per_drain(),
            "action budget exhausted, queue dropped"
        );
    }

    fn is_current(&self, id: InstanceId) -> bool {
        self.current
            .as_ref()
            .is_some_and(|i| i.id == id && i.phase.is_live())
    }

    fn run(&mut self, action: Action) {
        if let Some(target) = action.target()
            && !self.is_current(target)
        {
            tracing::trace!(
                target: "fpop.lifecycle",
                instance = %target,
                action = action.name(),
                "stale action dropped"
            );
            return;
        }
        match action {
            Action::Fire { params, resolver } => self.open(params, resolver),
            Action::Update { patch, .. } => self.apply_update(patch),
            Action::Close { result, .. } => {
                self.finish(result.unwrap_or_else(PopupResult::dismissed_silently));
            }
            Action::ClickConfirm { .. } => self.confirm(),
            Action::ClickCancel { .. } => self.cancel(),
            Action::ShowValidationMessage { message, .. } => self.show_validation(&message),
        }
    }

    // --- Transitions ---------------------------------------------------------

    fn open(&mut self, params: Params, resolver: Resolver) {
        if self.current.as_ref().is_some_and(|i| i.phase.is_live()) {
            self.finish(PopupResult::dismissed_silently());
        }
        let params = self.strategy.prepare(params);
        let body = self.doc.body();
        let regions = match self.services.dom.build(&mut self.doc, body, params.is_toast()) {
            Ok(regions) => regions,
            Err(err) => {
                self.diagnostics
                    .push(Diagnostic::collaborator_failed("build popup", &err));
                resolver.resolve(PopupResult::dismissed_silently());
                return;
            }
        };
        self.next_id += 1;
        let id = InstanceId(self.next_id);
        tracing::debug!(
            target: "fpop.lifecycle",
            instance = %id,
            toast = params.is_toast(),
            keys = ?params.set_keys(),
            "opening"
        );
        self.current = Some(Instance::new(id, params, regions, resolver));
        self.paint(true);
        if self.current.as_ref().is_some_and(|i| i.input.is_pending()) {
            self.set_loading(true, false);
        }
        self.run_hooks(HookPoint::BeforeOpen);
        self.reveal();
        if let Some(inst) = self.current.as_mut() {
            inst.set_phase(Phase::Open);
        }
        self.run_hooks(HookPoint::Render);
        self.run_hooks(HookPoint::Open);
    }

    /// Show the painted popup, apply page style, arm focus and timer.
    fn reveal(&mut self) {
        let Some(inst) = self.current.as_mut() else {
            return;
        };
        let popup = inst.regions.popup();
        self.doc.show(inst.regions.root(), "grid");
        self.doc.show(popup, "grid");
        self.doc.add_class(popup, &class_name("show"));

        let params = &inst.params;
        let style = PageStyle {
            toast: params.is_toast(),
            backdrop: !matches!(params.backdrop, Some(Backdrop::Disabled)),
            height_auto: params.height_auto.unwrap_or(true),
            scrollbar_padding: params.scrollbar_padding.unwrap_or(true),
            scrollbar_width: self.config.scrollbar_width(),
        };
        if let Err(err) = self.services.style.on_open(&mut self.doc, &style) {
            self.diagnostics
                .push(Diagnostic::collaborator_failed("apply page style", &err));
        }

        inst.focus.arm(&self.doc, popup, params.is_modal());
        if !params.is_toast() {
            if params.allow_enter_key.as_ref().is_none_or(Predicate::eval) {
                let target = initial_focus(
                    &self.doc,
                    &inst.regions,
                    params.focus_confirm.unwrap_or(true),
                    params.focus_cancel.unwrap_or(false),
                );
                self.doc.focus(target);
                tracing::trace!(target: "fpop.focus", node = target.index(), "initial focus");
            } else {
                self.doc.blur();
            }
        }

        if let Some(ms) = params.auto_close_ms() {
            let mut timer = Timer::from_millis(ms);
            timer.start();
            if !self.page_visible {
                timer.suspend();
            }
            let bar = inst.regions.get(Region::TimerProgressBar);
            self.services
                .style
                .apply_inline(&mut self.doc, bar, "width", Some("100.00%"));
            inst.timer = Some(timer);
        }
    }

    /// Resolve the live instance and run its close sequence.
    fn finish(&mut self, result: PopupResult) {
        let Some(inst) = self.current.as_mut() else {
            return;
        };
        if !inst.phase.is_live() {
            return;
        }
        inst.set_phase(Phase::Resolving);
        inst.validation.cancel();
        if let Some(timer) = inst.timer.as_mut() {
            timer.cancel();
        }
        tracing::debug!(
            target: "fpop.lifecycle",
            instance = %inst.id,
            result = %result.to_json(),
            reason = result.dismiss_reason().map(DismissReason::as_str),
            "resolved"
        );
        inst.resolver.resolve(result);
        inst.set_phase(Phase::Closing);
        self.run_hooks(HookPoint::Close);

        let Some(mut inst) = self.current.take() else {
            return;
        };
        inst.focus.release(&mut self.doc);
        if let Err(err) = self.services.style.on_close(&mut self.doc) {
            self.diagnostics
                .push(Diagnostic::collaborator_failed("restore page style", &err));
        }
        if let Err(err) = self.services.dom.destroy(&mut self.doc, &inst.regions) {
            self.diagnostics
                .push(Diagnostic::collaborator_failed("destroy popup", &err));
        }
        inst.set_phase(Phase::Closed);

        let view = HookView {
            target: inst.id,
            regions: None,
            input: None,
            visible: false,
        };
        let outcome = inst.resolver.outcome();
        for point in [HookPoint::AfterClose, HookPoint::Destroy] {
            let hooks = point.listeners(&inst.params);
            self.call_hooks(point, &hooks, view, outcome.clone());
        }
    }

    fn apply_update(&mut self, mut patch: Params) {
        let mut rejected = Vec::new();
        for key in patch.set_keys() {
            if !is_updatable_parameter(key) {
                patch.clear_key(key);
                rejected.push(Diagnostic::not_updatable(key));
            }
        }
        self.diagnostics.extend(rejected);

        let keys = patch.set_keys();
        let rebuild =
            keys.iter().any(|k| INPUT_KEYS.contains(k)) || patch.custom_input.is_some();
        let Some(inst) = self.current.as_mut() else {
            return;
        };
        inst.params = inst.params.merge(&patch);
        let was_validating = rebuild && inst.validation.is_pending();
        if rebuild {
            inst.validation.cancel();
        }
        tracing::debug!(target: "fpop.lifecycle", instance = %inst.id, ?keys, rebuild, "update");

        self.paint(rebuild);
        if rebuild {
            self.reset_validation();
            let pending = self.current.as_ref().is_some_and(|i| i.input.is_pending());
            if pending || was_validating {
                self.set_loading(pending, false);
            }
        }
        if let Some(inst) = self.current.as_ref()
            && inst.loading
        {
            let replace = inst.loader_replaces_confirm;
            self.set_loading(true, replace);
        }
        self.run_hooks(HookPoint::Render);
    }

    fn confirm(&mut self) {
        let Some(inst) = self.current.as_mut() else {
            return;
        };
        let button = inst.regions.get(Region::ConfirmButton);
        if inst.phase != Phase::Open
            || self.doc.is_disabled(button)
            || inst.validation.is_pending()
            || inst.input.is_pending()
        {
            tracing::trace!(target: "fpop.validation", instance = %inst.id, "confirm ignored");
            return;
        }
        let params = &inst.params;
        let value = match &inst.input.widget {
            Some(widget) => {
                let builtin = widget.report_validity(
                    &self.doc,
                    params.input_validator.is_none(),
                    params.validation_message.as_deref(),
                );
                if let Some(message) = builtin {
                    self.show_validation(&message);
                    return;
                }
                widget.read(&self.doc, params.input_auto_trim.unwrap_or(true))
            }
            None => Value::Bool(true),
        };
        let validator = params.input_validator.clone();
        let pre_confirm = params.pre_confirm.clone();
        let replace_confirm = params.show_loader_on_confirm.unwrap_or(false);
        inst.loader_replaces_confirm = replace_confirm;
        let step = inst
            .validation
            .begin(value, validator.as_ref(), pre_confirm.as_ref());
        self.apply_step(step);
    }

    fn cancel(&mut self) {
        let Some(inst) = self.current.as_ref() else {
            return;
        };
        if self.doc.is_disabled(inst.regions.get(Region::CancelButton)) {
            tracing::trace!(target: "fpop.lifecycle", instance = %inst.id, "cancel ignored");
            return;
        }
        self.finish(PopupResult::dismissed(DismissReason::Cancel));
    }

    fn apply_step(&mut self, step: ValidationStep) {
        match step {
            ValidationStep::Pending => self.set_validating(true),
            ValidationStep::Resolved(value) => {
                self.set_validating(false);
                self.finish(PopupResult::confirmed(value));
            }
            ValidationStep::Rejected(message) => {
                self.set_validating(false);
                self.show_validation(&message);
            }
            ValidationStep::Vetoed => {
                self.set_validating(false);
                self.reset_validation();
            }
        }
    }

    fn poll_options(&mut self) {
        let settled = match self.current.as_mut() {
            Some(inst) if inst.phase == Phase::Open && inst.input.is_pending() => {
                let mut cx = PaintCx {
                    doc: &mut self.doc,
                    services: &self.services,
                    regions: inst.regions,
                    diagnostics: &mut self.diagnostics,
                };
                inst.input.poll_options(&mut cx, &inst.params)
            }
            _ => false,
        };
        if settled {
            self.set_loading(false, false);
        }
    }

    fn poll_validation(&mut self) {
        let step = match self.current.as_mut() {
            Some(inst) if inst.phase == Phase::Open && inst.validation.is_pending() => {
                inst.validation.poll()
            }
            _ => return,
        };
        if step != ValidationStep::Pending {
            self.apply_step(step);
        }
    }

    // --- Events --------------------------------------------------------------

    fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        let Some(inst) = self.current.as_ref() else {
            return false;
        };
        if inst.phase != Phase::Open {
            return false;
        }
        match key.code {
            KeyCode::Enter => {
                let target = key.target.or_else(|| self.doc.focused());
                let on_input = inst
                    .input
                    .widget
                    .as_ref()
                    .is_some_and(|w| w.confirms_on_enter() && target == Some(w.element()));
                let allowed = inst
                    .params
                    .allow_enter_key
                    .as_ref()
                    .is_none_or(Predicate::eval);
                if on_input && allowed {
                    self.confirm();
                    true
                } else {
                    false
                }
            }
            KeyCode::Tab | KeyCode::BackTab => {
                inst.focus.cycle(&mut self.doc, !key.is_back_tab()).is_some()
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Right | KeyCode::Down => {
                let forward = matches!(key.code, KeyCode::Right | KeyCode::Down);
                inst.focus
                    .step_buttons(&mut self.doc, &inst.regions, forward)
                    .is_some()
            }
            KeyCode::Escape => {
                let allowed = inst
                    .params
                    .allow_escape_key
                    .as_ref()
                    .is_none_or(Predicate::eval);
                if allowed {
                    self.finish(PopupResult::dismissed(DismissReason::Esc));
                }
                allowed
            }
            _ => false,
        }
    }

    fn on_click(&mut self, node: NodeId) -> bool {
        let Some(inst) = self.current.as_ref() else {
            return false;
        };
        if inst.phase != Phase::Open {
            return false;
        }
        let regions = inst.regions;
        let hit = [
            Region::ConfirmButton,
            Region::CancelButton,
            Region::CloseButton,
        ]
        .into_iter()
        .find(|&r| self.doc.is_inclusive_ancestor(regions.get(r), node));
        let outside_allowed = node == regions.root()
            && inst.params.is_modal()
            && inst
                .params
                .allow_outside_click
                .as_ref()
                .is_none_or(Predicate::eval);
        match hit {
            Some(Region::ConfirmButton) => self.confirm(),
            Some(Region::CancelButton) => self.cancel(),
            Some(_) => self.finish(PopupResult::dismissed(DismissReason::Close)),
            None if outside_allowed => {
                self.finish(PopupResult::dismissed(DismissReason::Backdrop));
            }
            None => return false,
        }
        true
    }

    fn on_input(&mut self, node: NodeId) -> bool {
        let Some(inst) = self.current.as_ref() else {
            return false;
        };
        let Some(widget) = inst.input.widget.as_ref() else {
            return false;
        };
        if !widget.contains(&self.doc, node) {
            return false;
        }
        widget.on_input(&mut self.doc, node);
        self.reset_validation();
        true
    }

    // --- Painting helpers ----------------------------------------------------

    fn paint(&mut self, rebuild_input: bool) {
        let Some(inst) = self.current.as_mut() else {
            return;
        };
        let mut cx = PaintCx {
            doc: &mut self.doc,
            services: &self.services,
            regions: inst.regions,
            diagnostics: &mut self.diagnostics,
        };
        inst.reconciler
            .paint(&mut cx, &inst.params, rebuild_input, &mut inst.input);
        inst.regions = cx.regions;
    }

    fn set_loading(&mut self, on: bool, replace_confirm: bool) {
        let Some(inst) = self.current.as_mut() else {
            return;
        };
        inst.loading = on;
        inst.loader_replaces_confirm = on && replace_confirm;
        let regions = inst.regions;
        let popup = regions.popup();
        let doc = &mut self.doc;
        doc.toggle_display(regions.get(Region::Loader), on, "flex");
        doc.toggle_class(popup, &class_name("loading"), on);
        if on {
            doc.set_attribute(popup, "aria-busy", "true");
        } else {
            doc.remove_attribute(popup, "aria-busy");
        }
        for button in [Region::ConfirmButton, Region::CancelButton] {
            doc.set_disabled(regions.get(button), on);
        }
        let show_confirm = inst.params.show_confirm_button.unwrap_or(true);
        let show_cancel = inst.params.show_cancel_button.unwrap_or(false);
        doc.toggle_display(
            regions.get(Region::ConfirmButton),
            show_confirm && !inst.loader_replaces_confirm,
            "inline-block",
        );
        doc.toggle_display(
            regions.get(Region::Actions),
            on || show_confirm || show_cancel,
            "flex",
        );
        tracing::trace!(target: "fpop.lifecycle", instance = %inst.id, on, "loading");
    }

    fn set_validating(&mut self, on: bool) {
        let replace = self
            .current
            .as_ref()
            .is_some_and(|i| i.loader_replaces_confirm);
        self.set_loading(on, replace);
        if let Some(widget) = self.current.as_ref().and_then(|i| i.input.widget.as_ref()) {
            widget.set_enabled(&mut self.doc, !on);
        }
    }

    fn set_buttons_disabled(&mut self, disabled: bool) {
        if let Some(inst) = self.current.as_ref() {
            for button in [Region::ConfirmButton, Region::CancelButton] {
                self.doc.set_disabled(inst.regions.get(button), disabled);
            }
        }
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        if let Some(widget) = self.current.as_ref().and_then(|i| i.input.widget.as_ref()) {
            widget.set_enabled(&mut self.doc, enabled);
        }
    }

    fn show_validation(&mut self, message: &str) {
        let Some(inst) = self.current.as_ref() else {
            return;
        };
        let node = inst.regions.get(Region::ValidationMessage);
        let content = Content::Html(message.to_string());
        if let Err(err) = self.services.markup.insert(&mut self.doc, node, &content) {
            self.diagnostics
                .push(Diagnostic::collaborator_failed("insert validation-message", &err));
        }
        self.doc.show(node, "flex");
        if let Some(widget) = &inst.input.widget {
            widget.mark_invalid(&mut self.doc, true);
        }
        tracing::debug!(target: "fpop.validation", instance = %inst.id, message, "invalid");
    }

    fn reset_validation(&mut self) {
        let Some(inst) = self.current.as_ref() else {
            return;
        };
        let node = inst.regions.get(Region::ValidationMessage);
        self.doc.clear_children(node);
        self.doc.hide(node);
        if let Some(widget) = &inst.input.widget {
            widget.mark_invalid(&mut self.doc, false);
        }
    }

    // --- Hooks ---------------------------------------------------------------

    fn run_hooks(&mut self, point: HookPoint) {
        let Some(inst) = self.current.as_ref() else {
            return;
        };
        let hooks = point.listeners(&inst.params);
        if hooks.is_empty() {
            return;
        }
        let view = HookView {
            target: inst.id,
            regions: Some(inst.regions),
            input: inst.input_element(),
            visible: self.doc.is_rendered(inst.regions.popup()),
        };
        let outcome = inst.resolver.outcome();
        self.call_hooks(point, &hooks, view, outcome);
    }

    fn call_hooks(
        &mut self,
        point: HookPoint,
        hooks: &[fpop_core::Hook],
        view: HookView,
        outcome: Outcome,
    ) {
        let mut failures = Vec::new();
        {
            let mut cx = HookCx {
                doc: &mut self.doc,
                queue: &mut self.queue,
                view,
                outcome,
            };
            for hook in hooks {
                if let Err(err) = hook(&mut cx) {
                    failures.push(Diagnostic::hook_failed(point.name(), &err));
                }
            }
        }
        tracing::trace!(
            target: "fpop.hooks",
            instance = %view.target,
            hook = point.name(),
            count = hooks.len(),
            failed = failures.len(),
            "hooks ran"
        );
        self.diagnostics.extend(failures);
    }
}
