#![forbid(unsafe_code)]

//! Confirm-time validation pipeline.
//!
//! A confirm attempt runs: caller validator (sync or deferred), then the
//! pre-confirm hook (sync or deferred), then resolves. Built-in validity
//! (email/url formats, number parsing, custom controls) is checked by the
//! engine before an attempt starts, because it needs the document.
//!
//! ```text
//! begin(value) ─► validator ─┬─ Some(msg) ──────────────► Rejected(msg)
//!                            ├─ None/"" ─► pre-confirm ─┬─ Keep/Replace ─► Resolved(v)
//!                            │                          ├─ Veto ─────────► Vetoed
//!                            │                          └─ Reject(msg) ──► Rejected(msg)
//!                            └─ Later ─► Pending (poll again on pump)
//! ```
//!
//! # Invariants
//!
//! 1. Only the newest attempt can produce a step. [`cancel`](ValidationPipeline::cancel)
//!    and every new [`begin`](ValidationPipeline::begin) retire the previous
//!    attempt; its deferred results are dropped unread.
//! 2. [`poll`](ValidationPipeline::poll) is idempotent while nothing settled.
//! 3. Every finished attempt leaves one entry in the ledger.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Validator returns `Some("")` | Treated as valid |
//! | Deferred never settles | Attempt stays `Pending` until cancelled |
//! | Popup dismissed while pending | Engine calls `cancel`; late result ignored |

use fpop_core::Deferred;
use fpop_core::params::{PreConfirm, PreConfirmVerdict, Reply, Validator};
use serde_json::Value;

/// What a pipeline step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationStep {
    /// Confirm with this value.
    Resolved(Value),
    /// Show this message; stay open.
    Rejected(String),
    /// Pre-confirm vetoed; stay open and interactive.
    Vetoed,
    /// Waiting on a host-settled deferred.
    Pending,
}

/// Ledger entry for a finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub attempt: u64,
    pub step: ValidationStep,
}

enum Stage {
    Idle,
    AwaitValidator {
        value: Value,
        reply: Deferred<Option<String>>,
        pre_confirm: Option<PreConfirm>,
    },
    AwaitPreConfirm {
        value: Value,
        reply: Deferred<PreConfirmVerdict>,
    },
}

/// Validation state for one popup instance.
pub struct ValidationPipeline {
    attempt: u64,
    stage: Stage,
    ledger: Vec<AttemptRecord>,
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("attempt", &self.attempt)
            .field("pending", &self.is_pending())
            .field("ledger", &self.ledger.len())
            .finish()
    }
}

impl ValidationPipeline {
    pub fn new() -> Self {
        Self {
            attempt: 0,
            stage: Stage::Idle,
            ledger: Vec::new(),
        }
    }

    /// Number of attempts started so far.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Whether an attempt is waiting on a deferred.
    pub fn is_pending(&self) -> bool {
        !matches!(self.stage, Stage::Idle)
    }

    /// Finished attempts, oldest first.
    pub fn ledger(&self) -> &[AttemptRecord] {
        &self.ledger
    }

    /// Start a new attempt, retiring any pending one.
    pub fn begin(
        &mut self,
        value: Value,
        validator: Option<&Validator>,
        pre_confirm: Option<&PreConfirm>,
    ) -> ValidationStep {
        self.cancel();
        self.attempt += 1;
        tracing::debug!(target: "fpop.validation", attempt = self.attempt, "validation started");
        let step = match validator.map(|v| (v.0)(&value)) {
            None => self.run_pre_confirm(value, pre_confirm.cloned()),
            Some(Reply::Ready(message)) => self.after_validator(value, message, pre_confirm.cloned()),
            Some(Reply::Later(reply)) => {
                self.stage = Stage::AwaitValidator {
                    value,
                    reply,
                    pre_confirm: pre_confirm.cloned(),
                };
                self.poll_stage()
            }
        };
        self.finish(step)
    }

    /// Re-check a pending attempt.
    pub fn poll(&mut self) -> ValidationStep {
        if !self.is_pending() {
            return ValidationStep::Pending;
        }
        let step = self.poll_stage();
        self.finish(step)
    }

    /// Retire the current attempt. Any late result is ignored.
    pub fn cancel(&mut self) {
        if self.is_pending() {
            tracing::debug!(target: "fpop.validation", attempt = self.attempt, "validation discarded");
        }
        self.stage = Stage::Idle;
    }

    fn poll_stage(&mut self) -> ValidationStep {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle => ValidationStep::Pending,
            Stage::AwaitValidator {
                value,
                reply,
                pre_confirm,
            } => match reply.get() {
                Some(message) => self.after_validator(value, message, pre_confirm),
                None => {
                    self.stage = Stage::AwaitValidator {
                        value,
                        reply,
                        pre_confirm,
                    };
                    ValidationStep::Pending
                }
            },
            Stage::AwaitPreConfirm { value, reply } => match reply.get() {
                Some(verdict) => apply_verdict(value, verdict),
                None => {
                    self.stage = Stage::AwaitPreConfirm { value, reply };
                    ValidationStep::Pending
                }
            },
        }
    }

    fn after_validator(
        &mut self,
        value: Value,
        message: Option<String>,
        pre_confirm: Option<PreConfirm>,
    ) -> ValidationStep {
        match message.filter(|m| !m.is_empty()) {
            Some(message) => ValidationStep::Rejected(message),
            None => self.run_pre_confirm(value, pre_confirm),
        }
    }

    fn run_pre_confirm(&mut self, value: Value, pre_confirm: Option<PreConfirm>) -> ValidationStep {
        let Some(pre_confirm) = pre_confirm else {
            return ValidationStep::Resolved(value);
        };
        match (pre_confirm.0)(&value) {
            Reply::Ready(verdict) => apply_verdict(value, verdict),
            Reply::Later(reply) => {
                self.stage = Stage::AwaitPreConfirm { value, reply };
                self.poll_stage()
            }
        }
    }

    fn finish(&mut self, step: ValidationStep) -> ValidationStep {
        if step != ValidationStep::Pending {
            tracing::debug!(
                target: "fpop.validation",
                attempt = self.attempt,
                step = ?step,
                "validation finished"
            );
            self.ledger.push(AttemptRecord {
                attempt: self.attempt,
                step: step.clone(),
            });
        }
        step
    }
}

fn apply_verdict(value: Value, verdict: PreConfirmVerdict) -> ValidationStep {
    match verdict {
        PreConfirmVerdict::Keep => ValidationStep::Resolved(value),
        PreConfirmVerdict::Replace(v) => ValidationStep::Resolved(v),
        PreConfirmVerdict::Veto => ValidationStep::Vetoed,
        PreConfirmVerdict::Reject(message) => ValidationStep::Rejected(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpop_core::deferred;
    use serde_json::json;
    use std::rc::Rc;

    fn validator(f: impl Fn(&Value) -> Reply<Option<String>> + 'static) -> Validator {
        Validator(Rc::new(f))
    }

    fn pre_confirm(f: impl Fn(&Value) -> Reply<PreConfirmVerdict> + 'static) -> PreConfirm {
        PreConfirm(Rc::new(f))
    }

    #[test]
    fn no_callbacks_resolves_with_value() {
        let mut p = ValidationPipeline::new();
        assert_eq!(p.begin(json!("x"), None, None), ValidationStep::Resolved(json!("x")));
        assert_eq!(p.ledger().len(), 1);
    }

    #[test]
    fn sync_validator_message_rejects_and_empty_passes() {
        let v = validator(|value| {
            Reply::Ready((value != &json!("ok")).then(|| String::from("nope")))
        });
        let mut p = ValidationPipeline::new();
        assert_eq!(
            p.begin(json!("bad"), Some(&v), None),
            ValidationStep::Rejected("nope".into())
        );
        assert_eq!(p.begin(json!("ok"), Some(&v), None), ValidationStep::Resolved(json!("ok")));
        let empty = validator(|_| Reply::Ready(Some(String::new())));
        assert_eq!(p.begin(json!(1), Some(&empty), None), ValidationStep::Resolved(json!(1)));
        assert_eq!(p.attempt(), 3);
    }

    #[test]
    fn deferred_validator_waits_then_runs_pre_confirm() {
        let (settler, reply) = deferred::<Option<String>>();
        let reply = Rc::new(reply);
        let v = {
            let reply = Rc::clone(&reply);
            validator(move |_| Reply::Later((*reply).clone()))
        };
        let pc = pre_confirm(|_| Reply::Ready(PreConfirmVerdict::Replace(json!("swapped"))));
        let mut p = ValidationPipeline::new();
        assert_eq!(p.begin(json!("v"), Some(&v), Some(&pc)), ValidationStep::Pending);
        assert!(p.is_pending());
        assert_eq!(p.poll(), ValidationStep::Pending);
        settler.settle(None);
        assert_eq!(p.poll(), ValidationStep::Resolved(json!("swapped")));
        assert!(!p.is_pending());
    }

    #[test]
    fn cancelled_attempt_never_produces_a_step() {
        let (settler, reply) = deferred::<Option<String>>();
        let v = validator(move |_| Reply::Later(reply.clone()));
        let mut p = ValidationPipeline::new();
        assert_eq!(p.begin(json!(1), Some(&v), None), ValidationStep::Pending);
        p.cancel();
        settler.settle(Some("late".into()));
        assert_eq!(p.poll(), ValidationStep::Pending);
        assert!(p.ledger().is_empty());
    }

    #[test]
    fn new_attempt_supersedes_pending_one() {
        let (first_settler, first) = deferred::<Option<String>>();
        let mut p = ValidationPipeline::new();
        let slow = validator(move |_| Reply::Later(first.clone()));
        assert_eq!(p.begin(json!(1), Some(&slow), None), ValidationStep::Pending);
        assert_eq!(p.begin(json!(2), None, None), ValidationStep::Resolved(json!(2)));
        first_settler.settle(Some("stale".into()));
        assert_eq!(p.poll(), ValidationStep::Pending);
        assert_eq!(p.ledger().len(), 1);
        assert_eq!(p.ledger()[0].attempt, 2);
    }

    #[test]
    fn pre_confirm_verdicts() {
        let mut p = ValidationPipeline::new();
        let veto = pre_confirm(|_| Reply::Ready(PreConfirmVerdict::from_json(json!(false))));
        assert_eq!(p.begin(json!(1), None, Some(&veto)), ValidationStep::Vetoed);
        let zero = pre_confirm(|_| Reply::Ready(PreConfirmVerdict::from_json(json!(0))));
        assert_eq!(p.begin(json!(1), None, Some(&zero)), ValidationStep::Resolved(json!(0)));
        let keep = pre_confirm(|_| Reply::Ready(PreConfirmVerdict::Keep));
        assert_eq!(p.begin(json!(7), None, Some(&keep)), ValidationStep::Resolved(json!(7)));
        let reject = pre_confirm(|_| Reply::Ready(PreConfirmVerdict::Reject("server said no".into())));
        assert_eq!(
            p.begin(json!(1), None, Some(&reject)),
            ValidationStep::Rejected("server said no".into())
        );
    }

    #[test]
    fn deferred_pre_confirm() {
        let (settler, reply) = deferred::<PreConfirmVerdict>();
        let pc = pre_confirm(move |_| Reply::Later(reply.clone()));
        let mut p = ValidationPipeline::new();
        assert_eq!(p.begin(json!("a"), None, Some(&pc)), ValidationStep::Pending);
        settler.settle(PreConfirmVerdict::Keep);
        assert_eq!(p.poll(), ValidationStep::Resolved(json!("a")));
    }
}
