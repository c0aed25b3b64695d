#![forbid(unsafe_code)]

//! Outcome model: what a popup resolves with, and the one-shot channel that
//! carries it.
//!
//! # Invariants
//!
//! 1. A [`Resolver`] settles its [`Outcome`] at most once. The first call to
//!    [`Resolver::resolve`] wins; later calls return `false` and change
//!    nothing.
//! 2. Every clone of an [`Outcome`] observes the same result.
//! 3. Dropping the [`Resolver`] without resolving leaves the outcome pending
//!    forever. The engine never does this except for a vetoed confirm.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a popup was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissReason {
    /// Cancel button.
    Cancel,
    /// Click outside the popup.
    Backdrop,
    /// Close button.
    Close,
    /// Escape key.
    Esc,
    /// Timer expiry.
    Timer,
}

impl DismissReason {
    /// Wire name (`"cancel"`, `"esc"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Backdrop => "backdrop",
            Self::Close => "close",
            Self::Esc => "esc",
            Self::Timer => "timer",
        }
    }
}

impl std::fmt::Display for DismissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outcome of one popup instance.
///
/// Serializes to `{"value": V}`, `{"dismiss": "<reason>"}`, or `{}` for a
/// dismissal without a reason (bare `close()` or replacement by `fire`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PopupResult {
    Confirmed {
        value: Value,
    },
    Dismissed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dismiss: Option<DismissReason>,
    },
}

impl PopupResult {
    /// Confirmation with `value`.
    pub fn confirmed(value: impl Into<Value>) -> Self {
        Self::Confirmed {
            value: value.into(),
        }
    }

    /// Dismissal with a reason.
    pub const fn dismissed(reason: DismissReason) -> Self {
        Self::Dismissed {
            dismiss: Some(reason),
        }
    }

    /// Dismissal without a reason.
    pub const fn dismissed_silently() -> Self {
        Self::Dismissed { dismiss: None }
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    #[inline]
    pub fn is_dismissed(&self) -> bool {
        matches!(self, Self::Dismissed { .. })
    }

    /// Confirmed value, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Confirmed { value } => Some(value),
            Self::Dismissed { .. } => None,
        }
    }

    /// Dismissal reason, if any.
    pub fn dismiss_reason(&self) -> Option<DismissReason> {
        match self {
            Self::Dismissed { dismiss } => *dismiss,
            Self::Confirmed { .. } => None,
        }
    }

    /// JSON shape of the result.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Confirmed { value } => serde_json::json!({ "value": value }),
            Self::Dismissed { dismiss: Some(r) } => serde_json::json!({ "dismiss": r.as_str() }),
            Self::Dismissed { dismiss: None } => serde_json::json!({}),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    result: Option<PopupResult>,
    wakers: Vec<Waker>,
}

/// Create a connected resolver/outcome pair.
pub fn outcome_channel() -> (Resolver, Outcome) {
    let slot = Rc::new(RefCell::new(Slot::default()));
    (
        Resolver {
            slot: Rc::clone(&slot),
        },
        Outcome { slot },
    )
}

/// Write half: settles the outcome once.
#[derive(Debug)]
pub struct Resolver {
    slot: Rc<RefCell<Slot>>,
}

impl Resolver {
    /// Settle the outcome. Returns `false` if it was already settled.
    pub fn resolve(&self, result: PopupResult) -> bool {
        let wakers = {
            let mut slot = self.slot.borrow_mut();
            if slot.result.is_some() {
                return false;
            }
            slot.result = Some(result);
            std::mem::take(&mut slot.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Whether the outcome has been settled.
    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().result.is_some()
    }

    /// A read handle on the same outcome.
    pub fn outcome(&self) -> Outcome {
        Outcome {
            slot: Rc::clone(&self.slot),
        }
    }
}

/// Read half: an awaitable, cloneable handle on a popup's result.
#[derive(Debug, Clone)]
pub struct Outcome {
    slot: Rc<RefCell<Slot>>,
}

impl Outcome {
    /// An outcome that is already settled.
    pub fn ready(result: PopupResult) -> Self {
        let (resolver, outcome) = outcome_channel();
        resolver.resolve(result);
        outcome
    }

    /// The result, if settled.
    pub fn try_result(&self) -> Option<PopupResult> {
        self.slot.borrow().result.clone()
    }

    /// Whether the result is available.
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().result.is_some()
    }

    /// Whether two handles observe the same popup.
    pub fn same_as(&self, other: &Outcome) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Future for Outcome {
    type Output = PopupResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        if let Some(result) = &slot.result {
            return Poll::Ready(result.clone());
        }
        if !slot.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            slot.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
