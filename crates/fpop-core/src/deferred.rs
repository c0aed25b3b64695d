#![forbid(unsafe_code)]

//! Host-settled deferred values.
//!
//! Asynchronous parameters (option producers, validators, pre-confirm
//! hooks) hand the engine a [`Deferred`]. The host keeps the matching
//! [`Settler`] and settles it whenever its own async work finishes; the
//! engine notices on its next `pump()`.
//!
//! There is no executor and no waker plumbing: the engine polls
//! [`Deferred::get`] at well-defined points, which keeps every transition
//! deterministic under test.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Read half of a host-settled value.
pub struct Deferred<T> {
    cell: Rc<RefCell<Option<T>>>,
}

/// Write half of a host-settled value.
pub struct Settler<T> {
    cell: Rc<RefCell<Option<T>>>,
}

/// Create a connected, unsettled pair.
pub fn deferred<T>() -> (Settler<T>, Deferred<T>) {
    let cell = Rc::new(RefCell::new(None));
    (
        Settler {
            cell: Rc::clone(&cell),
        },
        Deferred { cell },
    )
}

impl<T: Clone> Deferred<T> {
    /// A deferred that is already settled.
    pub fn ready(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Some(value))),
        }
    }

    /// The settled value, if any.
    pub fn get(&self) -> Option<T> {
        self.cell.borrow().clone()
    }
}

impl<T> Deferred<T> {
    /// Whether the value has been settled.
    pub fn is_settled(&self) -> bool {
        self.cell.borrow().is_some()
    }
}

impl<T> Settler<T> {
    /// Settle the value. The first call wins; returns `false` afterwards.
    pub fn settle(&self, value: T) -> bool {
        let mut cell = self.cell.borrow_mut();
        if cell.is_some() {
            return false;
        }
        *cell = Some(value);
        true
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T> fmt::Debug for Settler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("settled", &self.cell.borrow().is_some())
            .finish()
    }
}
