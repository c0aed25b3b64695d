#![forbid(unsafe_code)]

//! Errors the engine can return.
//!
//! Almost nothing fails: configuration problems are diagnostics and misuse
//! is a no-op. Only inputs that cannot be interpreted at all are errors.

use thiserror::Error;

/// Engine error.
#[derive(Debug, Error)]
pub enum PopupError {
    /// `fire_json` was given text that is not JSON.
    #[error("popup arguments are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// `fire_json` was given more positional arguments than there are slots.
    #[error("expected at most {max} positional arguments, got {got}")]
    TooManyArguments { max: usize, got: usize },
}
