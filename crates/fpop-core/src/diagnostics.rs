#![forbid(unsafe_code)]

//! Non-fatal diagnostics.
//!
//! Nothing a caller passes to the engine is allowed to throw. Misconfigured
//! parameters, failing hooks and failing collaborators are recorded here,
//! logged through `tracing`, and otherwise ignored.
//!
//! # Failure Modes
//!
//! | Condition | Kind | Severity | Target |
//! |-----------|------|----------|--------|
//! | Unknown parameter name | `UnknownParameter` | warning | `fpop.params` |
//! | Known key, wrong shape | `InvalidParameterType` | warning | `fpop.params` |
//! | Bad per-region class | `InvalidCustomClass` | warning | `fpop.params` |
//! | Non-updatable key passed to `update` | `NotUpdatable` | warning | `fpop.params` |
//! | Positional arg not text/element | `UnexpectedShorthandType` | error | `fpop.params` |
//! | Options of the wrong shape | `InvalidInputOptions` | error | `fpop.params` |
//! | Hook returned `Err` | `HookFailed` | warning | `fpop.hooks` |
//! | Collaborator returned `Err` | `CollaboratorFailed` | warning | `fpop.dom` |

use std::fmt;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UnknownParameter,
    InvalidParameterType,
    InvalidCustomClass,
    NotUpdatable,
    UnexpectedShorthandType,
    InvalidInputOptions,
    HookFailed,
    CollaboratorFailed,
}

/// How loudly it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// `Unknown parameter "<key>"`.
    pub fn unknown_parameter(key: &str) -> Self {
        Self::warning(
            DiagnosticKind::UnknownParameter,
            format!("Unknown parameter \"{key}\""),
        )
    }

    /// `Invalid parameter to update: "<key>"`.
    pub fn not_updatable(key: &str) -> Self {
        Self::warning(
            DiagnosticKind::NotUpdatable,
            format!("Invalid parameter to update: \"{key}\""),
        )
    }

    /// `Invalid type of <key>! Expected <expected>, got <got>`.
    pub fn invalid_type(key: &str, expected: &str, got: &str) -> Self {
        Self::warning(
            DiagnosticKind::InvalidParameterType,
            format!("Invalid type of {key}! Expected {expected}, got {got}"),
        )
    }

    /// `Invalid type of customClass.<region>! Expected string or iterable object, got "<type>"`.
    pub fn invalid_custom_class(region: &str, got: &str) -> Self {
        Self::warning(
            DiagnosticKind::InvalidCustomClass,
            format!(
                "Invalid type of customClass.{region}! Expected string or iterable object, got \"{got}\""
            ),
        )
    }

    /// `Unexpected type of <name>! Expected "string" or "Element", got <type>`.
    pub fn unexpected_shorthand(name: &str, got: &str) -> Self {
        Self::error(
            DiagnosticKind::UnexpectedShorthandType,
            format!("Unexpected type of {name}! Expected \"string\" or \"Element\", got {got}"),
        )
    }

    /// `Unexpected type of inputOptions! Expected object, Map or Promise, got <type>`.
    pub fn invalid_input_options(got: &str) -> Self {
        Self::error(
            DiagnosticKind::InvalidInputOptions,
            format!("Unexpected type of inputOptions! Expected object, Map or Promise, got {got}"),
        )
    }

    pub fn hook_failed(hook: &str, err: &dyn fmt::Display) -> Self {
        Self::warning(DiagnosticKind::HookFailed, format!("{hook} failed: {err}"))
    }

    pub fn collaborator_failed(op: &str, err: &dyn fmt::Display) -> Self {
        Self::warning(
            DiagnosticKind::CollaboratorFailed,
            format!("{op} failed: {err}"),
        )
    }

    /// Emit through `tracing` under the target for this kind.
    pub fn log(&self) {
        let kind = self.kind;
        let message = self.message.as_str();
        match (self.kind, self.severity) {
            (DiagnosticKind::HookFailed, _) => {
                tracing::warn!(target: "fpop.hooks", ?kind, "{message}");
            }
            (DiagnosticKind::CollaboratorFailed, _) => {
                tracing::warn!(target: "fpop.dom", ?kind, "{message}");
            }
            (_, Severity::Error) => {
                tracing::error!(target: "fpop.params", ?kind, "{message}");
            }
            (_, Severity::Warning) => {
                tracing::warn!(target: "fpop.params", ?kind, "{message}");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Append-only diagnostic sink.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.entries.push(diagnostic);
    }

    /// Log and record a batch.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_expected_wording() {
        assert_eq!(
            Diagnostic::unknown_parameter("invalidParam").message,
            "Unknown parameter \"invalidParam\""
        );
        assert_eq!(
            Diagnostic::invalid_custom_class("title", "object").message,
            "Invalid type of customClass.title! Expected string or iterable object, got \"object\""
        );
        assert_eq!(
            Diagnostic::unexpected_shorthand("html", "object").message,
            "Unexpected type of html! Expected \"string\" or \"Element\", got object"
        );
        assert_eq!(
            Diagnostic::invalid_input_options("string").message,
            "Unexpected type of inputOptions! Expected object, Map or Promise, got string"
        );
        assert_eq!(
            Diagnostic::not_updatable("timer").message,
            "Invalid parameter to update: \"timer\""
        );
    }

    #[test]
    fn take_drains() {
        let mut d = Diagnostics::new();
        d.push(Diagnostic::unknown_parameter("x"));
        d.push(Diagnostic::unexpected_shorthand("html", "number"));
        assert_eq!(d.of_kind(DiagnosticKind::UnknownParameter).count(), 1);
        assert_eq!(d.take().len(), 2);
        assert!(d.is_empty());
    }
}
