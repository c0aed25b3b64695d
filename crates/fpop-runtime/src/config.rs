#![forbid(unsafe_code)]

//! Engine configuration.

/// Host-level settings for a [`Popup`](crate::Popup). Fields are set
/// through the builder methods only, so their bounds always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupConfig {
    /// Page scrollbar width in px, as measured by the host. Used for body
    /// padding compensation while a modal is shown. 0 disables it.
    scrollbar_width: u32,
    /// Upper bound on queued actions processed by one drain. Hooks that keep
    /// re-queueing work past this bound have the excess dropped (queued
    /// fires resolve as reason-less dismissals).
    max_actions_per_drain: usize,
    /// Whether the page is visible when the engine starts.
    page_visible: bool,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            scrollbar_width: 0,
            max_actions_per_drain: 1024,
            page_visible: true,
        }
    }
}

impl PopupConfig {
    /// Set the measured scrollbar width.
    #[must_use]
    pub fn with_scrollbar_width(mut self, px: u32) -> Self {
        self.scrollbar_width = px;
        self
    }

    /// Set the drain bound (at least 1).
    #[must_use]
    pub fn with_max_actions_per_drain(mut self, max: usize) -> Self {
        self.max_actions_per_drain = max.max(1);
        self
    }

    #[inline]
    pub const fn scrollbar_width(&self) -> u32 {
        self.scrollbar_width
    }

    /// Drain bound; never 0.
    #[inline]
    pub const fn max_actions_per_drain(&self) -> usize {
        self.max_actions_per_drain
    }

    #[inline]
    pub const fn page_visible(&self) -> bool {
        self.page_visible
    }

    /// Start with the page hidden.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.page_visible = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = PopupConfig::default()
            .with_scrollbar_width(15)
            .with_max_actions_per_drain(0)
            .hidden();
        assert_eq!(config.scrollbar_width(), 15);
        assert_eq!(config.max_actions_per_drain(), 1);
        assert!(!config.page_visible());
        assert!(PopupConfig::default().page_visible());
        assert_eq!(PopupConfig::default().max_actions_per_drain(), 1024);
    }
}
