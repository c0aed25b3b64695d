#![forbid(unsafe_code)]

//! Customization seam for argument handling and parameter defaults.
//!
//! A strategy sees every `fire` before the engine does. The stock
//! [`DefaultStrategy`] passes params through; [`Mixin`] layers a set of
//! defaults under whatever the caller passes, and mixins stack.

use fpop_core::{Diagnostic, FireArg, Params};

/// Hooks into argument parsing and parameter preparation.
pub trait PopupStrategy {
    /// Turn positional arguments into params.
    fn args_to_params(&self, args: &[FireArg]) -> (Params, Vec<Diagnostic>) {
        Params::from_args(args)
    }

    /// Final adjustment before the popup is built.
    fn prepare(&self, params: Params) -> Params {
        params
    }
}

/// Pass-through strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStrategy;

impl PopupStrategy for DefaultStrategy {}

/// Defaults applied under every `fire`, on top of an inner strategy.
pub struct Mixin {
    defaults: Params,
    inner: Box<dyn PopupStrategy>,
}

impl Mixin {
    pub fn new(defaults: Params) -> Self {
        Self::over(defaults, Box::new(DefaultStrategy))
    }

    /// Layer `defaults` over `inner`'s own defaults.
    pub fn over(defaults: Params, inner: Box<dyn PopupStrategy>) -> Self {
        Self { defaults, inner }
    }
}

impl std::fmt::Debug for Mixin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixin")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl PopupStrategy for Mixin {
    fn args_to_params(&self, args: &[FireArg]) -> (Params, Vec<Diagnostic>) {
        self.inner.args_to_params(args)
    }

    fn prepare(&self, params: Params) -> Params {
        self.inner.prepare(self.defaults.merge(&params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpop_dom::Content;

    #[test]
    fn mixin_defaults_yield_to_caller_params() {
        let mixin = Mixin::new(Params::new().title("default").confirm_button_text("Go"));
        let params = mixin.prepare(Params::new().title("mine"));
        assert_eq!(params.title, Some(Content::from("mine")));
        assert_eq!(params.confirm_button_text, Some(Content::from("Go")));
    }

    #[test]
    fn stacked_mixins_prefer_the_outer_layer() {
        let inner = Mixin::new(Params::new().toast(true).timer(100));
        let outer = Mixin::over(Params::new().timer(50), Box::new(inner));
        let params = outer.prepare(Params::new());
        assert_eq!(params.timer, Some(50));
        assert_eq!(params.toast, Some(true));
    }
}
