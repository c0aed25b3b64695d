#![forbid(unsafe_code)]

//! Property-based invariants of the single-instance lifecycle.
//!
//! ## Invariants
//!
//! 1. At most one popup skeleton is mounted at any time.
//! 2. Every outcome except the newest one is settled.
//! 3. An outcome is settled exactly when its instance was destroyed.
//! 4. `is_visible` agrees with the phase.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use fpop_core::{KeyCode, KeyEvent, Outcome, Params, PopupEvent, PopupResult};
use fpop_runtime::{Phase, Popup};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Fire { timer: Option<u64>, refire_on_close: bool },
    Confirm,
    Cancel,
    Close,
    Escape,
    Backdrop,
    Advance(u64),
    Update,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (prop::option::of(1u64..500), any::<bool>())
            .prop_map(|(timer, refire_on_close)| Op::Fire { timer, refire_on_close }),
        1 => Just(Op::Confirm),
        1 => Just(Op::Cancel),
        1 => Just(Op::Close),
        1 => Just(Op::Escape),
        1 => Just(Op::Backdrop),
        2 => (0u64..600).prop_map(Op::Advance),
        1 => Just(Op::Update),
    ]
}

struct Harness {
    popup: Popup,
    outcomes: Vec<Outcome>,
    destroyed: Rc<Cell<usize>>,
    fired: Rc<Cell<usize>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            popup: Popup::new(),
            outcomes: Vec::new(),
            destroyed: Rc::default(),
            fired: Rc::default(),
        }
    }

    fn params(&self, timer: Option<u64>, refire_on_close: bool) -> Params {
        let destroyed = Rc::clone(&self.destroyed);
        let mut params = Params::new().on_destroy(move |_| {
            destroyed.set(destroyed.get() + 1);
            Ok(())
        });
        if let Some(ms) = timer {
            params = params.timer(ms);
        }
        if refire_on_close {
            let destroyed = Rc::clone(&self.destroyed);
            let fired = Rc::clone(&self.fired);
            params = params.on_after_close(move |ctl| {
                fired.set(fired.get() + 1);
                let destroyed = Rc::clone(&destroyed);
                ctl.fire(Params::new().on_destroy(move |_| {
                    destroyed.set(destroyed.get() + 1);
                    Ok(())
                }));
                Ok(())
            });
        }
        params
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Fire { timer, refire_on_close } => {
                let params = self.params(*timer, *refire_on_close);
                let outcome = self.popup.fire(params);
                self.outcomes.push(outcome);
            }
            Op::Confirm => self.popup.click_confirm(),
            Op::Cancel => self.popup.click_cancel(),
            Op::Close => self.popup.close(None),
            Op::Escape => {
                self.popup
                    .dispatch(PopupEvent::Key(KeyEvent::new(KeyCode::Escape)));
            }
            Op::Backdrop => {
                if let Some(container) = self.popup.get_container() {
                    self.popup.dispatch(PopupEvent::Click(container));
                }
            }
            Op::Advance(ms) => self.popup.advance(Duration::from_millis(*ms)),
            Op::Update => self.popup.update(Params::new().title("patched")),
        }
    }

    fn mounted(&self) -> usize {
        let doc = self.popup.document();
        doc.elements_by_class(doc.body(), "fpop-container").len()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn single_instance_invariants(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op);

            prop_assert!(h.mounted() <= 1, "after {:?}", op);
            prop_assert_eq!(h.mounted() == 1, h.popup.phase() == Phase::Open);
            prop_assert_eq!(h.popup.is_visible(), h.popup.phase() == Phase::Open);

            if let Some((_, older)) = h.outcomes.split_last() {
                prop_assert!(older.iter().all(Outcome::is_settled));
            }

            // Hook-fired popups are not in `outcomes`; count them separately.
            let settled = h.outcomes.iter().filter(|o| o.is_settled()).count();
            let hook_fired = h.fired.get();
            let live = usize::from(h.popup.phase() == Phase::Open);
            prop_assert_eq!(h.outcomes.len() + hook_fired, h.destroyed.get() + live);
            prop_assert!(settled <= h.destroyed.get());
        }
    }

    #[test]
    fn outcome_never_changes_once_settled(ops in prop::collection::vec(arb_op(), 1..30)) {
        let mut h = Harness::new();
        let mut first_seen: Vec<Option<PopupResult>> = Vec::new();
        for op in &ops {
            h.apply(op);
            first_seen.resize(h.outcomes.len(), None);
            for (seen, outcome) in first_seen.iter_mut().zip(&h.outcomes) {
                let now = outcome.try_result();
                if seen.is_some() {
                    prop_assert_eq!(seen.clone(), now);
                } else {
                    *seen = now;
                }
            }
        }
    }
}
