//! Shrink search driver.
//!
//! Each pass regenerates the whole tree with the shrink slot bound and open.
//! The first node, depth first and children before parents, that still has a
//! candidate left claims the slot and pins that candidate. If the property
//! still fails with it, the candidate becomes the node's new baseline.

use log::{debug, trace};

use crate::gen::Generator;
use crate::rose::Rose;

/// Interpretation of a property's result.
pub trait Outcome {
    /// True when the property passed, i.e. the value is not a counterexample.
    fn holds(&self) -> bool;
}

impl Outcome for bool {
    fn holds(&self) -> bool {
        *self
    }
}

impl<T, E> Outcome for Result<T, E> {
    fn holds(&self) -> bool {
        self.is_ok()
    }
}

/// Configuration for a shrink search
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Maximum number of passes; `None` runs until exhaustion
    pub max_tries: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No node had a candidate left
    Exhausted,
    /// A shrink was accepted and the search was asked to stop there
    Accepted,
    /// The configured number of passes was used up
    BudgetReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrinkResult {
    /// Whether at least one smaller counterexample was accepted
    pub success: bool,
    /// Passes run, counting accepted and rejected candidates and the final
    /// pass that found nothing to claim
    pub num_tries: usize,
    pub accepted: usize,
    pub stop: StopReason,
}

impl Rose {
    /// Shrinks until no node can propose a candidate any more.
    pub fn shrink<G>(&mut self, property: &G) -> ShrinkResult
    where
        G: Generator + Clone + 'static,
        G::Output: Outcome,
    {
        self.shrink_with(property, &SearchConfig::default())
    }

    /// Shrinks with a bounded number of passes.
    pub fn shrink_with<G>(&mut self, property: &G, config: &SearchConfig) -> ShrinkResult
    where
        G: Generator + Clone + 'static,
        G::Output: Outcome,
    {
        self.search(property, config.max_tries, false)
    }

    /// Looks for one smaller counterexample and stops as soon as it is
    /// accepted. `success` is false once the search is exhausted.
    pub fn shrink_step<G>(&mut self, property: &G) -> ShrinkResult
    where
        G: Generator + Clone + 'static,
        G::Output: Outcome,
    {
        self.search(property, None, true)
    }

    fn search<G>(&mut self, property: &G, max_tries: Option<usize>, single: bool) -> ShrinkResult
    where
        G: Generator + Clone + 'static,
        G::Output: Outcome,
    {
        let mut num_tries = 0;
        let mut accepted = 0;

        loop {
            if max_tries.map_or(false, |max| num_tries >= max) {
                debug!(
                    "shrink budget of {} passes reached after {} accepted shrinks",
                    num_tries, accepted
                );
                return ShrinkResult {
                    success: accepted > 0,
                    num_tries,
                    accepted,
                    stop: StopReason::BudgetReached,
                };
            }

            num_tries += 1;
            let (outcome, claimed) = {
                let mut pass = self.enter();
                pass.rose.context.shrunk_node.push(None);
                let outcome = pass.rose.generate(property);
                (outcome, pass.rose.context.shrunk_node.pop().flatten())
            };

            let node = match claimed {
                Some(node) => node,
                None => {
                    debug!(
                        "shrinking exhausted after {} passes, {} accepted",
                        num_tries, accepted
                    );
                    return ShrinkResult {
                        success: accepted > 0,
                        num_tries,
                        accepted,
                        stop: StopReason::Exhausted,
                    };
                }
            };

            if outcome.holds() {
                trace!("candidate at node {} passes, rejected", node);
                self.withdraw_shrink(node);
                continue;
            }

            self.accept_shrink(node);
            accepted += 1;
            debug!("accepted shrink at node {} on pass {}", node, num_tries);

            if single {
                return ShrinkResult {
                    success: true,
                    num_tries,
                    accepted,
                    stop: StopReason::Accepted,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen::{arbitrary, from_fn, in_range};
    use crate::random::ScriptedSource;
    use crate::shrink;
    use test_log::test;

    #[test]
    fn test_result_outcome() {
        let ok: Result<(), String> = Ok(());
        let err: Result<(), String> = Err("boom".to_string());
        assert!(ok.holds());
        assert!(!err.holds());
    }

    #[test]
    fn test_no_candidates_exhausts_on_first_pass() {
        let mut rose = Rose::new(ScriptedSource::new(vec![3, 4]));
        let property = from_fn(|rose| {
            let a = rose.pick(&from_fn(|rose| rose.atom()));
            let b = rose.pick(&from_fn(|rose| rose.atom()));
            a + b < 5
        });

        assert!(!rose.generate(&property));
        let result = rose.shrink(&property);
        assert_eq!(
            result,
            ShrinkResult {
                success: false,
                num_tries: 1,
                accepted: 0,
                stop: StopReason::Exhausted,
            }
        );
    }

    #[test]
    fn test_single_value_shrinks_to_boundary() {
        let mut rose = Rose::new(ScriptedSource::new(vec![100]));
        let property = from_fn(|rose| rose.pick(&arbitrary::<u8>()) < 10);

        assert!(!rose.generate(&property));
        let result = rose.shrink(&property);

        // 100 -> 50 -> 25 -> 12 accepted, then 6, 3, 1 and 0 all pass.
        assert!(result.success);
        assert_eq!(result.accepted, 3);
        assert_eq!(result.num_tries, 3 + 4 + 1);
        assert_eq!(result.stop, StopReason::Exhausted);
        assert_eq!(rose.example(), vec!["12".to_string()]);
    }

    #[test]
    fn test_budget_stops_early() {
        let mut rose = Rose::new(ScriptedSource::new(vec![100]));
        let property = from_fn(|rose| rose.pick(&arbitrary::<u8>()) < 10);
        rose.generate(&property);

        let config = SearchConfig { max_tries: Some(2) };
        let result = rose.shrink_with(&property, &config);
        assert_eq!(result.num_tries, 2);
        assert_eq!(result.accepted, 2);
        assert_eq!(result.stop, StopReason::BudgetReached);
        assert_eq!(rose.example(), vec!["25".to_string()]);

        let rest = rose.shrink(&property);
        assert_eq!(rest.accepted, 1);
        assert_eq!(rose.example(), vec!["12".to_string()]);
    }

    #[test]
    fn test_budget_ending_on_rejection_keeps_baseline() {
        let mut rose = Rose::new(ScriptedSource::new(vec![100]));
        let property = from_fn(|rose| rose.pick(&arbitrary::<u8>()) < 10);
        rose.generate(&property);

        // 50, 25 and 12 accepted, 6 rejected.
        let config = SearchConfig { max_tries: Some(4) };
        let result = rose.shrink_with(&property, &config);
        assert_eq!(result.accepted, 3);
        assert_eq!(result.stop, StopReason::BudgetReached);

        let child = rose.children(rose.root())[0];
        assert!(!rose.node(child).is_proposing());
        assert!(!rose.generate(&property));
        assert_eq!(rose.example(), vec!["12".to_string()]);
    }

    #[test]
    fn test_shrink_step_stops_at_each_acceptance() {
        let mut rose = Rose::new(ScriptedSource::new(vec![100]));
        let property = from_fn(|rose| rose.pick(&arbitrary::<u8>()) < 10);
        rose.generate(&property);

        let first = rose.shrink_step(&property);
        assert_eq!((first.success, first.num_tries), (true, 1));
        assert_eq!(first.stop, StopReason::Accepted);
        assert_eq!(rose.example(), vec!["50".to_string()]);
    }

    #[test]
    fn test_proposal_is_cleared_after_search() {
        let mut rose = Rose::new(ScriptedSource::new(vec![9]));
        let property = from_fn(|rose| rose.pick(&in_range(0u32, 20)) < 3);
        rose.generate(&property);
        rose.shrink(&property);

        let child = rose.children(rose.root())[0];
        assert!(!rose.node(child).is_proposing());
        assert!(rose.node(child).has_accepted());
        assert!(!rose.context().is_shrinking());
    }

    #[test]
    fn test_custom_shrink_on_closure_generator() {
        let mut rose = Rose::new(ScriptedSource::new(vec![]));
        let word = from_fn(|_| "shrinking".to_string()).with_shrink(|s: String| {
            let len = s.len();
            Box::new(shrink::unfold(
                len,
                |n| *n > 0,
                move |n| (s[..n - 1].to_string(), n - 1),
            ))
        });
        let property = from_fn(move |rose| rose.pick(&word).len() < 4);

        rose.generate(&property);
        let result = rose.shrink(&property);
        assert!(result.success);
        assert_eq!(rose.example(), vec!["\"shri\"".to_string()]);
    }
}
