//! # Shrink Search Test Suite
//!
//! End-to-end shrinking scenarios driven through the public API: a property is
//! generated once at the root of a fresh tree, fails, and is then shrunk.
//!
//! Covered here:
//! - convergence of a pair of integers to a local minimum
//! - depth-first, left-to-right claim order between sibling nodes
//! - the pass count identity `accepted + rejected + 1`
//! - stepwise shrinking versus running to exhaustion
//! - collections shrinking through their children and then by removal

use std::cell::RefCell;
use std::rc::Rc;

use rosecheck::{
    arbitrary, from_fn, in_range, vec_of, FromFn, Rose, ScriptedSource, StopReason,
};

type Seen = Rc<RefCell<Vec<(i32, i32)>>>;

/// Property `a + b < 10` over two picked integers, recording every pair it sees
fn sum_below_ten(seen: &Seen) -> FromFn<bool> {
    let seen = Rc::clone(seen);
    from_fn(move |rose| {
        let a = rose.pick(&arbitrary::<i32>());
        let b = rose.pick(&arbitrary::<i32>());
        seen.borrow_mut().push((a, b));
        a + b < 10
    })
}

/// Fresh tree whose first two atoms are 6 and 7
fn six_and_seven() -> Rose {
    Rose::new(ScriptedSource::new(vec![6, 7]))
}

#[test]
fn test_pair_converges_to_local_minimum() {
    let seen = Seen::default();
    let property = sum_below_ten(&seen);
    let mut rose = six_and_seven();

    assert!(!rose.generate(&property));
    assert_eq!(seen.borrow().as_slice(), &[(6, 7)]);
    seen.borrow_mut().clear();

    let result = rose.shrink(&property);

    assert!(result.success);
    assert_eq!(result.accepted, 1);
    assert_eq!(result.num_tries, 7);
    assert_eq!(result.stop, StopReason::Exhausted);
    assert_eq!(rose.example(), vec!["3".to_string(), "7".to_string()]);
}

#[test]
fn test_first_child_is_exhausted_before_second_is_tried() {
    let seen = Seen::default();
    let property = sum_below_ten(&seen);
    let mut rose = six_and_seven();
    rose.generate(&property);
    seen.borrow_mut().clear();

    rose.shrink(&property);

    // a: 3 accepted, 1 and 0 rejected; then b: 3, 1, 0 rejected; then the
    // final pass that finds nothing left to claim.
    assert_eq!(
        seen.borrow().as_slice(),
        &[(3, 7), (1, 7), (0, 7), (3, 3), (3, 1), (3, 0), (3, 7)]
    );
}

#[test]
fn test_num_tries_counts_accepted_and_rejected() {
    let mut rose = Rose::new(ScriptedSource::new(vec![200]));
    let property = from_fn(|rose| rose.pick(&arbitrary::<u8>()) < 30);
    rose.generate(&property);

    let result = rose.shrink(&property);

    // 200 -> 100 -> 50 accepted; 25, 12, 6, 3, 1, 0 rejected.
    assert_eq!(result.accepted, 2);
    assert_eq!(result.num_tries, 2 + 6 + 1);
    assert_eq!(rose.example(), vec!["50".to_string()]);
}

#[test]
fn test_stepwise_shrinking_matches_full_search() {
    let seen = Seen::default();
    let property = sum_below_ten(&seen);
    let mut rose = six_and_seven();
    rose.generate(&property);

    let mut total_tries = 0;
    let mut steps = Vec::new();
    loop {
        let step = rose.shrink_step(&property);
        total_tries += step.num_tries;
        steps.push((step.success, step.num_tries));
        if !step.success {
            assert_eq!(step.stop, StopReason::Exhausted);
            break;
        }
        assert_eq!(step.stop, StopReason::Accepted);
    }

    assert_eq!(steps, vec![(true, 1), (false, 6)]);
    assert_eq!(total_tries, 7);
    assert_eq!(rose.example(), vec!["3".to_string(), "7".to_string()]);
}

#[test]
fn test_passing_property_has_nothing_to_accept() {
    let mut rose = Rose::new(ScriptedSource::new(vec![1, 2]));
    let property = from_fn(|rose| {
        let a = rose.pick(&in_range(0i32, 5));
        let b = rose.pick(&in_range(0i32, 5));
        a + b < 100
    });
    assert!(rose.generate(&property));

    let result = rose.shrink(&property);
    assert!(!result.success);
    assert_eq!(result.accepted, 0);
    // 1 -> 0 for a, 2 -> 1 -> 0 for b, then exhaustion.
    assert_eq!(result.num_tries, 1 + 2 + 1);
    assert_eq!(rose.example(), vec!["1".to_string(), "2".to_string()]);
}

#[test]
fn test_vector_shrinks_length_then_elements_then_removal() {
    let mut rose = Rose::new(ScriptedSource::new(vec![4, 10, 60, 20, 70]));
    let property = from_fn(|rose| {
        let values = rose.pick(&vec_of(in_range(0u8, 100), 0, 5));
        values.iter().all(|&v| v < 50)
    });

    assert!(!rose.generate(&property));
    assert_eq!(rose.string_value(rose.children(rose.root())[0]), "[10, 60, 20, 70]");

    let result = rose.shrink(&property);

    // length 4 -> 2 accepted, 1 and 0 rejected
    // first element 10 -> 5 -> 2 -> 1 -> 0 accepted
    // second element 60: 30, 15, 7, 3, 1, 0 rejected
    // removal: [60] accepted, [] rejected
    assert_eq!(result.accepted, 1 + 4 + 1);
    assert_eq!(result.num_tries, 6 + (2 + 6 + 1) + 1);
    assert_eq!(rose.example(), vec!["[60]".to_string()]);

    // Elements no longer picked keep their nodes.
    let vec_node = rose.children(rose.root())[0];
    assert_eq!(rose.children(vec_node).len(), 5);
}

#[test]
fn test_result_outcome_property() {
    let mut rose = Rose::new(ScriptedSource::new(vec![40]));
    let property = from_fn(|rose| {
        let n = rose.pick(&in_range(0u32, 100));
        if n % 2 == 0 && n > 0 {
            Err(format!("{} is even", n))
        } else {
            Ok(())
        }
    });

    assert!(rose.generate(&property).is_err());
    let result = rose.shrink(&property);

    // 40 -> 20 -> 10 -> 2 accepted (5 is odd, 1 is odd, 0 is excluded)
    assert!(result.success);
    assert_eq!(rose.example(), vec!["2".to_string()]);
}
