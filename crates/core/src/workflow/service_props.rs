//! Property-based tests for workflow authorization.

use proptest::prelude::*;

use crate::test_support::registry;
use crate::workflow::types::{Parties, STATE_VALIDATED};

/// Strategy for state names, declared or not.
fn arb_state() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(STATE_VALIDATED.to_string()),
        Just("pending".to_string()),
        Just("completed".to_string()),
        Just("erased".to_string()),
        "[a-z]{1,12}",
    ]
}

/// Strategy for actors, parties or strangers.
fn arb_actor() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("alice".to_string()),
        Just("bob".to_string()),
        Just("admin".to_string()),
        "[a-z]{1,8}",
    ]
}

fn arb_workflow_id() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("bill"), Just("credit"), Just("3rdparty")]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A transition missing from the graph fails for every actor, override or not.
    #[test]
    fn prop_undeclared_transition_always_fails(
        id in arb_workflow_id(),
        from in arb_state(),
        to in arb_state(),
        actor in arb_actor(),
        admin_override in any::<bool>(),
    ) {
        let registry = registry();
        let workflow = registry.get(id).unwrap();
        prop_assume!(workflow.signatories(&from, &to).is_none());

        let parties = Parties { state: &from, author: "alice", payee: "alice", payer: "bob" };
        prop_assert!(!workflow.can_transition_to_state(&parties, &actor, &to, admin_override));

        let err = workflow.authorize(&parties, &actor, &to, admin_override).unwrap_err();
        prop_assert_eq!(err.class(), "WorkflowViolation");
    }

    /// The admin override never narrows what an actor may do.
    #[test]
    fn prop_override_is_superset(
        id in arb_workflow_id(),
        from in arb_state(),
        to in arb_state(),
        actor in arb_actor(),
    ) {
        let registry = registry();
        let workflow = registry.get(id).unwrap();
        let parties = Parties { state: &from, author: "alice", payee: "alice", payer: "bob" };
        if workflow.can_transition_to_state(&parties, &actor, &to, false) {
            prop_assert!(workflow.can_transition_to_state(&parties, &actor, &to, true));
        }
    }
}
