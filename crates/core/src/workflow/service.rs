//! Workflow state machine logic.
//!
//! Authorizes transitions against the declared graph. Nothing here knows
//! about storage or relaying; callers pass in the facts about the
//! transaction and the actor.

use ccnode_shared::{CcError, CcResult};

use crate::workflow::types::{Direction, Parties, STATE_VALIDATED, Signatory, Workflow};

/// The implicit confirmation edge is signed by the author.
const CONFIRM_SIGNATORIES: &[Signatory] = &[Signatory::Author];

impl Workflow {
    /// Checks the graph is closed and the creation state exists.
    pub fn validate(&self) -> CcResult<()> {
        let invalid = |reason: String| CcError::invalid("workflow", format!("{}: {reason}", self.id));

        if self.id.trim().is_empty() {
            return Err(CcError::invalid("workflow", "id must not be empty"));
        }
        if !self.states.contains_key(&self.creation.state) {
            return Err(invalid(format!(
                "creation state '{}' is not declared",
                self.creation.state
            )));
        }
        if self.states.contains_key(STATE_VALIDATED) {
            return Err(invalid(format!("'{STATE_VALIDATED}' is reserved")));
        }
        for (from, edges) in &self.states {
            for (to, transition) in edges {
                if !self.states.contains_key(to) {
                    return Err(invalid(format!("'{from}' leads to undeclared state '{to}'")));
                }
                if transition.signatories.is_empty() {
                    return Err(invalid(format!("'{from}' -> '{to}' has no signatories")));
                }
            }
        }
        Ok(())
    }

    /// True when new transactions skip the validated holding state.
    #[must_use]
    pub fn auto_confirms(&self) -> bool {
        !self.creation.confirm
    }

    /// Roles allowed on the edge, or `None` if the edge does not exist.
    #[must_use]
    pub fn signatories(&self, from: &str, to: &str) -> Option<&[Signatory]> {
        if from == STATE_VALIDATED {
            return (to == self.creation.state).then_some(CONFIRM_SIGNATORIES);
        }
        self.states
            .get(from)?
            .get(to)
            .map(|transition| transition.signatories.as_slice())
    }

    /// Whether `actor` may move the transaction to `target`.
    ///
    /// The edge must exist. With the admin override any existing edge is
    /// allowed; otherwise the actor must hold one of the edge's roles.
    #[must_use]
    pub fn can_transition_to_state(
        &self,
        parties: &Parties<'_>,
        actor: &str,
        target: &str,
        admin_override: bool,
    ) -> bool {
        match self.signatories(parties.state, target) {
            None => false,
            Some(_) if admin_override => true,
            Some(roles) => roles.iter().any(|role| parties.holds(actor, *role)),
        }
    }

    /// Like [`Workflow::can_transition_to_state`], failing with `WorkflowViolation`.
    pub fn authorize(
        &self,
        parties: &Parties<'_>,
        actor: &str,
        target: &str,
        admin_override: bool,
    ) -> CcResult<()> {
        if self.can_transition_to_state(parties, actor, target, admin_override) {
            Ok(())
        } else {
            Err(CcError::Workflow {
                workflow: self.id.clone(),
                from: parties.state.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// States the actor could move the transaction to next.
    #[must_use]
    pub fn permitted_targets(
        &self,
        parties: &Parties<'_>,
        actor: &str,
        admin_override: bool,
    ) -> Vec<String> {
        let candidates: Vec<&String> = if parties.state == STATE_VALIDATED {
            vec![&self.creation.state]
        } else {
            self.states
                .get(parties.state)
                .map(|edges| edges.keys().collect())
                .unwrap_or_default()
        };
        candidates
            .into_iter()
            .filter(|to| self.can_transition_to_state(parties, actor, to, admin_override))
            .cloned()
            .collect()
    }

    /// Whether `caller` may start a transaction between these parties.
    #[must_use]
    pub fn may_initiate(&self, caller: &str, payee: &str, payer: &str) -> bool {
        match self.direction {
            Direction::Bill => caller == payee,
            Direction::Credit => caller == payer,
            Direction::ThirdParty => true,
        }
    }
}
