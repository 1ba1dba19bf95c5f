//! The set of workflows a node knows, shared read-only across requests.

use std::collections::BTreeMap;

use ccnode_shared::{CcError, CcResult};
use tracing::warn;

use crate::workflow::types::Workflow;

/// Workflows keyed by transaction type.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, Workflow>,
}

impl WorkflowRegistry {
    /// Parses and validates a workflow document.
    pub fn from_json(json: &str) -> CcResult<Self> {
        let list: Vec<Workflow> =
            serde_json::from_str(json).map_err(|e| CcError::invalid("workflows", e.to_string()))?;
        Self::from_workflows(list)
    }

    /// Validates and indexes workflows. Duplicate ids are rejected.
    pub fn from_workflows(list: Vec<Workflow>) -> CcResult<Self> {
        let mut workflows = BTreeMap::new();
        for workflow in list {
            workflow.validate()?;
            if workflows.contains_key(&workflow.id) {
                return Err(CcError::invalid(
                    "workflows",
                    format!("duplicate workflow '{}'", workflow.id),
                ));
            }
            workflows.insert(workflow.id.clone(), workflow);
        }
        Ok(Self { workflows })
    }

    /// Looks up a workflow by transaction type.
    pub fn get(&self, id: &str) -> CcResult<&Workflow> {
        self.workflows.get(id).ok_or_else(|| CcError::DoesNotExist {
            kind: "workflow".into(),
            value: id.to_string(),
        })
    }

    /// All workflows, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<&Workflow> {
        self.workflows.values().collect()
    }

    /// Adds the trunk's workflows; local definitions win on id clashes.
    ///
    /// Returns how many were added. Invalid definitions are skipped.
    pub fn merge_trunkward(&mut self, trunkward: Vec<Workflow>) -> usize {
        let mut added = 0;
        for workflow in trunkward {
            if self.workflows.contains_key(&workflow.id) {
                continue;
            }
            if let Err(e) = workflow.validate() {
                warn!(workflow = %workflow.id, error = %e, "Skipping invalid trunkward workflow");
                continue;
            }
            self.workflows.insert(workflow.id.clone(), workflow);
            added += 1;
        }
        added
    }
}
