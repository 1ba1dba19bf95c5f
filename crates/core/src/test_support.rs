//! Fixtures shared by unit tests across modules.

use crate::workflow::{Workflow, WorkflowRegistry};

pub(crate) const WORKFLOWS: &str = r#"[
  {"id": "bill", "label": "Request payment", "direction": "bill",
   "creation": {"state": "pending", "confirm": true},
   "states": {
     "pending": {"completed": {"signatories": ["payer", "admin"]},
                 "erased": {"signatories": ["payee", "payer", "admin"]}},
     "completed": {"erased": {"signatories": ["admin"]}},
     "erased": {}}},
  {"id": "credit", "label": "Pay", "direction": "credit",
   "creation": {"state": "completed", "confirm": true},
   "states": {
     "completed": {"erased": {"signatories": ["admin"]}},
     "erased": {}}},
  {"id": "3rdparty", "label": "Admin entry", "direction": "3rdparty",
   "creation": {"state": "completed", "confirm": false},
   "states": {
     "completed": {"erased": {"signatories": ["admin"]}},
     "erased": {}}},
  {"id": "dormant", "label": "Retired", "active": false, "direction": "3rdparty",
   "creation": {"state": "completed", "confirm": false},
   "states": {"completed": {}}}
]"#;

pub(crate) fn registry() -> WorkflowRegistry {
    WorkflowRegistry::from_json(WORKFLOWS).unwrap()
}

pub(crate) fn bill() -> Workflow {
    registry().get("bill").unwrap().clone()
}
