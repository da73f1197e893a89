use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::StepId;
use crate::model::module::Module;

/// Resumable position of one learner inside one module.
///
/// Keyed externally by `(user, course, module)`. Every advance overwrites the
/// whole record; nothing is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub current_step_index: usize,
    #[serde(default)]
    pub completed_step_ids: BTreeSet<StepId>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        current_step_index: usize,
        completed_step_ids: BTreeSet<StepId>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            current_step_index,
            completed_step_ids,
            updated_at,
        }
    }

    /// Snapshot of a module's completion flags at the given position.
    #[must_use]
    pub fn snapshot(module: &Module, current_step_index: usize, at: DateTime<Utc>) -> Self {
        Self::new(current_step_index, module.completed_step_ids(), at)
    }

    /// Returns a copy trimmed to the given module.
    ///
    /// Unknown step ids are dropped and the index is clamped to the last step,
    /// so a stale record written against an older syllabus can still be
    /// resumed. Returns `None` for a module without steps.
    #[must_use]
    pub fn reconciled_with(&self, module: &Module) -> Option<Self> {
        let last = module.step_count().checked_sub(1)?;
        let completed_step_ids = self
            .completed_step_ids
            .iter()
            .filter(|id| module.contains_step(id))
            .cloned()
            .collect();
        Some(Self {
            current_step_index: self.current_step_index.min(last),
            completed_step_ids,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleId, Step};
    use crate::time::fixed_now;

    fn module() -> Module {
        let steps = (1..=3)
            .map(|i| Step::new(StepId::new(format!("s{i}")), format!("Step {i}"), i))
            .collect();
        Module::new(ModuleId::new("m1"), "Anatomy", "", steps).unwrap()
    }

    #[test]
    fn reconcile_drops_unknown_ids_and_clamps_index() {
        let ids = ["s1", "s2", "gone"].into_iter().map(StepId::new).collect();
        let record = ProgressRecord::new(7, ids, fixed_now());

        let fixed = record.reconciled_with(&module()).unwrap();
        assert_eq!(fixed.current_step_index, 2);
        assert_eq!(fixed.completed_step_ids.len(), 2);
        assert!(!fixed.completed_step_ids.contains(&StepId::new("gone")));
    }

    #[test]
    fn reconcile_with_empty_module_is_none() {
        let empty = Module::new(ModuleId::new("m0"), "Empty", "", Vec::new()).unwrap();
        let record = ProgressRecord::new(0, BTreeSet::new(), fixed_now());
        assert!(record.reconciled_with(&empty).is_none());
    }

    #[test]
    fn snapshot_collects_completed_steps() {
        let mut m = module();
        m.mark_step_completed(0);
        let record = ProgressRecord::snapshot(&m, 1, fixed_now());
        assert_eq!(record.current_step_index, 1);
        assert_eq!(
            record.completed_step_ids.into_iter().collect::<Vec<_>>(),
            vec![StepId::new("s1")]
        );
    }
}
