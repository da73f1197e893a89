use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ModuleId, StepId};
use crate::model::step::Step;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("step order {order} does not follow {previous}")]
    NonIncreasingOrder { previous: u32, order: u32 },

    #[error("duplicate step id: {0}")]
    DuplicateStepId(StepId),
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered group of steps inside a course.
///
/// A module exclusively owns its steps. Construction checks that step orders
/// are strictly increasing (and therefore unique) and that step ids are unique,
/// so every index-based operation below can rely on that ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ModuleRepr", into = "ModuleRepr")]
pub struct Module {
    id: ModuleId,
    title: String,
    description: String,
    is_completed: bool,
    is_remedial: bool,
    steps: Vec<Step>,
}

impl Module {
    /// Creates a module from already-ordered steps.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` for a blank title,
    /// `ModuleError::NonIncreasingOrder` when step orders are not strictly
    /// increasing, and `ModuleError::DuplicateStepId` on repeated step ids.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        validate_steps(&steps)?;
        Ok(Self {
            id,
            title,
            description: description.into(),
            is_completed: false,
            is_remedial: false,
            steps,
        })
    }

    /// Marks this module as remedial material generated after a failed checkpoint.
    #[must_use]
    pub fn into_remedial(mut self) -> Self {
        self.is_remedial = true;
        self
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn is_remedial(&self) -> bool {
        self.is_remedial
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn contains_step(&self, id: &StepId) -> bool {
        self.steps.iter().any(|s| &s.id == id)
    }

    /// Ids of every step currently flagged as completed.
    #[must_use]
    pub fn completed_step_ids(&self) -> BTreeSet<StepId> {
        self.steps
            .iter()
            .filter(|s| s.is_completed())
            .map(|s| s.id.clone())
            .collect()
    }

    /// Flags the step at `index` as completed. Returns `false` for an
    /// out-of-range index.
    pub fn mark_step_completed(&mut self, index: usize) -> bool {
        match self.steps.get_mut(index) {
            Some(step) => {
                step.set_completed(true);
                true
            }
            None => false,
        }
    }

    /// Sets the completion flag of every step from a persisted id set.
    ///
    /// Ids that do not belong to this module are ignored.
    pub fn apply_completed(&mut self, completed: &BTreeSet<StepId>) {
        for step in &mut self.steps {
            step.set_completed(completed.contains(&step.id));
        }
    }

    /// Marks the whole module finished, including every step.
    pub fn mark_completed(&mut self) {
        for step in &mut self.steps {
            step.set_completed(true);
        }
        self.is_completed = true;
    }

    /// Titles of the steps in `start..=end`, clamped to the module bounds.
    #[must_use]
    pub fn step_titles(&self, start: usize, end: usize) -> Vec<String> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(i, _)| (start..=end).contains(i))
            .map(|(_, s)| s.title.clone())
            .collect()
    }
}

fn validate_steps(steps: &[Step]) -> Result<(), ModuleError> {
    let mut seen = HashSet::with_capacity(steps.len());
    let mut previous: Option<u32> = None;
    for step in steps {
        match previous {
            Some(prev) if step.order <= prev => {
                return Err(ModuleError::NonIncreasingOrder {
                    previous: prev,
                    order: step.order,
                });
            }
            _ => {}
        }
        if !seen.insert(&step.id) {
            return Err(ModuleError::DuplicateStepId(step.id.clone()));
        }
        previous = Some(step.order);
    }
    Ok(())
}

//
// ─── SERDE SHAPE ───────────────────────────────────────────────────────────────
//

#[derive(Serialize, Deserialize)]
struct ModuleRepr {
    id: ModuleId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    is_remedial: bool,
    #[serde(default)]
    steps: Vec<Step>,
}

impl TryFrom<ModuleRepr> for Module {
    type Error = ModuleError;

    fn try_from(repr: ModuleRepr) -> Result<Self, Self::Error> {
        let mut module = Module::new(repr.id, repr.title, repr.description, repr.steps)?;
        module.is_completed = repr.is_completed;
        module.is_remedial = repr.is_remedial;
        Ok(module)
    }
}

impl From<Module> for ModuleRepr {
    fn from(module: Module) -> Self {
        Self {
            id: module.id,
            title: module.title,
            description: module.description,
            is_completed: module.is_completed,
            is_remedial: module.is_remedial,
            steps: module.steps,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(titles: &[&str]) -> Vec<Step> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Step::new(StepId::new(format!("s{}", i + 1)), *t, (i + 1) as u32))
            .collect()
    }

    #[test]
    fn module_rejects_non_increasing_orders() {
        let mut list = steps(&["A", "B"]);
        list[1].order = 1;
        let err = Module::new(ModuleId::new("m1"), "Web", "", list).unwrap_err();
        assert_eq!(
            err,
            ModuleError::NonIncreasingOrder {
                previous: 1,
                order: 1
            }
        );
    }

    #[test]
    fn module_rejects_duplicate_step_ids() {
        let mut list = steps(&["A", "B"]);
        list[1].id = StepId::new("s1");
        let err = Module::new(ModuleId::new("m1"), "Web", "", list).unwrap_err();
        assert!(matches!(err, ModuleError::DuplicateStepId(_)));
    }

    #[test]
    fn module_rejects_blank_title() {
        let err = Module::new(ModuleId::new("m1"), "  ", "", Vec::new()).unwrap_err();
        assert_eq!(err, ModuleError::EmptyTitle);
    }

    #[test]
    fn apply_completed_ignores_foreign_ids() {
        let mut module = Module::new(ModuleId::new("m1"), "Web", "", steps(&["A", "B", "C"])).unwrap();
        let ids: BTreeSet<StepId> = ["s1", "zz"].into_iter().map(StepId::new).collect();
        module.apply_completed(&ids);

        let done = module.completed_step_ids();
        assert_eq!(done.len(), 1);
        assert!(done.contains(&StepId::new("s1")));
    }

    #[test]
    fn step_titles_clamps_to_bounds() {
        let module = Module::new(ModuleId::new("m1"), "Web", "", steps(&["A", "B", "C"])).unwrap();
        assert_eq!(module.step_titles(1, 9), vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn mark_completed_flags_every_step() {
        let mut module = Module::new(ModuleId::new("m1"), "Web", "", steps(&["A", "B"])).unwrap();
        module.mark_completed();
        assert!(module.is_completed());
        assert!(module.steps().iter().all(Step::is_completed));
    }

    #[test]
    fn deserialize_validates_orders() {
        let json = r#"{"id":"m1","title":"Web","steps":[
            {"id":"a","title":"A","order":2},
            {"id":"b","title":"B","order":1}
        ]}"#;
        assert!(serde_json::from_str::<Module>(json).is_err());
    }

    #[test]
    fn serde_keeps_remedial_flag() {
        let module = Module::new(ModuleId::new("r1"), "Review", "", steps(&["A"]))
            .unwrap()
            .into_remedial();
        let json = serde_json::to_string(&module).unwrap();
        let back: Module = serde_json::from_str(&json).unwrap();
        assert!(back.is_remedial());
        assert_eq!(back, module);
    }
}
