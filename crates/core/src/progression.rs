//! Pure step sequencing for a module: where the learner is, when a mastery
//! checkpoint gates the next step, and what gets persisted on each advance.
//!
//! Nothing here performs I/O; the services layer drives these transitions and
//! talks to the content and persistence collaborators.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Module, ProgressRecord, Step};

/// A checkpoint gates every third step.
pub const CHECKPOINT_INTERVAL: usize = 3;

/// Number of preceding steps (including the current one) a checkpoint covers.
pub const CHECKPOINT_WINDOW: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("module has no steps")]
    EmptyModule,
}

/// True for zero-based step indices 2, 5, 8, ...
#[must_use]
pub fn is_checkpoint(index: usize) -> bool {
    (index + 1) % CHECKPOINT_INTERVAL == 0
}

/// Inclusive index range a checkpoint at `index` quizzes over.
#[must_use]
pub fn checkpoint_window(index: usize) -> (usize, usize) {
    (index.saturating_sub(CHECKPOINT_WINDOW - 1), index)
}

/// What happened after the current step was completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to `index`; `record` should be persisted.
    Next {
        index: usize,
        record: ProgressRecord,
    },
    /// The last step was completed; the module is finished.
    Finished { record: ProgressRecord },
}

impl Advance {
    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        match self {
            Advance::Next { record, .. } | Advance::Finished { record } => record,
        }
    }
}

/// Position of a learner within a module.
///
/// The index is always a valid step index; advancing past the last step
/// finishes the module instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCursor {
    module: Module,
    index: usize,
}

impl ModuleCursor {
    /// Starts at the first step, or resumes from a saved record.
    ///
    /// A record is reconciled against the module first: foreign step ids are
    /// dropped and an out-of-range index is clamped to the last step.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::EmptyModule` for a module without steps.
    pub fn resume(
        mut module: Module,
        saved: Option<&ProgressRecord>,
    ) -> Result<Self, ProgressionError> {
        if module.is_empty() {
            return Err(ProgressionError::EmptyModule);
        }
        let index = match saved.and_then(|r| r.reconciled_with(&module)) {
            Some(record) => {
                module.apply_completed(&record.completed_step_ids);
                record.current_step_index
            }
            None => 0,
        };
        Ok(Self { module, index })
    }

    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current_step(&self) -> &Step {
        // index is kept in range by construction and by `complete_current`.
        &self.module.steps()[self.index]
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.module.step_count()
    }

    /// True when advancing from here must first pass a checkpoint quiz.
    #[must_use]
    pub fn needs_checkpoint(&self) -> bool {
        is_checkpoint(self.index) && !self.current_step().is_completed()
    }

    /// Titles covered by the checkpoint at the current position.
    #[must_use]
    pub fn checkpoint_titles(&self) -> Vec<String> {
        let (start, end) = checkpoint_window(self.index);
        self.module.step_titles(start, end)
    }

    /// Completes the current step and moves on.
    ///
    /// The returned record holds the full completion set. On the last step the
    /// index stays put and the module is flagged complete.
    pub fn complete_current(&mut self, at: DateTime<Utc>) -> Advance {
        self.module.mark_step_completed(self.index);
        if self.is_last() {
            self.module.mark_completed();
            return Advance::Finished {
                record: ProgressRecord::snapshot(&self.module, self.index, at),
            };
        }
        self.index += 1;
        Advance::Next {
            index: self.index,
            record: ProgressRecord::snapshot(&self.module, self.index, at),
        }
    }

    #[must_use]
    pub fn into_module(self) -> Module {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleId, StepId};
    use crate::time::fixed_now;
    use std::collections::BTreeSet;

    fn module(n: u32) -> Module {
        let steps = (1..=n)
            .map(|i| Step::new(StepId::new(format!("s{i}")), format!("T{i}"), i))
            .collect();
        Module::new(ModuleId::new("m1"), "Module", "", steps).unwrap()
    }

    #[test]
    fn checkpoints_fall_on_every_third_step() {
        let hits: Vec<usize> = (0..10).filter(|i| is_checkpoint(*i)).collect();
        assert_eq!(hits, vec![2, 5, 8]);
    }

    #[test]
    fn checkpoint_window_saturates_at_zero() {
        assert_eq!(checkpoint_window(2), (0, 2));
        assert_eq!(checkpoint_window(5), (3, 5));
        assert_eq!(checkpoint_window(1), (0, 1));
    }

    #[test]
    fn empty_module_cannot_start() {
        assert_eq!(
            ModuleCursor::resume(module(0), None).unwrap_err(),
            ProgressionError::EmptyModule
        );
    }

    #[test]
    fn advancing_through_two_steps_finishes() {
        let mut cursor = ModuleCursor::resume(module(2), None).unwrap();
        let first = cursor.complete_current(fixed_now());
        assert!(matches!(first, Advance::Next { index: 1, .. }));
        let second = cursor.complete_current(fixed_now());
        let Advance::Finished { record } = second else {
            panic!("expected finish");
        };
        assert_eq!(record.current_step_index, 1);
        assert_eq!(record.completed_step_ids.len(), 2);
        assert!(cursor.module().is_completed());
    }

    #[test]
    fn resume_restores_position_and_completion() {
        let ids: BTreeSet<StepId> = ["s1", "s2"].into_iter().map(StepId::new).collect();
        let record = ProgressRecord::new(2, ids, fixed_now());
        let cursor = ModuleCursor::resume(module(4), Some(&record)).unwrap();

        assert_eq!(cursor.index(), 2);
        let done: Vec<bool> = cursor.module().steps().iter().map(Step::is_completed).collect();
        assert_eq!(done, vec![true, true, false, false]);
        assert!(cursor.needs_checkpoint());
        assert_eq!(cursor.checkpoint_titles(), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn completed_checkpoint_step_needs_no_quiz() {
        let ids: BTreeSet<StepId> = ["s1", "s2", "s3"].into_iter().map(StepId::new).collect();
        let record = ProgressRecord::new(2, ids, fixed_now());
        let cursor = ModuleCursor::resume(module(3), Some(&record)).unwrap();
        assert!(!cursor.needs_checkpoint());
    }
}
