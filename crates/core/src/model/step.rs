use serde::{Deserialize, Serialize};

use crate::model::ids::StepId;

/// Smallest orderable unit of a lesson module.
///
/// Steps are created when a syllabus is generated; afterwards the only
/// mutation is flipping the completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub title: String,
    pub order: u32,
    #[serde(default)]
    is_completed: bool,
}

impl Step {
    #[must_use]
    pub fn new(id: StepId, title: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            title: title.into(),
            order,
            is_completed: false,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_step_starts_incomplete() {
        let step = Step::new(StepId::new("s1"), "HTML: The Skeleton", 2);
        assert!(!step.is_completed());
        assert_eq!(step.order, 2);
    }

    #[test]
    fn missing_completion_flag_defaults_to_false() {
        let step: Step =
            serde_json::from_str(r#"{"id":"s9","title":"Intro","order":1}"#).unwrap();
        assert!(!step.is_completed());
        assert_eq!(step.id, StepId::new("s9"));
    }
}
