use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::{ModuleId, StepId};
use crate::model::module::{Module, ModuleError};
use crate::model::step::Step;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutlineError {
    #[error("outline contains no modules")]
    NoModules,

    #[error("module {index} has no title")]
    EmptyModuleTitle { index: usize },

    #[error("module {module} step {step} has no title")]
    EmptyStepTitle { module: usize, step: usize },

    #[error(transparent)]
    Module(#[from] ModuleError),
}

/// Generated title of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutline {
    pub title: String,
}

/// Generated shape of one module, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<StepOutline>,
}

impl ModuleOutline {
    fn validate(&self, index: usize) -> Result<(), OutlineError> {
        if self.title.trim().is_empty() {
            return Err(OutlineError::EmptyModuleTitle { index });
        }
        if let Some(step) = self.steps.iter().position(|s| s.title.trim().is_empty()) {
            return Err(OutlineError::EmptyStepTitle {
                module: index,
                step,
            });
        }
        Ok(())
    }

    /// Checks titles without assigning ids.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError` when a title is blank.
    pub fn validated(self) -> Result<Self, OutlineError> {
        self.validate(0)?;
        Ok(self)
    }

    /// Assigns ids and 1-based orders. Step ids are `{step_prefix}{j}`.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError` when a title is blank.
    pub fn into_module(self, id: ModuleId, step_prefix: &str) -> Result<Module, OutlineError> {
        self.validate(0)?;
        let steps = self
            .steps
            .into_iter()
            .enumerate()
            .map(|(j, s)| Step::new(StepId::new(format!("{step_prefix}{j}")), s.title, order_for(j)))
            .collect();
        Ok(Module::new(id, self.title, self.description, steps)?)
    }

    /// Materializes a remedial module with a fresh `remedial-{batch}` id.
    /// Step ids `rs-{batch}-{j}` never repeat across remedial modules.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError` when a title is blank.
    pub fn into_remedial_module(self) -> Result<Module, OutlineError> {
        let batch = Uuid::new_v4().simple().to_string();
        let id = ModuleId::new(format!("remedial-{batch}"));
        Ok(self.into_module(id, &format!("rs-{batch}-"))?.into_remedial())
    }
}

/// A generated syllabus: modules with step titles only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseOutline {
    #[serde(default)]
    pub modules: Vec<ModuleOutline>,
}

impl CourseOutline {
    /// # Errors
    ///
    /// Returns `OutlineError::NoModules` for an empty outline, or the first blank title.
    pub fn validate(&self) -> Result<(), OutlineError> {
        if self.modules.is_empty() {
            return Err(OutlineError::NoModules);
        }
        for (index, module) in self.modules.iter().enumerate() {
            module.validate(index)?;
        }
        Ok(())
    }

    /// Course syllabus ids: modules `m-{i}`, steps `s-{i}-{j}`.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError` when validation fails.
    pub fn into_modules(self) -> Result<Vec<Module>, OutlineError> {
        self.validate()?;
        self.modules
            .into_iter()
            .enumerate()
            .map(|(i, m)| m.into_module(ModuleId::new(format!("m-{i}")), &format!("s-{i}-")))
            .collect()
    }

    /// Extension modules appended after a finished course: modules
    /// `adv-{i}-{batch}`, steps `adv-s-{i}-{batch}-{j}`.
    ///
    /// A course can be extended repeatedly, and cached lessons are keyed by
    /// step id, so every batch gets its own step ids.
    ///
    /// # Errors
    ///
    /// Returns `OutlineError` when validation fails.
    pub fn into_advanced_modules(self) -> Result<Vec<Module>, OutlineError> {
        self.validate()?;
        let batch = Uuid::new_v4().simple().to_string();
        self.modules
            .into_iter()
            .enumerate()
            .map(|(i, m)| {
                m.into_module(
                    ModuleId::new(format!("adv-{i}-{batch}")),
                    &format!("adv-s-{i}-{batch}-"),
                )
            })
            .collect()
    }
}

fn order_for(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline() -> CourseOutline {
        serde_json::from_str(
            r#"{"modules":[
                {"title":"Basics","description":"Start here","steps":[{"title":"A"},{"title":"B"},{"title":"C"}]},
                {"title":"Next","steps":[{"title":"D"}]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn course_outline_assigns_ids_and_orders() {
        let modules = outline().into_modules().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].id(), &ModuleId::new("m-0"));
        let ids: Vec<_> = modules[0].steps().iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["s-0-0", "s-0-1", "s-0-2"]);
        let orders: Vec<_> = modules[0].steps().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(modules[1].description(), "");
    }

    #[test]
    fn empty_outline_is_rejected() {
        assert_eq!(
            CourseOutline::default().into_modules().unwrap_err(),
            OutlineError::NoModules
        );
    }

    #[test]
    fn blank_step_title_is_rejected() {
        let mut o = outline();
        o.modules[1].steps[0].title = " ".into();
        assert_eq!(
            o.validate().unwrap_err(),
            OutlineError::EmptyStepTitle { module: 1, step: 0 }
        );
    }

    #[test]
    fn remedial_module_is_flagged() {
        let module = outline().modules.remove(0).into_remedial_module().unwrap();
        assert!(module.is_remedial());
        assert!(module.id().as_str().starts_with("remedial-"));
        let batch = module.id().as_str().trim_start_matches("remedial-");
        assert_eq!(module.steps()[0].id, StepId::new(format!("rs-{batch}-0")));
    }

    #[test]
    fn advanced_modules_share_a_batch_suffix() {
        let modules = outline().into_advanced_modules().unwrap();
        let suffix0 = modules[0].id().as_str().trim_start_matches("adv-0-").to_owned();
        let suffix1 = modules[1].id().as_str().trim_start_matches("adv-1-").to_owned();
        assert_eq!(suffix0, suffix1);
        assert_eq!(
            modules[1].steps()[0].id,
            StepId::new(format!("adv-s-1-{suffix1}-0"))
        );
    }

    #[test]
    fn repeated_batches_never_reuse_step_ids() {
        let first = outline().into_advanced_modules().unwrap();
        let second = outline().into_advanced_modules().unwrap();
        let first_ids: std::collections::BTreeSet<_> = first
            .iter()
            .flat_map(|m| m.steps().iter().map(|s| s.id.clone()))
            .collect();
        assert!(
            second
                .iter()
                .flat_map(Module::steps)
                .all(|s| !first_ids.contains(&s.id))
        );

        let a = outline().modules.remove(0).into_remedial_module().unwrap();
        let b = outline().modules.remove(0).into_remedial_module().unwrap();
        assert_ne!(a.steps()[0].id, b.steps()[0].id);
    }
}
