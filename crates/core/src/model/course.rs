use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId};
use crate::model::module::Module;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("review rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// A learner review attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub user_name: String,
    rating: u8,
    pub comment: String,
    pub date: String,
}

impl Review {
    /// # Errors
    ///
    /// Returns `CourseError::InvalidRating` when `rating` is outside `1..=5`.
    pub fn new(
        id: impl Into<String>,
        user_name: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
        date: impl Into<String>,
    ) -> Result<Self, CourseError> {
        if !(1..=5).contains(&rating) {
            return Err(CourseError::InvalidRating(rating));
        }
        Ok(Self {
            id: id.into(),
            user_name: user_name.into(),
            rating,
            comment: comment.into(),
            date: date.into(),
        })
    }

    #[must_use]
    pub fn rating(&self) -> u8 {
        self.rating
    }
}

/// A catalog course. `modules` stays empty until a syllabus is generated or loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    category: String,
    duration: String,
    #[serde(default)]
    modules: Vec<Module>,
    #[serde(default)]
    reviews: Vec<Review>,
}

impl Course {
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` for a blank title.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        duration: impl Into<String>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            category: category.into(),
            duration: duration.into(),
            modules: Vec::new(),
            reviews: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self
    }

    #[must_use]
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = reviews;
        self
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
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
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    /// Replaces the syllabus wholesale.
    pub fn set_modules(&mut self, modules: Vec<Module>) {
        self.modules = modules;
    }

    /// Replaces the module with the same id. Returns `false` when no module matched.
    pub fn replace_module(&mut self, module: Module) -> bool {
        match self.modules.iter_mut().find(|m| m.id() == module.id()) {
            Some(slot) => {
                *slot = module;
                true
            }
            None => false,
        }
    }

    /// Share of finished modules, rounded to the nearest whole percent.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        if self.modules.is_empty() {
            return 0;
        }
        let done = self.modules.iter().filter(|m| m.is_completed()).count();
        let pct = (done * 100 + self.modules.len() / 2) / self.modules.len();
        u8::try_from(pct).unwrap_or(100)
    }

    /// True once every module is complete (and at least one exists).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.modules.is_empty() && self.modules.iter().all(Module::is_completed)
    }

    /// Case-insensitive match against title and description.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Step, StepId};

    fn module(id: &str) -> Module {
        Module::new(
            ModuleId::new(id),
            format!("Module {id}"),
            "",
            vec![Step::new(StepId::new(format!("{id}-s1")), "Only", 1)],
        )
        .unwrap()
    }

    #[test]
    fn review_rating_is_bounded() {
        assert!(Review::new("r1", "Dev", 5, "ok", "2024-04-01").is_ok());
        assert_eq!(
            Review::new("r2", "Dev", 0, "bad", "2024-04-01").unwrap_err(),
            CourseError::InvalidRating(0)
        );
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        let mut finished = module("m1");
        finished.mark_completed();
        let course = Course::new(CourseId::new("c1"), "Web", "", "Tech", "1 week")
            .unwrap()
            .with_modules(vec![finished, module("m2"), module("m3")]);
        assert_eq!(course.progress_percent(), 33);
        assert!(!course.is_finished());
    }

    #[test]
    fn empty_syllabus_is_not_finished() {
        let course = Course::new(CourseId::new("c1"), "Web", "", "Tech", "1 week").unwrap();
        assert_eq!(course.progress_percent(), 0);
        assert!(!course.is_finished());
    }

    #[test]
    fn replace_module_swaps_matching_id() {
        let mut course = Course::new(CourseId::new("c1"), "Web", "", "Tech", "1 week")
            .unwrap()
            .with_modules(vec![module("m1")]);
        let mut done = module("m1");
        done.mark_completed();
        assert!(course.replace_module(done));
        assert!(course.is_finished());
        assert!(!course.replace_module(module("zz")));
    }

    #[test]
    fn query_matches_title_or_description() {
        let course =
            Course::new(CourseId::new("c2"), "UI/UX Masterclass", "elite product design", "Design", "8 weeks")
                .unwrap();
        assert!(course.matches_query("masterclass"));
        assert!(course.matches_query("PRODUCT"));
        assert!(!course.matches_query("rust"));
    }
}
