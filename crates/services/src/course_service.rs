use std::sync::Arc;

use course_core::catalog::initial_courses;
use course_core::model::{Course, CourseId, Module, ModuleId, Roadmap, UserId};
use storage::repository::{BookmarkRepository, SyllabusRepository};

use crate::content::{
    ADVANCED_MODULES, ContentCollaborator, SYLLABUS_MODULES, SYLLABUS_STEPS_PER_MODULE,
};
use crate::error::CourseError;

/// A catalog course picked for a learner's goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedCourse {
    pub course: Course,
    pub reason: String,
}

/// Catalog lookups, bookmarks, syllabus generation and course-level AI
/// features.
#[derive(Clone)]
pub struct CourseService {
    content: Arc<dyn ContentCollaborator>,
    syllabi: Arc<dyn SyllabusRepository>,
    bookmarks: Arc<dyn BookmarkRepository>,
    catalog: Vec<Course>,
}

impl CourseService {
    /// Service over the built-in catalog.
    #[must_use]
    pub fn new(
        content: Arc<dyn ContentCollaborator>,
        syllabi: Arc<dyn SyllabusRepository>,
        bookmarks: Arc<dyn BookmarkRepository>,
    ) -> Self {
        Self::with_catalog(content, syllabi, bookmarks, initial_courses())
    }

    #[must_use]
    pub fn with_catalog(
        content: Arc<dyn ContentCollaborator>,
        syllabi: Arc<dyn SyllabusRepository>,
        bookmarks: Arc<dyn BookmarkRepository>,
        catalog: Vec<Course>,
    ) -> Self {
        Self {
            content,
            syllabi,
            bookmarks,
            catalog,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &[Course] {
        &self.catalog
    }

    /// Case-insensitive filter over title and description. A blank query
    /// returns the whole catalog.
    #[must_use]
    pub fn search_catalog(&self, query: &str) -> Vec<&Course> {
        self.catalog
            .iter()
            .filter(|c| c.matches_query(query))
            .collect()
    }

    /// Catalog courses the learner saved, in the order they were saved.
    /// Ids no longer in the catalog are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::Storage` if the saved list cannot be read.
    pub async fn bookmarked(&self, user: &UserId) -> Result<Vec<&Course>, CourseError> {
        let saved = self.bookmarks.get_bookmarks(user).await?;
        Ok(saved
            .iter()
            .filter_map(|id| self.catalog.iter().find(|c| c.id() == id))
            .collect())
    }

    /// Saves or unsaves a catalog course. Returns whether it is now saved.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownCourse` for an id outside the catalog, or
    /// `CourseError::Storage` if the list cannot be read or written.
    pub async fn toggle_bookmark(&self, user: &UserId, course: &CourseId) -> Result<bool, CourseError> {
        if !self.catalog.iter().any(|c| c.id() == course) {
            return Err(CourseError::UnknownCourse(course.to_string()));
        }
        let mut saved = self.bookmarks.get_bookmarks(user).await?;
        let now_saved = if let Some(pos) = saved.iter().position(|id| id == course) {
            saved.remove(pos);
            false
        } else {
            saved.push(course.clone());
            true
        };
        self.bookmarks.save_bookmarks(user, &saved).await?;
        tracing::debug!(%user, %course, saved = now_saved, "bookmark toggled");
        Ok(now_saved)
    }

    /// A catalog course with its syllabus loaded.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownCourse` for an id outside the catalog.
    pub async fn load_course(&self, id: &CourseId) -> Result<Course, CourseError> {
        let mut course = self
            .catalog
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or_else(|| CourseError::UnknownCourse(id.to_string()))?;
        let modules = self.load_syllabus(&course).await;
        course.set_modules(modules);
        Ok(course)
    }

    /// Stored syllabus, or a freshly generated one that is then stored.
    ///
    /// Falls back to the course's built-in modules when generation fails.
    pub async fn load_syllabus(&self, course: &Course) -> Vec<Module> {
        match self.syllabi.get_syllabus(course.id()).await {
            Ok(Some(modules)) if !modules.is_empty() => return modules,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(course = %course.id(), error = %err, "syllabus read failed");
            }
        }

        let generated = self
            .content
            .course_outline(course.title(), SYLLABUS_MODULES, SYLLABUS_STEPS_PER_MODULE)
            .await
            .map_err(|e| e.to_string())
            .and_then(|outline| outline.into_modules().map_err(|e| e.to_string()));

        match generated {
            Ok(modules) => {
                tracing::info!(course = %course.id(), modules = modules.len(), "syllabus generated");
                self.save_syllabus(course.id(), &modules).await;
                modules
            }
            Err(reason) => {
                tracing::warn!(course = %course.id(), %reason, "syllabus generation failed; using built-in modules");
                course.modules().to_vec()
            }
        }
    }

    /// One-sentence pitch, or the course description when unavailable.
    pub async fn summary(&self, course: &Course) -> String {
        match self
            .content
            .summarize_course(course.title(), course.description())
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(course = %course.id(), error = %err, "course summary unavailable");
                course.description().to_owned()
            }
        }
    }

    /// Best catalog match for a goal. `None` when nothing usable came back.
    pub async fn recommend(&self, goal: &str) -> Option<RecommendedCourse> {
        let titles: Vec<String> = self.catalog.iter().map(|c| c.title().to_owned()).collect();
        let recommendation = match self.content.recommend_course(goal, &titles).await {
            Ok(rec) => rec,
            Err(err) => {
                tracing::warn!(error = %err, "course recommendation unavailable");
                return None;
            }
        };
        let wanted = recommendation.course_title.trim().to_lowercase();
        let course = self
            .catalog
            .iter()
            .find(|c| c.title().to_lowercase() == wanted)?;
        Some(RecommendedCourse {
            course: course.clone(),
            reason: recommendation.reason,
        })
    }

    /// # Errors
    ///
    /// Returns `CourseError::Content` when the roadmap cannot be generated.
    pub async fn roadmap(&self, goal: &str) -> Result<Roadmap, CourseError> {
        Ok(self.content.career_roadmap(goal).await?)
    }

    /// A remedial module for a struggling learner. Generation failure yields
    /// an empty "Remedial Help" module.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::Module` if even the fallback module is invalid.
    pub async fn remedial_module(&self, topic: &str) -> Result<Module, CourseError> {
        let generated = self
            .content
            .remedial_module(topic)
            .await
            .map_err(|e| e.to_string())
            .and_then(|outline| outline.into_remedial_module().map_err(|e| e.to_string()));
        match generated {
            Ok(module) => Ok(module),
            Err(reason) => {
                tracing::warn!(%topic, %reason, "remedial module unavailable");
                let id = ModuleId::new(format!("remedial-{}", uuid::Uuid::new_v4()));
                Ok(Module::new(id, "Remedial Help", topic, Vec::new())?.into_remedial())
            }
        }
    }

    /// Extension modules for a finished course; empty when unavailable.
    pub async fn advanced_modules(&self, course: &Course) -> Vec<Module> {
        let generated = self
            .content
            .advanced_modules(course.title(), ADVANCED_MODULES)
            .await
            .map_err(|e| e.to_string())
            .and_then(|outline| outline.into_advanced_modules().map_err(|e| e.to_string()));
        generated.unwrap_or_else(|reason| {
            tracing::warn!(course = %course.id(), %reason, "advanced modules unavailable");
            Vec::new()
        })
    }

    /// Appends advanced modules to a finished course and stores the result.
    /// Returns how many were added.
    pub async fn extend_finished_course(&self, course: &mut Course) -> usize {
        if !course.is_finished() {
            return 0;
        }
        let extra = self.advanced_modules(course).await;
        if extra.is_empty() {
            return 0;
        }
        let added = extra.len();
        let mut modules = course.modules().to_vec();
        modules.extend(extra);
        course.set_modules(modules);
        self.save_syllabus(course.id(), course.modules()).await;
        added
    }

    /// Swaps a finished module into its course and stores the syllabus.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownModule` if the course has no such module.
    pub async fn apply_finished_module(
        &self,
        course: &mut Course,
        module: Module,
    ) -> Result<(), CourseError> {
        let id = module.id().clone();
        if !course.replace_module(module) {
            return Err(CourseError::UnknownModule(id.to_string()));
        }
        self.save_syllabus(course.id(), course.modules()).await;
        Ok(())
    }

    #[must_use]
    pub fn course_progress_percent(&self, course: &Course) -> u8 {
        course.progress_percent()
    }

    async fn save_syllabus(&self, course: &CourseId, modules: &[Module]) {
        if let Err(err) = self.syllabi.save_syllabus(course, modules).await {
            tracing::warn!(%course, error = %err, "syllabus write failed");
        }
    }
}
