use async_trait::async_trait;
use course_core::model::{CachedLessonContent, CourseId, Module, ModuleId, ProgressRecord, StepId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Deterministic composite keys, one format per namespace.
pub mod keys {
    use super::{CourseId, ModuleId, StepId, UserId};

    /// Cached lesson content for one step of one course.
    #[must_use]
    pub fn lesson(course: &CourseId, step: &StepId) -> String {
        format!("lesson_v3_{course}_{step}")
    }

    /// Resumable progress of one learner in one module.
    #[must_use]
    pub fn progress(user: &UserId, course: &CourseId, module: &ModuleId) -> String {
        format!("{user}_{course}_{module}")
    }

    /// Generated syllabus of a course.
    #[must_use]
    pub fn syllabus(course: &CourseId) -> String {
        course.to_string()
    }

    /// Saved courses of one learner.
    #[must_use]
    pub fn bookmarks(user: &UserId) -> String {
        format!("bookmarks_{user}")
    }
}

/// Offline cache of generated lesson content.
///
/// Entries are write-once: a second `put_lesson` for the same key keeps the
/// first value.
#[async_trait]
pub trait LessonCacheRepository: Send + Sync {
    /// Fetch cached content for a step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_lesson(
        &self,
        course: &CourseId,
        step: &StepId,
    ) -> Result<Option<CachedLessonContent>, StorageError>;

    /// Cache content for a step unless an entry already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn put_lesson(
        &self,
        course: &CourseId,
        step: &StepId,
        content: &CachedLessonContent,
    ) -> Result<(), StorageError>;
}

/// Per-user, per-module progress records. Last write wins.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the record is corrupt.
    async fn get_progress(
        &self,
        user: &UserId,
        course: &CourseId,
        module: &ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Overwrite the record for `(user, course, module)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn save_progress(
        &self,
        user: &UserId,
        course: &CourseId,
        module: &ModuleId,
        record: &ProgressRecord,
    ) -> Result<(), StorageError>;
}

/// Generated course syllabi. Last write wins.
#[async_trait]
pub trait SyllabusRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the syllabus is corrupt.
    async fn get_syllabus(&self, course: &CourseId) -> Result<Option<Vec<Module>>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn save_syllabus(&self, course: &CourseId, modules: &[Module]) -> Result<(), StorageError>;
}

/// Courses a learner saved for later, in the order they were saved.
/// Last write wins.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Saved course ids; empty when the learner has none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the list is corrupt.
    async fn get_bookmarks(&self, user: &UserId) -> Result<Vec<CourseId>, StorageError>;

    /// Replace the learner's saved list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn save_bookmarks(&self, user: &UserId, courses: &[CourseId]) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<HashMap<String, CachedLessonContent>>>,
    progress: Arc<Mutex<HashMap<String, ProgressRecord>>>,
    syllabi: Arc<Mutex<HashMap<String, Vec<Module>>>>,
    bookmarks: Arc<Mutex<HashMap<String, Vec<CourseId>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl LessonCacheRepository for InMemoryRepository {
    async fn get_lesson(
        &self,
        course: &CourseId,
        step: &StepId,
    ) -> Result<Option<CachedLessonContent>, StorageError> {
        let guard = self.lessons.lock().map_err(poisoned)?;
        Ok(guard.get(&keys::lesson(course, step)).cloned())
    }

    async fn put_lesson(
        &self,
        course: &CourseId,
        step: &StepId,
        content: &CachedLessonContent,
    ) -> Result<(), StorageError> {
        let mut guard = self.lessons.lock().map_err(poisoned)?;
        guard
            .entry(keys::lesson(course, step))
            .or_insert_with(|| content.clone());
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user: &UserId,
        course: &CourseId,
        module: &ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(&keys::progress(user, course, module)).cloned())
    }

    async fn save_progress(
        &self,
        user: &UserId,
        course: &CourseId,
        module: &ModuleId,
        record: &ProgressRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.insert(keys::progress(user, course, module), record.clone());
        Ok(())
    }
}

#[async_trait]
impl SyllabusRepository for InMemoryRepository {
    async fn get_syllabus(&self, course: &CourseId) -> Result<Option<Vec<Module>>, StorageError> {
        let guard = self.syllabi.lock().map_err(poisoned)?;
        Ok(guard.get(&keys::syllabus(course)).cloned())
    }

    async fn save_syllabus(&self, course: &CourseId, modules: &[Module]) -> Result<(), StorageError> {
        let mut guard = self.syllabi.lock().map_err(poisoned)?;
        guard.insert(keys::syllabus(course), modules.to_vec());
        Ok(())
    }
}

#[async_trait]
impl BookmarkRepository for InMemoryRepository {
    async fn get_bookmarks(&self, user: &UserId) -> Result<Vec<CourseId>, StorageError> {
        let guard = self.bookmarks.lock().map_err(poisoned)?;
        Ok(guard.get(&keys::bookmarks(user)).cloned().unwrap_or_default())
    }

    async fn save_bookmarks(&self, user: &UserId, courses: &[CourseId]) -> Result<(), StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        guard.insert(keys::bookmarks(user), courses.to_vec());
        Ok(())
    }
}

/// Aggregates the namespaces behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonCacheRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub syllabi: Arc<dyn SyllabusRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lessons: Arc<dyn LessonCacheRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let syllabi: Arc<dyn SyllabusRepository> = Arc::new(repo.clone());
        let bookmarks: Arc<dyn BookmarkRepository> = Arc::new(repo);
        Self {
            lessons,
            progress,
            syllabi,
            bookmarks,
        }
    }
}
