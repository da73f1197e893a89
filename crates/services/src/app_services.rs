use std::sync::Arc;

use storage::repository::Storage;

use crate::content::{ContentCollaborator, GenerativeClient};
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::lessons::LessonEngine;
use crate::tutor_service::TutorService;
use crate::Clock;

/// Assembles app-facing services over one storage backend and one content
/// collaborator.
#[derive(Clone)]
pub struct AppServices {
    content_enabled: bool,
    lessons: Arc<LessonEngine>,
    courses: Arc<CourseService>,
    tutor: Arc<TutorService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the env-configured client.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let client = GenerativeClient::from_env();
        let content_enabled = client.enabled();
        if !content_enabled {
            tracing::warn!("LEARN_AI_API_KEY not set; generated content is disabled");
        }
        Ok(Self::with_storage(storage, Arc::new(client), clock).with_content_enabled(content_enabled))
    }

    /// Build services from already constructed collaborators.
    #[must_use]
    pub fn with_storage(
        storage: Storage,
        content: Arc<dyn ContentCollaborator>,
        clock: Clock,
    ) -> Self {
        let lessons = Arc::new(LessonEngine::new(
            clock,
            Arc::clone(&content),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
        ));
        let courses = Arc::new(CourseService::new(
            Arc::clone(&content),
            Arc::clone(&storage.syllabi),
            Arc::clone(&storage.bookmarks),
        ));
        let tutor = Arc::new(TutorService::new(content));

        Self {
            content_enabled: true,
            lessons,
            courses,
            tutor,
        }
    }

    #[must_use]
    fn with_content_enabled(mut self, enabled: bool) -> Self {
        self.content_enabled = enabled;
        self
    }

    /// False when no generative service is configured and every lesson will
    /// run on cached or placeholder content.
    #[must_use]
    pub fn content_enabled(&self) -> bool {
        self.content_enabled
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonEngine> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorService> {
        Arc::clone(&self.tutor)
    }
}
