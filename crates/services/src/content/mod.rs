//! Content Collaborator: the generative service that writes lessons,
//! quizzes, remedial prose, syllabi and tutor replies.

mod client;
mod prompts;

use async_trait::async_trait;
use course_core::model::{
    AudioClip, ChatTurn, CourseOutline, CourseRecommendation, ModuleOutline, Quiz, Roadmap,
    VideoRef,
};

use crate::error::ContentError;

pub use client::{ContentConfig, GenerativeClient};

/// Number of questions requested for a checkpoint quiz.
pub const QUIZ_QUESTIONS: usize = 3;

/// Syllabus shape requested for a freshly generated course.
pub const SYLLABUS_MODULES: usize = 5;
pub const SYLLABUS_STEPS_PER_MODULE: usize = 3;

/// Extension modules requested once a course is finished.
pub const ADVANCED_MODULES: usize = 2;

/// Asynchronous source of generated course content.
///
/// Implementations validate structured responses before returning them, so
/// a `Quiz` or outline handed back here is well-formed.
#[async_trait]
pub trait ContentCollaborator: Send + Sync {
    /// Conversational lesson prose for one step.
    async fn step_lesson(
        &self,
        course_title: &str,
        module_title: &str,
        step_title: &str,
    ) -> Result<String, ContentError>;

    /// Mastery quiz over the given step titles.
    async fn checkpoint_quiz(
        &self,
        course_title: &str,
        step_titles: &[String],
    ) -> Result<Quiz, ContentError>;

    /// Re-explanation of material the learner failed a checkpoint on.
    async fn remedial_text(
        &self,
        course_title: &str,
        step_titles: &[String],
    ) -> Result<String, ContentError>;

    async fn find_video(&self, query: &str) -> Result<VideoRef, ContentError>;

    async fn synthesize_audio(&self, text: &str) -> Result<AudioClip, ContentError>;

    async fn summarize_course(&self, title: &str, description: &str)
    -> Result<String, ContentError>;

    /// Picks one of `catalog_titles` for a free-text goal.
    async fn recommend_course(
        &self,
        goal: &str,
        catalog_titles: &[String],
    ) -> Result<CourseRecommendation, ContentError>;

    async fn career_roadmap(&self, goal: &str) -> Result<Roadmap, ContentError>;

    async fn course_outline(
        &self,
        course_title: &str,
        modules: usize,
        steps_per_module: usize,
    ) -> Result<CourseOutline, ContentError>;

    async fn remedial_module(&self, topic: &str) -> Result<ModuleOutline, ContentError>;

    async fn advanced_modules(
        &self,
        course_title: &str,
        count: usize,
    ) -> Result<CourseOutline, ContentError>;

    /// Tutor reply given the prior conversation and a new learner message.
    async fn tutor_reply(&self, history: &[ChatTurn], message: &str)
    -> Result<String, ContentError>;
}
