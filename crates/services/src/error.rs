//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{ModuleError, QuizError};
use course_core::progression::ProgressionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `ContentCollaborator`.
///
/// Every variant means the requested content is unavailable; callers degrade
/// instead of surfacing these to the learner.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content generation is not configured")]
    Disabled,
    #[error("content generation returned an empty response")]
    EmptyResponse,
    #[error("content request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed content response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors emitted by `LessonEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonError {
    #[error("module has no steps")]
    EmptyModule,
    #[error(transparent)]
    Validation(#[from] QuizError),
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error("step result belongs to a superseded load")]
    StaleTicket,
}

impl From<ProgressionError> for LessonError {
    fn from(err: ProgressionError) -> Self {
        match err {
            ProgressionError::EmptyModule => Self::EmptyModule,
        }
    }
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseError {
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("unknown module: {0}")]
    UnknownModule(String),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
