use thiserror::Error;

use crate::model::{CourseError, ModuleError, OutlineError, QuizError, VideoRefError};
use crate::progression::ProgressionError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Outline(#[from] OutlineError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Video(#[from] VideoRefError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}
