mod career;
mod course;
mod ids;
mod lesson;
mod module;
mod outline;
mod progress;
mod quiz;
mod step;

pub use ids::{CourseId, ModuleId, ParseIdError, StepId, UserId};

pub use career::{ChatRole, ChatTurn, CourseRecommendation, Milestone, Roadmap};
pub use course::{Course, CourseError, Review};
pub use lesson::{
    AudioClip, CachedLessonContent, LessonContent, PLACEHOLDER_LESSON_TEXT,
    PLACEHOLDER_REMEDIAL_TEXT, PLACEHOLDER_VIDEO_URL, VideoRef, VideoRefError,
};
pub use module::{Module, ModuleError};
pub use outline::{CourseOutline, ModuleOutline, OutlineError, StepOutline};
pub use progress::ProgressRecord;
pub use quiz::{AnswerSheet, Quiz, QuizError, QuizOutcome, QuizQuestion};
pub use step::Step;
