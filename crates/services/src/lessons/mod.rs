mod engine;
mod session;

// Public API of the lesson subsystem.
pub use crate::error::LessonError;
pub use engine::{LessonEngine, StepFetch, StepRequest};
pub use session::{
    FailedFetch, LessonSession, LessonState, PresentedStep, StateKind, StepTicket,
};
