#![forbid(unsafe_code)]

pub mod app_services;
pub mod content;
pub mod course_service;
pub mod error;
pub mod lessons;
pub mod tutor_service;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use content::{ContentCollaborator, ContentConfig, GenerativeClient};
pub use course_service::CourseService;
pub use error::{AppServicesError, ContentError, CourseError, LessonError};
pub use lessons::{LessonEngine, LessonSession, LessonState, StateKind};
pub use tutor_service::TutorService;
