//! Built-in course catalog shipped with the app.

use crate::model::{Course, CourseId, Module, ModuleId, Review, Step, StepId};

fn step(id: &str, title: &str, order: u32) -> Step {
    Step::new(StepId::new(id), title, order)
}

fn module(id: &str, title: &str, description: &str, steps: Vec<Step>) -> Module {
    Module::new(ModuleId::new(id), title, description, steps)
        .expect("catalog modules should be well-formed")
}

/// Courses available before any syllabus is generated.
///
/// # Panics
///
/// Panics if the embedded catalog data violates a model invariant.
#[must_use]
pub fn initial_courses() -> Vec<Course> {
    let web = Course::new(
        CourseId::new("c1"),
        "Professional Web Development",
        "Go from zero to world-class engineer. Mastery focused.",
        "Tech",
        "12 weeks",
    )
    .expect("catalog course should be well-formed")
    .with_modules(vec![
        module(
            "m1",
            "The Anatomy of the Web",
            "Understanding how information moves across the world.",
            vec![
                step("s1", "The Request/Response Cycle", 1),
                step("s2", "HTML: The Skeleton", 2),
                step("s3", "CSS: The Visual Layer", 3),
                step("s4", "Interactivity with JS", 4),
            ],
        ),
        module(
            "m2",
            "Advanced Frontend Architectures",
            "Building scalable user interfaces with modern patterns.",
            vec![
                step("s5", "Component Composition", 1),
                step("s6", "State Management Mastery", 2),
            ],
        ),
    ])
    .with_reviews(vec![
        Review::new(
            "r1",
            "MasterDev",
            5,
            "The step-by-step approach is unbeatable.",
            "2024-04-01",
        )
        .expect("catalog review should be well-formed"),
    ]);

    let ux = Course::new(
        CourseId::new("c2"),
        "UI/UX Masterclass",
        "Learn the psychology and principles of elite product design.",
        "Design",
        "8 weeks",
    )
    .expect("catalog course should be well-formed")
    .with_modules(vec![module(
        "m1_ux",
        "Design Psychology",
        "Why we click what we click.",
        vec![
            step("s1_ux", "Gestalt Principles", 1),
            step("s2_ux", "Color Theory & Emotion", 2),
        ],
    )]);

    vec![web, ux]
}

/// Looks a catalog course up by id.
#[must_use]
pub fn find_course(id: &CourseId) -> Option<Course> {
    initial_courses().into_iter().find(|c| c.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_builds() {
        let courses = initial_courses();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].modules()[0].step_count(), 4);
    }

    #[test]
    fn find_course_by_id() {
        let course = find_course(&CourseId::new("c2")).unwrap();
        assert_eq!(course.title(), "UI/UX Masterclass");
        assert!(find_course(&CourseId::new("nope")).is_none());
    }
}
