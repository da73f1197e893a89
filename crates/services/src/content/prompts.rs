//! Prompt text sent to the generative service.

pub(crate) const TUTOR_PERSONA: &str = "You are a personal tutor having a one-on-one conversation. \
Open with a relatable real-world question, avoid stock analogies, and guide the learner toward \
mastery by keeping complex topics conversational.";

pub(crate) const JSON_ONLY: &str = "Respond with a single JSON object and nothing else.";

pub(crate) fn step_lesson(course_title: &str, module_title: &str, step_title: &str) -> String {
    format!(
        "Write a conversational one-on-one lesson on \"{step_title}\" from the module \
         \"{module_title}\" of the course \"{course_title}\". Open with a Socratic question and \
         build toward a single insight. Keep it between 150 and 200 words."
    )
}

pub(crate) fn checkpoint_quiz(course_title: &str, step_titles: &[String], questions: usize) -> String {
    format!(
        "Write a {questions}-question multiple-choice mastery quiz for the course \
         \"{course_title}\" covering: {}. Use the shape \
         {{\"questions\":[{{\"id\":string,\"text\":string,\"options\":[string],\
         \"correct_answer_index\":integer}}]}} with zero-based answer indices.",
        step_titles.join(", ")
    )
}

pub(crate) fn remedial_text(course_title: &str, step_titles: &[String]) -> String {
    format!(
        "A learner in \"{course_title}\" missed questions on: {}. Re-explain these ideas \
         simply, from a different angle than a first lesson would, in under 200 words.",
        step_titles.join(", ")
    )
}

pub(crate) fn find_video(query: &str) -> String {
    format!(
        "Suggest the single best educational YouTube video for \"{query}\". \
         Use the shape {{\"url\":string}} with a full https URL."
    )
}

pub(crate) fn narration(text: &str) -> String {
    format!("Read this lesson cheerfully and clearly: {text}")
}

pub(crate) fn summarize_course(title: &str, description: &str) -> String {
    format!(
        "Summarize the course \"{title}\" in one short, punchy sentence. \
         Description: \"{description}\""
    )
}

pub(crate) fn recommend_course(goal: &str, catalog_titles: &[String]) -> String {
    format!(
        "A learner wants to: \"{goal}\". Choose exactly one course from this list: {}. \
         Use the shape {{\"course_title\":string,\"reason\":string}} and copy the title verbatim.",
        catalog_titles.join("; ")
    )
}

pub(crate) fn career_roadmap(goal: &str) -> String {
    format!(
        "Plan a career roadmap toward \"{goal}\" as ordered milestones. Use the shape \
         {{\"goal\":string,\"milestones\":[{{\"title\":string,\"description\":string,\
         \"course_titles\":[string]}}]}}."
    )
}

pub(crate) fn course_outline(course_title: &str, modules: usize, steps_per_module: usize) -> String {
    format!(
        "Design a {modules}-module curriculum for \"{course_title}\". Split every module into \
         exactly {steps_per_module} progressive steps. {OUTLINE_SHAPE}"
    )
}

pub(crate) fn remedial_module(topic: &str) -> String {
    format!(
        "Design a remedial module for someone struggling with \"{topic}\" with a title, a \
         description and exactly 3 learning steps. Use the shape {{\"title\":string,\
         \"description\":string,\"steps\":[{{\"title\":string}}]}}."
    )
}

pub(crate) fn advanced_modules(course_title: &str, count: usize) -> String {
    format!(
        "Design {count} advanced extension modules for learners who finished \
         \"{course_title}\". {OUTLINE_SHAPE}"
    )
}

const OUTLINE_SHAPE: &str = "Use the shape {\"modules\":[{\"title\":string,\"description\":string,\
\"steps\":[{\"title\":string}]}]}.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_prompt_lists_every_step() {
        let titles = vec!["HTML".to_owned(), "CSS".to_owned(), "JS".to_owned()];
        let prompt = checkpoint_quiz("Web", &titles, 3);
        assert!(prompt.contains("HTML, CSS, JS"));
        assert!(prompt.contains("3-question"));
    }

    #[test]
    fn outline_prompt_carries_shape() {
        let prompt = course_outline("Rust", 5, 3);
        assert!(prompt.contains("5-module"));
        assert!(prompt.contains("\"modules\""));
    }
}
