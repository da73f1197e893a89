use serde::{Deserialize, Serialize};

/// One stage of a career roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_titles: Vec<String>,
}

/// Ordered multi-course plan toward a career goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roadmap {
    pub goal: String,
    pub milestones: Vec<Milestone>,
}

impl Roadmap {
    /// Every course title mentioned, first occurrence order, without repeats.
    #[must_use]
    pub fn course_titles(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for title in self.milestones.iter().flat_map(|m| &m.course_titles) {
            if !seen.contains(&title.as_str()) {
                seen.push(title.as_str());
            }
        }
        seen
    }
}

/// A single course suggested for a free-text goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    pub course_title: String,
    #[serde(default)]
    pub reason: String,
}

/// Speaker of a tutoring chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Learner,
    Tutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn learner(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Learner,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn tutor(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tutor,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roadmap_course_titles_are_deduplicated() {
        let roadmap = Roadmap {
            goal: "Frontend engineer".into(),
            milestones: vec![
                Milestone {
                    title: "Foundations".into(),
                    description: String::new(),
                    course_titles: vec!["Web Dev".into(), "UI/UX".into()],
                },
                Milestone {
                    title: "Depth".into(),
                    description: String::new(),
                    course_titles: vec!["Web Dev".into(), "Accessibility".into()],
                },
            ],
        };
        assert_eq!(roadmap.course_titles(), vec!["Web Dev", "UI/UX", "Accessibility"]);
    }
}
