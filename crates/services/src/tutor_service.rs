use std::sync::Arc;

use course_core::model::ChatTurn;
use tokio::sync::Mutex;

use crate::content::ContentCollaborator;
use crate::error::ContentError;

/// Turns kept as context for the next reply.
pub const HISTORY_LIMIT: usize = 20;

pub const FALLBACK_REPLY: &str = "I'm processing that. One moment.";
pub const EMPTY_REPLY: &str = "I'm listening. Tell me more.";

/// Free-form tutoring chat with a bounded rolling history.
pub struct TutorService {
    content: Arc<dyn ContentCollaborator>,
    history: Mutex<Vec<ChatTurn>>,
}

impl TutorService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentCollaborator>) -> Self {
        Self {
            content,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Sends a learner message and returns the tutor's reply. Never fails;
    /// outages and empty replies produce a canned reply that is not added to
    /// the history.
    pub async fn ask(&self, message: &str) -> String {
        let context = self.history.lock().await.clone();
        let reply = match self.content.tutor_reply(&context, message).await {
            Ok(reply) => reply,
            Err(ContentError::EmptyResponse) => return EMPTY_REPLY.to_owned(),
            Err(err) => {
                tracing::warn!(error = %err, "tutor reply unavailable");
                return FALLBACK_REPLY.to_owned();
            }
        };

        let mut history = self.history.lock().await;
        history.push(ChatTurn::learner(message));
        history.push(ChatTurn::tutor(reply.clone()));
        let excess = history.len().saturating_sub(HISTORY_LIMIT);
        history.drain(..excess);
        reply
    }

    pub async fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.history.lock().await.clear();
    }
}
