use std::sync::Arc;

use course_core::model::{
    AnswerSheet, AudioClip, CachedLessonContent, CourseId, LessonContent, Module, ProgressRecord,
    Step, UserId, VideoRef, PLACEHOLDER_LESSON_TEXT, PLACEHOLDER_REMEDIAL_TEXT,
};
use course_core::progression::{Advance, ModuleCursor};
use storage::repository::{LessonCacheRepository, ProgressRepository};

use super::session::{FailedFetch, LessonSession, LessonState, PresentedStep, StepTicket};
use crate::content::ContentCollaborator;
use crate::error::LessonError;
use crate::Clock;

/// Everything needed to fetch one step, detached from the session so the
/// fetch can run while the caller keeps ownership of it.
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub ticket: StepTicket,
    pub index: usize,
    pub course_id: CourseId,
    pub course_title: String,
    pub module_title: String,
    pub step: Step,
}

/// Result of `LessonEngine::fetch_step`, applied with `apply_step`.
#[derive(Debug, Clone)]
pub struct StepFetch {
    pub ticket: StepTicket,
    pub index: usize,
    pub step: Step,
    pub content: LessonContent,
    pub offline: bool,
    /// Set when the lesson text could not be produced.
    pub failure: Option<String>,
}

/// Drives `LessonSession`s through steps, checkpoints and remedial detours.
///
/// Content and persistence failures never abort a lesson: content degrades
/// to placeholders or a retryable `Failed` state, and failed writes are
/// logged and skipped.
#[derive(Clone)]
pub struct LessonEngine {
    clock: Clock,
    content: Arc<dyn ContentCollaborator>,
    lessons: Arc<dyn LessonCacheRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl LessonEngine {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentCollaborator>,
        lessons: Arc<dyn LessonCacheRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            content,
            lessons,
            progress,
        }
    }

    /// Opens a module for a learner, resuming saved progress, and loads the
    /// current step.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyModule` for a module without steps.
    pub async fn start(
        &self,
        module: Module,
        course_id: CourseId,
        course_title: impl Into<String>,
        user: UserId,
    ) -> Result<LessonSession, LessonError> {
        let saved = match self.progress.get_progress(&user, &course_id, module.id()).await {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(%user, course = %course_id, module = %module.id(), error = %err, "progress read failed; starting fresh");
                None
            }
        };
        let cursor = ModuleCursor::resume(module, saved.as_ref())?;
        let mut session = LessonSession::new(user, course_id, course_title.into(), cursor);
        self.load_current(&mut session).await;
        Ok(session)
    }

    /// Moves past the presented step: into a checkpoint where one is due,
    /// otherwise to the next step or to completion.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidState` unless a step is presented (or
    /// shown after a failed fetch).
    pub async fn advance(&self, session: &mut LessonSession) -> Result<(), LessonError> {
        let presented = match session.state() {
            LessonState::Presenting(step) | LessonState::Failed { step, .. } => step.clone(),
            other => return Err(invalid("advance", other)),
        };
        if session.cursor().needs_checkpoint() {
            self.load_checkpoint(session, presented).await;
        } else {
            self.complete_step(session).await;
        }
        Ok(())
    }

    /// Records one checkpoint selection.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::Validation` for a question or option that does
    /// not exist and `LessonError::InvalidState` outside a checkpoint.
    pub fn select_answer(
        &self,
        session: &mut LessonSession,
        question: usize,
        option: usize,
    ) -> Result<(), LessonError> {
        match session.state_mut() {
            LessonState::AwaitingCheckpoint { quiz, answers, .. } => {
                answers.select(quiz, question, option)?;
                Ok(())
            }
            other => Err(invalid("select an answer", other)),
        }
    }

    /// Scores a checkpoint. A perfect score advances; anything else opens a
    /// remedial detour.
    ///
    /// An incomplete sheet is rejected before any transition or external call.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::Validation` for an incomplete or mismatched sheet
    /// and `LessonError::InvalidState` outside a checkpoint.
    pub async fn submit_checkpoint(
        &self,
        session: &mut LessonSession,
        answers: &AnswerSheet,
    ) -> Result<(), LessonError> {
        let (step, outcome) = match session.state() {
            LessonState::AwaitingCheckpoint { step, quiz, .. } => {
                (step.clone(), quiz.evaluate(answers)?)
            }
            other => return Err(invalid("submit a checkpoint", other)),
        };

        session.transition(LessonState::EvaluatingQuiz);
        tracing::debug!(
            course = %session.course_id(),
            step_index = session.index(),
            score = outcome.score,
            total = outcome.total,
            "checkpoint scored"
        );

        if outcome.passed() {
            self.complete_step(session).await;
            return Ok(());
        }

        let titles = session.cursor().checkpoint_titles();
        let text = match self
            .content
            .remedial_text(session.course_title(), &titles)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(course = %session.course_id(), error = %err, "remedial text unavailable; using placeholder");
                PLACEHOLDER_REMEDIAL_TEXT.to_owned()
            }
        };
        session.transition(LessonState::Remedial {
            step,
            outcome,
            text,
        });
        Ok(())
    }

    /// Fetches a fresh quiz after a failed checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidState` outside the remedial state.
    pub async fn retake_checkpoint(&self, session: &mut LessonSession) -> Result<(), LessonError> {
        let step = match session.state() {
            LessonState::Remedial { step, .. } => step.clone(),
            other => return Err(invalid("retake a checkpoint", other)),
        };
        self.load_checkpoint(session, step).await;
        Ok(())
    }

    /// Repeats whichever fetch put the session into `Failed`.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidState` unless the session has failed.
    pub async fn retry(&self, session: &mut LessonSession) -> Result<(), LessonError> {
        let (fetch, step) = match session.state() {
            LessonState::Failed { fetch, step, .. } => (*fetch, step.clone()),
            other => return Err(invalid("retry", other)),
        };
        match fetch {
            FailedFetch::StepContent => self.load_current(session).await,
            FailedFetch::CheckpointQuiz => self.load_checkpoint(session, step).await,
        }
        Ok(())
    }

    /// Hands back the finished module with every step completed.
    ///
    /// Progress was already persisted on the final advance.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidState` unless the session has completed.
    pub fn finish(&self, session: LessonSession) -> Result<Module, LessonError> {
        if !session.is_completed() {
            return Err(invalid("finish", session.state()));
        }
        Ok(session.into_module())
    }

    /// Narration of the presented lesson text, synthesized once per step.
    ///
    /// `None` when nothing is presented or synthesis fails.
    pub async fn lesson_audio(&self, session: &mut LessonSession) -> Option<AudioClip> {
        let presented = session.state().presented()?;
        let step_id = presented.step.id.clone();
        if let Some(clip) = session.cached_audio(&step_id) {
            return Some(clip.clone());
        }
        let text = presented.content.text.clone();
        match self.content.synthesize_audio(&text).await {
            Ok(clip) => {
                session.remember_audio(step_id, clip.clone());
                Some(clip)
            }
            Err(err) => {
                tracing::warn!(step = %step_id, error = %err, "narration unavailable");
                None
            }
        }
    }

    //
    // ─── STEP LOADING ──────────────────────────────────────────────────────────
    //

    /// Enters `Loading` for the current step and issues a new ticket,
    /// superseding any load still in flight.
    pub fn begin_step_load(&self, session: &mut LessonSession) -> StepRequest {
        let ticket = StepTicket::issue();
        let index = session.index();
        session.set_active_ticket(Some(ticket));
        session.transition(LessonState::Loading { index, ticket });
        StepRequest {
            ticket,
            index,
            course_id: session.course_id().clone(),
            course_title: session.course_title().to_owned(),
            module_title: session.module().title().to_owned(),
            step: session.current_step().clone(),
        }
    }

    /// Loads content for a step: the offline cache first, otherwise lesson
    /// text and video concurrently.
    ///
    /// Fresh content is cached only when both parts resolved, so degraded
    /// placeholders are never persisted.
    pub async fn fetch_step(&self, request: StepRequest) -> StepFetch {
        let StepRequest {
            ticket,
            index,
            course_id,
            course_title,
            module_title,
            step,
        } = request;

        match self.lessons.get_lesson(&course_id, &step.id).await {
            Ok(Some(cached)) => {
                tracing::debug!(course = %course_id, step = %step.id, "lesson served from cache");
                return StepFetch {
                    ticket,
                    index,
                    step,
                    content: cached.content,
                    offline: true,
                    failure: None,
                };
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(course = %course_id, step = %step.id, error = %err, "lesson cache read failed");
            }
        }

        let query = format!("{course_title} {}", step.title);
        let (text, video) = tokio::join!(
            self.content
                .step_lesson(&course_title, &module_title, &step.title),
            self.content.find_video(&query),
        );

        let video_resolved = video.is_ok();
        let video = video.unwrap_or_else(|err| {
            tracing::warn!(step = %step.id, error = %err, "video lookup failed; using placeholder");
            VideoRef::placeholder()
        });

        match text {
            Ok(text) => {
                let content = LessonContent::new(text, video);
                if video_resolved {
                    let cached = CachedLessonContent {
                        content: content.clone(),
                        fetched_at: self.clock.now(),
                    };
                    if let Err(err) = self.lessons.put_lesson(&course_id, &step.id, &cached).await {
                        tracing::warn!(course = %course_id, step = %step.id, error = %err, "lesson cache write failed");
                    }
                }
                StepFetch {
                    ticket,
                    index,
                    step,
                    content,
                    offline: false,
                    failure: None,
                }
            }
            Err(err) => {
                tracing::warn!(course = %course_id, step = %step.id, error = %err, "lesson text unavailable");
                StepFetch {
                    ticket,
                    index,
                    step,
                    content: LessonContent::new(PLACEHOLDER_LESSON_TEXT, video),
                    offline: false,
                    failure: Some(err.to_string()),
                }
            }
        }
    }

    /// Presents fetched content, unless the session moved on since the
    /// ticket was issued.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::StaleTicket` for a superseded or abandoned load;
    /// the session is left untouched.
    pub fn apply_step(
        &self,
        session: &mut LessonSession,
        fetched: StepFetch,
    ) -> Result<(), LessonError> {
        if session.active_ticket() != Some(fetched.ticket) {
            tracing::debug!(ticket = %fetched.ticket, step = %fetched.step.id, "discarding stale step result");
            return Err(LessonError::StaleTicket);
        }
        session.set_active_ticket(None);

        let presented = PresentedStep {
            index: fetched.index,
            step: fetched.step,
            content: fetched.content,
            offline: fetched.offline,
        };
        let next = match fetched.failure {
            None => LessonState::Presenting(presented),
            Some(reason) => LessonState::Failed {
                step: presented,
                fetch: FailedFetch::StepContent,
                reason,
            },
        };
        session.transition(next);
        Ok(())
    }

    /// Invalidates any in-flight load, e.g. when the learner leaves the lesson.
    pub fn abandon(&self, session: &mut LessonSession) {
        if let Some(ticket) = session.active_ticket() {
            tracing::debug!(%ticket, "step load abandoned");
        }
        session.set_active_ticket(None);
    }

    async fn load_current(&self, session: &mut LessonSession) {
        let request = self.begin_step_load(session);
        let fetched = self.fetch_step(request).await;
        // The ticket was issued above and nothing else touched the session.
        let _ = self.apply_step(session, fetched);
    }

    //
    // ─── CHECKPOINTS AND ADVANCING ─────────────────────────────────────────────
    //

    async fn load_checkpoint(&self, session: &mut LessonSession, step: PresentedStep) {
        let titles = session.cursor().checkpoint_titles();
        match self
            .content
            .checkpoint_quiz(session.course_title(), &titles)
            .await
        {
            Ok(quiz) => {
                let answers = quiz.blank_sheet();
                session.transition(LessonState::AwaitingCheckpoint {
                    step,
                    quiz,
                    answers,
                });
            }
            Err(err) => {
                tracing::warn!(course = %session.course_id(), step_index = session.index(), error = %err, "checkpoint quiz unavailable");
                session.transition(LessonState::Failed {
                    step,
                    fetch: FailedFetch::CheckpointQuiz,
                    reason: err.to_string(),
                });
            }
        }
    }

    async fn complete_step(&self, session: &mut LessonSession) {
        session.transition(LessonState::Advancing);
        let advance = session.cursor_mut().complete_current(self.clock.now());
        self.persist(session, advance.record()).await;

        match advance {
            Advance::Next { .. } => self.load_current(session).await,
            Advance::Finished { .. } => {
                tracing::info!(
                    user = %session.user(),
                    course = %session.course_id(),
                    module = %session.module().id(),
                    "module completed"
                );
                session.transition(LessonState::Completed);
            }
        }
    }

    async fn persist(&self, session: &LessonSession, record: &ProgressRecord) {
        if let Err(err) = self
            .progress
            .save_progress(
                session.user(),
                session.course_id(),
                session.module().id(),
                record,
            )
            .await
        {
            tracing::warn!(
                user = %session.user(),
                course = %session.course_id(),
                module = %session.module().id(),
                error = %err,
                "progress write failed"
            );
        }
    }
}

fn invalid(action: &'static str, state: &LessonState) -> LessonError {
    LessonError::InvalidState {
        action,
        state: state.kind().as_str(),
    }
}
