use std::fmt;

use course_core::model::{
    AnswerSheet, AudioClip, CourseId, LessonContent, Module, Quiz, QuizOutcome, Step, StepId,
    UserId,
};
use course_core::progression::ModuleCursor;
use uuid::Uuid;

//
// ─── TICKETS ───────────────────────────────────────────────────────────────────
//

/// Identifies one step load. Results carrying a superseded ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepTicket(Uuid);

impl StepTicket {
    pub(crate) fn issue() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for StepTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// A step on screen along with its loaded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedStep {
    pub index: usize,
    pub step: Step,
    pub content: LessonContent,
    /// Served from the offline cache without contacting the content service.
    pub offline: bool,
}

/// Which fetch a `Failed` state can retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedFetch {
    StepContent,
    CheckpointQuiz,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonState {
    Loading {
        index: usize,
        ticket: StepTicket,
    },
    Presenting(PresentedStep),
    AwaitingCheckpoint {
        step: PresentedStep,
        quiz: Quiz,
        answers: AnswerSheet,
    },
    EvaluatingQuiz,
    Remedial {
        step: PresentedStep,
        outcome: QuizOutcome,
        text: String,
    },
    Advancing,
    Completed,
    /// A fetch failed. `step` holds what the learner still sees, which for a
    /// failed step load is placeholder content they may advance past.
    Failed {
        step: PresentedStep,
        fetch: FailedFetch,
        reason: String,
    },
}

impl LessonState {
    #[must_use]
    pub fn kind(&self) -> StateKind {
        match self {
            LessonState::Loading { .. } => StateKind::Loading,
            LessonState::Presenting(_) => StateKind::Presenting,
            LessonState::AwaitingCheckpoint { .. } => StateKind::AwaitingCheckpoint,
            LessonState::EvaluatingQuiz => StateKind::EvaluatingQuiz,
            LessonState::Remedial { .. } => StateKind::Remedial,
            LessonState::Advancing => StateKind::Advancing,
            LessonState::Completed => StateKind::Completed,
            LessonState::Failed { .. } => StateKind::Failed,
        }
    }

    /// The step whose content is currently shown, if any.
    #[must_use]
    pub fn presented(&self) -> Option<&PresentedStep> {
        match self {
            LessonState::Presenting(step)
            | LessonState::AwaitingCheckpoint { step, .. }
            | LessonState::Remedial { step, .. }
            | LessonState::Failed { step, .. } => Some(step),
            _ => None,
        }
    }
}

/// Payload-free state tag, recorded in the transition trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Loading,
    Presenting,
    AwaitingCheckpoint,
    EvaluatingQuiz,
    Remedial,
    Advancing,
    Completed,
    Failed,
}

impl StateKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StateKind::Loading => "loading",
            StateKind::Presenting => "presenting",
            StateKind::AwaitingCheckpoint => "awaiting_checkpoint",
            StateKind::EvaluatingQuiz => "evaluating_quiz",
            StateKind::Remedial => "remedial",
            StateKind::Advancing => "advancing",
            StateKind::Completed => "completed",
            StateKind::Failed => "failed",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner working through one module.
///
/// Owned by the caller and driven through `LessonEngine`; all mutation goes
/// through `&mut`, so a session never sees two transitions at once.
#[derive(Debug)]
pub struct LessonSession {
    user: UserId,
    course_id: CourseId,
    course_title: String,
    cursor: ModuleCursor,
    state: LessonState,
    active_ticket: Option<StepTicket>,
    trail: Vec<StateKind>,
    audio: Option<(StepId, AudioClip)>,
}

impl LessonSession {
    pub(crate) fn new(
        user: UserId,
        course_id: CourseId,
        course_title: String,
        cursor: ModuleCursor,
    ) -> Self {
        let index = cursor.index();
        Self {
            user,
            course_id,
            course_title,
            cursor,
            // Replaced by the first `begin_step_load`.
            state: LessonState::Loading {
                index,
                ticket: StepTicket::issue(),
            },
            active_ticket: None,
            trail: Vec::new(),
            audio: None,
        }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    #[must_use]
    pub fn module(&self) -> &Module {
        self.cursor.module()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    #[must_use]
    pub fn current_step(&self) -> &Step {
        self.cursor.current_step()
    }

    #[must_use]
    pub fn state(&self) -> &LessonState {
        &self.state
    }

    #[must_use]
    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    /// Every state entered so far, oldest first.
    #[must_use]
    pub fn trail(&self) -> &[StateKind] {
        &self.trail
    }

    #[must_use]
    pub fn active_ticket(&self) -> Option<StepTicket> {
        self.active_ticket
    }

    /// The in-progress answer sheet while awaiting a checkpoint.
    #[must_use]
    pub fn answer_sheet(&self) -> Option<&AnswerSheet> {
        match &self.state {
            LessonState::AwaitingCheckpoint { answers, .. } => Some(answers),
            _ => None,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        match &self.state {
            LessonState::AwaitingCheckpoint { quiz, .. } => Some(quiz),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.kind() == StateKind::Completed
    }

    pub(crate) fn cursor(&self) -> &ModuleCursor {
        &self.cursor
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut ModuleCursor {
        &mut self.cursor
    }

    pub(crate) fn into_module(self) -> Module {
        self.cursor.into_module()
    }

    pub(crate) fn state_mut(&mut self) -> &mut LessonState {
        &mut self.state
    }

    pub(crate) fn set_active_ticket(&mut self, ticket: Option<StepTicket>) {
        self.active_ticket = ticket;
    }

    pub(crate) fn cached_audio(&self, step: &StepId) -> Option<&AudioClip> {
        self.audio
            .as_ref()
            .filter(|(id, _)| id == step)
            .map(|(_, clip)| clip)
    }

    pub(crate) fn remember_audio(&mut self, step: StepId, clip: AudioClip) {
        self.audio = Some((step, clip));
    }

    pub(crate) fn transition(&mut self, next: LessonState) {
        let to = next.kind();
        tracing::debug!(
            user = %self.user,
            course = %self.course_id,
            module = %self.cursor.module().id(),
            step_index = self.cursor.index(),
            from = %self.state.kind(),
            %to,
            "lesson transition"
        );
        self.trail.push(to);
        self.state = next;
    }
}
