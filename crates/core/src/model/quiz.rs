use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question {index} has no text")]
    EmptyQuestion { index: usize },

    #[error("question {index} needs at least two options, got {count}")]
    TooFewOptions { index: usize, count: usize },

    #[error("question {index} marks option {correct} correct but has {count} options")]
    CorrectIndexOutOfRange {
        index: usize,
        correct: usize,
        count: usize,
    },

    #[error("{missing} of {total} questions are unanswered")]
    Unanswered { missing: usize, total: usize },

    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },

    #[error("question {index} has no option {option}")]
    OptionOutOfRange { index: usize, option: usize },
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
}

impl QuizQuestion {
    fn validate(&self, index: usize) -> Result<(), QuizError> {
        if self.text.trim().is_empty() {
            return Err(QuizError::EmptyQuestion { index });
        }
        let count = self.options.len();
        if count < 2 {
            return Err(QuizError::TooFewOptions { index, count });
        }
        if self.correct_answer_index >= count {
            return Err(QuizError::CorrectIndexOutOfRange {
                index,
                correct: self.correct_answer_index,
                count,
            });
        }
        Ok(())
    }
}

/// Checkpoint quiz. Generated per checkpoint and discarded after evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns the first structural problem found in `questions`.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        for (index, q) in questions.iter().enumerate() {
            q.validate(index)?;
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// A fresh answer sheet with every question unanswered.
    #[must_use]
    pub fn blank_sheet(&self) -> AnswerSheet {
        AnswerSheet::blank(self.questions.len())
    }

    /// Scores a complete answer sheet. Only a perfect score passes.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AnswerCountMismatch` if the sheet does not belong
    /// to this quiz and `QuizError::Unanswered` if any slot is empty.
    pub fn evaluate(&self, sheet: &AnswerSheet) -> Result<QuizOutcome, QuizError> {
        if sheet.len() != self.questions.len() {
            return Err(QuizError::AnswerCountMismatch {
                expected: self.questions.len(),
                actual: sheet.len(),
            });
        }
        let missing = sheet.unanswered();
        if missing > 0 {
            return Err(QuizError::Unanswered {
                missing,
                total: self.questions.len(),
            });
        }

        let score = self
            .questions
            .iter()
            .zip(sheet.answers())
            .filter(|(q, a)| **a == Some(q.correct_answer_index))
            .count();

        Ok(QuizOutcome {
            score,
            total: self.questions.len(),
        })
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Learner selections for a quiz, `None` meaning unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerSheet {
    answers: Vec<Option<usize>>,
}

impl AnswerSheet {
    #[must_use]
    pub fn blank(len: usize) -> Self {
        Self {
            answers: vec![None; len],
        }
    }

    #[must_use]
    pub fn from_answers(answers: Vec<Option<usize>>) -> Self {
        Self { answers }
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_none()).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unanswered() == 0
    }

    /// Records a selection, checking it against the quiz's option counts.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::OptionOutOfRange` when the question or option does not exist.
    pub fn select(&mut self, quiz: &Quiz, question: usize, option: usize) -> Result<(), QuizError> {
        let valid = quiz
            .questions()
            .get(question)
            .is_some_and(|q| option < q.options.len());
        match self.answers.get_mut(question) {
            Some(slot) if valid => {
                *slot = Some(option);
                Ok(())
            }
            _ => Err(QuizError::OptionOutOfRange {
                index: question,
                option,
            }),
        }
    }
}

/// Result of scoring a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: usize,
    pub total: usize,
}

impl QuizOutcome {
    /// Pass requires every question correct; there is no partial credit.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score == self.total
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> QuizQuestion {
        QuizQuestion {
            id: None,
            text: "Which tag starts a document?".into(),
            options: vec!["<html>".into(), "<end>".into(), "<css>".into()],
            correct_answer_index: correct,
        }
    }

    fn quiz() -> Quiz {
        Quiz::new(vec![question(0), question(1), question(2)]).unwrap()
    }

    #[test]
    fn rejects_correct_index_out_of_range() {
        let err = Quiz::new(vec![question(3)]).unwrap_err();
        assert!(matches!(
            err,
            QuizError::CorrectIndexOutOfRange { index: 0, correct: 3, count: 3 }
        ));
    }

    #[test]
    fn rejects_single_option_question() {
        let mut q = question(0);
        q.options.truncate(1);
        assert!(matches!(
            Quiz::new(vec![q]).unwrap_err(),
            QuizError::TooFewOptions { .. }
        ));
    }

    #[test]
    fn unanswered_sheet_is_rejected() {
        let quiz = quiz();
        let mut sheet = quiz.blank_sheet();
        sheet.select(&quiz, 0, 0).unwrap();
        let err = quiz.evaluate(&sheet).unwrap_err();
        assert_eq!(err, QuizError::Unanswered { missing: 2, total: 3 });
    }

    #[test]
    fn only_perfect_score_passes() {
        let quiz = quiz();
        let perfect = AnswerSheet::from_answers(vec![Some(0), Some(1), Some(2)]);
        let outcome = quiz.evaluate(&perfect).unwrap();
        assert!(outcome.passed());

        let one_wrong = AnswerSheet::from_answers(vec![Some(0), Some(1), Some(0)]);
        let outcome = quiz.evaluate(&one_wrong).unwrap();
        assert_eq!(outcome.score, 2);
        assert!(!outcome.passed());
    }

    #[test]
    fn mismatched_sheet_is_rejected() {
        let quiz = quiz();
        let sheet = AnswerSheet::from_answers(vec![Some(0)]);
        assert!(matches!(
            quiz.evaluate(&sheet).unwrap_err(),
            QuizError::AnswerCountMismatch { expected: 3, actual: 1 }
        ));
    }

    #[test]
    fn select_checks_option_range() {
        let quiz = quiz();
        let mut sheet = quiz.blank_sheet();
        assert!(sheet.select(&quiz, 0, 5).is_err());
        assert!(sheet.select(&quiz, 9, 0).is_err());
        assert_eq!(sheet.unanswered(), 3);
    }

    #[test]
    fn empty_quiz_passes_trivially() {
        let quiz = Quiz::new(Vec::new()).unwrap();
        let outcome = quiz.evaluate(&quiz.blank_sheet()).unwrap();
        assert!(outcome.passed());
    }
}
