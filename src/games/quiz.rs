//! Question-sequenced game content (trivia quizzes)
//!
//! A quiz presents one question at a time, indexed by the session's
//! `currentQuestionIndex`. All cooperative participants share a single
//! locked answer per question; the host advances the sequence. The
//! view-model here is a pure function of the session snapshot and the
//! viewer's role, so every subscriber derives the same screen from the
//! same snapshot.

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::participant::Role;

/// Static content of a question-sequenced quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizContent {
    /// The ordered list of questions to present
    #[garde(length(max = crate::constants::quiz::MAX_QUESTIONS_COUNT), dive)]
    pub questions: Vec<Question>,
}

/// A single quiz question with its answer options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The question text shown to all participants
    #[garde(length(chars, min = 1, max = crate::constants::quiz::MAX_QUESTION_LENGTH))]
    pub question: String,
    /// The selectable answer options
    #[garde(
        length(max = crate::constants::quiz::MAX_OPTION_COUNT),
        inner(length(chars, max = crate::constants::quiz::MAX_OPTION_LENGTH))
    )]
    pub options: Vec<String>,
    /// The option text counted as correct
    #[garde(length(chars, max = crate::constants::quiz::MAX_OPTION_LENGTH))]
    pub correct_answer: String,
}

impl QuizContent {
    /// Returns the number of questions in the quiz
    pub fn count(&self) -> usize {
        self.questions.len()
    }

    /// Returns the question at `index`, if it exists
    pub fn current(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Checks a submitted answer against the question at `index`
    ///
    /// Returns `None` when the index points outside the question list;
    /// callers treat that as "no current question" rather than a panic.
    pub fn check(&self, index: usize, answer: &str) -> Option<bool> {
        self.current(index)
            .map(|question| question.correct_answer == answer)
    }
}

/// Content that is visible only to some viewers
///
/// The correct answer is carried in the host's view-model but hidden
/// from players, so a player client never holds the answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PossiblyHidden<T> {
    /// Content is visible to the viewer
    Visible(T),
    /// Content is withheld from the viewer
    Hidden,
}

/// One selectable option as the viewer should render it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// The option text
    pub text: String,
    /// Whether the option button is disabled (an answer is locked)
    pub disabled: bool,
}

/// View-model for the current question of an active quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// Index of the current question (0-based)
    pub index: usize,
    /// Total number of questions in the quiz
    pub count: usize,
    /// The question text
    pub question: String,
    /// The answer options with their enabled/disabled state
    pub options: Vec<OptionView>,
    /// The answer locked by the first submitter, if any
    pub shared_answer: Option<String>,
    /// Correctness of the locked answer, if any
    pub answer_feedback: Option<bool>,
    /// The correct answer (hosts only)
    pub correct_answer: PossiblyHidden<String>,
}

impl QuizContent {
    /// Derives the view-model for the question at `index`
    ///
    /// All option buttons disable as soon as an answer locks. Returns
    /// `None` for an out-of-range index so the caller can degrade to a
    /// finished view instead of rendering stale content.
    pub fn view(
        &self,
        index: usize,
        shared_answer: Option<&str>,
        answer_feedback: Option<bool>,
        viewer: Role,
    ) -> Option<QuestionView> {
        let question = self.current(index)?;
        let locked = shared_answer.is_some();

        Some(QuestionView {
            index,
            count: self.count(),
            question: question.question.clone(),
            options: question
                .options
                .iter()
                .map(|text| OptionView {
                    text: text.clone(),
                    disabled: locked,
                })
                .collect_vec(),
            shared_answer: shared_answer.map(str::to_owned),
            answer_feedback,
            correct_answer: if viewer.is_host() {
                PossiblyHidden::Visible(question.correct_answer.clone())
            } else {
                PossiblyHidden::Hidden
            },
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn content() -> QuizContent {
        QuizContent {
            questions: vec![
                Question {
                    question: "2 + 2?".to_owned(),
                    options: vec!["3".to_owned(), "4".to_owned()],
                    correct_answer: "4".to_owned(),
                },
                Question {
                    question: "Capital of France?".to_owned(),
                    options: vec!["Paris".to_owned(), "Lyon".to_owned()],
                    correct_answer: "Paris".to_owned(),
                },
            ],
        }
    }

    #[test]
    fn test_check_answer() {
        let quiz = content();
        assert_eq!(quiz.check(0, "4"), Some(true));
        assert_eq!(quiz.check(0, "3"), Some(false));
        assert_eq!(quiz.check(5, "4"), None);
    }

    #[test]
    fn test_view_enables_options_before_lock() {
        let quiz = content();
        let view = quiz.view(0, None, None, Role::Player).unwrap();
        assert_eq!(view.index, 0);
        assert_eq!(view.count, 2);
        assert!(view.options.iter().all(|o| !o.disabled));
        assert_eq!(view.shared_answer, None);
    }

    #[test]
    fn test_view_disables_all_options_once_locked() {
        let quiz = content();
        let view = quiz.view(0, Some("3"), Some(false), Role::Player).unwrap();
        assert!(view.options.iter().all(|o| o.disabled));
        assert_eq!(view.shared_answer.as_deref(), Some("3"));
        assert_eq!(view.answer_feedback, Some(false));
    }

    #[test]
    fn test_view_hides_correct_answer_from_players() {
        let quiz = content();
        let view = quiz.view(0, None, None, Role::Player).unwrap();
        assert_eq!(view.correct_answer, PossiblyHidden::Hidden);

        let view = quiz.view(0, None, None, Role::Host).unwrap();
        assert_eq!(
            view.correct_answer,
            PossiblyHidden::Visible("4".to_owned())
        );
    }

    #[test]
    fn test_view_out_of_range_is_none() {
        let quiz = content();
        assert_eq!(quiz.view(2, None, None, Role::Host), None);
    }

    #[test]
    fn test_validation_rejects_empty_question() {
        let quiz = QuizContent {
            questions: vec![Question {
                question: String::new(),
                options: vec![],
                correct_answer: String::new(),
            }],
        };
        assert!(quiz.validate().is_err());
    }
}
