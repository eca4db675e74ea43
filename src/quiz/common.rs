//! Shared traits and common functionality for answer evaluation
//!
//! This module contains the types every question kind speaks: the answer a
//! player submits, the normalized evaluation recorded in the session, and
//! the [`Evaluator`] trait each kind implements.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::QuestionRecord;

/// An answer submitted by the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub enum AnswerInput {
    /// Index of the chosen option (multiple choice questions)
    Choice(#[garde(skip)] usize),
    /// Free text (fill in the blank and open ended questions)
    Text(#[garde(length(chars, max = crate::constants::answer_text::MAX_LENGTH))] String),
}

/// Normalized result of evaluating an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Whether the answer was judged correct
    pub correct: bool,
    /// The answer as the player gave it
    pub user_answer: Option<String>,
}

impl Evaluation {
    /// The synthetic answer recorded when the countdown runs out
    pub fn timed_out() -> Self {
        Self {
            correct: false,
            user_answer: Some(String::new()),
        }
    }
}

/// What happened to a submitted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The answer was scored right away
    Decided(Evaluation),
    /// The answer was recorded and now waits for a jury decision
    AwaitingJury,
}

/// Reasons an evaluator refuses an answer or a jury decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The answer kind does not fit the question kind
    #[error("answer kind does not match the question")]
    MismatchedInput,
    /// The chosen option is not part of the question
    #[error("option {0} does not exist")]
    NoSuchOption(usize),
    /// The question already received its answer
    #[error("question already has an answer")]
    AlreadySubmitted,
    /// Only open ended questions take jury decisions
    #[error("question is not judged by a jury")]
    NotJuryQuestion,
    /// The jury was asked to decide before any text was submitted
    #[error("no answer has been submitted for the jury to judge")]
    NothingToJudge,
    /// The jury has already decided
    #[error("jury has already decided")]
    AlreadyDecided,
}

/// Evaluation behaviour of a single question kind
pub trait Evaluator {
    /// Evaluate a submitted answer against the record it belongs to
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] without changing any state when the answer is
    /// refused.
    fn submit(&mut self, record: &QuestionRecord, input: AnswerInput) -> Result<Verdict, Error>;

    /// Finalize a pending answer with the jury's verdict
    ///
    /// # Errors
    ///
    /// Only open ended questions accept jury decisions; every other kind
    /// answers [`Error::NotJuryQuestion`].
    fn jury_decide(&mut self, _correct: bool) -> Result<Evaluation, Error> {
        Err(Error::NotJuryQuestion)
    }

    /// Whether an answer has been recorded that still waits for the jury
    fn awaiting_jury(&self) -> bool {
        false
    }

    /// The option chosen by the player, if any
    fn selected_option(&self) -> Option<usize> {
        None
    }
}

/// Normalizes an answer string for comparison
///
/// # Arguments
/// * `answer` - The answer string to clean
///
/// # Returns
/// * Trimmed, lowercased answer string
pub fn clean_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}
