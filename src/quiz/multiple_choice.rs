//! Multiple choice question implementation
//!
//! Multiple choice questions present several options and accept exactly
//! one choice. The choice is correct when it matches the record's correct
//! index; a record without a defined correct index marks every choice wrong.

use serde::{Deserialize, Serialize};

use super::{
    common::{AnswerInput, Error, Evaluation, Evaluator, Verdict},
    config::QuestionRecord,
};

/// Runtime state for a multiple choice question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The option the player chose, once they chose one
    chosen: Option<usize>,
}

impl Evaluator for State {
    fn submit(&mut self, record: &QuestionRecord, input: AnswerInput) -> Result<Verdict, Error> {
        let AnswerInput::Choice(index) = input else {
            return Err(Error::MismatchedInput);
        };

        if self.chosen.is_some() {
            return Err(Error::AlreadySubmitted);
        }

        if index >= record.options().len() {
            return Err(Error::NoSuchOption(index));
        }

        self.chosen = Some(index);

        Ok(Verdict::Decided(Evaluation {
            correct: record.correct_index() == Some(index),
            user_answer: Some(index.to_string()),
        }))
    }

    fn selected_option(&self) -> Option<usize> {
        self.chosen
    }
}
