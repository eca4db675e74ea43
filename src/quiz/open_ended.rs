//! Open ended question implementation
//!
//! Open ended questions have no automatic answer check. Evaluation is a
//! two step protocol: the player's text is recorded first, then exactly one
//! jury decision marks it correct or incorrect.

use serde::{Deserialize, Serialize};

use super::{
    common::{AnswerInput, Error, Evaluation, Evaluator, Verdict},
    config::QuestionRecord,
};

/// Runtime state for an open ended question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The text waiting for (or already given) a verdict
    text: Option<String>,
    /// The jury's verdict
    decision: Option<bool>,
}

impl State {
    /// The recorded text, if the player has submitted one
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl Evaluator for State {
    fn submit(&mut self, _record: &QuestionRecord, input: AnswerInput) -> Result<Verdict, Error> {
        let AnswerInput::Text(text) = input else {
            return Err(Error::MismatchedInput);
        };

        if self.text.is_some() {
            return Err(Error::AlreadySubmitted);
        }

        self.text = Some(text);

        Ok(Verdict::AwaitingJury)
    }

    fn jury_decide(&mut self, correct: bool) -> Result<Evaluation, Error> {
        if self.decision.is_some() {
            return Err(Error::AlreadyDecided);
        }

        let Some(text) = &self.text else {
            return Err(Error::NothingToJudge);
        };

        let evaluation = Evaluation {
            correct,
            user_answer: Some(text.clone()),
        };
        self.decision = Some(correct);

        Ok(evaluation)
    }

    fn awaiting_jury(&self) -> bool {
        self.text.is_some() && self.decision.is_none()
    }
}
