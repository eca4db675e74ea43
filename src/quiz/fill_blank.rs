//! Fill in the blank question implementation
//!
//! Fill in the blank questions accept a short typed answer. The answer is
//! correct when it equals the expected text after trimming whitespace and
//! ignoring case.

use serde::{Deserialize, Serialize};

use super::{
    common::{AnswerInput, Error, Evaluation, Evaluator, Verdict, clean_answer},
    config::{CorrectAnswer, QuestionRecord},
};

/// Runtime state for a fill in the blank question
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// The text the player typed
    submitted: Option<String>,
}

impl State {
    /// Checks a typed answer against the record's expected text
    fn is_correct_answer(record: &QuestionRecord, answer: &str) -> bool {
        match record.correct_answer() {
            CorrectAnswer::Text(expected) => clean_answer(expected) == clean_answer(answer),
            CorrectAnswer::Index(_) | CorrectAnswer::Unset => false,
        }
    }
}

impl Evaluator for State {
    fn submit(&mut self, record: &QuestionRecord, input: AnswerInput) -> Result<Verdict, Error> {
        let AnswerInput::Text(answer) = input else {
            return Err(Error::MismatchedInput);
        };

        if self.submitted.is_some() {
            return Err(Error::AlreadySubmitted);
        }

        let correct = Self::is_correct_answer(record, &answer);
        self.submitted = Some(answer.clone());

        Ok(Verdict::Decided(Evaluation {
            correct,
            user_answer: Some(answer),
        }))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn submit(record: &QuestionRecord, answer: &str) -> Evaluation {
        let mut state = State::default();
        match state
            .submit(record, AnswerInput::Text(answer.to_string()))
            .unwrap()
        {
            Verdict::Decided(evaluation) => evaluation,
            Verdict::AwaitingJury => panic!("fill in the blank never waits for a jury"),
        }
    }

    #[test]
    fn test_exact_answer() {
        let record = QuestionRecord::fill_blank("Capital of Peru?", "Lima");
        assert!(submit(&record, "Lima").correct);
    }

    #[test]
    fn test_case_and_whitespace_ignored() {
        let record = QuestionRecord::fill_blank("Capital of Peru?", "Lima");
        let evaluation = submit(&record, "  lIMA\t");

        assert!(evaluation.correct);
        assert_eq!(evaluation.user_answer.as_deref(), Some("  lIMA\t"));
    }

    #[test]
    fn test_inner_whitespace_matters() {
        let record = QuestionRecord::fill_blank("Largest city?", "New York");
        assert!(!submit(&record, "NewYork").correct);
    }

    #[test]
    fn test_wrong_answer() {
        let record = QuestionRecord::fill_blank("Capital of Peru?", "Lima");
        assert!(!submit(&record, "Cusco").correct);
    }

    #[test]
    fn test_resubmission_rejected() {
        let record = QuestionRecord::fill_blank("Capital of Peru?", "Lima");
        let mut state = State::default();

        state
            .submit(&record, AnswerInput::Text("Cusco".to_string()))
            .unwrap();

        assert_eq!(
            state.submit(&record, AnswerInput::Text("Lima".to_string())),
            Err(Error::AlreadySubmitted)
        );
    }

    #[test]
    fn test_choice_input_rejected() {
        let record = QuestionRecord::fill_blank("Capital of Peru?", "Lima");
        let mut state = State::default();

        assert_eq!(
            state.submit(&record, AnswerInput::Choice(0)),
            Err(Error::MismatchedInput)
        );
        assert!(state.submitted.is_none());
    }
}
