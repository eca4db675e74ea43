//! Question records and their runtime evaluator state
//!
//! This module defines the immutable [`QuestionRecord`] the session plays,
//! the loosely shaped [`RawQuestion`] it is decoded from, and the
//! [`QuestionState`] enum that dispatches answer evaluation to the state of
//! the matching question kind.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{multiple_choice::*, store::*};

use super::{
    common::{self, AnswerInput, Evaluation, Evaluator, Verdict, clean_answer},
    fill_blank, multiple_choice, open_ended,
};

/// The kinds of questions the engine can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Pick one of several options
    MultipleChoice,
    /// Type a short answer compared against the expected text
    FillBlank,
    /// Type a free answer that a jury marks right or wrong
    OpenEnded,
}

impl QuestionKind {
    /// Interprets a `kind` tag from the question store
    ///
    /// Tags are matched case-insensitively, ignoring dashes, underscores
    /// and spaces, so `fill-blank`, `Fill Blank` and `fill_blank` agree.
    ///
    /// # Returns
    ///
    /// The matching kind, or `None` for an unknown tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "multiplechoice" | "choice" => Some(Self::MultipleChoice),
            "fillblank" | "fillintheblank" | "blank" => Some(Self::FillBlank),
            "openended" | "open" | "jury" => Some(Self::OpenEnded),
            _ => None,
        }
    }
}

/// The expected answer of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectAnswer {
    /// Index of the correct option
    Index(usize),
    /// Expected text
    Text(String),
    /// No expected answer is known
    Unset,
}

/// A single question as played by the session
///
/// Records are immutable once loaded. A session may reorder its copy of
/// the records, but never changes an individual record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    correct_answer: CorrectAnswer,
}

impl QuestionRecord {
    /// Builds a multiple choice record
    pub fn multiple_choice(
        text: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct: usize,
    ) -> Self {
        Self {
            text: text.into(),
            kind: QuestionKind::MultipleChoice,
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: CorrectAnswer::Index(correct),
        }
    }

    /// Builds a fill in the blank record
    pub fn fill_blank(text: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: QuestionKind::FillBlank,
            options: Vec::new(),
            correct_answer: CorrectAnswer::Text(answer.into()),
        }
    }

    /// Builds an open ended record judged by a jury
    pub fn open_ended(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: QuestionKind::OpenEnded,
            options: Vec::new(),
            correct_answer: CorrectAnswer::Unset,
        }
    }

    /// The question text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The kind of question
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// The options, empty unless this is a multiple choice question
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The expected answer
    pub fn correct_answer(&self) -> &CorrectAnswer {
        &self.correct_answer
    }

    /// The correct option of a multiple choice question, if one is defined
    pub fn correct_index(&self) -> Option<usize> {
        match (self.kind, &self.correct_answer) {
            (QuestionKind::MultipleChoice, CorrectAnswer::Index(index))
                if *index < self.options.len() =>
            {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Creates fresh evaluator state for playing this record
    pub fn to_state(&self) -> QuestionState {
        match self.kind {
            QuestionKind::MultipleChoice => {
                QuestionState::MultipleChoice(multiple_choice::State::default())
            }
            QuestionKind::FillBlank => QuestionState::FillBlank(fill_blank::State::default()),
            QuestionKind::OpenEnded => QuestionState::OpenEnded(open_ended::State::default()),
        }
    }
}

/// The expected answer as written in the question store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAnswer {
    /// An option index
    Index(usize),
    /// A text answer
    Text(String),
}

/// A question exactly as it arrives from the question store
///
/// The kind is inferred: a non-empty option list makes a multiple choice
/// question; otherwise the `kind` tag decides, falling back to fill in the
/// blank when a text answer is present and to open ended when not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    /// The question text
    #[garde(length(chars, min = 1, max = MAX_TEXT_LENGTH))]
    #[serde(alias = "pregunta")]
    pub text: String,
    /// Options for multiple choice questions
    #[garde(length(max = MAX_OPTION_COUNT), inner(length(chars, max = MAX_OPTION_LENGTH)))]
    #[serde(default, alias = "opciones")]
    pub options: Vec<String>,
    /// The expected answer
    #[garde(skip)]
    #[serde(default, alias = "respuesta")]
    pub correct_answer: Option<RawAnswer>,
    /// Optional kind tag
    #[garde(skip)]
    #[serde(default)]
    pub kind: Option<String>,
}

/// A full load from the question store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(transparent)]
pub struct QuestionBank {
    /// The questions in store order
    #[garde(length(max = MAX_QUESTION_COUNT), dive)]
    pub questions: Vec<RawQuestion>,
}

/// Reasons a raw question cannot become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A multiple choice question lists fewer options than required
    #[error("multiple choice question has {0} option(s), at least two are required")]
    TooFewOptions(usize),
    /// The correct index points past the option list
    #[error("correct answer {index} is out of range for {count} options")]
    AnswerOutOfRange {
        /// The offending index
        index: usize,
        /// Number of options available
        count: usize,
    },
    /// A text answer names none of the options
    #[error("correct answer {0:?} is not one of the options")]
    UnknownOption(String),
}

impl TryFrom<RawQuestion> for QuestionRecord {
    type Error = RecordError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let RawQuestion {
            text,
            options,
            correct_answer,
            kind,
        } = raw;

        if options.is_empty() {
            let correct_answer = match correct_answer {
                Some(RawAnswer::Text(answer)) => CorrectAnswer::Text(answer),
                Some(RawAnswer::Index(number)) => CorrectAnswer::Text(number.to_string()),
                None => CorrectAnswer::Unset,
            };
            let kind = kind
                .as_deref()
                .and_then(QuestionKind::from_tag)
                .filter(|kind| *kind != QuestionKind::MultipleChoice)
                .unwrap_or(match correct_answer {
                    CorrectAnswer::Text(_) => QuestionKind::FillBlank,
                    _ => QuestionKind::OpenEnded,
                });

            return Ok(Self {
                text,
                kind,
                options,
                correct_answer,
            });
        }

        if options.len() < MIN_OPTION_COUNT {
            return Err(RecordError::TooFewOptions(options.len()));
        }

        let correct_answer = match correct_answer {
            None => CorrectAnswer::Unset,
            Some(RawAnswer::Index(index)) if index < options.len() => CorrectAnswer::Index(index),
            Some(RawAnswer::Index(index)) => {
                return Err(RecordError::AnswerOutOfRange {
                    index,
                    count: options.len(),
                });
            }
            Some(RawAnswer::Text(answer)) => {
                let cleaned = clean_answer(&answer);
                match options.iter().position(|o| clean_answer(o) == cleaned) {
                    Some(index) => CorrectAnswer::Index(index),
                    None => return Err(RecordError::UnknownOption(answer)),
                }
            }
        };

        Ok(Self {
            text,
            kind: QuestionKind::MultipleChoice,
            options,
            correct_answer,
        })
    }
}

/// Runtime evaluator state of a question during a session
///
/// This enum mirrors [`QuestionKind`] and forwards every [`Evaluator`]
/// call to the state of the matching kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionState {
    /// Runtime state for a multiple choice question
    MultipleChoice(multiple_choice::State),
    /// Runtime state for a fill in the blank question
    FillBlank(fill_blank::State),
    /// Runtime state for an open ended question
    OpenEnded(open_ended::State),
}

impl Evaluator for QuestionState {
    fn submit(
        &mut self,
        record: &QuestionRecord,
        input: AnswerInput,
    ) -> Result<Verdict, common::Error> {
        match self {
            Self::MultipleChoice(s) => s.submit(record, input),
            Self::FillBlank(s) => s.submit(record, input),
            Self::OpenEnded(s) => s.submit(record, input),
        }
    }

    fn jury_decide(&mut self, correct: bool) -> Result<Evaluation, common::Error> {
        match self {
            Self::MultipleChoice(s) => s.jury_decide(correct),
            Self::FillBlank(s) => s.jury_decide(correct),
            Self::OpenEnded(s) => s.jury_decide(correct),
        }
    }

    fn awaiting_jury(&self) -> bool {
        match self {
            Self::MultipleChoice(s) => s.awaiting_jury(),
            Self::FillBlank(s) => s.awaiting_jury(),
            Self::OpenEnded(s) => s.awaiting_jury(),
        }
    }

    fn selected_option(&self) -> Option<usize> {
        match self {
            Self::MultipleChoice(s) => s.selected_option(),
            Self::FillBlank(s) => s.selected_option(),
            Self::OpenEnded(s) => s.selected_option(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn raw(options: &[&str], correct_answer: Option<RawAnswer>, kind: Option<&str>) -> RawQuestion {
        RawQuestion {
            text: "Question?".to_string(),
            options: options.iter().map(ToString::to_string).collect(),
            correct_answer,
            kind: kind.map(ToString::to_string),
        }
    }

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(
            QuestionKind::from_tag("multiple_choice"),
            Some(QuestionKind::MultipleChoice)
        );
        assert_eq!(QuestionKind::from_tag("Fill-Blank"), Some(QuestionKind::FillBlank));
        assert_eq!(
            QuestionKind::from_tag("fill in the blank"),
            Some(QuestionKind::FillBlank)
        );
        assert_eq!(QuestionKind::from_tag("OPEN"), Some(QuestionKind::OpenEnded));
        assert_eq!(QuestionKind::from_tag("essay"), None);
    }

    #[test]
    fn test_options_make_multiple_choice() {
        let record =
            QuestionRecord::try_from(raw(&["a", "b", "c"], Some(RawAnswer::Index(1)), Some("open")))
                .unwrap();
        assert_eq!(record.kind(), QuestionKind::MultipleChoice);
        assert_eq!(record.correct_index(), Some(1));
    }

    #[test]
    fn test_text_answer_resolves_to_option() {
        let record = QuestionRecord::try_from(raw(
            &["Paris", "Rome"],
            Some(RawAnswer::Text(" rome ".to_string())),
            None,
        ))
        .unwrap();
        assert_eq!(record.correct_answer(), &CorrectAnswer::Index(1));
    }

    #[test]
    fn test_text_answer_not_an_option() {
        let result = QuestionRecord::try_from(raw(
            &["Paris", "Rome"],
            Some(RawAnswer::Text("Berlin".to_string())),
            None,
        ));
        assert_eq!(result, Err(RecordError::UnknownOption("Berlin".to_string())));
    }

    #[test]
    fn test_index_out_of_range() {
        let result = QuestionRecord::try_from(raw(&["a", "b"], Some(RawAnswer::Index(2)), None));
        assert_eq!(
            result,
            Err(RecordError::AnswerOutOfRange { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_single_option_rejected() {
        let result = QuestionRecord::try_from(raw(&["a"], Some(RawAnswer::Index(0)), None));
        assert_eq!(result, Err(RecordError::TooFewOptions(1)));
    }

    #[test]
    fn test_multiple_choice_without_answer() {
        let record = QuestionRecord::try_from(raw(&["a", "b"], None, None)).unwrap();
        assert_eq!(record.kind(), QuestionKind::MultipleChoice);
        assert_eq!(record.correct_index(), None);
    }

    #[test]
    fn test_inferred_free_text_kinds() {
        let fill = QuestionRecord::try_from(raw(&[], Some(RawAnswer::Text("x".into())), None))
            .unwrap();
        assert_eq!(fill.kind(), QuestionKind::FillBlank);

        let open = QuestionRecord::try_from(raw(&[], None, None)).unwrap();
        assert_eq!(open.kind(), QuestionKind::OpenEnded);

        let tagged =
            QuestionRecord::try_from(raw(&[], Some(RawAnswer::Text("x".into())), Some("jury")))
                .unwrap();
        assert_eq!(tagged.kind(), QuestionKind::OpenEnded);

        // a multiple choice tag without options cannot hold
        let mistagged =
            QuestionRecord::try_from(raw(&[], None, Some("multiple_choice"))).unwrap();
        assert_eq!(mistagged.kind(), QuestionKind::OpenEnded);
    }

    #[test]
    fn test_numeric_answer_on_free_text() {
        let record =
            QuestionRecord::try_from(raw(&[], Some(RawAnswer::Index(1492)), None)).unwrap();
        assert_eq!(record.kind(), QuestionKind::FillBlank);
        assert_eq!(
            record.correct_answer(),
            &CorrectAnswer::Text("1492".to_string())
        );
    }

    #[test]
    fn test_raw_question_deserialization() {
        let question: RawQuestion = serde_json::from_str(
            r#"{"text":"2+2?","options":["3","4"],"correctAnswer":1}"#,
        )
        .unwrap();
        assert_eq!(question.correct_answer, Some(RawAnswer::Index(1)));
        assert!(question.kind.is_none());

        let question: RawQuestion =
            serde_json::from_str(r#"{"text":"Capital of Peru?","correctAnswer":"Lima"}"#).unwrap();
        assert!(question.options.is_empty());
        assert_eq!(
            question.correct_answer,
            Some(RawAnswer::Text("Lima".to_string()))
        );
    }

    #[test]
    fn test_raw_question_validation() {
        assert!(raw(&["a", "b"], None, None).validate().is_ok());

        let mut empty_text = raw(&["a", "b"], None, None);
        empty_text.text = String::new();
        assert!(empty_text.validate().is_err());

        let too_many = raw(&["o"; MAX_OPTION_COUNT + 1], None, None);
        assert!(too_many.validate().is_err());

        let long = "o".repeat(MAX_OPTION_LENGTH + 1);
        let long_option = raw(&[long.as_str(), "b"], None, None);
        assert!(long_option.validate().is_err());
    }

    #[test]
    fn test_question_bank_too_many_questions() {
        let bank = QuestionBank {
            questions: vec![raw(&["a", "b"], None, None); MAX_QUESTION_COUNT + 1],
        };
        assert!(bank.validate().is_err());
    }

    #[test]
    fn test_to_state_matches_kind() {
        let mc = QuestionRecord::multiple_choice("q", ["a", "b"], 0);
        assert!(matches!(mc.to_state(), QuestionState::MultipleChoice(_)));

        let fill = QuestionRecord::fill_blank("q", "a");
        assert!(matches!(fill.to_state(), QuestionState::FillBlank(_)));

        let open = QuestionRecord::open_ended("q");
        assert!(matches!(open.to_state(), QuestionState::OpenEnded(_)));
    }

    #[test]
    fn test_correct_index_only_for_multiple_choice() {
        assert_eq!(QuestionRecord::fill_blank("q", "0").correct_index(), None);
        assert_eq!(
            QuestionRecord::multiple_choice("q", ["a", "b"], 5).correct_index(),
            None
        );
    }
}
