//! Question store
//!
//! Questions are fetched by the host, which may take a while. Each request
//! hands out a [`LoadTicket`]; only the newest ticket is honoured when the
//! result comes back, so a slow response from an older request can never
//! overwrite a newer one.

use garde::Validate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::quiz::config::{QuestionBank, QuestionRecord, RecordError};

const NO_QUESTIONS: &str = "no questions were loaded";

/// Identifies one request for questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket(u64);

/// Availability of questions as shown to the player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    /// Nothing was requested yet
    #[default]
    Idle,
    /// A request is outstanding
    Loading,
    /// Questions are available
    Ready,
    /// The last request failed, with a description of why
    Unavailable(String),
}

/// Reasons a load produced no questions
#[derive(Debug, Error)]
pub enum LoadError {
    /// The payload is not a JSON array of questions
    #[error("questions could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    /// A question breaks one of the size limits
    #[error("questions are invalid: {0}")]
    Invalid(#[from] garde::Report),
    /// A question is structurally wrong
    #[error("question {index} is malformed: {source}")]
    Record {
        /// Position of the question in the payload
        index: usize,
        /// What is wrong with it
        #[source]
        source: RecordError,
    },
    /// The host could not fetch the questions
    #[error("questions could not be fetched: {0}")]
    Source(String),
}

/// A load result arrived for a ticket that is no longer current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("load ticket {0:?} was superseded by a newer request")]
pub struct Superseded(pub LoadTicket);

/// Parses and validates a JSON array of questions
///
/// # Errors
///
/// Returns a [`LoadError`] when the payload is not valid JSON, exceeds a
/// size limit, or contains a malformed question.
pub fn parse_questions(json: &str) -> Result<Vec<QuestionRecord>, LoadError> {
    let bank: QuestionBank = serde_json::from_str(json)?;
    bank.validate()?;

    bank.questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            QuestionRecord::try_from(raw).map_err(|source| LoadError::Record { index, source })
        })
        .collect()
}

/// Anything able to produce questions on demand
pub trait QuestionSource {
    /// Fetches the current set of questions
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when no questions could be produced.
    fn fetch(&mut self) -> Result<Vec<QuestionRecord>, LoadError>;
}

/// A source backed by a JSON document
#[derive(Debug, Clone)]
pub struct JsonSource(String);

impl JsonSource {
    /// Wraps a JSON document
    pub fn new(json: impl Into<String>) -> Self {
        Self(json.into())
    }
}

impl QuestionSource for JsonSource {
    fn fetch(&mut self) -> Result<Vec<QuestionRecord>, LoadError> {
        parse_questions(&self.0)
    }
}

impl QuestionSource for Vec<QuestionRecord> {
    fn fetch(&mut self) -> Result<Vec<QuestionRecord>, LoadError> {
        Ok(self.clone())
    }
}

/// The loaded questions together with their load bookkeeping
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    records: Vec<QuestionRecord>,
    status: LoadStatus,
    generation: u64,
}

impl QuestionStore {
    /// The loaded questions in store order
    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    /// Current availability
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Whether a session can be started from the loaded questions
    ///
    /// Questions kept across a reload stay playable while it is pending.
    pub fn is_ready(&self) -> bool {
        !self.records.is_empty()
    }

    /// Starts a new request, superseding every earlier ticket
    ///
    /// Already loaded questions stay available until the result arrives.
    pub fn request(&mut self) -> LoadTicket {
        self.generation += 1;
        self.status = LoadStatus::Loading;

        LoadTicket(self.generation)
    }

    /// Drops the loaded questions and starts a new request
    pub fn clear_and_request(&mut self) -> LoadTicket {
        self.records.clear();
        self.request()
    }

    /// Accepts the result of a request
    ///
    /// A failure clears the questions and marks the store unavailable, and
    /// so does a successful load that brought no questions.
    ///
    /// # Errors
    ///
    /// Returns [`Superseded`] without changing anything when the ticket is
    /// not the newest one or was already answered.
    pub fn receive(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<QuestionRecord>, LoadError>,
    ) -> Result<&LoadStatus, Superseded> {
        if ticket.0 != self.generation || self.status != LoadStatus::Loading {
            debug!(?ticket, current = self.generation, "ignoring superseded load");
            return Err(Superseded(ticket));
        }

        match result {
            Ok(records) if records.is_empty() => {
                warn!("question load returned no questions");
                self.records.clear();
                self.status = LoadStatus::Unavailable(NO_QUESTIONS.to_string());
            }
            Ok(records) => {
                debug!(count = records.len(), "questions loaded");
                self.records = records;
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                warn!(error = %e, "question load failed");
                self.records.clear();
                self.status = LoadStatus::Unavailable(e.to_string());
            }
        }

        Ok(&self.status)
    }
}
