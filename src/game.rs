//! Core session logic and state management
//!
//! This module contains the [`Game`] struct, the single-player session
//! state machine. A session is configured, played and finished:
//!
//! ```text
//! Configuring --start--> Active --(all done)--> Finished
//!      ^                   |                       |
//!      +------reset--------+--------reset----------+
//!                          ^                       |
//!                          +-------restart---------+
//! ```
//!
//! Every operation is a synchronous reducer over `&mut self`. An operation
//! that returns an error has not changed anything. Timed events reach the
//! game as alarms the host delivers through [`Game::receive_alarm`], and
//! questions arrive through load tickets answered with
//! [`Game::receive_questions`].

use std::fmt::Debug;

use enum_map::EnumMap;
use fastrand::Rng;
use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    AlarmMessage,
    config::SessionConfig,
    lifeline::{self, Allowance, Effect, Effects, LifelineKind, Lifelines},
    progression::{PlayMode, Progression, QuestionProgress, Step},
    quiz::{
        common::{self, AnswerInput, Evaluation, Evaluator, Verdict},
        config::{QuestionKind, QuestionRecord, QuestionState},
    },
    store::{self, LoadError, LoadStatus, LoadTicket, QuestionSource, QuestionStore},
    timer::{self, Countdown, Severity, Tick},
};

/// Represents the current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Choosing settings and waiting for questions
    Configuring,
    /// Questions are being played
    Active,
    /// Every question is done and the final score is shown
    Finished,
}

/// Reasons an operation was rejected
///
/// A rejected operation leaves the session untouched, so callers that only
/// care about the resulting state may ignore these.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation does not apply in the current phase
    #[error("operation is not available while {0:?}")]
    WrongPhase(Phase),
    /// The operation does not apply to the configured play mode
    #[error("operation is not available in {0:?} mode")]
    WrongMode(PlayMode),
    /// No questions are loaded, or the last load failed
    #[error("no questions are available")]
    QuestionsUnavailable,
    /// The session configuration breaks a limit
    #[error("session configuration is invalid: {0}")]
    InvalidConfig(garde::Report),
    /// The answer breaks a limit
    #[error("answer is invalid: {0}")]
    InvalidInput(garde::Report),
    /// The operation needs an active question
    #[error("no question is active")]
    NoActiveQuestion,
    /// The index points past the question list
    #[error("there is no question {0}")]
    NoSuchQuestion(usize),
    /// The question already received its final evaluation
    #[error("question {0} was already answered")]
    AlreadyAnswered(usize),
    /// The question must be answered first
    #[error("question {0} has not been answered")]
    NotAnswered(usize),
    /// The option was hidden by fifty-fifty
    #[error("option {0} is hidden")]
    HiddenOption(usize),
    /// The evaluator rejected the answer or the jury decision
    #[error(transparent)]
    Answer(#[from] common::Error),
    /// The lifeline cannot be used
    #[error(transparent)]
    Lifeline(#[from] lifeline::Error),
    /// The load result belongs to an outdated request
    #[error(transparent)]
    Superseded(#[from] store::Superseded),
}

impl Error {
    /// Whether the operation was simply illegal at this point
    pub fn is_invalid_transition(&self) -> bool {
        !self.is_resource_exhausted() && !self.is_data_unavailable()
    }

    /// Whether a lifeline had no uses left for this request
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            Self::Lifeline(
                lifeline::Error::Disabled(_)
                    | lifeline::Error::Exhausted(_)
                    | lifeline::Error::AlreadyUsed(_)
            )
        )
    }

    /// Whether the operation is blocked until questions are loaded
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::QuestionsUnavailable)
    }
}

/// Every command the presentation layer can send
#[derive(Debug, Clone, Deserialize)]
pub enum Command {
    /// Start a session with the given configuration
    Start(SessionConfig),
    /// Pick a question (free-pick only)
    Select(usize),
    /// Answer the active question
    Submit(AnswerInput),
    /// Mark the pending open ended answer correct or incorrect
    JuryDecide(bool),
    /// Move to the next question (sequential only)
    Advance,
    /// Return to the question picker (free-pick only)
    Close,
    /// Use a lifeline on the active question
    UseLifeline(LifelineKind),
    /// Play again with the same configuration
    Restart,
    /// Return to configuration and fetch questions again
    Reset,
    /// Fetch questions again while configuring
    Reload,
}

/// An option as shown to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PossiblyHidden<T> {
    /// Content is shown
    Visible(T),
    /// Content was removed by a lifeline
    Hidden,
}

/// The active question as shown to the player
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQuestion {
    /// Position in the session order
    pub index: usize,
    /// The question text
    pub text: String,
    /// The kind of question
    pub kind: QuestionKind,
    /// Options, empty unless multiple choice
    pub options: Vec<PossiblyHidden<String>>,
    /// The option the player chose
    pub selected_option: Option<usize>,
    /// The correct option, revealed once the question is answered
    pub correct_option: Option<usize>,
    /// Whether an open ended answer waits for the jury
    pub awaiting_jury: bool,
    /// The open ended answer waiting for the jury
    pub pending_text: Option<String>,
}

/// A lifeline as shown to the player
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifelineView {
    /// The configured allowance
    pub allowance: Allowance,
    /// Uses left, absent when unlimited
    pub remaining: Option<u32>,
    /// Whether it was used on the active question
    pub used: bool,
    /// What it revealed about the active question
    pub effect: Option<Effect>,
}

/// Read-only view of the whole session
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Current phase
    pub phase: Phase,
    /// Configured play mode
    pub mode: PlayMode,
    /// Correctly answered questions
    pub score: usize,
    /// Questions in the session
    pub total: usize,
    /// Per-question progress in session order
    pub progress: Vec<QuestionProgress>,
    /// The active question, if any
    pub active: Option<ActiveQuestion>,
    /// Seconds left on the active question
    pub time_remaining: Option<u32>,
    /// Urgency of the remaining time
    pub severity: Option<Severity>,
    /// Lifeline availability and effects
    pub lifelines: EnumMap<LifelineKind, LifelineView>,
    /// Availability of questions
    pub load_status: LoadStatus,
}

impl Snapshot {
    /// Converts the snapshot to a JSON string for the presentation layer
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// A single-player quiz session
pub struct Game {
    /// Questions as loaded, in store order
    store: QuestionStore,
    /// Configuration of the current (or last) session
    config: SessionConfig,
    /// Current phase
    phase: Phase,
    /// Questions in session order
    questions: Vec<QuestionRecord>,
    /// Evaluator state per question
    states: Vec<QuestionState>,
    /// Progress per question
    progress: Vec<QuestionProgress>,
    /// Number of correctly answered questions
    score: usize,
    /// Index of the active question
    active: Option<usize>,
    /// Countdown for the active question
    countdown: Countdown,
    /// Lifeline budget and effects
    lifelines: Lifelines,
    /// Source of randomness for shuffling and lifelines
    rng: Rng,
}

impl Debug for Game {
    /// Custom debug implementation that avoids printing every question
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// Accessors
impl Game {
    /// Creates a session seeded from the environment
    pub fn new() -> Self {
        Self::with_rng(Rng::new())
    }

    /// Creates a session with a fixed seed, for reproducible play
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Rng::with_seed(seed))
    }

    fn with_rng(rng: Rng) -> Self {
        Self {
            store: QuestionStore::default(),
            config: SessionConfig::default(),
            phase: Phase::Configuring,
            questions: Vec::new(),
            states: Vec::new(),
            progress: Vec::new(),
            score: 0,
            active: None,
            countdown: Countdown::disabled(),
            lifelines: Lifelines::default(),
            rng,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Configuration of the current (or last) session
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of correctly answered questions
    pub fn score(&self) -> usize {
        self.score
    }

    /// Questions in session order
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Progress per question in session order
    pub fn progress(&self) -> &[QuestionProgress] {
        &self.progress
    }

    /// Index of the active question
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The active question's record
    pub fn active_record(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.active?)
    }

    /// Seconds left on the active question
    pub fn time_remaining(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    /// Lifeline budget and effects
    pub fn lifelines(&self) -> &Lifelines {
        &self.lifelines
    }

    /// Availability of questions
    pub fn load_status(&self) -> &LoadStatus {
        self.store.status()
    }

    fn policy(&self) -> &'static dyn Progression {
        self.config.mode.policy()
    }

    fn require_phase(&self, phase: Phase) -> Result<(), Error> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(Error::WrongPhase(self.phase))
        }
    }

    fn require_active_question(&self) -> Result<usize, Error> {
        self.require_phase(Phase::Active)?;
        self.active.ok_or(Error::NoActiveQuestion)
    }

    /// Builds the read-only view of the session
    pub fn snapshot(&self) -> Snapshot {
        let active = self.active.map(|index| {
            let record = &self.questions[index];
            let state = &self.states[index];
            let hidden = self
                .lifelines
                .effects(index)
                .map(Effects::hidden_options)
                .unwrap_or_default();

            ActiveQuestion {
                index,
                text: record.text().to_string(),
                kind: record.kind(),
                options: record
                    .options()
                    .iter()
                    .enumerate()
                    .map(|(i, option)| {
                        if hidden.contains(&i) {
                            PossiblyHidden::Hidden
                        } else {
                            PossiblyHidden::Visible(option.clone())
                        }
                    })
                    .collect(),
                selected_option: state.selected_option(),
                correct_option: if self.progress[index].answered {
                    record.correct_index()
                } else {
                    None
                },
                awaiting_jury: state.awaiting_jury(),
                pending_text: match state {
                    QuestionState::OpenEnded(s) if s.awaiting_jury() => {
                        s.text().map(ToString::to_string)
                    }
                    _ => None,
                },
            }
        });

        let effects = self.active.and_then(|index| self.lifelines.effects(index));

        Snapshot {
            phase: self.phase,
            mode: self.config.mode,
            score: self.score,
            total: self.questions.len(),
            progress: self.progress.clone(),
            active,
            time_remaining: self.countdown.remaining(),
            severity: self.countdown.severity(),
            lifelines: EnumMap::from_fn(|kind| LifelineView {
                allowance: self.lifelines.budget().allowance(kind),
                remaining: self.lifelines.budget().remaining(kind),
                used: effects.is_some_and(|e| e.is_used(kind)),
                effect: effects.and_then(|e| e.get(kind)).cloned(),
            }),
            load_status: self.store.status().clone(),
        }
    }
}

// Question loading
impl Game {
    /// Asks the host for questions
    ///
    /// Loaded questions stay usable until the result arrives. Any earlier
    /// ticket is superseded.
    pub fn request_load(&mut self) -> LoadTicket {
        self.store.request()
    }

    /// Accepts the host's answer to a load ticket
    ///
    /// A failed load leaves the store unavailable, which blocks starting a
    /// session until a later load succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Superseded`] when a newer ticket was issued since.
    pub fn receive_questions(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<QuestionRecord>, LoadError>,
    ) -> Result<LoadStatus, Error> {
        Ok(self.store.receive(ticket, result)?.clone())
    }

    /// Loads questions synchronously from a source
    ///
    /// # Errors
    ///
    /// Never rejects in practice: the ticket issued here is always the
    /// newest one. A failing source is reported through the status.
    pub fn load_from<Q: QuestionSource>(&mut self, source: &mut Q) -> Result<LoadStatus, Error> {
        let ticket = self.request_load();
        self.receive_questions(ticket, source.fetch())
    }

    /// Fetches questions again while configuring
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongPhase`] outside of configuration.
    pub fn reload_questions(&mut self) -> Result<LoadTicket, Error> {
        self.require_phase(Phase::Configuring)?;

        info!("reloading questions");

        Ok(self.store.request())
    }
}

// Session lifecycle
impl Game {
    /// Starts a session
    ///
    /// Freezes the question order (shuffled when configured), resets
    /// progress, score and lifelines, and activates the first question in
    /// sequential mode.
    ///
    /// # Arguments
    ///
    /// * `config` - Settings for the session
    /// * `schedule_message` - Function to schedule delayed messages for timing
    ///
    /// # Errors
    ///
    /// Rejects when not configuring, when the configuration is invalid, or
    /// when no questions are available.
    pub fn start_session<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        config: SessionConfig,
        schedule_message: &mut S,
    ) -> Result<(), Error> {
        self.require_phase(Phase::Configuring)?;
        config.validate().map_err(Error::InvalidConfig)?;
        if !self.store.is_ready() {
            return Err(Error::QuestionsUnavailable);
        }

        self.config = config;
        self.begin(schedule_message);

        Ok(())
    }

    /// Plays again from the final screen with the same configuration
    ///
    /// # Errors
    ///
    /// Rejects unless finished, or when questions became unavailable.
    pub fn restart<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        schedule_message: &mut S,
    ) -> Result<(), Error> {
        self.require_phase(Phase::Finished)?;
        if !self.store.is_ready() {
            return Err(Error::QuestionsUnavailable);
        }

        self.begin(schedule_message);

        Ok(())
    }

    /// Discards the session and returns to configuration
    ///
    /// Loaded questions are dropped and requested again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongPhase`] when already configuring.
    pub fn reset_to_config(&mut self) -> Result<LoadTicket, Error> {
        if self.phase == Phase::Configuring {
            return Err(Error::WrongPhase(self.phase));
        }

        self.countdown.cancel();
        self.lifelines = Lifelines::new(self.config.lifeline_allowance, 0);
        self.questions.clear();
        self.states.clear();
        self.progress.clear();
        self.score = 0;
        self.active = None;
        self.phase = Phase::Configuring;

        info!("session reset to configuration");

        Ok(self.store.clear_and_request())
    }

    fn begin<S: FnMut(AlarmMessage, web_time::Duration)>(&mut self, schedule_message: &mut S) {
        let mut questions = self.store.records().to_vec();
        if self.config.randomize_order {
            self.rng.shuffle(&mut questions);
        }

        self.states = questions.iter().map(QuestionRecord::to_state).collect();
        self.progress = vec![QuestionProgress::default(); questions.len()];
        self.questions = questions;
        self.score = 0;
        self.active = None;
        self.lifelines = Lifelines::new(self.config.lifeline_allowance, self.questions.len());
        self.countdown.reconfigure(self.config.timer.duration());
        self.phase = Phase::Active;

        info!(
            count = self.questions.len(),
            mode = ?self.config.mode,
            randomized = self.config.randomize_order,
            "session started"
        );

        if let Some(first) = self.policy().first_question(self.questions.len()) {
            self.activate(first, schedule_message);
        }
    }

    fn activate<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        index: usize,
        schedule_message: &mut S,
    ) {
        self.countdown.cancel();
        self.active = Some(index);

        if !self.progress[index].answered && !self.states[index].awaiting_jury() {
            self.countdown.activate(index, schedule_message);
        }
    }

    fn finish(&mut self) {
        self.countdown.cancel();
        self.active = None;
        self.phase = Phase::Finished;

        info!(
            score = self.score,
            total = self.questions.len(),
            "session finished"
        );
    }
}

// Play
impl Game {
    /// Makes a question active (free-pick only)
    ///
    /// Selecting the question that is already active changes nothing and
    /// keeps its countdown running.
    ///
    /// # Errors
    ///
    /// Rejects outside of free-pick play, for unknown indices and for
    /// questions that were already answered.
    pub fn select_question<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        index: usize,
        schedule_message: &mut S,
    ) -> Result<(), Error> {
        self.require_phase(Phase::Active)?;
        if !self.policy().allows_selection() {
            return Err(Error::WrongMode(self.config.mode));
        }
        let progress = self.progress.get(index).ok_or(Error::NoSuchQuestion(index))?;
        if progress.answered {
            return Err(Error::AlreadyAnswered(index));
        }

        if self.active != Some(index) {
            self.activate(index, schedule_message);
        }

        Ok(())
    }

    /// Returns to the question picker (free-pick only)
    ///
    /// # Errors
    ///
    /// Rejects outside of free-pick play or when no question is active.
    pub fn close_question(&mut self) -> Result<(), Error> {
        self.require_active_question()?;
        if !self.policy().allows_selection() {
            return Err(Error::WrongMode(self.config.mode));
        }

        self.countdown.cancel();
        self.active = None;

        Ok(())
    }

    /// Answers the active question
    ///
    /// Automatically evaluated answers are recorded immediately; open ended
    /// answers wait for [`Game::jury_decide`]. Either way the countdown
    /// stops.
    ///
    /// # Errors
    ///
    /// Rejects when no unanswered question is active, when the input is
    /// invalid or hidden, or when the evaluator refuses it.
    pub fn submit_answer(&mut self, input: AnswerInput) -> Result<Verdict, Error> {
        let index = self.require_active_question()?;
        if self.progress[index].answered {
            return Err(Error::AlreadyAnswered(index));
        }
        input.validate().map_err(Error::InvalidInput)?;
        if let AnswerInput::Choice(choice) = input {
            if self
                .lifelines
                .effects(index)
                .is_some_and(|e| e.hidden_options().contains(&choice))
            {
                return Err(Error::HiddenOption(choice));
            }
        }

        let verdict = self.states[index].submit(&self.questions[index], input)?;

        self.countdown.cancel();
        if let Verdict::Decided(evaluation) = &verdict {
            self.record(index, evaluation.clone());
        }

        Ok(verdict)
    }

    /// Finalizes the pending open ended answer
    ///
    /// # Errors
    ///
    /// Rejects when no question is active or it has no pending answer.
    pub fn jury_decide(&mut self, correct: bool) -> Result<Evaluation, Error> {
        let index = self.require_active_question()?;
        if self.progress[index].answered {
            return Err(Error::AlreadyAnswered(index));
        }

        let evaluation = self.states[index].jury_decide(correct)?;
        self.record(index, evaluation.clone());

        Ok(evaluation)
    }

    /// Moves past the answered active question (sequential only)
    ///
    /// # Errors
    ///
    /// Rejects outside of sequential play or before the active question is
    /// answered.
    pub fn advance<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        schedule_message: &mut S,
    ) -> Result<(), Error> {
        let index = self.require_active_question()?;
        let step = self
            .policy()
            .advance(index, self.questions.len())
            .ok_or(Error::WrongMode(self.config.mode))?;
        if !self.progress[index].answered {
            return Err(Error::NotAnswered(index));
        }

        match step {
            Step::Question(next) => self.activate(next, schedule_message),
            Step::Finished => self.finish(),
        }

        Ok(())
    }

    /// Uses a lifeline on the active question
    ///
    /// # Errors
    ///
    /// Rejects when no unanswered question is active or the lifeline is
    /// unavailable.
    pub fn use_lifeline(&mut self, kind: LifelineKind) -> Result<Effect, Error> {
        let index = self.require_active_question()?;
        if self.progress[index].answered {
            return Err(Error::AlreadyAnswered(index));
        }

        let effect = self
            .lifelines
            .use_lifeline(kind, index, &self.questions[index], &mut self.rng)?
            .clone();

        debug!(?kind, ?effect, index, "lifeline used");

        Ok(effect)
    }

    fn record(&mut self, index: usize, evaluation: Evaluation) {
        self.countdown.cancel();

        if evaluation.correct {
            self.score += 1;
        }
        self.progress[index] = QuestionProgress {
            answered: true,
            correct: evaluation.correct,
            user_answer: evaluation.user_answer,
        };

        debug!(index, correct = self.progress[index].correct, "answer recorded");

        if self.policy().finished_after_answer(&self.progress) {
            self.finish();
        }
    }
}

// Host events
impl Game {
    /// Handles scheduled alarm messages for timed events
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm that fired
    /// * `schedule_message` - Function to schedule the next alarm
    pub fn receive_alarm<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        message: AlarmMessage,
        schedule_message: &mut S,
    ) {
        let AlarmMessage::Timer(timer::AlarmMessage::Tick { index, generation }) = message;

        if self.phase != Phase::Active || self.active != Some(index) {
            debug!(index, "ignoring tick for inactive question");
            return;
        }

        match self.countdown.tick(index, generation, schedule_message) {
            Tick::Stale => debug!(index, generation, "ignoring stale tick"),
            Tick::Running(_) => {}
            Tick::Expired => {
                info!(index, "time ran out");
                self.record(index, Evaluation::timed_out());
            }
        }
    }

    /// Dispatches a command from the presentation layer
    ///
    /// # Returns
    ///
    /// The load ticket the host must answer, for commands that request
    /// questions.
    ///
    /// # Errors
    ///
    /// Forwards the error of the dispatched operation.
    pub fn receive_command<S: FnMut(AlarmMessage, web_time::Duration)>(
        &mut self,
        command: Command,
        schedule_message: &mut S,
    ) -> Result<Option<LoadTicket>, Error> {
        let result = match command {
            Command::Start(config) => self.start_session(config, schedule_message).map(|()| None),
            Command::Select(index) => self
                .select_question(index, schedule_message)
                .map(|()| None),
            Command::Submit(input) => self.submit_answer(input).map(|_| None),
            Command::JuryDecide(correct) => self.jury_decide(correct).map(|_| None),
            Command::Advance => self.advance(schedule_message).map(|()| None),
            Command::Close => self.close_question().map(|()| None),
            Command::UseLifeline(kind) => self.use_lifeline(kind).map(|_| None),
            Command::Restart => self.restart(schedule_message).map(|()| None),
            Command::Reset => self.reset_to_config().map(Some),
            Command::Reload => self.reload_questions().map(Some),
        };

        if let Err(e) = &result {
            debug!(error = %e, phase = ?self.phase, "command rejected");
        }

        result
    }
}
