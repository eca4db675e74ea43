//! Session configuration
//!
//! A [`SessionConfig`] is chosen while the session is being configured and
//! stays fixed until the player returns to configuration.

use enum_map::{EnumMap, enum_map};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    constants::timer::{
        DEFAULT_SECONDS_PER_QUESTION, MAX_SECONDS_PER_QUESTION, MIN_SECONDS_PER_QUESTION,
    },
    lifeline::{Allowance, LifelineKind},
    progression::PlayMode,
};

/// Countdown settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerConfig {
    /// Whether questions are timed at all
    #[garde(skip)]
    pub enabled: bool,
    /// Seconds given for each question
    #[garde(range(min = MIN_SECONDS_PER_QUESTION, max = MAX_SECONDS_PER_QUESTION))]
    pub seconds_per_question: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

impl TimerConfig {
    /// The countdown duration, `None` when disabled
    pub fn duration(&self) -> Option<u32> {
        self.enabled.then_some(self.seconds_per_question)
    }
}

/// Everything the player chooses before a session starts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Whether the question order is shuffled on every start
    #[garde(skip)]
    pub randomize_order: bool,
    /// Countdown settings
    #[garde(dive)]
    pub timer: TimerConfig,
    /// How often each lifeline may be used
    #[garde(skip)]
    pub lifeline_allowance: EnumMap<LifelineKind, Allowance>,
    /// Sequential or free-pick play
    #[garde(skip)]
    pub mode: PlayMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            randomize_order: true,
            timer: TimerConfig::default(),
            lifeline_allowance: enum_map! { _ => Allowance::default() },
            mode: PlayMode::default(),
        }
    }
}
