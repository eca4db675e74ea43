//! Progression policies
//!
//! Sequential and free-pick play share the whole session state machine and
//! differ only in how the active question moves and when the session is
//! over. Those differences live behind the [`Progression`] trait.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Per-question progress of the session
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionProgress {
    /// Whether the question received its final evaluation
    pub answered: bool,
    /// Whether the final evaluation was correct
    pub correct: bool,
    /// What the player answered, empty when time ran out
    pub user_answer: Option<String>,
}

/// Where the session goes after the active question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue with the question at this index
    Question(usize),
    /// No questions remain
    Finished,
}

/// How the active question moves through the session
pub trait Progression {
    /// The play mode implemented by this policy
    fn mode(&self) -> PlayMode;

    /// The active question when a session with `count` questions starts
    fn first_question(&self, count: usize) -> Option<usize>;

    /// Whether the player picks questions (and may return to the picker)
    fn allows_selection(&self) -> bool;

    /// The step taken by an explicit advance from `current`
    ///
    /// `None` means advancing is not part of this policy.
    fn advance(&self, current: usize, count: usize) -> Option<Step>;

    /// Whether the session is over right after an answer was recorded
    fn finished_after_answer(&self, progress: &[QuestionProgress]) -> bool;
}

/// Questions are presented one at a time in a fixed forward order
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Progression for Sequential {
    fn mode(&self) -> PlayMode {
        PlayMode::Sequential
    }

    fn first_question(&self, count: usize) -> Option<usize> {
        (count > 0).then_some(0)
    }

    fn allows_selection(&self) -> bool {
        false
    }

    fn advance(&self, current: usize, count: usize) -> Option<Step> {
        let next = current + 1;
        Some(if next < count {
            Step::Question(next)
        } else {
            Step::Finished
        })
    }

    fn finished_after_answer(&self, _progress: &[QuestionProgress]) -> bool {
        false
    }
}

/// The player chooses which unanswered question to attempt next
#[derive(Debug, Clone, Copy, Default)]
pub struct FreePick;

impl Progression for FreePick {
    fn mode(&self) -> PlayMode {
        PlayMode::FreePick
    }

    fn first_question(&self, _count: usize) -> Option<usize> {
        None
    }

    fn allows_selection(&self) -> bool {
        true
    }

    fn advance(&self, _current: usize, _count: usize) -> Option<Step> {
        None
    }

    fn finished_after_answer(&self, progress: &[QuestionProgress]) -> bool {
        progress.iter().all(|p| p.answered)
    }
}

/// The play mode chosen when configuring a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// See [`Sequential`]
    #[default]
    Sequential,
    /// See [`FreePick`]
    FreePick,
}

impl PlayMode {
    /// The progression policy for this mode
    pub fn policy(self) -> &'static dyn Progression {
        match self {
            Self::Sequential => &Sequential,
            Self::FreePick => &FreePick,
        }
    }
}
