//! Configuration constants for the quiz engine
//!
//! This module contains the limits and tuning values used throughout the
//! engine to keep loaded questions well-formed and to give the lifelines
//! and the countdown their fixed behaviour.

/// Question store limits
pub mod store {
    /// Maximum number of questions accepted from a single load
    pub const MAX_QUESTION_COUNT: usize = 500;
    /// Maximum length of a question text in characters
    pub const MAX_TEXT_LENGTH: usize = 500;
}

/// Multiple choice question limits
pub mod multiple_choice {
    /// Minimum number of options a multiple choice question needs
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of options for a multiple choice question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of a single option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
}

/// Answer text configuration constants
pub mod answer_text {
    /// Maximum length of a typed answer in characters
    pub const MAX_LENGTH: usize = 200;
}

/// Countdown configuration constants
pub mod timer {
    /// Minimum seconds a player can be given per question
    pub const MIN_SECONDS_PER_QUESTION: u32 = 30;
    /// Maximum seconds a player can be given per question
    pub const MAX_SECONDS_PER_QUESTION: u32 = 90;
    /// Seconds per question used when nothing else is configured
    pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;
    /// Remaining-time ratio at or below which the countdown is critical
    pub const CRITICAL_RATIO: f64 = 0.33;
    /// Remaining-time ratio at or below which the countdown is a warning
    pub const WARNING_RATIO: f64 = 0.66;
}

/// Lifeline tuning constants
pub mod lifeline {
    /// Probability that the phoned friend names the correct option
    pub const PHONE_FRIEND_ACCURACY: f64 = 0.70;
    /// Percentage every option starts with in an audience poll
    pub const POLL_SEED_PERCENT: u8 = 5;
    /// Percentage added to the correct option in an audience poll
    pub const POLL_CORRECT_BONUS: u8 = 60;
    /// Total an audience poll always adds up to
    pub const POLL_TOTAL: u8 = 100;
}
