//! # Millionaire Quiz Engine
//!
//! This library provides the core logic of a single-player "who wants to be
//! a millionaire" style quiz. It loads questions, runs a session through
//! configuration, play and the final score, evaluates multiple choice, fill
//! in the blank and jury-judged open ended answers, drives a per-question
//! countdown and applies the fifty-fifty, phone a friend and audience poll
//! lifelines.
//!
//! The engine owns no clock and no I/O. The host delivers commands and
//! scheduled alarms to [`game::Game`], answers load tickets with questions
//! and renders [`game::Snapshot`]s.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod config;
pub mod game;
pub mod lifeline;
pub mod progression;
pub mod quiz;
pub mod store;
pub mod timer;

/// Alarm messages for timed events
///
/// The host schedules these with the delay it is given and hands them back
/// to [`game::Game::receive_alarm`] once the delay has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown alarms
    Timer(timer::AlarmMessage),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_message_from_timer() {
        let message: AlarmMessage = timer::AlarmMessage::Tick {
            index: 3,
            generation: 7,
        }
        .into();

        assert_eq!(
            message,
            AlarmMessage::Timer(timer::AlarmMessage::Tick {
                index: 3,
                generation: 7
            })
        );
    }

    #[test]
    fn test_alarm_message_round_trips_through_host() {
        let message = AlarmMessage::Timer(timer::AlarmMessage::Tick {
            index: 0,
            generation: 1,
        });

        let stored = serde_json::to_string(&message).unwrap();

        assert_eq!(
            stored,
            r#"{"Timer":{"Tick":{"index":0,"generation":1}}}"#
        );
        assert_eq!(serde_json::from_str::<AlarmMessage>(&stored).unwrap(), message);
    }
}
