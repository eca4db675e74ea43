//! Question records and answer evaluation
//!
//! This module contains the question kinds supported by the engine:
//! multiple choice, fill in the blank, and open ended questions judged by a
//! jury. Each kind has its own evaluator state, and [`config`] ties them
//! together behind a single dispatching type.

pub mod common;
pub mod config;
pub mod fill_blank;
pub mod multiple_choice;
pub mod open_ended;
