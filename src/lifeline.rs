//! Lifelines: limited-use helpers for the active question
//!
//! Three lifelines exist: fifty-fifty, phone a friend and ask the audience.
//! Their state is split in two tiers. The session-scoped [`Budget`] counts
//! how many uses remain for the whole session, while the question-scoped
//! [`Effects`] remember what each lifeline revealed about one question.
//! The active question only ever shows its own effects.
//!
//! The effect computations are pure functions over an injected random
//! source so that their statistical behaviour can be tested with a seed.

use std::collections::BTreeSet;

use enum_map::{Enum, EnumMap};
use fastrand::Rng;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{constants::lifeline::*, quiz::config::QuestionRecord};

/// The available lifelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum LifelineKind {
    /// Hide all but one of the incorrect options
    FiftyFifty,
    /// Ask a friend, who is right most of the time
    PhoneFriend,
    /// Poll the audience for a percentage per option
    AudiencePoll,
}

/// How many times a lifeline may be used during a session
///
/// In configuration files the allowance is written as a number: `-1` for
/// unlimited, `0` for disabled and any positive number for a finite budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Allowance {
    /// No limit on the number of uses
    Unlimited,
    /// The lifeline cannot be used
    Disabled,
    /// The lifeline can be used this many times
    Limited(u32),
}

impl Default for Allowance {
    /// Every lifeline can be used once by default
    fn default() -> Self {
        Self::Limited(1)
    }
}

/// An allowance number outside of the accepted values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lifeline allowance must be -1, 0 or a positive number, got {0}")]
pub struct AllowanceError(i32);

impl TryFrom<i32> for Allowance {
    type Error = AllowanceError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Unlimited),
            0 => Ok(Self::Disabled),
            n if n > 0 => Ok(Self::Limited(n as u32)),
            n => Err(AllowanceError(n)),
        }
    }
}

impl From<Allowance> for i32 {
    fn from(allowance: Allowance) -> Self {
        match allowance {
            Allowance::Unlimited => -1,
            Allowance::Disabled | Allowance::Limited(0) => 0,
            Allowance::Limited(n) => i32::try_from(n).unwrap_or(i32::MAX),
        }
    }
}

/// What a lifeline revealed about the active question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Option indices that are no longer shown
    HiddenOptions(BTreeSet<usize>),
    /// The option the friend suggested
    SuggestedAnswer(usize),
    /// Percentage of the audience per option, adding up to 100
    PollResult(Vec<u8>),
}

/// Reasons a lifeline cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The lifeline was disabled in the session configuration
    #[error("{0:?} is disabled for this session")]
    Disabled(LifelineKind),
    /// The finite budget for the lifeline is spent
    #[error("{0:?} has no uses left")]
    Exhausted(LifelineKind),
    /// The lifeline was already used on the active question
    #[error("{0:?} was already used on this question")]
    AlreadyUsed(LifelineKind),
    /// The active question has no option set the lifeline could act on
    #[error("{0:?} needs a multiple choice question with a known answer")]
    NotApplicable(LifelineKind),
}

/// Picks the options hidden by the fifty-fifty lifeline
///
/// One incorrect option is kept at random, every other incorrect option is
/// hidden. The correct option is never hidden, and with only two options
/// nothing is hidden at all.
///
/// # Arguments
///
/// * `option_count` - Number of options the question has
/// * `correct` - Index of the correct option
/// * `rng` - Random source
///
/// # Returns
///
/// The set of hidden option indices
pub fn fifty_fifty(option_count: usize, correct: usize, rng: &mut Rng) -> BTreeSet<usize> {
    let incorrect = (0..option_count).filter(|i| *i != correct).collect_vec();
    if incorrect.is_empty() {
        return BTreeSet::new();
    }

    let keep = incorrect[rng.usize(..incorrect.len())];

    incorrect.into_iter().filter(|i| *i != keep).collect()
}

/// Picks the option the phoned friend suggests
///
/// The friend names the correct option with a fixed probability and a
/// uniformly random incorrect option otherwise.
pub fn phone_friend(option_count: usize, correct: usize, rng: &mut Rng) -> usize {
    let incorrect = (0..option_count).filter(|i| *i != correct).collect_vec();

    if incorrect.is_empty() || rng.f64() < PHONE_FRIEND_ACCURACY {
        correct
    } else {
        incorrect[rng.usize(..incorrect.len())]
    }
}

/// Simulates the audience poll
///
/// Every option starts with a small seed, the correct option receives a
/// large bonus and the remaining points are handed out one at a time to
/// random options. The seed shrinks for questions with many options so the
/// result always adds up to exactly 100.
///
/// # Returns
///
/// One percentage per option
pub fn audience_poll(option_count: usize, correct: usize, rng: &mut Rng) -> Vec<u8> {
    if option_count == 0 {
        return Vec::new();
    }

    let room = usize::from(POLL_TOTAL - POLL_CORRECT_BONUS);
    let seed = usize::from(POLL_SEED_PERCENT).min(room / option_count);

    let mut poll = vec![seed; option_count];
    if let Some(share) = poll.get_mut(correct) {
        *share += usize::from(POLL_CORRECT_BONUS);
    }

    let mut remaining = usize::from(POLL_TOTAL) - poll.iter().sum::<usize>();
    while remaining > 0 {
        poll[rng.usize(..option_count)] += 1;
        remaining -= 1;
    }

    poll.into_iter().map(|share| share as u8).collect_vec()
}

/// Computes a lifeline's effect on a question
///
/// # Returns
///
/// The effect, or `None` when the question is not multiple choice or has
/// no defined correct option
pub fn compute(kind: LifelineKind, record: &QuestionRecord, rng: &mut Rng) -> Option<Effect> {
    let correct = record.correct_index()?;
    let option_count = record.options().len();

    Some(match kind {
        LifelineKind::FiftyFifty => Effect::HiddenOptions(fifty_fifty(option_count, correct, rng)),
        LifelineKind::PhoneFriend => {
            Effect::SuggestedAnswer(phone_friend(option_count, correct, rng))
        }
        LifelineKind::AudiencePoll => {
            Effect::PollResult(audience_poll(option_count, correct, rng))
        }
    })
}

/// Session-scoped lifeline uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    /// The configured allowance per lifeline
    allowance: EnumMap<LifelineKind, Allowance>,
    /// Uses left per lifeline, `None` when unlimited
    remaining: EnumMap<LifelineKind, Option<u32>>,
}

impl Budget {
    /// Creates a full budget from the configured allowances
    pub fn new(allowance: EnumMap<LifelineKind, Allowance>) -> Self {
        Self {
            allowance,
            remaining: EnumMap::from_fn(|kind| match allowance[kind] {
                Allowance::Unlimited => None,
                Allowance::Disabled => Some(0),
                Allowance::Limited(n) => Some(n),
            }),
        }
    }

    /// The configured allowance of a lifeline
    pub fn allowance(&self, kind: LifelineKind) -> Allowance {
        self.allowance[kind]
    }

    /// Uses left for a lifeline, `None` when unlimited
    pub fn remaining(&self, kind: LifelineKind) -> Option<u32> {
        self.remaining[kind]
    }

    /// Whether the lifeline was switched off in the configuration
    pub fn is_disabled(&self, kind: LifelineKind) -> bool {
        matches!(
            self.allowance[kind],
            Allowance::Disabled | Allowance::Limited(0)
        )
    }

    /// Spends one use of a lifeline; unlimited lifelines are not counted
    fn spend(&mut self, kind: LifelineKind) {
        if let Some(remaining) = &mut self.remaining[kind] {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

/// Question-scoped lifeline effects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects(EnumMap<LifelineKind, Option<Effect>>);

impl Effects {
    /// The effect a lifeline had on the question
    pub fn get(&self, kind: LifelineKind) -> Option<&Effect> {
        self.0[kind].as_ref()
    }

    /// Whether a lifeline was already used on the question
    pub fn is_used(&self, kind: LifelineKind) -> bool {
        self.0[kind].is_some()
    }

    /// Options hidden from the question
    pub fn hidden_options(&self) -> BTreeSet<usize> {
        match self.get(LifelineKind::FiftyFifty) {
            Some(Effect::HiddenOptions(hidden)) => hidden.clone(),
            _ => BTreeSet::new(),
        }
    }
}

/// The complete lifeline state of a session
///
/// Effects are kept per question for the whole session, so a question the
/// player leaves and picks again shows the same effects and cannot take the
/// same lifeline twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifelines {
    budget: Budget,
    effects: Vec<Effects>,
}

impl Lifelines {
    /// Creates lifeline state for a session of `question_count` questions
    pub fn new(allowance: EnumMap<LifelineKind, Allowance>, question_count: usize) -> Self {
        Self {
            budget: Budget::new(allowance),
            effects: vec![Effects::default(); question_count],
        }
    }

    /// The session-scoped budget
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// The effects on the question at `index`
    pub fn effects(&self, index: usize) -> Option<&Effects> {
        self.effects.get(index)
    }

    /// Uses a lifeline on the question at `index`
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the lifeline is disabled, the question has
    /// no option set to act on, the lifeline was already used on this
    /// question, or its budget is spent, checked in that order. Nothing is
    /// changed in that case.
    pub fn use_lifeline(
        &mut self,
        kind: LifelineKind,
        index: usize,
        record: &QuestionRecord,
        rng: &mut Rng,
    ) -> Result<&Effect, Error> {
        if self.budget.is_disabled(kind) {
            return Err(Error::Disabled(kind));
        }

        if record.correct_index().is_none() || index >= self.effects.len() {
            return Err(Error::NotApplicable(kind));
        }

        if self.effects[index].is_used(kind) {
            return Err(Error::AlreadyUsed(kind));
        }

        if self.budget.remaining(kind) == Some(0) {
            return Err(Error::Exhausted(kind));
        }

        let effect = compute(kind, record, rng).ok_or(Error::NotApplicable(kind))?;

        self.budget.spend(kind);

        Ok(self.effects[index].0[kind].insert(effect))
    }
}

impl Default for Lifelines {
    fn default() -> Self {
        Self::new(EnumMap::default(), 0)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use enum_map::enum_map;

    fn create_test_record() -> QuestionRecord {
        QuestionRecord::multiple_choice("Pick", ["a", "b", "c", "d"], 2)
    }

    #[test]
    fn test_fifty_fifty_four_options() {
        for seed in 0..200 {
            let mut rng = Rng::with_seed(seed);
            let hidden = fifty_fifty(4, 2, &mut rng);

            assert_eq!(hidden.len(), 2);
            assert!(!hidden.contains(&2));

            let kept = (0..4).filter(|i| *i != 2 && !hidden.contains(i)).collect_vec();
            assert_eq!(kept.len(), 1);
        }
    }

    #[test]
    fn test_fifty_fifty_two_options() {
        let mut rng = Rng::with_seed(1);
        assert!(fifty_fifty(2, 0, &mut rng).is_empty());
        assert!(fifty_fifty(1, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_fifty_fifty_keeps_every_incorrect_option_sometimes() {
        let mut rng = Rng::with_seed(99);
        let mut kept = BTreeSet::new();
        for _ in 0..300 {
            let hidden = fifty_fifty(4, 0, &mut rng);
            kept.extend((1..4).filter(|i| !hidden.contains(i)));
        }
        assert_eq!(kept, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_phone_friend_is_biased_towards_correct() {
        let mut rng = Rng::with_seed(42);
        let trials = 10_000;
        let correct = (0..trials)
            .filter(|_| phone_friend(4, 1, &mut rng) == 1)
            .count();

        let rate = correct as f64 / f64::from(trials);
        assert!((0.67..=0.73).contains(&rate), "rate was {rate}");
    }

    #[test]
    fn test_phone_friend_wrong_suggestions_are_valid_options() {
        let mut rng = Rng::with_seed(3);
        for _ in 0..1000 {
            assert!(phone_friend(3, 0, &mut rng) < 3);
        }
    }

    #[test]
    fn test_phone_friend_single_option() {
        let mut rng = Rng::with_seed(3);
        assert_eq!(phone_friend(1, 0, &mut rng), 0);
    }

    #[test]
    fn test_audience_poll_sums_to_hundred() {
        for option_count in 2..=40 {
            for seed in 0..25 {
                let mut rng = Rng::with_seed(seed);
                let correct = seed as usize % option_count;
                let poll = audience_poll(option_count, correct, &mut rng);

                assert_eq!(poll.len(), option_count);
                assert_eq!(poll.iter().map(|p| u32::from(*p)).sum::<u32>(), 100);
            }
        }
    }

    #[test]
    fn test_audience_poll_favours_correct() {
        let mut rng = Rng::with_seed(5);
        for _ in 0..100 {
            let poll = audience_poll(4, 3, &mut rng);
            assert!(poll[3] >= 65);
            assert!(poll.iter().all(|p| *p >= 5));
        }
    }

    #[test]
    fn test_allowance_conversion() {
        assert_eq!(Allowance::try_from(-1), Ok(Allowance::Unlimited));
        assert_eq!(Allowance::try_from(0), Ok(Allowance::Disabled));
        assert_eq!(Allowance::try_from(3), Ok(Allowance::Limited(3)));
        assert_eq!(Allowance::try_from(-2), Err(AllowanceError(-2)));
        assert_eq!(i32::from(Allowance::Unlimited), -1);
        assert_eq!(i32::from(Allowance::Limited(2)), 2);
    }

    #[test]
    fn test_allowance_serde() {
        let allowance: EnumMap<LifelineKind, Allowance> =
            serde_json::from_str(r#"{"FiftyFifty":-1,"PhoneFriend":0,"AudiencePoll":2}"#)
                .unwrap();
        assert_eq!(allowance[LifelineKind::FiftyFifty], Allowance::Unlimited);
        assert_eq!(allowance[LifelineKind::PhoneFriend], Allowance::Disabled);
        assert_eq!(allowance[LifelineKind::AudiencePoll], Allowance::Limited(2));

        assert!(serde_json::from_str::<Allowance>("-5").is_err());
        assert_eq!(serde_json::to_string(&Allowance::Unlimited).unwrap(), "-1");
    }

    #[test]
    fn test_use_lifeline_records_effect_and_spends() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(EnumMap::default(), 2);

        let effect = lifelines
            .use_lifeline(LifelineKind::AudiencePoll, 0, &record, &mut rng)
            .unwrap()
            .clone();

        assert!(matches!(effect, Effect::PollResult(_)));
        assert_eq!(
            lifelines.effects(0).unwrap().get(LifelineKind::AudiencePoll),
            Some(&effect)
        );
        assert!(!lifelines.effects(1).unwrap().is_used(LifelineKind::AudiencePoll));
        assert_eq!(lifelines.budget().remaining(LifelineKind::AudiencePoll), Some(0));
        assert_eq!(lifelines.budget().remaining(LifelineKind::PhoneFriend), Some(1));
    }

    #[test]
    fn test_use_lifeline_twice_on_same_question() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(enum_map! { _ => Allowance::Limited(3) }, 2);

        lifelines
            .use_lifeline(LifelineKind::PhoneFriend, 1, &record, &mut rng)
            .unwrap();
        let before = lifelines.clone();

        assert_eq!(
            lifelines.use_lifeline(LifelineKind::PhoneFriend, 1, &record, &mut rng),
            Err(Error::AlreadyUsed(LifelineKind::PhoneFriend))
        );
        assert_eq!(lifelines, before);
        assert_eq!(lifelines.budget().remaining(LifelineKind::PhoneFriend), Some(2));

        assert!(
            lifelines
                .use_lifeline(LifelineKind::PhoneFriend, 0, &record, &mut rng)
                .is_ok()
        );
    }

    #[test]
    fn test_exhausted_lifeline_on_next_question() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(EnumMap::default(), 2);

        lifelines
            .use_lifeline(LifelineKind::PhoneFriend, 0, &record, &mut rng)
            .unwrap();
        let before = lifelines.clone();

        assert_eq!(
            lifelines.use_lifeline(LifelineKind::PhoneFriend, 1, &record, &mut rng),
            Err(Error::Exhausted(LifelineKind::PhoneFriend))
        );
        assert_eq!(lifelines, before);
        assert!(!lifelines.effects(1).unwrap().is_used(LifelineKind::PhoneFriend));
    }

    #[test]
    fn test_used_takes_precedence_over_exhausted() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(EnumMap::default(), 1);

        lifelines
            .use_lifeline(LifelineKind::FiftyFifty, 0, &record, &mut rng)
            .unwrap();

        assert_eq!(
            lifelines.use_lifeline(LifelineKind::FiftyFifty, 0, &record, &mut rng),
            Err(Error::AlreadyUsed(LifelineKind::FiftyFifty))
        );
    }

    #[test]
    fn test_disabled_lifeline() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(
            enum_map! {
                LifelineKind::FiftyFifty => Allowance::Disabled,
                _ => Allowance::Limited(1),
            },
            1,
        );
        let before = lifelines.clone();

        assert_eq!(
            lifelines.use_lifeline(LifelineKind::FiftyFifty, 0, &record, &mut rng),
            Err(Error::Disabled(LifelineKind::FiftyFifty))
        );
        assert_eq!(lifelines, before);
    }

    #[test]
    fn test_unlimited_lifeline_never_runs_out() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(enum_map! { _ => Allowance::Unlimited }, 50);

        for index in 0..50 {
            lifelines
                .use_lifeline(LifelineKind::FiftyFifty, index, &record, &mut rng)
                .unwrap();
        }

        assert_eq!(lifelines.budget().remaining(LifelineKind::FiftyFifty), None);
    }

    #[test]
    fn test_not_applicable_to_free_text() {
        let record = QuestionRecord::fill_blank("Capital?", "Lima");
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(EnumMap::default(), 1);
        let before = lifelines.clone();

        assert_eq!(
            lifelines.use_lifeline(LifelineKind::AudiencePoll, 0, &record, &mut rng),
            Err(Error::NotApplicable(LifelineKind::AudiencePoll))
        );
        assert_eq!(
            lifelines.use_lifeline(LifelineKind::AudiencePoll, 3, &create_test_record(), &mut rng),
            Err(Error::NotApplicable(LifelineKind::AudiencePoll))
        );
        assert_eq!(lifelines, before);
    }

    #[test]
    fn test_hidden_options_view() {
        let record = create_test_record();
        let mut rng = Rng::with_seed(8);
        let mut lifelines = Lifelines::new(EnumMap::default(), 2);

        assert!(lifelines.effects(0).unwrap().hidden_options().is_empty());
        lifelines
            .use_lifeline(LifelineKind::FiftyFifty, 0, &record, &mut rng)
            .unwrap();

        assert_eq!(lifelines.effects(0).unwrap().hidden_options().len(), 2);
        assert!(lifelines.effects(1).unwrap().hidden_options().is_empty());
        assert!(lifelines.effects(2).is_none());
    }
}
