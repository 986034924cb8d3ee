//! Round engine for the chosung game.
//!
//! The engine owns every piece of session state and is driven purely by
//! events (`start`, `tick`, `submit`, `resolve_validation`, `quit`), so tests
//! run it against a virtual clock and a scripted validator. It never talks to
//! the dictionary itself; the driver dispatches the lookup and feeds the
//! outcome back in.

use std::collections::HashSet;

use log::debug;

use crate::hangul;
use crate::validator::{Validation, WordEntry};

/// Countdown step per tick. A tuning parameter, not a correctness invariant.
pub const TICK_MS: u64 = 50;

const TICK_SECS: f64 = TICK_MS as f64 / 1000.0;

/// Immutable per-session round parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundConfig {
    /// Seconds per round.
    pub round_secs: f64,
    /// Pause between rounds, in milliseconds.
    pub break_ms: u64,
    /// Number of target consonants per round.
    pub consonant_count: usize,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_secs: 5.0,
            break_ms: 1500,
            consonant_count: 2,
        }
    }
}

/// Session phase. The `pending` payload is the one in-flight validation;
/// keeping it inside the phase makes "at most one outstanding lookup"
/// structural instead of a flag to keep in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing { pending: Option<String> },
    Checking { pending: Option<String> },
    Break,
    GameOver,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::GameOver)
    }
}

/// Why a submission was turned away before any dictionary call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Leading consonants do not match the target.
    WrongShape,
    /// Already scored with this word in the current round.
    Duplicate,
}

/// Result of [`Engine::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    /// Rejected locally; phase unchanged.
    Rejected(Rejection),
    /// The word is pending; the caller must run the validator and feed the
    /// outcome to [`Engine::resolve_validation`].
    AwaitingValidation,
    /// Not accepting submissions right now (empty input, wrong phase, or a
    /// validation already in flight). Nothing is queued.
    Ignored,
}

/// Result of [`Engine::resolve_validation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Word accepted: score incremented, round over, break started.
    Scored { word: String, entry: WordEntry },
    /// Word rejected; the round continues with the time that is left.
    NotAWord { word: String },
    /// The deadline had already passed and the word was rejected.
    GameOver {
        word: Option<String>,
        final_score: u32,
    },
    /// Arrived after quit/game-over (or with nothing pending) and was dropped.
    Discarded,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to drive in this phase.
    Noop,
    /// A countdown advanced.
    Running,
    /// The round countdown hit zero; phase moved to `Checking`.
    Deadline,
    /// Waiting on an in-flight validation to settle the round.
    AwaitingOutcome,
    /// Deadline passed but the round had already scored; break started.
    RoundSurvived,
    /// Deadline passed with no accepted word.
    GameOver { final_score: u32 },
    /// Break finished; a fresh round just started.
    NextRound,
}

/// One play-through from start to game over.
#[derive(Debug)]
pub struct Engine {
    config: RoundConfig,
    phase: Phase,
    score: u32,
    targets: Vec<char>,
    time_remaining: f64,
    break_remaining_ms: u64,
    used_words: HashSet<String>,
    round_scored: bool,
}

impl Engine {
    pub fn new(config: RoundConfig) -> Self {
        Self {
            phase: Phase::Idle,
            score: 0,
            targets: Vec::new(),
            time_remaining: config.round_secs,
            break_remaining_ms: 0,
            used_words: HashSet::new(),
            round_scored: false,
            config,
        }
    }

    /// Begin the first round. Only valid from `Idle`; a finished session
    /// requires a fresh engine.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.start_round();
        true
    }

    /// Advance the cooperative clock by one step.
    pub fn tick(&mut self) -> TickOutcome {
        match &self.phase {
            Phase::Playing { .. } => {
                self.time_remaining = round2(self.time_remaining - TICK_SECS).max(0.0);
                if self.time_remaining > 0.0 {
                    return TickOutcome::Running;
                }
                let pending = self.take_pending();
                self.phase = Phase::Checking { pending };
                TickOutcome::Deadline
            }
            Phase::Checking { pending: Some(_) } => TickOutcome::AwaitingOutcome,
            Phase::Checking { pending: None } => {
                if self.round_scored {
                    self.enter_break();
                    TickOutcome::RoundSurvived
                } else {
                    self.phase = Phase::GameOver;
                    TickOutcome::GameOver {
                        final_score: self.score,
                    }
                }
            }
            Phase::Break => {
                self.break_remaining_ms = self.break_remaining_ms.saturating_sub(TICK_MS);
                if self.break_remaining_ms > 0 {
                    return TickOutcome::Running;
                }
                self.start_round();
                TickOutcome::NextRound
            }
            Phase::Idle | Phase::GameOver => TickOutcome::Noop,
        }
    }

    /// Process one typed word. Shape and duplicate checks run synchronously;
    /// everything else goes through the validator via the returned request.
    pub fn submit(&mut self, raw: &str) -> Submit {
        let word = raw.trim();
        if word.is_empty() {
            return Submit::Ignored;
        }
        match &self.phase {
            Phase::Playing { pending: None } => {}
            _ => return Submit::Ignored,
        }

        if !hangul::matches_chosung(word, &self.targets) {
            return Submit::Rejected(Rejection::WrongShape);
        }
        if self.used_words.contains(word) {
            return Submit::Rejected(Rejection::Duplicate);
        }

        self.phase = Phase::Playing {
            pending: Some(word.to_string()),
        };
        Submit::AwaitingValidation
    }

    /// Feed the outcome of the pending dictionary lookup back in.
    pub fn resolve_validation(&mut self, outcome: Validation) -> Resolution {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match (phase, outcome) {
            (Phase::Playing { pending: Some(word) }, Validation::Valid(entry)) => {
                self.accept(word.clone());
                Resolution::Scored { word, entry }
            }
            (Phase::Playing { pending: Some(word) }, _) => {
                // Not added to used words; the player may retry it.
                debug!("rejected {word:?}, round continues");
                self.phase = Phase::Playing { pending: None };
                Resolution::NotAWord { word }
            }
            (Phase::Checking { pending: Some(word) }, Validation::Valid(entry)) => {
                // Accepted right at the deadline: the round still counts.
                self.accept(word.clone());
                Resolution::Scored { word, entry }
            }
            (Phase::Checking { pending: Some(word) }, _) => {
                if self.round_scored {
                    self.enter_break();
                    Resolution::NotAWord { word }
                } else {
                    self.phase = Phase::GameOver;
                    Resolution::GameOver {
                        word: Some(word),
                        final_score: self.score,
                    }
                }
            }
            (phase, outcome) => {
                debug!("discarding validation outcome {outcome:?} in phase {phase:?}");
                self.phase = phase;
                Resolution::Discarded
            }
        }
    }

    /// Manual game end. Does not wait for an in-flight validation; a late
    /// outcome is discarded by [`Engine::resolve_validation`].
    pub fn quit(&mut self) -> Option<u32> {
        match self.phase {
            Phase::Idle | Phase::GameOver => None,
            _ => {
                self.phase = Phase::GameOver;
                Some(self.score)
            }
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn targets(&self) -> &[char] {
        &self.targets
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    pub fn round_scored(&self) -> bool {
        self.round_scored
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn is_awaiting_validation(&self) -> bool {
        matches!(
            self.phase,
            Phase::Playing { pending: Some(_) } | Phase::Checking { pending: Some(_) }
        )
    }

    fn accept(&mut self, word: String) {
        self.used_words.insert(word);
        self.score += 1;
        self.round_scored = true;
        self.enter_break();
    }

    fn start_round(&mut self) {
        self.targets = hangul::random_targets(self.config.consonant_count);
        self.time_remaining = self.config.round_secs;
        self.used_words.clear();
        self.round_scored = false;
        self.phase = Phase::Playing { pending: None };
    }

    fn enter_break(&mut self) {
        self.break_remaining_ms = self.config.break_ms;
        self.phase = Phase::Break;
    }

    fn take_pending(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Playing { pending } | Phase::Checking { pending } => pending,
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn seed_used_word(&mut self, word: &str) {
        self.used_words.insert(word.to_string());
    }

    #[cfg(test)]
    pub(crate) fn set_targets(&mut self, targets: &[char]) {
        self.targets = targets.to_vec();
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::WordEntry;
    use assert_matches::assert_matches;

    fn config() -> RoundConfig {
        RoundConfig {
            round_secs: 5.0,
            break_ms: 1500,
            consonant_count: 2,
        }
    }

    fn started(targets: &[char]) -> Engine {
        let mut engine = Engine::new(config());
        assert!(engine.start());
        engine.set_targets(targets);
        engine
    }

    fn entry(word: &str) -> WordEntry {
        WordEntry {
            word: word.to_string(),
            pos: "명사".to_string(),
            definition: "뜻풀이".to_string(),
        }
    }

    fn tick_until_deadline(engine: &mut Engine) {
        for _ in 0..10_000 {
            if engine.tick() == TickOutcome::Deadline {
                return;
            }
        }
        panic!("deadline never reached");
    }

    #[test]
    fn start_initializes_a_round() {
        let mut engine = Engine::new(config());
        assert_eq!(*engine.phase(), Phase::Idle);
        assert!(engine.start());

        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
        assert_eq!(engine.targets().len(), 2);
        assert_eq!(engine.time_remaining(), 5.0);
        assert_eq!(engine.score(), 0);
        assert!(!engine.round_scored());
    }

    #[test]
    fn start_is_only_valid_from_idle() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        assert!(!engine.start());
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
    }

    #[test]
    fn tick_decrements_only_while_playing() {
        let mut engine = Engine::new(config());
        assert_eq!(engine.tick(), TickOutcome::Noop);
        assert_eq!(engine.time_remaining(), 5.0);

        engine.start();
        assert_eq!(engine.tick(), TickOutcome::Running);
        assert_eq!(engine.time_remaining(), 4.95);
    }

    #[test]
    fn countdown_is_clamped_and_hits_checking_then_game_over() {
        let mut engine = started(&['ㄱ', 'ㅅ']);

        tick_until_deadline(&mut engine);
        assert_eq!(engine.time_remaining(), 0.0);
        assert_eq!(*engine.phase(), Phase::Checking { pending: None });

        // The terminal decision happens on the next tick, not mid-countdown.
        assert_eq!(engine.tick(), TickOutcome::GameOver { final_score: 0 });
        assert_eq!(*engine.phase(), Phase::GameOver);
    }

    #[test]
    fn accepted_word_ends_the_round_immediately() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.tick();
        let before = engine.time_remaining();
        assert!(before > 0.0);

        assert_eq!(engine.submit("가수"), Submit::AwaitingValidation);
        assert_matches!(
            engine.resolve_validation(Validation::Valid(entry("가수"))),
            Resolution::Scored { .. }
        );

        assert_eq!(*engine.phase(), Phase::Break);
        assert_eq!(engine.score(), 1);
        assert!(engine.round_scored());
    }

    #[test]
    fn wrong_shape_is_rejected_without_state_change() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        assert_eq!(engine.submit("감자"), Submit::Rejected(Rejection::WrongShape));
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn duplicate_is_rejected_before_any_validation() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.seed_used_word("가수");
        assert_eq!(engine.submit("가수"), Submit::Rejected(Rejection::Duplicate));
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
    }

    #[test]
    fn only_one_validation_in_flight() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        assert_eq!(engine.submit("가수"), Submit::AwaitingValidation);
        assert!(engine.is_awaiting_validation());
        assert_eq!(engine.submit("고수"), Submit::Ignored);
    }

    #[test]
    fn empty_and_blank_input_is_ignored() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        assert_eq!(engine.submit(""), Submit::Ignored);
        assert_eq!(engine.submit("   "), Submit::Ignored);
    }

    #[test]
    fn rejected_word_is_retryable() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        assert_eq!(engine.submit("가수"), Submit::AwaitingValidation);
        assert_matches!(
            engine.resolve_validation(Validation::NotFound),
            Resolution::NotAWord { word } if word == "가수"
        );
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
        assert_eq!(engine.score(), 0);

        // Not in the used set, so the same word may be tried again.
        assert_eq!(engine.submit("가수"), Submit::AwaitingValidation);
    }

    #[test]
    fn transient_error_is_treated_like_not_found() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        assert_matches!(
            engine.resolve_validation(Validation::TransientError),
            Resolution::NotAWord { .. }
        );
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
    }

    #[test]
    fn deadline_waits_for_in_flight_validation() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        tick_until_deadline(&mut engine);

        assert_eq!(
            *engine.phase(),
            Phase::Checking {
                pending: Some("가수".to_string())
            }
        );
        assert_eq!(engine.tick(), TickOutcome::AwaitingOutcome);
    }

    #[test]
    fn late_acceptance_survives_the_round() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        tick_until_deadline(&mut engine);

        assert_matches!(
            engine.resolve_validation(Validation::Valid(entry("가수"))),
            Resolution::Scored { .. }
        );
        assert_eq!(*engine.phase(), Phase::Break);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn late_rejection_ends_the_game() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        tick_until_deadline(&mut engine);

        assert_matches!(
            engine.resolve_validation(Validation::NotFound),
            Resolution::GameOver {
                word: Some(word),
                final_score: 0,
            } if word == "가수"
        );
        assert_eq!(*engine.phase(), Phase::GameOver);
    }

    #[test]
    fn break_counts_down_then_starts_a_fresh_round() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        engine.resolve_validation(Validation::Valid(entry("가수")));
        assert_eq!(*engine.phase(), Phase::Break);

        let mut outcome = TickOutcome::Running;
        for _ in 0..(1500 / TICK_MS) {
            outcome = engine.tick();
        }
        assert_eq!(outcome, TickOutcome::NextRound);
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
        assert_eq!(engine.time_remaining(), 5.0);
        assert!(!engine.round_scored());

        // Fresh round: the previously accepted word is usable again.
        engine.set_targets(&['ㄱ', 'ㅅ']);
        assert_eq!(engine.submit("가수"), Submit::AwaitingValidation);
    }

    #[test]
    fn zero_break_starts_the_next_round_on_the_next_tick() {
        let mut engine = Engine::new(RoundConfig {
            break_ms: 0,
            ..config()
        });
        engine.start();
        engine.set_targets(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        engine.resolve_validation(Validation::Valid(entry("가수")));

        assert_eq!(engine.tick(), TickOutcome::NextRound);
    }

    #[test]
    fn quit_finalizes_the_score_and_discards_pending_validation() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.submit("가수");
        engine.resolve_validation(Validation::Valid(entry("가수")));

        // Next round, another word in flight when the player quits.
        for _ in 0..=(1500 / TICK_MS) {
            engine.tick();
        }
        engine.set_targets(&['ㄱ', 'ㅅ']);
        engine.submit("고수");

        assert_eq!(engine.quit(), Some(1));
        assert_eq!(*engine.phase(), Phase::GameOver);

        // The in-flight outcome lands after the terminal phase and is dropped.
        assert_eq!(
            engine.resolve_validation(Validation::Valid(entry("고수"))),
            Resolution::Discarded
        );
        assert_eq!(engine.score(), 1);
        assert_eq!(*engine.phase(), Phase::GameOver);
    }

    #[test]
    fn quit_is_a_noop_when_idle_or_over() {
        let mut engine = Engine::new(config());
        assert_eq!(engine.quit(), None);

        engine.start();
        engine.quit();
        assert_eq!(engine.quit(), None);
    }

    #[test]
    fn resolution_without_pending_word_is_discarded() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        assert_eq!(
            engine.resolve_validation(Validation::NotFound),
            Resolution::Discarded
        );
        assert_eq!(*engine.phase(), Phase::Playing { pending: None });
    }

    #[test]
    fn game_over_ticks_do_nothing() {
        let mut engine = started(&['ㄱ', 'ㅅ']);
        engine.quit();
        assert_eq!(engine.tick(), TickOutcome::Noop);
        assert_eq!(engine.score(), 0);
    }
}
