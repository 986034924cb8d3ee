// Headless end-to-end runs of the round engine: a scripted dictionary stands
// in for the network and ticks come from the runtime's virtual clock, so the
// whole game loop is exercised without a TTY, real timers, or HTTP.

use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

use chosung::engine::{Engine, Phase, Rejection, Resolution, RoundConfig, Submit, TickOutcome};
use chosung::hangul::{leading_consonant, CHOSEONG, SYLLABLE_BASE, TARGET_POOL};
use chosung::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use chosung::validator::{DictError, Dictionary, Validation, Validator, WordEntry, WordValidator};

fn config() -> RoundConfig {
    RoundConfig {
        round_secs: 5.0,
        break_ms: 1500,
        consonant_count: 2,
    }
}

fn entry(word: &str) -> WordEntry {
    WordEntry {
        word: word.to_string(),
        pos: "명사".to_string(),
        definition: "뜻풀이".to_string(),
    }
}

/// Compose a syllable word whose leading consonants match `targets`
/// (each target consonant + ㅏ, no trailing consonant).
fn word_for(targets: &[char]) -> String {
    targets
        .iter()
        .map(|t| {
            let idx = CHOSEONG.iter().position(|c| c == t).unwrap() as u32;
            char::from_u32(SYLLABLE_BASE + idx * 21 * 28).unwrap()
        })
        .collect()
}

/// Same as `word_for`, but the first syllable starts with a different
/// consonant, so the shape check must fail.
fn wrong_word_for(targets: &[char]) -> String {
    let other = TARGET_POOL
        .iter()
        .find(|c| **c != targets[0])
        .copied()
        .unwrap();
    let mut swapped = targets.to_vec();
    swapped[0] = other;
    word_for(&swapped)
}

/// Dictionary that replays a fixed script and counts lookups.
struct ScriptedDict {
    script: Mutex<Vec<Result<Option<WordEntry>, DictError>>>,
    calls: Mutex<u32>,
}

impl ScriptedDict {
    fn new(script: Vec<Result<Option<WordEntry>, DictError>>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Dictionary for ScriptedDict {
    fn lookup(&self, _word: &str) -> Result<Option<WordEntry>, DictError> {
        *self.calls.lock().unwrap() += 1;
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(None)
        } else {
            script.remove(0)
        }
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
fn accepted_word_scores_and_ends_the_round() {
    let mut engine = Engine::new(config());
    engine.start();
    let word = word_for(engine.targets());

    assert_eq!(engine.submit(&word), Submit::AwaitingValidation);
    let resolution = engine.resolve_validation(Validation::Valid(entry(&word)));

    assert!(matches!(resolution, Resolution::Scored { .. }));
    assert_eq!(engine.score(), 1);
    assert_eq!(*engine.phase(), Phase::Break);
}

#[test]
fn wrong_shape_is_rejected_before_any_dictionary_call() {
    let mut engine = Engine::new(config());
    engine.start();
    let wrong = wrong_word_for(engine.targets());

    assert_eq!(
        engine.submit(&wrong),
        Submit::Rejected(Rejection::WrongShape)
    );
    assert_eq!(*engine.phase(), Phase::Playing { pending: None });
    assert_eq!(engine.score(), 0);
    assert!(!engine.is_awaiting_validation());
}

#[test]
fn same_word_cannot_score_twice_in_a_session_round() {
    let dict = ScriptedDict::new(vec![Ok(Some(entry("가수")))]);
    let mut engine = Engine::new(config());
    engine.start();
    let word = word_for(engine.targets());

    // First submission goes through the validator and scores.
    assert_eq!(engine.submit(&word), Submit::AwaitingValidation);
    let outcome = Validator::with_policy(&dict, 2, Duration::ZERO).validate(&word);
    engine.resolve_validation(outcome);
    assert_eq!(engine.score(), 1);
    assert_eq!(dict.calls(), 1);

    // The round is over; resubmitting the same word is turned away at the
    // boundary with no second lookup.
    assert_eq!(engine.submit(&word), Submit::Ignored);
    assert_eq!(dict.calls(), 1);
    assert_eq!(engine.score(), 1);
}

#[test]
fn double_transient_failure_collapses_to_not_found() {
    let dict = ScriptedDict::new(vec![
        Err(DictError::MalformedBody),
        Err(DictError::MalformedBody),
    ]);
    let validator = Validator::with_policy(&dict, 2, Duration::ZERO);

    let mut engine = Engine::new(config());
    engine.start();
    let word = word_for(engine.targets());

    assert_eq!(engine.submit(&word), Submit::AwaitingValidation);
    let outcome = validator.validate(&word);
    assert_eq!(outcome, Validation::NotFound);
    assert_eq!(dict.calls(), 2);

    let resolution = engine.resolve_validation(outcome);
    assert!(matches!(resolution, Resolution::NotAWord { .. }));
    assert_eq!(*engine.phase(), Phase::Playing { pending: None });
    assert_eq!(engine.score(), 0);

    // The word was never marked used, so it can be retried.
    assert_eq!(engine.submit(&word), Submit::AwaitingValidation);
}

#[test]
fn timeout_with_no_accepted_word_ends_the_game_with_prior_score() {
    let mut engine = Engine::new(RoundConfig {
        round_secs: 5.0,
        break_ms: 0,
        consonant_count: 2,
    });
    engine.start();

    // Round one scores.
    let word = word_for(engine.targets());
    engine.submit(&word);
    engine.resolve_validation(Validation::Valid(entry(&word)));
    assert_eq!(engine.score(), 1);

    // Zero break: next tick starts round two.
    assert_eq!(engine.tick(), TickOutcome::NextRound);

    // Round two: the clock runs out with nothing accepted.
    tick_until_deadline(&mut engine);
    assert_eq!(*engine.phase(), Phase::Checking { pending: None });
    assert_eq!(
        engine.tick(),
        TickOutcome::GameOver { final_score: 1 },
        "final score must come from prior rounds only"
    );
    assert_eq!(*engine.phase(), Phase::GameOver);
}

#[test]
fn late_validation_at_the_deadline_decides_the_round() {
    // Acceptance arriving after the deadline still saves the round.
    let mut engine = Engine::new(config());
    engine.start();
    let word = word_for(engine.targets());
    engine.submit(&word);
    tick_until_deadline(&mut engine);

    assert_eq!(engine.tick(), TickOutcome::AwaitingOutcome);
    let resolution = engine.resolve_validation(Validation::Valid(entry(&word)));
    assert!(matches!(resolution, Resolution::Scored { .. }));
    assert_eq!(*engine.phase(), Phase::Break);

    // Rejection after the deadline ends the game instead.
    let mut engine = Engine::new(config());
    engine.start();
    let word = word_for(engine.targets());
    engine.submit(&word);
    tick_until_deadline(&mut engine);

    let resolution = engine.resolve_validation(Validation::NotFound);
    assert!(matches!(resolution, Resolution::GameOver { .. }));
    assert_eq!(*engine.phase(), Phase::GameOver);
}

#[test]
fn quit_discards_a_late_outcome_after_game_over() {
    let mut engine = Engine::new(config());
    engine.start();
    let word = word_for(engine.targets());
    engine.submit(&word);

    assert_eq!(engine.quit(), Some(0));
    assert_eq!(
        engine.resolve_validation(Validation::Valid(entry(&word))),
        Resolution::Discarded
    );
    assert_eq!(engine.score(), 0);
    assert_eq!(*engine.phase(), Phase::GameOver);
}

#[test]
fn runner_drives_a_full_session_from_channel_events() {
    let mut engine = Engine::new(RoundConfig {
        round_secs: 0.2,
        break_ms: 0,
        consonant_count: 2,
    });
    engine.start();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(1));
    let runner = Runner::new(es, ticker);

    // A validation outcome is queued as if a worker thread had posted it.
    let word = word_for(engine.targets());
    assert_eq!(engine.submit(&word), Submit::AwaitingValidation);
    tx.send(GameEvent::Validation(Validation::NotFound)).unwrap();

    let mut game_over = None;
    for _ in 0..200u32 {
        match runner.step() {
            GameEvent::Tick => {
                if let TickOutcome::GameOver { final_score } = engine.tick() {
                    game_over = Some(final_score);
                    break;
                }
            }
            GameEvent::Validation(outcome) => {
                engine.resolve_validation(outcome);
            }
            _ => {}
        }
    }

    assert_eq!(game_over, Some(0), "round should time out with no score");
    assert_eq!(*engine.phase(), Phase::GameOver);
}

#[test]
fn targets_always_come_from_the_draw_pool() {
    for _ in 0..20 {
        let mut engine = Engine::new(config());
        engine.start();
        assert_eq!(engine.targets().len(), 2);
        for c in engine.targets() {
            assert!(TARGET_POOL.contains(c));
            // Every target can be extracted back from a composed syllable.
            let word = word_for(&[*c]);
            assert_eq!(leading_consonant(word.chars().next().unwrap()), Some(*c));
        }
    }
}
