//! Hangul syllable decomposition for initial-consonant (chosung) matching.

use rand::seq::SliceRandom;

/// First codepoint of the precomposed syllable block (가).
pub const SYLLABLE_BASE: u32 = 0xAC00;
/// Last codepoint of the precomposed syllable block (힣).
pub const SYLLABLE_LAST: u32 = 0xD7A3;

/// Vowel (jungseong) count per leading consonant.
const JUNGSEONG_COUNT: u32 = 21;
/// Trailing consonant (jongseong) count per vowel, "no trailing" included.
const JONGSEONG_COUNT: u32 = 28;

/// Compatibility jamo for all 19 leading consonants, in choseong index order.
#[rustfmt::skip]
pub const CHOSEONG: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ',
    'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// Draw pool for round targets. Doubled consonants stay out of the pool so
/// every round has common words, but they are still recognized by
/// [`leading_consonant`] when a typed word contains one.
#[rustfmt::skip]
pub const TARGET_POOL: [char; 14] = [
    'ㄱ', 'ㄴ', 'ㄷ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅅ',
    'ㅇ', 'ㅈ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// Whether `c` is a precomposed Hangul syllable.
pub fn is_syllable(c: char) -> bool {
    (SYLLABLE_BASE..=SYLLABLE_LAST).contains(&(c as u32))
}

/// Leading consonant of a precomposed syllable.
///
/// Returns `None` for any character outside the syllable block; such
/// characters have no leading consonant and can never match a target.
pub fn leading_consonant(c: char) -> Option<char> {
    let code = c as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
        return None;
    }
    let idx = (code - SYLLABLE_BASE) / (JUNGSEONG_COUNT * JONGSEONG_COUNT);
    Some(CHOSEONG[idx as usize])
}

/// Positional chosung match: every syllable of `word` must start with the
/// corresponding target consonant, and the lengths must agree exactly.
pub fn matches_chosung(word: &str, targets: &[char]) -> bool {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() != targets.len() {
        return false;
    }
    chars
        .iter()
        .zip(targets.iter())
        .all(|(c, t)| leading_consonant(*c) == Some(*t))
}

/// Draw `n` target consonants, each independently and uniformly from the pool.
pub fn random_targets(n: usize) -> Vec<char> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| *TARGET_POOL.choose(&mut rng).unwrap_or(&'ㄱ'))
        .collect()
}
