//! Dictionary word checks with a bounded retry policy.
//!
//! The engine only ever sees one of three outcomes per submission; transport
//! failures are retried here and collapsed to [`Validation::NotFound`] once
//! the attempt budget is spent, so gameplay stays decisive even when the
//! upstream dictionary is degraded.

use std::thread;
use std::time::Duration;

use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::hangul;

/// Lookup attempts per submission before failing closed.
pub const MAX_ATTEMPTS: u32 = 2;
/// Per-attempt request timeout.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause between attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// National Institute of Korean Language, standard dictionary search.
pub const STDICT_ENDPOINT: &str = "https://stdict.korean.go.kr/api/search.do";

/// A confirmed dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    /// Canonical headword (may differ from the typed form).
    pub word: String,
    /// Part of speech, empty when the dictionary omits it.
    pub pos: String,
    /// Gloss with markup stripped; never empty for a confirmed entry.
    pub definition: String,
}

/// Outcome of validating one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(WordEntry),
    NotFound,
    TransientError,
}

#[derive(Debug, Error)]
pub enum DictError {
    #[error("dictionary request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("dictionary returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed dictionary response")]
    MalformedBody,
}

/// One raw dictionary lookup, no retry.
pub trait Dictionary {
    fn lookup(&self, word: &str) -> Result<Option<WordEntry>, DictError>;
}

impl<D: Dictionary + ?Sized> Dictionary for &D {
    fn lookup(&self, word: &str) -> Result<Option<WordEntry>, DictError> {
        (**self).lookup(word)
    }
}

/// HTTP client for the standard dictionary's exact-match search.
pub struct StdictClient {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl StdictClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, DictError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(ATTEMPT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }
}

impl Dictionary for StdictClient {
    fn lookup(&self, word: &str) -> Result<Option<WordEntry>, DictError> {
        let response = self
            .client
            .get(STDICT_ENDPOINT)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", word),
                ("req_type", "json"),
                ("type_search", "search"),
                ("method", "exact"),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DictError::Status(status));
        }

        // The upstream occasionally serves maintenance HTML with a 200.
        let body: Value = serde_json::from_str(&response.text()?)
            .map_err(|_| DictError::MalformedBody)?;

        Ok(parse_entry(&body, word))
    }
}

/// Pull the first entry out of a search payload.
///
/// `channel.item` may be an array or a single object, and the same goes for
/// each item's `sense` list. A hit with a blank definition does not count as
/// a confirmed entry.
fn parse_entry(body: &Value, query: &str) -> Option<WordEntry> {
    let items = &body["channel"]["item"];
    let first = match items {
        Value::Array(list) => list.first()?,
        Value::Object(_) => items,
        _ => return None,
    };

    let sense = &first["sense"];
    let best = match sense {
        Value::Array(list) => list.first().unwrap_or(&Value::Null),
        other => other,
    };

    let definition = strip_markup(best["definition"].as_str().unwrap_or(""));
    if definition.is_empty() {
        return None;
    }

    let pos = best["pos"]
        .as_str()
        .or_else(|| first["pos"].as_str())
        .unwrap_or("")
        .to_string();
    let word = first["word"]
        .as_str()
        .map(|w| w.replace('^', ""))
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| query.to_string());

    Some(WordEntry {
        word,
        pos,
        definition,
    })
}

/// Strip `<...>` markup, turn `^` syllable separators into spaces, trim.
fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            '^' if !in_tag => out.push(' '),
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Seam the engine driver and tests program against.
pub trait WordValidator: Send + Sync {
    fn validate(&self, word: &str) -> Validation;
}

/// Retry wrapper around a [`Dictionary`].
pub struct Validator<D> {
    dict: D,
    attempts: u32,
    backoff: Duration,
}

impl<D: Dictionary> Validator<D> {
    pub fn new(dict: D) -> Self {
        Self::with_policy(dict, MAX_ATTEMPTS, RETRY_BACKOFF)
    }

    /// Custom attempt budget and backoff; tests shrink both.
    pub fn with_policy(dict: D, attempts: u32, backoff: Duration) -> Self {
        Self {
            dict,
            attempts: attempts.max(1),
            backoff,
        }
    }
}

impl<D: Dictionary + Send + Sync> WordValidator for Validator<D> {
    fn validate(&self, word: &str) -> Validation {
        if word.is_empty() || !word.chars().all(hangul::is_syllable) {
            return Validation::NotFound;
        }

        for attempt in 1..=self.attempts {
            match self.dict.lookup(word) {
                Ok(Some(entry)) => return Validation::Valid(entry),
                Ok(None) => return Validation::NotFound,
                Err(err) => {
                    warn!(
                        "dictionary lookup for {:?} failed (attempt {attempt}/{}): {err}",
                        word, self.attempts
                    );
                    if attempt < self.attempts {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }

        // Attempt budget spent: fail closed, never surface the error.
        Validation::NotFound
    }
}

/// Accepts any well-formed syllable word without a dictionary.
///
/// Used when no API key is configured and the player opted into offline play.
pub struct OfflineValidator;

impl WordValidator for OfflineValidator {
    fn validate(&self, word: &str) -> Validation {
        if word.is_empty() || !word.chars().all(hangul::is_syllable) {
            return Validation::NotFound;
        }
        Validation::Valid(WordEntry {
            word: word.to_string(),
            pos: String::new(),
            definition: "오프라인 모드: 사전 확인을 건너뛰었습니다.".to_string(),
        })
    }
}
