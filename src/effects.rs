//! Short-lived visual feedback: floating impact labels and the status line.

use rand::Rng;

/// Lifetime of a floating impact label.
pub const IMPACT_TTL_MS: u64 = 900;
/// Lifetime of the transient status line.
pub const FEEDBACK_TTL_MS: u64 = 600;

/// How a submission landed, for labeling and coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactKind {
    Correct,
    WrongShape,
    Duplicate,
    NotAWord,
}

/// One floating label thrown across the play area.
#[derive(Debug, Clone)]
pub struct ImpactWord {
    pub text: String,
    pub kind: ImpactKind,
    /// Horizontal offset as a percentage of the play area width.
    pub x_pct: u16,
    age_ms: u64,
}

impl ImpactWord {
    fn new(text: String, kind: ImpactKind) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            text,
            kind,
            x_pct: rng.gen_range(10..70),
            age_ms: 0,
        }
    }
}

/// Transient per-submission effects, advanced by the game loop's ticks.
#[derive(Debug, Default)]
pub struct Effects {
    impacts: Vec<ImpactWord>,
    feedback: Option<(String, ImpactKind, u64)>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a submission outcome: spawns the floating label and, for
    /// rejections, the status-line message.
    pub fn spawn(&mut self, word: &str, kind: ImpactKind) {
        let text = match kind {
            ImpactKind::Correct => format!("+1 {word}"),
            ImpactKind::WrongShape => format!("✗ {word}"),
            ImpactKind::Duplicate => format!("↩ {word}"),
            ImpactKind::NotAWord => format!("{word}?"),
        };
        self.impacts.push(ImpactWord::new(text, kind));

        let message = match kind {
            ImpactKind::Correct => None,
            ImpactKind::WrongShape => Some("❌ 초성이 일치하지 않습니다!"),
            ImpactKind::Duplicate => Some("🔁 이미 입력한 단어입니다!"),
            ImpactKind::NotAWord => Some("📖 사전에 없는 단어입니다"),
        };
        if let Some(message) = message {
            self.flash(message, kind);
        }
    }

    /// Show a status-line message directly.
    pub fn flash(&mut self, message: &str, kind: ImpactKind) {
        self.feedback = Some((message.to_string(), kind, FEEDBACK_TTL_MS));
    }

    /// Age everything by `dt_ms`, dropping what has expired.
    pub fn advance(&mut self, dt_ms: u64) {
        for impact in &mut self.impacts {
            impact.age_ms += dt_ms;
        }
        self.impacts.retain(|i| i.age_ms < IMPACT_TTL_MS);

        if let Some((_, _, ttl)) = &mut self.feedback {
            *ttl = ttl.saturating_sub(dt_ms);
            if *ttl == 0 {
                self.feedback = None;
            }
        }
    }

    pub fn impacts(&self) -> &[ImpactWord] {
        &self.impacts
    }

    pub fn feedback(&self) -> Option<(&str, ImpactKind)> {
        self.feedback
            .as_ref()
            .map(|(message, kind, _)| (message.as_str(), *kind))
    }

    pub fn clear(&mut self) {
        self.impacts.clear();
        self.feedback = None;
    }
}
