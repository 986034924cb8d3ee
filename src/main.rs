pub mod app_dirs;
pub mod config;
pub mod effects;
pub mod engine;
pub mod hangul;
pub mod runtime;
pub mod scores;
pub mod ui;
pub mod util;
pub mod validator;

use crate::{
    config::{Config, ConfigStore, FileConfigStore, Preset},
    effects::{Effects, ImpactKind},
    engine::{Engine, Phase, Rejection, Resolution, Submit, TickOutcome, TICK_MS},
    runtime::{CrosstermEventSource, GameEvent, GameEventSource},
    scores::{RankEntry, ScoreDb, SubmitReceipt, LEADERBOARD_SIZE},
    validator::{
        OfflineValidator, StdictClient, Validation, Validator, WordEntry, WordValidator,
    },
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{debug, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc::{RecvTimeoutError, Sender},
    sync::Arc,
    thread,
    time::Duration,
};

/// Session word history shown next to the play area.
const HISTORY_LIMIT: usize = 60;

/// korean initial-consonant word game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type real Korean words matching the target initial consonants before the round timer runs out. Words are checked against the standard dictionary; scores land on a local ranking board."
)]
pub struct Cli {
    /// difficulty preset to start from
    #[clap(short = 'P', long, value_enum)]
    preset: Option<Preset>,

    /// seconds per round
    #[clap(short = 's', long)]
    round_secs: Option<f64>,

    /// pause between rounds in milliseconds
    #[clap(long)]
    break_ms: Option<u64>,

    /// number of target consonants per round
    #[clap(short = 'c', long)]
    consonants: Option<usize>,

    /// player name recorded on the ranking board
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// dictionary API key (falls back to $DICTIONARY_API_KEY)
    #[clap(long)]
    api_key: Option<String>,

    /// accept any well-formed word without a dictionary lookup
    #[clap(long)]
    offline: bool,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Layer preset and flag overrides on top of the persisted config.
    fn effective_config(&self, mut config: Config) -> Config {
        if let Some(preset) = self.preset {
            config.apply_preset(preset);
        }
        if let Some(secs) = self.round_secs {
            config.round_secs = secs;
        }
        if let Some(break_ms) = self.break_ms {
            config.break_ms = break_ms;
        }
        if let Some(consonants) = self.consonants {
            config.consonant_count = consonants;
        }
        if let Some(name) = &self.name {
            config.player_name = name.clone();
        }
        config
    }
}

/// One entry of the session word history.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub word: String,
    pub kind: ImpactKind,
    pub entry: Option<WordEntry>,
}

impl HistoryItem {
    fn rejected(word: &str, kind: ImpactKind) -> Self {
        Self {
            word: word.to_string(),
            kind,
            entry: None,
        }
    }
}

pub struct App {
    pub config: Config,
    pub engine: Engine,
    pub input: String,
    pub effects: Effects,
    pub history: Vec<HistoryItem>,
    pub ranking: Vec<RankEntry>,
    pub last_entry: Option<WordEntry>,
    pub final_score: Option<u32>,
    validator: Arc<dyn WordValidator>,
    scores: Option<ScoreDb>,
    events: Sender<GameEvent>,
    score_submitted: bool,
}

impl App {
    pub fn new(
        config: Config,
        validator: Arc<dyn WordValidator>,
        scores: Option<ScoreDb>,
        events: Sender<GameEvent>,
    ) -> Self {
        let mut app = Self {
            engine: Engine::new(config.round_config()),
            input: String::new(),
            effects: Effects::new(),
            history: Vec::new(),
            ranking: Vec::new(),
            last_entry: None,
            final_score: None,
            validator,
            scores,
            events,
            score_submitted: false,
            config,
        };
        app.refresh_ranking();
        app
    }

    /// Fresh session: new engine, cleared per-session state.
    pub fn start_game(&mut self) {
        self.engine = Engine::new(self.config.round_config());
        self.engine.start();
        self.input.clear();
        self.history.clear();
        self.effects.clear();
        self.last_entry = None;
        self.final_score = None;
        self.score_submitted = false;
    }

    pub fn on_tick(&mut self) {
        self.effects.advance(TICK_MS);
        match self.engine.tick() {
            TickOutcome::GameOver { final_score } => {
                self.effects
                    .flash("💔 정답을 맞추지 못했습니다!", ImpactKind::NotAWord);
                self.finalize(final_score);
            }
            TickOutcome::NextRound => {
                self.last_entry = None;
            }
            _ => {}
        }
    }

    /// Returns true when the app should exit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        let phase = self.engine.phase().clone();
        match phase {
            Phase::Idle => match key.code {
                KeyCode::Enter => {
                    self.start_game();
                    false
                }
                KeyCode::Esc => true,
                _ => false,
            },
            Phase::GameOver => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => {
                    self.start_game();
                    false
                }
                KeyCode::Esc => true,
                _ => false,
            },
            Phase::Playing { .. } | Phase::Checking { .. } | Phase::Break => match key.code {
                KeyCode::Esc => {
                    self.quit_game();
                    false
                }
                KeyCode::Enter => {
                    self.submit_input();
                    false
                }
                KeyCode::Backspace => {
                    self.input.pop();
                    false
                }
                KeyCode::Char(c) => {
                    if !key.modifiers.contains(KeyModifiers::CONTROL) && self.can_type() {
                        self.input.push(c);
                    }
                    false
                }
                _ => false,
            },
        }
    }

    pub fn submit_input(&mut self) {
        let word = self.input.trim().to_string();
        match self.engine.submit(&word) {
            Submit::Rejected(Rejection::WrongShape) => {
                self.input.clear();
                self.record_rejection(&word, ImpactKind::WrongShape);
            }
            Submit::Rejected(Rejection::Duplicate) => {
                self.input.clear();
                self.record_rejection(&word, ImpactKind::Duplicate);
            }
            Submit::AwaitingValidation => {
                self.input.clear();
                self.dispatch_validation(word);
            }
            // Keep the typed text; nothing was consumed.
            Submit::Ignored => {}
        }
    }

    pub fn on_validation(&mut self, outcome: Validation) {
        match self.engine.resolve_validation(outcome) {
            Resolution::Scored { word, entry } => {
                self.effects.spawn(&word, ImpactKind::Correct);
                self.history.insert(
                    0,
                    HistoryItem {
                        word,
                        kind: ImpactKind::Correct,
                        entry: Some(entry.clone()),
                    },
                );
                self.history.truncate(HISTORY_LIMIT);
                self.last_entry = Some(entry);
            }
            Resolution::NotAWord { word } => {
                self.record_rejection(&word, ImpactKind::NotAWord);
            }
            Resolution::GameOver { word, final_score } => {
                if let Some(word) = word {
                    self.record_rejection(&word, ImpactKind::NotAWord);
                }
                self.effects
                    .flash("💔 정답을 맞추지 못했습니다!", ImpactKind::NotAWord);
                self.finalize(final_score);
            }
            Resolution::Discarded => {}
        }
    }

    /// Manual game end from the play or break screen.
    pub fn quit_game(&mut self) {
        if let Some(score) = self.engine.quit() {
            self.finalize(score);
        }
    }

    fn can_type(&self) -> bool {
        matches!(self.engine.phase(), Phase::Playing { pending: None })
    }

    fn record_rejection(&mut self, word: &str, kind: ImpactKind) {
        self.effects.spawn(word, kind);
        self.history.insert(0, HistoryItem::rejected(word, kind));
        self.history.truncate(HISTORY_LIMIT);
    }

    fn dispatch_validation(&self, word: String) {
        let validator = Arc::clone(&self.validator);
        let tx = self.events.clone();
        thread::spawn(move || {
            let outcome = validator.validate(&word);
            if tx.send(GameEvent::Validation(outcome)).is_err() {
                debug!("validation outcome dropped: event channel closed");
            }
        });
    }

    /// Record the final score once per session; reporting failures only log.
    fn finalize(&mut self, final_score: u32) {
        self.final_score = Some(final_score);
        if self.score_submitted {
            return;
        }
        self.score_submitted = true;

        if let Some(db) = &self.scores {
            match db.submit_score(&self.config.player_name, final_score) {
                Ok(SubmitReceipt::PersonalBest) => debug!("new personal best: {final_score}"),
                Ok(SubmitReceipt::NotPersonalBest) => {
                    debug!("score {final_score} did not beat the stored best")
                }
                Err(err) => warn!("failed to record score: {err}"),
            }
            self.refresh_ranking();
        }
    }

    fn refresh_ranking(&mut self) {
        if let Some(db) = &self.scores {
            match db.leaderboard(LEADERBOARD_SIZE) {
                Ok(entries) => self.ranking = entries,
                Err(err) => warn!("failed to load the ranking board: {err}"),
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let config = cli.effective_config(store.load());
    if cli.save_config {
        if let Err(err) = store.save(&config) {
            warn!("failed to persist config: {err}");
        }
    }

    let validator: Arc<dyn WordValidator> = if cli.offline {
        Arc::new(OfflineValidator)
    } else {
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| std::env::var("DICTIONARY_API_KEY").ok());
        match api_key {
            Some(key) => match StdictClient::new(key) {
                Ok(client) => Arc::new(Validator::new(client)),
                Err(err) => {
                    let mut cmd = Cli::command();
                    cmd.error(
                        ErrorKind::Io,
                        format!("failed to set up the dictionary client: {err}"),
                    )
                    .exit();
                }
            },
            None => {
                let mut cmd = Cli::command();
                cmd.error(
                    ErrorKind::MissingRequiredArgument,
                    "a dictionary key is required: pass --api-key, set DICTIONARY_API_KEY, or play with --offline",
                )
                .exit();
            }
        }
    };

    let scores = match ScoreDb::new() {
        Ok(db) => Some(db),
        Err(err) => {
            warn!("ranking board unavailable: {err}");
            None
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    spawn_ticker(events.sender());

    let mut app = App::new(config, validator, scores, events.sender());
    let result = start_tui(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn spawn_ticker(tx: Sender<GameEvent>) {
    thread::spawn(move || loop {
        if tx.send(GameEvent::Tick).is_err() {
            break;
        }
        thread::sleep(Duration::from_millis(TICK_MS));
    });
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &CrosstermEventSource,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        let event = match events.recv_timeout(Duration::from_millis(TICK_MS * 4)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match event {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
            GameEvent::Validation(outcome) => app.on_validation(outcome),
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
