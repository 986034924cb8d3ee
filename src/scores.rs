//! Local score store and leaderboard queries.

use chrono::{DateTime, Local};
use itertools::Itertools;
use log::debug;
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// Entries shown on the ranking board.
pub const LEADERBOARD_SIZE: usize = 10;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub name: String,
    pub score: u32,
    pub recorded_at: DateTime<Local>,
}

/// Acknowledgment for a score submission. A non-record is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReceipt {
    PersonalBest,
    NotPersonalBest,
}

/// SQLite-backed score store.
#[derive(Debug)]
pub struct ScoreDb {
    conn: Connection,
}

impl ScoreDb {
    /// Open the store at the default state path.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("chosung_scores.db"));
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("failed to create state directory: {e}")),
                )
            })?;
        }
        Self::open(db_path)
    }

    /// Open the store at an explicit path (tests use a temp file).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // No uniqueness constraint on user_name: the store may legitimately
        // hold several rows per identity and readers dedup on the way out.
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_name TEXT NOT NULL,
                score INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_user ON scores(user_name)",
            [],
        )?;

        Ok(ScoreDb { conn })
    }

    /// Insert-or-keep-max for one identity. Keeps the stored best when the
    /// submitted score does not beat it.
    pub fn submit_score(&self, name: &str, score: u32) -> Result<SubmitReceipt> {
        let best: Option<u32> = self
            .conn
            .prepare("SELECT MAX(score) FROM scores WHERE user_name = ?1")?
            .query_row([name], |row| row.get(0))?;

        if let Some(best) = best {
            if best >= score {
                debug!("score {score} for {name} is not a personal record (best {best})");
                return Ok(SubmitReceipt::NotPersonalBest);
            }
        }

        self.conn.execute(
            "INSERT INTO scores (user_name, score, created_at) VALUES (?1, ?2, ?3)",
            params![name, score, Local::now().to_rfc3339()],
        )?;
        Ok(SubmitReceipt::PersonalBest)
    }

    /// Top entries, highest first, one per identity.
    pub fn leaderboard(&self, top_n: usize) -> Result<Vec<RankEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT user_name, score, created_at
            FROM scores
            ORDER BY score DESC, created_at ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let recorded: String = row.get(2)?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "created_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(RankEntry {
                name: row.get(0)?,
                score: row.get::<_, i64>(1)?.max(0) as u32,
                recorded_at,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(dedup_best(entries, top_n))
    }
}

/// Keep each name's best score, ordered highest first, truncated to `top_n`.
///
/// Client-side safety net: the store enforces no uniqueness, so duplicate
/// rows per identity (legacy or concurrent inserts) must collapse here.
pub fn dedup_best(mut entries: Vec<RankEntry>, top_n: usize) -> Vec<RankEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
        .into_iter()
        .unique_by(|e| e.name.clone())
        .take(top_n)
        .collect()
}
