use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::sync::Arc;

use crate::domain::ports::{Clock, ResultStore};
use crate::domain::results::{NewResult, QuizResult, format_date, parse_date};
use crate::use_cases::{Gateway, SessionRegistry};

// Application state shared by HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    // Result persistence.
    pub db: SqlitePool,
    // Session membership and the quiz-active flag.
    pub registry: Arc<SessionRegistry>,
    // Per-session broadcast fan-out for realtime clients.
    pub gateway: Arc<Gateway>,
    // Refuse result submissions while the quiz is closed.
    pub enforce_active: bool,
}

// SQLite-backed result store.
#[derive(Clone)]
pub struct SqliteResultStore {
    pub db: SqlitePool,
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn insert(&self, result: NewResult) -> Result<i64, String> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO results (name, score, date)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&result.name)
        .bind(result.score)
        .bind(format_date(&result.date))
        .execute(&self.db)
        .await
        .map_err(|e| e.to_string())?;

        Ok(inserted.last_insert_rowid())
    }

    async fn list_ranked(&self) -> Result<Vec<QuizResult>, String> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, score, date
            FROM results
            ORDER BY score DESC, date ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| e.to_string())?;

        rows.iter().map(map_result_row).collect()
    }

    async fn clear(&self) -> Result<u64, String> {
        let deleted = sqlx::query("DELETE FROM results")
            .execute(&self.db)
            .await
            .map_err(|e| e.to_string())?;

        Ok(deleted.rows_affected())
    }
}

fn map_result_row(row: &SqliteRow) -> Result<QuizResult, String> {
    let id: i64 = row.try_get("id").map_err(|e| e.to_string())?;
    let raw_date: String = row.try_get("date").map_err(|e| e.to_string())?;
    let date = parse_date(&raw_date).ok_or_else(|| format!("result {id} has invalid date"))?;

    Ok(QuizResult {
        id,
        name: row.try_get("name").map_err(|e| e.to_string())?,
        score: row.try_get("score").map_err(|e| e.to_string())?,
        date,
    })
}

// System clock adapter used by the submit use case.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
