use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{Clock, ResultStore};
use crate::domain::results::{NewResult, QuizResult, parse_date, ranking_order};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

impl FixedClock {
    pub(crate) fn at(raw: &str) -> Self {
        Self(parse_date(raw).expect("fixed clock needs an RFC 3339 timestamp"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub insert: bool,
    pub list: bool,
    pub clear: bool,
}

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<QuizResult>,
}

// In-memory result store that mirrors the SQLite ordering rules.
#[derive(Clone)]
pub(crate) struct RecordingStore {
    table: Arc<Mutex<Table>>,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(Table::default())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn get_test_result(&self, id: i64) -> Option<QuizResult> {
        let guard = self.table.lock().expect("results mutex poisoned");
        guard.rows.iter().find(|row| row.id == id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        let guard = self.table.lock().expect("results mutex poisoned");
        guard.rows.len()
    }
}

#[async_trait]
impl ResultStore for RecordingStore {
    async fn insert(&self, result: NewResult) -> Result<i64, String> {
        if self.failures.insert {
            return Err("insert failed".to_string());
        }

        let mut guard = self.table.lock().expect("results mutex poisoned");
        guard.next_id += 1;
        let id = guard.next_id;
        guard.rows.push(QuizResult {
            id,
            name: result.name,
            score: result.score,
            date: result.date,
        });
        Ok(id)
    }

    async fn list_ranked(&self) -> Result<Vec<QuizResult>, String> {
        if self.failures.list {
            return Err("list failed".to_string());
        }

        let guard = self.table.lock().expect("results mutex poisoned");
        let mut rows = guard.rows.clone();
        rows.sort_by(ranking_order);
        Ok(rows)
    }

    async fn clear(&self) -> Result<u64, String> {
        if self.failures.clear {
            return Err("clear failed".to_string());
        }

        let mut guard = self.table.lock().expect("results mutex poisoned");
        let cleared = guard.rows.len() as u64;
        guard.rows.clear();
        Ok(cleared)
    }
}
