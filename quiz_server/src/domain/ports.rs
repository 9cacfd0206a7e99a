use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::results::{NewResult, QuizResult};

// Port for durable result storage used by the result use cases.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn insert(&self, result: NewResult) -> Result<i64, String>;
    // Rows must come back in leaderboard order (see `results::ranking_order`).
    async fn list_ranked(&self) -> Result<Vec<QuizResult>, String>;
    async fn clear(&self) -> Result<u64, String>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
