// Finalized quiz attempts and the leaderboard ordering rule.

use chrono::{DateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// A validated result that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResult {
    pub name: String,
    pub score: i64,
    pub date: DateTime<Utc>,
}

/// A persisted result. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub id: i64,
    pub name: String,
    pub score: i64,
    pub date: DateTime<Utc>,
}

/// Leaderboard order: higher score first, earlier submission wins a tie,
/// insertion order settles identical timestamps.
pub fn ranking_order(a: &QuizResult, b: &QuizResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.id.cmp(&b.id))
}

/// Fixed-width UTC rendering at full precision, so lexical order matches
/// chronological order and stored dates round-trip unchanged.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses any RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
