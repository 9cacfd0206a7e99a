use serde_json::Value;

use crate::domain::errors::ResultError;
use crate::domain::ports::{Clock, ResultStore};
use crate::domain::results::{NewResult, QuizResult, parse_date};
use crate::interface_adapters::protocol::SubmitResultRequest;

// Submit use case with injected dependencies.
pub struct SubmitResultUseCase<C, S> {
    pub clock: C,
    pub store: S,
    // `Some(open)` gates submissions on the quiz flag; `None` accepts any time.
    pub quiz_open: Option<bool>,
}

impl<C, S> SubmitResultUseCase<C, S>
where
    C: Clock,
    S: ResultStore,
{
    pub async fn execute(&self, payload: SubmitResultRequest) -> Result<i64, ResultError> {
        let result = self.validate(payload)?;
        if self.quiz_open == Some(false) {
            return Err(ResultError::QuizInactive);
        }

        self.store
            .insert(result)
            .await
            .map_err(ResultError::StorageFailure)
    }

    fn validate(&self, payload: SubmitResultRequest) -> Result<NewResult, ResultError> {
        let name = validate_name(payload.name.as_ref())?;
        let score = validate_score(payload.score.as_ref())?;
        let date = match payload.date {
            None | Some(Value::Null) => self.clock.now(),
            Some(Value::String(raw)) if raw.trim().is_empty() => self.clock.now(),
            Some(Value::String(raw)) => parse_date(&raw).ok_or(ResultError::InvalidDate)?,
            Some(_) => return Err(ResultError::InvalidDate),
        };

        Ok(NewResult { name, score, date })
    }
}

fn validate_name(value: Option<&Value>) -> Result<String, ResultError> {
    match value {
        None | Some(Value::Null) => Err(ResultError::MissingName),
        Some(Value::String(name)) => {
            let name = name.trim();
            if name.is_empty() {
                Err(ResultError::MissingName)
            } else {
                Ok(name.to_string())
            }
        }
        Some(_) => Err(ResultError::InvalidName),
    }
}

// Scores are whole, non-negative numbers; `9.0` is accepted as `9`.
fn validate_score(value: Option<&Value>) -> Result<i64, ResultError> {
    let number = match value {
        None | Some(Value::Null) => return Err(ResultError::MissingScore),
        Some(Value::Number(number)) => number,
        Some(_) => return Err(ResultError::InvalidScore),
    };

    let score = match number.as_i64() {
        Some(score) => score,
        None => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => float as i64,
            _ => return Err(ResultError::InvalidScore),
        },
    };

    if score < 0 {
        return Err(ResultError::InvalidScore);
    }
    Ok(score)
}

// List use case returning results in leaderboard order.
pub struct ListResultsUseCase<S> {
    pub store: S,
}

impl<S> ListResultsUseCase<S>
where
    S: ResultStore,
{
    pub async fn execute(&self) -> Result<Vec<QuizResult>, ResultError> {
        self.store
            .list_ranked()
            .await
            .map_err(ResultError::StorageFailure)
    }
}

// Irreversibly removes every stored result.
pub struct ClearResultsUseCase<S> {
    pub store: S,
}

impl<S> ClearResultsUseCase<S>
where
    S: ResultStore,
{
    pub async fn execute(&self) -> Result<u64, ResultError> {
        self.store.clear().await.map_err(ResultError::StorageFailure)
    }
}
