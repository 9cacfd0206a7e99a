use crate::domain::errors::ResultError;
use crate::interface_adapters::http::{ApiError, store_error, validation_error};
use crate::interface_adapters::protocol::{
    ClearResultsResponse, QuizStatusResponse, ResultDto, SetQuizStatusRequest,
    SetQuizStatusResponse, SubmitResultRequest, SubmitResultResponse,
};
use crate::interface_adapters::state::{AppState, SqliteResultStore, SystemClock};
use crate::use_cases::{ClearResultsUseCase, ListResultsUseCase, SubmitResultUseCase};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use tracing::{debug, error, info};

// Liveness text for humans poking the server.
pub async fn root() -> &'static str {
    "Quiz coordinator is running. Use /results and /quiz-status, or connect to /ws."
}

// Handler for reading the quiz-active flag.
pub async fn get_quiz_status(State(state): State<AppState>) -> Json<QuizStatusResponse> {
    Json(QuizStatusResponse {
        active: state.registry.is_active(),
    })
}

// Handler for the admin toggle.
pub async fn set_quiz_status(
    State(state): State<AppState>,
    payload: Result<Json<SetQuizStatusRequest>, JsonRejection>,
) -> Result<Json<SetQuizStatusResponse>, ApiError> {
    let Json(payload) = payload.map_err(map_json_rejection)?;
    let Some(Value::Bool(active)) = payload.active else {
        return Err(validation_error(
            StatusCode::BAD_REQUEST,
            "active must be a boolean",
        ));
    };

    let active = state.registry.set_active(active);
    info!(active, "quiz status updated");

    Ok(Json(SetQuizStatusResponse {
        success: true,
        active,
    }))
}

// Handler for persisting a finished attempt.
pub async fn submit_result(
    State(state): State<AppState>,
    payload: Result<Json<SubmitResultRequest>, JsonRejection>,
) -> Result<Json<SubmitResultResponse>, ApiError> {
    let Json(payload) = payload.map_err(map_json_rejection)?;
    let use_case = SubmitResultUseCase {
        clock: SystemClock,
        store: SqliteResultStore {
            db: state.db.clone(),
        },
        quiz_open: state
            .enforce_active
            .then(|| state.registry.is_active()),
    };

    let id = use_case.execute(payload).await.map_err(map_result_error)?;
    info!(id, "result saved");

    Ok(Json(SubmitResultResponse {
        success: true,
        message: "Result saved".to_string(),
        id,
    }))
}

// Handler for the ranked leaderboard.
pub async fn list_results(State(state): State<AppState>) -> Result<Json<Vec<ResultDto>>, ApiError> {
    let use_case = ListResultsUseCase {
        store: SqliteResultStore {
            db: state.db.clone(),
        },
    };

    let results = use_case.execute().await.map_err(map_result_error)?;
    Ok(Json(results.into_iter().map(ResultDto::from).collect()))
}

// Handler for the admin "clear all" action.
pub async fn clear_results(
    State(state): State<AppState>,
) -> Result<Json<ClearResultsResponse>, ApiError> {
    let use_case = ClearResultsUseCase {
        store: SqliteResultStore {
            db: state.db.clone(),
        },
    };

    let cleared = use_case.execute().await.map_err(map_result_error)?;
    info!(cleared, "results cleared");

    Ok(Json(ClearResultsResponse {
        success: true,
        message: "All results cleared".to_string(),
        cleared,
    }))
}

// Malformed bodies answer in the same envelope as field validation.
fn map_json_rejection(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection.body_text(), "rejected request body");
    validation_error(
        StatusCode::BAD_REQUEST,
        "request body must be a JSON object",
    )
}

fn map_result_error(err: ResultError) -> ApiError {
    match err {
        ResultError::MissingName => validation_error(StatusCode::BAD_REQUEST, "name is required"),
        ResultError::InvalidName => {
            validation_error(StatusCode::BAD_REQUEST, "name must be a string")
        }
        ResultError::MissingScore => {
            validation_error(StatusCode::BAD_REQUEST, "score is required")
        }
        ResultError::InvalidScore => validation_error(
            StatusCode::BAD_REQUEST,
            "score must be a non-negative whole number",
        ),
        ResultError::InvalidDate => validation_error(
            StatusCode::BAD_REQUEST,
            "date must be an RFC 3339 timestamp",
        ),
        ResultError::QuizInactive => {
            validation_error(StatusCode::CONFLICT, "quiz is not active")
        }
        ResultError::StorageFailure(e) => {
            error!(error = %e, "result store failure");
            store_error(e)
        }
    }
}
