// Wire protocol DTOs and conversions for the HTTP and realtime surfaces.

use crate::domain::SessionError;
use crate::domain::results::{QuizResult, format_date};
use crate::use_cases::{InboundEvent, RoomEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    // Direct reply to a join_room request.
    JoinAck(JoinAckDto),
    // Live number of non-admin participants in a session.
    ParticipantCountUpdate(ParticipantCountDto),
    // The admin started the quiz for a session.
    QuizStarted(QuizStartedDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom(JoinRoomPayload),
    LeaveRoom,
    StartQuiz(StartQuizPayload),
}

/// Missing fields deserialize as empty and are rejected by validation,
/// so the client still gets an ack instead of a dropped frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRoomPayload {
    #[serde(alias = "quizId")]
    pub session_id: String,
    #[serde(alias = "name")]
    pub identity: String,
    pub request_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartQuizPayload {
    #[serde(alias = "quizId")]
    pub session_id: String,
}

impl From<ClientMessage> for InboundEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::JoinRoom(payload) => InboundEvent::JoinRoom {
                session_id: payload.session_id,
                identity: payload.identity,
            },
            ClientMessage::LeaveRoom => InboundEvent::LeaveRoom,
            ClientMessage::StartQuiz(payload) => InboundEvent::StartQuiz {
                session_id: payload.session_id,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAckDto {
    pub request_id: Option<u64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JoinAckDto {
    pub fn from_outcome(request_id: Option<u64>, outcome: &Result<usize, SessionError>) -> Self {
        let message = match outcome {
            Ok(_) => None,
            Err(SessionError::MissingSessionId) => Some("sessionId is required".to_string()),
            Err(SessionError::MissingIdentity) => Some("identity is required".to_string()),
        };
        Self {
            request_id,
            success: outcome.is_ok(),
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCountDto {
    pub session_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStartedDto {
    pub session_id: String,
}

impl From<RoomEvent> for ServerMessage {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::ParticipantCount { session_id, count } => {
                ServerMessage::ParticipantCountUpdate(ParticipantCountDto {
                    session_id: session_id.to_string(),
                    count,
                })
            }
            RoomEvent::QuizStarted { session_id } => ServerMessage::QuizStarted(QuizStartedDto {
                session_id: session_id.to_string(),
            }),
        }
    }
}

// Request payload for result submission. Fields stay loose so validation can
// answer with a 400 and a message rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitResultRequest {
    pub name: Option<Value>,
    pub score: Option<Value>,
    pub date: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResultResponse {
    pub success: bool,
    pub message: String,
    pub id: i64,
}

// One leaderboard row.
#[derive(Debug, Serialize)]
pub struct ResultDto {
    pub id: i64,
    pub name: String,
    pub score: i64,
    pub date: String,
}

impl From<QuizResult> for ResultDto {
    fn from(result: QuizResult) -> Self {
        Self {
            id: result.id,
            date: format_date(&result.date),
            name: result.name,
            score: result.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearResultsResponse {
    pub success: bool,
    pub message: String,
    pub cleared: u64,
}

#[derive(Debug, Serialize)]
pub struct QuizStatusResponse {
    pub active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetQuizStatusRequest {
    // Loose so a non-boolean gets the same 400 as a missing field.
    pub active: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SetQuizStatusResponse {
    pub success: bool,
    pub active: bool,
}
