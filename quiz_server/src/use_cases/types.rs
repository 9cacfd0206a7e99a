// Use-case level inputs/outputs for the realtime gateway.

use crate::domain::{Identity, SessionId};

/// Typed requests a connected client can make.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    JoinRoom {
        session_id: String,
        identity: String,
    },
    LeaveRoom,
    StartQuiz {
        session_id: String,
    },
}

/// Events fanned out to every connection bound to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    ParticipantCount { session_id: SessionId, count: usize },
    QuizStarted { session_id: SessionId },
}

/// The (session, identity) pair a connection is currently bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub session_id: SessionId,
    pub identity: Identity,
}

/// Result of a start-quiz request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { notified: usize },
    NotAdmin,
    UnknownSession,
}
