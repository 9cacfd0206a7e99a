// Domain-level errors for session and result workflows.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    MissingSessionId,
    MissingIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultError {
    MissingName,
    InvalidName,
    MissingScore,
    InvalidScore,
    InvalidDate,
    QuizInactive,
    StorageFailure(String),
}
