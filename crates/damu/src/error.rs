use crate::protocol::{BloodType, TaskKind, TaskStatus};
use thiserror::Error;

/// A submission or identity that fails field rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required and must be a non-empty string")]
    Blank(&'static str),
    #[error("unknown blood type: {0}")]
    UnknownBloodType(String),
    #[error("unknown donation type: {0}")]
    UnknownDonationType(String),
    #[error("units must be a positive integer")]
    InvalidUnits,
    #[error("duplicate inventory entry for {0}")]
    DuplicateBloodType(BloodType),
    #[error("malformed request body: {0}")]
    Malformed(String),
    #[error("rejected by server: {0}")]
    Rejected(String),
}

/// A task or inventory list could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{endpoint} unreachable: {reason}")]
    Transport { endpoint: String, reason: String },
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("{endpoint} returned an unreadable body: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("task source unavailable: {0}")]
    Unavailable(String),
}

/// Text generation (thank-you notes, report analysis) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    NotConfigured,
    #[error("nothing to analyze")]
    EmptyInput,
    #[error("text generation failed: {0}")]
    Upstream(String),
    #[error("model returned no text")]
    EmptyResponse,
    #[error("model returned a malformed report: {0}")]
    Malformed(String),
}

/// A requested status change was refused. The store is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no active task with id {0}")]
    UnknownTask(String),
    #[error("task {0} is not on the displayed list")]
    NotDisplayed(String),
    #[error("task {0} is already in the store")]
    Duplicate(String),
    #[error("task {id} cannot move from {from} to {to}")]
    Illegal {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// A task record whose fields contradict each other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTask {
    #[error("task {id}: details do not describe a {kind}: {reason}")]
    Details {
        id: String,
        kind: TaskKind,
        reason: String,
    },
    #[error("task {0}: completed without completedAtMs")]
    MissingCompletion(String),
    #[error("task {id}: status {status} must not carry completedAtMs")]
    UnexpectedCompletion { id: String, status: TaskStatus },
}

/// Submitting a donation or blood request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
