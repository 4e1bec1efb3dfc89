//! Shared error types for the services crate.

use thiserror::Error;

use quiz_api::ApiError;
use quiz_core::model::{QuestionId, QuestionValidationError, QuizTitleError};

/// Errors emitted by the learner quiz session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz has no questions")]
    Empty,
    #[error("quiz already submitted")]
    AlreadyCompleted,
    #[error("{} question(s) still unanswered", unanswered.len())]
    Incomplete { unanswered: Vec<usize> },
    #[error("question {index} has not been persisted and cannot be submitted")]
    UnpersistedQuestion { index: usize },
    #[error("a submission is still in flight")]
    SubmissionInFlight,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by quiz authoring before or outside the save saga.
///
/// A saga that halts part-way is not an error here; it is reported through
/// `SagaReport`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthoringError {
    #[error("no changes to save")]
    NoChanges,
    #[error("no pending question at position {0}")]
    NoSuchPending(usize),
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error(transparent)]
    Title(#[from] QuizTitleError),
    #[error(transparent)]
    Question(#[from] QuestionValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by the identity store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("credentials rejected; signed out")]
    Unauthorized(#[source] ApiError),
    #[error("current user unavailable after {attempts} attempt(s)")]
    Unavailable {
        attempts: u32,
        #[source]
        source: ApiError,
    },
}

/// Errors emitted while assembling app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Api(#[from] ApiError),
}
