use async_trait::async_trait;
use quiz_core::model::{
    AttemptId, CurrentUser, LessonId, Question, QuestionId, Quiz, QuizAttempt, QuizHeader, QuizId,
    QuizResult, QuizSubmission, UserId, ValidatedQuestion,
};

use crate::error::ApiError;

/// Read and grade operations used by the learner session.
#[async_trait]
pub trait LearnerApi: Send + Sync {
    /// Fetch the quiz attached to a lesson.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the lesson has no quiz.
    async fn fetch_quiz(&self, lesson_id: LessonId) -> Result<Quiz, ApiError>;

    /// Submit answers for grading on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails; nothing is deduplicated here.
    async fn submit_quiz(
        &self,
        user_id: UserId,
        submission: &QuizSubmission,
    ) -> Result<QuizResult, ApiError>;

    /// List the acting user's graded attempts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn quiz_history(&self) -> Result<Vec<QuizAttempt>, ApiError>;

    /// Look up one graded attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown attempt.
    async fn quiz_attempt(&self, attempt_id: AttemptId) -> Result<QuizAttempt, ApiError>;
}

/// Write operations used while authoring a quiz.
#[async_trait]
pub trait AuthoringApi: Send + Sync {
    /// Create the quiz for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn create_quiz(&self, lesson_id: LessonId, title: &str)
        -> Result<QuizHeader, ApiError>;

    /// Rename an existing quiz.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn update_quiz_title(
        &self,
        quiz_id: QuizId,
        lesson_id: LessonId,
        title: &str,
    ) -> Result<QuizHeader, ApiError>;

    /// Append one question; the returned question carries its server id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn add_question(
        &self,
        quiz_id: QuizId,
        question: &ValidatedQuestion,
    ) -> Result<Question, ApiError>;

    /// Delete a persisted question.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn delete_question(&self, question_id: QuestionId) -> Result<(), ApiError>;
}

#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Fetch the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the credentials are rejected.
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
}
