use std::sync::Arc;

use quiz_api::LearnerApi;
use quiz_core::model::{AttemptId, LessonId, QuizAttempt, UserId};
use tracing::{info, warn};

use super::service::QuizSession;
use crate::error::SessionError;
use crate::notify::Notifier;

pub(crate) const LOAD_FAILED_MESSAGE: &str = "Failed to load quiz";
pub(crate) const EMPTY_QUIZ_MESSAGE: &str = "This quiz has no questions";

/// Loads quizzes into sessions and lists past attempts.
#[derive(Clone)]
pub struct QuizSessionService {
    api: Arc<dyn LearnerApi>,
    notifier: Notifier,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(api: Arc<dyn LearnerApi>, notifier: Notifier) -> Self {
        Self { api, notifier }
    }

    /// Fetch the lesson's quiz and open a session on it for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the quiz cannot be fetched and
    /// `SessionError::Empty` if it has no questions. Both are also reported
    /// through the notifier.
    pub async fn start_session(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<QuizSession, SessionError> {
        let quiz = match self.api.fetch_quiz(lesson_id).await {
            Ok(quiz) => quiz,
            Err(err) => {
                warn!(%lesson_id, error = %err, "quiz load failed");
                self.notifier.error(LOAD_FAILED_MESSAGE);
                return Err(err.into());
            }
        };

        if quiz.question_count() == 0 {
            self.notifier.error(EMPTY_QUIZ_MESSAGE);
            return Err(SessionError::Empty);
        }

        info!(%lesson_id, quiz_id = %quiz.id(), "quiz loaded");
        QuizSession::start(quiz, user_id, Arc::clone(&self.api), self.notifier.clone())
    }

    /// The learner's past attempts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the history cannot be fetched.
    pub async fn history(&self) -> Result<Vec<QuizAttempt>, SessionError> {
        let mut attempts = self.api.quiz_history().await?;
        attempts.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        Ok(attempts)
    }

    /// One past attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the attempt is unknown or cannot be
    /// fetched.
    pub async fn attempt(&self, attempt_id: AttemptId) -> Result<QuizAttempt, SessionError> {
        Ok(self.api.quiz_attempt(attempt_id).await?)
    }
}
