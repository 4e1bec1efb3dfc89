use std::sync::Arc;

use quiz_api::{ApiError, AuthoringApi, LearnerApi};
use quiz_core::model::{LessonId, QuestionDraft, QuestionId, ValidatedQuestion};
use tracing::{info, warn};

use super::draft::QuizDraft;
use super::saga::{QuestionBuilderSaga, SagaReport, SagaStep, SavePlan, SaveTarget};
use crate::error::AuthoringError;
use crate::notify::Notifier;

/// Admin-side quiz editing: load a draft, queue questions, save.
#[derive(Clone)]
pub struct QuizAuthoringService {
    authoring: Arc<dyn AuthoringApi>,
    reader: Arc<dyn LearnerApi>,
    notifier: Notifier,
}

impl QuizAuthoringService {
    #[must_use]
    pub fn new(
        authoring: Arc<dyn AuthoringApi>,
        reader: Arc<dyn LearnerApi>,
        notifier: Notifier,
    ) -> Self {
        Self {
            authoring,
            reader,
            notifier,
        }
    }

    /// Load the lesson's quiz into a draft, or a blank draft if it has none.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::Api` for any failure other than "not found".
    pub async fn open_draft(&self, lesson_id: LessonId) -> Result<QuizDraft, AuthoringError> {
        match self.reader.fetch_quiz(lesson_id).await {
            Ok(quiz) => {
                self.notifier.success(format!(
                    "Quiz loaded with {} questions",
                    quiz.question_count()
                ));
                Ok(QuizDraft::from_quiz(&quiz))
            }
            Err(ApiError::NotFound) => {
                info!(%lesson_id, "lesson has no quiz yet");
                Ok(QuizDraft::for_lesson(lesson_id))
            }
            Err(err) => {
                warn!(%lesson_id, error = %err, "quiz load failed");
                self.notifier.error("Failed to load quiz");
                Err(err.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `AuthoringError::Question` if the form is incomplete.
    pub fn queue_question(
        &self,
        draft: &mut QuizDraft,
        question: QuestionDraft,
    ) -> Result<usize, AuthoringError> {
        match draft.queue_question(question) {
            Ok(pending) => {
                self.notifier
                    .success(format!("Question added ({pending} new)"));
                Ok(pending)
            }
            Err(err) => {
                self.notifier.error("Please fill all question fields");
                Err(err.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `AuthoringError::NoSuchPending` if `index` is out of range.
    pub fn remove_pending(
        &self,
        draft: &mut QuizDraft,
        index: usize,
    ) -> Result<ValidatedQuestion, AuthoringError> {
        let removed = draft.remove_pending(index)?;
        self.notifier.success("Question removed");
        Ok(removed)
    }

    /// Delete a saved question right away, outside of any save run.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::UnknownQuestion` if the draft does not hold
    /// the question, or `AuthoringError::Api` if the delete call fails. The
    /// draft is only changed on success.
    pub async fn delete_existing(
        &self,
        draft: &mut QuizDraft,
        question_id: QuestionId,
    ) -> Result<(), AuthoringError> {
        if !draft.contains_existing(question_id) {
            return Err(AuthoringError::UnknownQuestion(question_id));
        }
        match self.authoring.delete_question(question_id).await {
            Ok(()) => {
                draft.remove_existing(question_id);
                self.notifier.success("Question deleted successfully");
                Ok(())
            }
            Err(err) => {
                warn!(%question_id, error = %err, "question delete failed");
                self.notifier.error("Failed to delete question");
                Err(err.into())
            }
        }
    }

    /// Persist the draft's title and queued questions.
    ///
    /// A run that halts part-way is not an error: the returned report says
    /// what was persisted, and the draft is updated to match so that saving
    /// again only sends what is still missing.
    ///
    /// # Errors
    ///
    /// Returns the pre-flight error (blank title, nothing to save) before
    /// any request is sent.
    pub async fn save(&self, draft: &mut QuizDraft) -> Result<SagaReport, AuthoringError> {
        let plan = match SavePlan::from_draft(draft) {
            Ok(plan) => plan,
            Err(err) => {
                self.notifier.error(match err {
                    AuthoringError::Title(_) => "Please enter quiz title",
                    _ => "No changes to save",
                });
                return Err(err);
            }
        };

        info!(
            lesson_id = %draft.lesson_id(),
            questions = plan.question_count(),
            "saving quiz"
        );
        let report = QuestionBuilderSaga::new(plan)
            .run(self.authoring.as_ref(), self.reader.as_ref())
            .await;
        draft.absorb(&report);
        self.announce(&report);
        Ok(report)
    }

    fn announce(&self, report: &SagaReport) {
        let renamed = matches!(report.target, SaveTarget::Existing { rename: true, .. });
        if renamed && report.title_saved {
            self.notifier.success("Quiz title updated");
        }

        if report.all_persisted() && report.queued > 0 {
            self.notifier.success(format!(
                "{} questions added successfully!",
                report.queued
            ));
        }

        let Some(failure) = &report.failure else {
            return;
        };
        match failure.at {
            SagaStep::CreateQuiz => self.notifier.error("Failed to create quiz"),
            SagaStep::UpdateTitle => self.notifier.error("Failed to update quiz title"),
            SagaStep::AddQuestion { cursor } => self.notifier.error(format!(
                "Failed to add question {}: {}",
                cursor + 1,
                failure.error.reason()
            )),
            SagaStep::Reconcile => {
                self.notifier
                    .warning("Quiz saved, but reloading it failed; reopen the lesson to refresh");
            }
        }
    }
}
