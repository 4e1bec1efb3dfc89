use quiz_core::model::{
    LessonId, Question, QuestionDraft, QuestionId, QuestionValidationError, Quiz, QuizId,
    ValidatedQuestion,
};

use super::saga::SagaReport;
use crate::error::AuthoringError;

/// An admin's working copy of one lesson's quiz.
///
/// `existing` mirrors what the server holds; `pending` holds validated
/// questions that have not been sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    lesson_id: LessonId,
    quiz_id: Option<QuizId>,
    saved_title: Option<String>,
    title: String,
    existing: Vec<Question>,
    pending: Vec<ValidatedQuestion>,
}

impl QuizDraft {
    /// A blank draft for a lesson that has no quiz yet.
    #[must_use]
    pub fn for_lesson(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            quiz_id: None,
            saved_title: None,
            title: String::new(),
            existing: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            lesson_id: quiz.lesson_id(),
            quiz_id: Some(quiz.id()),
            saved_title: Some(quiz.title().to_owned()),
            title: quiz.title().to_owned(),
            existing: quiz.questions().to_vec(),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> Option<QuizId> {
        self.quiz_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title as last saved on the server.
    #[must_use]
    pub fn saved_title(&self) -> Option<&str> {
        self.saved_title.as_deref()
    }

    #[must_use]
    pub fn existing(&self) -> &[Question] {
        &self.existing
    }

    #[must_use]
    pub fn pending(&self) -> &[ValidatedQuestion] {
        &self.pending
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Validate a question form and queue it. Returns the pending count.
    ///
    /// # Errors
    ///
    /// Returns the validation error when the text, any option or the
    /// correct answer is missing; nothing is queued then.
    pub fn queue_question(&mut self, draft: QuestionDraft) -> Result<usize, QuestionValidationError> {
        let validated = draft.validate()?;
        self.pending.push(validated);
        Ok(self.pending.len())
    }

    /// Drop a queued question without touching the server.
    ///
    /// # Errors
    ///
    /// Returns `AuthoringError::NoSuchPending` if `index` is out of range.
    pub fn remove_pending(&mut self, index: usize) -> Result<ValidatedQuestion, AuthoringError> {
        if index >= self.pending.len() {
            return Err(AuthoringError::NoSuchPending(index));
        }
        Ok(self.pending.remove(index))
    }

    /// Whether the title differs from the saved one. Always `false` before
    /// the quiz exists, since creating it carries the title anyway.
    #[must_use]
    pub fn title_changed(&self) -> bool {
        match (&self.quiz_id, &self.saved_title) {
            (Some(_), Some(saved)) => saved.trim() != self.title.trim(),
            (Some(_), None) => !self.title.trim().is_empty(),
            (None, _) => false,
        }
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.title_changed() || !self.pending.is_empty()
    }

    #[must_use]
    pub(crate) fn contains_existing(&self, question_id: QuestionId) -> bool {
        self.existing
            .iter()
            .any(|question| question.id == Some(question_id))
    }

    pub(crate) fn remove_existing(&mut self, question_id: QuestionId) -> Option<Question> {
        let position = self
            .existing
            .iter()
            .position(|question| question.id == Some(question_id))?;
        Some(self.existing.remove(position))
    }

    /// Fold a save run back into the draft.
    ///
    /// A reconciled run replaces the draft with the server's quiz. Otherwise
    /// only what is known to be persisted is recorded: the quiz id, the
    /// saved title, and the leading pending questions that were added.
    pub(crate) fn absorb(&mut self, report: &SagaReport) {
        if let Some(quiz) = &report.reconciled {
            *self = Self::from_quiz(quiz);
            return;
        }

        if let Some(quiz_id) = report.quiz_id {
            self.quiz_id = Some(quiz_id);
        }
        if report.title_saved {
            self.saved_title = Some(report.title.clone());
        }
        let persisted = report.added.len().min(self.pending.len());
        self.pending.drain(..persisted);
    }
}
