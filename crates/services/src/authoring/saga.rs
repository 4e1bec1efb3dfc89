use quiz_api::{ApiError, AuthoringApi, LearnerApi};
use quiz_core::model::{LessonId, Question, Quiz, QuizId, ValidatedQuestion, validate_title};
use tracing::{debug, info, warn};

use super::draft::QuizDraft;
use crate::error::AuthoringError;

/// A write the saga performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStep {
    CreateQuiz,
    UpdateTitle,
    /// Adding the pending question at `cursor` (0-based).
    AddQuestion { cursor: usize },
    Reconcile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Draft,
    CreatingQuiz,
    UpdatingTitle,
    AddingQuestions { cursor: usize },
    Reconciling,
    Reconciled,
    /// Halted at `at`. Nothing after it was attempted.
    Failed { at: SagaStep },
}

/// Where the questions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    /// The lesson has no quiz yet; create one first.
    Create,
    Existing { quiz_id: QuizId, rename: bool },
}

/// Everything a save run needs, captured from the draft up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    lesson_id: LessonId,
    title: String,
    target: SaveTarget,
    questions: Vec<ValidatedQuestion>,
}

impl SavePlan {
    /// # Errors
    ///
    /// Returns `AuthoringError::Title` for a blank title and
    /// `AuthoringError::NoChanges` when the title is unchanged and nothing
    /// is queued. A lesson without a quiz only has changes once a question
    /// is queued.
    pub fn from_draft(draft: &QuizDraft) -> Result<Self, AuthoringError> {
        let title = validate_title(draft.title())?;
        if !draft.has_changes() {
            return Err(AuthoringError::NoChanges);
        }
        let target = match draft.quiz_id() {
            None => SaveTarget::Create,
            Some(quiz_id) => SaveTarget::Existing {
                quiz_id,
                rename: draft.title_changed(),
            },
        };

        Ok(Self {
            lesson_id: draft.lesson_id(),
            title,
            target,
            questions: draft.pending().to_vec(),
        })
    }

    #[must_use]
    pub fn target(&self) -> SaveTarget {
        self.target
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SagaFailure {
    pub at: SagaStep,
    pub error: ApiError,
}

/// What a save run persisted before it finished or halted.
#[derive(Debug, Clone, PartialEq)]
pub struct SagaReport {
    pub target: SaveTarget,
    pub title: String,
    /// The quiz written to, once known.
    pub quiz_id: Option<QuizId>,
    /// The title was written by a create or rename call.
    pub title_saved: bool,
    pub queued: usize,
    /// Persisted questions, in queue order.
    pub added: Vec<Question>,
    pub state: SagaState,
    pub failure: Option<SagaFailure>,
    /// The server's quiz after every write succeeded.
    pub reconciled: Option<Quiz>,
}

impl SagaReport {
    /// Every write succeeded, whether or not the reload did.
    #[must_use]
    pub fn all_persisted(&self) -> bool {
        self.failure
            .as_ref()
            .is_none_or(|failure| failure.at == SagaStep::Reconcile)
    }

    #[must_use]
    pub fn halted_at(&self) -> Option<SagaStep> {
        self.failure.as_ref().map(|failure| failure.at)
    }
}

/// Writes a draft to the backend one call at a time.
///
/// `Draft -> {CreatingQuiz | UpdatingTitle}? -> AddingQuestions(0..n) ->
/// Reconciling -> Reconciled`, halting in `Failed` at the first error.
/// Nothing is retried or rolled back.
pub struct QuestionBuilderSaga {
    plan: SavePlan,
    state: SagaState,
}

impl QuestionBuilderSaga {
    #[must_use]
    pub fn new(plan: SavePlan) -> Self {
        Self {
            plan,
            state: SagaState::Draft,
        }
    }

    pub async fn run(mut self, authoring: &dyn AuthoringApi, reader: &dyn LearnerApi) -> SagaReport {
        let mut report = SagaReport {
            target: self.plan.target,
            title: self.plan.title.clone(),
            quiz_id: None,
            title_saved: false,
            queued: self.plan.questions.len(),
            added: Vec::new(),
            state: self.state,
            failure: None,
            reconciled: None,
        };
        let lesson_id = self.plan.lesson_id;

        let quiz_id = match self.plan.target {
            SaveTarget::Create => {
                self.state = SagaState::CreatingQuiz;
                debug!(%lesson_id, "creating quiz");
                match authoring.create_quiz(lesson_id, &self.plan.title).await {
                    Ok(header) => {
                        report.title_saved = true;
                        header.id
                    }
                    Err(error) => return self.halt(report, SagaStep::CreateQuiz, error),
                }
            }
            SaveTarget::Existing { quiz_id, rename } => {
                report.quiz_id = Some(quiz_id);
                if rename {
                    self.state = SagaState::UpdatingTitle;
                    debug!(%quiz_id, "updating quiz title");
                    if let Err(error) = authoring
                        .update_quiz_title(quiz_id, lesson_id, &self.plan.title)
                        .await
                    {
                        return self.halt(report, SagaStep::UpdateTitle, error);
                    }
                    report.title_saved = true;
                }
                quiz_id
            }
        };
        report.quiz_id = Some(quiz_id);

        let mut cursor = 0;
        while cursor < self.plan.questions.len() {
            self.state = SagaState::AddingQuestions { cursor };
            debug!(%quiz_id, cursor, total = report.queued, "adding question");
            match authoring
                .add_question(quiz_id, &self.plan.questions[cursor])
                .await
            {
                Ok(persisted) => report.added.push(persisted),
                Err(error) => return self.halt(report, SagaStep::AddQuestion { cursor }, error),
            }
            cursor += 1;
        }

        self.state = SagaState::Reconciling;
        match reader.fetch_quiz(lesson_id).await {
            Ok(quiz) => {
                self.state = SagaState::Reconciled;
                info!(%quiz_id, added = report.added.len(), "quiz saved");
                report.reconciled = Some(quiz);
                report.state = self.state;
                report
            }
            Err(error) => self.halt(report, SagaStep::Reconcile, error),
        }
    }

    fn halt(mut self, mut report: SagaReport, at: SagaStep, error: ApiError) -> SagaReport {
        warn!(?at, added = report.added.len(), error = %error, "quiz save halted");
        self.state = SagaState::Failed { at };
        report.state = self.state;
        report.failure = Some(SagaFailure { at, error });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_api::{Endpoint, InMemoryBackend};
    use quiz_core::model::{AnswerLetter, QuestionDraft, QuestionId, QuizHeader};

    fn form(text: &str) -> QuestionDraft {
        QuestionDraft::new(text, ["a", "b", "c", "d"], AnswerLetter::D)
    }

    fn existing_quiz() -> Quiz {
        let questions = (1..=2)
            .map(|id| {
                form("old")
                    .validate()
                    .unwrap()
                    .assign_id(QuestionId::new(id))
            })
            .collect();
        Quiz::new(
            QuizHeader {
                id: QuizId::new(3),
                lesson_id: LessonId::new(8),
                title: "Old".into(),
            },
            questions,
            70,
            None,
        )
    }

    #[test]
    fn plan_rejects_blank_title_and_empty_saves() {
        let mut draft = QuizDraft::for_lesson(LessonId::new(8));
        draft.queue_question(form("q")).unwrap();
        assert!(matches!(
            SavePlan::from_draft(&draft),
            Err(AuthoringError::Title(_))
        ));

        let draft = QuizDraft::from_quiz(&existing_quiz());
        assert!(matches!(
            SavePlan::from_draft(&draft),
            Err(AuthoringError::NoChanges)
        ));

        let mut draft = QuizDraft::for_lesson(LessonId::new(8));
        draft.set_title("New");
        assert!(matches!(
            SavePlan::from_draft(&draft),
            Err(AuthoringError::NoChanges)
        ));
    }

    #[tokio::test]
    async fn new_quiz_is_created_then_filled_then_reloaded() {
        let backend = InMemoryBackend::new();
        let mut draft = QuizDraft::for_lesson(LessonId::new(8));
        draft.set_title(" Generics ");
        draft.queue_question(form("first")).unwrap();
        draft.queue_question(form("second")).unwrap();

        let plan = SavePlan::from_draft(&draft).unwrap();
        assert_eq!(plan.target(), SaveTarget::Create);
        let report = QuestionBuilderSaga::new(plan).run(&backend, &backend).await;

        assert_eq!(report.state, SagaState::Reconciled);
        assert!(report.title_saved);
        assert_eq!(report.added.len(), 2);
        let reloaded = report.reconciled.unwrap();
        assert_eq!(reloaded.title(), "Generics");
        assert_eq!(reloaded.question_count(), 2);
        assert_eq!(
            backend.call_log(),
            vec![
                Endpoint::CreateQuiz,
                Endpoint::AddQuestion,
                Endpoint::AddQuestion,
                Endpoint::FetchQuiz,
            ]
        );
    }

    #[tokio::test]
    async fn failed_rename_sends_no_questions() {
        let backend = InMemoryBackend::new();
        backend.seed_quiz(existing_quiz()).unwrap();
        backend
            .fail_on(Endpoint::UpdateQuizTitle, 1, ApiError::Transport("down".into()))
            .unwrap();
        let mut draft = QuizDraft::from_quiz(&existing_quiz());
        draft.set_title("Renamed");
        draft.queue_question(form("new")).unwrap();

        let report = QuestionBuilderSaga::new(SavePlan::from_draft(&draft).unwrap())
            .run(&backend, &backend)
            .await;

        assert_eq!(report.state, SagaState::Failed { at: SagaStep::UpdateTitle });
        assert!(!report.title_saved);
        assert_eq!(backend.call_count(Endpoint::AddQuestion), 0);
        assert!(!report.all_persisted());
    }

    #[tokio::test]
    async fn failed_create_leaves_no_quiz_id() {
        let backend = InMemoryBackend::new();
        backend
            .fail_on(
                Endpoint::CreateQuiz,
                1,
                ApiError::Status {
                    status: 500,
                    message: "boom".into(),
                },
            )
            .unwrap();
        let mut draft = QuizDraft::for_lesson(LessonId::new(8));
        draft.set_title("T");
        draft.queue_question(form("q")).unwrap();

        let report = QuestionBuilderSaga::new(SavePlan::from_draft(&draft).unwrap())
            .run(&backend, &backend)
            .await;

        assert_eq!(report.halted_at(), Some(SagaStep::CreateQuiz));
        assert_eq!(report.quiz_id, None);
        assert_eq!(backend.call_log(), vec![Endpoint::CreateQuiz]);
    }

    #[tokio::test]
    async fn halts_at_first_failed_question() {
        let backend = InMemoryBackend::new();
        backend.seed_quiz(existing_quiz()).unwrap();
        backend
            .fail_on(Endpoint::AddQuestion, 2, ApiError::Transport("reset".into()))
            .unwrap();
        let mut draft = QuizDraft::from_quiz(&existing_quiz());
        for text in ["a", "b", "c"] {
            draft.queue_question(form(text)).unwrap();
        }

        let report = QuestionBuilderSaga::new(SavePlan::from_draft(&draft).unwrap())
            .run(&backend, &backend)
            .await;

        assert_eq!(report.halted_at(), Some(SagaStep::AddQuestion { cursor: 1 }));
        assert_eq!(report.added.len(), 1);
        assert_eq!(backend.call_count(Endpoint::AddQuestion), 2);
        assert_eq!(backend.call_count(Endpoint::FetchQuiz), 0);
    }
}
