use std::sync::Arc;

use quiz_api::{ApiError, Endpoint, InMemoryBackend};
use quiz_core::model::{
    AnswerLetter, LessonId, QuestionDraft, QuestionId, Quiz, QuizHeader, QuizId,
};
use services::{
    AppServices, NotificationLevel, Notifier, RecordingSink, SagaState, SagaStep,
};

const LESSON: LessonId = LessonId::new(12);

fn form(text: &str) -> QuestionDraft {
    QuestionDraft::new(text, ["one", "two", "three", "four"], AnswerLetter::B)
}

fn seeded_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    let questions = (1..=3)
        .map(|id| {
            form(&format!("existing {id}"))
                .validate()
                .expect("valid question")
                .assign_id(QuestionId::new(id))
        })
        .collect();
    backend
        .seed_quiz(Quiz::new(
            QuizHeader {
                id: QuizId::new(7),
                lesson_id: LESSON,
                title: "T0".into(),
            },
            questions,
            70,
            None,
        ))
        .expect("seed quiz");
    backend
}

#[tokio::test]
async fn partial_save_keeps_what_was_persisted() {
    let backend = seeded_backend();
    backend
        .fail_on(
            Endpoint::AddQuestion,
            2,
            ApiError::Status {
                status: 400,
                message: "Option D is too long".into(),
            },
        )
        .expect("schedule fault");
    let sink = Arc::new(RecordingSink::new());
    let services = AppServices::in_memory(backend.clone(), Notifier::new(sink.clone()));
    let authoring = services.authoring();

    let mut draft = authoring.open_draft(LESSON).await.expect("open draft");
    assert_eq!(draft.existing().len(), 3);
    draft.set_title("T1");
    authoring
        .queue_question(&mut draft, form("new 1"))
        .expect("queue first");
    authoring
        .queue_question(&mut draft, form("new 2"))
        .expect("queue second");

    let report = authoring.save(&mut draft).await.expect("save runs");

    assert_eq!(
        report.state,
        SagaState::Failed {
            at: SagaStep::AddQuestion { cursor: 1 }
        }
    );
    assert!(report.title_saved);
    assert_eq!(report.added.len(), 1);
    assert!(report.reconciled.is_none());

    let server = backend.quiz_for(LESSON).expect("quiz on server");
    assert_eq!(server.title(), "T1");
    assert_eq!(server.question_count(), 4);

    assert_eq!(draft.existing().len(), 3);
    assert_eq!(draft.pending().len(), 1);
    assert!(!draft.title_changed());

    assert!(sink.contains(NotificationLevel::Success, "Quiz title updated"));
    assert!(sink.contains(
        NotificationLevel::Error,
        "Failed to add question 2: Option D is too long"
    ));
    assert!(!sink.contains(NotificationLevel::Success, "questions added successfully"));
}

#[tokio::test]
async fn rerun_after_halt_sends_only_the_remainder() {
    let backend = seeded_backend();
    backend
        .fail_on(Endpoint::AddQuestion, 2, ApiError::Transport("reset".into()))
        .expect("schedule fault");
    let sink = Arc::new(RecordingSink::new());
    let services = AppServices::in_memory(backend.clone(), Notifier::new(sink.clone()));
    let authoring = services.authoring();

    let mut draft = authoring.open_draft(LESSON).await.expect("open draft");
    draft.set_title("T1");
    for text in ["a", "b"] {
        authoring
            .queue_question(&mut draft, form(text))
            .expect("queue");
    }
    authoring.save(&mut draft).await.expect("first save");

    let report = authoring.save(&mut draft).await.expect("second save");

    assert_eq!(report.state, SagaState::Reconciled);
    assert_eq!(report.added.len(), 1);
    assert_eq!(backend.call_count(Endpoint::UpdateQuizTitle), 1);
    assert_eq!(backend.call_count(Endpoint::AddQuestion), 3);
    assert_eq!(draft.existing().len(), 5);
    assert!(draft.pending().is_empty());
    assert_eq!(draft.title(), "T1");
}

#[tokio::test]
async fn title_only_change_reconciles() {
    let backend = seeded_backend();
    let sink = Arc::new(RecordingSink::new());
    let services = AppServices::in_memory(backend.clone(), Notifier::new(sink.clone()));
    let authoring = services.authoring();

    let mut draft = authoring.open_draft(LESSON).await.expect("open draft");
    draft.set_title("Renamed");
    let report = authoring.save(&mut draft).await.expect("save");

    assert_eq!(report.state, SagaState::Reconciled);
    assert_eq!(draft.saved_title(), Some("Renamed"));
    assert_eq!(backend.call_count(Endpoint::AddQuestion), 0);
    assert!(sink.contains(NotificationLevel::Success, "Quiz title updated"));

    assert!(authoring.save(&mut draft).await.is_err());
    assert!(sink.contains(NotificationLevel::Error, "No changes to save"));
}

#[tokio::test]
async fn failed_reload_clears_pending_and_warns() {
    let backend = seeded_backend();
    // first fetch opens the draft, the second is the reload
    backend
        .fail_on(Endpoint::FetchQuiz, 2, ApiError::Transport("timeout".into()))
        .expect("schedule fault");
    let sink = Arc::new(RecordingSink::new());
    let services = AppServices::in_memory(backend.clone(), Notifier::new(sink.clone()));
    let authoring = services.authoring();

    let mut draft = authoring.open_draft(LESSON).await.expect("open draft");
    authoring
        .queue_question(&mut draft, form("late"))
        .expect("queue");
    let report = authoring.save(&mut draft).await.expect("save");

    assert_eq!(report.state, SagaState::Failed { at: SagaStep::Reconcile });
    assert!(report.all_persisted());
    assert!(draft.pending().is_empty());
    assert!(sink.contains(NotificationLevel::Success, "1 questions added successfully!"));
    assert!(sink.contains(NotificationLevel::Warning, "reloading it failed"));
}
