#![forbid(unsafe_code)]

pub mod app_services;
pub mod authoring;
pub mod config;
pub mod error;
pub mod identity;
pub mod notify;
pub mod sessions;

pub use app_services::AppServices;
pub use config::RetryPolicy;
pub use error::{AppServicesError, AuthoringError, IdentityError, SessionError};
pub use identity::IdentityStore;
pub use notify::{
    Notification, NotificationLevel, NotificationSink, Notifier, RecordingSink, TracingSink,
};

pub use authoring::{
    QuestionBuilderSaga, QuizAuthoringService, QuizDraft, SagaReport, SagaState, SagaStep,
};
pub use sessions::{
    AnswerSheet, ClockState, QuizSession, QuizSessionService, SessionClock, SessionPhase,
    SessionProgress, SubmitOutcome,
};
