mod draft;
mod saga;
mod service;

pub use crate::error::AuthoringError;
pub use draft::QuizDraft;
pub use saga::{
    QuestionBuilderSaga, SagaFailure, SagaReport, SagaState, SagaStep, SavePlan, SaveTarget,
};
pub use service::QuizAuthoringService;
