mod answer_sheet;
mod clock;
mod progress;
mod service;
mod submission;
mod workflow;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use answer_sheet::AnswerSheet;
pub use clock::{ClockState, SessionClock, TICK_PERIOD, Tick};
pub use progress::SessionProgress;
pub use service::{QuizSession, SessionPhase};
pub use submission::{SubmitOutcome, SubmitTrigger, build_submission};
pub use workflow::QuizSessionService;
