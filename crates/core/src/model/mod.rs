mod answer;
mod attempt;
mod ids;
mod question;
mod quiz;
mod result;
mod submission;
mod user;

pub use answer::{AnswerLetter, ParseLetterError, UNANSWERED};
pub use attempt::QuizAttempt;
pub use ids::{AttemptId, LessonId, ParseIdError, QuestionId, QuizId, UserId};
pub use question::{Question, QuestionDraft, QuestionValidationError, ValidatedQuestion};
pub use quiz::{Quiz, QuizHeader, QuizTitleError, validate_title};
pub use result::{AnswerBreakdown, QuizResult};
pub use submission::{QuizSubmission, SubmittedAnswer};
pub use user::CurrentUser;
