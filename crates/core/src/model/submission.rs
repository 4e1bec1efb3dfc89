use crate::model::answer::AnswerLetter;
use crate::model::ids::{LessonId, QuestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_answer: AnswerLetter,
}

/// Answers sent for grading, one entry per question in quiz order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub lesson_id: LessonId,
    pub answers: Vec<SubmittedAnswer>,
}
