use crate::model::answer::AnswerLetter;
use crate::model::ids::QuestionId;

/// Per-question outcome of a graded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerBreakdown {
    pub question_id: QuestionId,
    pub question_text: String,
    pub user_answer: Option<AnswerLetter>,
    pub correct_answer: AnswerLetter,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Graded outcome of a quiz submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub score: u32,
    pub total_questions: u32,
    pub correct_count: u32,
    pub passed: bool,
    pub breakdown: Vec<AnswerBreakdown>,
}

impl QuizResult {
    /// Breakdown entries the learner got wrong.
    pub fn mistakes(&self) -> impl Iterator<Item = &AnswerBreakdown> {
        self.breakdown.iter().filter(|entry| !entry.is_correct)
    }
}
