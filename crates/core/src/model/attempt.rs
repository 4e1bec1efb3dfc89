use chrono::{DateTime, Utc};

use crate::model::ids::{AttemptId, LessonId};

/// A graded attempt from the learner's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub lesson_id: LessonId,
    pub title: String,
    pub attempted_at: DateTime<Utc>,
    pub score: u32,
    pub total_questions: u32,
}
