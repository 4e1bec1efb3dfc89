use thiserror::Error;

use crate::model::ids::{LessonId, QuizId};
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizTitleError {
    #[error("quiz title cannot be empty")]
    Empty,
}

/// Trim a quiz title and reject blank input.
///
/// # Errors
///
/// Returns `QuizTitleError::Empty` when nothing but whitespace remains.
pub fn validate_title(raw: &str) -> Result<String, QuizTitleError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(QuizTitleError::Empty);
    }
    Ok(title.to_owned())
}

/// Quiz identity as returned by create/update calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizHeader {
    pub id: QuizId,
    pub lesson_id: LessonId,
    pub title: String,
}

/// A quiz as the backend describes it.
///
/// Question order is fixed once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    lesson_id: LessonId,
    title: String,
    questions: Vec<Question>,
    passing_score: u32,
    time_limit_minutes: Option<u32>,
}

impl Quiz {
    #[must_use]
    pub fn new(
        header: QuizHeader,
        questions: Vec<Question>,
        passing_score: u32,
        time_limit_minutes: Option<u32>,
    ) -> Self {
        Self {
            id: header.id,
            lesson_id: header.lesson_id,
            title: header.title,
            questions,
            passing_score,
            // a zero limit means "untimed"
            time_limit_minutes: time_limit_minutes.filter(|minutes| *minutes > 0),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn passing_score(&self) -> u32 {
        self.passing_score
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> Option<u32> {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn header(&self) -> QuizHeader {
        QuizHeader {
            id: self.id,
            lesson_id: self.lesson_id,
            title: self.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> QuizHeader {
        QuizHeader {
            id: QuizId::new(1),
            lesson_id: LessonId::new(10),
            title: "Ownership".into(),
        }
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(validate_title("  \t"), Err(QuizTitleError::Empty));
        assert_eq!(validate_title(" Borrowing "), Ok("Borrowing".to_owned()));
    }

    #[test]
    fn zero_time_limit_means_untimed() {
        let quiz = Quiz::new(header(), Vec::new(), 70, Some(0));
        assert_eq!(quiz.time_limit_minutes(), None);

        let quiz = Quiz::new(header(), Vec::new(), 70, Some(5));
        assert_eq!(quiz.time_limit_minutes(), Some(5));
    }
}
