//! Wire shapes for the REST backend and their mapping to domain types.

use quiz_core::model::{
    AnswerBreakdown, AnswerLetter, AttemptId, CurrentUser, LessonId, Question, QuestionId, Quiz,
    QuizAttempt, QuizHeader, QuizId, QuizResult, QuizSubmission, UserId, ValidatedQuestion,
};
use quiz_core::time::parse_timestamp;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: AnswerLetter,
}

impl QuestionDto {
    #[must_use]
    pub fn into_question(self) -> Question {
        Question {
            id: self.id,
            text: self.question_text,
            options: [self.option_a, self.option_b, self.option_c, self.option_d],
            correct_answer: self.correct_answer,
        }
    }

    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let [a, b, c, d] = question.options.clone();
        Self {
            id: question.id,
            question_text: question.text.clone(),
            option_a: a,
            option_b: b,
            option_c: c,
            option_d: d,
            correct_answer: question.correct_answer,
        }
    }

    /// Request body for adding a question; never carries an id.
    #[must_use]
    pub fn from_validated(question: &ValidatedQuestion) -> Self {
        Self {
            id: None,
            question_text: question.text().to_owned(),
            option_a: question.option(AnswerLetter::A).to_owned(),
            option_b: question.option(AnswerLetter::B).to_owned(),
            option_c: question.option(AnswerLetter::C).to_owned(),
            option_d: question.option(AnswerLetter::D).to_owned(),
            correct_answer: question.correct_answer(),
        }
    }

    /// Map an add-question response, which must carry the new id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` when the server omitted the id.
    pub fn into_persisted(self) -> Result<Question, ApiError> {
        if self.id.is_none() {
            return Err(ApiError::Decode("persisted question has no id".into()));
        }
        Ok(self.into_question())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDto {
    pub id: QuizId,
    pub lesson_id: LessonId,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
    pub passing_score: u32,
    #[serde(default)]
    pub time_limit: Option<u32>,
}

impl QuizDto {
    #[must_use]
    pub fn into_quiz(self) -> Quiz {
        let header = QuizHeader {
            id: self.id,
            lesson_id: self.lesson_id,
            title: self.title,
        };
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect();
        Quiz::new(header, questions, self.passing_score, self.time_limit)
    }

    #[must_use]
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id(),
            lesson_id: quiz.lesson_id(),
            title: quiz.title().to_owned(),
            questions: quiz.questions().iter().map(QuestionDto::from_question).collect(),
            passing_score: quiz.passing_score(),
            time_limit: quiz.time_limit_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizTitleRequest<'a> {
    pub title: &'a str,
    pub lesson_id: LessonId,
}

/// Create/update response. Extra fields of a full quiz body are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHeaderDto {
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub lesson_id: Option<LessonId>,
}

impl QuizHeaderDto {
    /// Some endpoints omit `lessonId`; the caller's lesson fills the gap.
    #[must_use]
    pub fn into_header(self, requested_lesson: LessonId) -> QuizHeader {
        QuizHeader {
            id: self.id,
            lesson_id: self.lesson_id.unwrap_or(requested_lesson),
            title: self.title,
        }
    }
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswerDto {
    pub question_id: QuestionId,
    pub selected_answer: AnswerLetter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    pub lesson_id: LessonId,
    pub answers: Vec<SubmittedAnswerDto>,
}

impl SubmissionDto {
    #[must_use]
    pub fn from_submission(submission: &QuizSubmission) -> Self {
        Self {
            lesson_id: submission.lesson_id,
            answers: submission
                .answers
                .iter()
                .map(|answer| SubmittedAnswerDto {
                    question_id: answer.question_id,
                    selected_answer: answer.selected_answer,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAnswerDto {
    pub question_id: QuestionId,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultDto {
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub passed: bool,
    #[serde(default)]
    pub answers: Vec<ResultAnswerDto>,
}

impl QuizResultDto {
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if a correct answer is not a letter A–D.
    pub fn into_result(self) -> Result<QuizResult, ApiError> {
        let breakdown = self
            .answers
            .into_iter()
            .map(|entry| {
                let correct_answer = entry
                    .correct_answer
                    .parse::<AnswerLetter>()
                    .map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok(AnswerBreakdown {
                    question_id: entry.question_id,
                    question_text: entry.question_text,
                    user_answer: entry.user_answer.and_then(|raw| raw.parse().ok()),
                    correct_answer,
                    is_correct: entry.is_correct,
                    explanation: entry.explanation,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(QuizResult {
            score: self.score,
            total_questions: self.total_questions,
            correct_count: self.correct_answers,
            passed: self.passed,
            breakdown,
        })
    }
}

//
// ─── HISTORY & IDENTITY ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttemptDto {
    pub id: AttemptId,
    pub lesson_id: LessonId,
    #[serde(default)]
    pub title: String,
    pub attempted_at: String,
    pub score: u32,
    pub total_questions: u32,
}

impl QuizAttemptDto {
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if `attemptedAt` is not a timestamp.
    pub fn into_attempt(self) -> Result<QuizAttempt, ApiError> {
        let attempted_at =
            parse_timestamp(&self.attempted_at).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(QuizAttempt {
            id: self.id,
            lesson_id: self.lesson_id,
            title: self.title,
            attempted_at,
            score: self.score,
            total_questions: self.total_questions,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl UserDto {
    #[must_use]
    pub fn into_user(self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
        }
    }
}

/// Error body shape; only `message` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
