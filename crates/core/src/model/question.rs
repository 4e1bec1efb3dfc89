use thiserror::Error;

use crate::model::answer::AnswerLetter;
use crate::model::ids::QuestionId;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Editable form state for a question that has not been queued yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: [String; 4],
    pub correct_answer: Option<AnswerLetter>,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            options: Default::default(),
            correct_answer: Some(AnswerLetter::A),
        }
    }
}

impl QuestionDraft {
    pub fn new(
        text: impl Into<String>,
        options: [&str; 4],
        correct_answer: AnswerLetter,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.map(str::to_owned),
            correct_answer: Some(correct_answer),
        }
    }

    /// Check that every field is filled in.
    ///
    /// # Errors
    ///
    /// Returns the first missing field as a `QuestionValidationError`.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionValidationError::EmptyText);
        }

        let mut options: [String; 4] = Default::default();
        for (slot, (letter, raw)) in options
            .iter_mut()
            .zip(AnswerLetter::ALL.into_iter().zip(self.options.iter()))
        {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(QuestionValidationError::EmptyOption(letter));
            }
            *slot = trimmed.to_owned();
        }

        let correct_answer = self
            .correct_answer
            .ok_or(QuestionValidationError::MissingCorrectAnswer)?;

        Ok(ValidatedQuestion {
            text: text.to_owned(),
            options,
            correct_answer,
        })
    }
}

/// A complete question waiting to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    text: String,
    options: [String; 4],
    correct_answer: AnswerLetter,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn option(&self, letter: AnswerLetter) -> &str {
        &self.options[letter.position()]
    }

    #[must_use]
    pub fn correct_answer(&self) -> AnswerLetter {
        self.correct_answer
    }

    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id: Some(id),
            text: self.text,
            options: self.options,
            correct_answer: self.correct_answer,
        }
    }
}

/// A quiz question. `id` is absent until the backend has persisted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Option<QuestionId>,
    pub text: String,
    pub options: [String; 4],
    pub correct_answer: AnswerLetter,
}

impl Question {
    #[must_use]
    pub fn option(&self, letter: AnswerLetter) -> &str {
        &self.options[letter.position()]
    }

    /// Text of the option marked as correct.
    #[must_use]
    pub fn correct_answer_text(&self) -> &str {
        self.option(self.correct_answer)
    }
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionValidationError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("option {0} cannot be empty")]
    EmptyOption(AnswerLetter),

    #[error("a correct answer must be chosen")]
    MissingCorrectAnswer,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
