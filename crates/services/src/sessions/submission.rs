use std::sync::atomic::{AtomicBool, Ordering};

use quiz_core::model::{AnswerLetter, Quiz, QuizResult, QuizSubmission, SubmittedAnswer};

use super::answer_sheet::AnswerSheet;
use crate::error::SessionError;

/// What a call to `submit` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Graded(QuizResult),
    /// Another submission was already in flight; nothing was sent.
    AlreadySubmitting,
}

/// Why a submission was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimeExpired,
}

/// Build the grading payload from the sheet, one answer per question.
///
/// Unanswered slots are refused here rather than letting
/// [`AnswerLetter::for_slot`] turn them into `A`.
///
/// # Errors
///
/// Returns `SessionError::Incomplete` listing unanswered slots, or
/// `SessionError::UnpersistedQuestion` for a question without a server id.
pub fn build_submission(quiz: &Quiz, sheet: &AnswerSheet) -> Result<QuizSubmission, SessionError> {
    let unanswered = sheet.unanswered();
    if !unanswered.is_empty() {
        return Err(SessionError::Incomplete { unanswered });
    }

    let answers = quiz
        .questions()
        .iter()
        .zip(sheet.slots())
        .enumerate()
        .map(|(index, (question, slot))| {
            let question_id = question
                .id
                .ok_or(SessionError::UnpersistedQuestion { index })?;
            Ok(SubmittedAnswer {
                question_id,
                selected_answer: AnswerLetter::for_slot(*slot),
            })
        })
        .collect::<Result<Vec<_>, SessionError>>()?;

    Ok(QuizSubmission {
        lesson_id: quiz.lesson_id(),
        answers,
    })
}

/// At-most-one-in-flight flag for submissions.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag(AtomicBool);

impl BusyFlag {
    /// Claim the flag; `None` if a submission already holds it.
    pub(crate) fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.0))
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the busy flag on every exit path, including a dropped future.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
