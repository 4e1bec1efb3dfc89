use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Duration;
use quiz_core::model::{
    AnswerBreakdown, AttemptId, CurrentUser, LessonId, Question, QuestionId, Quiz, QuizAttempt,
    QuizHeader, QuizId, QuizResult, QuizSubmission, UserId, ValidatedQuestion,
};
use quiz_core::time::Clock;

use crate::backend::{AuthoringApi, IdentityApi, LearnerApi};
use crate::error::ApiError;

/// Passing score given to quizzes created through `create_quiz`.
pub const DEFAULT_PASSING_SCORE: u32 = 70;

/// Backend operations, used to address injected faults and to count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    FetchQuiz,
    SubmitQuiz,
    QuizHistory,
    QuizAttempt,
    CreateQuiz,
    UpdateQuizTitle,
    AddQuestion,
    DeleteQuestion,
    CurrentUser,
}

#[derive(Debug, Clone)]
struct QuizRecord {
    header: QuizHeader,
    questions: Vec<Question>,
    passing_score: u32,
    time_limit_minutes: Option<u32>,
}

impl QuizRecord {
    fn from_quiz(quiz: Quiz) -> Self {
        Self {
            header: quiz.header(),
            passing_score: quiz.passing_score(),
            time_limit_minutes: quiz.time_limit_minutes(),
            questions: quiz.questions().to_vec(),
        }
    }

    fn to_quiz(&self) -> Quiz {
        Quiz::new(
            self.header.clone(),
            self.questions.clone(),
            self.passing_score,
            self.time_limit_minutes,
        )
    }
}

#[derive(Debug, Default)]
struct State {
    quizzes: HashMap<LessonId, QuizRecord>,
    attempts: Vec<QuizAttempt>,
    user: Option<CurrentUser>,
    next_quiz_id: u64,
    next_question_id: u64,
    next_attempt_id: u64,
    call_log: Vec<Endpoint>,
    call_counts: HashMap<Endpoint, usize>,
    faults: HashMap<(Endpoint, usize), ApiError>,
    clock: Clock,
}

impl State {
    /// Count the call and return the fault scheduled for it, if any.
    fn record(&mut self, endpoint: Endpoint) -> Result<(), ApiError> {
        self.call_log.push(endpoint);
        let count = self.call_counts.entry(endpoint).or_insert(0);
        *count += 1;
        let nth = *count;
        match self.faults.remove(&(endpoint, nth)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn quiz_by_id_mut(&mut self, quiz_id: QuizId) -> Option<&mut QuizRecord> {
        self.quizzes
            .values_mut()
            .find(|record| record.header.id == quiz_id)
    }

    fn bump_ids_past(&mut self, quiz: &Quiz) {
        self.next_quiz_id = self.next_quiz_id.max(quiz.id().value());
        for id in quiz.questions().iter().filter_map(|question| question.id) {
            self.next_question_id = self.next_question_id.max(id.value());
        }
    }
}

/// In-memory backend for tests, demos and offline runs.
///
/// Grades submissions itself, and can fail the n-th call of any endpoint.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp attempts from `clock`. A fixed clock advances a minute per attempt.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.clock = clock;
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ApiError> {
        self.state
            .lock()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    /// Store a quiz as-is, replacing any quiz on the same lesson.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn seed_quiz(&self, quiz: Quiz) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.bump_ids_past(&quiz);
        state
            .quizzes
            .insert(quiz.lesson_id(), QuizRecord::from_quiz(quiz));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn set_current_user(&self, user: Option<CurrentUser>) -> Result<(), ApiError> {
        self.lock()?.user = user;
        Ok(())
    }

    /// Make the `nth` (1-based) call to `endpoint` fail with `error`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the state lock is poisoned.
    pub fn fail_on(&self, endpoint: Endpoint, nth: usize, error: ApiError) -> Result<(), ApiError> {
        self.lock()?.faults.insert((endpoint, nth), error);
        Ok(())
    }

    /// Number of calls made to `endpoint`, failed ones included.
    #[must_use]
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock()
            .map(|state| state.call_counts.get(&endpoint).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Every call in the order it was made.
    #[must_use]
    pub fn call_log(&self) -> Vec<Endpoint> {
        self.lock()
            .map(|state| state.call_log.clone())
            .unwrap_or_default()
    }

    /// Current server-side view of a lesson's quiz.
    #[must_use]
    pub fn quiz_for(&self, lesson_id: LessonId) -> Option<Quiz> {
        self.lock()
            .ok()
            .and_then(|state| state.quizzes.get(&lesson_id).map(QuizRecord::to_quiz))
    }
}

fn grade(record: &QuizRecord, submission: &QuizSubmission) -> QuizResult {
    let breakdown: Vec<AnswerBreakdown> = record
        .questions
        .iter()
        .filter_map(|question| {
            let question_id = question.id?;
            let user_answer = submission
                .answers
                .iter()
                .find(|answer| answer.question_id == question_id)
                .map(|answer| answer.selected_answer);
            Some(AnswerBreakdown {
                question_id,
                question_text: question.text.clone(),
                user_answer,
                correct_answer: question.correct_answer,
                is_correct: user_answer == Some(question.correct_answer),
                explanation: None,
            })
        })
        .collect();

    let total = u32::try_from(breakdown.len()).unwrap_or(u32::MAX);
    let correct = u32::try_from(breakdown.iter().filter(|entry| entry.is_correct).count())
        .unwrap_or(u32::MAX);
    let score = if total == 0 {
        0
    } else {
        correct.saturating_mul(100) / total
    };

    QuizResult {
        score,
        total_questions: total,
        correct_count: correct,
        passed: score >= record.passing_score,
        breakdown,
    }
}

#[async_trait]
impl LearnerApi for InMemoryBackend {
    async fn fetch_quiz(&self, lesson_id: LessonId) -> Result<Quiz, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::FetchQuiz)?;
        state
            .quizzes
            .get(&lesson_id)
            .map(QuizRecord::to_quiz)
            .ok_or(ApiError::NotFound)
    }

    async fn submit_quiz(
        &self,
        _user_id: UserId,
        submission: &QuizSubmission,
    ) -> Result<QuizResult, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::SubmitQuiz)?;
        let record = state
            .quizzes
            .get(&submission.lesson_id)
            .ok_or(ApiError::NotFound)?;
        let result = grade(record, submission);
        let title = record.header.title.clone();

        state.next_attempt_id += 1;
        let id = AttemptId::new(state.next_attempt_id);
        let attempted_at = state.clock.now();
        state.attempts.push(QuizAttempt {
            id,
            lesson_id: submission.lesson_id,
            title,
            attempted_at,
            score: result.score,
            total_questions: result.total_questions,
        });
        state.clock.advance(Duration::minutes(1));
        Ok(result)
    }

    async fn quiz_history(&self) -> Result<Vec<QuizAttempt>, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::QuizHistory)?;
        Ok(state.attempts.clone())
    }

    async fn quiz_attempt(&self, attempt_id: AttemptId) -> Result<QuizAttempt, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::QuizAttempt)?;
        state
            .attempts
            .iter()
            .find(|attempt| attempt.id == attempt_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }
}

#[async_trait]
impl AuthoringApi for InMemoryBackend {
    async fn create_quiz(
        &self,
        lesson_id: LessonId,
        title: &str,
    ) -> Result<QuizHeader, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::CreateQuiz)?;
        if state.quizzes.contains_key(&lesson_id) {
            return Err(ApiError::Status {
                status: 409,
                message: "lesson already has a quiz".into(),
            });
        }
        state.next_quiz_id += 1;
        let header = QuizHeader {
            id: QuizId::new(state.next_quiz_id),
            lesson_id,
            title: title.to_owned(),
        };
        state.quizzes.insert(
            lesson_id,
            QuizRecord {
                header: header.clone(),
                questions: Vec::new(),
                passing_score: DEFAULT_PASSING_SCORE,
                time_limit_minutes: None,
            },
        );
        Ok(header)
    }

    async fn update_quiz_title(
        &self,
        quiz_id: QuizId,
        _lesson_id: LessonId,
        title: &str,
    ) -> Result<QuizHeader, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::UpdateQuizTitle)?;
        let record = state.quiz_by_id_mut(quiz_id).ok_or(ApiError::NotFound)?;
        record.header.title = title.to_owned();
        Ok(record.header.clone())
    }

    async fn add_question(
        &self,
        quiz_id: QuizId,
        question: &ValidatedQuestion,
    ) -> Result<Question, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::AddQuestion)?;
        state.next_question_id += 1;
        let id = QuestionId::new(state.next_question_id);
        let record = state.quiz_by_id_mut(quiz_id).ok_or(ApiError::NotFound)?;
        let persisted = question.clone().assign_id(id);
        record.questions.push(persisted.clone());
        Ok(persisted)
    }

    async fn delete_question(&self, question_id: QuestionId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::DeleteQuestion)?;
        for record in state.quizzes.values_mut() {
            if let Some(pos) = record
                .questions
                .iter()
                .position(|question| question.id == Some(question_id))
            {
                record.questions.remove(pos);
                return Ok(());
            }
        }
        Err(ApiError::NotFound)
    }
}

#[async_trait]
impl IdentityApi for InMemoryBackend {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let mut state = self.lock()?;
        state.record(Endpoint::CurrentUser)?;
        state
            .user
            .clone()
            .ok_or(ApiError::Unauthorized { status: 401 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerLetter, QuestionDraft, SubmittedAnswer};

    fn question(id: u64, correct: AnswerLetter) -> Question {
        QuestionDraft::new(format!("Q{id}"), ["a", "b", "c", "d"], correct)
            .validate()
            .unwrap()
            .assign_id(QuestionId::new(id))
    }

    fn seeded() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        let quiz = Quiz::new(
            QuizHeader {
                id: QuizId::new(1),
                lesson_id: LessonId::new(5),
                title: "Lifetimes".into(),
            },
            vec![question(10, AnswerLetter::A), question(11, AnswerLetter::C)],
            50,
            None,
        );
        backend.seed_quiz(quiz).unwrap();
        backend
    }

    #[tokio::test]
    async fn grades_submission_and_records_attempt() {
        let backend = seeded();
        let submission = QuizSubmission {
            lesson_id: LessonId::new(5),
            answers: vec![
                SubmittedAnswer {
                    question_id: QuestionId::new(10),
                    selected_answer: AnswerLetter::A,
                },
                SubmittedAnswer {
                    question_id: QuestionId::new(11),
                    selected_answer: AnswerLetter::B,
                },
            ],
        };

        let result = backend
            .submit_quiz(UserId::new(1), &submission)
            .await
            .unwrap();
        assert_eq!(result.score, 50);
        assert_eq!(result.correct_count, 1);
        assert!(result.passed);
        assert!(!result.breakdown[1].is_correct);

        let history = backend.quiz_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "Lifetimes");

        let attempt = backend.quiz_attempt(history[0].id).await.unwrap();
        assert_eq!(attempt, history[0]);
        assert!(matches!(
            backend.quiz_attempt(AttemptId::new(99)).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn injected_fault_hits_only_the_nth_call() {
        let backend = seeded();
        backend
            .fail_on(Endpoint::FetchQuiz, 2, ApiError::Transport("reset".into()))
            .unwrap();

        assert!(backend.fetch_quiz(LessonId::new(5)).await.is_ok());
        assert!(backend.fetch_quiz(LessonId::new(5)).await.is_err());
        assert!(backend.fetch_quiz(LessonId::new(5)).await.is_ok());
        assert_eq!(backend.call_count(Endpoint::FetchQuiz), 3);
    }

    #[tokio::test]
    async fn new_question_ids_do_not_collide_with_seeded_ones() {
        let backend = seeded();
        let draft = QuestionDraft::new("Q", ["a", "b", "c", "d"], AnswerLetter::D)
            .validate()
            .unwrap();
        let added = backend.add_question(QuizId::new(1), &draft).await.unwrap();
        assert_eq!(added.id, Some(QuestionId::new(12)));
        assert_eq!(backend.quiz_for(LessonId::new(5)).unwrap().question_count(), 3);
    }

    #[tokio::test]
    async fn second_quiz_for_a_lesson_is_rejected() {
        let backend = seeded();
        let err = backend
            .create_quiz(LessonId::new(5), "Again")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 409, .. }));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let backend = InMemoryBackend::new();
        let err = backend.current_user().await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
