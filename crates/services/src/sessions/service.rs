use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use quiz_api::LearnerApi;
use quiz_core::model::{Question, Quiz, QuizResult, UserId};
use tracing::{debug, info, warn};

use super::answer_sheet::AnswerSheet;
use super::clock::{ClockState, SessionClock, TICK_PERIOD, Tick, Ticker};
use super::progress::SessionProgress;
use super::submission::{BusyFlag, SubmitOutcome, SubmitTrigger, build_submission};
use crate::error::SessionError;
use crate::notify::Notifier;

pub(crate) const INCOMPLETE_MESSAGE: &str = "Please answer all questions before submitting";
pub(crate) const PASSED_MESSAGE: &str = "Congratulations! You passed!";
pub(crate) const FAILED_MESSAGE: &str = "Keep trying! You can retake the quiz.";
pub(crate) const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit quiz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Answering,
    Results,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One learner's attempt at a quiz.
///
/// Cheap to clone; clones share the same attempt. The countdown task only
/// holds a weak reference, so dropping the last handle stops it.
#[derive(Clone)]
pub struct QuizSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    quiz: Quiz,
    user_id: UserId,
    api: Arc<dyn LearnerApi>,
    notifier: Notifier,
    busy: BusyFlag,
    state: Mutex<SessionState>,
}

struct SessionState {
    sheet: AnswerSheet,
    clock: SessionClock,
    ticker: Option<Ticker>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Open an attempt and start its countdown when the quiz is timed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the quiz has no questions.
    pub fn start(
        quiz: Quiz,
        user_id: UserId,
        api: Arc<dyn LearnerApi>,
        notifier: Notifier,
    ) -> Result<Self, SessionError> {
        if quiz.question_count() == 0 {
            return Err(SessionError::Empty);
        }

        let inner = Arc::new(SessionInner {
            state: Mutex::new(SessionState {
                sheet: AnswerSheet::new(quiz.question_count()),
                clock: SessionClock::idle(),
                ticker: None,
                result: None,
            }),
            quiz,
            user_id,
            api,
            notifier,
            busy: BusyFlag::default(),
        });
        arm_clock(&inner);
        info!(
            quiz_id = %inner.quiz.id(),
            questions = inner.quiz.question_count(),
            "quiz session started"
        );
        Ok(Self { inner })
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.inner.quiz
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.inner.user_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.inner.lock().result.is_some() {
            SessionPhase::Results
        } else {
            SessionPhase::Answering
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<QuizResult> {
        self.inner.lock().result.clone()
    }

    /// One slot per question: `-1` or an option index `0..=3`.
    #[must_use]
    pub fn answers(&self) -> Vec<i32> {
        self.inner.lock().sheet.slots().to_vec()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.inner.lock().sheet.current_index()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.inner.quiz.questions().get(self.current_index())
    }

    /// Record an answer. Ignored once results are showing, or when the
    /// index or value is out of range.
    pub fn select_answer(&self, index: usize, value: i32) -> bool {
        let mut state = self.inner.lock();
        if state.result.is_some() {
            return false;
        }
        state.sheet.select_answer(index, value)
    }

    pub fn select_current(&self, value: i32) -> bool {
        let mut state = self.inner.lock();
        if state.result.is_some() {
            return false;
        }
        state.sheet.select_current(value)
    }

    /// Move forward, staying on the last question. Returns the new index.
    pub fn next(&self) -> usize {
        let mut state = self.inner.lock();
        state.sheet.next();
        state.sheet.current_index()
    }

    pub fn previous(&self) -> usize {
        let mut state = self.inner.lock();
        state.sheet.previous();
        state.sheet.current_index()
    }

    /// Jump to `index`, clamped to the question range.
    pub fn go_to(&self, index: usize) -> usize {
        let mut state = self.inner.lock();
        state.sheet.go_to(index);
        state.sheet.current_index()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        let state = self.inner.lock();
        state.result.is_none() && state.sheet.can_submit()
    }

    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        self.inner.lock().sheet.progress_fraction()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let state = self.inner.lock();
        SessionProgress {
            total: state.sheet.len(),
            answered: state.sheet.answered_count(),
            current_index: state.sheet.current_index(),
            remaining_seconds: self.timed().then(|| state.clock.remaining_seconds()),
            can_submit: state.result.is_none() && state.sheet.can_submit(),
        }
    }

    /// Seconds left on the countdown, `None` for untimed quizzes.
    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.timed()
            .then(|| self.inner.lock().clock.remaining_seconds())
    }

    #[must_use]
    pub fn clock_state(&self) -> ClockState {
        self.inner.lock().clock.state()
    }

    /// Remaining time as `m:ss`.
    #[must_use]
    pub fn time_formatted(&self) -> String {
        self.inner.lock().clock.format_remaining()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.inner.busy.is_busy()
    }

    /// Send the answers for grading.
    ///
    /// A call made while another submission is in flight sends nothing and
    /// returns `SubmitOutcome::AlreadySubmitting`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCompleted` once results are showing,
    /// `SessionError::Incomplete` while any question is unanswered, and
    /// `SessionError::Api` when the backend call fails. A failed call leaves
    /// the answers in place so the learner can try again.
    pub async fn submit(&self) -> Result<SubmitOutcome, SessionError> {
        self.inner.submit(SubmitTrigger::Manual).await
    }

    /// Clear answers and results and restart the countdown from the full limit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SubmissionInFlight` while a submission is pending.
    pub fn retake(&self) -> Result<(), SessionError> {
        if self.inner.busy.is_busy() {
            return Err(SessionError::SubmissionInFlight);
        }
        {
            let mut state = self.inner.lock();
            state.sheet.reset();
            state.result = None;
        }
        arm_clock(&self.inner);
        debug!(quiz_id = %self.inner.quiz.id(), "quiz retake");
        Ok(())
    }

    /// Stop the countdown without submitting.
    pub fn close(&self) {
        let mut state = self.inner.lock();
        state.clock.cancel();
        state.ticker = None;
    }

    fn timed(&self) -> bool {
        self.inner.quiz.time_limit_minutes().is_some()
    }
}

impl SessionInner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SessionError> {
        let Some(_busy) = self.busy.try_acquire() else {
            debug!(?trigger, "submission already in flight");
            return Ok(SubmitOutcome::AlreadySubmitting);
        };

        let submission = {
            let state = self.lock();
            if state.result.is_some() {
                return Err(SessionError::AlreadyCompleted);
            }
            build_submission(&self.quiz, &state.sheet)
        };
        let submission = match submission {
            Ok(submission) => submission,
            Err(err) => {
                self.report_unsendable(&err, trigger);
                return Err(err);
            }
        };

        info!(quiz_id = %self.quiz.id(), ?trigger, "submitting quiz");
        match self.api.submit_quiz(self.user_id, &submission).await {
            Ok(result) => {
                {
                    let mut state = self.lock();
                    state.clock.cancel();
                    state.ticker = None;
                    state.result = Some(result.clone());
                }
                info!(score = result.score, passed = result.passed, "quiz graded");
                if result.passed {
                    self.notifier.success(PASSED_MESSAGE);
                } else {
                    self.notifier.info(FAILED_MESSAGE);
                }
                Ok(SubmitOutcome::Graded(result))
            }
            Err(err) => {
                warn!(error = %err, "quiz submission failed");
                self.notifier.error(SUBMIT_FAILED_MESSAGE);
                Err(err.into())
            }
        }
    }

    fn report_unsendable(&self, err: &SessionError, trigger: SubmitTrigger) {
        match (err, trigger) {
            (SessionError::Incomplete { .. }, SubmitTrigger::Manual) => {
                self.notifier.warning(INCOMPLETE_MESSAGE);
            }
            (SessionError::Incomplete { unanswered }, SubmitTrigger::TimeExpired) => {
                warn!(unanswered = unanswered.len(), "time expired with unanswered questions");
                self.notifier.warning(format!(
                    "Time is up! {} question(s) unanswered, quiz not submitted",
                    unanswered.len()
                ));
            }
            _ => {
                warn!(error = %err, "quiz cannot be submitted");
                self.notifier.error(SUBMIT_FAILED_MESSAGE);
            }
        }
    }
}

/// (Re)start the countdown and its ticker task for a timed quiz.
fn arm_clock(inner: &Arc<SessionInner>) {
    let mut state = inner.lock();
    state.ticker = None;
    if state.clock.start(inner.quiz.time_limit_minutes()) != ClockState::Running {
        return;
    }

    let weak = Arc::downgrade(inner);
    state.ticker = Ticker::spawn(TICK_PERIOD, move || on_tick(weak.clone()));
    if state.ticker.is_none() {
        warn!("no async runtime; quiz countdown will not advance");
    }
}

async fn on_tick(weak: Weak<SessionInner>) -> ControlFlow<()> {
    let Some(inner) = weak.upgrade() else {
        return ControlFlow::Break(());
    };

    {
        let mut state = inner.lock();
        match state.clock.tick() {
            Tick::Running { .. } => return ControlFlow::Continue(()),
            Tick::Stopped => return ControlFlow::Break(()),
            Tick::Expired => {
                // this task does the auto-submit, so it must not be aborted by it
                if let Some(ticker) = state.ticker.take() {
                    ticker.detach();
                }
            }
        }
    }

    info!(quiz_id = %inner.quiz.id(), "quiz time expired");
    // errors are already reported to the learner
    let _ = inner.submit(SubmitTrigger::TimeExpired).await;
    ControlFlow::Break(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationLevel, RecordingSink};
    use quiz_api::{ApiError, Endpoint, InMemoryBackend};
    use quiz_core::model::{
        AnswerLetter, LessonId, QuestionDraft, QuestionId, QuizHeader, QuizId,
    };

    fn quiz(limit: Option<u32>) -> Quiz {
        let questions = [AnswerLetter::B, AnswerLetter::C]
            .into_iter()
            .enumerate()
            .map(|(i, correct)| {
                QuestionDraft::new(format!("Q{i}"), ["a", "b", "c", "d"], correct)
                    .validate()
                    .unwrap()
                    .assign_id(QuestionId::new(100 + i as u64))
            })
            .collect();
        Quiz::new(
            QuizHeader {
                id: QuizId::new(1),
                lesson_id: LessonId::new(7),
                title: "Traits".into(),
            },
            questions,
            70,
            limit,
        )
    }

    fn session(limit: Option<u32>) -> (QuizSession, InMemoryBackend, Arc<RecordingSink>) {
        let backend = InMemoryBackend::new();
        backend.seed_quiz(quiz(limit)).unwrap();
        let sink = Arc::new(RecordingSink::new());
        let session = QuizSession::start(
            quiz(limit),
            UserId::new(3),
            Arc::new(backend.clone()),
            Notifier::new(sink.clone()),
        )
        .unwrap();
        (session, backend, sink)
    }

    #[test]
    fn empty_quiz_is_refused() {
        let empty = Quiz::new(quiz(None).header(), Vec::new(), 70, None);
        let err = QuizSession::start(
            empty,
            UserId::new(1),
            Arc::new(InMemoryBackend::new()),
            Notifier::tracing(),
        );
        assert!(matches!(err, Err(SessionError::Empty)));
    }

    #[tokio::test]
    async fn incomplete_submit_warns_and_sends_nothing() {
        let (session, backend, sink) = session(None);
        session.select_answer(0, 1);

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, SessionError::Incomplete { .. }));
        assert_eq!(backend.call_count(Endpoint::SubmitQuiz), 0);
        assert!(sink.contains(NotificationLevel::Warning, INCOMPLETE_MESSAGE));
    }

    #[tokio::test]
    async fn graded_submit_shows_results_and_locks_answers() {
        let (session, _backend, sink) = session(None);
        session.select_answer(0, 1);
        session.select_answer(1, 2);

        let outcome = session.submit().await.unwrap();

        let SubmitOutcome::Graded(result) = outcome else {
            panic!("expected a graded result");
        };
        assert_eq!(result.score, 100);
        assert!(result.passed);
        assert_eq!(session.phase(), SessionPhase::Results);
        assert!(sink.contains(NotificationLevel::Success, PASSED_MESSAGE));

        assert!(!session.select_answer(0, 3));
        assert_eq!(session.answers(), vec![1, 2]);
        assert!(matches!(
            session.submit().await,
            Err(SessionError::AlreadyCompleted)
        ));
    }

    #[tokio::test]
    async fn failing_score_is_reported_as_info() {
        let (session, _backend, sink) = session(None);
        session.select_answer(0, 0);
        session.select_answer(1, 0);

        session.submit().await.unwrap();

        assert!(sink.contains(NotificationLevel::Info, FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn failed_submit_keeps_answers_for_another_try() {
        let (session, backend, sink) = session(None);
        backend
            .fail_on(Endpoint::SubmitQuiz, 1, ApiError::Transport("reset".into()))
            .unwrap();
        session.select_answer(0, 1);
        session.select_answer(1, 2);

        assert!(matches!(session.submit().await, Err(SessionError::Api(_))));
        assert!(sink.contains(NotificationLevel::Error, SUBMIT_FAILED_MESSAGE));
        assert_eq!(session.phase(), SessionPhase::Answering);
        assert!(!session.is_submitting());

        assert!(matches!(
            session.submit().await,
            Ok(SubmitOutcome::Graded(_))
        ));
        assert_eq!(backend.call_count(Endpoint::SubmitQuiz), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_quiz_counts_down() {
        let (session, _backend, _sink) = session(Some(2));
        assert_eq!(session.clock_state(), ClockState::Running);
        assert_eq!(session.time_formatted(), "2:00");

        tokio::time::sleep(std::time::Duration::from_millis(3_500)).await;

        assert_eq!(session.remaining_seconds(), Some(117));
        assert_eq!(session.progress().remaining_seconds, Some(117));
    }

    #[tokio::test]
    async fn untimed_quiz_has_no_countdown() {
        let (session, _backend, _sink) = session(None);
        assert_eq!(session.clock_state(), ClockState::Idle);
        assert_eq!(session.remaining_seconds(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn close_stops_the_countdown() {
        let (session, _backend, _sink) = session(Some(1));
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        session.close();
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;

        assert_eq!(session.clock_state(), ClockState::Cancelled);
        assert_eq!(session.remaining_seconds(), Some(59));
    }
}
