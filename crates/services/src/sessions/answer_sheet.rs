use quiz_core::model::{AnswerLetter, UNANSWERED};

/// Per-question answer slots plus the question currently shown.
///
/// The slot count is fixed at construction and survives every reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: Vec<i32>,
    current: usize,
}

impl AnswerSheet {
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            slots: vec![UNANSWERED; question_count],
            current: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[i32] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<i32> {
        self.slots.get(index).copied()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Overwrite slot `index` with an option index (0..=3), or clear it with
    /// [`UNANSWERED`]. Anything else is ignored and returns `false`.
    pub fn select_answer(&mut self, index: usize, value: i32) -> bool {
        if value != UNANSWERED && AnswerLetter::from_index(value).is_none() {
            return false;
        }
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Answer the question currently shown.
    pub fn select_current(&mut self, value: i32) -> bool {
        self.select_answer(self.current, value)
    }

    pub fn next(&mut self) {
        self.go_to(self.current.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.go_to(self.current.saturating_sub(1));
    }

    /// Move to `index`, clamped to the last question.
    pub fn go_to(&mut self, index: usize) {
        self.current = index.min(self.slots.len().saturating_sub(1));
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|slot| **slot != UNANSWERED).count()
    }

    /// Indices of the questions still unanswered, in order.
    #[must_use]
    pub fn unanswered(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot == UNANSWERED)
            .map(|(index, _)| index)
            .collect()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.slots.iter().all(|slot| *slot != UNANSWERED)
    }

    /// Answered share in `0.0..=1.0`; zero for an empty sheet.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.slots.len() as f64
    }

    /// Clear every slot and go back to the first question.
    pub fn reset(&mut self) {
        self.slots.fill(UNANSWERED);
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unanswered_with_one_slot_per_question() {
        let sheet = AnswerSheet::new(4);
        assert_eq!(sheet.len(), 4);
        assert!(sheet.slots().iter().all(|slot| *slot == UNANSWERED));
        assert!(!sheet.can_submit());
        assert_eq!(sheet.unanswered(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn can_submit_only_when_every_slot_is_set() {
        let mut sheet = AnswerSheet::new(3);
        sheet.select_answer(0, 1);
        sheet.select_answer(1, 0);
        assert!(!sheet.can_submit());

        sheet.select_answer(2, 3);
        assert!(sheet.can_submit());

        sheet.select_answer(1, UNANSWERED);
        assert!(!sheet.can_submit());
        assert_eq!(sheet.unanswered(), vec![1]);
    }

    #[test]
    fn select_is_idempotent_and_ignores_bad_input() {
        let mut sheet = AnswerSheet::new(2);
        assert!(sheet.select_answer(1, 2));
        assert!(sheet.select_answer(1, 2));
        assert_eq!(sheet.slot(1), Some(2));

        assert!(!sheet.select_answer(2, 0));
        assert!(!sheet.select_answer(0, 4));
        assert!(!sheet.select_answer(0, -7));
        assert_eq!(sheet.slots(), &[UNANSWERED, 2]);
    }

    #[test]
    fn navigation_clamps_to_bounds() {
        let mut sheet = AnswerSheet::new(3);
        sheet.previous();
        assert_eq!(sheet.current_index(), 0);

        sheet.next();
        sheet.next();
        sheet.next();
        assert_eq!(sheet.current_index(), 2);

        sheet.go_to(99);
        assert_eq!(sheet.current_index(), 2);

        sheet.go_to(1);
        assert!(sheet.select_current(3));
        assert_eq!(sheet.slot(1), Some(3));
    }

    #[test]
    fn empty_sheet_navigation_is_harmless() {
        let mut sheet = AnswerSheet::new(0);
        sheet.next();
        sheet.go_to(5);
        assert_eq!(sheet.current_index(), 0);
        assert!(!sheet.select_current(0));
        assert_eq!(sheet.progress_fraction(), 0.0);
    }

    #[test]
    fn progress_is_answered_over_total() {
        let mut sheet = AnswerSheet::new(4);
        sheet.select_answer(0, 0);
        assert!((sheet.progress_fraction() - 0.25).abs() < f64::EPSILON);
        sheet.select_answer(3, 1);
        assert!((sheet.progress_fraction() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_keeps_length_and_rewinds() {
        let mut sheet = AnswerSheet::new(5);
        for index in 0..5 {
            sheet.select_answer(index, 2);
        }
        sheet.go_to(4);

        sheet.reset();

        assert_eq!(sheet.len(), 5);
        assert_eq!(sheet.current_index(), 0);
        assert_eq!(sheet.answered_count(), 0);
    }
}
