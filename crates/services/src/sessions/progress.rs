/// Aggregated view of quiz session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    /// `None` for untimed quizzes.
    pub remaining_seconds: Option<u32>,
    pub can_submit: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }

    /// Percentage of questions answered, `0` for an empty quiz.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let percent = self.answered.saturating_mul(100) / self.total;
        u32::try_from(percent).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_down() {
        let progress = SessionProgress {
            total: 3,
            answered: 2,
            current_index: 1,
            remaining_seconds: None,
            can_submit: false,
        };
        assert_eq!(progress.percent(), 66);
        assert_eq!(progress.unanswered(), 1);
    }
}
