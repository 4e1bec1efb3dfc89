use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel stored in an answer slot that has not been answered yet.
pub const UNANSWERED: i32 = -1;

/// One of the four option letters a question offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLetter {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid answer letter: {raw:?}")]
pub struct ParseLetterError {
    raw: String,
}

impl AnswerLetter {
    pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Strict mapping from an option index (0..=3) to its letter.
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::D),
            _ => None,
        }
    }

    /// Letter for a stored answer slot.
    ///
    /// Anything outside `0..=3`, including the [`UNANSWERED`] sentinel, maps to
    /// `A`. Callers that submit answers must reject unanswered slots before
    /// reaching this function.
    #[must_use]
    pub fn for_slot(slot: i32) -> Self {
        Self::from_index(slot).unwrap_or(Self::A)
    }

    /// Stored answer-slot value for this letter.
    #[must_use]
    pub const fn index(self) -> i32 {
        self as i32
    }

    /// Zero-based position among the four options.
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerLetter {
    type Err = ParseLetterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            "C" | "c" => Ok(Self::C),
            "D" | "d" => Ok(Self::D),
            other => Err(ParseLetterError {
                raw: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_indices_map_to_letters_in_order() {
        assert_eq!(AnswerLetter::for_slot(0), AnswerLetter::A);
        assert_eq!(AnswerLetter::for_slot(1), AnswerLetter::B);
        assert_eq!(AnswerLetter::for_slot(2), AnswerLetter::C);
        assert_eq!(AnswerLetter::for_slot(3), AnswerLetter::D);
    }

    #[test]
    fn unanswered_slot_falls_back_to_a() {
        assert_eq!(AnswerLetter::for_slot(UNANSWERED), AnswerLetter::A);
        assert_eq!(AnswerLetter::from_index(UNANSWERED), None);
    }

    #[test]
    fn index_inverts_from_index() {
        for letter in AnswerLetter::ALL {
            assert_eq!(AnswerLetter::from_index(letter.index()), Some(letter));
        }
    }

    #[test]
    fn position_follows_option_order() {
        for (expected, letter) in AnswerLetter::ALL.into_iter().enumerate() {
            assert_eq!(letter.position(), expected);
            assert_eq!(letter.index(), letter.position() as i32);
        }
    }

    #[test]
    fn parses_lowercase_and_rejects_garbage() {
        assert_eq!("c".parse::<AnswerLetter>().unwrap(), AnswerLetter::C);
        assert!("E".parse::<AnswerLetter>().is_err());
        assert!("".parse::<AnswerLetter>().is_err());
    }

    #[test]
    fn serializes_as_bare_letter() {
        let json = serde_json::to_string(&AnswerLetter::D).unwrap();
        assert_eq!(json, "\"D\"");
    }
}
