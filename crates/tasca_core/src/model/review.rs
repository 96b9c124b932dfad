//! Review (rating) domain model.
//!
//! # Invariants
//! - A review belongs to exactly one tasca.
//! - Reviews are immutable once stored.

use crate::model::tasca::TascaId;
use crate::score::RatingDimensions;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ReviewId = Uuid;

const NICK_MIN_CHARS: usize = 2;
const COMMENT_MAX_CHARS: usize = 280;
const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 5.0;

/// Write-side validation failure for review fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewValidationError {
    NickTooShort,
    ScoreOutOfRange { dimension: &'static str, value: f64 },
    CommentTooLong(usize),
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NickTooShort => {
                write!(f, "user_nick must have at least {NICK_MIN_CHARS} characters")
            }
            Self::ScoreOutOfRange { dimension, value } => {
                write!(f, "{dimension} must be within [0, 5], got {value}")
            }
            Self::CommentTooLong(len) => write!(
                f,
                "comment must have at most {COMMENT_MAX_CHARS} characters, got {len}"
            ),
        }
    }
}

impl Error for ReviewValidationError {}

/// One user's three-dimension rating of a tasca.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub tasca_id: TascaId,
    pub user_nick: String,
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
    pub comment: String,
    /// Epoch milliseconds. Stamped by the store when `None`.
    pub created_at: Option<i64>,
    pub pending_sync: bool,
}

impl Review {
    /// Creates a review with a generated ID.
    pub fn new(
        tasca_id: TascaId,
        user_nick: impl Into<String>,
        comida: f64,
        ambiente: f64,
        preco_justo: f64,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tasca_id,
            user_nick: user_nick.into(),
            comida,
            ambiente,
            preco_justo,
            comment: comment.into(),
            created_at: None,
            pending_sync: false,
        }
    }

    /// Validates user-submitted fields.
    ///
    /// Half-point granularity is a UI convention and is not enforced.
    pub fn validate(&self) -> Result<(), ReviewValidationError> {
        if self.user_nick.trim().chars().count() < NICK_MIN_CHARS {
            return Err(ReviewValidationError::NickTooShort);
        }
        for (dimension, value) in [
            ("comida", self.comida),
            ("ambiente", self.ambiente),
            ("preco_justo", self.preco_justo),
        ] {
            if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(ReviewValidationError::ScoreOutOfRange { dimension, value });
            }
        }
        let comment_len = self.comment.chars().count();
        if comment_len > COMMENT_MAX_CHARS {
            return Err(ReviewValidationError::CommentTooLong(comment_len));
        }
        Ok(())
    }
}

impl RatingDimensions for Review {
    fn comida(&self) -> f64 {
        self.comida
    }

    fn ambiente(&self) -> f64 {
        self.ambiente
    }

    fn preco_justo(&self) -> f64 {
        self.preco_justo
    }
}

#[cfg(test)]
mod tests {
    use super::{Review, ReviewValidationError};
    use uuid::Uuid;

    fn sample() -> Review {
        Review::new(Uuid::new_v4(), "Tripeiro", 4.5, 4.0, 3.5, "Tripas de comer e chorar")
    }

    #[test]
    fn valid_review_passes() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn scores_outside_zero_to_five_are_rejected() {
        let mut review = sample();
        review.ambiente = 5.5;
        assert_eq!(
            review.validate(),
            Err(ReviewValidationError::ScoreOutOfRange {
                dimension: "ambiente",
                value: 5.5
            })
        );
    }

    #[test]
    fn long_comment_and_short_nick_are_rejected() {
        let mut review = sample();
        review.comment = "x".repeat(281);
        assert_eq!(
            review.validate(),
            Err(ReviewValidationError::CommentTooLong(281))
        );

        let mut review = sample();
        review.user_nick = "a".to_string();
        assert_eq!(review.validate(), Err(ReviewValidationError::NickTooShort));
    }
}
