//! Rating aggregation into per-dimension averages and a weighted score.
//!
//! # Invariants
//! - Weights are fixed and sum to 1.0.
//! - Every numeric output is rounded to one decimal place.
//! - No ratings yields an all-zero result, never NaN.

use serde::{Deserialize, Serialize};

pub const COMIDA_WEIGHT: f64 = 0.5;
pub const AMBIENTE_WEIGHT: f64 = 0.3;
pub const PRECO_JUSTO_WEIGHT: f64 = 0.2;

/// Anything carrying the three rating dimensions.
pub trait RatingDimensions {
    fn comida(&self) -> f64;
    fn ambiente(&self) -> f64;
    fn preco_justo(&self) -> f64;
}

/// Bare rating triple, for callers that do not hold full reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
}

impl Rating {
    pub fn new(comida: f64, ambiente: f64, preco_justo: f64) -> Self {
        Self {
            comida,
            ambiente,
            preco_justo,
        }
    }
}

impl RatingDimensions for Rating {
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

/// Derived score summary. Recomputed on every read, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreInfo {
    /// Weighted composite of the three averages.
    pub score: f64,
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
    pub reviews_count: usize,
}

/// Aggregates ratings into averages and the weighted composite score.
pub fn compute_score<R: RatingDimensions>(ratings: &[R]) -> ScoreInfo {
    if ratings.is_empty() {
        return ScoreInfo::default();
    }

    let (comida_total, ambiente_total, preco_total) =
        ratings.iter().fold((0.0, 0.0, 0.0), |(c, a, p), rating| {
            (
                c + rating.comida(),
                a + rating.ambiente(),
                p + rating.preco_justo(),
            )
        });

    let count = ratings.len() as f64;
    let comida = comida_total / count;
    let ambiente = ambiente_total / count;
    let preco_justo = preco_total / count;
    let weighted =
        comida * COMIDA_WEIGHT + ambiente * AMBIENTE_WEIGHT + preco_justo * PRECO_JUSTO_WEIGHT;

    ScoreInfo {
        score: round_one_decimal(weighted),
        comida: round_one_decimal(comida),
        ambiente: round_one_decimal(ambiente),
        preco_justo: round_one_decimal(preco_justo),
        reviews_count: ratings.len(),
    }
}

/// Rounds half away from zero at the tenths digit.
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
