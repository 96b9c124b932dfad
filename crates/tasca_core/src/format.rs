//! Display helpers shared by the FFI and CLI surfaces.

use crate::model::tasca::PriceLevel;

/// Renders a price tier as repeated euro signs (`€€`).
pub fn format_price_level(level: PriceLevel) -> String {
    "€".repeat(usize::from(level.level()))
}

/// Renders metres below one kilometre, kilometres with one decimal above.
pub fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{} m", (distance_km * 1000.0).round())
    } else {
        format!("{distance_km:.1} km")
    }
}

/// Renders a score with exactly one decimal.
pub fn format_score(score: f64) -> String {
    format!("{score:.1}")
}
