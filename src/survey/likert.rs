//! Five-point Likert coding of survey answers.

/// Answer labels and their scores, strongest agreement first.
pub const LIKERT_LABELS: [(&str, f64); 5] = [
    ("매우 그렇다.", 5.0),
    ("그렇다.", 4.0),
    ("보통이다.", 3.0),
    ("그렇지 않다.", 2.0),
    ("전혀 그렇지 않다.", 1.0),
];

/// Highest score a single item can carry.
pub const MAX_SCORE: f64 = 5.0;

/// Score of one competency cell.
///
/// Known labels map to 5..=1. A bare number already in `0..=5` passes
/// through so that re-coding a normalized sheet is a no-op. Everything
/// else, blank cells included, counts as 0 ("no response").
pub fn score(cell: &str) -> f64 {
    if let Some((_, value)) = LIKERT_LABELS.iter().find(|(label, _)| *label == cell) {
        return *value;
    }

    match cell.trim().parse::<f64>() {
        Ok(value) if (0.0..=MAX_SCORE).contains(&value) => value,
        _ => 0.0,
    }
}
