//! Length-change signal between a report and its rewrite.

/// A rewrite may be this much longer than the report before the
/// expansion penalty applies.
pub const EXPANSION_ALLOWANCE: f64 = 1.2;

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length-change signal, word-count based.
///
/// While the rewrite stays within the +20% allowance this is the
/// contraction fraction `(o - s) / o`, floored at 0. Past the allowance it
/// becomes the expansion penalty `s / o - 1`, which is unbounded. An empty
/// original scores 0.0.
pub fn contraction(original: &str, simplified: &str) -> f64 {
    let o = word_count(original) as f64;
    let s = word_count(simplified) as f64;

    if o == 0.0 {
        return 0.0;
    }

    if s <= o * EXPANSION_ALLOWANCE {
        ((o - s) / o).max(0.0)
    } else {
        (s / o - 1.0).max(0.0)
    }
}
