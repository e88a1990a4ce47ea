//! Semantic Content Retention (SCR): similarity discounted by length change.

use serde::{Deserialize, Serialize};

use super::length::contraction;
use super::similarity::similarity;
use super::types::{EvaluationError, ScrLabel, TextEmbedder};

/// Below this similarity the rewrite is treated as unrelated to the report.
pub const MIN_SIMILARITY: f64 = 0.15;
/// Length change at or above this caps the reward at half the similarity.
pub const EXTREME_LENGTH_CHANGE: f64 = 0.8;
/// Final rescale. Scores above 1.0 are expected.
pub const SCR_SCALE: f64 = 2.0;

/// The two signals behind an SCR value and the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrBreakdown {
    pub similarity: f64,
    pub length_change: f64,
    pub score: f64,
}

impl ScrBreakdown {
    pub fn label(&self) -> ScrLabel {
        ScrLabel::from_score(self.score)
    }
}

/// Combine a similarity and a length-change signal into an SCR value.
pub fn combine(similarity: f64, length_change: f64) -> f64 {
    if similarity < MIN_SIMILARITY {
        return 0.0;
    }

    let retained = if length_change >= EXTREME_LENGTH_CHANGE {
        similarity * 0.5
    } else {
        similarity * (1.0 - length_change)
    };

    retained * SCR_SCALE
}

pub fn scr_breakdown(
    embedder: &dyn TextEmbedder,
    original: &str,
    simplified: &str,
) -> Result<ScrBreakdown, EvaluationError> {
    let sim = similarity(embedder, original, simplified)?;
    let pen = contraction(original, simplified);
    Ok(ScrBreakdown {
        similarity: sim,
        length_change: pen,
        score: combine(sim, pen),
    })
}

pub fn scr(
    embedder: &dyn TextEmbedder,
    original: &str,
    simplified: &str,
) -> Result<f64, EvaluationError> {
    scr_breakdown(embedder, original, simplified).map(|b| b.score)
}

/// Round to 3 decimals for reporting.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::evaluation::embedder::HashingEmbedder;

    #[test]
    fn unrelated_rewrite_scores_zero() {
        assert_eq!(combine(0.149, 0.0), 0.0);
        assert_eq!(combine(0.0, 5.0), 0.0);
    }

    #[test]
    fn threshold_similarity_is_scored() {
        assert!((combine(0.15, 0.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn no_length_change_doubles_similarity() {
        assert!((combine(0.8, 0.0) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn moderate_change_discounts_linearly() {
        assert!((combine(0.9, 0.3) - 1.26).abs() < 1e-12);
    }

    #[test]
    fn extreme_change_caps_at_half() {
        assert!((combine(0.6, 0.8) - 0.6).abs() < 1e-12);
        assert!((combine(0.6, 12.0) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn never_exceeds_twice_similarity() {
        for sim in [0.15, 0.3, 0.5, 0.77, 1.0] {
            for pen in [0.0, 0.1, 0.5, 0.79, 0.8, 3.0] {
                assert!(combine(sim, pen) <= SCR_SCALE * sim + 1e-12);
            }
        }
    }

    #[test]
    fn identical_text_is_excellent() {
        let embedder = HashingEmbedder::default();
        let text = "Patient has a 2cm mass.";
        let b = scr_breakdown(&embedder, text, text).unwrap();
        assert_eq!(b.length_change, 0.0);
        assert!((b.score - 2.0).abs() < 1e-6);
        assert_eq!(b.label(), ScrLabel::Excellent);
    }

    #[test]
    fn empty_rewrite_scores_zero() {
        let embedder = HashingEmbedder::default();
        assert_eq!(scr(&embedder, "Mild edema noted.", "").unwrap(), 0.0);
    }

    #[test]
    fn round3_rounds_half_away_from_zero() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(0.0), 0.0);
    }
}
