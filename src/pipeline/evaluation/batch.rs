//! Dataset-level summary over many (report, rewrite) pairs.

use serde::{Deserialize, Serialize};

use super::types::MetricsRecord;

/// Metrics of one pair plus the grade level of its source report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(flatten)]
    pub metrics: MetricsRecord,
    pub original_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub pair_count: usize,
    pub mean_scr: f64,
    pub mean_original_grade: f64,
    pub mean_simplified_grade: f64,
    /// Pairs whose rewrite lost a negation marker.
    pub negation_failures: usize,
    /// Pairs whose rewrite dropped at least one critical term.
    pub pairs_with_missing_terms: usize,
}

impl BatchReport {
    /// Aggregate per-pair items. An empty batch has zero means.
    pub fn from_items(items: Vec<BatchItem>) -> Self {
        let pair_count = items.len();
        let mean = |f: fn(&BatchItem) -> f64| -> f64 {
            if pair_count == 0 {
                0.0
            } else {
                items.iter().map(f).sum::<f64>() / pair_count as f64
            }
        };

        let mean_scr = mean(|i| i.metrics.scr_score);
        let mean_original_grade = mean(|i| i.original_grade);
        let mean_simplified_grade = mean(|i| i.metrics.readability_grade);
        let negation_failures = items.iter().filter(|i| !i.metrics.negation_safe).count();
        let pairs_with_missing_terms = items
            .iter()
            .filter(|i| !i.metrics.critical_terms_missing.is_empty())
            .count();

        Self {
            items,
            pair_count,
            mean_scr,
            mean_original_grade,
            mean_simplified_grade,
            negation_failures,
            pairs_with_missing_terms,
        }
    }

    /// Average grade-level drop from report to rewrite.
    pub fn mean_grade_reduction(&self) -> f64 {
        self.mean_original_grade - self.mean_simplified_grade
    }
}
