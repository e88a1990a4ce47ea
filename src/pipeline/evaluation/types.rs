use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Qualitative band for an SCR score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrLabel {
    Excellent,
    Good,
    Weak,
    Poor,
}

impl ScrLabel {
    /// Band a raw score. Thresholds are checked from the top down and each
    /// band includes its lower bound.
    pub fn from_score(scr: f64) -> Self {
        if scr >= 0.75 {
            ScrLabel::Excellent
        } else if scr >= 0.55 {
            ScrLabel::Good
        } else if scr >= 0.35 {
            ScrLabel::Weak
        } else {
            ScrLabel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrLabel::Excellent => "excellent",
            ScrLabel::Good => "good",
            ScrLabel::Weak => "weak",
            ScrLabel::Poor => "poor",
        }
    }
}

impl std::fmt::Display for ScrLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluation of a (report, rewrite) pair. Serializes to the flat
/// key-value shape consumed by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    /// SCR rounded to 3 decimals. May exceed 1.0.
    pub scr_score: f64,
    /// Band of the unrounded SCR.
    pub scr_label: ScrLabel,
    pub negation_safe: bool,
    /// Ontology terms dropped by the rewrite, in ontology order.
    pub critical_terms_missing: Vec<String>,
    /// Grade level of the simplified text.
    pub readability_grade: f64,
}

/// A (report, rewrite) pair as submitted by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPair {
    pub original: String,
    pub simplified: String,
}

/// Structured result of the safe-rewrite enforcer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    /// The rewrite, with a warning block appended when `patched`.
    pub text: String,
    pub patched: bool,
    /// Terms that received a corrective line, in ontology order.
    pub added_terms: Vec<String>,
}

/// Evaluate, patch if needed, and re-evaluate the patched text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub text: String,
    pub patched: bool,
    /// Metrics of the rewrite as submitted.
    pub metrics: MetricsRecord,
    /// Metrics of the patched text. `None` when nothing was patched.
    pub post_metrics: Option<MetricsRecord>,
    /// Terms still reported missing after patching. Non-empty only when a
    /// gloss does not restate its term literally.
    pub unresolved_terms: Vec<String>,
}

/// Failure to produce a trustworthy score. Every variant means the
/// embedding or readability subsystem could not be used; callers decide
/// whether to retry, degrade or surface the error.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Embedding model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Embedding model initialization: {0}")]
    ModelInit(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Readability scoring unavailable: {0}")]
    ReadabilityUnavailable(String),
}

impl EvaluationError {
    /// All evaluation failures belong to the "unavailable" class: none of
    /// them may be replaced by a default score.
    pub fn is_unavailable(&self) -> bool {
        true
    }
}

/// Encodes text into a fixed-size dense vector. Implementations are loaded
/// once and shared across threads.
pub trait TextEmbedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EvaluationError>;
    fn dimension(&self) -> usize;
    /// Identifier of the underlying model, for diagnostics.
    fn model_id(&self) -> &str;
}

/// Grade-level reading score for a text.
pub trait ReadabilityScorer: Send + Sync {
    fn grade(&self, text: &str) -> Result<f64, EvaluationError>;
}
