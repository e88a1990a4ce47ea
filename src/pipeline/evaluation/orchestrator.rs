use std::sync::Arc;

use super::batch::{BatchItem, BatchReport};
use super::length::contraction;
use super::negation::{lost_negation, negation_safe, NegationLexicon};
use super::ontology::TermOntology;
use super::readability::FleschKincaid;
use super::rewrite::{enforce_safe_rewrite, rewrite};
use super::scr::{round3, scr_breakdown, ScrBreakdown};
use super::similarity::similarity;
use super::term_loss::missing_terms;
use super::types::{
    EvaluationError, MetricsRecord, ReadabilityScorer, ReportPair, ReviewOutcome, RewriteOutcome,
    TextEmbedder,
};

/// Evaluation façade over one loaded embedder, one readability formula and
/// the term/negation lexicons. Cheap to clone; holds no per-call state.
#[derive(Clone)]
pub struct Evaluator {
    embedder: Arc<dyn TextEmbedder>,
    readability: Arc<dyn ReadabilityScorer>,
    ontology: Arc<TermOntology>,
    negations: Arc<NegationLexicon>,
}

impl Evaluator {
    /// Evaluator with the built-in clinical lexicons.
    pub fn new(embedder: Arc<dyn TextEmbedder>, readability: Arc<dyn ReadabilityScorer>) -> Self {
        Self {
            embedder,
            readability,
            ontology: Arc::new(TermOntology::clinical()),
            negations: Arc::new(NegationLexicon::clinical()),
        }
    }

    /// Evaluator with Flesch-Kincaid readability.
    pub fn with_embedder(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self::new(embedder, Arc::new(FleschKincaid::new()))
    }

    /// Replace the term ontology and negation lexicon.
    pub fn with_lexicons(mut self, ontology: TermOntology, negations: NegationLexicon) -> Self {
        self.ontology = Arc::new(ontology);
        self.negations = Arc::new(negations);
        self
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_id()
    }

    pub fn ontology(&self) -> &TermOntology {
        &self.ontology
    }

    pub fn negations(&self) -> &NegationLexicon {
        &self.negations
    }

    pub fn similarity(&self, original: &str, simplified: &str) -> Result<f64, EvaluationError> {
        similarity(self.embedder.as_ref(), original, simplified)
    }

    pub fn contraction(&self, original: &str, simplified: &str) -> f64 {
        contraction(original, simplified)
    }

    pub fn scr(&self, original: &str, simplified: &str) -> Result<ScrBreakdown, EvaluationError> {
        scr_breakdown(self.embedder.as_ref(), original, simplified)
    }

    pub fn negation_safe(&self, original: &str, simplified: &str) -> bool {
        negation_safe(&self.negations, original, simplified)
    }

    pub fn missing_terms(&self, original: &str, simplified: &str) -> Vec<String> {
        missing_terms(&self.ontology, original, simplified)
    }

    pub fn enforce_safe_rewrite(&self, original: &str, simplified: &str) -> String {
        enforce_safe_rewrite(&self.ontology, original, simplified)
    }

    pub fn rewrite(&self, original: &str, simplified: &str) -> RewriteOutcome {
        rewrite(&self.ontology, original, simplified)
    }

    /// All metrics for one pair. Embedding or readability failures
    /// propagate; no partial record is produced.
    pub fn evaluate_all(&self, original: &str, simplified: &str) -> Result<MetricsRecord, EvaluationError> {
        let breakdown = self.scr(original, simplified)?;
        let lost = lost_negation(&self.negations, original, simplified);
        let critical_terms_missing = self.missing_terms(original, simplified);
        let readability_grade = self.readability.grade(simplified)?;

        let record = MetricsRecord {
            scr_score: round3(breakdown.score),
            scr_label: breakdown.label(),
            negation_safe: lost.is_none(),
            critical_terms_missing,
            readability_grade,
        };

        log_evaluation(&breakdown, &record, lost);
        Ok(record)
    }

    /// Evaluate, patch dropped terms, and re-evaluate the patched text.
    pub fn review(&self, original: &str, simplified: &str) -> Result<ReviewOutcome, EvaluationError> {
        let metrics = self.evaluate_all(original, simplified)?;
        let outcome = self.rewrite(original, simplified);

        if !outcome.patched {
            return Ok(ReviewOutcome {
                text: outcome.text,
                patched: false,
                metrics,
                post_metrics: None,
                unresolved_terms: Vec::new(),
            });
        }

        let post = self.evaluate_all(original, &outcome.text)?;
        let unresolved_terms = post.critical_terms_missing.clone();
        if !unresolved_terms.is_empty() {
            tracing::warn!(
                terms = ?unresolved_terms,
                "Corrective text does not restate these terms; they remain reported as missing"
            );
        }

        Ok(ReviewOutcome {
            text: outcome.text,
            patched: true,
            metrics,
            post_metrics: Some(post),
            unresolved_terms,
        })
    }

    /// Evaluate every pair and aggregate. The first failure aborts the batch.
    pub fn evaluate_batch(&self, pairs: &[ReportPair]) -> Result<BatchReport, EvaluationError> {
        let items = pairs
            .iter()
            .map(|pair| -> Result<BatchItem, EvaluationError> {
                Ok(BatchItem {
                    metrics: self.evaluate_all(&pair.original, &pair.simplified)?,
                    original_grade: self.readability.grade(&pair.original)?,
                })
            })
            .collect::<Result<Vec<_>, EvaluationError>>()?;

        let report = BatchReport::from_items(items);
        tracing::info!(
            pairs = report.pair_count,
            mean_scr = report.mean_scr,
            mean_grade_reduction = report.mean_grade_reduction(),
            negation_failures = report.negation_failures,
            pairs_with_missing_terms = report.pairs_with_missing_terms,
            "Batch evaluation complete"
        );
        Ok(report)
    }
}

/// Log an evaluation WITHOUT report text.
fn log_evaluation(breakdown: &ScrBreakdown, record: &MetricsRecord, lost: Option<&str>) {
    tracing::debug!(
        similarity = breakdown.similarity,
        length_change = breakdown.length_change,
        scr = record.scr_score,
        label = %record.scr_label,
        readability = record.readability_grade,
        "Evaluation complete"
    );

    if let Some(marker) = lost {
        tracing::warn!(marker, "Negation marker lost in simplified text");
    }
    if !record.critical_terms_missing.is_empty() {
        tracing::warn!(
            count = record.critical_terms_missing.len(),
            terms = ?record.critical_terms_missing,
            "Critical terms missing from simplified text"
        );
    }
}
