//! Post-generation safety and quality evaluation of simplified reports.
//!
//! Given a report and a model-written rewrite, scores semantic retention
//! (SCR), checks that negations and critical terms survived, and can
//! append corrective text for dropped terms. Pure over its inputs apart
//! from the injected embedder and readability scorer; reads no files or
//! environment.

pub mod types;
pub mod ontology;
pub mod negation;
pub mod similarity;
pub mod length;
pub mod scr;
pub mod term_loss;
pub mod rewrite;
pub mod readability;
pub mod embedder;
pub mod batch;
pub mod orchestrator;

pub use batch::{BatchItem, BatchReport};
pub use embedder::{load_embedder, EmbeddingBackend, HashingEmbedder, OllamaEmbedder};
#[cfg(feature = "onnx-embeddings")]
pub use embedder::OnnxEmbedder;
pub use negation::NegationLexicon;
pub use ontology::{OntologyEntry, TermOntology};
pub use orchestrator::Evaluator;
pub use readability::FleschKincaid;
pub use scr::ScrBreakdown;
pub use types::{
    EvaluationError, MetricsRecord, ReadabilityScorer, ReportPair, ReviewOutcome, RewriteOutcome,
    ScrLabel, TextEmbedder,
};
