//! Safe-rewrite enforcement: append a corrective block naming every
//! critical term the rewrite dropped.
//!
//! The block is only ever appended; existing content is never edited or
//! reordered. A second pass over the patched text adds nothing as long as
//! each corrective line names its term literally. Built-in glosses and the
//! generic line do; a custom gloss that doesn't will be reported again.

use super::ontology::{OntologyEntry, TermOntology};
use super::term_loss::missing_entries;
use super::types::RewriteOutcome;

pub const WARNING_HEADER: &str = "⚠️ Important information was missing in the simplified explanation.\n\
     To ensure medical safety, the following key findings have been added:";

/// One bullet line for a dropped term.
pub fn correction_line(entry: &OntologyEntry) -> String {
    match &entry.gloss {
        Some(gloss) => format!("- The report also notes {gloss}."),
        None => format!(
            "- The report contains an important finding: '{}'. Please ask a doctor for clarification.",
            entry.term
        ),
    }
}

/// Structured enforcement: the patched text plus what was added.
pub fn rewrite(ontology: &TermOntology, original: &str, simplified: &str) -> RewriteOutcome {
    let missing = missing_entries(ontology, original, simplified);
    if missing.is_empty() {
        return RewriteOutcome {
            text: simplified.to_string(),
            patched: false,
            added_terms: Vec::new(),
        };
    }

    let corrections: Vec<String> = missing.iter().map(|e| correction_line(e)).collect();

    let mut text = String::with_capacity(
        simplified.len() + WARNING_HEADER.len() + corrections.iter().map(|c| c.len() + 1).sum::<usize>() + 3,
    );
    text.push_str(simplified);
    text.push_str("\n\n");
    text.push_str(WARNING_HEADER);
    text.push('\n');
    text.push_str(&corrections.join("\n"));

    RewriteOutcome {
        text,
        patched: true,
        added_terms: missing.into_iter().map(|e| e.term.clone()).collect(),
    }
}

/// Return `simplified` unchanged when no critical term was dropped,
/// otherwise `simplified` followed by a blank line and the warning block.
pub fn enforce_safe_rewrite(ontology: &TermOntology, original: &str, simplified: &str) -> String {
    rewrite(ontology, original, simplified).text
}
