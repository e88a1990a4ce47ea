use super::ontology::{OntologyEntry, TermOntology};

/// Ontology entries present in the report but absent from the rewrite,
/// in ontology declaration order.
///
/// Literal, case-insensitive substring matching: a paraphrase that drops
/// the term ("spot" for "lesion") is reported as a loss.
pub fn missing_entries<'a>(
    ontology: &'a TermOntology,
    original: &str,
    simplified: &str,
) -> Vec<&'a OntologyEntry> {
    let o = original.to_lowercase();
    let s = simplified.to_lowercase();

    ontology
        .iter_with_needles()
        .filter(|(_, needle)| o.contains(needle) && !s.contains(needle))
        .map(|(entry, _)| entry)
        .collect()
}

/// Terms of [`missing_entries`], as declared in the ontology.
pub fn missing_terms(ontology: &TermOntology, original: &str, simplified: &str) -> Vec<String> {
    missing_entries(ontology, original, simplified)
        .into_iter()
        .map(|e| e.term.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ontology() -> TermOntology {
        TermOntology::clinical()
    }

    #[test]
    fn paraphrased_term_is_reported() {
        let missing = missing_terms(
            &ontology(),
            "CT shows a small lesion in the liver.",
            "The scan shows a small spot in the liver.",
        );
        assert!(missing.contains(&"lesion".to_string()));
    }

    #[test]
    fn verbatim_copy_loses_nothing() {
        let text = "Pulmonary embolism with right pleural effusion. No pneumothorax.";
        assert!(missing_terms(&ontology(), text, text).is_empty());
    }

    #[test]
    fn terms_absent_from_original_are_never_reported() {
        assert!(missing_terms(&ontology(), "Normal study.", "All good.").is_empty());
    }

    #[test]
    fn order_follows_ontology_not_text() {
        let missing = missing_terms(
            &ontology(),
            "Fracture of the radius. Adjacent hematoma. Small cyst.",
            "Broken arm.",
        );
        assert_eq!(missing, vec!["cyst", "fracture", "hematoma"]);
    }

    #[test]
    fn overlapping_terms_are_each_checked() {
        let missing = missing_terms(
            &ontology(),
            "Findings consistent with pulmonary embolism.",
            "There is an embolism in the lung.",
        );
        assert_eq!(missing, vec!["pulmonary embolism"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let missing = missing_terms(&ontology(), "Known COPD.", "Known copd, stable.");
        assert!(missing.is_empty());
    }

    #[test]
    fn fixture_ontology_reports_declared_casing() {
        let fixture = TermOntology::from_terms(["Nodule", "mass"]);
        let missing = missing_terms(&fixture, "A NODULE and a mass.", "A mass.");
        assert_eq!(missing, vec!["Nodule"]);
    }
}
