//! Critical clinical term ontology.
//!
//! Terms are surface strings matched case-insensitively as substrings.
//! No stemming or spelling folding: "lesions" contains "lesion" and so
//! matches, while "tumour" never matches "tumor".

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Clinically significant surface strings, grouped by specialty.
/// Declaration order is the reporting order of the term-loss detector.
pub const CRITICAL_MEDICAL_TERMS: &[&str] = &[
    // General findings
    "lesion", "mass", "tumor", "nodule", "opacity", "abnormality", "cyst",
    "abscess", "edema", "effusion", "consolidation",
    // Dangerous diagnoses
    "embolism", "pulmonary embolism", "aneurysm", "dissection",
    "stroke", "infarct", "ischemia", "hemorrhage", "bleeding",
    // Oncology
    "malignant", "malignancy", "neoplasm", "metastasis", "metastatic",
    "carcinoma", "sarcoma", "adenocarcinoma", "lymphoma", "melanoma",
    // Bone & trauma
    "fracture", "compression fracture", "dislocation", "subluxation",
    "comminuted", "hairline fracture", "degeneration",
    // Cardiovascular
    "stenosis", "thrombosis", "thrombus", "arrhythmia", "atrial fibrillation",
    "heart failure", "myocardial infarction", "cardiomegaly", "pericardial effusion",
    // Respiratory
    "pneumothorax", "collapse", "atelectasis", "emphysema", "copd", "bronchitis",
    // Abdomen
    "hepatomegaly", "splenomegaly", "cholelithiasis", "nephrolithiasis",
    "pancreatitis", "appendicitis", "colitis",
    // Neurology
    "multiple sclerosis", "contusion", "hematoma", "cerebral edema",
    "hydrocephalus",
    // Infections
    "cellulitis", "sepsis", "osteomyelitis", "pneumonia",
    // Reproductive
    "ectopic pregnancy", "ovarian cyst", "fibroid",
    // Ophthalmology
    "glaucoma", "cataract",
    // Dermatology
    "psoriasis", "eczema",
];

/// Patient-friendly glosses for a handful of terms. Each gloss names its
/// term, so a corrected rewrite no longer reports that term as missing.
pub const PATIENT_FRIENDLY_GLOSSES: &[(&str, &str)] = &[
    ("lesion", "a small abnormal area of tissue (called a lesion)"),
    ("mass", "a lump or growth (called a mass)"),
    ("tumor", "a growth of cells (called a tumor)"),
    ("embolism", "a blood clot blocking a vessel (called an embolism)"),
    ("aneurysm", "a bulging weak spot in a vessel (called an aneurysm)"),
    ("fracture", "a broken bone (called a fracture)"),
    ("pneumothorax", "a collapsed lung (called a pneumothorax)"),
    ("hemorrhage", "bleeding inside the body (called a hemorrhage)"),
    ("metastasis", "cancer that has spread (called metastasis)"),
];

static CLINICAL_ONTOLOGY: LazyLock<TermOntology> = LazyLock::new(|| {
    TermOntology::new(
        CRITICAL_MEDICAL_TERMS
            .iter()
            .map(|term| {
                let gloss = PATIENT_FRIENDLY_GLOSSES
                    .iter()
                    .find(|(t, _)| t == term)
                    .map(|(_, g)| g.to_string());
                OntologyEntry {
                    term: term.to_string(),
                    gloss,
                }
            })
            .collect(),
    )
});

/// One ontology term with its optional patient-friendly gloss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyEntry {
    pub term: String,
    #[serde(default)]
    pub gloss: Option<String>,
}

impl OntologyEntry {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            gloss: None,
        }
    }

    pub fn with_gloss(term: impl Into<String>, gloss: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            gloss: Some(gloss.into()),
        }
    }

    /// Whether the gloss restates the bare term. A gloss that doesn't will
    /// keep the term reported as missing after enforcement.
    pub fn gloss_names_term(&self) -> bool {
        match &self.gloss {
            Some(gloss) => gloss.to_lowercase().contains(&self.term.to_lowercase()),
            None => true,
        }
    }
}

/// Immutable, ordered set of critical terms.
#[derive(Debug, Clone, PartialEq)]
pub struct TermOntology {
    entries: Vec<OntologyEntry>,
    /// Lowercased `entries[i].term`, precomputed for matching.
    needles: Vec<String>,
}

impl TermOntology {
    pub fn new(entries: Vec<OntologyEntry>) -> Self {
        let needles = entries.iter().map(|e| e.term.to_lowercase()).collect();
        Self { entries, needles }
    }

    /// Ontology without glosses, e.g. for test fixtures.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(terms.into_iter().map(OntologyEntry::new).collect())
    }

    /// The built-in clinical ontology.
    pub fn clinical() -> Self {
        CLINICAL_ONTOLOGY.clone()
    }

    pub fn entries(&self) -> &[OntologyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries paired with their lowercase match needle, in declaration order.
    pub(crate) fn iter_with_needles(&self) -> impl Iterator<Item = (&OntologyEntry, &str)> {
        self.entries
            .iter()
            .zip(self.needles.iter().map(String::as_str))
    }

    pub fn entry(&self, term: &str) -> Option<&OntologyEntry> {
        self.entries.iter().find(|e| e.term == term)
    }

    pub fn gloss(&self, term: &str) -> Option<&str> {
        self.entry(term).and_then(|e| e.gloss.as_deref())
    }

    /// Terms whose gloss does not restate them. Enforcement cannot clear
    /// these; they stay reported as missing after patching.
    pub fn unrestated_gloss_terms(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !e.gloss_names_term())
            .map(|e| e.term.as_str())
            .collect()
    }
}

impl Default for TermOntology {
    fn default() -> Self {
        Self::clinical()
    }
}
