//! Flesch-Kincaid grade level.
//!
//! grade = 0.39 * (words / sentences) + 11.8 * (syllables / words) - 15.59
//!
//! Sentences of two words or fewer are not counted (headings, list
//! markers), with a floor of one sentence. Syllables are estimated from
//! vowel groups.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{EvaluationError, ReadabilityScorer};

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("Invalid sentence regex"));

/// Standard Flesch-Kincaid grade-level scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FleschKincaid;

impl FleschKincaid {
    pub fn new() -> Self {
        Self
    }
}

impl ReadabilityScorer for FleschKincaid {
    fn grade(&self, text: &str) -> Result<f64, EvaluationError> {
        Ok(flesch_kincaid_grade(text))
    }
}

/// Grade level rounded to one decimal. Text without words scores 0.0.
pub fn flesch_kincaid_grade(text: &str) -> f64 {
    let words = lexicon(text);
    if words.is_empty() {
        return 0.0;
    }

    let word_count = words.len() as f64;
    let sentences = sentence_count(text) as f64;
    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();

    let grade = 0.39 * (word_count / sentences) + 11.8 * (syllables as f64 / word_count) - 15.59;
    (grade * 10.0).round() / 10.0
}

/// Words with punctuation stripped; tokens that were only punctuation drop out.
fn lexicon(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn sentence_count(text: &str) -> usize {
    let counted = SENTENCE
        .find_iter(text)
        .filter(|m| lexicon(m.as_str()).len() > 2)
        .count();
    counted.max(1)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Vowel-group syllable estimate, at least one per word.
fn syllable_count(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if letters.is_empty() {
        return 1;
    }

    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    // Silent final "e" ("site"), but not consonant + "le" ("table").
    let n = letters.len();
    if count > 1 && letters[n - 1] == 'e' {
        let consonant_le = n >= 3 && letters[n - 2] == 'l' && !is_vowel(letters[n - 3]);
        if !consonant_le {
            count -= 1;
        }
    }

    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_sentence_grade() {
        assert!((flesch_kincaid_grade("The cat sat.") - (-2.6)).abs() < 1e-9);
    }

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(flesch_kincaid_grade(""), 0.0);
        assert_eq!(flesch_kincaid_grade("  ... !! "), 0.0);
    }

    #[test]
    fn jargon_reads_harder_than_plain_text() {
        let jargon = "Contrast-enhanced computed tomography demonstrates a hypodense hepatic lesion \
                      consistent with metastatic adenocarcinoma.";
        let plain = "The scan shows a dark spot on the liver. It may be a cancer that has spread.";
        assert!(flesch_kincaid_grade(jargon) > flesch_kincaid_grade(plain));
    }

    #[test]
    fn syllable_estimates() {
        assert_eq!(syllable_count("cat"), 1);
        assert_eq!(syllable_count("site"), 1);
        assert_eq!(syllable_count("table"), 2);
        assert_eq!(syllable_count("liver"), 2);
        assert_eq!(syllable_count("pneumothorax"), 4);
        assert_eq!(syllable_count("2"), 1);
    }

    #[test]
    fn short_fragments_are_not_sentences() {
        assert_eq!(sentence_count("Findings: The liver is normal. The spleen is normal."), 2);
        assert_eq!(sentence_count("Ok."), 1);
    }

    #[test]
    fn scorer_trait_wraps_formula() {
        let scorer = FleschKincaid::new();
        assert_eq!(scorer.grade("The cat sat.").unwrap(), flesch_kincaid_grade("The cat sat."));
    }
}
