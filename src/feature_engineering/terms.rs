//! Fixed key-term vocabulary scoring
//!
//! The vocabulary is hard-coded and ships inside the model artifact;
//! nothing about it is learned at predict time.

use crate::error::{Result, TenderError};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Key terms scored against tender text, in feature order
pub const KEY_TERMS: [&str; 10] = [
    "software",
    "support",
    "provision",
    "computer",
    "services",
    "systems",
    "management",
    "works",
    "package",
    "technical",
];

/// Fixed importance weight for a vocabulary term
pub fn term_weight(term: &str) -> f64 {
    match term {
        "software" => 2.5,
        "support" => 2.0,
        "computer" => 1.8,
        "technical" => 1.5,
        "services" => 1.3,
        "systems" => 1.2,
        _ => 1.0,
    }
}

/// Weighted term-frequency scorer over the fixed vocabulary.
///
/// Each score is `occurrences / word_count * weight`, capped at 1.0.
/// Matching is case-insensitive on whole words. Empty or whitespace-only
/// text scores zero for every term.
///
/// Serializes as its term list; patterns are recompiled on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ScorerState", into = "ScorerState")]
pub struct KeyTermScorer {
    terms: Vec<String>,
    weights: Vec<f64>,
    patterns: Vec<Regex>,
}

#[derive(Serialize, Deserialize)]
struct ScorerState {
    terms: Vec<String>,
}

impl KeyTermScorer {
    /// Build a scorer for the given vocabulary
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(|t| t.into().to_lowercase()).collect();
        if terms.is_empty() {
            return Err(TenderError::InvalidParameter {
                name: "terms".to_string(),
                value: "[]".to_string(),
                reason: "vocabulary must contain at least one term".to_string(),
            });
        }

        let weights = terms.iter().map(|t| term_weight(t)).collect();
        let patterns = terms
            .iter()
            .map(|t| {
                Regex::new(&format!(r"\b{}\b", regex::escape(t))).map_err(|e| {
                    TenderError::InvalidParameter {
                        name: "terms".to_string(),
                        value: t.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            terms,
            weights,
            patterns,
        })
    }

    /// Score a text, one value per vocabulary term in order
    pub fn score(&self, text: &str) -> Vec<f64> {
        let lowered = text.to_lowercase();
        let word_count = lowered.split_whitespace().count();
        if word_count == 0 {
            return vec![0.0; self.terms.len()];
        }

        self.patterns
            .iter()
            .zip(&self.weights)
            .map(|(pattern, &weight)| {
                let occurrences = pattern.find_iter(&lowered).count() as f64;
                let tf = occurrences / word_count as f64;
                (tf * weight).min(1.0)
            })
            .collect()
    }

    /// Vocabulary terms in feature order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Feature names for the term scores (`tf_<term>`)
    pub fn feature_names(&self) -> Vec<String> {
        self.terms.iter().map(|t| format!("tf_{}", t)).collect()
    }

    /// Number of vocabulary terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the vocabulary is empty (never true for a constructed scorer)
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl TryFrom<ScorerState> for KeyTermScorer {
    type Error = TenderError;

    fn try_from(state: ScorerState) -> Result<Self> {
        Self::new(state.terms)
    }
}

impl From<KeyTermScorer> for ScorerState {
    fn from(scorer: KeyTermScorer) -> Self {
        Self {
            terms: scorer.terms,
        }
    }
}
