//! Text vectorization for the baseline models

use crate::error::{Result, TenderError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Word tokenizer: lowercases and keeps alphanumeric runs of a minimum
/// length (two characters by default, matching the usual word pattern).
/// Stop words are off unless requested; the baselines keep function words
/// because the bigram features need them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextTokenizer {
    lowercase: bool,
    min_token_length: usize,
    stop_words: Vec<String>,
}

impl TextTokenizer {
    pub fn new() -> Self {
        Self {
            lowercase: true,
            min_token_length: 2,
            stop_words: Vec::new(),
        }
    }

    pub fn with_min_length(mut self, len: usize) -> Self {
        self.min_token_length = len.max(1);
        self
    }

    pub fn with_english_stop_words(mut self) -> Self {
        self.stop_words = vec![
            "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for",
            "of", "with", "by", "is", "was", "are", "were", "be", "have", "has",
            "it", "this", "that", "i", "you", "he", "she", "we", "they",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let processed = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        processed
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() >= self.min_token_length)
            .filter(|s| !self.stop_words.iter().any(|w| w == s))
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for TextTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn ngrams(tokens: &[String], range: (usize, usize)) -> Vec<String> {
    let mut out = Vec::new();
    for n in range.0..=range.1 {
        if tokens.len() >= n && n > 0 {
            for window in tokens.windows(n) {
                out.push(window.join(" "));
            }
        }
    }
    out
}

/// Count vectorizer with a document-frequency pruned vocabulary.
///
/// Vocabulary indices are assigned alphabetically, so transforms are
/// reproducible across runs regardless of document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    tokenizer: TextTokenizer,
    vocabulary: HashMap<String, usize>,
    min_df: usize,
    max_df: f64,
    max_features: Option<usize>,
    ngram_range: (usize, usize),
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self {
            tokenizer: TextTokenizer::new(),
            vocabulary: HashMap::new(),
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            ngram_range: (1, 1),
        }
    }

    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df.max(1);
        self
    }

    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_range = (min.max(1), max.max(min.max(1)));
        self
    }

    /// Build the vocabulary from a document collection
    pub fn fit(&mut self, documents: &[String]) -> Result<&mut Self> {
        let n_docs = documents.len();
        let max_df_count = (self.max_df * n_docs as f64).ceil() as usize;

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let tokens = self.tokenizer.tokenize(doc);
            let unique: HashSet<String> = ngrams(&tokens, self.ngram_range).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.min_df && *df <= max_df_count)
            .collect();

        if let Some(max_n) = self.max_features {
            // Keep the most frequent terms, then index alphabetically
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            kept.truncate(max_n);
        }
        kept.sort_by(|a, b| a.0.cmp(&b.0));

        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, (term, _))| (term, idx))
            .collect();

        Ok(self)
    }

    /// Term-count matrix, one row per document
    pub fn transform(&self, documents: &[String]) -> Result<Array2<f64>> {
        if self.vocabulary.is_empty() {
            return Err(TenderError::ModelNotFitted);
        }

        let mut counts = Array2::zeros((documents.len(), self.vocabulary.len()));
        for (doc_idx, doc) in documents.iter().enumerate() {
            let tokens = self.tokenizer.tokenize(doc);
            for term in ngrams(&tokens, self.ngram_range) {
                if let Some(&col) = self.vocabulary.get(&term) {
                    counts[[doc_idx, col]] += 1.0;
                }
            }
        }
        Ok(counts)
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    /// Vocabulary terms in column order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.clone();
        }
        names
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tf-idf vectorizer with smoothed idf and L2 row normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    counts: CountVectorizer,
    idf: Option<Array1<f64>>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            counts: CountVectorizer::new(),
            idf: None,
        }
    }

    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.counts = self.counts.with_min_df(min_df);
        self
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.counts = self.counts.with_max_features(n);
        self
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.counts = self.counts.with_ngram_range(min, max);
        self
    }

    pub fn fit(&mut self, documents: &[String]) -> Result<&mut Self> {
        self.counts.fit(documents)?;
        let count_matrix = self.counts.transform(documents)?;

        let n_docs = documents.len() as f64;
        let mut idf = Array1::zeros(count_matrix.ncols());
        for j in 0..count_matrix.ncols() {
            let df = count_matrix.column(j).iter().filter(|&&v| v > 0.0).count() as f64;
            idf[j] = ((n_docs + 1.0) / (df + 1.0)).ln() + 1.0;
        }

        self.idf = Some(idf);
        Ok(self)
    }

    pub fn transform(&self, documents: &[String]) -> Result<Array2<f64>> {
        let idf = self.idf.as_ref().ok_or(TenderError::ModelNotFitted)?;
        let mut matrix = self.counts.transform(documents)?;

        for mut row in matrix.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value *= idf[j];
            }
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for value in row.iter_mut() {
                    *value /= norm;
                }
            }
        }

        Ok(matrix)
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.counts.feature_names()
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateless hashing vectorizer: terms bucketed by hash, L2 normalized.
/// Nothing to fit, so transform never depends on training order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingVectorizer {
    n_features: usize,
    tokenizer: TextTokenizer,
    ngram_range: (usize, usize),
}

impl HashingVectorizer {
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features: n_features.max(1),
            tokenizer: TextTokenizer::new(),
            ngram_range: (1, 1),
        }
    }

    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        self.ngram_range = (min.max(1), max.max(min.max(1)));
        self
    }

    fn bucket(&self, term: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % self.n_features
    }

    pub fn transform(&self, documents: &[String]) -> Array2<f64> {
        let mut matrix = Array2::zeros((documents.len(), self.n_features));

        for (doc_idx, doc) in documents.iter().enumerate() {
            let tokens = self.tokenizer.tokenize(doc);
            for term in ngrams(&tokens, self.ngram_range) {
                matrix[[doc_idx, self.bucket(&term)]] += 1.0;
            }

            let mut row = matrix.row_mut(doc_idx);
            let norm: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for value in row.iter_mut() {
                    *value /= norm;
                }
            }
        }

        matrix
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
