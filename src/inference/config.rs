//! Predictor configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, TenderError};
use crate::feature_engineering::KEY_TERMS;
use crate::training::ClassWeight;

/// Configuration for the bid predictor.
///
/// The defaults favour recall: a tender only needs a 5% estimated bid
/// probability to be surfaced, because a missed opportunity costs far more
/// than reviewing a weak lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Probability at or above which a tender is flagged as a bid
    pub prediction_threshold: f64,

    /// Number of trees in the forest
    pub n_estimators: usize,

    /// Maximum tree depth, unbounded when `None`
    pub max_depth: Option<usize>,

    /// Minimum samples required to split an internal node
    pub min_samples_split: usize,

    /// Minimum samples required in each leaf
    pub min_samples_leaf: usize,

    /// Sample weighting strategy for the class imbalance
    pub class_weight: ClassWeight,

    /// Fraction of labelled rows held out for validation metrics
    pub validation_split: f64,

    /// Seed for the bootstrap, feature subsets and validation split
    pub random_state: Option<u64>,

    /// Vocabulary scored into the tf_* feature columns
    pub key_terms: Vec<String>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            prediction_threshold: 0.05,
            n_estimators: 50,
            max_depth: Some(8),
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Balanced,
            validation_split: 0.2,
            random_state: Some(42),
            key_terms: KEY_TERMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PredictorConfig {
    /// Create a configuration with the production defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the decision threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.prediction_threshold = threshold;
        self
    }

    /// Builder method to set the number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to set the maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Builder method to set the class weighting strategy
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Builder method to set the validation hold-out fraction
    pub fn with_validation_split(mut self, fraction: f64) -> Self {
        self.validation_split = fraction;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to replace the scored vocabulary
    pub fn with_key_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Check that every field is in its valid range
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.prediction_threshold) {
            return Err(TenderError::InvalidParameter {
                name: "prediction_threshold".to_string(),
                value: self.prediction_threshold.to_string(),
                reason: "must be between 0 and 1".to_string(),
            });
        }
        if self.n_estimators == 0 {
            return Err(TenderError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "the forest needs at least one tree".to_string(),
            });
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(TenderError::InvalidParameter {
                name: "validation_split".to_string(),
                value: self.validation_split.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        if self.key_terms.is_empty() {
            return Err(TenderError::InvalidParameter {
                name: "key_terms".to_string(),
                value: "[]".to_string(),
                reason: "at least one vocabulary term is required".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PredictorConfig::default();
        assert_eq!(config.prediction_threshold, 0.05);
        assert_eq!(config.n_estimators, 50);
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.class_weight, ClassWeight::Balanced);
        assert_eq!(config.validation_split, 0.2);
        assert_eq!(config.random_state, Some(42));
        assert_eq!(config.key_terms.len(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PredictorConfig::new()
            .with_threshold(0.5)
            .with_n_estimators(10)
            .with_max_depth(4)
            .with_random_state(7);

        assert_eq!(config.prediction_threshold, 0.5);
        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.max_depth, Some(4));
        assert_eq!(config.random_state, Some(7));
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        assert!(PredictorConfig::new().with_threshold(1.5).validate().is_err());
        assert!(PredictorConfig::new()
            .with_validation_split(0.0)
            .validate()
            .is_err());
        assert!(PredictorConfig::new()
            .with_n_estimators(0)
            .validate()
            .is_err());
        let no_terms = PredictorConfig::new().with_key_terms(Vec::<String>::new());
        assert!(no_terms.validate().is_err());
    }
}
