//! Bid prediction engine
//!
//! Owns the full train/predict lifecycle: feature extraction, scaling, the
//! forest, validation metrics and the serialized artifact. Model, encoder
//! state, scaler state, vocabulary and threshold travel in one bundle so a
//! load can never mix generations of preprocessing and classifier state.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::config::PredictorConfig;
use super::routing::{has_usable_text, route_record, ReviewDecision};
use crate::data::prepare::{optional_string_rows, string_rows};
use crate::error::{Result, TenderError};
use crate::feature_engineering::{FeatureExtractor, KeyTermScorer};
use crate::preprocessing::StandardScaler;
use crate::training::{RandomForest, TrainingMetrics};

/// One scored tender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Estimated probability that the organization should bid
    pub probability: f64,
    /// Thresholded decision
    pub bid: bool,
    /// Probability of the predicted class
    pub confidence: f64,
}

/// Recall-first bid predictor.
///
/// A trained predictor is immutable: every prediction call reads the same
/// artifact state, and retraining replaces the whole bundle at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPredictor {
    config: PredictorConfig,
    extractor: FeatureExtractor,
    scaler: StandardScaler,
    model: Option<RandomForest>,
    feature_names: Vec<String>,
    metrics: Option<TrainingMetrics>,
    trained_at: Option<DateTime<Utc>>,
    is_trained: bool,
}

impl BidPredictor {
    /// Create an untrained predictor from a configuration
    pub fn new(config: PredictorConfig) -> Result<Self> {
        config.validate()?;
        let scorer = KeyTermScorer::new(config.key_terms.clone())?;
        Ok(Self {
            config,
            extractor: FeatureExtractor::new(scorer),
            scaler: StandardScaler::new(),
            model: None,
            feature_names: Vec::new(),
            metrics: None,
            trained_at: None,
            is_trained: false,
        })
    }

    /// Train on a labelled frame and return validation metrics.
    ///
    /// Fits the authority encoder and scaler on the full frame, holds out a
    /// stratified validation slice, trains the forest on the remainder and
    /// evaluates at the configured threshold. `total_samples` and `bid_rate`
    /// in the returned metrics describe the full frame, not the hold-out.
    pub fn train(&mut self, df: &DataFrame) -> Result<TrainingMetrics> {
        self.config.validate()?;
        let y = target_labels(df)?;

        let n_pos = y.iter().filter(|&&v| v > 0.5).count();
        let n_neg = y.len() - n_pos;
        if n_pos < 2 || n_neg < 2 {
            return Err(TenderError::DataError(
                "training needs at least 2 labelled rows of each bid outcome".to_string(),
            ));
        }

        let x = self.extractor.fit_transform(df)?;
        self.feature_names = self.extractor.feature_names();
        let x_scaled = self.scaler.fit_transform(&x)?;
        debug!(
            rows = x_scaled.nrows(),
            features = x_scaled.ncols(),
            "feature matrix built"
        );

        let (x_train, x_val, y_train, y_val) = self.stratified_split(&x_scaled, &y)?;

        let mut model = RandomForest::new(self.config.n_estimators)
            .with_min_samples_split(self.config.min_samples_split)
            .with_min_samples_leaf(self.config.min_samples_leaf)
            .with_class_weight(self.config.class_weight);
        if let Some(depth) = self.config.max_depth {
            model = model.with_max_depth(depth);
        }
        if let Some(seed) = self.config.random_state {
            model = model.with_random_state(seed);
        }
        model.fit(&x_train, &y_train)?;

        let val_scores = positive_probabilities(&model, &x_val)?;
        let mut metrics =
            TrainingMetrics::compute(&y_val, &val_scores, self.config.prediction_threshold)?;
        metrics.total_samples = y.len();
        metrics.bid_rate = n_pos as f64 / y.len() as f64;
        metrics.feature_importance = named_importances(&self.feature_names, &model);

        self.model = Some(model);
        self.metrics = Some(metrics.clone());
        self.trained_at = Some(Utc::now());
        self.is_trained = true;

        info!(
            auc = metrics.auc,
            recall = metrics.recall,
            false_negatives = metrics.false_negatives,
            "model trained"
        );
        Ok(metrics)
    }

    /// Bid probability per record, in frame order
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or(TenderError::ModelNotFitted)?;
        let x = self.extractor.transform(df)?;
        let x_scaled = self.scaler.transform(&x)?;
        positive_probabilities(model, &x_scaled)
    }

    /// Score every record and apply the decision threshold
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<Prediction>> {
        let probabilities = self.predict_proba(df)?;
        Ok(probabilities
            .iter()
            .map(|&p| {
                let bid = p >= self.config.prediction_threshold;
                Prediction {
                    probability: p,
                    bid,
                    confidence: if bid { p } else { 1.0 - p },
                }
            })
            .collect())
    }

    /// Route every record into its review bucket, in frame order.
    ///
    /// Records without usable PDF text are routed without touching the
    /// model, so a frame of such records triages even before training.
    pub fn triage(&self, df: &DataFrame) -> Result<Vec<ReviewDecision>> {
        let titles = string_rows(df, "title")?;
        let texts = optional_string_rows(df, "pdf_text")?;

        let needs_model = texts.iter().any(|t| has_usable_text(t));
        let scores = if needs_model {
            Some(self.predict_proba(df)?)
        } else {
            None
        };

        Ok(titles
            .iter()
            .zip(&texts)
            .enumerate()
            .map(|(i, (title, text))| {
                let title = if title.is_empty() { "Unknown" } else { title };
                let probability = match &scores {
                    Some(s) if has_usable_text(text) => Some(s[i]),
                    _ => None,
                };
                route_record(title, text, probability, self.config.prediction_threshold)
            })
            .collect())
    }

    /// Persist the trained artifact.
    ///
    /// Writes to a staging file in the same directory and renames it over
    /// the target, so a concurrent load sees either the old artifact or the
    /// new one, never a partial write.
    pub fn save(&self, path: &Path) -> Result<()> {
        if !self.is_trained {
            return Err(TenderError::ModelNotFitted);
        }
        let json = serde_json::to_string_pretty(self)?;
        let staging = staging_path(path);
        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;
        info!(path = %path.display(), "model artifact saved");
        Ok(())
    }

    /// Load a previously saved artifact
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let predictor: Self = serde_json::from_str(&json)?;
        info!(path = %path.display(), "model artifact loaded");
        Ok(predictor)
    }

    /// Configuration the predictor was built with
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Validation metrics from the last training run
    pub fn metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics.as_ref()
    }

    /// Feature names in matrix column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Named importances from the last training run, largest first
    pub fn feature_importance(&self) -> Option<&[(String, f64)]> {
        self.metrics.as_ref().map(|m| m.feature_importance.as_slice())
    }

    /// Whether the predictor has been trained
    pub fn is_trained(&self) -> bool {
        self.is_trained
    }

    /// When the artifact was trained
    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    /// Stratified train/validation split that preserves class proportions.
    /// Each class's rows are shuffled with the configured seed, then the
    /// tail of each class becomes the validation slice.
    fn stratified_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
        let val_ratio = self.config.validation_split;

        let mut class_indices: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label.round() as i64).or_default().push(i);
        }
        let mut classes: Vec<i64> = class_indices.keys().copied().collect();
        classes.sort_unstable();

        let mut rng = match self.config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut train_indices = Vec::new();
        let mut val_indices = Vec::new();
        for class in classes {
            let indices = class_indices
                .get_mut(&class)
                .ok_or_else(|| TenderError::ComputationError("class vanished".to_string()))?;
            indices.shuffle(&mut rng);

            let class_val_size = ((indices.len() as f64) * val_ratio).max(1.0) as usize;
            let class_val_size = class_val_size.min(indices.len().saturating_sub(1));
            let split_point = indices.len() - class_val_size;
            train_indices.extend_from_slice(&indices[..split_point]);
            val_indices.extend_from_slice(&indices[split_point..]);
        }

        if train_indices.is_empty() || val_indices.is_empty() {
            return Err(TenderError::DataError(
                "stratified split produced an empty train or validation set".to_string(),
            ));
        }

        let n_cols = x.ncols();
        let x_train = Array2::from_shape_fn((train_indices.len(), n_cols), |(i, j)| {
            x[[train_indices[i], j]]
        });
        let x_val = Array2::from_shape_fn((val_indices.len(), n_cols), |(i, j)| {
            x[[val_indices[i], j]]
        });
        let y_train = Array1::from_iter(train_indices.iter().map(|&i| y[i]));
        let y_val = Array1::from_iter(val_indices.iter().map(|&i| y[i]));

        Ok((x_train, x_val, y_train, y_val))
    }
}

/// Probability of the positive class per row. A forest that never saw a
/// positive label scores every row zero.
fn positive_probabilities(model: &RandomForest, x: &Array2<f64>) -> Result<Array1<f64>> {
    let proba = model.predict_proba(x)?;
    match model.classes().iter().position(|&c| c == 1.0) {
        Some(j) => Ok(proba.column(j).to_owned()),
        None => Ok(Array1::zeros(x.nrows())),
    }
}

fn named_importances(names: &[String], model: &RandomForest) -> Vec<(String, f64)> {
    match model.feature_importances() {
        Some(importances) => {
            let mut pairs: Vec<(String, f64)> = names
                .iter()
                .cloned()
                .zip(importances.iter().copied())
                .collect();
            pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            pairs
        }
        None => Vec::new(),
    }
}

fn target_labels(df: &DataFrame) -> Result<Array1<f64>> {
    let column = df
        .column("bid")
        .map_err(|_| TenderError::ColumnNotFound("bid".to_string()))?;
    let series = column.as_materialized_series();
    if series.null_count() > 0 {
        return Err(TenderError::DataError(
            "bid column contains unlabelled rows; filter them before training".to_string(),
        ));
    }
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().flatten().collect())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_frame() -> DataFrame {
        let n = 40;
        let half = n / 2;
        let titles: Vec<String> = (0..n)
            .map(|i| {
                if i < half {
                    format!("Software support services tender {}", i)
                } else {
                    format!("Road resurfacing contract {}", i)
                }
            })
            .collect();
        let cas: Vec<String> = (0..n)
            .map(|i| {
                if i % 3 == 0 {
                    "Health Service Executive".to_string()
                } else if i % 3 == 1 {
                    "Dublin City Council".to_string()
                } else {
                    "Department of Education".to_string()
                }
            })
            .collect();
        let texts: Vec<String> = (0..n)
            .map(|i| {
                if i < half {
                    "managed software provision with technical support for computer systems \
                     across all sites"
                        .to_string()
                } else {
                    "surface dressing and carriageway repairs across the county road network"
                        .to_string()
                }
            })
            .collect();
        let codes: Vec<i64> = (0..n).map(|i| if i < half { 3 } else { 0 }).collect();
        let bids: Vec<bool> = (0..n).map(|i| i < half).collect();

        df! {
            "title" => titles,
            "ca" => cas,
            "pdf_text" => texts,
            "codes_count" => codes,
            "bid" => bids,
        }
        .unwrap()
    }

    fn trained_predictor() -> BidPredictor {
        let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        predictor.train(&training_frame()).unwrap();
        predictor
    }

    #[test]
    fn test_predict_before_train_is_an_error() {
        let predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let result = predictor.predict(&training_frame());
        assert!(matches!(result, Err(TenderError::ModelNotFitted)));
    }

    #[test]
    fn test_train_reports_full_frame_metrics() {
        let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let metrics = predictor.train(&training_frame()).unwrap();

        assert_eq!(metrics.total_samples, 40);
        assert!((metrics.bid_rate - 0.5).abs() < 1e-12);
        assert!(metrics.auc >= 0.0 && metrics.auc <= 1.0);
        assert_eq!(metrics.threshold, 0.05);
        assert_eq!(metrics.feature_importance.len(), 15);
        assert!(predictor.is_trained());
        assert!(predictor.trained_at().is_some());
    }

    #[test]
    fn test_separable_data_trains_a_strong_model() {
        let predictor = trained_predictor();
        let metrics = predictor.metrics().unwrap();
        assert!(metrics.auc > 0.9, "auc = {}", metrics.auc);
        assert!(metrics.recall > 0.9, "recall = {}", metrics.recall);
    }

    #[test]
    fn test_predictions_carry_threshold_and_confidence() {
        let predictor = trained_predictor();
        let predictions = predictor.predict(&training_frame()).unwrap();

        assert_eq!(predictions.len(), 40);
        for p in &predictions {
            assert!(p.probability >= 0.0 && p.probability <= 1.0);
            assert_eq!(p.bid, p.probability >= 0.05);
            let expected = if p.bid {
                p.probability
            } else {
                1.0 - p.probability
            };
            assert_eq!(p.confidence, expected);
        }
    }

    #[test]
    fn test_training_requires_both_outcomes() {
        let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let df = df! {
            "title" => ["a", "b", "c", "d"],
            "ca" => ["X", "Y", "X", "Y"],
            "bid" => [true, true, true, true],
        }
        .unwrap();

        assert!(matches!(
            predictor.train(&df),
            Err(TenderError::DataError(_))
        ));
    }

    #[test]
    fn test_training_rejects_unlabelled_rows() {
        let mut predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let df = df! {
            "title" => ["a", "b"],
            "ca" => ["X", "Y"],
            "bid" => [Some(true), None],
        }
        .unwrap();

        assert!(matches!(
            predictor.train(&df),
            Err(TenderError::DataError(_))
        ));
    }

    #[test]
    fn test_save_untrained_is_an_error() {
        let predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        assert!(matches!(
            predictor.save(&path),
            Err(TenderError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_save_load_reproduces_predictions() {
        let predictor = trained_predictor();
        let df = training_frame();
        let before: Vec<f64> = predictor.predict_proba(&df).unwrap().to_vec();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        predictor.save(&path).unwrap();

        let restored = BidPredictor::load(&path).unwrap();
        assert!(restored.is_trained());
        let after: Vec<f64> = restored.predict_proba(&df).unwrap().to_vec();

        assert_eq!(before, after);
    }

    #[test]
    fn test_triage_without_model_handles_textless_frames() {
        let predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let df = df! {
            "title" => ["Tender A", "Tender B"],
            "ca" => ["X", "Y"],
            "pdf_text" => ["", "too short"],
        }
        .unwrap();

        let decisions = predictor.triage(&df).unwrap();
        assert_eq!(decisions.len(), 2);
        for d in &decisions {
            assert_eq!(
                d.category,
                crate::inference::routing::ReviewCategory::NoPdfData
            );
        }
    }

    #[test]
    fn test_triage_preserves_frame_order() {
        use crate::inference::routing::ReviewCategory;

        let predictor = trained_predictor();
        let long_text = "managed software provision with technical support for computer systems \
                         across all sites";
        let df = df! {
            "title" => ["No Text", "Software Tender", ""],
            "ca" => ["X", "Health Service Executive", "Y"],
            "pdf_text" => ["", long_text, ""],
            "codes_count" => [0i64, 3, 0],
        }
        .unwrap();

        let decisions = predictor.triage(&df).unwrap();
        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions[0].category, ReviewCategory::NoPdfData);
        assert_ne!(decisions[1].category, ReviewCategory::NoPdfData);
        assert!(decisions[1].probability.is_some());
        // Blank titles fall back to a placeholder in the message
        assert_eq!(decisions[2].title, "Unknown");
    }

    #[test]
    fn test_stratified_split_preserves_class_balance() {
        let predictor = BidPredictor::new(PredictorConfig::default()).unwrap();
        let x = Array2::from_shape_fn((40, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 1.0 } else { 0.0 });

        let (x_train, x_val, y_train, y_val) = predictor.stratified_split(&x, &y).unwrap();
        assert_eq!(x_train.nrows() + x_val.nrows(), 40);
        assert_eq!(y_val.iter().filter(|&&v| v == 1.0).count(), 4);
        assert_eq!(y_val.iter().filter(|&&v| v == 0.0).count(), 4);
        assert_eq!(y_train.len(), 32);
        assert_eq!(x_train.ncols(), 2);
    }
}
