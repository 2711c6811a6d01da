//! Weighted decision tree classifier
//!
//! Building block for the random forest. Supports per-sample weights so
//! class imbalance can be handled by reweighting rather than resampling,
//! and draws a random feature subset per split when `max_features` is set.

use crate::error::{Result, TenderError};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with predicted class
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    Gini,
    Entropy,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (all when `None`)
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for per-split feature sampling
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set seed for feature sampling
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree. Without `sample_weight` every sample counts as 1.0.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        sample_weight: Option<&Array1<f64>>,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(TenderError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples < self.min_samples_split {
            return Err(TenderError::ValidationError(format!(
                "Need at least {} samples, got {}",
                self.min_samples_split, n_samples
            )));
        }

        let weights = match sample_weight {
            Some(w) => {
                if w.len() != n_samples {
                    return Err(TenderError::ShapeError {
                        expected: format!("sample_weight length = {}", n_samples),
                        actual: format!("sample_weight length = {}", w.len()),
                    });
                }
                if w.iter().any(|&v| v < 0.0 || !v.is_finite()) {
                    return Err(TenderError::ValidationError(
                        "sample weights must be finite and non-negative".to_string(),
                    ));
                }
                w.clone()
            }
            None => Array1::ones(n_samples),
        };
        if weights.sum() <= 0.0 {
            return Err(TenderError::ValidationError(
                "sample weights sum to zero".to_string(),
            ));
        }

        self.n_features = n_features;

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        self.classes = classes;

        let mut importances = vec![0.0; n_features];
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &weights, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let totals = self.class_weight_totals(y, w, indices);
        let subset_weight: f64 = totals.values().sum();

        let should_stop = n_samples < self.min_samples_split
            || n_samples <= self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || totals.len() <= 1;

        if should_stop {
            return TreeNode::Leaf {
                value: Self::majority_class(&totals),
                n_samples,
            };
        }

        let parent_impurity = self.impurity_from_totals(&totals, subset_weight);

        if let Some((best_feature, best_threshold, best_gain)) =
            self.find_best_split(x, y, w, indices, parent_impurity, rng)
        {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, best_feature]] <= best_threshold);

            if left_indices.len() < self.min_samples_leaf
                || right_indices.len() < self.min_samples_leaf
            {
                return TreeNode::Leaf {
                    value: Self::majority_class(&totals),
                    n_samples,
                };
            }

            importances[best_feature] += subset_weight * best_gain;

            let left = Box::new(self.build_tree(x, y, w, &left_indices, depth + 1, importances, rng));
            let right =
                Box::new(self.build_tree(x, y, w, &right_indices, depth + 1, importances, rng));

            TreeNode::Split {
                feature_idx: best_feature,
                threshold: best_threshold,
                left,
                right,
                n_samples,
                impurity: parent_impurity,
            }
        } else {
            TreeNode::Leaf {
                value: Self::majority_class(&totals),
                n_samples,
            }
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let n_features = x.ncols();
        let k = self.max_features.unwrap_or(n_features).min(n_features).max(1);

        let candidates: Vec<usize> = if k < n_features {
            rand::seq::index::sample(rng, n_features, k).into_vec()
        } else {
            (0..n_features).collect()
        };

        // Each candidate feature independently finds its best threshold
        let feature_results: Vec<Option<(usize, f64, f64)>> = candidates
            .into_par_iter()
            .map(|feature_idx| {
                let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                values.dedup();

                let mut best_gain = 0.0f64;
                let mut best_threshold = 0.0f64;

                for window in values.windows(2) {
                    let threshold = (window[0] + window[1]) / 2.0;

                    let mut left_totals: HashMap<i64, f64> = HashMap::new();
                    let mut right_totals: HashMap<i64, f64> = HashMap::new();
                    let mut left_weight = 0.0f64;
                    let mut right_weight = 0.0f64;
                    let mut left_count = 0usize;
                    let mut right_count = 0usize;

                    for &idx in indices {
                        let class = y[idx].round() as i64;
                        let wi = w[idx];
                        if x[[idx, feature_idx]] <= threshold {
                            left_count += 1;
                            left_weight += wi;
                            *left_totals.entry(class).or_insert(0.0) += wi;
                        } else {
                            right_count += 1;
                            right_weight += wi;
                            *right_totals.entry(class).or_insert(0.0) += wi;
                        }
                    }

                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    let total_weight = left_weight + right_weight;
                    if total_weight <= 0.0 {
                        continue;
                    }
                    let weighted_impurity = (left_weight
                        * self.impurity_from_totals(&left_totals, left_weight)
                        + right_weight * self.impurity_from_totals(&right_totals, right_weight))
                        / total_weight;

                    let gain = parent_impurity - weighted_impurity;
                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = threshold;
                    }
                }

                if best_gain > 0.0 {
                    Some((feature_idx, best_threshold, best_gain))
                } else {
                    None
                }
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
    }

    fn class_weight_totals(
        &self,
        y: &Array1<f64>,
        w: &Array1<f64>,
        indices: &[usize],
    ) -> HashMap<i64, f64> {
        let mut totals: HashMap<i64, f64> = HashMap::new();
        for &idx in indices {
            *totals.entry(y[idx].round() as i64).or_insert(0.0) += w[idx];
        }
        totals
    }

    fn impurity_from_totals(&self, totals: &HashMap<i64, f64>, total_weight: f64) -> f64 {
        if total_weight <= 0.0 {
            return 0.0;
        }
        match self.criterion {
            Criterion::Gini => {
                let mut gini = 1.0;
                for &wc in totals.values() {
                    let p = wc / total_weight;
                    gini -= p * p;
                }
                gini
            }
            Criterion::Entropy => {
                let mut entropy = 0.0;
                for &wc in totals.values() {
                    let p = wc / total_weight;
                    if p > 0.0 {
                        entropy -= p * p.ln();
                    }
                }
                entropy
            }
        }
    }

    /// Ties break toward the lower class id
    fn majority_class(totals: &HashMap<i64, f64>) -> f64 {
        totals
            .iter()
            .max_by(|a, b| {
                a.1.partial_cmp(b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(&class, _)| class as f64)
            .unwrap_or(0.0)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(TenderError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(TenderError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let sample = x.row(i);
                self.predict_sample(root, &sample.to_vec())
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn predict_sample(&self, node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    self.predict_sample(left, sample)
                } else {
                    self.predict_sample(right, sample)
                }
            }
        }
    }

    /// Classes seen during fit, sorted ascending
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => self.node_depth(node),
        }
    }

    fn node_depth(&self, node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                1 + self.node_depth(left).max(self.node_depth(right))
            }
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => self.count_leaves(node),
        }
    }

    fn count_leaves(&self, node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                self.count_leaves(left) + self.count_leaves(right)
            }
        }
    }
}
