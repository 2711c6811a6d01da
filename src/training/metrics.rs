//! Evaluation metrics for binary bid classification
//!
//! Positive class is "bid". `confusion_counts` and everything derived from
//! it binarize at 0.5, so callers thresholding scores must do so before
//! passing predictions in.

use crate::error::{Result, TenderError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Confusion counts as `(tp, fp, tn, fn)`
pub fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let t_bool = *t > 0.5;
        let p_bool = *p > 0.5;
        match (t_bool, p_bool) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

pub fn precision(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, fp, _, _) = confusion_counts(y_true, y_pred);
    if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    }
}

pub fn recall(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let (tp, _, _, fn_) = confusion_counts(y_true, y_pred);
    if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    }
}

pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let p = precision(y_true, y_pred);
    let r = recall(y_true, y_pred);
    if p + r > 0.0 {
        2.0 * p * r / (p + r)
    } else {
        0.0
    }
}

/// Area under the ROC curve via the Mann-Whitney U statistic, with tied
/// scores assigned their average rank. Undefined when only one class is
/// present.
pub fn roc_auc_score(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<f64> {
    let n = y_true.len();
    if n != y_score.len() {
        return Err(TenderError::ShapeError {
            expected: format!("y_score length = {}", n),
            actual: format!("y_score length = {}", y_score.len()),
        });
    }

    let n_pos = y_true.iter().filter(|&&v| v > 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(TenderError::ValidationError(
            "ROC AUC is undefined with a single class".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && y_score[order[j]] == y_score[order[i]] {
            j += 1;
        }
        // 1-based ranks, ties share the average of their span
        let avg_rank = (i + j + 1) as f64 / 2.0;
        for k in i..j {
            ranks[order[k]] = avg_rank;
        }
        i = j;
    }

    let sum_pos_ranks: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t > 0.5)
        .map(|(_, &r)| r)
        .sum();

    let u = sum_pos_ranks - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}

/// Validation metrics captured at train time and carried in the model
/// artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub auc: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    /// Decision threshold the counts were computed at
    pub threshold: f64,
    /// Number of labelled rows the metrics describe
    pub total_samples: usize,
    /// Share of positive labels among those rows
    pub bid_rate: f64,
    /// Named importances, largest first
    pub feature_importance: Vec<(String, f64)>,
}

impl TrainingMetrics {
    /// Evaluate scores against labels at the given decision threshold
    pub fn compute(y_true: &Array1<f64>, y_score: &Array1<f64>, threshold: f64) -> Result<Self> {
        let auc = roc_auc_score(y_true, y_score)?;
        let y_pred: Array1<f64> = y_score.mapv(|s| if s >= threshold { 1.0 } else { 0.0 });

        let (tp, fp, tn, fn_) = confusion_counts(y_true, &y_pred);
        let n = y_true.len();
        let n_pos = y_true.iter().filter(|&&v| v > 0.5).count();

        Ok(Self {
            auc,
            accuracy: accuracy(y_true, &y_pred),
            precision: precision(y_true, &y_pred),
            recall: recall(y_true, &y_pred),
            f1: f1_score(y_true, &y_pred),
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
            threshold,
            total_samples: n,
            bid_rate: if n > 0 { n_pos as f64 / n as f64 } else { 0.0 },
            feature_importance: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_and_derived_metrics() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let (tp, fp, tn, fn_) = confusion_counts(&y_true, &y_pred);
        assert_eq!((tp, fp, tn, fn_), (3, 1, 3, 1));

        assert!((accuracy(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((precision(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((f1_score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_predictions() {
        let y_true = array![0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 0.0];

        assert_eq!(precision(&y_true, &y_pred), 0.0);
        assert_eq!(recall(&y_true, &y_pred), 0.0);
        assert_eq!(f1_score(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_and_reversed() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let perfect = array![0.1, 0.2, 0.8, 0.9];
        let reversed = array![0.9, 0.8, 0.2, 0.1];

        assert!((roc_auc_score(&y_true, &perfect).unwrap() - 1.0).abs() < 1e-12);
        assert!((roc_auc_score(&y_true, &reversed).unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_ties_average_to_half() {
        let y_true = array![0.0, 1.0, 0.0, 1.0];
        let constant = array![0.5, 0.5, 0.5, 0.5];
        assert!((roc_auc_score(&y_true, &constant).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class_is_an_error() {
        let y_true = array![1.0, 1.0, 1.0];
        let score = array![0.1, 0.5, 0.9];
        assert!(matches!(
            roc_auc_score(&y_true, &score),
            Err(TenderError::ValidationError(_))
        ));
    }

    #[test]
    fn test_training_metrics_low_threshold_favors_recall() {
        let y_true = array![0.0, 0.0, 0.0, 1.0, 1.0];
        let y_score = array![0.0, 0.02, 0.3, 0.06, 0.8];

        let at_low = TrainingMetrics::compute(&y_true, &y_score, 0.05).unwrap();
        let at_half = TrainingMetrics::compute(&y_true, &y_score, 0.5).unwrap();

        assert_eq!(at_low.recall, 1.0);
        assert!(at_half.recall < at_low.recall);
        assert!(at_low.false_positives >= at_half.false_positives);
        assert!((at_low.bid_rate - 0.4).abs() < 1e-12);
        assert_eq!(at_low.total_samples, 5);
    }
}
