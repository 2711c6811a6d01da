//! Linear classifiers for the text baselines
//!
//! Full-batch gradient descent with L2 regularization and optional
//! balanced class weighting. Labels are binary, 0.0 or 1.0.

use super::random_forest::{balanced_sample_weights, ClassWeight};
use crate::error::{Result, TenderError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

fn validate_binary_labels(y: &Array1<f64>) -> Result<()> {
    for &v in y.iter() {
        if v != 0.0 && v != 1.0 {
            return Err(TenderError::ValidationError(format!(
                "labels must be 0 or 1, got {}",
                v
            )));
        }
    }
    Ok(())
}

fn check_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(TenderError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(TenderError::ValidationError(
            "cannot fit on an empty dataset".to_string(),
        ));
    }
    Ok(())
}

/// Logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Class weighting
    pub class_weight: ClassWeight,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            class_weight: ClassWeight::Uniform,
            is_fitted: false,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set class weighting
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y)?;
        validate_binary_labels(y)?;

        let n_features = x.ncols();
        let sample_weights = match self.class_weight {
            ClassWeight::Uniform => Array1::ones(x.nrows()),
            ClassWeight::Balanced => balanced_sample_weights(y),
        };
        let total_weight = sample_weights.sum();

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;
        let lr = self.learning_rate;
        let alpha = self.alpha;

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = (&predictions - y) * &sample_weights;
            let dw = (x.t().dot(&errors) / total_weight) + (alpha * &weights);
            let db = errors.sum() / total_weight;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * &dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.is_fitted = true;

        Ok(self)
    }

    /// Predict the probability of the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(TenderError::ModelNotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Get accuracy score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let correct = y_pred
            .iter()
            .zip(y.iter())
            .filter(|(pred, actual)| (*pred - *actual).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}

/// Linear support vector classifier trained by subgradient descent on the
/// hinge loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Class weighting
    pub class_weight: ClassWeight,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSvc {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 1e-4,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            class_weight: ClassWeight::Uniform,
            is_fitted: false,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set class weighting
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Fit the model on 0/1 labels, mapped internally to -1/+1
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        check_shapes(x, y)?;
        validate_binary_labels(y)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let targets: Array1<f64> = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });

        let sample_weights = match self.class_weight {
            ClassWeight::Uniform => Array1::ones(n_samples),
            ClassWeight::Balanced => balanced_sample_weights(y),
        };
        let total_weight = sample_weights.sum();

        let mut weights: Array1<f64> = Array1::zeros(n_features);
        let mut bias = 0.0;
        let lr = self.learning_rate;

        for _iter in 0..self.max_iter {
            let decision = x.dot(&weights) + bias;

            // Subgradient of the hinge loss over margin violators
            let mut dw = self.alpha * &weights;
            let mut db = 0.0;
            for i in 0..n_samples {
                if targets[i] * decision[i] < 1.0 {
                    let scale = sample_weights[i] * targets[i] / total_weight;
                    dw.scaled_add(-scale, &x.row(i));
                    db -= scale;
                }
            }

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * &dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.is_fitted = true;

        Ok(self)
    }

    /// Signed distance to the separating hyperplane
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(TenderError::ModelNotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);
        Ok(x.dot(coefficients) + intercept)
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let decision = self.decision_function(x)?;
        Ok(decision.mapv(|d| if d >= 0.0 { 1.0 } else { 0.0 }))
    }

    /// Get accuracy score
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let correct = y_pred
            .iter()
            .zip(y.iter())
            .filter(|(pred, actual)| (*pred - *actual).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}
