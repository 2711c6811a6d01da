//! Feature scaling

use crate::error::{Result, TenderError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaler (z-score normalization) over a feature matrix.
///
/// Fitted state is one mean and one scale per column. Zero-variance
/// columns keep a scale of 1.0 so they pass through centered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
    is_fitted: bool,
}

impl StandardScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to a feature matrix
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(TenderError::ValidationError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            TenderError::ComputationError("failed to compute column means".to_string())
        })?;

        let scale = if n_samples < 2 {
            Array1::ones(x.ncols())
        } else {
            let mut std = x.std_axis(Axis(0), 1.0);
            std.mapv_inplace(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
            std
        };

        self.mean = mean;
        self.scale = scale;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale a feature matrix
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(TenderError::ModelNotFitted);
        }
        self.check_width(x)?;

        let mut scaled = x.clone();
        for mut row in scaled.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[j]) / self.scale[j];
            }
        }
        Ok(scaled)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Undo the scaling
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(TenderError::ModelNotFitted);
        }
        self.check_width(x)?;

        let mut restored = x.clone();
        for mut row in restored.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = *value * self.scale[j] + self.mean[j];
            }
        }
        Ok(restored)
    }

    /// Whether the scaler has been fitted
    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.mean.len() {
            return Err(TenderError::ShapeError {
                expected: format!("{} columns", self.mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0], [5.0, 50.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let mean: f64 = scaled.column(j).sum() / scaled.nrows() as f64;
            assert!(mean.abs() < 1e-10, "column {} mean should be ~0: {}", j, mean);
        }
    }

    #[test]
    fn test_zero_variance_column() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        // Constant column is centered but not blown up
        for i in 0..3 {
            assert_eq!(scaled[[i, 1]], 0.0);
        }
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (orig, rest) in x.iter().zip(restored.iter()) {
            assert!((orig - rest).abs() < 1e-10);
        }
    }

    #[test]
    fn test_width_mismatch_errors() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).unwrap();

        let wrong = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            scaler.transform(&wrong),
            Err(TenderError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_unfitted_scaler_errors() {
        let scaler = StandardScaler::new();
        let x = array![[1.0], [2.0]];
        assert!(matches!(scaler.transform(&x), Err(TenderError::ModelNotFitted)));
    }
}
