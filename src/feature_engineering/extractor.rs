//! Fixed-order feature extraction
//!
//! Turns a frame of raw tender records into the numeric matrix the
//! classifier consumes. The column order is fixed; a trained model is only
//! valid against matrices produced by an extractor with the same encoder
//! state and vocabulary.

use crate::error::{Result, TenderError};
use crate::feature_engineering::terms::KeyTermScorer;
use crate::preprocessing::AuthorityEncoder;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Leading feature columns, ahead of the per-term scores
pub const BASE_FEATURES: [&str; 5] = [
    "codes_count",
    "has_codes",
    "title_length",
    "pdf_text_length",
    "ca_encoded",
];

/// Feature extractor for tender records.
///
/// Defaulting rules: missing numeric values (and whole missing optional
/// columns) become 0; missing or unseen authority labels encode to the
/// reserved unknown code; term scores come from the fixed vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureExtractor {
    encoder: AuthorityEncoder,
    scorer: KeyTermScorer,
}

impl FeatureExtractor {
    /// Create an extractor with an unfitted authority encoder
    pub fn new(scorer: KeyTermScorer) -> Self {
        Self {
            encoder: AuthorityEncoder::new(),
            scorer,
        }
    }

    /// Feature names in matrix column order
    pub fn feature_names(&self) -> Vec<String> {
        BASE_FEATURES
            .iter()
            .map(|s| s.to_string())
            .chain(self.scorer.feature_names())
            .collect()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        BASE_FEATURES.len() + self.scorer.len()
    }

    /// Fit the authority encoder on the `ca` column
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let ca = df
            .column("ca")
            .map_err(|_| TenderError::ColumnNotFound("ca".to_string()))?;
        self.encoder.fit(ca.as_materialized_series())?;
        Ok(self)
    }

    /// Build the feature matrix, one row per record in frame order
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let n = df.height();

        let titles = required_string_column(df, "title")?;
        let ca = df
            .column("ca")
            .map_err(|_| TenderError::ColumnNotFound("ca".to_string()))?;
        let ca_encoded = self.encoder.transform(ca.as_materialized_series())?;

        let codes_count = optional_numeric_column(df, "codes_count")?;
        let pdf_texts = optional_string_column(df, "pdf_text")?;

        let mut x = Array2::zeros((n, self.n_features()));
        for i in 0..n {
            x[[i, 0]] = codes_count[i];
            x[[i, 1]] = if codes_count[i] > 0.0 { 1.0 } else { 0.0 };
            x[[i, 2]] = titles[i].chars().count() as f64;
            x[[i, 3]] = pdf_texts[i].chars().count() as f64;
            x[[i, 4]] = ca_encoded[i];

            let combined = format!("{} {}", titles[i], pdf_texts[i]);
            for (k, score) in self.scorer.score(&combined).into_iter().enumerate() {
                x[[i, BASE_FEATURES.len() + k]] = score;
            }
        }

        Ok(x)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// The fitted authority encoder
    pub fn encoder(&self) -> &AuthorityEncoder {
        &self.encoder
    }

    /// The vocabulary scorer
    pub fn scorer(&self) -> &KeyTermScorer {
        &self.scorer
    }

    /// Whether the extractor's encoder has been fitted
    pub fn is_fitted(&self) -> bool {
        self.encoder.is_fitted()
    }
}

fn required_string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| TenderError::ColumnNotFound(name.to_string()))?;
    let ca = column.as_materialized_series().str()?.clone();
    Ok(ca
        .into_iter()
        .map(|opt| opt.unwrap_or("").to_string())
        .collect())
}

fn optional_string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    match df.column(name) {
        Ok(_) => required_string_column(df, name),
        Err(_) => Ok(vec![String::new(); df.height()]),
    }
}

fn optional_numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    match df.column(name) {
        Ok(column) => {
            let cast = column.cast(&DataType::Float64)?;
            let ca = cast.f64()?;
            Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        }
        Err(_) => Ok(vec![0.0; df.height()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_engineering::terms::KEY_TERMS;

    fn tender_frame() -> DataFrame {
        df! {
            "title" => &["Software support services", "Road maintenance", "Office supplies"],
            "ca" => &["Health Service Executive", "Dublin City Council", "Health Service Executive"],
            "procedure" => &["Open", "Open", "Restricted"],
            "pdf_url" => &["http://a", "http://b", ""],
            "codes_count" => &[3i64, 0, 2],
            "pdf_text" => &["managed software provision", "", "stationery package"],
        }
        .unwrap()
    }

    fn fitted_extractor() -> FeatureExtractor {
        let mut extractor = FeatureExtractor::new(KeyTermScorer::new(KEY_TERMS).unwrap());
        extractor.fit(&tender_frame()).unwrap();
        extractor
    }

    #[test]
    fn test_matrix_shape_matches_feature_names() {
        let extractor = fitted_extractor();
        let x = extractor.transform(&tender_frame()).unwrap();

        assert_eq!(x.nrows(), 3);
        assert_eq!(x.ncols(), extractor.feature_names().len());
        assert_eq!(x.ncols(), 15);
    }

    #[test]
    fn test_has_codes_follows_code_count() {
        let extractor = fitted_extractor();
        let x = extractor.transform(&tender_frame()).unwrap();

        assert_eq!(x[[0, 0]], 3.0);
        assert_eq!(x[[0, 1]], 1.0);
        assert_eq!(x[[1, 0]], 0.0);
        assert_eq!(x[[1, 1]], 0.0);
        assert_eq!(x[[2, 1]], 1.0);
    }

    #[test]
    fn test_missing_optional_columns_default_to_zero() {
        let extractor = fitted_extractor();
        let df = df! {
            "title" => &["Software support"],
            "ca" => &["Dublin City Council"],
        }
        .unwrap();

        let x = extractor.transform(&df).unwrap();
        assert_eq!(x[[0, 0]], 0.0); // codes_count
        assert_eq!(x[[0, 1]], 0.0); // has_codes
        assert_eq!(x[[0, 3]], 0.0); // pdf_text_length
    }

    #[test]
    fn test_unseen_authority_encodes_without_error() {
        let extractor = fitted_extractor();
        let df = df! {
            "title" => &["New tender"],
            "ca" => &["Never Seen Authority"],
        }
        .unwrap();

        let x = extractor.transform(&df).unwrap();
        assert_eq!(x[[0, 4]], crate::preprocessing::UNKNOWN_CODE);
    }

    #[test]
    fn test_term_scores_cover_title_and_pdf_text() {
        let extractor = fitted_extractor();
        let x = extractor.transform(&tender_frame()).unwrap();

        // Row 0 mentions "software" in both title and pdf text
        let tf_software = x[[0, 5]];
        assert!(tf_software > 0.0);
        assert!(tf_software <= 1.0);

        // Row 1 has no vocabulary terms at all
        for k in 0..KEY_TERMS.len() {
            assert_eq!(x[[1, 5 + k]], 0.0);
        }
    }

    #[test]
    fn test_missing_title_column_is_an_error() {
        let extractor = fitted_extractor();
        let df = df! {
            "ca" => &["Dublin City Council"],
        }
        .unwrap();

        assert!(matches!(
            extractor.transform(&df),
            Err(TenderError::ColumnNotFound(_))
        ));
    }
}
