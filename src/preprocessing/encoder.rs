//! Contracting authority encoding

use crate::error::{Result, TenderError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Code returned for missing, blank, or unseen authority labels.
///
/// Known labels are coded from 1 upward, so 0 is never ambiguous.
pub const UNKNOWN_CODE: f64 = 0.0;

/// Label encoder for the contracting authority column.
///
/// Encoding is total over a fitted encoder: every input string maps to a
/// code. Labels seen during `fit` get dense codes `1..=n` in sorted order;
/// anything else (including blank and missing values) maps to
/// [`UNKNOWN_CODE`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorityEncoder {
    mapping: HashMap<String, u32>,
    classes: Vec<String>,
    is_fitted: bool,
}

impl AuthorityEncoder {
    /// Create an unfitted encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder on an authority column.
    ///
    /// Null and blank values are skipped; they encode to [`UNKNOWN_CODE`]
    /// at transform time.
    pub fn fit(&mut self, series: &Series) -> Result<&mut Self> {
        let ca = series.str()?;

        let mut classes: Vec<String> = ca
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
            .collect();
        classes.sort();
        classes.dedup();

        self.mapping = classes
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx as u32 + 1))
            .collect();
        self.classes = classes;
        self.is_fitted = true;

        Ok(self)
    }

    /// Encode a single label
    pub fn encode(&self, label: &str) -> Result<f64> {
        if !self.is_fitted {
            return Err(TenderError::ModelNotFitted);
        }
        Ok(self.code_for(Some(label)))
    }

    /// Encode an authority column into feature values
    pub fn transform(&self, series: &Series) -> Result<Vec<f64>> {
        if !self.is_fitted {
            return Err(TenderError::ModelNotFitted);
        }
        let ca = series.str()?;
        Ok(ca.into_iter().map(|opt| self.code_for(opt)).collect())
    }

    fn code_for(&self, label: Option<&str>) -> f64 {
        match label {
            Some(s) if !s.trim().is_empty() => self
                .mapping
                .get(s)
                .map(|&code| code as f64)
                .unwrap_or(UNKNOWN_CODE),
            _ => UNKNOWN_CODE,
        }
    }

    /// Known labels in code order (code = position + 1)
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of known labels
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Whether the encoder has been fitted
    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
