//! Tender ML - Recall-first tender bid prediction
//!
//! This crate scores public procurement tenders for bid potential and routes
//! them into a three-bucket review pipeline:
//! - Data loading, cleaning and feature preparation for tender extracts
//! - A fixed-order feature matrix over codes, text lengths, the encoded
//!   contracting authority and a hard-coded key-term vocabulary
//! - A Random Forest tuned for recall: the decision threshold is far below
//!   0.5 because a missed bid costs more than a reviewed false positive
//! - Review routing with fixed notification messages per bucket
//! - Cross-validated text baselines to sanity-check the feature model
//!
//! # Modules
//!
//! - [`data`] - Loading, contract validation, cleaning, engineered columns
//! - [`preprocessing`] - Authority encoding and feature scaling
//! - [`feature_engineering`] - Feature extraction, vocabulary scoring,
//!   lot-section extraction, text vectorizers
//! - [`training`] - Decision trees, the forest, linear models, metrics,
//!   cross-validation and baselines
//! - [`inference`] - The bid predictor, its artifact and review routing
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data access and preparation
pub mod data;

// Core ML modules
pub mod feature_engineering;
pub mod inference;
pub mod preprocessing;
pub mod training;

// Services
pub mod cli;

pub use error::{Result, TenderError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TenderError};

    // Data access
    pub use crate::data::{
        clean, engineer, load_dataframe, resolve_database_url, validate_contract,
        write_dataframe, ConnectionSettings,
    };

    // Preprocessing
    pub use crate::preprocessing::{AuthorityEncoder, StandardScaler, UNKNOWN_CODE};

    // Feature engineering
    pub use crate::feature_engineering::{
        extract_lot_section, FeatureExtractor, KeyTermScorer, TfidfVectorizer, KEY_TERMS,
    };

    // Training
    pub use crate::training::{
        balanced_sample_weights, run_baselines, BaselineScore, CVResults, CVStrategy,
        ClassWeight, CrossValidator, DecisionTree, LinearSvc, LogisticRegression, RandomForest,
        TrainingMetrics,
    };

    // Inference
    pub use crate::inference::{
        route_record, BidPredictor, Prediction, PredictorConfig, ReviewAction, ReviewCategory,
        ReviewDecision, ReviewPriority,
    };
}
