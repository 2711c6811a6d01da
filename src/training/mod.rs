//! Model training module
//!
//! Provides the estimators behind the bid predictor:
//! - Decision trees and the Random Forest built on them
//! - Linear models (logistic regression, linear SVM) for the text baselines
//! - Classification metrics and ROC AUC
//! - Cross-validation splitters
//! - Baseline pipelines scored against the labelled data

pub mod baselines;
pub mod cross_validation;
pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;

pub use baselines::{run_baselines, BaselineScore, BASELINE_N_SPLITS, BASELINE_SEED};
pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use linear_models::{LinearSvc, LogisticRegression};
pub use metrics::{
    accuracy, confusion_counts, f1_score, precision, recall, roc_auc_score, TrainingMetrics,
};
pub use random_forest::{balanced_sample_weights, ClassWeight, MaxFeatures, RandomForest};
