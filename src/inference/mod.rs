//! Bid prediction and review routing
//!
//! Provides the trained-artifact side of the system:
//! - The recall-first bid predictor (train, predict, save/load)
//! - Thresholded decisions with per-prediction confidence
//! - Three-bucket review routing with fixed notification messages

mod config;
mod engine;
pub mod routing;

pub use config::PredictorConfig;
pub use engine::{BidPredictor, Prediction};
pub use routing::{
    has_usable_text, route_record, ReviewAction, ReviewCategory, ReviewDecision, ReviewPriority,
    MIN_USABLE_TEXT_CHARS,
};
