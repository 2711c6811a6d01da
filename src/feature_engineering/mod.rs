//! Feature engineering
//!
//! Everything between a cleaned tender frame and a numeric matrix: the
//! fixed-order feature extractor used by the predictor, the hard-coded
//! key-term vocabulary, lot-section extraction from PDF text, and the
//! vectorizers behind the baseline text models.

mod extractor;
mod lot_section;
mod terms;
mod text_features;

pub use extractor::{FeatureExtractor, BASE_FEATURES};
pub use lot_section::extract_lot_section;
pub use terms::{term_weight, KeyTermScorer, KEY_TERMS};
pub use text_features::{CountVectorizer, HashingVectorizer, TextTokenizer, TfidfVectorizer};
