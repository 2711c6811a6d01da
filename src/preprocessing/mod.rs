//! Data preprocessing module
//!
//! Fitted transforms that travel with the model artifact:
//! - Categorical encoding for the contracting authority
//! - Standard scaling for the numeric feature matrix

mod encoder;
mod scaler;

pub use encoder::{AuthorityEncoder, UNKNOWN_CODE};
pub use scaler::StandardScaler;
