//! Review-bucket routing
//!
//! Every tender maps to exactly one of three review buckets. Records without
//! usable PDF text cannot be scored and always land in manual review; scored
//! records split on the thresholded bid decision. Each bucket carries a fixed
//! notification message for the downstream review pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed PDF text must exceed this many characters before the model scores it
pub const MIN_USABLE_TEXT_CHARS: usize = 50;

/// Review bucket assigned to a tender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewCategory {
    /// No usable PDF text, so the model could not score the record
    #[serde(rename = "NO_PDF_DATA")]
    NoPdfData,
    /// Scored at or above the bid threshold
    #[serde(rename = "ML_PREDICTED_BID")]
    PredictedBid,
    /// Scored below the bid threshold
    #[serde(rename = "ML_PREDICTED_NO_BID")]
    PredictedNoBid,
}

impl ReviewCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewCategory::NoPdfData => "NO_PDF_DATA",
            ReviewCategory::PredictedBid => "ML_PREDICTED_BID",
            ReviewCategory::PredictedNoBid => "ML_PREDICTED_NO_BID",
        }
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the review pipeline should do with the tender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewAction {
    #[serde(rename = "MANUAL_REVIEW")]
    ManualReview,
    #[serde(rename = "LLM_SUMMARY_REQUIRED")]
    LlmSummaryRequired,
    #[serde(rename = "LOW_PRIORITY_REVIEW")]
    LowPriorityReview,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::ManualReview => "MANUAL_REVIEW",
            ReviewAction::LlmSummaryRequired => "LLM_SUMMARY_REQUIRED",
            ReviewAction::LowPriorityReview => "LOW_PRIORITY_REVIEW",
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of the review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewPriority {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "URGENT")]
    Urgent,
    #[serde(rename = "LOW")]
    Low,
}

impl ReviewPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewPriority::High => "HIGH",
            ReviewPriority::Urgent => "URGENT",
            ReviewPriority::Low => "LOW",
        }
    }
}

impl fmt::Display for ReviewPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing outcome for one tender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub title: String,
    pub category: ReviewCategory,
    pub action: ReviewAction,
    pub priority: ReviewPriority,
    /// Notification message for the review channel
    pub message: String,
    /// Bid probability, absent when the record could not be scored
    pub probability: Option<f64>,
    /// Whether the pipeline should generate an LLM summary
    pub requires_llm_summary: bool,
}

/// Whether the record's PDF text is long enough to score
pub fn has_usable_text(pdf_text: &str) -> bool {
    pdf_text.trim().chars().count() > MIN_USABLE_TEXT_CHARS
}

/// Route one tender into its review bucket.
///
/// Total over all inputs: a record without usable text goes to manual review
/// no matter what probability accompanies it, and a record that arrives
/// without a probability is treated the same way.
pub fn route_record(
    title: &str,
    pdf_text: &str,
    probability: Option<f64>,
    threshold: f64,
) -> ReviewDecision {
    match probability {
        Some(p) if has_usable_text(pdf_text) => {
            if p >= threshold {
                ReviewDecision {
                    title: title.to_string(),
                    category: ReviewCategory::PredictedBid,
                    action: ReviewAction::LlmSummaryRequired,
                    priority: ReviewPriority::Urgent,
                    message: format!(
                        "🎯 ACTION REQUIRED: '{}' - ML predicts BID opportunity ({:.1}% confidence)",
                        title,
                        p * 100.0
                    ),
                    probability: Some(p),
                    requires_llm_summary: true,
                }
            } else {
                ReviewDecision {
                    title: title.to_string(),
                    category: ReviewCategory::PredictedNoBid,
                    action: ReviewAction::LowPriorityReview,
                    priority: ReviewPriority::Low,
                    message: format!(
                        "📋 Low Priority: '{}' - ML suggests no bid ({:.1}% confidence)",
                        title,
                        p * 100.0
                    ),
                    probability: Some(p),
                    requires_llm_summary: false,
                }
            }
        }
        _ => ReviewDecision {
            title: title.to_string(),
            category: ReviewCategory::NoPdfData,
            action: ReviewAction::ManualReview,
            priority: ReviewPriority::High,
            message: format!(
                "⚠️ Manual Review Required: '{}' - No PDF data available for ML analysis",
                title
            ),
            probability: None,
            requires_llm_summary: false,
        },
    }
}
