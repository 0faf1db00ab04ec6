//! Maps a prediction to a review status and priority for case workers.

use crate::aggregate::Recommendation;
use crate::prediction::Prediction;
use serde::{Deserialize, Serialize};

/// Confidence at or above which a recommendation skips manual review
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    RecommendedForApproval,
    RecommendedForRejection,
    NeedsReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub status: ReviewStatus,
    pub priority: ReviewPriority,
}

/// Thresholds apply to the two-decimal confidence callers see on the wire.
pub fn triage(prediction: &Prediction, threshold: f64) -> Triage {
    let confident = prediction.rounded_confidence() >= threshold;

    let (status, priority) = match prediction.recommendation() {
        Recommendation::Approved if confident => {
            (ReviewStatus::RecommendedForApproval, ReviewPriority::High)
        }
        Recommendation::Rejected if confident => {
            (ReviewStatus::RecommendedForRejection, ReviewPriority::Low)
        }
        _ => (ReviewStatus::NeedsReview, ReviewPriority::Medium),
    };

    Triage { status, priority }
}
