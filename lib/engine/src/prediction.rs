use crate::aggregate::Recommendation;
use aidx_core::ScoredCase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successful recommendation with its supporting cohort
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// APPROVED or REJECTED
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub explanation: String,
    /// K actually used, `min(top_k, corpus size)`
    pub similar_cases_count: usize,
    pub approved_matches: usize,
    pub rejected_matches: usize,
    /// Best match first
    pub top_similar_cases: Vec<ScoredCase>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionFailure {
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

/// Outcome of [`DecisionEngine::predict`](crate::DecisionEngine::predict).
///
/// Serializes to the flat [`PredictionResponse`] shape; failures carry
/// `ai_recommendation = "ERROR"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "PredictionResponse")]
pub enum Prediction {
    Recommended(PredictionResult),
    Failed(PredictionFailure),
}

impl Prediction {
    pub fn failed(message: impl Into<String>) -> Self {
        Prediction::Failed(PredictionFailure {
            message: message.into(),
            generated_at: Utc::now(),
        })
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, Prediction::Recommended(_))
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            Prediction::Recommended(r) => r.recommendation,
            Prediction::Failed(_) => Recommendation::Error,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Prediction::Recommended(r) => r.confidence,
            Prediction::Failed(_) => 0.0,
        }
    }

    /// Confidence as reported on the wire, rounded to two decimals
    pub fn rounded_confidence(&self) -> f64 {
        round_confidence(self.confidence())
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            Prediction::Recommended(r) => Some(r),
            Prediction::Failed(_) => None,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        match self {
            Prediction::Recommended(r) => r.generated_at,
            Prediction::Failed(f) => f.generated_at,
        }
    }

    pub fn to_response(&self) -> PredictionResponse {
        self.clone().into()
    }
}

/// Wire shape consumed by dashboards and integrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub ai_recommendation: Recommendation,
    /// Rounded to two decimals
    pub confidence: f64,
    pub explanation: String,
    pub similar_cases_count: usize,
    pub approved_matches: usize,
    pub rejected_matches: usize,
    pub top_similar_cases: Vec<ScoredCase>,
    pub generated_at: DateTime<Utc>,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        match prediction {
            Prediction::Recommended(r) => Self {
                ai_recommendation: r.recommendation,
                confidence: round_confidence(r.confidence),
                explanation: r.explanation,
                similar_cases_count: r.similar_cases_count,
                approved_matches: r.approved_matches,
                rejected_matches: r.rejected_matches,
                top_similar_cases: r.top_similar_cases,
                generated_at: r.generated_at,
            },
            Prediction::Failed(f) => Self {
                ai_recommendation: Recommendation::Error,
                confidence: 0.0,
                explanation: format!("Error generating recommendation: {}", f.message),
                similar_cases_count: 0,
                approved_matches: 0,
                rejected_matches: 0,
                top_similar_cases: Vec::new(),
                generated_at: f.generated_at,
            },
        }
    }
}

fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}
