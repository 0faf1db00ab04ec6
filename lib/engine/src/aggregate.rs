//! Majority vote over the retrieved cohort.
//!
//! Confidence is the share of matches that agree with the majority outcome.
//! It is a heuristic agreement measure, not a calibrated probability.

use aidx_core::{Error, Neighbor, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Approved,
    Rejected,
    /// Only produced when a prediction fails
    Error,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Approved => "APPROVED",
            Recommendation::Rejected => "REJECTED",
            Recommendation::Error => "ERROR",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the vote over K matches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub recommendation: Recommendation,
    /// `max(approved, rejected) / K`, in [0.5, 1.0]
    pub confidence: f64,
    pub approved: usize,
    pub rejected: usize,
}

impl Verdict {
    /// Strict majority approves; ties (including 50/50) reject.
    pub fn from_counts(approved: usize, rejected: usize) -> Result<Self> {
        let total = approved + rejected;
        if total == 0 {
            return Err(Error::EmptyCorpus);
        }

        let recommendation = if approved > rejected {
            Recommendation::Approved
        } else {
            Recommendation::Rejected
        };

        Ok(Self {
            recommendation,
            confidence: approved.max(rejected) as f64 / total as f64,
            approved,
            rejected,
        })
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.approved + self.rejected
    }
}

pub fn aggregate(neighbors: &[Neighbor<'_>]) -> Result<Verdict> {
    let approved = neighbors.iter().filter(|n| n.case.is_approved()).count();
    Verdict::from_counts(approved, neighbors.len() - approved)
}
