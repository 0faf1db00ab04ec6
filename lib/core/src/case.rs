use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Historical outcome of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels are matched after trimming and case-folding, so "approved ",
/// "APPROVED" and "Approved" are all the same decision.
impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let label = s.trim();
        if label.eq_ignore_ascii_case("approved") {
            Ok(Decision::Approved)
        } else if label.eq_ignore_ascii_case("rejected") {
            Ok(Decision::Rejected)
        } else {
            Err(format!("unknown decision label: {:?}", s))
        }
    }
}

impl TryFrom<String> for Decision {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Decision> for String {
    fn from(decision: Decision) -> Self {
        decision.as_str().to_string()
    }
}

/// A previously decided case from the historical corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: String,
    /// Monthly income in PKR
    pub income: f64,
    pub family_members: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enquiry_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_officer_comment: Option<String>,
    pub final_decision: Decision,
    /// Only meaningful for approved cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid_amount: Option<f64>,
}

impl Case {
    pub fn new(
        case_id: impl Into<String>,
        income: f64,
        family_members: u32,
        final_decision: Decision,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            income,
            family_members,
            enquiry_feedback: None,
            verification_notes: None,
            decision_officer_comment: None,
            final_decision,
            aid_amount: None,
        }
    }

    #[must_use]
    pub fn with_enquiry_feedback(mut self, text: impl Into<String>) -> Self {
        self.enquiry_feedback = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_verification_notes(mut self, text: impl Into<String>) -> Self {
        self.verification_notes = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_officer_comment(mut self, text: impl Into<String>) -> Self {
        self.decision_officer_comment = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_aid_amount(mut self, amount: f64) -> Self {
        self.aid_amount = Some(amount);
        self
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.final_decision == Decision::Approved
    }

    /// Check the numeric invariants of a historical case
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidCase {
            case_id: self.case_id.clone(),
            reason: reason.to_string(),
        };

        if self.case_id.trim().is_empty() {
            return Err(invalid("case_id must not be empty"));
        }
        if !self.income.is_finite() || self.income < 0.0 {
            return Err(invalid("income must be a non-negative number"));
        }
        if self.family_members == 0 {
            return Err(invalid("family_members must be at least 1"));
        }
        if let Some(amount) = self.aid_amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(invalid("aid_amount must be a non-negative number"));
            }
        }
        Ok(())
    }

    /// The fields a candidate case would carry, without id or outcome
    pub fn profile(&self) -> CaseProfile {
        CaseProfile {
            income: Some(self.income),
            family_members: Some(self.family_members),
            enquiry_feedback: self.enquiry_feedback.clone(),
            verification_notes: self.verification_notes.clone(),
            decision_officer_comment: self.decision_officer_comment.clone(),
        }
    }
}

/// A candidate case awaiting a recommendation. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseProfile {
    pub income: Option<f64>,
    pub family_members: Option<u32>,
    pub enquiry_feedback: Option<String>,
    pub verification_notes: Option<String>,
    pub decision_officer_comment: Option<String>,
}

impl CaseProfile {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_income(mut self, income: f64) -> Self {
        self.income = Some(income);
        self
    }

    #[must_use]
    pub fn with_family_members(mut self, members: u32) -> Self {
        self.family_members = Some(members);
        self
    }

    #[must_use]
    pub fn with_enquiry_feedback(mut self, text: impl Into<String>) -> Self {
        self.enquiry_feedback = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_verification_notes(mut self, text: impl Into<String>) -> Self {
        self.verification_notes = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_officer_comment(mut self, text: impl Into<String>) -> Self {
        self.decision_officer_comment = Some(text.into());
        self
    }
}

impl From<&Case> for CaseProfile {
    fn from(case: &Case) -> Self {
        case.profile()
    }
}
