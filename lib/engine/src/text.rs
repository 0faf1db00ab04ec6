//! Canonical text representation of a case.
//!
//! The same function renders corpus rows at train time and the query at
//! predict time; any divergence between the two silently degrades retrieval.

use aidx_core::CaseProfile;

pub const FIELD_SEPARATOR: &str = " | ";

/// Render the present, non-empty fields of `profile` in fixed order:
/// income, family size, enquiry feedback, verification notes, officer comment.
pub fn case_text(profile: &CaseProfile) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(5);

    if let Some(income) = profile.income {
        parts.push(format!("Monthly income PKR {}", format_amount(income)));
    }
    if let Some(members) = profile.family_members {
        parts.push(format!("Family of {} members", members));
    }

    let notes = [
        &profile.enquiry_feedback,
        &profile.verification_notes,
        &profile.decision_officer_comment,
    ];
    for text in notes.into_iter().flatten() {
        if !text.trim().is_empty() {
            parts.push(text.clone());
        }
    }

    parts.join(FIELD_SEPARATOR)
}

/// Integral amounts print without a fractional part (`15000`, not `15000.0`)
pub fn format_amount(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
