//! Deterministic explanation of a recommendation from its matched cohort.
//!
//! [`CohortSummary`] holds the statistics; [`render`] turns them into the
//! text shown to decision officers. Identical inputs give byte-identical
//! output.

use crate::aggregate::{Recommendation, Verdict};
use crate::text::format_amount;
use aidx_core::{Case, CaseProfile, Decision, Neighbor};
use ahash::AHashMap;
use serde::Serialize;

/// Number of officer comments listed per outcome group
pub const TOP_COMMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentCount {
    pub comment: String,
    pub count: usize,
}

/// Statistics of the matches sharing one outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub decision: Decision,
    pub count: usize,
    pub mean_income: f64,
    pub top_comments: Vec<CommentCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub total: usize,
    pub mean_income: f64,
    /// Approved group first, then rejected; empty groups are left out
    pub groups: Vec<GroupSummary>,
}

impl CohortSummary {
    pub fn compute(neighbors: &[Neighbor<'_>]) -> Self {
        let cases: Vec<&Case> = neighbors.iter().map(|n| n.case).collect();

        let groups = [Decision::Approved, Decision::Rejected]
            .into_iter()
            .filter_map(|decision| {
                let members: Vec<&Case> = cases
                    .iter()
                    .copied()
                    .filter(|c| c.final_decision == decision)
                    .collect();
                if members.is_empty() {
                    return None;
                }
                Some(GroupSummary {
                    decision,
                    count: members.len(),
                    mean_income: mean_income(&members),
                    top_comments: top_comments(&members, TOP_COMMENTS),
                })
            })
            .collect();

        Self {
            total: cases.len(),
            mean_income: mean_income(&cases),
            groups,
        }
    }

    pub fn group(&self, decision: Decision) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.decision == decision)
    }
}

fn mean_income(cases: &[&Case]) -> f64 {
    if cases.is_empty() {
        return 0.0;
    }
    cases.iter().map(|c| c.income).sum::<f64>() / cases.len() as f64
}

/// Most frequent non-empty officer comments. Equal counts keep the order in
/// which the comment was first seen, i.e. retrieval order.
fn top_comments(cases: &[&Case], limit: usize) -> Vec<CommentCount> {
    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for comment in cases
        .iter()
        .filter_map(|c| c.decision_officer_comment.as_deref())
        .filter(|c| !c.trim().is_empty())
    {
        let count = counts.entry(comment).or_insert(0);
        if *count == 0 {
            first_seen.push(comment);
        }
        *count += 1;
    }

    let mut ranked: Vec<CommentCount> = first_seen
        .into_iter()
        .map(|comment| CommentCount {
            comment: comment.to_string(),
            count: counts.get(comment).copied().unwrap_or(0),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Explain `verdict` for `query` from its matched cohort
pub fn explain(query: &CaseProfile, neighbors: &[Neighbor<'_>], verdict: &Verdict) -> String {
    render(query, &CohortSummary::compute(neighbors), verdict)
}

pub fn render(query: &CaseProfile, summary: &CohortSummary, verdict: &Verdict) -> String {
    let total = verdict.total();
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(
        "Based on analysis of {} most similar historical cases:",
        total
    ));
    lines.push(format!(
        "• {} cases were APPROVED ({}%)",
        verdict.approved,
        percent(verdict.approved, total)
    ));
    lines.push(format!(
        "• {} cases were REJECTED ({}%)",
        verdict.rejected,
        percent(verdict.rejected, total)
    ));
    lines.push(format!(
        "• Confidence Level: {}%",
        (verdict.confidence * 100.0).round() as i64
    ));
    lines.push(String::new());

    lines.push("📋 Current Case Profile:".to_string());
    lines.push(format!(
        "• Monthly Income: {}",
        query
            .income
            .map(|v| format!("PKR {}", group_thousands(&format_amount(v))))
            .unwrap_or_else(|| "not provided".to_string())
    ));
    lines.push(format!(
        "• Family Members: {}",
        query
            .family_members
            .map(|m| m.to_string())
            .unwrap_or_else(|| "not provided".to_string())
    ));
    lines.push(format!(
        "• Average income in similar cases: PKR {}",
        whole_pkr(summary.mean_income)
    ));
    lines.push(String::new());

    lines.push("🔍 Key Patterns from Similar Cases:".to_string());

    for group in &summary.groups {
        let heading = match group.decision {
            Decision::Approved => "✅ Approved Cases",
            Decision::Rejected => "❌ Rejected Cases",
        };
        lines.push(String::new());
        lines.push(format!("{} ({}):", heading, group.count));
        lines.push(format!(
            "   • Average income: PKR {}",
            whole_pkr(group.mean_income)
        ));
        if !group.top_comments.is_empty() {
            lines.push("   • Common reasons:".to_string());
            for c in &group.top_comments {
                lines.push(format!("     - \"{}\" ({} cases)", c.comment, c.count));
            }
        }
    }

    let directive = match verdict.recommendation {
        Recommendation::Approved => "APPROVE",
        _ => "REJECT",
    };
    lines.push(String::new());
    lines.push(format!("💡 AI Recommendation: {} this case", directive));

    lines.join("\n")
}

/// Share of `part` in `total` as a whole percent, rounded half away from zero
fn percent(part: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as i64
}

fn whole_pkr(amount: f64) -> String {
    group_thousands(&format_amount(amount.round()))
}

/// Insert commas between thousands in the integer part of a decimal string
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return number.to_string();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
