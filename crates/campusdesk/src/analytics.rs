//! Dashboard counters and trend analytics over a complaint snapshot.
//!
//! Everything here is a pure function of the complaints passed in. Callers
//! choose the snapshot (usually [`crate::desk::visible_complaints`]) so the
//! numbers always match what the session is allowed to see.

use crate::domain::{Complaint, ComplaintStatus};
use crate::policy::{SlaPolicy, sla};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Months covered by the creation trend, including the current one.
pub const TREND_MONTHS: u32 = 6;

/// Categories listed in the top-category breakdown.
pub const TOP_CATEGORY_COUNT: usize = 5;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Headline counters for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Non-deleted complaints
    pub total: usize,

    /// Complaints nobody has picked up yet
    pub open: usize,

    /// Complaints being worked on
    pub in_progress: usize,

    /// Complaints marked resolved
    pub resolved: usize,

    /// `resolved / total` as a rounded percentage, 0 when empty
    pub resolution_rate: u32,
}

/// Complaints created in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// Month label, e.g. "Mar 2026"
    pub month: String,

    /// Complaints created that month
    pub count: usize,
}

/// Complaints in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// Category name as stored
    pub category: String,

    /// Number of complaints
    pub count: usize,
}

/// Resolution and SLA performance over a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancedStats {
    /// Mean time from creation to resolution, rounded to whole hours
    pub avg_resolution_hours: i64,

    /// Share of picked-up complaints that met their SLA, as a percentage
    pub sla_compliance: u32,

    /// Creations per month, oldest first
    pub monthly_trend: Vec<MonthCount>,

    /// Most common categories, largest first
    pub top_categories: Vec<CategoryCount>,
}

/// Round `part / total` to a whole percentage. Empty totals give `empty`.
fn percent(part: usize, total: usize, empty: u32) -> u32 {
    if total == 0 {
        return empty;
    }
    let rounded = (part * 100 + total / 2) / total;
    u32::try_from(rounded).unwrap_or(100)
}

/// Count complaints by status. Soft-deleted complaints are ignored.
pub fn dashboard_stats<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> DashboardStats {
    let mut stats = DashboardStats::default();
    for complaint in complaints.into_iter().filter(|c| !c.is_deleted) {
        stats.total += 1;
        match complaint.status {
            ComplaintStatus::Open => stats.open += 1,
            ComplaintStatus::InProgress => stats.in_progress += 1,
            ComplaintStatus::Resolved => stats.resolved += 1,
        }
    }
    stats.resolution_rate = percent(stats.resolved, stats.total, 0);
    stats
}

/// Whether a complaint that has left the open state is within its SLA.
///
/// Resolved complaints always count as compliant; unresolved ones comply
/// while they are not overdue at `now`.
fn met_sla(complaint: &Complaint, policy: &SlaPolicy, now: DateTime<Utc>) -> bool {
    !sla::evaluate(
        complaint.created_at,
        complaint.priority,
        complaint.status,
        policy,
        now,
    )
    .overdue
}

fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// First day of each of the last [`TREND_MONTHS`] months, oldest first.
fn trend_months(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    (0..TREND_MONTHS)
        .rev()
        .filter_map(|back| first.checked_sub_months(Months::new(back)))
        .collect()
}

/// Resolution time, SLA compliance, creation trend and top categories.
///
/// Soft-deleted complaints are ignored. Category ties are broken
/// alphabetically.
pub fn advanced(complaints: &[Complaint], policy: &SlaPolicy, now: DateTime<Utc>) -> AdvancedStats {
    let live: Vec<&Complaint> = complaints.iter().filter(|c| !c.is_deleted).collect();

    let durations: Vec<i64> = live
        .iter()
        .filter(|c| c.status == ComplaintStatus::Resolved)
        .filter_map(|c| c.resolved_at.map(|at| (at - c.created_at).num_milliseconds()))
        .collect();
    let avg_resolution_hours = match i64::try_from(durations.len()) {
        Ok(n) if n > 0 => {
            let total: i64 = durations.iter().sum();
            (total + n * MS_PER_HOUR / 2).div_euclid(n * MS_PER_HOUR)
        }
        _ => 0,
    };

    let picked_up: Vec<&&Complaint> = live
        .iter()
        .filter(|c| c.status != ComplaintStatus::Open)
        .collect();
    let compliant = picked_up.iter().filter(|c| met_sla(c, policy, now)).count();
    let sla_compliance = percent(compliant, picked_up.len(), 100);

    let monthly_trend = trend_months(now)
        .into_iter()
        .map(|start| MonthCount {
            month: month_label(start),
            count: live
                .iter()
                .filter(|c| {
                    let created = c.created_at.date_naive();
                    created.year() == start.year() && created.month() == start.month()
                })
                .count(),
        })
        .collect();

    let mut by_category: HashMap<&str, usize> = HashMap::new();
    for complaint in &live {
        *by_category.entry(complaint.category.as_str()).or_default() += 1;
    }
    let mut top_categories: Vec<CategoryCount> = by_category
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    top_categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    top_categories.truncate(TOP_CATEGORY_COUNT);

    AdvancedStats {
        avg_resolution_hours,
        sla_compliance,
        monthly_trend,
        top_categories,
    }
}
