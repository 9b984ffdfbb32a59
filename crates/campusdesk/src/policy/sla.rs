//! SLA deadline evaluation.
//!
//! Each priority maps to a number of hours a complaint may stay unresolved.
//! [`evaluate`] turns a complaint's creation time into either an overdue flag
//! or a human-readable countdown label. Results depend on "now" and must be
//! recomputed on every query rather than stored.

use crate::domain::{ComplaintStatus, Priority};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Hours used when neither the priority nor medium is configured.
pub const DEFAULT_MEDIUM_HOURS: u32 = 72;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

/// Per-tenant deadline table.
///
/// A priority left unset falls back to the medium deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicy {
    /// Hours allowed for critical complaints
    #[serde(default)]
    pub critical: Option<u32>,

    /// Hours allowed for high-priority complaints
    #[serde(default)]
    pub high: Option<u32>,

    /// Hours allowed for medium-priority complaints
    #[serde(default)]
    pub medium: Option<u32>,

    /// Hours allowed for low-priority complaints
    #[serde(default)]
    pub low: Option<u32>,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            critical: Some(24),
            high: Some(24),
            medium: Some(DEFAULT_MEDIUM_HOURS),
            low: Some(120),
        }
    }
}

impl SlaPolicy {
    /// Deadline hours for `priority`, falling back to medium's.
    pub fn hours_for(&self, priority: Priority) -> u32 {
        let configured = match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        };
        configured
            .or(self.medium)
            .unwrap_or(DEFAULT_MEDIUM_HOURS)
    }

    /// Set the deadline for one priority.
    pub fn set_hours(&mut self, priority: Priority, hours: u32) {
        let slot = match priority {
            Priority::Critical => &mut self.critical,
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        };
        *slot = Some(hours);
    }

    /// Reject zero-hour deadlines.
    pub fn validate(&self) -> Result<(), String> {
        for priority in Priority::ALL {
            let slot = match priority {
                Priority::Critical => self.critical,
                Priority::High => self.high,
                Priority::Medium => self.medium,
                Priority::Low => self.low,
            };
            if slot == Some(0) {
                return Err(format!("SLA hours for {priority} must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Coarse urgency of an SLA result, used for colouring output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaTone {
    /// Complaint is resolved
    Resolved,
    /// A day or more left
    OnTrack,
    /// Less than a day left
    DueSoon,
    /// Deadline passed
    Overdue,
}

/// Outcome of evaluating a complaint against its deadline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaStatus {
    /// Deadline has passed and the complaint is unresolved
    pub overdue: bool,

    /// Time left until the deadline, when not overdue or resolved
    #[serde(rename = "remaining_ms", serialize_with = "serialize_remaining")]
    pub remaining: Option<Duration>,

    /// Display label, e.g. "3d 18h left"
    pub label: String,
}

impl SlaStatus {
    fn resolved() -> Self {
        Self {
            overdue: false,
            remaining: None,
            label: "Resolved".to_string(),
        }
    }

    fn overdue() -> Self {
        Self {
            overdue: true,
            remaining: None,
            label: "Overdue".to_string(),
        }
    }

    /// Urgency bucket for display.
    pub fn tone(&self) -> SlaTone {
        match self.remaining {
            _ if self.overdue => SlaTone::Overdue,
            None => SlaTone::Resolved,
            Some(left) if left < Duration::hours(24) => SlaTone::DueSoon,
            Some(_) => SlaTone::OnTrack,
        }
    }
}

fn serialize_remaining<S: Serializer>(
    remaining: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match remaining {
        Some(left) => serializer.serialize_some(&left.num_milliseconds()),
        None => serializer.serialize_none(),
    }
}

/// The moment a complaint's SLA expires.
pub fn deadline(created_at: DateTime<Utc>, priority: Priority, policy: &SlaPolicy) -> DateTime<Utc> {
    created_at + Duration::hours(i64::from(policy.hours_for(priority)))
}

/// Evaluate a complaint's SLA at instant `now`.
///
/// Resolved complaints are never overdue. Otherwise the remaining time is
/// floored to whole hours; a day or more renders as `"{d}d {h}h left"`,
/// less than a day as `"{h}h {m}m left"`.
pub fn evaluate(
    created_at: DateTime<Utc>,
    priority: Priority,
    status: ComplaintStatus,
    policy: &SlaPolicy,
    now: DateTime<Utc>,
) -> SlaStatus {
    if status == ComplaintStatus::Resolved {
        return SlaStatus::resolved();
    }

    let diff = deadline(created_at, priority, policy) - now;
    let diff_ms = diff.num_milliseconds();
    if diff_ms <= 0 {
        return SlaStatus::overdue();
    }

    let hours = diff_ms / MS_PER_HOUR;
    let label = if hours >= 24 {
        format!("{}d {}h left", hours / 24, hours % 24)
    } else {
        let minutes = (diff_ms % MS_PER_HOUR) / MS_PER_MINUTE;
        format!("{hours}h {minutes}m left")
    };

    SlaStatus {
        overdue: false,
        remaining: Some(diff),
        label,
    }
}

/// Evaluate against the current wall-clock time.
pub fn evaluate_now(
    created_at: DateTime<Utc>,
    priority: Priority,
    status: ComplaintStatus,
    policy: &SlaPolicy,
) -> SlaStatus {
    evaluate(created_at, priority, status, policy, Utc::now())
}
