//! Domain types for complaint management.
//!
//! This module contains the core domain types for campusdesk: complaints and
//! their lifecycle enums, plus the people and record types re-exported from
//! the submodules.

mod people;
mod records;

pub use people::{NewUser, Role, Session, UserId, UserProfile};
pub use records::{
    ActivityLogEntry, NewActivity, NewNotification, Notification, NotificationKind,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for complaint titles
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for complaint descriptions
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Categories offered to new tenants.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "Electrical",
    "Plumbing",
    "Internet",
    "Classroom Maintenance",
    "Hostel Issue",
    "Other",
];

/// Unique identifier for a complaint
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(pub String);

impl ComplaintId {
    /// Create a new complaint ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ComplaintId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ComplaintId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Urgency of a complaint, lowest first
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait several days
    Low,

    /// Default priority
    #[default]
    Medium,

    /// Needs attention within a day
    High,

    /// Safety or campus-wide outage
    Critical,
}

impl Priority {
    /// All priorities, lowest first
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!(
                "Invalid priority '{other}'. Valid values: low, medium, high, critical"
            )),
        }
    }
}

/// Workflow status of a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Filed, not yet picked up
    Open,

    /// Assigned and being worked on
    InProgress,

    /// Fixed; terminal
    Resolved,
}

impl ComplaintStatus {
    /// Wire name (`open`, `in_progress`, `resolved`)
    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    /// Human-readable name (`in progress` rather than `in_progress`)
    pub fn label(self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::InProgress => "in progress",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    /// Position along the workflow; transitions only move forward.
    pub fn stage(self) -> u8 {
        match self {
            ComplaintStatus::Open => 0,
            ComplaintStatus::InProgress => 1,
            ComplaintStatus::Resolved => 2,
        }
    }

    /// Whether the workflow allows moving from `self` to `next`.
    pub fn can_advance_to(self, next: ComplaintStatus) -> bool {
        next.stage() > self.stage()
    }

    /// Open and in-progress complaints count toward workload.
    pub fn is_active(self) -> bool {
        matches!(self, ComplaintStatus::Open | ComplaintStatus::InProgress)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(ComplaintStatus::Open),
            "in_progress" | "in-progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            other => Err(format!(
                "Invalid status '{other}'. Valid values: open, in_progress, resolved"
            )),
        }
    }
}

/// A maintenance complaint filed by a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    /// Unique identifier
    pub id: ComplaintId,

    /// Short summary
    pub title: String,

    /// Full description of the problem
    pub description: String,

    /// Tenant-defined category, stored lowercase
    pub category: String,

    /// Urgency
    pub priority: Priority,

    /// Workflow status
    pub status: ComplaintStatus,

    /// Where on campus the problem is
    #[serde(default)]
    pub location: Option<String>,

    /// Reporting user
    #[serde(default)]
    pub created_by: Option<UserId>,

    /// Assigned technician
    #[serde(default)]
    pub assigned_to: Option<UserId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,

    /// Set exactly when the status is resolved
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,

    /// Set exactly when `is_deleted` is true
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Complaint {
    /// Open or in progress, and not soft-deleted.
    pub fn is_active(&self) -> bool {
        !self.is_deleted && self.status.is_active()
    }

    /// Check field limits and the resolved/deleted timestamp invariants.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;

        if self.category.trim().is_empty() {
            return Err("Category cannot be empty".to_string());
        }
        if (self.status == ComplaintStatus::Resolved) != self.resolved_at.is_some() {
            return Err(format!(
                "resolved_at must be set exactly when status is resolved (status: {})",
                self.status
            ));
        }
        if self.is_deleted != self.deleted_at.is_some() {
            return Err("deleted_at must be set exactly when is_deleted is true".to_string());
        }
        Ok(())
    }
}

/// Data for filing a new complaint
#[derive(Debug, Clone)]
pub struct NewComplaint {
    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Category name (matched case-insensitively against tenant settings)
    pub category: String,

    /// Urgency
    pub priority: Priority,

    /// Location (optional)
    pub location: Option<String>,

    /// Reporting user, filled in from the session
    pub created_by: Option<UserId>,
}

impl NewComplaint {
    /// Validate title, description and category presence.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        if self.category.trim().is_empty() {
            return Err("Category is required".to_string());
        }
        Ok(())
    }
}

/// Partial update applied by the store.
///
/// Only fields that are `Some` are modified. Clearable fields use a nested
/// `Option` so that `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct ComplaintPatch {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New category
    pub category: Option<String>,

    /// New priority
    pub priority: Option<Priority>,

    /// New location (`Some(None)` to clear)
    pub location: Option<Option<String>>,

    /// New status; resolving stamps `resolved_at`
    pub status: Option<ComplaintStatus>,

    /// New assignee (`Some(None)` to unassign)
    pub assigned_to: Option<Option<UserId>>,

    /// Soft-delete (`Some(true)`) or restore (`Some(false)`)
    pub deleted: Option<bool>,
}

impl ComplaintPatch {
    /// Apply the patch to `complaint`, maintaining timestamp invariants.
    pub fn apply(self, complaint: &mut Complaint, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            complaint.title = title;
        }
        if let Some(description) = self.description {
            complaint.description = description;
        }
        if let Some(category) = self.category {
            complaint.category = category.trim().to_lowercase();
        }
        if let Some(priority) = self.priority {
            complaint.priority = priority;
        }
        if let Some(location) = self.location {
            complaint.location = location;
        }
        if let Some(status) = self.status {
            complaint.status = status;
            if status == ComplaintStatus::Resolved {
                if complaint.resolved_at.is_none() {
                    complaint.resolved_at = Some(now);
                }
            } else {
                complaint.resolved_at = None;
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            complaint.assigned_to = assigned_to;
        }
        match self.deleted {
            Some(true) => {
                complaint.is_deleted = true;
                complaint.deleted_at = Some(now);
            }
            Some(false) => {
                complaint.is_deleted = false;
                complaint.deleted_at = None;
            }
            None => {}
        }
        complaint.updated_at = now;
    }
}

/// How soft-deleted complaints are treated by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletedFilter {
    /// Hide deleted complaints (default listing)
    #[default]
    Exclude,

    /// Return deleted and live complaints
    Include,

    /// Return only deleted complaints
    Only,
}

/// Filter for querying complaints
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    /// Filter by status
    pub status: Option<ComplaintStatus>,

    /// Filter by priority
    pub priority: Option<Priority>,

    /// Filter by category (case-insensitive)
    pub category: Option<String>,

    /// Filter by assigned technician
    pub assigned_to: Option<UserId>,

    /// Filter by reporter
    pub created_by: Option<UserId>,

    /// Case-insensitive substring over title and description
    pub search: Option<String>,

    /// Treatment of soft-deleted complaints
    pub deleted: DeletedFilter,

    /// Limit number of results
    pub limit: Option<usize>,
}

impl ComplaintFilter {
    /// Whether `complaint` passes every criterion (the limit is not applied).
    pub fn matches(&self, complaint: &Complaint) -> bool {
        let deleted_ok = match self.deleted {
            DeletedFilter::Exclude => !complaint.is_deleted,
            DeletedFilter::Include => true,
            DeletedFilter::Only => complaint.is_deleted,
        };
        if !deleted_ok {
            return false;
        }
        if self.status.is_some_and(|s| s != complaint.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != complaint.priority) {
            return false;
        }
        if let Some(category) = &self.category {
            if !complaint.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        if let Some(assignee) = &self.assigned_to {
            if complaint.assigned_to.as_ref() != Some(assignee) {
                return false;
            }
        }
        if let Some(reporter) = &self.created_by {
            if complaint.created_by.as_ref() != Some(reporter) {
                return false;
            }
        }
        if let Some(query) = &self.search {
            let query = query.trim().to_lowercase();
            if !query.is_empty()
                && !complaint.title.to_lowercase().contains(&query)
                && !complaint.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        true
    }
}

/// Validate a complaint title: non-empty, single line, bounded length.
pub fn validate_title(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {}",
            title.chars().count()
        ));
    }
    if let Some(pos) = title.chars().position(char::is_control) {
        return Err(format!(
            "Title contains invalid control character at position {pos}"
        ));
    }
    Ok(())
}

/// Validate a complaint description: non-empty and bounded length.
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Description cannot be empty".to_string());
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }
    Ok(())
}
