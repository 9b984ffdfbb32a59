//! Append-only activity log entries and user notifications.

use super::{ComplaintId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry in a complaint's activity timeline.
///
/// Entries are never mutated or deleted once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Unique identifier (`act-{n}`)
    pub id: String,

    /// Complaint the entry describes
    pub complaint_id: ComplaintId,

    /// Short action label, e.g. "Assigned to technician"
    pub action: String,

    /// Free-form details
    #[serde(default)]
    pub details: Option<String>,

    /// User who performed the action
    pub performed_by: UserId,

    /// When the action happened
    pub created_at: DateTime<Utc>,
}

/// Data for appending an activity entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    /// Complaint the entry describes
    pub complaint_id: ComplaintId,

    /// Short action label
    pub action: String,

    /// Free-form details
    pub details: Option<String>,

    /// User who performed the action
    pub performed_by: UserId,
}

impl NewActivity {
    /// Build an entry with details.
    pub fn new(
        complaint_id: ComplaintId,
        action: impl Into<String>,
        details: impl Into<String>,
        performed_by: UserId,
    ) -> Self {
        Self {
            complaint_id,
            action: action.into(),
            details: Some(details.into()),
            performed_by,
        }
    }
}

/// Category of a notification, used for icons and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A complaint was assigned
    Assignment,

    /// A complaint was resolved
    Resolution,

    /// Anything else
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationKind::Assignment => "assignment",
            NotificationKind::Resolution => "resolution",
            NotificationKind::Info => "info",
        };
        f.write_str(name)
    }
}

/// A message addressed to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier (`ntf-{n}`)
    pub id: String,

    /// Recipient
    pub user_id: UserId,

    /// Headline
    pub title: String,

    /// Body text
    pub message: String,

    /// Category
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// Related complaint
    #[serde(default)]
    pub complaint_id: Option<ComplaintId>,

    /// Whether the recipient has read it
    #[serde(default)]
    pub is_read: bool,

    /// When it was created
    pub created_at: DateTime<Utc>,
}

/// Data for creating a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient
    pub user_id: UserId,

    /// Headline
    pub title: String,

    /// Body text
    pub message: String,

    /// Category
    pub kind: NotificationKind,

    /// Related complaint
    pub complaint_id: Option<ComplaintId>,
}
