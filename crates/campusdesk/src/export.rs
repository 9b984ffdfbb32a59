//! CSV export of complaints and the activity log.
//!
//! Title, description and the activity text columns are always wrapped in
//! double quotes with embedded quotes doubled. Other columns are quoted only
//! when they contain a comma, quote or line break. Rows are joined with `\n`.

use crate::desk;
use crate::domain::{ActivityLogEntry, Complaint, ComplaintId, Role, Session, UserId};
use crate::error::Result;
use crate::storage::DeskStorage;
use std::collections::HashMap;

/// Header row of the complaint export.
pub const COMPLAINT_HEADERS: [&str; 9] = [
    "Title",
    "Description",
    "Category",
    "Priority",
    "Status",
    "Location",
    "Created At",
    "Reported By",
    "Assigned To",
];

/// Header row of the activity export.
pub const ACTIVITY_HEADERS: [&str; 5] = ["Complaint", "Action", "Details", "Performed By", "Timestamp"];

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn plain(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

fn name_or<'a>(names: &'a HashMap<UserId, String>, id: Option<&UserId>, fallback: &'a str) -> &'a str {
    id.and_then(|id| names.get(id)).map_or(fallback, String::as_str)
}

/// Render complaints as CSV.
///
/// `names` maps user IDs to display names; reporters and assignees missing
/// from it are written as "Unknown" and "Unassigned".
pub fn complaints_csv(complaints: &[Complaint], names: &HashMap<UserId, String>) -> String {
    let mut lines = Vec::with_capacity(complaints.len() + 1);
    lines.push(COMPLAINT_HEADERS.join(","));

    for c in complaints {
        let row = [
            quoted(&c.title),
            quoted(&c.description),
            plain(&c.category),
            c.priority.to_string(),
            c.status.to_string(),
            plain(c.location.as_deref().unwrap_or("")),
            c.created_at.format("%Y-%m-%d").to_string(),
            plain(name_or(names, c.created_by.as_ref(), "Unknown")),
            plain(name_or(names, c.assigned_to.as_ref(), "Unassigned")),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Render activity entries as CSV.
///
/// The complaint column shows the complaint title from `titles`, falling back
/// to its ID.
pub fn activity_csv(
    entries: &[ActivityLogEntry],
    titles: &HashMap<ComplaintId, String>,
    names: &HashMap<UserId, String>,
) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(ACTIVITY_HEADERS.join(","));

    for entry in entries {
        let complaint = titles
            .get(&entry.complaint_id)
            .map_or(entry.complaint_id.as_str(), String::as_str);
        let row = [
            quoted(complaint),
            quoted(&entry.action),
            quoted(entry.details.as_deref().unwrap_or("")),
            plain(name_or(names, Some(&entry.performed_by), "Unknown")),
            entry.created_at.to_rfc3339(),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

async fn display_names(store: &dyn DeskStorage) -> Result<HashMap<UserId, String>> {
    Ok(store
        .list_users(None)
        .await?
        .into_iter()
        .map(|u| {
            let name = u.display_name().to_string();
            (u.id, name)
        })
        .collect())
}

/// Export every non-deleted complaint the session can see.
pub async fn export_complaints(store: &dyn DeskStorage, session: &Session) -> Result<String> {
    let complaints = desk::visible_complaints(store, session).await?;
    let names = display_names(store).await?;
    Ok(complaints_csv(&complaints, &names))
}

/// Export the whole activity log, newest first.
///
/// # Errors
///
/// Returns `PermissionDenied` for students and technicians.
pub async fn export_activity(store: &dyn DeskStorage, session: &Session) -> Result<String> {
    session.require(&[Role::Admin, Role::Supervisor], "export the activity log")?;

    let entries = store.all_activity().await?;
    let titles: HashMap<ComplaintId, String> = store
        .export_all()
        .await?
        .complaints
        .into_iter()
        .map(|c| (c.id, c.title))
        .collect();
    let names = display_names(store).await?;
    Ok(activity_csv(&entries, &titles, &names))
}
