//! Filing, listing and inspecting complaints.

use super::{ActionOutcome, can_view, display_name, fetch_complaint};
use crate::config::TenantSettings;
use crate::domain::{
    ActivityLogEntry, Complaint, ComplaintFilter, ComplaintId, ComplaintStatus, DeletedFilter,
    NewActivity, NewComplaint, Priority, Role, Session,
};
use crate::effects::{Effect, EffectPlan, StepOutcome, StepReport};
use crate::error::{Error, Result};
use crate::policy::{SlaStatus, sla};
use crate::storage::DeskStorage;
use serde::Serialize;
use tracing::debug;

/// File a new complaint as the session's student.
///
/// The category must match one of the tenant's categories
/// (case-insensitively). Logs a "Complaint created" activity entry.
///
/// # Errors
///
/// - `PermissionDenied` unless the session is a student
/// - `Validation` for a bad title, description or unknown category
pub async fn file_complaint(
    store: &mut dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    mut complaint: NewComplaint,
) -> Result<ActionOutcome> {
    session.require(&[Role::Student], "file complaints")?;
    complaint.validate().map_err(Error::Validation)?;

    let Some(category) = settings.find_category(&complaint.category) else {
        return Err(Error::Validation(format!(
            "Unknown category '{}'. Valid categories: {}",
            complaint.category.trim(),
            settings.categories.join(", ")
        )));
    };
    complaint.category = category.to_string();
    complaint.created_by = Some(session.user_id().clone());

    let created = store.create_complaint(complaint).await?;
    debug!(id = %created.id, "Complaint filed");

    let report = EffectPlan::side_effects()
        .then(Effect::AppendActivity(NewActivity::new(
            created.id.clone(),
            "Complaint created",
            format!(
                "Priority: {}, Category: {}",
                created.priority, created.category
            ),
            session.user_id().clone(),
        )))
        .run(store, settings.side_effects)
        .await?;

    let mut steps = vec![StepReport {
        step: format!("file complaint {}", created.id),
        outcome: StepOutcome::Applied,
    }];
    steps.extend(report.steps);

    Ok(ActionOutcome {
        complaint: created,
        steps,
    })
}

/// Listing criteria beyond the session's own scope
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only complaints with this status
    pub status: Option<ComplaintStatus>,

    /// Only complaints with this priority
    pub priority: Option<Priority>,

    /// Only complaints in this category
    pub category: Option<String>,

    /// Case-insensitive text search over title and description
    pub search: Option<String>,

    /// Include soft-deleted complaints (admins only)
    pub include_deleted: bool,

    /// Show only soft-deleted complaints (admins only)
    pub only_deleted: bool,

    /// Maximum number of results
    pub limit: Option<usize>,
}

/// Scope a filter to what the session may see.
fn scoped_filter(session: &Session, mut filter: ComplaintFilter) -> ComplaintFilter {
    match session.role() {
        Role::Student => filter.created_by = Some(session.user_id().clone()),
        Role::Technician => filter.assigned_to = Some(session.user_id().clone()),
        Role::Admin | Role::Supervisor => {}
    }
    filter
}

/// List complaints visible to the session, newest first.
///
/// Students see complaints they filed, technicians see complaints assigned to
/// them, admins and supervisors see everything.
///
/// # Errors
///
/// Returns `PermissionDenied` when a non-admin asks for deleted complaints.
pub async fn list_complaints(
    store: &dyn DeskStorage,
    session: &Session,
    options: ListOptions,
) -> Result<Vec<Complaint>> {
    let deleted = match (options.only_deleted, options.include_deleted) {
        (true, _) => DeletedFilter::Only,
        (false, true) => DeletedFilter::Include,
        (false, false) => DeletedFilter::Exclude,
    };
    if deleted != DeletedFilter::Exclude {
        session.require(&[Role::Admin], "view deleted complaints")?;
    }

    let filter = scoped_filter(
        session,
        ComplaintFilter {
            status: options.status,
            priority: options.priority,
            category: options.category,
            search: options.search,
            deleted,
            limit: options.limit,
            ..ComplaintFilter::default()
        },
    );
    store.list_complaints(&filter).await
}

/// Every non-deleted complaint the session may see, newest first.
pub async fn visible_complaints(
    store: &dyn DeskStorage,
    session: &Session,
) -> Result<Vec<Complaint>> {
    store
        .list_complaints(&scoped_filter(session, ComplaintFilter::default()))
        .await
}

/// One activity entry with its performer's display name
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    /// The stored entry
    #[serde(flatten)]
    pub entry: ActivityLogEntry,

    /// Display name of whoever performed it
    pub performed_by_name: String,
}

/// Everything shown for a single complaint
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintDetail {
    /// The complaint
    pub complaint: Complaint,

    /// SLA evaluated at the time of the query
    pub sla: SlaStatus,

    /// Reporter's display name
    pub reporter_name: Option<String>,

    /// Assignee's display name
    pub assignee_name: Option<String>,

    /// Activity, oldest first
    pub timeline: Vec<TimelineEntry>,
}

/// Load a complaint with its SLA, people and activity timeline.
///
/// # Errors
///
/// - `ComplaintNotFound` if the ID is unknown, or the complaint is deleted
///   and the session is not an admin
/// - `PermissionDenied` if the complaint is outside the session's scope
pub async fn complaint_detail(
    store: &dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    id: &ComplaintId,
) -> Result<ComplaintDetail> {
    let complaint = fetch_complaint(store, id).await?;
    if complaint.is_deleted && session.role() != Role::Admin {
        return Err(Error::ComplaintNotFound(id.clone()));
    }
    if !can_view(session, &complaint) {
        return Err(Error::PermissionDenied {
            role: session.role(),
            action: "view this complaint",
        });
    }

    let sla = sla::evaluate_now(
        complaint.created_at,
        complaint.priority,
        complaint.status,
        &settings.sla_hours,
    );

    let reporter_name = match &complaint.created_by {
        Some(id) => Some(display_name(store, id).await?),
        None => None,
    };
    let assignee_name = match &complaint.assigned_to {
        Some(id) => Some(display_name(store, id).await?),
        None => None,
    };

    let mut timeline = Vec::new();
    for entry in store.activity_for(id).await? {
        let performed_by_name = display_name(store, &entry.performed_by).await?;
        timeline.push(TimelineEntry {
            entry,
            performed_by_name,
        });
    }

    Ok(ComplaintDetail {
        complaint,
        sla,
        reporter_name,
        assignee_name,
        timeline,
    })
}
