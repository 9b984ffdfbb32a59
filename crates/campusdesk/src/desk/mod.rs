//! Desk operations: the authorized workflows on top of the store.
//!
//! Every operation takes the acting [`Session`] explicitly, checks the
//! session's role, validates its input against current store state, and only
//! then writes. Validation failures never touch the store.
//!
//! Operations that change a complaint run an [`EffectPlan`]: the complaint
//! update is the primary write, and activity entries and notifications are
//! side effects handled according to [`TenantSettings::side_effects`].
//!
//! [`EffectPlan`]: crate::effects::EffectPlan
//! [`TenantSettings::side_effects`]: crate::config::TenantSettings::side_effects

mod complaints;
mod inbox;
mod settings;
mod team;
mod workflow;

pub use complaints::{
    ComplaintDetail, ListOptions, TimelineEntry, complaint_detail, file_complaint,
    list_complaints, visible_complaints,
};
pub use inbox::{
    DEFAULT_NOTIFICATION_LIMIT, mark_all_read, mark_read, notifications, unread_count,
};
pub use settings::{add_category, remove_category, set_max_load, set_sla_hours};
pub use team::{TenantTotals, register_user, team, tenant_totals, workload};
pub use workflow::{
    AssignmentOutcome, assign, auto_assign, restore, soft_delete, suggest_technician,
    update_status,
};

use crate::domain::{Complaint, ComplaintId, Session, UserId, UserProfile};
use crate::effects::{EffectReport, StepReport};
use crate::error::{Error, Result, StorageError};
use crate::storage::DeskStorage;
use serde::Serialize;

/// A complaint after a successful operation, with the side-effect report
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    /// The complaint as stored after the primary write
    pub complaint: Complaint,

    /// Outcome of every step, primary write first
    pub steps: Vec<StepReport>,
}

impl ActionOutcome {
    fn from_report(report: EffectReport) -> Result<Self> {
        let EffectReport { complaint, steps } = report;
        let complaint = complaint.ok_or_else(|| {
            StorageError::Backend("primary write returned no complaint".to_string())
        })?;
        Ok(Self { complaint, steps })
    }

    /// Whether any side effect failed
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.outcome, crate::effects::StepOutcome::Failed(_)))
    }
}

/// Fetch a complaint or fail with `ComplaintNotFound`.
async fn fetch_complaint(store: &dyn DeskStorage, id: &ComplaintId) -> Result<Complaint> {
    store
        .get_complaint(id)
        .await?
        .ok_or_else(|| Error::ComplaintNotFound(id.clone()))
}

/// Fetch a complaint that has not been soft-deleted.
async fn fetch_live_complaint(store: &dyn DeskStorage, id: &ComplaintId) -> Result<Complaint> {
    let complaint = fetch_complaint(store, id).await?;
    if complaint.is_deleted {
        return Err(Error::ComplaintDeleted(id.clone()));
    }
    Ok(complaint)
}

/// Fetch a user or fail with `UserNotFound`.
async fn fetch_user(store: &dyn DeskStorage, id: &UserId) -> Result<UserProfile> {
    store
        .get_user(id)
        .await?
        .ok_or_else(|| Error::UserNotFound(id.clone()))
}

/// Display name for a user ID, falling back to the raw ID for unknown users.
async fn display_name(store: &dyn DeskStorage, id: &UserId) -> Result<String> {
    Ok(store
        .get_user(id)
        .await?
        .map_or_else(|| id.to_string(), |u| u.display_name().to_string()))
}

/// Whether the session may see `complaint` at all.
fn can_view(session: &Session, complaint: &Complaint) -> bool {
    use crate::domain::Role;

    match session.role() {
        Role::Admin | Role::Supervisor => true,
        Role::Technician => complaint.assigned_to.as_ref() == Some(session.user_id()),
        Role::Student => complaint.created_by.as_ref() == Some(session.user_id()),
    }
}
