//! Assignment, status transitions and soft deletion.

use super::{ActionOutcome, fetch_complaint, fetch_live_complaint, fetch_user};
use crate::config::TenantSettings;
use crate::domain::{
    Complaint, ComplaintFilter, ComplaintId, ComplaintPatch, ComplaintStatus, NewActivity,
    NewNotification, NotificationKind, Role, Session, UserId, UserProfile,
};
use crate::effects::{Effect, EffectPlan};
use crate::error::{Error, Result};
use crate::policy::{TechnicianLoad, assignment};
use crate::storage::DeskStorage;
use serde::Serialize;
use tracing::{debug, info};

/// Result of assigning a complaint
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    /// The technician who received the complaint
    pub technician: UserProfile,

    /// Their active count before this assignment
    pub previous_load: usize,

    /// The updated complaint and step report
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

/// Active complaint counts per technician, from a fresh snapshot.
async fn current_counts(
    store: &dyn DeskStorage,
) -> Result<std::collections::HashMap<UserId, usize>> {
    let complaints = store.list_complaints(&ComplaintFilter::default()).await?;
    Ok(assignment::active_counts(&complaints))
}

/// Technicians ranked least-loaded first.
async fn ranked_technicians(store: &dyn DeskStorage) -> Result<Vec<TechnicianLoad>> {
    let technicians = store.list_users(Some(Role::Technician)).await?;
    let counts = current_counts(store).await?;
    Ok(assignment::rank(technicians, &counts))
}

/// The technician an admin should pick next, if anyone is below the cap.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the session is an admin.
pub async fn suggest_technician(
    store: &dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
) -> Result<Option<TechnicianLoad>> {
    session.require(&[Role::Admin], "assign complaints")?;
    let ranked = ranked_technicians(store).await?;
    Ok(settings.assignment_policy().suggest(&ranked).cloned())
}

/// Assign a complaint to a technician and move it to in progress.
///
/// The technician's load is recounted from the store immediately before the
/// write. The complaint being assigned is left out of the count, so
/// re-assigning to the current technician never trips the cap.
///
/// # Errors
///
/// Validation errors leave the store untouched:
/// - `PermissionDenied` unless the session is an admin
/// - `ComplaintNotFound` / `ComplaintDeleted` for a missing or deleted complaint
/// - `Validation` if the complaint is already resolved
/// - `UserNotFound` / `NotATechnician` for a bad assignee
/// - `TechnicianAtCapacity` if the technician is at the cap
pub async fn assign(
    store: &mut dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    complaint_id: &ComplaintId,
    technician_id: &UserId,
) -> Result<AssignmentOutcome> {
    session.require(&[Role::Admin], "assign complaints")?;

    let complaint = fetch_live_complaint(store, complaint_id).await?;
    if complaint.status == ComplaintStatus::Resolved {
        return Err(Error::Validation(format!(
            "Complaint {complaint_id} is already resolved"
        )));
    }

    let technician = fetch_user(store, technician_id).await?;
    if technician.role != Role::Technician {
        return Err(Error::NotATechnician(technician_id.clone()));
    }

    let policy = settings.assignment_policy();
    let complaints = store.list_complaints(&ComplaintFilter::default()).await?;
    let active = assignment::active_counts(complaints.iter().filter(|c| c.id != complaint.id))
        .get(technician_id)
        .copied()
        .unwrap_or(0);
    if !policy.admits(active) {
        return Err(Error::TechnicianAtCapacity {
            technician: technician.display_name().to_string(),
            active,
            max_load: policy.max_load,
        });
    }

    let report = assignment_plan(&complaint, &technician, session)
        .run(store, settings.side_effects)
        .await?;
    info!(complaint = %complaint_id, technician = %technician_id, "Complaint assigned");

    Ok(AssignmentOutcome {
        technician,
        previous_load: active,
        outcome: ActionOutcome::from_report(report)?,
    })
}

fn assignment_plan(complaint: &Complaint, technician: &UserProfile, session: &Session) -> EffectPlan {
    let name = technician.display_name();

    let notify_reporter = complaint.created_by.as_ref().map(|reporter| {
        Effect::Notify(NewNotification {
            user_id: reporter.clone(),
            title: "Complaint Assigned".to_string(),
            message: format!(
                "Your complaint \"{}\" has been assigned to {name}",
                complaint.title
            ),
            kind: NotificationKind::Assignment,
            complaint_id: Some(complaint.id.clone()),
        })
    });

    EffectPlan::new(Effect::UpdateComplaint {
        id: complaint.id.clone(),
        patch: ComplaintPatch {
            assigned_to: Some(Some(technician.id.clone())),
            status: Some(ComplaintStatus::InProgress),
            ..ComplaintPatch::default()
        },
    })
    .then(Effect::AppendActivity(NewActivity::new(
        complaint.id.clone(),
        "Assigned to technician",
        format!("Assigned to {name}"),
        session.user_id().clone(),
    )))
    .then(Effect::Notify(NewNotification {
        user_id: technician.id.clone(),
        title: "New Assignment".to_string(),
        message: format!(
            "You have been assigned \"{}\" ({} priority)",
            complaint.title, complaint.priority
        ),
        kind: NotificationKind::Assignment,
        complaint_id: Some(complaint.id.clone()),
    }))
    .then_some(notify_reporter)
}

/// Assign a complaint to the least-loaded technician below the cap.
///
/// # Errors
///
/// Returns `NoTechnicianAvailable` when every technician is at the cap, plus
/// every error [`assign`] can return.
pub async fn auto_assign(
    store: &mut dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    complaint_id: &ComplaintId,
) -> Result<AssignmentOutcome> {
    let Some(suggestion) = suggest_technician(store, settings, session).await? else {
        return Err(Error::NoTechnicianAvailable {
            max_load: settings.max_load,
        });
    };
    debug!(
        technician = %suggestion.technician.id,
        active = suggestion.active_count,
        "Auto-assigning to least-loaded technician"
    );
    assign(store, settings, session, complaint_id, &suggestion.technician.id).await
}

/// Move a complaint forward in its lifecycle.
///
/// Only the assigned technician may change the status, and only forward
/// (open → in progress → resolved, or open → resolved directly). Only
/// resolving notifies the reporter; it also stamps `resolved_at`.
///
/// # Errors
///
/// - `PermissionDenied` unless the session is the assigned technician
/// - `ComplaintNotFound` / `ComplaintDeleted`
/// - `InvalidTransition` for a backward, repeated or post-resolution move
pub async fn update_status(
    store: &mut dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    complaint_id: &ComplaintId,
    new_status: ComplaintStatus,
) -> Result<ActionOutcome> {
    session.require(&[Role::Technician], "update complaint status")?;

    let complaint = fetch_live_complaint(store, complaint_id).await?;
    if complaint.assigned_to.as_ref() != Some(session.user_id()) {
        return Err(Error::PermissionDenied {
            role: session.role(),
            action: "update a complaint assigned to someone else",
        });
    }
    if !complaint.status.can_advance_to(new_status) {
        return Err(Error::InvalidTransition {
            from: complaint.status,
            to: new_status,
        });
    }

    let notify_reporter = complaint
        .created_by
        .as_ref()
        .filter(|_| new_status == ComplaintStatus::Resolved)
        .map(|reporter| {
            Effect::Notify(NewNotification {
                user_id: reporter.clone(),
                title: "Complaint Resolved".to_string(),
                message: format!("Your complaint \"{}\" has been resolved", complaint.title),
                kind: NotificationKind::Resolution,
                complaint_id: Some(complaint.id.clone()),
            })
        });

    let report = EffectPlan::new(Effect::UpdateComplaint {
        id: complaint.id.clone(),
        patch: ComplaintPatch {
            status: Some(new_status),
            ..ComplaintPatch::default()
        },
    })
    .then(Effect::AppendActivity(NewActivity::new(
        complaint.id.clone(),
        "Status updated",
        format!(
            "Status changed from {} to {}",
            complaint.status.label(),
            new_status.label()
        ),
        session.user_id().clone(),
    )))
    .then_some(notify_reporter)
    .run(store, settings.side_effects)
    .await?;

    info!(complaint = %complaint_id, from = %complaint.status, to = %new_status, "Status updated");
    ActionOutcome::from_report(report)
}

/// Hide a complaint from listings and workload counts.
///
/// Activity entries and notifications referring to it are kept.
///
/// # Errors
///
/// - `PermissionDenied` unless the session is an admin
/// - `ComplaintNotFound`
/// - `ComplaintDeleted` if it is already deleted
pub async fn soft_delete(
    store: &mut dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    complaint_id: &ComplaintId,
) -> Result<ActionOutcome> {
    session.require(&[Role::Admin], "delete complaints")?;
    let complaint = fetch_live_complaint(store, complaint_id).await?;

    let report = EffectPlan::new(Effect::UpdateComplaint {
        id: complaint.id.clone(),
        patch: ComplaintPatch {
            deleted: Some(true),
            ..ComplaintPatch::default()
        },
    })
    .then(Effect::AppendActivity(NewActivity::new(
        complaint.id.clone(),
        "Complaint deleted",
        format!("\"{}\" moved to trash", complaint.title),
        session.user_id().clone(),
    )))
    .run(store, settings.side_effects)
    .await?;

    info!(complaint = %complaint_id, "Complaint soft-deleted");
    ActionOutcome::from_report(report)
}

/// Bring a soft-deleted complaint back.
///
/// # Errors
///
/// - `PermissionDenied` unless the session is an admin
/// - `ComplaintNotFound`
/// - `Validation` if the complaint is not deleted
pub async fn restore(
    store: &mut dyn DeskStorage,
    settings: &TenantSettings,
    session: &Session,
    complaint_id: &ComplaintId,
) -> Result<ActionOutcome> {
    session.require(&[Role::Admin], "restore complaints")?;
    let complaint = fetch_complaint(store, complaint_id).await?;
    if !complaint.is_deleted {
        return Err(Error::Validation(format!(
            "Complaint {complaint_id} is not deleted"
        )));
    }

    let report = EffectPlan::new(Effect::UpdateComplaint {
        id: complaint.id.clone(),
        patch: ComplaintPatch {
            deleted: Some(false),
            ..ComplaintPatch::default()
        },
    })
    .then(Effect::AppendActivity(NewActivity::new(
        complaint.id.clone(),
        "Complaint restored",
        format!("\"{}\" restored from trash", complaint.title),
        session.user_id().clone(),
    )))
    .run(store, settings.side_effects)
    .await?;

    info!(complaint = %complaint_id, "Complaint restored");
    ActionOutcome::from_report(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::fixtures::{self, Cast};
    use crate::desk::{file_complaint, notifications};
    use crate::effects::{EffectMode, StepOutcome};
    use crate::storage::in_memory::new_in_memory_storage;
    use crate::storage::{FaultPoint, FaultyStorage};

    async fn filed(store: &mut dyn DeskStorage, cast: &Cast, title: &str) -> ComplaintId {
        file_complaint(store, &fixtures::settings(), &cast.student, fixtures::complaint(title))
            .await
            .unwrap()
            .complaint
            .id
    }

    #[tokio::test]
    async fn test_assign_updates_logs_and_notifies() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let id = filed(store.as_mut(), &cast, "Sparking socket").await;

        let outcome = assign(
            store.as_mut(),
            &fixtures::settings(),
            &cast.admin,
            &id,
            cast.tech_a.user_id(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.previous_load, 0);
        assert_eq!(outcome.outcome.complaint.status, ComplaintStatus::InProgress);
        assert!(!outcome.outcome.has_failures());

        let activity = store.activity_for(&id).await.unwrap();
        assert_eq!(activity.last().unwrap().action, "Assigned to technician");
        assert_eq!(activity.last().unwrap().details.as_deref(), Some("Assigned to Tia Tech"));

        let tech_inbox = notifications(store.as_ref(), &cast.tech_a, None).await.unwrap();
        assert_eq!(tech_inbox[0].title, "New Assignment");
        let student_inbox = notifications(store.as_ref(), &cast.student, None).await.unwrap();
        assert_eq!(student_inbox[0].title, "Complaint Assigned");
    }

    #[tokio::test]
    async fn test_only_admins_assign() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let id = filed(store.as_mut(), &cast, "Dim lights").await;

        let err = assign(
            store.as_mut(),
            &fixtures::settings(),
            &cast.tech_a,
            &id,
            cast.tech_a.user_id(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { role: Role::Technician, .. }));
    }

    #[tokio::test]
    async fn test_assign_to_student_rejected() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let id = filed(store.as_mut(), &cast, "Dim lights").await;

        let err = assign(
            store.as_mut(),
            &fixtures::settings(),
            &cast.admin,
            &id,
            cast.student.user_id(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotATechnician(_)));
    }

    #[tokio::test]
    async fn test_reassigning_same_technician_at_cap_is_allowed() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let mut settings = fixtures::settings();
        settings.max_load = 1;
        let id = filed(store.as_mut(), &cast, "Broken switch").await;

        assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap();
        let again = assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap();
        assert_eq!(again.previous_load, 0);

        let other = filed(store.as_mut(), &cast, "Second switch").await;
        let err = assign(store.as_mut(), &settings, &cast.admin, &other, cast.tech_a.user_id())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TechnicianAtCapacity { active: 1, max_load: 1, .. }));
    }

    #[tokio::test]
    async fn test_auto_assign_picks_least_loaded() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let settings = fixtures::settings();

        let first = filed(store.as_mut(), &cast, "One").await;
        assign(store.as_mut(), &settings, &cast.admin, &first, cast.tech_a.user_id())
            .await
            .unwrap();

        let second = filed(store.as_mut(), &cast, "Two").await;
        let outcome = auto_assign(store.as_mut(), &settings, &cast.admin, &second)
            .await
            .unwrap();
        assert_eq!(&outcome.technician.id, cast.tech_b.user_id());
    }

    #[tokio::test]
    async fn test_auto_assign_with_everyone_at_cap() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let mut settings = fixtures::settings();
        settings.max_load = 1;

        for (title, tech) in [("One", &cast.tech_a), ("Two", &cast.tech_b)] {
            let id = filed(store.as_mut(), &cast, title).await;
            assign(store.as_mut(), &settings, &cast.admin, &id, tech.user_id())
                .await
                .unwrap();
        }

        let third = filed(store.as_mut(), &cast, "Three").await;
        let err = auto_assign(store.as_mut(), &settings, &cast.admin, &third)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoTechnicianAvailable { max_load: 1 }));
    }

    #[tokio::test]
    async fn test_status_requires_the_assignee() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let settings = fixtures::settings();
        let id = filed(store.as_mut(), &cast, "Flicker").await;
        assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap();

        let err = update_status(store.as_mut(), &settings, &cast.tech_b, &id, ComplaintStatus::Resolved)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));

        let resolved =
            update_status(store.as_mut(), &settings, &cast.tech_a, &id, ComplaintStatus::Resolved)
                .await
                .unwrap();
        assert!(resolved.complaint.resolved_at.is_some());

        let err = update_status(
            store.as_mut(),
            &settings,
            &cast.tech_a,
            &id,
            ComplaintStatus::InProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: ComplaintStatus::Resolved,
                to: ComplaintStatus::InProgress
            }
        ));

        let inbox = notifications(store.as_ref(), &cast.student, None).await.unwrap();
        assert_eq!(inbox[0].title, "Complaint Resolved");
        assert_eq!(inbox[0].kind, NotificationKind::Resolution);
    }

    #[tokio::test]
    async fn test_starting_work_sends_no_notification() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let settings = fixtures::settings();
        let id = filed(store.as_mut(), &cast, "Loose socket").await;
        assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap();
        store
            .update_complaint(
                &id,
                ComplaintPatch {
                    status: Some(ComplaintStatus::Open),
                    ..ComplaintPatch::default()
                },
            )
            .await
            .unwrap();

        let outcome =
            update_status(store.as_mut(), &settings, &cast.tech_a, &id, ComplaintStatus::InProgress)
                .await
                .unwrap();

        assert_eq!(outcome.steps.len(), 2);
        let inbox = notifications(store.as_ref(), &cast.student, None).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].title, "Complaint Assigned");
        assert_eq!(store.activity_for(&id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_resolved_complaint_cannot_be_assigned() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let settings = fixtures::settings();
        let id = filed(store.as_mut(), &cast, "Fan").await;
        assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap();
        update_status(store.as_mut(), &settings, &cast.tech_a, &id, ComplaintStatus::Resolved)
            .await
            .unwrap();

        let err = assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_b.user_id())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_deleted_complaint_rejects_workflow() {
        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let settings = fixtures::settings();
        let id = filed(store.as_mut(), &cast, "Socket").await;

        soft_delete(store.as_mut(), &settings, &cast.admin, &id).await.unwrap();

        let err = assign(store.as_mut(), &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ComplaintDeleted(_)));
        let err = soft_delete(store.as_mut(), &settings, &cast.admin, &id).await.unwrap_err();
        assert!(matches!(err, Error::ComplaintDeleted(_)));

        let restored = restore(store.as_mut(), &settings, &cast.admin, &id).await.unwrap();
        assert!(!restored.complaint.is_deleted);
        let err = restore(store.as_mut(), &settings, &cast.admin, &id).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let actions: Vec<String> = store
            .activity_for(&id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, ["Complaint created", "Complaint deleted", "Complaint restored"]);
    }

    #[tokio::test]
    async fn test_best_effort_assignment_survives_notification_failure() {
        let mut store = FaultyStorage::new(new_in_memory_storage("desk".to_string()));
        let cast = fixtures::cast(&mut store).await;
        let id = filed(&mut store, &cast, "Water heater").await;
        store.fail(FaultPoint::InsertNotification);

        let outcome = assign(
            &mut store,
            &fixtures::settings(),
            &cast.admin,
            &id,
            cast.tech_a.user_id(),
        )
        .await
        .unwrap();

        assert!(outcome.outcome.has_failures());
        let failed = outcome
            .outcome
            .steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Failed(_)))
            .count();
        assert_eq!(failed, 2);

        let stored = store.get_complaint(&id).await.unwrap().unwrap();
        assert_eq!(stored.assigned_to.as_ref(), Some(cast.tech_a.user_id()));
        assert_eq!(store.activity_for(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_strict_assignment_reports_first_failure() {
        let mut store = FaultyStorage::new(new_in_memory_storage("desk".to_string()));
        let cast = fixtures::cast(&mut store).await;
        let id = filed(&mut store, &cast, "Water heater").await;
        let mut settings = fixtures::settings();
        settings.side_effects = EffectMode::Strict;
        store.fail(FaultPoint::AppendActivity);

        let err = assign(&mut store, &settings, &cast.admin, &id, cast.tech_a.user_id())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SideEffectFailed { .. }));

        // primary write is not rolled back, later steps never ran
        let stored = store.get_complaint(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, ComplaintStatus::InProgress);
        assert!(store.notifications_for(cast.tech_a.user_id(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_primary_write_changes_nothing() {
        let mut store = FaultyStorage::new(new_in_memory_storage("desk".to_string()));
        let cast = fixtures::cast(&mut store).await;
        let id = filed(&mut store, &cast, "Water heater").await;
        store.fail(FaultPoint::UpdateComplaint);

        let err = assign(
            &mut store,
            &fixtures::settings(),
            &cast.admin,
            &id,
            cast.tech_a.user_id(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(store.activity_for(&id).await.unwrap().len(), 1);
        assert!(store.notifications_for(cast.tech_a.user_id(), None).await.unwrap().is_empty());
    }
}
