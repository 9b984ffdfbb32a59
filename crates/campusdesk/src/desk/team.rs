//! Team roster and technician workload.

use crate::domain::{ComplaintFilter, NewUser, Role, Session, UserProfile};
use crate::error::{Error, Result};
use crate::policy::{TechnicianLoad, assignment};
use crate::storage::DeskStorage;
use serde::Serialize;
use tracing::info;

/// Headline counts for the tenant overview
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TenantTotals {
    /// Registered users of every role
    pub users: usize,

    /// Complaints that are not soft-deleted
    pub complaints: usize,

    /// Registered technicians
    pub technicians: usize,
}

/// Register a user.
///
/// Once any admin exists only admins may register users. Before that, the
/// very first registration may bootstrap the tenant, but only as an admin.
/// `session` is `None` for that bootstrap call.
///
/// # Errors
///
/// - `PermissionDenied` if the acting user is not an admin
/// - `Validation` when bootstrapping with a non-admin role or without a
///   session after an admin exists
/// - `StorageError::Duplicate` for a taken ID or email
pub async fn register_user(
    store: &mut dyn DeskStorage,
    session: Option<&Session>,
    user: NewUser,
) -> Result<UserProfile> {
    let admins = store.list_users(Some(Role::Admin)).await?;

    match session {
        Some(session) => session.require(&[Role::Admin], "register users")?,
        None if !admins.is_empty() => {
            return Err(Error::Validation(
                "An admin already exists; register users as that admin (--as)".to_string(),
            ));
        }
        None if user.role != Role::Admin => {
            return Err(Error::Validation(
                "The first user must be an admin".to_string(),
            ));
        }
        None => {}
    }

    let created = store.create_user(user).await?;
    info!(user = %created.id, role = %created.role, "User registered");
    Ok(created)
}

/// Everyone in the tenant, ordered by role then registration time.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the session is an admin.
pub async fn team(store: &dyn DeskStorage, session: &Session) -> Result<Vec<UserProfile>> {
    session.require(&[Role::Admin], "view the team")?;
    store.list_users(None).await
}

/// User, complaint and technician counts for the settings overview.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the session is an admin.
pub async fn tenant_totals(store: &dyn DeskStorage, session: &Session) -> Result<TenantTotals> {
    session.require(&[Role::Admin], "view tenant totals")?;

    let users = store.list_users(None).await?;
    let complaints = store.list_complaints(&ComplaintFilter::default()).await?;
    Ok(TenantTotals {
        users: users.len(),
        complaints: complaints.len(),
        technicians: users.iter().filter(|u| u.role == Role::Technician).count(),
    })
}

/// Every technician with their active complaint count, busiest first.
///
/// # Errors
///
/// Returns `PermissionDenied` for students and technicians.
pub async fn workload(store: &dyn DeskStorage, session: &Session) -> Result<Vec<TechnicianLoad>> {
    session.require(&[Role::Admin, Role::Supervisor], "view technician workload")?;

    let technicians = store.list_users(Some(Role::Technician)).await?;
    let complaints = store.list_complaints(&ComplaintFilter::default()).await?;
    let counts = assignment::active_counts(&complaints);
    Ok(assignment::busiest_first(technicians, &counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::storage::in_memory::new_in_memory_storage;

    fn new_user(id: &str, role: Role) -> NewUser {
        NewUser {
            id: Some(UserId::new(id)),
            full_name: None,
            email: format!("{id}@campus.edu"),
            role,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_requires_admin_role() {
        let mut store = new_in_memory_storage("desk".to_string());

        let err = register_user(store.as_mut(), None, new_user("sam", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let admin = register_user(store.as_mut(), None, new_user("ada", Role::Admin))
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);

        let err = register_user(store.as_mut(), None, new_user("eve", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_only_admins_register_after_bootstrap() {
        let mut store = new_in_memory_storage("desk".to_string());
        let admin = Session::new(
            register_user(store.as_mut(), None, new_user("ada", Role::Admin))
                .await
                .unwrap(),
        );
        let student = Session::new(
            register_user(store.as_mut(), Some(&admin), new_user("sam", Role::Student))
                .await
                .unwrap(),
        );

        let err = register_user(store.as_mut(), Some(&student), new_user("ola", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_team_and_workload_visibility() {
        let mut store = new_in_memory_storage("desk".to_string());
        let admin = Session::new(
            register_user(store.as_mut(), None, new_user("ada", Role::Admin))
                .await
                .unwrap(),
        );
        for (id, role) in [("tia", Role::Technician), ("sam", Role::Student), ("sue", Role::Supervisor)] {
            register_user(store.as_mut(), Some(&admin), new_user(id, role))
                .await
                .unwrap();
        }

        let roster = team(store.as_ref(), &admin).await.unwrap();
        let roles: Vec<Role> = roster.iter().map(|u| u.role).collect();
        assert_eq!(
            roles,
            [Role::Admin, Role::Supervisor, Role::Technician, Role::Student]
        );

        let loads = workload(store.as_ref(), &admin).await.unwrap();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].active_count, 0);

        let student = Session::new(store.get_user(&UserId::new("sam")).await.unwrap().unwrap());
        assert!(workload(store.as_ref(), &student).await.is_err());
        assert!(team(store.as_ref(), &student).await.is_err());

        let supervisor = Session::new(store.get_user(&UserId::new("sue")).await.unwrap().unwrap());
        assert!(workload(store.as_ref(), &supervisor).await.is_ok());
        assert!(matches!(
            team(store.as_ref(), &supervisor).await,
            Err(Error::PermissionDenied { role: Role::Supervisor, .. })
        ));
    }

    #[tokio::test]
    async fn test_tenant_totals_skip_deleted_complaints() {
        use crate::desk::{file_complaint, fixtures, soft_delete};

        let mut store = new_in_memory_storage("desk".to_string());
        let cast = fixtures::cast(store.as_mut()).await;
        let settings = fixtures::settings();
        let mut filed = Vec::new();
        for title in ["Dim lamp", "Dead socket"] {
            let outcome = file_complaint(store.as_mut(), &settings, &cast.student, fixtures::complaint(title))
                .await
                .unwrap();
            filed.push(outcome.complaint.id);
        }
        soft_delete(store.as_mut(), &settings, &cast.admin, &filed[0])
            .await
            .unwrap();

        let totals = tenant_totals(store.as_ref(), &cast.admin).await.unwrap();
        assert_eq!(
            totals,
            TenantTotals {
                users: 4,
                complaints: 1,
                technicians: 2,
            }
        );
        assert!(tenant_totals(store.as_ref(), &cast.student).await.is_err());
    }
}
