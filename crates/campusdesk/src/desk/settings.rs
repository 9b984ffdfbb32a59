//! Admin-only changes to tenant settings.
//!
//! These functions only mutate the in-memory [`TenantSettings`]; the caller
//! persists the config file afterwards.

use crate::config::TenantSettings;
use crate::domain::{Priority, Role, Session};
use crate::error::Result;
use tracing::info;

/// Change the SLA deadline for one priority.
///
/// # Errors
///
/// `PermissionDenied` for non-admins, `Validation` for zero hours.
pub fn set_sla_hours(
    settings: &mut TenantSettings,
    session: &Session,
    priority: Priority,
    hours: u32,
) -> Result<()> {
    session.require(&[Role::Admin], "change SLA settings")?;
    settings.set_sla_hours(priority, hours)?;
    info!(%priority, hours, "SLA hours updated");
    Ok(())
}

/// Add a complaint category. Returns `false` if it already existed.
///
/// # Errors
///
/// `PermissionDenied` for non-admins, `Validation` for a blank name.
pub fn add_category(settings: &mut TenantSettings, session: &Session, name: &str) -> Result<bool> {
    session.require(&[Role::Admin], "change categories")?;
    settings.add_category(name)
}

/// Remove a complaint category, returning its stored spelling.
///
/// # Errors
///
/// `PermissionDenied` for non-admins, `Validation` for an unknown or last category.
pub fn remove_category(
    settings: &mut TenantSettings,
    session: &Session,
    name: &str,
) -> Result<String> {
    session.require(&[Role::Admin], "change categories")?;
    settings.remove_category(name)
}

/// Change the technician caseload cap.
///
/// Lowering the cap does not unassign anything; over-cap technicians simply
/// receive no new work.
///
/// # Errors
///
/// `PermissionDenied` for non-admins, `Validation` for zero.
pub fn set_max_load(settings: &mut TenantSettings, session: &Session, max_load: usize) -> Result<()> {
    session.require(&[Role::Admin], "change the technician load limit")?;
    settings.set_max_load(max_load)?;
    info!(max_load, "Technician load limit updated");
    Ok(())
}
