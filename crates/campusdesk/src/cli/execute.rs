//! Command execution logic.
//!
//! Each function runs one subcommand against an opened [`App`], persists the
//! store when it changed something, and prints the result.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::args::{
    AssignArgs, ComplaintArgs, ExportArgs, ExportTarget, FileArgs, InitArgs, ListArgs,
    NotificationAction, SettingsAction, StatsArgs, StatusArgs, UserAction, UserAddArgs,
};
use crate::analytics;
use crate::app::App;
use crate::commands::init::DeskConfig;
use crate::desk::{self, ListOptions, TenantTotals};
use crate::domain::{ComplaintId, NewComplaint, NewUser, Role, Session, UserId};
use crate::export;
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.tenant.as_deref(), args.prefix.as_deref()).await?;

    if output_mode == OutputMode::Json {
        output::print_json(&serde_json::json!({
            "desk_dir": result.desk_dir.display().to_string(),
            "config_file": result.config_file.display().to_string(),
            "data_file": result.data_file.display().to_string(),
            "tenant": result.tenant,
            "prefix": result.prefix,
        }))?;
    } else if !args.quiet {
        println!("Initialized campusdesk for {} in {}", result.tenant, result.desk_dir.display());
        println!("  Config:           {}", result.config_file.display());
        println!("  Data:             {}", result.data_file.display());
        println!("  Complaint prefix: {}", result.prefix);
        println!();
        println!("Next: campusdesk user add --email <you@campus.edu> --role admin");
    }
    Ok(())
}

/// Execute `user add` and `user list`
pub async fn execute_user(
    app: &mut App,
    session: Option<&Session>,
    action: &UserAction,
    output_mode: OutputMode,
) -> Result<()> {
    match action {
        UserAction::Add(args) => execute_user_add(app, session, args, output_mode).await,
        UserAction::List => {
            let session = session.ok_or(crate::error::ConfigError::NoSessionUser)?;
            let users = desk::team(app.storage(), session).await?;
            output::emit(output_mode, &users, |w, config| {
                output::write_users(w, &users, config)
            })?;
            Ok(())
        }
    }
}

async fn execute_user_add(
    app: &mut App,
    session: Option<&Session>,
    args: &UserAddArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let new_user = NewUser {
        id: args.id.as_deref().map(UserId::new),
        full_name: args.name.clone(),
        email: args.email.clone(),
        role: args.role.into(),
    };

    let user = desk::register_user(app.storage_mut(), session, new_user).await?;
    app.save().await?;

    output::emit(output_mode, &user, |w, config| {
        writeln!(
            w,
            "{} {} ({}) as {}",
            output::success("Registered", config),
            user.id,
            user.display_name(),
            user.role
        )
    })?;
    Ok(())
}

/// Execute the file command
pub async fn execute_file(
    app: &mut App,
    session: &Session,
    args: &FileArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let complaint = NewComplaint {
        title: args.title.clone(),
        description: args.description.clone(),
        category: args.category.clone(),
        priority: args.priority.into(),
        location: args.location.clone(),
        created_by: None,
    };

    let (store, settings) = app.parts_mut();
    let outcome = desk::file_complaint(store, settings, session, complaint).await?;
    app.save().await?;

    output::emit(output_mode, &outcome, |w, config| {
        output::write_action(w, "Filed", &outcome, config)
    })?;
    Ok(())
}

/// Execute the list command
pub async fn execute_list(
    app: &App,
    session: &Session,
    args: &ListArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let options = ListOptions {
        status: args.status.map(Into::into),
        priority: args.priority.map(Into::into),
        category: args.category.clone(),
        search: args.search.clone(),
        include_deleted: args.include_deleted,
        only_deleted: args.only_deleted,
        limit: usize::try_from(args.limit).ok(),
    };

    let complaints = desk::list_complaints(app.storage(), session, options).await?;
    let policy = &app.settings().sla_hours;
    let now = Utc::now();
    output::emit(output_mode, &complaints, |w, config| {
        output::write_complaints(w, &complaints, policy, now, config)
    })?;
    Ok(())
}

/// Execute the show command
pub async fn execute_show(
    app: &App,
    session: &Session,
    args: &ComplaintArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = ComplaintId::new(&args.id);
    let detail = desk::complaint_detail(app.storage(), app.settings(), session, &id).await?;
    output::emit(output_mode, &detail, |w, config| {
        output::write_complaint_detail(w, &detail, config)
    })?;
    Ok(())
}

/// Execute the assign command
pub async fn execute_assign(
    app: &mut App,
    session: &Session,
    args: &AssignArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = ComplaintId::new(&args.id);
    let (store, settings) = app.parts_mut();

    let assigned = match &args.technician {
        Some(technician) if !args.auto => {
            desk::assign(store, settings, session, &id, &UserId::new(technician)).await?
        }
        _ => desk::auto_assign(store, settings, session, &id).await?,
    };
    app.save().await?;

    output::emit(output_mode, &assigned, |w, config| {
        let message = format!(
            "Assigned to {} ({} active before)",
            assigned.technician.display_name(),
            assigned.previous_load
        );
        output::write_action(w, &message, &assigned.outcome, config)
    })?;
    Ok(())
}

/// Execute the status command
pub async fn execute_status(
    app: &mut App,
    session: &Session,
    args: &StatusArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = ComplaintId::new(&args.id);
    let (store, settings) = app.parts_mut();
    let outcome = desk::update_status(store, settings, session, &id, args.status.into()).await?;
    app.save().await?;

    output::emit(output_mode, &outcome, |w, config| {
        let message = format!("Marked {}", outcome.complaint.status.label());
        output::write_action(w, &message, &outcome, config)
    })?;
    Ok(())
}

/// Execute the delete command
pub async fn execute_delete(
    app: &mut App,
    session: &Session,
    args: &ComplaintArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = ComplaintId::new(&args.id);
    let (store, settings) = app.parts_mut();
    let outcome = desk::soft_delete(store, settings, session, &id).await?;
    app.save().await?;

    output::emit(output_mode, &outcome, |w, config| {
        output::write_action(w, "Deleted", &outcome, config)
    })?;
    Ok(())
}

/// Execute the restore command
pub async fn execute_restore(
    app: &mut App,
    session: &Session,
    args: &ComplaintArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let id = ComplaintId::new(&args.id);
    let (store, settings) = app.parts_mut();
    let outcome = desk::restore(store, settings, session, &id).await?;
    app.save().await?;

    output::emit(output_mode, &outcome, |w, config| {
        output::write_action(w, "Restored", &outcome, config)
    })?;
    Ok(())
}

/// Execute the workload command
pub async fn execute_workload(app: &App, session: &Session, output_mode: OutputMode) -> Result<()> {
    let loads = desk::workload(app.storage(), session).await?;
    let max_load = app.settings().max_load;
    output::emit(output_mode, &loads, |w, config| {
        output::write_workload(w, &loads, max_load, config)
    })?;
    Ok(())
}

/// Execute the notifications command
pub async fn execute_notifications(
    app: &mut App,
    session: &Session,
    action: Option<&NotificationAction>,
    output_mode: OutputMode,
) -> Result<()> {
    match action {
        None => list_notifications(app, session, None, output_mode).await,
        Some(NotificationAction::List { limit }) => {
            list_notifications(app, session, *limit, output_mode).await
        }
        Some(NotificationAction::Read { id }) => {
            let notification = desk::mark_read(app.storage_mut(), session, id.trim()).await?;
            app.save().await?;
            output::emit(output_mode, &notification, |w, _| {
                writeln!(w, "Marked {} as read", notification.id)
            })?;
            Ok(())
        }
        Some(NotificationAction::ReadAll) => {
            let count = desk::mark_all_read(app.storage_mut(), session).await?;
            app.save().await?;
            output::emit(output_mode, &serde_json::json!({ "marked": count }), |w, _| {
                writeln!(w, "Marked {count} notification(s) as read")
            })?;
            Ok(())
        }
    }
}

async fn list_notifications(
    app: &App,
    session: &Session,
    limit: Option<usize>,
    output_mode: OutputMode,
) -> Result<()> {
    let notifications = desk::notifications(app.storage(), session, limit).await?;
    let unread = desk::unread_count(app.storage(), session).await?;
    output::emit(
        output_mode,
        &serde_json::json!({ "unread": unread, "notifications": notifications }),
        |w, config| {
            writeln!(w, "{unread} unread")?;
            output::write_notifications(w, &notifications, config)
        },
    )?;
    Ok(())
}

/// Settings as shown to the viewer; totals are present for admins only.
#[derive(Serialize)]
struct SettingsView<'a> {
    #[serde(flatten)]
    desk: &'a DeskConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    totals: Option<TenantTotals>,
}

/// Execute the settings command
pub async fn execute_settings(
    app: &mut App,
    session: &Session,
    action: Option<&SettingsAction>,
    output_mode: OutputMode,
) -> Result<()> {
    let message = match action {
        None | Some(SettingsAction::Show) => {
            let totals = if session.role() == Role::Admin {
                Some(desk::tenant_totals(app.storage(), session).await?)
            } else {
                None
            };
            let view = SettingsView {
                desk: app.config(),
                totals,
            };
            output::emit(output_mode, &view, |w, config| {
                output::write_settings(w, view.desk, view.totals.as_ref(), config)
            })?;
            return Ok(());
        }
        Some(SettingsAction::Sla { priority, hours }) => {
            let priority = (*priority).into();
            desk::set_sla_hours(app.settings_mut(), session, priority, *hours)?;
            format!("SLA for {priority} priority set to {hours}h")
        }
        Some(SettingsAction::AddCategory { name }) => {
            if desk::add_category(app.settings_mut(), session, name)? {
                format!("Added category '{}'", name.trim())
            } else {
                format!("Category '{}' already exists", name.trim())
            }
        }
        Some(SettingsAction::RemoveCategory { name }) => {
            let removed = desk::remove_category(app.settings_mut(), session, name)?;
            format!("Removed category '{removed}'")
        }
        Some(SettingsAction::MaxLoad { max }) => {
            desk::set_max_load(app.settings_mut(), session, usize::try_from(*max)?)?;
            format!("Technician load limit set to {max}")
        }
    };

    app.save_config().await?;
    output::emit(output_mode, &app.config().settings, |w, config| {
        writeln!(w, "{}", output::success(&message, config))
    })?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(
    app: &App,
    session: &Session,
    args: &StatsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let complaints = desk::visible_complaints(app.storage(), session).await?;
    let stats = analytics::dashboard_stats(&complaints);
    let advanced = args
        .detailed
        .then(|| analytics::advanced(&complaints, &app.settings().sla_hours, Utc::now()));

    output::emit(
        output_mode,
        &serde_json::json!({ "dashboard": stats, "advanced": advanced }),
        |w, config| output::write_stats(w, &stats, advanced.as_ref(), config),
    )?;
    Ok(())
}

/// Execute the export command
pub async fn execute_export(app: &App, session: &Session, args: &ExportArgs) -> Result<()> {
    let csv = match args.target {
        ExportTarget::Complaints => export::export_complaints(app.storage(), session).await?,
        ExportTarget::Activity => export::export_activity(app.storage(), session).await?,
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, format!("{csv}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{csv}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::types::{PriorityArg, RoleArg, StatusArg};
    use crate::domain::{ComplaintStatus, Role};
    use crate::error::Error;
    use tempfile::TempDir;

    async fn workspace() -> (TempDir, App) {
        let temp_dir = TempDir::new().unwrap();
        crate::commands::init::init(temp_dir.path(), None, Some("tt"))
            .await
            .unwrap();
        let app = App::from_directory(temp_dir.path()).await.unwrap();
        (temp_dir, app)
    }

    async fn add_user(app: &mut App, session: Option<&Session>, id: &str, role: RoleArg) -> Session {
        let args = UserAddArgs {
            email: format!("{id}@campus.edu"),
            name: None,
            role,
            id: Some(id.to_string()),
        };
        execute_user_add(app, session, &args, OutputMode::Json)
            .await
            .unwrap();
        app.session(Some(id)).await.unwrap()
    }

    #[tokio::test]
    async fn test_file_assign_resolve_persists() {
        let (temp_dir, mut app) = workspace().await;
        let admin = add_user(&mut app, None, "ada", RoleArg::Admin).await;
        let student = add_user(&mut app, Some(&admin), "sam", RoleArg::Student).await;
        let tech = add_user(&mut app, Some(&admin), "tia", RoleArg::Technician).await;

        let file = FileArgs {
            title: "Projector dead".to_string(),
            description: "Room 101 projector shows no signal".to_string(),
            category: "classroom maintenance".to_string(),
            priority: PriorityArg::High,
            location: Some("Room 101".to_string()),
        };
        execute_file(&mut app, &student, &file, OutputMode::Json)
            .await
            .unwrap();

        let complaints = desk::visible_complaints(app.storage(), &student).await.unwrap();
        assert_eq!(complaints.len(), 1);
        let id = complaints[0].id.to_string();

        let assign = AssignArgs {
            id: id.clone(),
            technician: None,
            auto: true,
        };
        execute_assign(&mut app, &admin, &assign, OutputMode::Json)
            .await
            .unwrap();

        let status = StatusArgs {
            id: id.clone(),
            status: StatusArg::Resolved,
        };
        execute_status(&mut app, &tech, &status, OutputMode::Json)
            .await
            .unwrap();

        let reopened = App::from_directory(temp_dir.path()).await.unwrap();
        let stored = reopened
            .storage()
            .get_complaint(&ComplaintId::new(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ComplaintStatus::Resolved);
        assert_eq!(stored.assigned_to, Some(UserId::new("tia")));
        assert_eq!(reopened.storage().activity_for(&stored.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_settings_change_requires_admin() {
        let (_temp_dir, mut app) = workspace().await;
        let admin = add_user(&mut app, None, "ada", RoleArg::Admin).await;
        let student = add_user(&mut app, Some(&admin), "sam", RoleArg::Student).await;

        let err = execute_settings(
            &mut app,
            &student,
            Some(&SettingsAction::MaxLoad { max: 3 }),
            OutputMode::Json,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PermissionDenied {
                role: Role::Student,
                ..
            })
        ));

        execute_settings(
            &mut app,
            &admin,
            Some(&SettingsAction::MaxLoad { max: 3 }),
            OutputMode::Json,
        )
        .await
        .unwrap();
        assert_eq!(app.settings().max_load, 3);
    }
}
