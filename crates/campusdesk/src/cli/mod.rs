//! CLI argument parsing and command dispatch.
//!
//! Built on clap's derive API. Every command except `init` runs inside an
//! existing workspace, and every command except `init` and the bootstrap
//! `user add` acts as the user named by `--as` (or `CAMPUSDESK_USER`).
//!
//! # Example
//!
//! ```bash
//! campusdesk init --tenant "North Campus" --prefix nc
//! campusdesk user add --email ada@campus.edu --name "Ada" --role admin --id ada
//! campusdesk --as sam file --title "Leaking tap" -D "Block C washroom" -c plumbing -p high
//! campusdesk --as ada assign nc-a1b2 --auto
//! campusdesk --as tia status nc-a1b2 resolved
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    AssignArgs, ComplaintArgs, ExportArgs, ExportTarget, FileArgs, InitArgs, ListArgs,
    NotificationAction, NotificationsArgs, SettingsAction, SettingsArgs, StatsArgs, StatusArgs,
    UserAction, UserAddArgs, UserArgs,
};
pub use types::{PriorityArg, RoleArg, StatusArg};
pub use validators::{
    validate_complaint_id, validate_description, validate_hours, validate_prefix, validate_title,
    validate_user_id,
};

/// Campus maintenance complaint desk
///
/// File complaints, track SLA deadlines and balance technician workload.
/// Data lives in `.campusdesk/` at the workspace root.
#[derive(Parser, Debug)]
#[command(name = "campusdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Act as this user
    #[arg(long = "as", global = true, env = "CAMPUSDESK_USER", value_name = "USER_ID")]
    pub as_user: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new desk workspace in the current directory
    Init(InitArgs),

    /// Register and list users
    User(UserArgs),

    /// File a new complaint (students)
    File(FileArgs),

    /// List complaints you can see
    ///
    /// Students see their own complaints, technicians see complaints assigned
    /// to them, admins and supervisors see everything.
    List(ListArgs),

    /// Show a complaint with its SLA and activity timeline
    Show(ComplaintArgs),

    /// Assign a complaint to a technician (admins)
    Assign(AssignArgs),

    /// Move an assigned complaint forward (technicians)
    Status(StatusArgs),

    /// Soft-delete a complaint (admins)
    Delete(ComplaintArgs),

    /// Restore a soft-deleted complaint (admins)
    Restore(ComplaintArgs),

    /// Active complaints per technician, busiest first
    Workload,

    /// Your notifications
    Notifications(NotificationsArgs),

    /// Show or change tenant settings
    Settings(SettingsArgs),

    /// Complaint statistics
    Stats(StatsArgs),

    /// Export data as CSV
    Export(ExportArgs),
}

impl Cli {
    /// Parse CLI arguments from the command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the parsed command
    ///
    /// # Errors
    ///
    /// Returns any workspace, permission, validation or storage error.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("campusdesk: campus complaint desk");
            println!("Use --help for more information");
            return Ok(());
        };

        if let Commands::Init(args) = command {
            return execute::execute_init(args, output_mode).await;
        }

        let mut app = App::from_directory(&std::env::current_dir()?).await?;

        if let Commands::User(args) = command {
            let session = match self.as_user.as_deref() {
                Some(id) => Some(app.session(Some(id)).await?),
                None => None,
            };
            return execute::execute_user(&mut app, session.as_ref(), &args.action, output_mode)
                .await;
        }

        let session = app.session(self.as_user.as_deref()).await?;
        tracing::debug!(user = %session.user_id(), role = %session.role(), "Session resolved");

        match command {
            Commands::Init(_) | Commands::User(_) => Ok(()),
            Commands::File(args) => execute::execute_file(&mut app, &session, args, output_mode).await,
            Commands::List(args) => execute::execute_list(&app, &session, args, output_mode).await,
            Commands::Show(args) => execute::execute_show(&app, &session, args, output_mode).await,
            Commands::Assign(args) => {
                execute::execute_assign(&mut app, &session, args, output_mode).await
            }
            Commands::Status(args) => {
                execute::execute_status(&mut app, &session, args, output_mode).await
            }
            Commands::Delete(args) => {
                execute::execute_delete(&mut app, &session, args, output_mode).await
            }
            Commands::Restore(args) => {
                execute::execute_restore(&mut app, &session, args, output_mode).await
            }
            Commands::Workload => execute::execute_workload(&app, &session, output_mode).await,
            Commands::Notifications(args) => {
                execute::execute_notifications(&mut app, &session, args.action.as_ref(), output_mode)
                    .await
            }
            Commands::Settings(args) => {
                execute::execute_settings(&mut app, &session, args.action.as_ref(), output_mode)
                    .await
            }
            Commands::Stats(args) => execute::execute_stats(&app, &session, args, output_mode).await,
            Commands::Export(args) => execute::execute_export(&app, &session, args).await,
        }
    }
}
