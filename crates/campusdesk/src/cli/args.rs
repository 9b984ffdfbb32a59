//! CLI argument structs for all commands.

use clap::{Args, Parser, Subcommand};

use super::types::{PriorityArg, RoleArg, StatusArg};
use super::validators::{
    validate_complaint_id, validate_description, validate_hours, validate_prefix, validate_title,
    validate_user_id,
};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Complaint ID prefix (e.g., "hall" for "hall-a1b2")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Display name of the institution
    #[arg(short, long)]
    pub tenant: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `user` command
#[derive(Parser, Debug, Clone)]
pub struct UserArgs {
    /// User action
    #[command(subcommand)]
    pub action: UserAction,
}

/// User subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum UserAction {
    /// Register a user
    ///
    /// The very first user may be registered without --as, and must be an admin.
    Add(UserAddArgs),

    /// List the team, grouped by role
    List,
}

/// Arguments for `user add`
#[derive(Args, Debug, Clone)]
pub struct UserAddArgs {
    /// Contact email
    #[arg(short, long)]
    pub email: String,

    /// Full name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Role within the desk
    #[arg(short, long, value_enum, default_value = "student")]
    pub role: RoleArg,

    /// Explicit user ID (derived from the email if omitted)
    #[arg(long, value_parser = validate_user_id)]
    pub id: Option<String>,
}

/// Arguments for the `file` command
#[derive(Parser, Debug, Clone)]
pub struct FileArgs {
    /// Short summary of the problem
    #[arg(long, value_parser = validate_title)]
    pub title: String,

    /// Full description
    #[arg(short = 'D', long, value_parser = validate_description)]
    pub description: String,

    /// Category (one of the desk's configured categories)
    #[arg(short, long)]
    pub category: String,

    /// Urgency
    #[arg(short, long, value_enum, default_value = "medium")]
    pub priority: PriorityArg,

    /// Where on campus the problem is
    #[arg(short, long)]
    pub location: Option<String>,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Filter by priority
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Filter by category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Case-insensitive search over title and description
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Include deleted complaints (admins only)
    #[arg(long, conflicts_with = "only_deleted")]
    pub include_deleted: bool,

    /// Show only deleted complaints (admins only)
    #[arg(long)]
    pub only_deleted: bool,

    /// Maximum number of complaints to show
    #[arg(short = 'n', long, default_value = "50", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub limit: u32,
}

/// Arguments that name a single complaint
#[derive(Parser, Debug, Clone)]
pub struct ComplaintArgs {
    /// Complaint ID
    #[arg(value_parser = validate_complaint_id)]
    pub id: String,
}

/// Arguments for the `assign` command
#[derive(Parser, Debug, Clone)]
pub struct AssignArgs {
    /// Complaint ID
    #[arg(value_parser = validate_complaint_id)]
    pub id: String,

    /// Technician to assign
    #[arg(value_parser = validate_user_id, required_unless_present = "auto", conflicts_with = "auto")]
    pub technician: Option<String>,

    /// Pick the least-loaded technician below the cap
    #[arg(long)]
    pub auto: bool,
}

/// Arguments for the `status` command
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    /// Complaint ID
    #[arg(value_parser = validate_complaint_id)]
    pub id: String,

    /// New status
    #[arg(value_enum)]
    pub status: StatusArg,
}

/// Arguments for the `notifications` command
#[derive(Parser, Debug, Clone)]
pub struct NotificationsArgs {
    /// Notification action (defaults to list)
    #[command(subcommand)]
    pub action: Option<NotificationAction>,
}

/// Notification subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum NotificationAction {
    /// Show your notifications, newest first
    List {
        /// Maximum number to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Mark one notification as read
    Read {
        /// Notification ID (e.g., ntf-3)
        id: String,
    },

    /// Mark all your notifications as read
    ReadAll,
}

/// Arguments for the `settings` command
#[derive(Parser, Debug, Clone)]
pub struct SettingsArgs {
    /// Settings action (defaults to show)
    #[command(subcommand)]
    pub action: Option<SettingsAction>,
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    /// Show tenant settings
    Show,

    /// Set the SLA window for a priority
    Sla {
        /// Priority to change
        #[arg(value_enum)]
        priority: PriorityArg,

        /// Hours until the complaint is overdue
        #[arg(value_parser = validate_hours)]
        hours: u32,
    },

    /// Add a complaint category
    AddCategory {
        /// Category name
        name: String,
    },

    /// Remove a complaint category
    RemoveCategory {
        /// Category name (case-insensitive)
        name: String,
    },

    /// Set the maximum active complaints per technician
    MaxLoad {
        /// New cap
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        max: u32,
    },
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Include resolution time, SLA compliance and trends
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the `export` command
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// What to export
    #[command(subcommand)]
    pub target: ExportTarget,

    /// Write to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<std::path::PathBuf>,
}

/// Export subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// Complaints visible to you, as CSV
    Complaints,

    /// The full activity log, as CSV (admins and supervisors)
    Activity,
}
