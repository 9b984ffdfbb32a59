//! CLI value enums and their domain conversions.

use clap::ValueEnum;

use crate::domain::{ComplaintStatus, Priority, Role};

/// Complaint priority for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityArg {
    /// Can wait
    Low,
    /// Normal urgency
    Medium,
    /// Needs attention within a day
    High,
    /// Safety or service outage
    Critical,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}

/// Complaint status for CLI filters
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    /// Waiting for a technician
    Open,
    /// Being worked on
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Fixed
    Resolved,
}

impl From<StatusArg> for ComplaintStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => ComplaintStatus::Open,
            StatusArg::InProgress => ComplaintStatus::InProgress,
            StatusArg::Resolved => ComplaintStatus::Resolved,
        }
    }
}

/// User role for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    /// Full control over the desk
    Admin,
    /// Read-only oversight
    Supervisor,
    /// Works on assigned complaints
    Technician,
    /// Files complaints
    Student,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::Supervisor => Role::Supervisor,
            RoleArg::Technician => Role::Technician,
            RoleArg::Student => Role::Student,
        }
    }
}
