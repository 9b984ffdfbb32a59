//! Color and styling helpers for CLI output.
//!
//! Semantic theme:
//!   - green:  resolved, success
//!   - yellow: in progress, high priority, SLA due soon
//!   - red:    critical priority, overdue, errors
//!   - cyan:   IDs
//!   - dimmed: field labels

use crate::domain::{ComplaintStatus, Priority, Role};
use crate::policy::{SlaStatus, SlaTone};
use colored::Colorize;

use super::OutputConfig;

/// Green text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Red text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Yellow text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

pub(crate) fn colorize_status(status: ComplaintStatus, config: &OutputConfig) -> String {
    let text = status.label().to_string();
    if !config.use_colors {
        return text;
    }
    match status {
        ComplaintStatus::Open => text.white().to_string(),
        ComplaintStatus::InProgress => text.yellow().to_string(),
        ComplaintStatus::Resolved => text.green().to_string(),
    }
}

pub(crate) fn colorize_priority(priority: Priority, config: &OutputConfig) -> String {
    let text = priority.as_str().to_string();
    if !config.use_colors {
        return text;
    }
    match priority {
        Priority::Critical => text.red().bold().to_string(),
        Priority::High => text.yellow().to_string(),
        Priority::Medium | Priority::Low => text,
    }
}

pub(crate) fn colorize_sla(sla: &SlaStatus, config: &OutputConfig) -> String {
    if !config.use_colors {
        return sla.label.clone();
    }
    match sla.tone() {
        SlaTone::Overdue => sla.label.red().bold().to_string(),
        SlaTone::DueSoon => sla.label.yellow().to_string(),
        SlaTone::OnTrack => sla.label.clone(),
        SlaTone::Resolved => sla.label.green().to_string(),
    }
}

pub(crate) fn colorize_role(role: Role, config: &OutputConfig) -> String {
    let text = role.as_str().to_string();
    if !config.use_colors {
        return text;
    }
    match role {
        Role::Admin => text.magenta().to_string(),
        Role::Supervisor => text.blue().to_string(),
        Role::Technician => text.cyan().to_string(),
        Role::Student => text,
    }
}

pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return id.to_string();
    }
    id.cyan().to_string()
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
