//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or pretty JSON. Text
//! renderers write to any [`Write`] so they can be tested against a buffer;
//! [`emit`] picks the format and locks stdout.
//!
//! Submodules:
//! - [`color`]: semantic colors for status, priority, SLA and roles

pub mod color;

use crate::analytics::{AdvancedStats, DashboardStats};
use crate::commands::init::DeskConfig;
use crate::desk::{ActionOutcome, ComplaintDetail, TenantTotals};
use crate::domain::{Complaint, Notification, Priority, UserProfile};
use crate::effects::StepOutcome;
use crate::policy::{SlaPolicy, TechnicianLoad, sla};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};

use color::{
    bold, colorize_id, colorize_priority, colorize_role, colorize_sla, colorize_status, dimmed,
};

const DEFAULT_TERMINAL_WIDTH: usize = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Settings that control text rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Upper bound for wrapped text, regardless of terminal width.
    pub max_width: usize,
    /// Whether to use colors.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a config with explicit values.
    pub fn new(max_width: usize, use_colors: bool) -> Self {
        Self {
            max_width,
            use_colors,
        }
    }

    /// Read the config from the environment.
    ///
    /// - `NO_COLOR`: any value disables colors
    /// - `CAMPUSDESK_COLOR`: "0" or "false" disables colors
    /// - `CAMPUSDESK_MAX_WIDTH`: wrap width limit (default 100)
    pub fn from_env() -> Self {
        let max_width = match env::var("CAMPUSDESK_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "CAMPUSDESK_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("CAMPUSDESK_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_colors,
        }
    }

    /// Width to wrap long text at: the terminal width, capped at `max_width`.
    pub fn wrap_width(&self) -> usize {
        terminal_width().min(self.max_width).max(20)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_WIDTH, true)
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| usize::from(w.0))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Print `value` as JSON, or run `text` against stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written or `value` fails to
/// serialize.
pub fn emit<T, F>(mode: OutputMode, value: &T, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut dyn Write, &OutputConfig) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Json => write_json(&mut handle, value),
        OutputMode::Text => text(&mut handle, &OutputConfig::from_env()),
    }
}

/// Print a value as pretty JSON to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written or `value` fails to
/// serialize.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

fn write_json<T: Serialize + ?Sized>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

fn field(w: &mut dyn Write, label: &str, value: &str, config: &OutputConfig) -> io::Result<()> {
    writeln!(w, "  {} {value}", dimmed(&format!("{label:<10}"), config))
}

/// One line per complaint: ID, status, priority, SLA and title.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_complaints(
    w: &mut dyn Write,
    complaints: &[Complaint],
    policy: &SlaPolicy,
    now: DateTime<Utc>,
    config: &OutputConfig,
) -> io::Result<()> {
    if complaints.is_empty() {
        return writeln!(w, "No complaints found.");
    }

    writeln!(w, "Found {} complaint(s):", complaints.len())?;
    writeln!(w)?;
    for c in complaints {
        let sla = sla::evaluate(c.created_at, c.priority, c.status, policy, now);
        let deleted = if c.is_deleted {
            format!(" {}", color::error("[deleted]", config))
        } else {
            String::new()
        };
        writeln!(
            w,
            "{}  {}  {}  {}  {}{deleted}",
            colorize_id(c.id.as_str(), config),
            colorize_status(c.status, config),
            colorize_priority(c.priority, config),
            colorize_sla(&sla, config),
            c.title,
        )?;
    }
    Ok(())
}

/// Full complaint view with wrapped description and activity timeline.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_complaint_detail(
    w: &mut dyn Write,
    detail: &ComplaintDetail,
    config: &OutputConfig,
) -> io::Result<()> {
    let c = &detail.complaint;
    let width = config.wrap_width();

    writeln!(w, "{} {}", colorize_id(c.id.as_str(), config), bold(&c.title, config))?;
    if c.is_deleted {
        writeln!(w, "  {}", color::error("This complaint is deleted", config))?;
    }
    field(w, "Status:", &colorize_status(c.status, config), config)?;
    field(w, "Priority:", &colorize_priority(c.priority, config), config)?;
    field(w, "SLA:", &colorize_sla(&detail.sla, config), config)?;
    field(w, "Category:", &c.category, config)?;
    if let Some(location) = &c.location {
        field(w, "Location:", location, config)?;
    }
    field(
        w,
        "Reporter:",
        detail.reporter_name.as_deref().unwrap_or("Unknown"),
        config,
    )?;
    field(
        w,
        "Assignee:",
        detail.assignee_name.as_deref().unwrap_or("Unassigned"),
        config,
    )?;
    field(w, "Created:", &c.created_at.format(TIMESTAMP_FORMAT).to_string(), config)?;
    if let Some(resolved_at) = c.resolved_at {
        field(w, "Resolved:", &resolved_at.format(TIMESTAMP_FORMAT).to_string(), config)?;
    }

    writeln!(w)?;
    writeln!(w, "{}:", bold("Description", config))?;
    for line in wrap_text(&c.description, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }

    if !detail.timeline.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Activity", config))?;
        for item in &detail.timeline {
            let entry = &item.entry;
            writeln!(
                w,
                "  {}  {}  {}",
                dimmed(&entry.created_at.format(TIMESTAMP_FORMAT).to_string(), config),
                entry.action,
                dimmed(&format!("by {}", item.performed_by_name), config),
            )?;
            if let Some(details) = &entry.details {
                for line in wrap_text(details, width.saturating_sub(6)) {
                    writeln!(w, "      {line}")?;
                }
            }
        }
    }
    Ok(())
}

/// Confirmation line for a complaint action, then any failed or skipped
/// side effects.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_action(
    w: &mut dyn Write,
    message: &str,
    outcome: &ActionOutcome,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}: {}",
        success(message, config),
        colorize_id(outcome.complaint.id.as_str(), config),
        outcome.complaint.title
    )?;
    for step in &outcome.steps {
        match &step.outcome {
            StepOutcome::Applied => {}
            StepOutcome::Failed(reason) => writeln!(
                w,
                "  {} {}: {reason}",
                warning("warning:", config),
                step.step
            )?,
            StepOutcome::Skipped => {
                writeln!(w, "  {} {}", dimmed("skipped:", config), step.step)?;
            }
        }
    }
    Ok(())
}

/// Technician workload table, highlighting heavy loads.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_workload(
    w: &mut dyn Write,
    loads: &[TechnicianLoad],
    max_load: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    if loads.is_empty() {
        return writeln!(w, "No technicians registered.");
    }

    writeln!(w, "Technician workload (cap {max_load}):")?;
    writeln!(w)?;
    for load in loads {
        let count = format!("{:>3}", load.active_count);
        let count = if load.active_count >= max_load {
            color::error(&count, config)
        } else if load.is_heavy() {
            warning(&count, config)
        } else {
            count
        };
        let flag = if load.is_heavy() {
            format!("  {}", warning("heavy", config))
        } else {
            String::new()
        };
        writeln!(
            w,
            "{count}  {}  {}{flag}",
            load.technician.display_name(),
            dimmed(load.technician.id.as_str(), config),
        )?;
    }
    Ok(())
}

/// Notification list, unread first marker.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_notifications(
    w: &mut dyn Write,
    notifications: &[Notification],
    config: &OutputConfig,
) -> io::Result<()> {
    if notifications.is_empty() {
        return writeln!(w, "No notifications.");
    }

    for n in notifications {
        let marker = if n.is_read { " " } else { "*" };
        writeln!(
            w,
            "{marker} {}  {}  {}",
            colorize_id(&n.id, config),
            bold(&n.title, config),
            dimmed(&n.created_at.format(TIMESTAMP_FORMAT).to_string(), config),
        )?;
        writeln!(w, "    {}", n.message)?;
    }
    Ok(())
}

/// Team roster.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_users(w: &mut dyn Write, users: &[UserProfile], config: &OutputConfig) -> io::Result<()> {
    if users.is_empty() {
        return writeln!(w, "No users registered.");
    }

    for user in users {
        writeln!(
            w,
            "{:<12} {}  {}  {}",
            colorize_role(user.role, config),
            colorize_id(user.id.as_str(), config),
            user.display_name(),
            dimmed(&user.email, config),
        )?;
    }
    Ok(())
}

/// Tenant name, storage and settings, plus tenant totals when the viewer
/// may see them.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_settings(
    w: &mut dyn Write,
    desk: &DeskConfig,
    totals: Option<&TenantTotals>,
    config: &OutputConfig,
) -> io::Result<()> {
    let settings = &desk.settings;

    writeln!(w, "{}", bold(&desk.tenant, config))?;
    field(w, "Prefix:", &desk.complaint_prefix, config)?;
    field(w, "Storage:", &desk.storage.backend, config)?;
    field(w, "Max load:", &settings.max_load.to_string(), config)?;
    field(w, "Effects:", settings.side_effects.as_str(), config)?;

    writeln!(w)?;
    writeln!(w, "{}:", bold("SLA hours", config))?;
    for priority in Priority::ALL {
        writeln!(
            w,
            "  {:<8} {}h",
            colorize_priority(priority, config),
            settings.sla_hours.hours_for(priority)
        )?;
    }

    writeln!(w)?;
    writeln!(w, "{}:", bold("Categories", config))?;
    for category in &settings.categories {
        writeln!(w, "  {category}")?;
    }

    if let Some(totals) = totals {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Totals", config))?;
        field(w, "Users:", &totals.users.to_string(), config)?;
        field(w, "Complaints:", &totals.complaints.to_string(), config)?;
        field(w, "Technicians:", &totals.technicians.to_string(), config)?;
    }
    Ok(())
}

/// Dashboard counters and, when present, the detailed analytics.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_stats(
    w: &mut dyn Write,
    stats: &DashboardStats,
    advanced: Option<&AdvancedStats>,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "Complaints: {} total ({} open, {} in progress, {} resolved)",
        stats.total, stats.open, stats.in_progress, stats.resolved
    )?;
    writeln!(w, "Resolution rate: {}%", stats.resolution_rate)?;

    let Some(advanced) = advanced else {
        return Ok(());
    };

    writeln!(w)?;
    writeln!(w, "Avg resolution time: {}h", advanced.avg_resolution_hours)?;
    writeln!(w, "SLA compliance:      {}%", advanced.sla_compliance)?;

    writeln!(w)?;
    writeln!(w, "{}:", bold("Monthly trend", config))?;
    for month in &advanced.monthly_trend {
        writeln!(w, "  {}  {:>4}", month.month, month.count)?;
    }

    if !advanced.top_categories.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Top categories", config))?;
        for category in &advanced.top_categories {
            writeln!(w, "  {:<24} {:>4}", category.category, category.count)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::TimelineEntry;
    use crate::domain::{ActivityLogEntry, ComplaintId, ComplaintStatus, Role, UserId};
    use crate::effects::StepReport;
    use chrono::{Duration, TimeZone};

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false)
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn complaint() -> Complaint {
        Complaint {
            id: ComplaintId::new("desk-a1b2"),
            title: "Leaking tap".to_string(),
            description: "The tap in block C drips all night.".to_string(),
            category: "plumbing".to_string(),
            priority: Priority::Low,
            status: ComplaintStatus::Open,
            location: Some("Block C".to_string()),
            created_by: Some(UserId::new("sam")),
            assigned_to: None,
            created_at: t0(),
            updated_at: t0(),
            resolved_at: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    fn technician(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            full_name: Some(name.to_string()),
            email: format!("{id}@campus.edu"),
            role: Role::Technician,
            created_at: t0(),
        }
    }

    #[test]
    fn test_complaint_list_shows_sla_label() {
        let out = render(|w| {
            write_complaints(
                w,
                &[complaint()],
                &SlaPolicy::default(),
                t0() + Duration::hours(30),
                &plain(),
            )
        });
        assert!(out.contains("Found 1 complaint(s):"));
        assert!(out.contains("desk-a1b2  open  low  3d 18h left  Leaking tap"));
    }

    #[test]
    fn test_empty_list() {
        let out = render(|w| write_complaints(w, &[], &SlaPolicy::default(), t0(), &plain()));
        assert_eq!(out, "No complaints found.\n");
    }

    #[test]
    fn test_detail_includes_timeline() {
        let detail = ComplaintDetail {
            complaint: complaint(),
            sla: sla::evaluate(
                t0(),
                Priority::Low,
                ComplaintStatus::Open,
                &SlaPolicy::default(),
                t0(),
            ),
            reporter_name: Some("Sam Student".to_string()),
            assignee_name: None,
            timeline: vec![TimelineEntry {
                entry: ActivityLogEntry {
                    id: "act-1".to_string(),
                    complaint_id: ComplaintId::new("desk-a1b2"),
                    action: "Complaint created".to_string(),
                    details: Some("Priority: low, Category: plumbing".to_string()),
                    performed_by: UserId::new("sam"),
                    created_at: t0(),
                },
                performed_by_name: "Sam Student".to_string(),
            }],
        };

        let out = render(|w| write_complaint_detail(w, &detail, &plain()));
        assert!(out.starts_with("desk-a1b2 Leaking tap\n"));
        assert!(out.contains("Reporter:  Sam Student"));
        assert!(out.contains("Assignee:  Unassigned"));
        assert!(out.contains("Complaint created  by Sam Student"));
        assert!(out.contains("Priority: low, Category: plumbing"));
    }

    #[test]
    fn test_action_reports_failed_side_effects() {
        let outcome = ActionOutcome {
            complaint: complaint(),
            steps: vec![
                StepReport {
                    step: "update complaint desk-a1b2".to_string(),
                    outcome: StepOutcome::Applied,
                },
                StepReport {
                    step: "notify sam".to_string(),
                    outcome: StepOutcome::Failed("disk full".to_string()),
                },
            ],
        };

        let out = render(|w| write_action(w, "Assigned", &outcome, &plain()));
        assert!(out.starts_with("Assigned desk-a1b2: Leaking tap\n"));
        assert!(out.contains("warning: notify sam: disk full"));
    }

    #[test]
    fn test_workload_flags_heavy_technicians() {
        let loads = vec![
            TechnicianLoad {
                technician: technician("bo", "Bo"),
                active_count: 7,
            },
            TechnicianLoad {
                technician: technician("al", "Al"),
                active_count: 3,
            },
        ];

        let out = render(|w| write_workload(w, &loads, 10, &plain()));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Technician workload (cap 10):");
        assert_eq!(lines[2], "  7  Bo  bo  heavy");
        assert_eq!(lines[3], "  3  Al  al");
    }

    #[test]
    fn test_settings_totals_only_when_given() {
        let desk = DeskConfig::new("North Campus", "desk");
        let totals = TenantTotals {
            users: 12,
            complaints: 40,
            technicians: 3,
        };

        let out = render(|w| write_settings(w, &desk, Some(&totals), &plain()));
        assert!(out.starts_with("North Campus\n"));
        assert!(out.contains("Totals:"));
        assert!(out.contains("Complaints:"));
        assert!(out.lines().any(|l| l.starts_with("  Technicians:") && l.ends_with(" 3")));

        let out = render(|w| write_settings(w, &desk, None, &plain()));
        assert!(!out.contains("Totals:"));
        assert!(out.contains("Categories:"));
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        let lines = wrap_text("one two three\n\nfour", 8);
        assert_eq!(lines, ["one two", "three", "", "four"]);
    }
}
