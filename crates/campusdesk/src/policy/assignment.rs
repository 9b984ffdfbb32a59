//! Workload-balanced technician assignment.
//!
//! Workload is derived, never stored: it is recounted from a snapshot of
//! complaints every time it is needed. Ranking puts the least-loaded
//! technician first; the caseload cap decides whether a technician may take
//! another complaint.

use crate::domain::{Complaint, UserId, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default maximum number of active complaints per technician.
pub const DEFAULT_MAX_LOAD: usize = 10;

/// Active counts above this are flagged as heavy in workload reports.
pub const HEAVY_LOAD_THRESHOLD: usize = 5;

/// Tenant-level assignment settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    /// Maximum concurrent active complaints per technician
    pub max_load: usize,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            max_load: DEFAULT_MAX_LOAD,
        }
    }
}

impl AssignmentPolicy {
    /// Whether a technician with `active` complaints may take another.
    pub fn admits(&self, active: usize) -> bool {
        active < self.max_load
    }

    /// The least-loaded technician in `ranked`, if below this cap.
    pub fn suggest<'a>(&self, ranked: &'a [TechnicianLoad]) -> Option<&'a TechnicianLoad> {
        suggest(ranked, self.max_load)
    }
}

/// A technician paired with their current number of active complaints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicianLoad {
    /// The technician's profile
    pub technician: UserProfile,

    /// Open or in-progress, non-deleted complaints assigned to them
    pub active_count: usize,
}

impl TechnicianLoad {
    /// Whether the workload report should highlight this technician.
    pub fn is_heavy(&self) -> bool {
        self.active_count > HEAVY_LOAD_THRESHOLD
    }
}

/// Tally active complaints per assignee.
///
/// Only complaints that are open or in progress, not soft-deleted, and
/// assigned to someone are counted.
pub fn active_counts<'a, I>(complaints: I) -> HashMap<UserId, usize>
where
    I: IntoIterator<Item = &'a Complaint>,
{
    let mut counts = HashMap::new();
    for complaint in complaints {
        if !complaint.is_active() {
            continue;
        }
        if let Some(assignee) = &complaint.assigned_to {
            *counts.entry(assignee.clone()).or_insert(0) += 1;
        }
    }
    counts
}

fn with_counts<I>(technicians: I, counts: &HashMap<UserId, usize>) -> Vec<TechnicianLoad>
where
    I: IntoIterator<Item = UserProfile>,
{
    technicians
        .into_iter()
        .map(|technician| {
            let active_count = counts.get(&technician.id).copied().unwrap_or(0);
            TechnicianLoad {
                technician,
                active_count,
            }
        })
        .collect()
}

/// Order technicians by ascending active count.
///
/// The sort is stable: technicians with equal counts keep roster order.
pub fn rank<I>(technicians: I, counts: &HashMap<UserId, usize>) -> Vec<TechnicianLoad>
where
    I: IntoIterator<Item = UserProfile>,
{
    let mut loads = with_counts(technicians, counts);
    loads.sort_by_key(|load| load.active_count);
    loads
}

/// Order technicians by descending active count (stable), for reports.
pub fn busiest_first<I>(technicians: I, counts: &HashMap<UserId, usize>) -> Vec<TechnicianLoad>
where
    I: IntoIterator<Item = UserProfile>,
{
    let mut loads = with_counts(technicians, counts);
    loads.sort_by(|a, b| b.active_count.cmp(&a.active_count));
    loads
}

/// A technician may take another complaint while below the cap.
pub fn can_assign(load: &TechnicianLoad, max_load: usize) -> bool {
    load.active_count < max_load
}

/// The least-loaded technician, if they are below the cap.
pub fn suggest(ranked: &[TechnicianLoad], max_load: usize) -> Option<&TechnicianLoad> {
    ranked.first().filter(|load| can_assign(load, max_load))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComplaintId, ComplaintStatus, Priority, Role};
    use chrono::Utc;
    use proptest::prelude::*;

    fn tech(id: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            full_name: Some(format!("Tech {id}")),
            email: format!("{id}@campus.edu"),
            role: Role::Technician,
            created_at: Utc::now(),
        }
    }

    fn complaint(n: usize, assignee: Option<&str>, status: ComplaintStatus) -> Complaint {
        let now = Utc::now();
        Complaint {
            id: ComplaintId::new(format!("cd-{n:04}")),
            title: format!("Complaint {n}"),
            description: "Something broke".to_string(),
            category: "electrical".to_string(),
            priority: Priority::Medium,
            status,
            location: None,
            created_by: Some(UserId::new("stu")),
            assigned_to: assignee.map(UserId::new),
            created_at: now,
            updated_at: now,
            resolved_at: (status == ComplaintStatus::Resolved).then_some(now),
            is_deleted: false,
            deleted_at: None,
        }
    }

    fn counts_of(pairs: &[(&str, usize)]) -> HashMap<UserId, usize> {
        pairs
            .iter()
            .map(|(id, n)| (UserId::new(*id), *n))
            .collect()
    }

    #[test]
    fn test_active_counts_skips_resolved_deleted_and_unassigned() {
        let mut deleted = complaint(4, Some("a"), ComplaintStatus::InProgress);
        deleted.is_deleted = true;
        deleted.deleted_at = Some(Utc::now());

        let complaints = vec![
            complaint(1, Some("a"), ComplaintStatus::Open),
            complaint(2, Some("a"), ComplaintStatus::InProgress),
            complaint(3, Some("a"), ComplaintStatus::Resolved),
            deleted,
            complaint(5, None, ComplaintStatus::Open),
            complaint(6, Some("b"), ComplaintStatus::Open),
        ];

        let counts = active_counts(&complaints);
        assert_eq!(counts.get(&UserId::new("a")), Some(&2));
        assert_eq!(counts.get(&UserId::new("b")), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_rank_least_loaded_first() {
        let counts = counts_of(&[("a", 3), ("b", 7)]);
        let ranked = rank(vec![tech("b"), tech("a")], &counts);
        let ids: Vec<&str> = ranked.iter().map(|l| l.technician.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_rank_missing_counts_are_zero_and_ties_keep_order() {
        let counts = counts_of(&[("c", 1)]);
        let ranked = rank(vec![tech("c"), tech("x"), tech("y")], &counts);
        let ids: Vec<&str> = ranked.iter().map(|l| l.technician.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "c"]);
        assert_eq!(ranked[0].active_count, 0);
    }

    #[test]
    fn test_busiest_first() {
        let counts = counts_of(&[("a", 3), ("b", 7), ("c", 3)]);
        let ordered = busiest_first(vec![tech("a"), tech("b"), tech("c")], &counts);
        let ids: Vec<&str> = ordered.iter().map(|l| l.technician.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(ordered[0].is_heavy());
        assert!(!ordered[1].is_heavy());
    }

    #[test]
    fn test_suggest_respects_cap() {
        let counts = counts_of(&[("a", 10), ("b", 12)]);
        let ranked = rank(vec![tech("a"), tech("b")], &counts);
        assert!(suggest(&ranked, DEFAULT_MAX_LOAD).is_none());

        let counts = counts_of(&[("a", 9), ("b", 12)]);
        let ranked = rank(vec![tech("a"), tech("b")], &counts);
        assert_eq!(
            suggest(&ranked, DEFAULT_MAX_LOAD).map(|l| l.technician.id.as_str()),
            Some("a")
        );
        assert!(suggest(&[], DEFAULT_MAX_LOAD).is_none());
    }

    #[test]
    fn test_policy_cap_drives_suggestion() {
        let counts = counts_of(&[("a", 2), ("b", 4)]);
        let ranked = rank(vec![tech("a"), tech("b")], &counts);

        let tight = AssignmentPolicy { max_load: 2 };
        assert!(!tight.admits(2));
        assert!(tight.suggest(&ranked).is_none());

        let roomy = AssignmentPolicy::default();
        assert!(roomy.admits(9));
        assert!(!roomy.admits(10));
        assert_eq!(
            roomy.suggest(&ranked).map(|l| l.technician.id.as_str()),
            Some("a")
        );
    }

    proptest! {
        #[test]
        fn prop_rank_is_sorted_and_stable(loads in prop::collection::vec(0usize..15, 0..20)) {
            let technicians: Vec<UserProfile> =
                (0..loads.len()).map(|i| tech(&format!("t{i:02}"))).collect();
            let counts: HashMap<UserId, usize> = technicians
                .iter()
                .zip(&loads)
                .map(|(t, n)| (t.id.clone(), *n))
                .collect();

            let ranked = rank(technicians, &counts);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].active_count <= pair[1].active_count);
                if pair[0].active_count == pair[1].active_count {
                    prop_assert!(pair[0].technician.id < pair[1].technician.id);
                }
            }
        }

        #[test]
        fn prop_can_assign_false_iff_at_cap(active in 0usize..40) {
            let load = TechnicianLoad { technician: tech("t"), active_count: active };
            prop_assert_eq!(can_assign(&load, DEFAULT_MAX_LOAD), active < 10);
        }
    }
}
