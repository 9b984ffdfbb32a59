//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all data
//! and is wrapped in `Arc<Mutex<>>` for thread safety.

use crate::domain::{
    ActivityLogEntry, Complaint, ComplaintId, NewComplaint, Notification, UserId, UserProfile,
};
use crate::error::{Result, StorageError};
use crate::id_generation::{IdGenerator, IdGeneratorConfig, parse_sequence_id, sequence_id};
use std::collections::HashMap;

/// Prefix of activity log entry IDs
pub(crate) const ACTIVITY_ID_PREFIX: &str = "act";

/// Prefix of notification IDs
pub(crate) const NOTIFICATION_ID_PREFIX: &str = "ntf";

/// Inner storage structure (not thread-safe).
///
/// Complaints and users are kept in hash maps for O(1) lookups, with a
/// separate insertion-order list so that listings are deterministic when
/// timestamps tie. Activity and notifications are append-only vectors.
pub(crate) struct InMemoryDeskInner {
    /// Complaints indexed by ID
    pub(super) complaints: HashMap<ComplaintId, Complaint>,

    /// Complaint IDs in insertion order
    pub(super) complaint_order: Vec<ComplaintId>,

    /// User profiles indexed by ID
    pub(super) users: HashMap<UserId, UserProfile>,

    /// User IDs in registration order
    pub(super) user_order: Vec<UserId>,

    /// Activity log, in append order
    pub(super) activity: Vec<ActivityLogEntry>,

    /// Notifications, in delivery order
    pub(super) notifications: Vec<Notification>,

    /// Next activity sequence number
    next_activity: u64,

    /// Next notification sequence number
    next_notification: u64,

    /// ID generator for new complaints
    id_generator: IdGenerator,

    /// Prefix for complaint IDs (e.g., "desk")
    prefix: String,
}

impl InMemoryDeskInner {
    /// Create a new empty storage instance
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            complaints: HashMap::new(),
            complaint_order: Vec::new(),
            users: HashMap::new(),
            user_order: Vec::new(),
            activity: Vec::new(),
            notifications: Vec::new(),
            next_activity: 1,
            next_notification: 1,
            id_generator: IdGenerator::new(IdGeneratorConfig {
                prefix: prefix.clone(),
                database_size: 0,
            }),
            prefix,
        }
    }

    /// Recreate the ID generator when the complaint count crosses an ID
    /// length threshold (500 and 1500).
    fn update_id_generator_if_needed(&mut self) {
        let current = self.complaints.len();
        let previous = self.id_generator.database_size();

        let crossed = matches!(
            (previous, current),
            (0..=500, 501..) | (0..=1500, 1501..) | (501.., 0..=500) | (1501.., 0..=1500)
        );
        if !crossed {
            return;
        }

        self.id_generator = IdGenerator::new(IdGeneratorConfig {
            prefix: self.prefix.clone(),
            database_size: current,
        });
        for id in self.complaints.keys() {
            self.id_generator.register_id(id.as_str());
        }
    }

    /// Generate a new unique complaint ID
    pub(super) fn generate_complaint_id(&mut self, new: &NewComplaint) -> Result<ComplaintId> {
        self.update_id_generator_if_needed();

        let id = self
            .id_generator
            .generate(
                &new.title,
                &new.description,
                new.created_by.as_ref().map(UserId::as_str),
            )
            .map_err(|e| StorageError::IdGeneration(e.to_string()))?;

        Ok(ComplaintId::new(id))
    }

    /// Allocate the next activity entry ID
    pub(super) fn next_activity_id(&mut self) -> String {
        let id = sequence_id(ACTIVITY_ID_PREFIX, self.next_activity);
        self.next_activity += 1;
        id
    }

    /// Allocate the next notification ID
    pub(super) fn next_notification_id(&mut self) -> String {
        let id = sequence_id(NOTIFICATION_ID_PREFIX, self.next_notification);
        self.next_notification += 1;
        id
    }

    /// Store a complaint that already has an ID (used when loading).
    pub(super) fn insert_complaint(&mut self, complaint: Complaint) {
        self.id_generator.register_id(complaint.id.as_str());
        if self
            .complaints
            .insert(complaint.id.clone(), complaint.clone())
            .is_none()
        {
            self.complaint_order.push(complaint.id);
        }
    }

    /// Store a user profile (used on registration and when loading).
    pub(super) fn insert_user(&mut self, user: UserProfile) {
        if self.users.insert(user.id.clone(), user.clone()).is_none() {
            self.user_order.push(user.id);
        }
    }

    /// Store an activity entry that already has an ID, keeping the sequence ahead of it.
    pub(super) fn insert_activity(&mut self, entry: ActivityLogEntry) {
        if let Some(n) = parse_sequence_id(ACTIVITY_ID_PREFIX, &entry.id) {
            self.next_activity = self.next_activity.max(n + 1);
        }
        self.activity.push(entry);
    }

    /// Store a notification that already has an ID, keeping the sequence ahead of it.
    pub(super) fn insert_notification(&mut self, notification: Notification) {
        if let Some(n) = parse_sequence_id(NOTIFICATION_ID_PREFIX, &notification.id) {
            self.next_notification = self.next_notification.max(n + 1);
        }
        self.notifications.push(notification);
    }

    /// Whether an email is already registered (case-insensitive).
    pub(super) fn email_taken(&self, email: &str) -> bool {
        self.users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// Derive an unused user ID from an email's local part.
    pub(super) fn user_id_from_email(&self, email: &str) -> UserId {
        let local = email.split('@').next().unwrap_or(email);
        let mut base: String = local
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        base = base.trim_matches('-').to_string();
        if base.is_empty() {
            base = "user".to_string();
        }

        let mut candidate = UserId::new(base.clone());
        let mut n = 2;
        while self.users.contains_key(&candidate) {
            candidate = UserId::new(format!("{base}-{n}"));
            n += 1;
        }
        candidate
    }

    /// Complaints in insertion order
    pub(super) fn complaints_in_order(&self) -> impl Iterator<Item = &Complaint> {
        self.complaint_order
            .iter()
            .filter_map(|id| self.complaints.get(id))
    }

    /// Users in registration order
    pub(super) fn users_in_order(&self) -> impl Iterator<Item = &UserProfile> {
        self.user_order.iter().filter_map(|id| self.users.get(id))
    }
}
