//! DeskStorage trait implementation for in-memory storage.

use super::InMemoryStorage;
use crate::domain::{
    ActivityLogEntry, Complaint, ComplaintFilter, ComplaintId, ComplaintPatch, ComplaintStatus,
    NewActivity, NewComplaint, NewNotification, NewUser, Notification, Role, UserId, UserProfile,
};
use crate::error::{Error, Result, StorageError};
use crate::storage::{DeskSnapshot, DeskStorage};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;

#[async_trait]
impl DeskStorage for InMemoryStorage {
    async fn create_complaint(&mut self, new: NewComplaint) -> Result<Complaint> {
        let mut inner = self.lock().await;

        // === Phase 1: validation (no mutations) ===
        new.validate().map_err(Error::Validation)?;

        // === Phase 2: ID generation ===
        let id = inner.generate_complaint_id(&new)?;

        // === Phase 3: store ===
        let now = Utc::now();
        let complaint = Complaint {
            id,
            title: new.title.trim().to_string(),
            description: new.description,
            category: new.category.trim().to_lowercase(),
            priority: new.priority,
            status: ComplaintStatus::Open,
            location: new
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            created_by: new.created_by,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            is_deleted: false,
            deleted_at: None,
        };

        inner.insert_complaint(complaint.clone());
        Ok(complaint)
    }

    async fn get_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>> {
        let inner = self.lock().await;
        Ok(inner.complaints.get(id).cloned())
    }

    async fn update_complaint(
        &mut self,
        id: &ComplaintId,
        patch: ComplaintPatch,
    ) -> Result<Complaint> {
        let mut inner = self.lock().await;

        let current = inner
            .complaints
            .get(id)
            .ok_or_else(|| Error::ComplaintNotFound(id.clone()))?;

        // Apply to a copy so a failed validation leaves the stored record untouched
        let mut updated = current.clone();
        patch.apply(&mut updated, Utc::now());
        updated.validate().map_err(Error::Validation)?;

        inner.complaints.insert(id.clone(), updated.clone());
        Ok(updated)
    }

    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        let inner = self.lock().await;

        // Reverse insertion order first so that equal timestamps list the
        // most recently filed complaint first.
        let mut complaints: Vec<Complaint> = inner
            .complaint_order
            .iter()
            .rev()
            .filter_map(|id| inner.complaints.get(id))
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        complaints.sort_by_key(|c| Reverse(c.created_at));

        if let Some(limit) = filter.limit {
            complaints.truncate(limit);
        }
        Ok(complaints)
    }

    async fn create_user(&mut self, new: NewUser) -> Result<UserProfile> {
        let mut inner = self.lock().await;

        new.validate().map_err(Error::Validation)?;
        let email = new.email.trim().to_string();
        if inner.email_taken(&email) {
            return Err(StorageError::Duplicate(format!("email {email}")).into());
        }

        let id = match new.id {
            Some(id) if inner.users.contains_key(&id) => {
                return Err(StorageError::Duplicate(format!("user {id}")).into());
            }
            Some(id) => id,
            None => inner.user_id_from_email(&email),
        };

        let user = UserProfile {
            id,
            full_name: new
                .full_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            email,
            role: new.role,
            created_at: Utc::now(),
        };

        inner.insert_user(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        let inner = self.lock().await;
        Ok(inner.users.get(id).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>> {
        let inner = self.lock().await;

        let mut users: Vec<UserProfile> = inner
            .users_in_order()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.role, u.created_at));
        Ok(users)
    }

    async fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityLogEntry> {
        let mut inner = self.lock().await;

        if entry.action.trim().is_empty() {
            return Err(Error::Validation("Activity action cannot be empty".to_string()));
        }

        let logged = ActivityLogEntry {
            id: inner.next_activity_id(),
            complaint_id: entry.complaint_id,
            action: entry.action,
            details: entry.details,
            performed_by: entry.performed_by,
            created_at: Utc::now(),
        };

        inner.activity.push(logged.clone());
        Ok(logged)
    }

    async fn activity_for(&self, complaint_id: &ComplaintId) -> Result<Vec<ActivityLogEntry>> {
        let inner = self.lock().await;

        let mut entries: Vec<ActivityLogEntry> = inner
            .activity
            .iter()
            .filter(|e| &e.complaint_id == complaint_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn all_activity(&self) -> Result<Vec<ActivityLogEntry>> {
        let inner = self.lock().await;

        let mut entries: Vec<ActivityLogEntry> = inner.activity.iter().rev().cloned().collect();
        entries.sort_by_key(|e| Reverse(e.created_at));
        Ok(entries)
    }

    async fn insert_notification(&mut self, new: NewNotification) -> Result<Notification> {
        let mut inner = self.lock().await;

        let notification = Notification {
            id: inner.next_notification_id(),
            user_id: new.user_id,
            title: new.title,
            message: new.message,
            kind: new.kind,
            complaint_id: new.complaint_id,
            is_read: false,
            created_at: Utc::now(),
        };

        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications_for(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>> {
        let inner = self.lock().await;

        let mut notifications: Vec<Notification> = inner
            .notifications
            .iter()
            .rev()
            .filter(|n| &n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by_key(|n| Reverse(n.created_at));

        if let Some(limit) = limit {
            notifications.truncate(limit);
        }
        Ok(notifications)
    }

    async fn mark_read(&mut self, notification_id: &str) -> Result<Notification> {
        let mut inner = self.lock().await;

        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| Error::NotificationNotFound(notification_id.to_string()))?;
        notification.is_read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&mut self, user_id: &UserId) -> Result<usize> {
        let mut inner = self.lock().await;

        let mut changed = 0;
        for notification in inner
            .notifications
            .iter_mut()
            .filter(|n| &n.user_id == user_id && !n.is_read)
        {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn export_all(&self) -> Result<DeskSnapshot> {
        let inner = self.lock().await;

        Ok(DeskSnapshot {
            users: inner.users_in_order().cloned().collect(),
            complaints: inner.complaints_in_order().cloned().collect(),
            activity: inner.activity.clone(),
            notifications: inner.notifications.clone(),
        })
    }

    async fn save(&self) -> Result<()> {
        // In-memory storage doesn't persist; use save_to_jsonl() for file output
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
