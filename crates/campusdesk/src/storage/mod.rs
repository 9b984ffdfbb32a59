//! Storage abstraction layer for campusdesk.
//!
//! This module provides the core storage trait and factory for creating
//! storage backends:
//!
//! - **In-memory**: ephemeral storage backed by hash maps
//! - **JSONL**: the in-memory store persisted to a JSON Lines file
//!
//! # Architecture
//!
//! The storage layer is an async, object-safe trait so that callers can hold a
//! `Box<dyn DeskStorage>` regardless of the backend. The store enforces record
//! invariants (IDs, timestamps, validation of new records); authorization and
//! workflow rules live in [`crate::desk`].
//!
//! # Test Utilities
//!
//! With the `test-util` feature (or under `cfg(test)`), [`FaultyStorage`]
//! wraps any backend and fails selected operations on demand.
//!
//! # Example
//!
//! ```no_run
//! use campusdesk::domain::{NewComplaint, Priority};
//! use campusdesk::storage::{DeskStorage, StorageBackend, create_storage};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut storage = create_storage(StorageBackend::InMemory, "desk".to_string()).await?;
//!
//!     let complaint = storage
//!         .create_complaint(NewComplaint {
//!             title: "No hot water".to_string(),
//!             description: "Hostel C showers are cold".to_string(),
//!             category: "Plumbing".to_string(),
//!             priority: Priority::High,
//!             location: Some("Hostel C".to_string()),
//!             created_by: None,
//!         })
//!         .await?;
//!     println!("Filed complaint: {}", complaint.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{
    ActivityLogEntry, Complaint, ComplaintFilter, ComplaintId, ComplaintPatch, NewActivity,
    NewComplaint, NewNotification, NewUser, Notification, Role, UserId, UserProfile,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod in_memory;

/// Core storage trait for the complaint desk.
///
/// Implementations must be `Send + Sync`. Mutating methods take `&mut self`;
/// `save` takes `&self` and relies on interior mutability.
///
/// # Method Categories
///
/// - **Complaints**: `create_complaint`, `get_complaint`, `update_complaint`,
///   `list_complaints`
/// - **Users**: `create_user`, `get_user`, `list_users`
/// - **Activity**: `append_activity`, `activity_for`, `all_activity`
/// - **Notifications**: `insert_notification`, `notifications_for`,
///   `mark_read`, `mark_all_read`
/// - **Batch Operations**: `export_all`
/// - **Persistence**: `save`, `reload`
#[async_trait]
pub trait DeskStorage: Send + Sync {
    // ========== Complaints ==========

    /// File a new complaint.
    ///
    /// Generates the ID, lower-cases the category, and stamps `created_at`
    /// and `updated_at`. New complaints are always open and unassigned.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the title or description is invalid.
    async fn create_complaint(&mut self, complaint: NewComplaint) -> Result<Complaint>;

    /// Get a complaint by ID, including soft-deleted ones.
    async fn get_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>>;

    /// Apply a partial update and return the updated complaint.
    ///
    /// # Errors
    ///
    /// Returns `Error::ComplaintNotFound` if the complaint doesn't exist.
    async fn update_complaint(&mut self, id: &ComplaintId, patch: ComplaintPatch)
    -> Result<Complaint>;

    /// List complaints matching the filter, newest first.
    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>>;

    // ========== Users ==========

    /// Register a user profile.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a malformed email or ID, and
    /// `StorageError::Duplicate` when the ID or email is taken.
    async fn create_user(&mut self, user: NewUser) -> Result<UserProfile>;

    /// Get a user by ID.
    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>>;

    /// List users, optionally restricted to one role.
    ///
    /// Ordered by role, then by registration time.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>>;

    // ========== Activity ==========

    /// Append an entry to the activity log.
    async fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityLogEntry>;

    /// Activity for one complaint, oldest first.
    async fn activity_for(&self, complaint_id: &ComplaintId) -> Result<Vec<ActivityLogEntry>>;

    /// The whole activity log, newest first.
    async fn all_activity(&self) -> Result<Vec<ActivityLogEntry>>;

    // ========== Notifications ==========

    /// Deliver a notification.
    async fn insert_notification(&mut self, notification: NewNotification)
    -> Result<Notification>;

    /// A user's notifications, newest first, at most `limit` of them.
    async fn notifications_for(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>>;

    /// Mark one notification as read.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotificationNotFound` if the ID is unknown.
    async fn mark_read(&mut self, notification_id: &str) -> Result<Notification>;

    /// Mark all of a user's notifications as read, returning how many changed.
    async fn mark_all_read(&mut self, user_id: &UserId) -> Result<usize>;

    // ========== Batch Operations ==========

    /// Every stored record, in storage order.
    ///
    /// Used for JSONL persistence and bulk exports.
    async fn export_all(&self) -> Result<DeskSnapshot>;

    // ========== Persistence ==========

    /// Write pending changes to persistent storage.
    ///
    /// A no-op for purely in-memory storage.
    async fn save(&self) -> Result<()>;

    /// Discard in-memory changes and re-read persistent state.
    ///
    /// A no-op for purely in-memory storage.
    async fn reload(&mut self) -> Result<()>;
}

/// A full copy of a store's contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeskSnapshot {
    /// User profiles in registration order
    pub users: Vec<UserProfile>,

    /// Complaints in filing order, including soft-deleted ones
    pub complaints: Vec<Complaint>,

    /// Activity log in append order
    pub activity: Vec<ActivityLogEntry>,

    /// Notifications in delivery order
    pub notifications: Vec<Notification>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// In-memory storage persisted to a JSONL file
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// The data file path for file-based backends.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// Wrapper that adds JSONL file persistence to the in-memory store.
struct JsonlBackedStorage {
    inner: Box<dyn DeskStorage>,
    path: PathBuf,
    prefix: String,
}

impl JsonlBackedStorage {
    async fn open(path: PathBuf, prefix: String) -> Result<Self> {
        let inner = load_or_empty(&path, &prefix).await?;
        Ok(Self {
            inner,
            path,
            prefix,
        })
    }
}

async fn load_or_empty(path: &Path, prefix: &str) -> Result<Box<dyn DeskStorage>> {
    if !path.exists() {
        return Ok(in_memory::new_in_memory_storage(prefix.to_string()));
    }

    let (storage, warnings) = in_memory::load_from_jsonl(path, prefix.to_string()).await?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, path = %path.display(), "JSONL load warning");
    }
    Ok(storage)
}

#[async_trait]
impl DeskStorage for JsonlBackedStorage {
    async fn create_complaint(&mut self, complaint: NewComplaint) -> Result<Complaint> {
        self.inner.create_complaint(complaint).await
    }

    async fn get_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>> {
        self.inner.get_complaint(id).await
    }

    async fn update_complaint(
        &mut self,
        id: &ComplaintId,
        patch: ComplaintPatch,
    ) -> Result<Complaint> {
        self.inner.update_complaint(id, patch).await
    }

    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        self.inner.list_complaints(filter).await
    }

    async fn create_user(&mut self, user: NewUser) -> Result<UserProfile> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        self.inner.get_user(id).await
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>> {
        self.inner.list_users(role).await
    }

    async fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityLogEntry> {
        self.inner.append_activity(entry).await
    }

    async fn activity_for(&self, complaint_id: &ComplaintId) -> Result<Vec<ActivityLogEntry>> {
        self.inner.activity_for(complaint_id).await
    }

    async fn all_activity(&self) -> Result<Vec<ActivityLogEntry>> {
        self.inner.all_activity().await
    }

    async fn insert_notification(
        &mut self,
        notification: NewNotification,
    ) -> Result<Notification> {
        self.inner.insert_notification(notification).await
    }

    async fn notifications_for(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>> {
        self.inner.notifications_for(user_id, limit).await
    }

    async fn mark_read(&mut self, notification_id: &str) -> Result<Notification> {
        self.inner.mark_read(notification_id).await
    }

    async fn mark_all_read(&mut self, user_id: &UserId) -> Result<usize> {
        self.inner.mark_all_read(user_id).await
    }

    async fn export_all(&self) -> Result<DeskSnapshot> {
        self.inner.export_all().await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = load_or_empty(&self.path, &self.prefix).await?;
        Ok(())
    }
}

/// Create a storage instance for the given backend.
///
/// # Arguments
///
/// * `backend` - The storage backend to use
/// * `prefix` - The prefix for generated complaint IDs (e.g., "desk")
///
/// # Errors
///
/// Returns an error if an existing JSONL file cannot be read.
pub async fn create_storage(
    backend: StorageBackend,
    prefix: String,
) -> Result<Box<dyn DeskStorage>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_storage(prefix)),
        StorageBackend::Jsonl(path) => {
            Ok(Box::new(JsonlBackedStorage::open(path, prefix).await?))
        }
    }
}

// ========== Test Utilities ==========

/// Store operations that [`FaultyStorage`] can be told to fail.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `create_complaint`
    CreateComplaint,
    /// `update_complaint`
    UpdateComplaint,
    /// `append_activity`
    AppendActivity,
    /// `insert_notification`
    InsertNotification,
    /// `save`
    Save,
}

/// Wraps a real backend and fails selected operations.
///
/// Reads always pass through. Used to exercise partial-failure paths of
/// desk operations.
///
/// ```rust,ignore
/// use campusdesk::storage::{FaultPoint, FaultyStorage, in_memory::new_in_memory_storage};
///
/// let mut store = FaultyStorage::new(new_in_memory_storage("desk".to_string()));
/// store.fail(FaultPoint::InsertNotification);
/// ```
#[cfg(any(test, feature = "test-util"))]
pub struct FaultyStorage {
    inner: Box<dyn DeskStorage>,
    failing: std::collections::HashSet<FaultPoint>,
}

#[cfg(any(test, feature = "test-util"))]
impl FaultyStorage {
    /// Wrap `inner` with no failures armed.
    pub fn new(inner: Box<dyn DeskStorage>) -> Self {
        Self {
            inner,
            failing: std::collections::HashSet::new(),
        }
    }

    /// Make every call to `point` fail from now on.
    pub fn fail(&mut self, point: FaultPoint) {
        self.failing.insert(point);
    }

    /// Stop failing `point`.
    pub fn heal(&mut self, point: FaultPoint) {
        self.failing.remove(&point);
    }

    fn check(&self, point: FaultPoint) -> Result<()> {
        if self.failing.contains(&point) {
            Err(crate::error::StorageError::Backend(format!("injected failure at {point:?}")).into())
        } else {
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl DeskStorage for FaultyStorage {
    async fn create_complaint(&mut self, complaint: NewComplaint) -> Result<Complaint> {
        self.check(FaultPoint::CreateComplaint)?;
        self.inner.create_complaint(complaint).await
    }

    async fn get_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>> {
        self.inner.get_complaint(id).await
    }

    async fn update_complaint(
        &mut self,
        id: &ComplaintId,
        patch: ComplaintPatch,
    ) -> Result<Complaint> {
        self.check(FaultPoint::UpdateComplaint)?;
        self.inner.update_complaint(id, patch).await
    }

    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        self.inner.list_complaints(filter).await
    }

    async fn create_user(&mut self, user: NewUser) -> Result<UserProfile> {
        self.inner.create_user(user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        self.inner.get_user(id).await
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>> {
        self.inner.list_users(role).await
    }

    async fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityLogEntry> {
        self.check(FaultPoint::AppendActivity)?;
        self.inner.append_activity(entry).await
    }

    async fn activity_for(&self, complaint_id: &ComplaintId) -> Result<Vec<ActivityLogEntry>> {
        self.inner.activity_for(complaint_id).await
    }

    async fn all_activity(&self) -> Result<Vec<ActivityLogEntry>> {
        self.inner.all_activity().await
    }

    async fn insert_notification(
        &mut self,
        notification: NewNotification,
    ) -> Result<Notification> {
        self.check(FaultPoint::InsertNotification)?;
        self.inner.insert_notification(notification).await
    }

    async fn notifications_for(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>> {
        self.inner.notifications_for(user_id, limit).await
    }

    async fn mark_read(&mut self, notification_id: &str) -> Result<Notification> {
        self.inner.mark_read(notification_id).await
    }

    async fn mark_all_read(&mut self, user_id: &UserId) -> Result<usize> {
        self.inner.mark_all_read(user_id).await
    }

    async fn export_all(&self) -> Result<DeskSnapshot> {
        self.inner.export_all().await
    }

    async fn save(&self) -> Result<()> {
        self.check(FaultPoint::Save)?;
        self.inner.save().await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComplaintStatus, Priority};
    use tempfile::TempDir;

    fn new_complaint(title: &str) -> NewComplaint {
        NewComplaint {
            title: title.to_string(),
            description: "Details".to_string(),
            category: "Internet".to_string(),
            priority: Priority::Low,
            location: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_trait_object_usage() {
        let mut storage = create_storage(StorageBackend::InMemory, "desk".to_string())
            .await
            .unwrap();
        let created = storage
            .create_complaint(new_complaint("Wifi drops"))
            .await
            .unwrap();
        let fetched = storage.get_complaint(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.category, "internet");
        assert_eq!(fetched.status, ComplaintStatus::Open);
    }

    #[tokio::test]
    async fn test_jsonl_backend_save_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.jsonl");

        let mut storage = create_storage(StorageBackend::Jsonl(path.clone()), "desk".to_string())
            .await
            .unwrap();
        let created = storage
            .create_complaint(new_complaint("Router reboot loop"))
            .await
            .unwrap();
        storage.save().await.unwrap();

        let reopened = create_storage(StorageBackend::Jsonl(path), "desk".to_string())
            .await
            .unwrap();
        let fetched = reopened.get_complaint(&created.id).await.unwrap();
        assert_eq!(fetched.map(|c| c.title), Some("Router reboot loop".to_string()));
    }

    #[tokio::test]
    async fn test_snapshot_matches_after_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.jsonl");

        let mut storage = create_storage(StorageBackend::Jsonl(path.clone()), "desk".to_string())
            .await
            .unwrap();
        storage
            .create_complaint(new_complaint("Port dead"))
            .await
            .unwrap();
        storage.save().await.unwrap();
        let before = storage.export_all().await.unwrap();

        let reopened = create_storage(StorageBackend::Jsonl(path), "desk".to_string())
            .await
            .unwrap();
        let after = reopened.export_all().await.unwrap();
        assert_eq!(before, after);
        assert_ne!(after, DeskSnapshot::default());
    }

    #[tokio::test]
    async fn test_jsonl_reload_discards_unsaved_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("desk.jsonl");

        let mut storage = create_storage(StorageBackend::Jsonl(path), "desk".to_string())
            .await
            .unwrap();
        let kept = storage.create_complaint(new_complaint("Kept")).await.unwrap();
        storage.save().await.unwrap();
        let dropped = storage
            .create_complaint(new_complaint("Dropped"))
            .await
            .unwrap();

        storage.reload().await.unwrap();
        assert!(storage.get_complaint(&kept.id).await.unwrap().is_some());
        assert!(storage.get_complaint(&dropped.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_faulty_storage_fails_only_armed_points() {
        let mut storage = FaultyStorage::new(in_memory::new_in_memory_storage("desk".to_string()));
        storage.fail(FaultPoint::CreateComplaint);
        assert!(storage.create_complaint(new_complaint("A")).await.is_err());

        storage.heal(FaultPoint::CreateComplaint);
        assert!(storage.create_complaint(new_complaint("A")).await.is_ok());
    }

    #[test]
    fn test_data_path() {
        assert!(StorageBackend::InMemory.data_path().is_none());
        let backend = StorageBackend::Jsonl(PathBuf::from("x.jsonl"));
        assert_eq!(backend.data_path(), Some(Path::new("x.jsonl")));
    }
}
