//! The session user's notifications.

use crate::domain::{Notification, Session};
use crate::error::{Error, Result};
use crate::storage::DeskStorage;

/// Number of notifications shown when no limit is given.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 20;

/// The session user's notifications, newest first.
pub async fn notifications(
    store: &dyn DeskStorage,
    session: &Session,
    limit: Option<usize>,
) -> Result<Vec<Notification>> {
    store
        .notifications_for(
            session.user_id(),
            Some(limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT)),
        )
        .await
}

/// Number of unread notifications for the session user.
pub async fn unread_count(store: &dyn DeskStorage, session: &Session) -> Result<usize> {
    Ok(store
        .notifications_for(session.user_id(), None)
        .await?
        .iter()
        .filter(|n| !n.is_read)
        .count())
}

/// Mark one of the session user's notifications as read.
///
/// # Errors
///
/// Returns `NotificationNotFound` if the ID is unknown or belongs to someone
/// else.
pub async fn mark_read(
    store: &mut dyn DeskStorage,
    session: &Session,
    notification_id: &str,
) -> Result<Notification> {
    let owned = store
        .notifications_for(session.user_id(), None)
        .await?
        .iter()
        .any(|n| n.id == notification_id);
    if !owned {
        return Err(Error::NotificationNotFound(notification_id.to_string()));
    }
    store.mark_read(notification_id).await
}

/// Mark all of the session user's notifications as read.
pub async fn mark_all_read(store: &mut dyn DeskStorage, session: &Session) -> Result<usize> {
    store.mark_all_read(session.user_id()).await
}
