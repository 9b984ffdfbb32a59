//! Error types for campusdesk operations.

use crate::domain::{ComplaintId, ComplaintStatus, Role, UserId};
use std::io;
use thiserror::Error;

/// The error type for campusdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Input failed validation before reaching the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Complaint not found.
    #[error("Complaint not found: {0}")]
    ComplaintNotFound(ComplaintId),

    /// User profile not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Notification not found.
    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    /// The session's role may not perform this action.
    #[error("Permission denied: {role} cannot {action}")]
    PermissionDenied {
        /// Role of the acting user
        role: Role,
        /// Human-readable description of the attempted action
        action: &'static str,
    },

    /// Status change that the workflow does not allow.
    #[error("Cannot move complaint from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: ComplaintStatus,
        /// Requested status
        to: ComplaintStatus,
    },

    /// The chosen technician already carries the maximum caseload.
    #[error("{technician} already has {active} active complaints (limit {max_load})")]
    TechnicianAtCapacity {
        /// Display name of the technician
        technician: String,
        /// Current active complaint count
        active: usize,
        /// Configured caseload cap
        max_load: usize,
    },

    /// Every technician is at or above the caseload cap.
    #[error("No technician is below the caseload limit of {max_load}")]
    NoTechnicianAvailable {
        /// Configured caseload cap
        max_load: usize,
    },

    /// The user exists but is not a technician.
    #[error("User {0} is not a technician")]
    NotATechnician(UserId),

    /// The complaint is soft-deleted and cannot be modified.
    #[error("Complaint {0} has been deleted")]
    ComplaintDeleted(ComplaintId),

    /// A side effect failed while running in strict mode.
    #[error("Side effect '{step}' failed: {reason}")]
    SideEffectFailed {
        /// Description of the failed step
        step: String,
        /// Underlying failure message
        reason: String,
    },
}

impl Error {
    /// Returns `true` for errors raised before any store call was made.
    ///
    /// These correspond to user mistakes (bad input, missing permission,
    /// over-capacity assignment) and never leave partial state behind.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::PermissionDenied { .. }
                | Error::InvalidTransition { .. }
                | Error::TechnicianAtCapacity { .. }
                | Error::NoTechnicianAvailable { .. }
                | Error::NotATechnician(_)
                | Error::ComplaintDeleted(_)
        )
    }
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to serialize a record.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing file is not in the expected format.
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// A record with the same ID already exists.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// ID generation failed.
    #[error("ID generation failed: {0}")]
    IdGeneration(String),

    /// The backend refused or failed the operation.
    #[error("Storage backend failure: {0}")]
    Backend(String),

    /// The requested backend has no implementation.
    #[error("Storage backend not supported: {0}")]
    Unsupported(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.campusdesk/` directory in the current tree.
    #[error("Not a campusdesk workspace (or any parent directory). Run 'campusdesk init' first.")]
    NotInitialized,

    /// Workspace already exists.
    #[error("campusdesk is already initialized here. Found existing '{0}'")]
    AlreadyInitialized(String),

    /// The YAML file could not be parsed or written.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No acting user was given.
    #[error("No acting user. Pass --as <user-id> or set CAMPUSDESK_USER.")]
    NoSessionUser,
}

/// A specialized Result type for campusdesk operations.
pub type Result<T> = std::result::Result<T, Error>;
