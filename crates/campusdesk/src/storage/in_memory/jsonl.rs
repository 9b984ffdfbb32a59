//! JSONL persistence for in-memory storage.
//!
//! Every record is written on its own line, tagged with its kind:
//!
//! ```text
//! {"kind":"user","id":"ada","email":"ada@campus.edu",...}
//! {"kind":"complaint","id":"desk-a3f8","title":"Broken projector",...}
//! {"kind":"activity","id":"act-1","complaint_id":"desk-a3f8",...}
//! {"kind":"notification","id":"ntf-1","user_id":"ada","type":"assignment",...}
//! ```
//!
//! Loading is resilient: lines that cannot be parsed or that fail validation
//! are skipped and reported as [`LoadWarning`]s instead of aborting the load.

use super::inner::InMemoryDeskInner;
use crate::domain::{ActivityLogEntry, Complaint, Notification, UserProfile};
use crate::error::{Error, Result, StorageError};
use crate::storage::DeskStorage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

/// One line of the data file.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record {
    User(UserProfile),
    Complaint(Complaint),
    Activity(ActivityLogEntry),
    Notification(Notification),
}

/// Borrowed form of [`Record`] used when writing.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordRef<'a> {
    User(&'a UserProfile),
    Complaint(&'a Complaint),
    Activity(&'a ActivityLogEntry),
    Notification(&'a Notification),
}

/// Non-fatal problems found while loading a JSONL file.
///
/// The offending line is skipped; everything else is still loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The line is not valid JSON or not a known record kind
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A complaint whose fields violate its invariants
    InvalidRecord {
        /// ID of the rejected record
        record_id: String,
        /// 1-based line number
        line_number: usize,
        /// Validation message
        error: String,
    },

    /// A record whose ID was already loaded from an earlier line
    DuplicateId {
        /// The repeated ID
        record_id: String,
        /// 1-based line number of the repeat
        line_number: usize,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed record skipped ({error})")
            }
            LoadWarning::InvalidRecord {
                record_id,
                line_number,
                error,
            } => write!(f, "line {line_number}: invalid record {record_id} skipped ({error})"),
            LoadWarning::DuplicateId {
                record_id,
                line_number,
            } => write!(f, "line {line_number}: duplicate ID {record_id} skipped"),
        }
    }
}

/// Load storage from a JSONL file.
///
/// # Returns
///
/// Returns a tuple of `(storage, warnings)` where warnings lists every line
/// that was skipped.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened or read.
pub async fn load_from_jsonl(
    path: &Path,
    prefix: String,
) -> Result<(Box<dyn DeskStorage>, Vec<LoadWarning>)> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut inner = InMemoryDeskInner::new(prefix);
    let mut warnings = Vec::new();
    let mut seen_activity = HashSet::new();
    let mut seen_notifications = HashSet::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<Record>(line) {
            Ok(record) => record,
            Err(e) => {
                warnings.push(LoadWarning::MalformedJson {
                    line_number,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let duplicate = |record_id: &str| LoadWarning::DuplicateId {
            record_id: record_id.to_string(),
            line_number,
        };

        match record {
            Record::User(user) => {
                if inner.users.contains_key(&user.id) {
                    warnings.push(duplicate(user.id.as_str()));
                } else {
                    inner.insert_user(user);
                }
            }
            Record::Complaint(complaint) => {
                if inner.complaints.contains_key(&complaint.id) {
                    warnings.push(duplicate(complaint.id.as_str()));
                } else if let Err(error) = complaint.validate() {
                    warnings.push(LoadWarning::InvalidRecord {
                        record_id: complaint.id.to_string(),
                        line_number,
                        error,
                    });
                } else {
                    inner.insert_complaint(complaint);
                }
            }
            Record::Activity(entry) => {
                if seen_activity.insert(entry.id.clone()) {
                    inner.insert_activity(entry);
                } else {
                    warnings.push(duplicate(&entry.id));
                }
            }
            Record::Notification(notification) => {
                if seen_notifications.insert(notification.id.clone()) {
                    inner.insert_notification(notification);
                } else {
                    warnings.push(duplicate(&notification.id));
                }
            }
        }
    }

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

/// Save storage to a JSONL file with atomic writes.
///
/// Records are written to a temporary file next to `path`, which is then
/// renamed over the original. If the process dies mid-write the original
/// file is left unchanged.
///
/// # Errors
///
/// Returns `Error::Io` if writing or renaming fails.
pub async fn save_to_jsonl(storage: &dyn DeskStorage, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("jsonl.tmp");
    let snapshot = storage.export_all().await?;

    let file = File::create(&temp_path).await.map_err(Error::Io)?;
    let mut writer = BufWriter::new(file);

    let records = snapshot
        .users
        .iter()
        .map(RecordRef::User)
        .chain(snapshot.complaints.iter().map(RecordRef::Complaint))
        .chain(snapshot.activity.iter().map(RecordRef::Activity))
        .chain(snapshot.notifications.iter().map(RecordRef::Notification));

    for record in records {
        let json = serde_json::to_string(&record).map_err(StorageError::Serialization)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    drop(writer);

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}
