//! In-memory storage backend.
//!
//! All data is held in RAM and **lost when the process exits** unless it is
//! written out with [`save_to_jsonl`]. The JSONL-backed backend created by
//! [`crate::storage::create_storage`] wraps this store and calls
//! [`load_from_jsonl`] / [`save_to_jsonl`] for persistence.
//!
//! # Thread Safety
//!
//! The storage is wrapped in `Arc<Mutex<InMemoryDeskInner>>`. Each trait call
//! takes the lock exactly once, so a single call is atomic with respect to
//! other calls, but a sequence of calls is not.

mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::DeskStorage;
use inner::InMemoryDeskInner;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Thread-safe in-memory storage.
pub(crate) type InMemoryStorage = Arc<Mutex<InMemoryDeskInner>>;

/// Create a new in-memory storage instance.
///
/// # Arguments
///
/// * `prefix` - The prefix for complaint IDs (e.g., "desk")
///
/// # Example
///
/// ```
/// use campusdesk::storage::in_memory::new_in_memory_storage;
///
/// let storage = new_in_memory_storage("desk".to_string());
/// ```
pub fn new_in_memory_storage(prefix: String) -> Box<dyn DeskStorage> {
    Box::new(Arc::new(Mutex::new(InMemoryDeskInner::new(prefix))))
}
