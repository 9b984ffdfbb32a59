//! Hash-based complaint ID generation.
//!
//! Complaint IDs have the form `{prefix}-{hash}` (e.g. `desk-a3f8`), where the
//! hash is a base36 rendering of a SHA-256 digest over the complaint's title,
//! description, reporter, timestamp and a retry nonce.
//!
//! The hash length adapts to the number of stored complaints (4-6
//! characters) so short IDs stay short while large tenants stay
//! collision-free.
//!
//! Activity entries and notifications use plain sequence IDs instead; see
//! [`sequence_id`].
//!
//! # Example
//!
//! ```
//! use campusdesk::id_generation::{IdGenerator, IdGeneratorConfig};
//!
//! let mut generator = IdGenerator::new(IdGeneratorConfig {
//!     prefix: "desk".to_string(),
//!     database_size: 12,
//! });
//!
//! let id = generator
//!     .generate("Broken projector", "Room 204 projector shows no image", Some("stu-1"))
//!     .unwrap();
//! assert!(id.starts_with("desk-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_HASH_LENGTH: usize = 6;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce collided, even at the longest hash length
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },

    /// Requested a zero-length hash
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all complaint IDs (e.g., "desk")
    pub prefix: String,

    /// Number of complaints already stored (drives the adaptive length)
    pub database_size: usize,
}

/// Hash-based ID generator with collision detection.
///
/// Every generated or registered ID is remembered so that later calls never
/// hand out a duplicate.
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.existing_ids.insert(id.into());
    }

    /// The database size this generator was configured with
    pub fn database_size(&self) -> usize {
        self.config.database_size
    }

    /// Generate a new unique complaint ID.
    ///
    /// # Errors
    ///
    /// Returns an error if every nonce collides at the maximum hash length.
    pub fn generate(
        &mut self,
        title: &str,
        description: &str,
        reporter: Option<&str>,
    ) -> Result<String, IdGenerationError> {
        let mut length = self.adaptive_length();

        loop {
            for nonce in 0..MAX_NONCE {
                let id = self.hash_id(title, description, reporter, nonce, length)?;
                if self.existing_ids.insert(id.clone()) {
                    if nonce > 0 {
                        debug!(nonce, length, "Generated unique ID after collision retries");
                    }
                    return Ok(id);
                }
            }

            if length >= MAX_HASH_LENGTH {
                return Err(IdGenerationError::CollisionExhausted {
                    attempts: MAX_NONCE,
                });
            }
            warn!(length, "All nonces exhausted, increasing ID length");
            length += 1;
        }
    }

    fn hash_id(
        &self,
        title: &str,
        description: &str,
        reporter: Option<&str>,
        nonce: u32,
        length: usize,
    ) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_millis();
        let content = format!(
            "{title}|{description}|{}|{timestamp}|{nonce}",
            reporter.unwrap_or("")
        );

        let digest = Sha256::digest(content.as_bytes());
        let hash = encode_base36(&digest[..8], length)?;

        Ok(format!("{}-{hash}", self.config.prefix))
    }

    /// Hash length for the configured database size:
    /// up to 500 complaints use 4 chars, up to 1,500 use 5, beyond that 6.
    fn adaptive_length(&self) -> usize {
        match self.config.database_size {
            0..=500 => 4,
            501..=1500 => 5,
            _ => MAX_HASH_LENGTH,
        }
    }
}

/// Encode up to 8 bytes as a fixed-length base36 string.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut n = bytes
        .iter()
        .fold(0u64, |acc, &byte| acc.wrapping_shl(8).wrapping_add(u64::from(byte)));

    let mut digits = Vec::with_capacity(length);
    while digits.len() < length {
        // n % 36 always fits in usize
        #[allow(clippy::cast_possible_truncation)]
        let remainder = (n % 36) as usize;
        digits.push(char::from(BASE36_CHARS[remainder]));
        n /= 36;
    }

    Ok(digits.into_iter().rev().collect())
}

/// Format a sequential record ID such as `act-12` or `ntf-3`.
pub fn sequence_id(prefix: &str, n: u64) -> String {
    format!("{prefix}-{n}")
}

/// Parse the counter back out of a sequential ID produced by [`sequence_id`].
pub fn parse_sequence_id(prefix: &str, id: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

/// Check that `id` looks like `{prefix}-{hash}` with a 4-6 char base36 hash.
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(hash) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    (4..=MAX_HASH_LENGTH).contains(&hash.len())
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}
