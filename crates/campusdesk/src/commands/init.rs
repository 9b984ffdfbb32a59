//! Implementation of the `init` command and the workspace config file.
//!
//! `campusdesk init` creates a `.campusdesk/` directory holding
//! `config.yaml` and an empty `desk.jsonl` data file. Later commands find the
//! workspace by walking up from the current directory.

use crate::config::TenantSettings;
use crate::error::{ConfigError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default complaint ID prefix if none specified
pub const DEFAULT_PREFIX: &str = "desk";

/// Default tenant name if none specified
pub const DEFAULT_TENANT: &str = "Campus";

/// Name of the workspace directory
pub const DESK_DIR_NAME: &str = ".campusdesk";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the data file
pub const DATA_FILE_NAME: &str = "desk.jsonl";

/// Name of the gitignore file within `.campusdesk`
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Backend name for JSONL-persisted storage
pub const BACKEND_JSONL: &str = "jsonl";

/// Backend name for ephemeral storage
pub const BACKEND_MEMORY: &str = "memory";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeskConfig {
    /// Display name of the tenant (e.g., a university)
    pub tenant: String,

    /// Complaint ID prefix (e.g., "desk" for "desk-a3f8")
    #[serde(rename = "complaint-prefix")]
    pub complaint_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Tenant settings
    #[serde(default)]
    pub settings: TenantSettings,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage backend type ("jsonl" or "memory")
    pub backend: String,

    /// Path to the data file, relative to the workspace root
    pub data_file: String,
}

impl DeskConfig {
    /// Create a new configuration with default settings
    pub fn new(tenant: &str, prefix: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            complaint_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: BACKEND_JSONL.to_string(),
                data_file: format!("{DESK_DIR_NAME}/{DATA_FILE_NAME}"),
            },
            settings: TenantSettings::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// holds out-of-range settings.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content).map_err(ConfigError::Yaml)?;
        validate_prefix(&config.complaint_prefix)?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::Yaml)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Resolve the storage section into a backend rooted at `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unknown backend name.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StorageBackend> {
        match self.storage.backend.as_str() {
            BACKEND_JSONL => Ok(StorageBackend::Jsonl(root_dir.join(&self.storage.data_file))),
            BACKEND_MEMORY => Ok(StorageBackend::InMemory),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage backend '{other}' (expected '{BACKEND_JSONL}' or '{BACKEND_MEMORY}')"
            ))
            .into()),
        }
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT, DEFAULT_PREFIX)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created workspace directory
    pub desk_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created data file
    pub data_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
    /// The prefix used for complaint IDs
    pub prefix: String,
    /// The tenant name
    pub tenant: String,
}

/// Validate complaint ID prefix format.
///
/// Requirements:
/// - 2-20 characters
/// - Alphanumeric only (letters and digits)
///
/// Expects pre-trimmed input.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` describing the violated rule.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Invalid(
            "Prefix must contain only alphanumeric characters".to_string(),
        )
        .into());
    }

    Ok(())
}

/// Initialize a new workspace in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.campusdesk/` directory already exists
/// - The prefix is invalid or the tenant name is blank
/// - File system operations fail
pub async fn init(base_dir: &Path, tenant: Option<&str>, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let tenant = tenant.unwrap_or(DEFAULT_TENANT).trim();
    if tenant.is_empty() {
        return Err(ConfigError::Invalid("Tenant name cannot be empty".to_string()).into());
    }

    let desk_dir = base_dir.join(DESK_DIR_NAME);
    if desk_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(DESK_DIR_NAME.to_string()).into());
    }

    fs::create_dir_all(&desk_dir).await?;

    let config_file = desk_dir.join(CONFIG_FILE_NAME);
    DeskConfig::new(tenant, prefix).save(&config_file).await?;

    let data_file = desk_dir.join(DATA_FILE_NAME);
    fs::write(&data_file, "").await?;

    let gitignore_file = desk_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# campusdesk scratch files
*.tmp
";
    fs::write(&gitignore_file, gitignore_content).await?;

    Ok(InitResult {
        desk_dir,
        config_file,
        data_file,
        gitignore_file,
        prefix: prefix.to_string(),
        tenant: tenant.to_string(),
    })
}

/// Check if a directory has been initialized.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(DESK_DIR_NAME).exists()
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.campusdesk/`, or `None` if the
/// filesystem root or the depth limit is reached first.
pub fn find_desk_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(DESK_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
