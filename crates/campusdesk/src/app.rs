//! Workspace context shared by CLI commands.
//!
//! An [`App`] owns the loaded configuration and the storage backend for one
//! `.campusdesk/` workspace, and resolves the acting user into a [`Session`].
//!
//! # Example
//!
//! ```no_run
//! use campusdesk::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("{}", app.config().tenant);
//!     Ok(())
//! }
//! ```

use crate::commands::init::{CONFIG_FILE_NAME, DESK_DIR_NAME, DeskConfig, find_desk_root};
use crate::config::TenantSettings;
use crate::domain::{Session, UserId};
use crate::error::{ConfigError, Error, Result};
use crate::storage::{DeskStorage, create_storage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A loaded workspace: configuration plus storage.
pub struct App {
    storage: Box<dyn DeskStorage>,

    config: DeskConfig,

    /// Path to the `.campusdesk` directory
    desk_dir: PathBuf,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("desk_dir", &self.desk_dir)
            .field("tenant", &self.config.tenant)
            .field("storage", &"<dyn DeskStorage>")
            .finish_non_exhaustive()
    }
}

impl App {
    /// Open the workspace containing `working_dir`.
    ///
    /// Walks up the directory tree to the nearest `.campusdesk/`, loads its
    /// config and opens the configured storage backend.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NotInitialized` if no workspace is found
    /// - config load or validation errors
    /// - storage errors while loading the data file
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_desk_root(working_dir).ok_or(ConfigError::NotInitialized)?;
        let desk_dir = root_dir.join(DESK_DIR_NAME);

        let config = DeskConfig::load(&desk_dir.join(CONFIG_FILE_NAME)).await?;
        let backend = config.to_backend(&root_dir)?;
        debug!(?backend, tenant = %config.tenant, "Opening workspace");
        let storage = create_storage(backend, config.complaint_prefix.clone()).await?;

        Ok(Self {
            storage,
            config,
            desk_dir,
        })
    }

    /// Read access to the store.
    pub fn storage(&self) -> &dyn DeskStorage {
        self.storage.as_ref()
    }

    /// Write access to the store.
    pub fn storage_mut(&mut self) -> &mut dyn DeskStorage {
        self.storage.as_mut()
    }

    /// The loaded workspace configuration.
    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    /// Tenant settings from the config.
    pub fn settings(&self) -> &TenantSettings {
        &self.config.settings
    }

    /// Mutable tenant settings. Call [`App::save_config`] afterwards.
    pub fn settings_mut(&mut self) -> &mut TenantSettings {
        &mut self.config.settings
    }

    /// Store and settings together, for operations that write to the store
    /// while reading settings.
    pub fn parts_mut(&mut self) -> (&mut dyn DeskStorage, &TenantSettings) {
        (self.storage.as_mut(), &self.config.settings)
    }

    /// Path to the `.campusdesk` directory.
    pub fn desk_dir(&self) -> &Path {
        &self.desk_dir
    }

    /// Resolve the acting user.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NoSessionUser` when `user_id` is `None`
    /// - `UserNotFound` if nobody has that ID
    pub async fn session(&self, user_id: Option<&str>) -> Result<Session> {
        let user_id = UserId::new(user_id.ok_or(ConfigError::NoSessionUser)?.trim());
        let user = self
            .storage
            .get_user(&user_id)
            .await?
            .ok_or(Error::UserNotFound(user_id))?;
        Ok(Session::new(user))
    }

    /// Persist the store.
    pub async fn save(&self) -> Result<()> {
        self.storage.save().await
    }

    /// Persist the configuration file.
    pub async fn save_config(&self) -> Result<()> {
        self.config.save(&self.desk_dir.join(CONFIG_FILE_NAME)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use crate::domain::{NewUser, Role};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_from_initialized_directory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("North Campus"), Some("nc"))
            .await
            .unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.config().complaint_prefix, "nc");
        assert_eq!(app.config().tenant, "North Campus");
        assert!(app.desk_dir().ends_with(".campusdesk"));
    }

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None, Some("hall")).await.unwrap();
        let sub_dir = temp_dir.path().join("block-a").join("floor-2");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let app = App::from_directory(&sub_dir).await.unwrap();
        assert_eq!(app.config().complaint_prefix, "hall");
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a campusdesk workspace"));
    }

    #[tokio::test]
    async fn test_session_resolution() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None, None).await.unwrap();
        let mut app = App::from_directory(temp_dir.path()).await.unwrap();

        app.storage_mut()
            .create_user(NewUser {
                id: Some(UserId::new("ada")),
                full_name: Some("Ada Admin".to_string()),
                email: "ada@campus.edu".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let session = app.session(Some("ada")).await.unwrap();
        assert_eq!(session.role(), Role::Admin);

        assert!(matches!(
            app.session(None).await,
            Err(Error::Config(ConfigError::NoSessionUser))
        ));
        assert!(matches!(
            app.session(Some("ghost")).await,
            Err(Error::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_saved_settings_survive_reload() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), None, None).await.unwrap();

        let mut app = App::from_directory(temp_dir.path()).await.unwrap();
        app.settings_mut().set_max_load(4).unwrap();
        app.save_config().await.unwrap();

        let reopened = App::from_directory(temp_dir.path()).await.unwrap();
        assert_eq!(reopened.settings().max_load, 4);
    }
}
