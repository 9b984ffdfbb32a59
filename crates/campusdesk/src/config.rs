//! Tenant settings.
//!
//! A campusdesk workspace serves exactly one tenant. Its settings (SLA hours,
//! complaint categories, the technician caseload cap and how side-effect
//! failures are handled) live in the `settings` section of
//! `.campusdesk/config.yaml`.

use crate::domain::{DEFAULT_CATEGORIES, Priority};
use crate::effects::EffectMode;
use crate::error::{ConfigError, Error, Result};
use crate::policy::{AssignmentPolicy, DEFAULT_MAX_LOAD, SlaPolicy};
use serde::{Deserialize, Serialize};

/// Longest accepted category name
pub const MAX_CATEGORY_LENGTH: usize = 50;

/// Per-tenant configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Deadline hours per priority
    #[serde(default)]
    pub sla_hours: SlaPolicy,

    /// Complaint categories offered when filing (display casing preserved)
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Maximum active complaints per technician
    #[serde(default = "default_max_load")]
    pub max_load: usize,

    /// What to do when an activity entry or notification cannot be written
    #[serde(default)]
    pub side_effects: EffectMode,
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect()
}

fn default_max_load() -> usize {
    DEFAULT_MAX_LOAD
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            sla_hours: SlaPolicy::default(),
            categories: default_categories(),
            max_load: DEFAULT_MAX_LOAD,
            side_effects: EffectMode::default(),
        }
    }
}

impl TenantSettings {
    /// Check every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        self.sla_hours.validate().map_err(ConfigError::Invalid)?;
        if self.max_load == 0 {
            return Err(ConfigError::Invalid("max_load must be at least 1".to_string()).into());
        }
        if self.categories.is_empty() {
            return Err(
                ConfigError::Invalid("at least one category is required".to_string()).into(),
            );
        }
        let mut seen = std::collections::HashSet::new();
        for category in &self.categories {
            if category.trim().is_empty() {
                return Err(ConfigError::Invalid("category names cannot be blank".to_string()).into());
            }
            if !seen.insert(category.trim().to_lowercase()) {
                return Err(ConfigError::Invalid(format!("duplicate category '{category}'")).into());
            }
        }
        Ok(())
    }

    /// The configured category matching `name` case-insensitively.
    pub fn find_category(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|c| c.trim().eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Add a category.
    ///
    /// Returns `false` when a category with the same name (ignoring case)
    /// already exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank or overly long name.
    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Category name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_CATEGORY_LENGTH {
            return Err(Error::Validation(format!(
                "Category name cannot exceed {MAX_CATEGORY_LENGTH} characters"
            )));
        }
        if self.find_category(name).is_some() {
            return Ok(false);
        }
        self.categories.push(name.to_string());
        Ok(true)
    }

    /// Remove a category (matched case-insensitively).
    ///
    /// Existing complaints keep their category.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the category is unknown or is the last one.
    pub fn remove_category(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        let Some(index) = self
            .categories
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name))
        else {
            return Err(Error::Validation(format!("Unknown category '{name}'")));
        };
        if self.categories.len() == 1 {
            return Err(Error::Validation(
                "Cannot remove the last category".to_string(),
            ));
        }
        Ok(self.categories.remove(index))
    }

    /// Set the deadline for one priority.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when `hours` is zero.
    pub fn set_sla_hours(&mut self, priority: Priority, hours: u32) -> Result<()> {
        if hours == 0 {
            return Err(Error::Validation(format!(
                "SLA hours for {priority} must be at least 1"
            )));
        }
        self.sla_hours.set_hours(priority, hours);
        Ok(())
    }

    /// Set the technician caseload cap.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when `max_load` is zero.
    pub fn set_max_load(&mut self, max_load: usize) -> Result<()> {
        if max_load == 0 {
            return Err(Error::Validation("max_load must be at least 1".to_string()));
        }
        self.max_load = max_load;
        Ok(())
    }

    /// Assignment settings derived from this configuration
    pub fn assignment_policy(&self) -> AssignmentPolicy {
        AssignmentPolicy {
            max_load: self.max_load,
        }
    }
}
