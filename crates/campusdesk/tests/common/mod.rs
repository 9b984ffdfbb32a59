//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use campusdesk::config::TenantSettings;
use campusdesk::domain::{NewComplaint, NewUser, Priority, Role, Session, UserId};
use campusdesk::storage::DeskStorage;
use std::path::Path;
use std::process::{Command, Output};

/// Run the campusdesk binary in `dir`, with colors off and no ambient user.
pub fn run_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_campusdesk"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("CAMPUSDESK_USER")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute campusdesk binary")
}

/// Run and assert success, returning stdout.
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_in_dir(dir, args);
    assert!(
        output.status.success(),
        "campusdesk {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run with `--json` and parse stdout.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let stdout = run_ok(dir, &full);
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

/// Register a user directly in a store.
pub async fn user(store: &mut dyn DeskStorage, id: &str, name: &str, role: Role) -> Session {
    let profile = store
        .create_user(NewUser {
            id: Some(UserId::new(id)),
            full_name: Some(name.to_string()),
            email: format!("{id}@campus.edu"),
            role,
        })
        .await
        .expect("user registration");
    Session::new(profile)
}

/// A valid complaint in the Electrical category.
pub fn complaint(title: &str, priority: Priority) -> NewComplaint {
    NewComplaint {
        title: title.to_string(),
        description: format!("{title} in the east wing"),
        category: "Electrical".to_string(),
        priority,
        location: None,
        created_by: None,
    }
}

pub fn settings() -> TenantSettings {
    TenantSettings::default()
}
