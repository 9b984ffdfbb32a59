//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is rejected at parse
//! time. Rules are delegated to the domain validators where one exists.

/// Validate a complaint ID prefix.
pub fn validate_prefix(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate a complaint ID of the form `prefix-suffix`.
///
/// Examples: `desk-a1b2`, `hall-9zk0x`
pub fn validate_complaint_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Complaint ID cannot be empty".to_string());
    }

    let Some((prefix, suffix)) = s.split_once('-') else {
        return Err(format!(
            "Invalid complaint ID format: '{s}'. Expected prefix-suffix (e.g., desk-a1b2)"
        ));
    };

    validate_prefix(prefix).map_err(|e| format!("Complaint ID {}", e.to_lowercase()))?;

    if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Complaint ID suffix must be one or more alphanumerics".to_string());
    }

    Ok(s.to_string())
}

/// Validate a user ID: letters, digits, `-` or `_`.
pub fn validate_user_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("User ID cannot be empty".to_string());
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "Invalid user ID '{s}': use letters, digits, '-' or '_'"
        ));
    }
    Ok(s.to_string())
}

/// Validate a complaint title.
pub fn validate_title(s: &str) -> Result<String, String> {
    crate::domain::validate_title(s)?;
    Ok(s.trim().to_string())
}

/// Validate a complaint description.
pub fn validate_description(s: &str) -> Result<String, String> {
    crate::domain::validate_description(s)?;
    Ok(s.to_string())
}

/// Validate an SLA window in whole hours (at least 1).
pub fn validate_hours(s: &str) -> Result<u32, String> {
    let hours: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a whole number of hours"))?;
    if hours == 0 {
        return Err("SLA hours must be at least 1".to_string());
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("desk")]
    #[case("AB")]
    #[case("hall2")]
    fn test_validate_prefix_valid(#[case] prefix: &str) {
        assert!(validate_prefix(prefix).is_ok());
    }

    #[test]
    fn test_validate_prefix_rejects() {
        assert!(validate_prefix("a").unwrap_err().contains("at least 2"));
        assert!(validate_prefix("desk-1").is_err());
        assert_eq!(validate_prefix("  desk ").unwrap(), "desk");
    }

    #[rstest]
    #[case("desk-a1b2", true)]
    #[case("hall-9zk0x", true)]
    #[case("desk", false)]
    #[case("desk-", false)]
    #[case("d-abc", false)]
    #[case("desk-ab_c", false)]
    #[case("", false)]
    fn test_validate_complaint_id(#[case] id: &str, #[case] ok: bool) {
        assert_eq!(validate_complaint_id(id).is_ok(), ok, "{id}");
    }

    #[test]
    fn test_validate_user_id() {
        assert_eq!(validate_user_id(" tia_tech ").unwrap(), "tia_tech");
        assert!(validate_user_id("tia tech").is_err());
        assert!(validate_user_id("").is_err());
    }

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Broken fan ").unwrap(), "Broken fan");
        assert!(validate_title("   ").is_err());
    }

    #[rstest]
    #[case("24", Ok(24))]
    #[case("0", Err(()))]
    #[case("-3", Err(()))]
    #[case("two", Err(()))]
    fn test_validate_hours(#[case] input: &str, #[case] expected: Result<u32, ()>) {
        assert_eq!(validate_hours(input).map_err(|_| ()), expected);
    }
}
