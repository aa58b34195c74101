//! Validation helpers for values that end up in HTTP requests

use crate::error::{CleanError, Result};

/// Reject strings that cannot travel inside an HTTP header value.
///
/// Control characters (including CR, LF and NUL) and DEL are refused.
pub fn sanitize_for_header(value: &str, field_name: &str) -> Result<String> {
    if value.is_empty() {
        return Err(CleanError::invalid_config(format!("{} cannot be empty", field_name)));
    }

    if let Some((index, ch)) = value.char_indices().find(|(_, ch)| ch.is_control()) {
        return Err(CleanError::invalid_config(format!(
            "{} contains a control character at position {} ({:#04x})",
            field_name, index, ch as u32
        )));
    }

    Ok(value.to_string())
}

/// Validate an API key for use as a bearer token.
///
/// The placeholder value `none` is treated as "no key".
pub fn validate_api_key(api_key: &str) -> Result<String> {
    let trimmed = api_key.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Err(CleanError::MissingConfig {
            key: "api_key".to_string(),
        });
    }

    sanitize_for_header(trimmed, "API key")?;

    format!("Bearer {}", trimmed)
        .parse::<reqwest::header::HeaderValue>()
        .map_err(|_| {
            CleanError::invalid_config(format!(
                "API key ({} characters) is not a valid Authorization header value",
                trimmed.len()
            ))
        })?;

    Ok(trimmed.to_string())
}

/// Normalise a provider base URL: trimmed, http(s) only, no trailing slash.
pub fn sanitize_base_url(url: &str, field_name: &str) -> Result<String> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(CleanError::invalid_config(format!("{} cannot be empty", field_name)));
    }

    // Encoded separators mean the URL was escaped twice somewhere upstream.
    if ["%2F", "%3D", "%20"].iter().any(|enc| trimmed.contains(enc)) {
        return Err(CleanError::invalid_config(format!(
            "{} contains URL-encoded characters; check that it is not double-encoded",
            field_name
        )));
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(CleanError::invalid_config(format!(
            "{} must start with 'http://' or 'https://', got: {}",
            field_name, trimmed
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_for_header() {
        assert!(sanitize_for_header("sk-abc123xyz", "key").is_ok());
        assert!(sanitize_for_header("abc\n123", "key").is_err());
        assert!(sanitize_for_header("abc\x00123", "key").is_err());
        assert!(sanitize_for_header("abc\x7f123", "key").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert_eq!(validate_api_key("  sk-test123 ").unwrap(), "sk-test123");
        assert!(matches!(
            validate_api_key("NONE"),
            Err(CleanError::MissingConfig { .. })
        ));
        assert!(validate_api_key(" \n ").is_err());
    }

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            sanitize_base_url("https://api.openai.com/v1/", "base_url").unwrap(),
            "https://api.openai.com/v1"
        );
        assert!(sanitize_base_url("http://localhost:11434/v1", "base_url").is_ok());
        assert!(sanitize_base_url("", "base_url").is_err());
        assert!(sanitize_base_url("localhost:11434", "base_url").is_err());
        assert!(sanitize_base_url("https://api.example%2Fcom", "base_url").is_err());
    }
}
