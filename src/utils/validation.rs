// Validation utilities for string fields and schema-level identifiers

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// RFC 1123 style hostname: dot-separated labels, no leading/trailing hyphens
    pub static ref HOSTNAME_REGEX: Regex =
        Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,63}$").unwrap();

    /// URL-safe slug: lowercase alphanumerics and hyphens, no leading/trailing hyphen
    pub static ref SLUG_REGEX: Regex =
        Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();

    /// Page linking id: letters, digits, hyphens and underscores
    pub static ref LINKING_ID_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap();
}

/// Trim and validate string fields
pub fn trim_and_validate_field(field: &str, required: bool) -> Result<String, String> {
    let trimmed = field.trim().to_string();
    if trimmed.is_empty() {
        if required {
            Err("Field cannot be empty".to_string())
        } else {
            Ok(trimmed) // For optional fields, empty is valid
        }
    } else {
        Ok(trimmed)
    }
}

/// Trim an optional string field, collapsing empty values to None
pub fn trim_optional_field(field: Option<&String>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_regex() {
        let valid = vec![
            "example.com",
            "sub.example.com",
            "my-funnel.pages.example.io",
            "xn--bcher-kva.example",
        ];
        for hostname in valid {
            assert!(HOSTNAME_REGEX.is_match(hostname), "Failed for: {}", hostname);
        }

        let invalid = vec![
            "localhost",
            "-leading.example.com",
            "trailing-.example.com",
            "double..dot.com",
            "has space.com",
            "",
        ];
        for hostname in invalid {
            assert!(
                !HOSTNAME_REGEX.is_match(hostname),
                "Should fail for: {}",
                hostname
            );
        }
    }

    #[test]
    fn test_slug_regex() {
        assert!(SLUG_REGEX.is_match("landing-pages"));
        assert!(SLUG_REGEX.is_match("webinar2024"));
        assert!(!SLUG_REGEX.is_match("Landing-Pages"));
        assert!(!SLUG_REGEX.is_match("-leading"));
        assert!(!SLUG_REGEX.is_match("trailing-"));
        assert!(!SLUG_REGEX.is_match("under_score"));
        assert!(!SLUG_REGEX.is_match(""));
    }

    #[test]
    fn test_linking_id_regex() {
        assert!(LINKING_ID_REGEX.is_match("opt-in_1"));
        assert!(LINKING_ID_REGEX.is_match("thankyou"));
        assert!(!LINKING_ID_REGEX.is_match("-bad"));
        assert!(!LINKING_ID_REGEX.is_match("has space"));
    }

    #[test]
    fn test_trim_helpers() {
        assert_eq!(
            trim_and_validate_field("  hello  ", true),
            Ok("hello".to_string())
        );
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("   ", false), Ok(String::new()));

        assert_eq!(
            trim_optional_field(Some(&" x ".to_string())),
            Some("x".to_string())
        );
        assert_eq!(trim_optional_field(Some(&"  ".to_string())), None);
        assert_eq!(trim_optional_field(None), None);
    }
}
