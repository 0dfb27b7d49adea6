//! Input validation for queue names and message bodies.

use crate::error::{LineUpError, Result};

/// Longest accepted queue name.
pub const MAX_QUEUE_NAME_LENGTH: usize = 256;

/// Queue names: 1-256 chars of ASCII alphanumerics, `-`, `_` or `.`.
/// They end up in URLs, so nothing that needs escaping.
pub fn validate_queue_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(LineUpError::InvalidQueueName(
            "queue name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_QUEUE_NAME_LENGTH {
        return Err(LineUpError::InvalidQueueName(format!(
            "queue name too long (max {} chars)",
            MAX_QUEUE_NAME_LENGTH
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(LineUpError::InvalidQueueName(format!(
            "'{}' contains characters other than alphanumerics, '-', '_' or '.'",
            name
        )));
    }
    Ok(())
}

/// Non-empty and at most `limit` bytes.
#[inline]
pub fn validate_body(body: &str, limit: usize) -> Result<()> {
    if body.is_empty() {
        return Err(LineUpError::EmptyBody);
    }
    if body.len() > limit {
        return Err(LineUpError::MessageTooLarge {
            size: body.len(),
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_names() {
        assert!(validate_queue_name("orders").is_ok());
        assert!(validate_queue_name("orders-v2_eu.west").is_ok());
        assert!(validate_queue_name("").is_err());
        assert!(validate_queue_name("has space").is_err());
        assert!(validate_queue_name("slash/name").is_err());
        assert!(validate_queue_name(&"x".repeat(MAX_QUEUE_NAME_LENGTH)).is_ok());
        assert!(validate_queue_name(&"x".repeat(MAX_QUEUE_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_body_limits() {
        assert!(validate_body("ok", 2).is_ok());
        assert_eq!(validate_body("", 10).unwrap_err(), LineUpError::EmptyBody);
        assert_eq!(
            validate_body("abc", 2).unwrap_err(),
            LineUpError::MessageTooLarge { size: 3, limit: 2 }
        );
    }
}
