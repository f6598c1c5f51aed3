use regex::Regex;
use std::sync::OnceLock;

/// Validation error type
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// Validate a device identifier (internal id, serial number, or name)
///
/// The identifier is opaque to this service; it only needs to be a sane
/// string to forward to the remote lookup: non-empty, at most 128 chars,
/// printable characters only.
pub fn validate_device_identifier(identifier: &str) -> Result<(), ValidationError> {
    if identifier.is_empty() {
        return Err(ValidationError::new(
            "deviceId",
            "Device identifier cannot be empty",
        ));
    }

    if identifier.len() > 128 {
        return Err(ValidationError::new(
            "deviceId",
            format!(
                "Device identifier length {} exceeds maximum of 128 characters",
                identifier.len()
            ),
        ));
    }

    if identifier.chars().any(|c| c.is_control()) {
        return Err(ValidationError::new(
            "deviceId",
            "Device identifier contains control characters",
        ));
    }

    Ok(())
}

/// Validate API key format (32-character lowercase hex, a UUID without dashes)
pub fn validate_api_key_format(api_key: &str) -> Result<(), ValidationError> {
    static API_KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = API_KEY_REGEX.get_or_init(|| Regex::new(r"^[0-9a-f]{32}$").unwrap());

    if regex.is_match(api_key) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "apiKey",
            "API key must be 32 lowercase hexadecimal characters",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_device_identifier_accepts_common_forms() {
        assert!(validate_device_identifier("b42").is_ok());
        assert!(validate_device_identifier("G9XXX0000001").is_ok());
        assert!(validate_device_identifier("Excavator 12").is_ok());
    }

    #[test]
    fn test_validate_device_identifier_rejects_empty() {
        let err = validate_device_identifier("").unwrap_err();
        assert_eq!(err.field, "deviceId");
    }

    #[test]
    fn test_validate_device_identifier_rejects_overlong() {
        let long = "x".repeat(129);
        assert!(validate_device_identifier(&long).is_err());
        let max = "x".repeat(128);
        assert!(validate_device_identifier(&max).is_ok());
    }

    #[test]
    fn test_validate_device_identifier_rejects_control_chars() {
        assert!(validate_device_identifier("b42\n").is_err());
        assert!(validate_device_identifier("b\x0042").is_err());
    }

    #[test]
    fn test_validate_api_key_format() {
        assert!(validate_api_key_format("0123456789abcdef0123456789abcdef").is_ok());

        // Wrong length
        assert!(validate_api_key_format("0123456789abcdef").is_err());
        // Uppercase not allowed
        assert!(validate_api_key_format("0123456789ABCDEF0123456789ABCDEF").is_err());
        // Dashed UUID form not allowed
        assert!(validate_api_key_format("01234567-89ab-cdef-0123-456789abcdef").is_err());
        // Empty
        assert!(validate_api_key_format("").is_err());
    }
}
