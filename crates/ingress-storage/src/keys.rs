//! Shared key generation for storage backends.

use ingress_core::constants::DERIVATIVE_PREFIX;

use crate::traits::{StorageError, StorageResult};

/// Key of the resized derivative: `data_resized/{classification}/{filename}.jpeg`.
pub fn derivative_key(classification: &str, filename: &str) -> String {
    format!("{}/{}/{}.jpeg", DERIVATIVE_PREFIX, classification, filename)
}

/// Reject keys that could escape a bucket or base directory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_key_is_namespaced_by_classification() {
        assert_eq!(
            derivative_key("cat", "0f3a_cat"),
            "data_resized/cat/0f3a_cat.jpeg"
        );
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(validate_key("data_resized/cat/a.jpeg").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("").is_err());
    }
}
