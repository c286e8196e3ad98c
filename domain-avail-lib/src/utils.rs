//! Utility functions for domain name normalization and validation.

use crate::error::DomainCheckError;

/// Canonical lookup form of a domain: trimmed and lower-cased.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

/// Validate a domain name and return its lookup form.
///
/// # Errors
///
/// Returns `InvalidInput` when the name is empty or not a syntactically
/// valid fully-qualified domain.
pub fn validate_domain(domain: &str) -> Result<String, DomainCheckError> {
    let normalized = normalize_domain(domain);

    if normalized.is_empty() {
        return Err(DomainCheckError::invalid_input("Domain name cannot be empty"));
    }

    if !is_valid_fqdn(&normalized) {
        return Err(DomainCheckError::invalid_input(format!(
            "invalid domain '{}'",
            domain.trim()
        )));
    }

    Ok(normalized)
}

/// Validate that an FQDN has basic valid structure.
pub(crate) fn is_valid_fqdn(domain: &str) -> bool {
    if domain.len() < 4 || domain.len() > 253 {
        return false;
    }

    // Cannot start or end with dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return false;
        }

        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    // The suffix is never all digits
    labels
        .last()
        .map(|tld| !tld.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain() {
        assert_eq!(validate_domain("  Example.COM ").unwrap(), "example.com");
        assert_eq!(validate_domain("free-xyz123.test").unwrap(), "free-xyz123.test");
        assert!(validate_domain("").is_err());
        assert!(validate_domain("   ").is_err());
        assert!(validate_domain("example").is_err());
    }

    #[test]
    fn test_validate_domain_error_is_invalid_input() {
        let err = validate_domain("not a domain").unwrap_err();
        assert!(matches!(err, DomainCheckError::InvalidInput { .. }));
        assert!(err.to_string().contains("invalid domain"));
    }

    #[test]
    fn test_is_valid_fqdn() {
        assert!(is_valid_fqdn("example.com"));
        assert!(is_valid_fqdn("test.co.uk"));
        assert!(is_valid_fqdn("sub.example.com"));
        assert!(is_valid_fqdn("xn--bcher-kva.de"));

        assert!(!is_valid_fqdn("example"));
        assert!(!is_valid_fqdn(".com"));
        assert!(!is_valid_fqdn("example."));
        assert!(!is_valid_fqdn("-example.com"));
        assert!(!is_valid_fqdn("example.com-"));
        assert!(!is_valid_fqdn("ex."));
        assert!(!is_valid_fqdn("exa mple.com"));
        assert!(!is_valid_fqdn("under_score.com"));
        assert!(!is_valid_fqdn("192.168.0.1"));
        assert!(!is_valid_fqdn(&format!("{}.com", "a".repeat(64))));
    }
}
