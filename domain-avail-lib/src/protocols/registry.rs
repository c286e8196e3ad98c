//! TLD to RDAP endpoint routing.
//!
//! The RDAP adapter is suffix-keyed: every lookup first resolves the
//! registry that serves the domain's TLD. Routes come from a built-in table
//! of known registries, optionally extended or overridden by configuration.

use crate::error::DomainCheckError;
use std::collections::HashMap;

/// Built-in RDAP endpoints keyed by TLD.
///
/// Every endpoint is a base URL that the domain name is appended to.
pub fn builtin_rdap_endpoints() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1/domain/"),
        ("net", "https://rdap.verisign.com/net/v1/domain/"),
        (
            "org",
            "https://rdap.publicinterestregistry.org/rdap/domain/",
        ),
        ("info", "https://rdap.identitydigital.services/rdap/domain/"),
        ("biz", "https://rdap.nic.biz/domain/"),
        // Google Registry
        ("app", "https://pubapi.registry.google/rdap/domain/"),
        ("dev", "https://pubapi.registry.google/rdap/domain/"),
        ("page", "https://pubapi.registry.google/rdap/domain/"),
        // CentralNic
        ("xyz", "https://rdap.centralnic.com/xyz/domain/"),
        ("tech", "https://rdap.centralnic.com/tech/domain/"),
        ("online", "https://rdap.centralnic.com/online/domain/"),
        ("site", "https://rdap.centralnic.com/site/domain/"),
        ("website", "https://rdap.centralnic.com/website/domain/"),
        ("shop", "https://rdap.gmoregistry.net/rdap/domain/"),
        // Identity Digital
        ("ai", "https://rdap.identitydigital.services/rdap/domain/"),
        ("io", "https://rdap.identitydigital.services/rdap/domain/"),
        ("me", "https://rdap.identitydigital.services/rdap/domain/"),
        (
            "digital",
            "https://rdap.identitydigital.services/rdap/domain/",
        ),
        // ccTLDs with working RDAP
        ("us", "https://rdap.nic.us/domain/"),
        ("uk", "https://rdap.nominet.uk/domain/"),
        ("de", "https://rdap.denic.de/domain/"),
        ("ca", "https://rdap.ca.fury.ca/rdap/domain/"),
        ("fr", "https://rdap.nic.fr/domain/"),
        ("nl", "https://rdap.sidn.nl/domain/"),
        ("br", "https://rdap.registro.br/domain/"),
        ("tv", "https://rdap.nic.tv/domain/"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1/domain/"),
        ("cloud", "https://rdap.registry.cloud/rdap/domain/"),
    ])
}

/// Extract the TLD (last label) from a domain, lower-cased.
pub fn extract_tld(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_end_matches('.');
    let (_, tld) = domain.rsplit_once('.')?;
    if tld.is_empty() {
        return None;
    }
    Some(tld.to_lowercase())
}

/// Route table owned by one RDAP adapter.
#[derive(Debug, Clone)]
pub struct RdapRegistry {
    endpoints: HashMap<String, String>,
}

impl RdapRegistry {
    /// Built-in routes plus `overrides`; overrides win on conflict.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut endpoints: HashMap<String, String> = builtin_rdap_endpoints()
            .into_iter()
            .map(|(tld, url)| (tld.to_string(), url.to_string()))
            .collect();

        for (tld, url) in overrides {
            let tld = tld.trim().trim_start_matches('.').to_lowercase();
            let mut url = url.trim().to_string();
            if !url.ends_with('/') {
                url.push('/');
            }
            endpoints.insert(tld, url);
        }

        Self { endpoints }
    }

    /// Base endpoint serving `domain`, or `UnsupportedDomain`.
    pub fn endpoint_for(&self, domain: &str) -> Result<&str, DomainCheckError> {
        extract_tld(domain)
            .and_then(|tld| self.endpoints.get(&tld))
            .map(String::as_str)
            .ok_or_else(|| DomainCheckError::unsupported("rdap", domain))
    }
}

impl Default for RdapRegistry {
    fn default() -> Self {
        Self::with_overrides(&HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tld() {
        assert_eq!(extract_tld("example.com").as_deref(), Some("com"));
        assert_eq!(extract_tld("sub.Example.ORG").as_deref(), Some("org"));
        assert_eq!(extract_tld("example.com.").as_deref(), Some("com"));
        assert_eq!(extract_tld("invalid"), None);
        assert_eq!(extract_tld(""), None);
    }

    #[test]
    fn test_all_builtin_endpoints_are_https() {
        for (tld, endpoint) in builtin_rdap_endpoints() {
            assert!(
                endpoint.starts_with("https://") && endpoint.ends_with("/domain/"),
                "bad endpoint for '{}': {}",
                tld,
                endpoint
            );
        }
    }

    #[test]
    fn test_unknown_suffix_is_unsupported() {
        let registry = RdapRegistry::default();
        let err = registry.endpoint_for("free-xyz123.test").unwrap_err();
        assert!(matches!(err, DomainCheckError::UnsupportedDomain { .. }));
        assert!(registry.endpoint_for("google.com").is_ok());
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let overrides = HashMap::from([
            ("com".to_string(), "http://127.0.0.1:9000/rdap".to_string()),
            (".test".to_string(), "http://127.0.0.1:9000/test/".to_string()),
        ]);
        let registry = RdapRegistry::with_overrides(&overrides);

        assert_eq!(
            registry.endpoint_for("google.com").unwrap(),
            "http://127.0.0.1:9000/rdap/"
        );
        assert_eq!(
            registry.endpoint_for("a.test").unwrap(),
            "http://127.0.0.1:9000/test/"
        );
    }
}
