//! RDAP (Registration Data Access Protocol) adapter.
//!
//! RDAP registries answer `GET {endpoint}{domain}` with 404 when the name is
//! not registered and 200 with a domain object when it is. The endpoint is
//! chosen from the domain's TLD, so names under unknown suffixes fail fast
//! with `UnsupportedDomain` and never touch the network.

use super::{
    acquire_slot, build_http_client, snippet, upstream_rate_limited, with_deadline,
    ProviderAdapter, RdapRegistry,
};
use crate::config::RdapSettings;
use crate::error::DomainCheckError;
use crate::rate_limit::RateLimiter;
use crate::types::{CheckResult, ProviderKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// RDAP adapter for checking domain availability.
#[derive(Clone)]
pub struct RdapAdapter {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// Deadline for one lookup
    timeout: Duration,
    /// TLD routes
    registry: RdapRegistry,
    /// Optional quota gate
    limiter: Option<Arc<RateLimiter>>,
}

impl RdapAdapter {
    /// Create an RDAP adapter with the built-in routes and a 3 second deadline.
    pub fn new() -> Result<Self, DomainCheckError> {
        Self::with_settings(&RdapSettings::default(), None)
    }

    /// Create an RDAP adapter from configuration.
    pub fn with_settings(
        settings: &RdapSettings,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Result<Self, DomainCheckError> {
        Ok(Self {
            http_client: build_http_client(ProviderKind::Rdap, settings.timeout)?,
            timeout: settings.timeout,
            registry: RdapRegistry::with_overrides(&settings.endpoints),
            limiter,
        })
    }

    /// Issue the RDAP request and classify the reply.
    ///
    /// Returns `true` when the domain is available.
    async fn make_rdap_request(&self, rdap_url: &str) -> Result<bool, DomainCheckError> {
        let response = self.http_client.get(rdap_url).send().await?;
        let status = response.status();
        debug!(url = rdap_url, status = status.as_u16(), "rdap response");

        match status {
            StatusCode::OK => {
                // Registered: insist on a real RDAP object, not an error page
                let body = response.text().await?;
                let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
                    DomainCheckError::upstream(
                        "rdap",
                        format!("Failed to parse RDAP response: {}", e),
                    )
                })?;
                if !json.is_object() {
                    return Err(DomainCheckError::upstream(
                        "rdap",
                        format!("Unexpected RDAP body: {}", snippet(&body)),
                    ));
                }
                Ok(false)
            }
            StatusCode::NOT_FOUND => Ok(true),
            StatusCode::TOO_MANY_REQUESTS => Err(upstream_rate_limited(ProviderKind::Rdap, &response)),
            code => Err(DomainCheckError::upstream_with_status(
                "rdap",
                format!("RDAP server returned {}", code),
                code.as_u16(),
            )),
        }
    }
}

#[async_trait]
impl ProviderAdapter for RdapAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Rdap
    }

    async fn check_one(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        let endpoint = self.registry.endpoint_for(domain)?;
        let rdap_url = format!("{}{}", endpoint, domain);

        acquire_slot(self.limiter.as_deref()).await?;
        let available = with_deadline(
            ProviderKind::Rdap,
            self.timeout,
            self.make_rdap_request(&rdap_url),
        )
        .await?;

        Ok(CheckResult::rdap(domain, available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::stub;
    use crate::rate_limit::RateLimit;
    use crate::types::CheckMethod;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn rdap_stub() -> String {
        let router = Router::new().route(
            "/domain/:name",
            get(|Path(name): Path<String>| async move {
                match name.as_str() {
                    "google.com" => (
                        AxumStatus::OK,
                        Json(serde_json::json!({"objectClassName": "domain", "ldhName": "GOOGLE.COM"})),
                    )
                        .into_response(),
                    "broken.com" => (AxumStatus::OK, "<html>oops</html>").into_response(),
                    "flaky.com" => AxumStatus::SERVICE_UNAVAILABLE.into_response(),
                    "slow.com" => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        AxumStatus::NOT_FOUND.into_response()
                    }
                    _ => AxumStatus::NOT_FOUND.into_response(),
                }
            }),
        );
        stub::serve(router).await
    }

    fn adapter_for(base: &str, timeout: Duration, limiter: Option<Arc<RateLimiter>>) -> RdapAdapter {
        let settings = RdapSettings {
            timeout,
            endpoints: HashMap::from([("com".to_string(), format!("{}/domain/", base))]),
            rate_limit: None,
        };
        RdapAdapter::with_settings(&settings, limiter).unwrap()
    }

    #[tokio::test]
    async fn test_found_means_taken_and_not_found_means_available() {
        let base = rdap_stub().await;
        let adapter = adapter_for(&base, Duration::from_secs(2), None);

        let taken = adapter.check_one("google.com").await.unwrap();
        assert_eq!(taken.method, CheckMethod::Rdap);
        assert!(!taken.available);

        let free = adapter.check_one("free-xyz123.com").await.unwrap();
        assert!(free.available);
        assert_eq!(free.provider.as_deref(), Some("rdap"));
    }

    #[tokio::test]
    async fn test_repeated_not_found_checks_are_idempotent() {
        let base = rdap_stub().await;
        let adapter = adapter_for(&base, Duration::from_secs(2), None);

        for _ in 0..5 {
            let result = adapter.check_one("free-xyz123.com").await.unwrap();
            assert!(result.available);
            assert_eq!(result.error, None);
        }
    }

    #[tokio::test]
    async fn test_unknown_suffix_is_unsupported() {
        let adapter = RdapAdapter::new().unwrap();
        let err = adapter.check_one("free-xyz123.test").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UnsupportedDomain { .. }));
    }

    #[tokio::test]
    async fn test_error_status_and_malformed_body_are_upstream_errors() {
        let base = rdap_stub().await;
        let adapter = adapter_for(&base, Duration::from_secs(2), None);

        let err = adapter.check_one("flaky.com").await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));

        let err = adapter.check_one("broken.com").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UpstreamError { .. }));
    }

    #[tokio::test]
    async fn test_slow_registry_times_out() {
        let base = rdap_stub().await;
        let adapter = adapter_for(&base, Duration::from_millis(100), None);

        let err = adapter.check_one("slow.com").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UpstreamTimeout { .. }));
    }

    #[tokio::test]
    async fn test_exhausted_quota_blocks_before_network() {
        let limiter = Arc::new(RateLimiter::new("rdap", RateLimit::new(10, 1)).unwrap());
        // Unroutable base: any network attempt would fail with a transport error
        let adapter = adapter_for("http://127.0.0.1:9", Duration::from_secs(1), Some(limiter.clone()));
        limiter.acquire().await.unwrap();

        let err = adapter.check_one("google.com").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::RateLimitExceeded { .. }));
    }
}
