//! Provider adapters for domain availability lookups.
//!
//! Each adapter talks to one upstream provider and normalizes its reply
//! into a [`CheckResult`]. Adapters that can answer many domains in one
//! upstream call additionally implement [`BatchProvider`]; the others only
//! implement [`ProviderAdapter`], which forces callers to fan out.

use crate::error::DomainCheckError;
use crate::rate_limit::RateLimiter;
use crate::types::{CheckResult, ProviderKind};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use std::time::Duration;

/// RDAP (Registration Data Access Protocol) adapter
pub mod rdap;

/// Registrar API with single-domain availability lookups
pub mod godaddy;

/// Registrar API with native batch availability lookups
pub mod namecom;

/// TLD routing for RDAP
pub mod registry;

pub use godaddy::GoDaddyAdapter;
pub use namecom::NameComAdapter;
pub use rdap::RdapAdapter;
pub use registry::{extract_tld, RdapRegistry};

/// One upstream availability provider.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Short provider name used in logs and error summaries.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Check a single fully-qualified domain.
    async fn check_one(&self, domain: &str) -> Result<CheckResult, DomainCheckError>;
}

/// Provider that answers many domains in one upstream call.
#[async_trait]
pub trait BatchProvider: ProviderAdapter {
    /// Largest number of names one upstream call accepts.
    fn max_batch_size(&self) -> usize;

    /// Check up to `max_batch_size` domains in one call.
    ///
    /// The upstream may answer in any order and may omit names; callers
    /// match results back to their request by domain.
    async fn check_batch(&self, domains: &[String]) -> Result<Vec<CheckResult>, DomainCheckError>;
}

/// Build the HTTP client an adapter uses.
///
/// The client-level timeout is a backstop a little longer than the
/// adapter's own deadline, which is enforced with `tokio::time::timeout`.
pub(crate) fn build_http_client(
    provider: ProviderKind,
    timeout: Duration,
) -> Result<reqwest::Client, DomainCheckError> {
    reqwest::Client::builder()
        .timeout(timeout + Duration::from_secs(2))
        .user_agent(concat!("domain-avail/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            DomainCheckError::internal(format!(
                "Failed to create {} HTTP client: {}",
                provider, e
            ))
        })
}

/// Reserve a quota slot if the provider is rate limited.
pub(crate) async fn acquire_slot(limiter: Option<&RateLimiter>) -> Result<(), DomainCheckError> {
    match limiter {
        Some(limiter) => limiter.acquire().await,
        None => Ok(()),
    }
}

/// Run an upstream call under the adapter's deadline.
pub(crate) async fn with_deadline<T, F>(
    provider: ProviderKind,
    timeout: Duration,
    call: F,
) -> Result<T, DomainCheckError>
where
    F: std::future::Future<Output = Result<T, DomainCheckError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(DomainCheckError::UpstreamTimeout { .. })) | Err(_) => {
            Err(DomainCheckError::timeout(provider.as_str(), timeout))
        }
        Ok(Err(e)) => Err(e.with_provider(provider.as_str())),
    }
}

/// Map an upstream 429 into a rate limit error, honoring `Retry-After`.
pub(crate) fn upstream_rate_limited(
    provider: ProviderKind,
    response: &reqwest::Response,
) -> DomainCheckError {
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    DomainCheckError::rate_limited(provider.as_str(), retry_after)
}

/// Trim a response body for inclusion in an error message.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
pub(crate) mod stub {
    //! Local HTTP upstreams for adapter tests.

    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port and return its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_maps_elapsed_to_timeout() {
        let err = with_deadline(ProviderKind::Rdap, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, DomainCheckError>(())
        })
        .await
        .unwrap_err();

        match err {
            DomainCheckError::UpstreamTimeout { provider, duration } => {
                assert_eq!(provider, "rdap");
                assert_eq!(duration, Duration::from_millis(10));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_with_deadline_stamps_provider() {
        let err = with_deadline(ProviderKind::GoDaddy, Duration::from_secs(1), async {
            Err::<(), _>(DomainCheckError::upstream_with_status("http", "bad", 502))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("godaddy error (HTTP 502)"));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(snippet(&long).len(), 203);
        assert_eq!(snippet("  short  "), "short");
    }
}
