//! Name.com registrar adapter.
//!
//! Uses `POST /v4/domains:checkAvailability` with HTTP Basic auth
//! (username + API token). One call answers up to 50 names, with
//! purchasability, premium flag and pricing per name. Replies are not
//! guaranteed to follow request order.

use super::{
    acquire_slot, build_http_client, extract_tld, snippet, upstream_rate_limited, with_deadline,
    BatchProvider, ProviderAdapter,
};
use crate::config::NameComSettings;
use crate::error::DomainCheckError;
use crate::rate_limit::RateLimiter;
use crate::types::{CheckResult, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckAvailabilityRequest<'a> {
    domain_names: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CheckAvailabilityResponse {
    #[serde(default)]
    results: Vec<AvailabilityEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityEntry {
    domain_name: String,
    #[serde(default)]
    purchasable: bool,
    #[serde(default)]
    premium: bool,
    #[serde(default)]
    purchase_price: Option<f64>,
    #[serde(default)]
    renewal_price: Option<f64>,
}

impl AvailabilityEntry {
    fn into_result(self) -> CheckResult {
        CheckResult::registrar(self.domain_name.to_lowercase(), "namecom", self.purchasable)
            .with_pricing(self.purchase_price, self.renewal_price)
            .with_premium(self.premium)
    }
}

pub struct NameComAdapter {
    http_client: reqwest::Client,
    base_url: String,
    username: String,
    token: String,
    timeout: Duration,
    max_batch_size: usize,
    limiter: Option<Arc<RateLimiter>>,
}

impl NameComAdapter {
    pub fn with_settings(
        settings: &NameComSettings,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Result<Self, DomainCheckError> {
        Ok(Self {
            http_client: build_http_client(ProviderKind::NameCom, settings.timeout)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            token: settings.token.clone(),
            timeout: settings.timeout,
            max_batch_size: settings.max_batch_size,
            limiter,
        })
    }

    async fn request_availability(
        &self,
        domains: &[String],
    ) -> Result<Vec<CheckResult>, DomainCheckError> {
        let url = format!("{}/v4/domains:checkAvailability", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.username, Some(&self.token))
            .json(&CheckAvailabilityRequest {
                domain_names: domains,
            })
            .send()
            .await?;

        let status = response.status();
        debug!(count = domains.len(), status = status.as_u16(), "namecom response");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(upstream_rate_limited(ProviderKind::NameCom, &response));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(DomainCheckError::upstream_with_status(
                "namecom",
                format!("checkAvailability failed: {}", snippet(&body)),
                status.as_u16(),
            ));
        }

        let parsed: CheckAvailabilityResponse = serde_json::from_str(&body).map_err(|e| {
            DomainCheckError::upstream(
                "namecom",
                format!("Malformed availability response ({}): {}", e, snippet(&body)),
            )
        })?;

        Ok(parsed
            .results
            .into_iter()
            .map(AvailabilityEntry::into_result)
            .collect())
    }
}

#[async_trait]
impl ProviderAdapter for NameComAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NameCom
    }

    async fn check_one(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        let wanted = domain.to_lowercase();
        self.check_batch(&[wanted.clone()])
            .await?
            .into_iter()
            .find(|r| r.domain == wanted)
            .map(|mut r| {
                r.domain = domain.to_string();
                r
            })
            .ok_or_else(|| {
                DomainCheckError::upstream("namecom", format!("no result returned for '{}'", domain))
            })
    }
}

#[async_trait]
impl BatchProvider for NameComAdapter {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn check_batch(&self, domains: &[String]) -> Result<Vec<CheckResult>, DomainCheckError> {
        if domains.is_empty() {
            return Ok(Vec::new());
        }
        if domains.len() > self.max_batch_size {
            return Err(DomainCheckError::invalid_input(format!(
                "namecom accepts at most {} names per call, got {}",
                self.max_batch_size,
                domains.len()
            )));
        }
        if let Some(bad) = domains.iter().find(|d| extract_tld(d).is_none()) {
            return Err(DomainCheckError::unsupported("namecom", bad.as_str()));
        }

        acquire_slot(self.limiter.as_deref()).await?;
        with_deadline(
            ProviderKind::NameCom,
            self.timeout,
            self.request_availability(domains),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::stub;
    use crate::rate_limit::RateLimit;
    use crate::types::CheckMethod;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // "acme:token" in base64
    const BASIC: &str = "Basic YWNtZTp0b2tlbg==";

    async fn namecom_stub(calls: Arc<AtomicUsize>) -> String {
        let router = Router::new().route(
            "/v4/domains:checkAvailability",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(BASIC) {
                        return (AxumStatus::UNAUTHORIZED, "Unauthorized").into_response();
                    }

                    let names: Vec<String> = body["domainNames"]
                        .as_array()
                        .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                        .unwrap_or_default();

                    // Answer in reverse order and drop anything under .gone
                    let results: Vec<serde_json::Value> = names
                        .iter()
                        .rev()
                        .filter(|n| !n.ends_with(".gone"))
                        .map(|n| {
                            if n.starts_with("free") {
                                serde_json::json!({
                                    "domainName": n, "purchasable": true, "premium": n.contains("premium"),
                                    "purchasePrice": 12.99, "renewalPrice": 14.99
                                })
                            } else {
                                serde_json::json!({"domainName": n})
                            }
                        })
                        .collect();
                    Json(serde_json::json!({ "results": results })).into_response()
                }
            }),
        );
        stub::serve(router).await
    }

    fn adapter(base: &str, limiter: Option<Arc<RateLimiter>>) -> NameComAdapter {
        let settings = NameComSettings {
            base_url: base.to_string(),
            username: "acme".to_string(),
            token: "token".to_string(),
            timeout: Duration::from_secs(2),
            rate_limit: None,
            max_batch_size: 3,
        };
        NameComAdapter::with_settings(&settings, limiter).unwrap()
    }

    #[tokio::test]
    async fn test_batch_normalizes_pricing_and_premium() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = namecom_stub(Arc::clone(&calls)).await;
        let adapter = adapter(&base, None);

        let domains = vec![
            "free-premium.io".to_string(),
            "google.com".to_string(),
            "free.dev".to_string(),
        ];
        let results = adapter.check_batch(&domains).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let premium = results.iter().find(|r| r.domain == "free-premium.io").unwrap();
        assert!(premium.available);
        assert!(premium.premium);
        assert_eq!(premium.price, Some(12.99));
        assert_eq!(premium.renewal_price, Some(14.99));
        assert_eq!(premium.method, CheckMethod::Registrar);

        let taken = results.iter().find(|r| r.domain == "google.com").unwrap();
        assert!(!taken.available);
        assert_eq!(taken.price, None);
    }

    #[tokio::test]
    async fn test_check_one_matches_by_name() {
        let base = namecom_stub(Arc::new(AtomicUsize::new(0))).await;
        let adapter = adapter(&base, None);

        let result = adapter.check_one("Free-Thing.com").await.unwrap();
        assert_eq!(result.domain, "Free-Thing.com");
        assert!(result.available);

        let err = adapter.check_one("missing.gone").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UpstreamError { .. }));
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected_without_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = namecom_stub(Arc::clone(&calls)).await;
        let adapter = adapter(&base, None);

        let domains: Vec<String> = (0..4).map(|i| format!("free{}.com", i)).collect();
        assert!(adapter.check_batch(&domains).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hourly_quota_stops_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let base = namecom_stub(Arc::clone(&calls)).await;
        let limiter = Arc::new(RateLimiter::new("namecom", RateLimit::new(20, 2)).unwrap());
        let adapter = adapter(&base, Some(limiter));

        adapter.check_one("free1.com").await.unwrap();
        adapter.check_one("free2.com").await.unwrap();
        let err = adapter.check_one("free3.com").await.unwrap_err();

        assert!(matches!(err, DomainCheckError::RateLimitExceeded { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_upstream_error() {
        let base = namecom_stub(Arc::new(AtomicUsize::new(0))).await;
        let settings = NameComSettings {
            base_url: base,
            username: "acme".to_string(),
            token: "wrong".to_string(),
            timeout: Duration::from_secs(2),
            rate_limit: None,
            max_batch_size: 50,
        };
        let adapter = NameComAdapter::with_settings(&settings, None).unwrap();

        let err = adapter.check_one("free.com").await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }
}
