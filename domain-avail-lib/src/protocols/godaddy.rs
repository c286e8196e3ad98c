//! GoDaddy registrar adapter.
//!
//! Uses `GET /v1/domains/available?domain=D` with an `Authorization:
//! sso-key KEY:SECRET` header. The API answers one domain per call and
//! reports prices in micro-units of the account currency.

use super::{
    acquire_slot, build_http_client, extract_tld, snippet, upstream_rate_limited, with_deadline,
    ProviderAdapter,
};
use crate::config::GoDaddySettings;
use crate::error::DomainCheckError;
use crate::rate_limit::RateLimiter;
use crate::types::{CheckResult, ProviderKind};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const MICRO_UNITS: f64 = 1_000_000.0;

#[derive(Debug, Deserialize)]
struct AvailableResponse {
    available: bool,
    #[serde(default)]
    price: Option<u64>,
    #[serde(default)]
    definitive: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct GoDaddyAdapter {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    timeout: Duration,
    limiter: Option<Arc<RateLimiter>>,
}

impl GoDaddyAdapter {
    pub fn with_settings(
        settings: &GoDaddySettings,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Result<Self, DomainCheckError> {
        Ok(Self {
            http_client: build_http_client(ProviderKind::GoDaddy, settings.timeout)?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            timeout: settings.timeout,
            limiter,
        })
    }

    fn auth_header(&self) -> String {
        format!("sso-key {}:{}", self.api_key, self.api_secret)
    }

    async fn request_availability(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        let url = format!("{}/v1/domains/available", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("domain", domain), ("checkType", "FAST")])
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(domain, status = status.as_u16(), "godaddy response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(upstream_rate_limited(ProviderKind::GoDaddy, &response));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_error(domain, status, &body));
        }

        let parsed: AvailableResponse = serde_json::from_str(&body).map_err(|e| {
            DomainCheckError::upstream(
                "godaddy",
                format!("Malformed availability response ({}): {}", e, snippet(&body)),
            )
        })?;

        if parsed.definitive == Some(false) {
            debug!(domain, "godaddy answer is not definitive");
        }

        let price = parsed.price.map(|p| p as f64 / MICRO_UNITS);
        Ok(CheckResult::registrar(domain, "godaddy", parsed.available).with_pricing(price, None))
    }
}

/// Turn a non-2xx reply into a typed failure.
fn classify_error(domain: &str, status: StatusCode, body: &str) -> DomainCheckError {
    let parsed: Option<ErrorResponse> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|e| e.code.as_deref()).unwrap_or("");

    if code == "UNSUPPORTED_TLD" {
        return DomainCheckError::unsupported("godaddy", domain);
    }

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| snippet(body));
    DomainCheckError::upstream_with_status(
        "godaddy",
        if code.is_empty() {
            message
        } else {
            format!("{}: {}", code, message)
        },
        status.as_u16(),
    )
}

#[async_trait]
impl ProviderAdapter for GoDaddyAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GoDaddy
    }

    async fn check_one(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        if extract_tld(domain).is_none() {
            return Err(DomainCheckError::unsupported("godaddy", domain));
        }

        acquire_slot(self.limiter.as_deref()).await?;
        with_deadline(
            ProviderKind::GoDaddy,
            self.timeout,
            self.request_availability(domain),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::stub;
    use crate::types::CheckMethod;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn godaddy_stub() -> String {
        let router = Router::new().route(
            "/v1/domains/available",
            get(
                |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("sso-key key:secret");
                    if !authorized {
                        return (
                            AxumStatus::UNAUTHORIZED,
                            Json(serde_json::json!({"code": "UNABLE_TO_AUTHENTICATE", "message": "bad key"})),
                        )
                            .into_response();
                    }

                    let domain = params.get("domain").cloned().unwrap_or_default();
                    match domain.as_str() {
                        "google.com" => Json(serde_json::json!({
                            "available": false, "domain": domain, "definitive": true
                        }))
                        .into_response(),
                        "shiny.io" => Json(serde_json::json!({
                            "available": true, "domain": domain, "definitive": true,
                            "price": 39_990_000u64, "currency": "USD", "period": 1
                        }))
                        .into_response(),
                        "weird.zz" => (
                            AxumStatus::UNPROCESSABLE_ENTITY,
                            Json(serde_json::json!({"code": "UNSUPPORTED_TLD", "message": "TLD not supported"})),
                        )
                            .into_response(),
                        "busy.com" => (AxumStatus::TOO_MANY_REQUESTS, [("retry-after", "30")]).into_response(),
                        "garbage.com" => "not json".into_response(),
                        _ => (
                            AxumStatus::INTERNAL_SERVER_ERROR,
                            Json(serde_json::json!({"code": "INTERNAL", "message": "boom"})),
                        )
                            .into_response(),
                    }
                },
            ),
        );
        stub::serve(router).await
    }

    fn adapter(base: &str, secret: &str) -> GoDaddyAdapter {
        let settings = GoDaddySettings {
            base_url: format!("{}/", base),
            api_key: "key".to_string(),
            api_secret: secret.to_string(),
            timeout: Duration::from_secs(2),
            rate_limit: None,
        };
        GoDaddyAdapter::with_settings(&settings, None).unwrap()
    }

    #[tokio::test]
    async fn test_taken_and_available_with_price() {
        let base = godaddy_stub().await;
        let adapter = adapter(&base, "secret");

        let taken = adapter.check_one("google.com").await.unwrap();
        assert_eq!(taken.method, CheckMethod::Registrar);
        assert!(!taken.available);
        assert_eq!(taken.price, None);

        let free = adapter.check_one("shiny.io").await.unwrap();
        assert!(free.available);
        assert_eq!(free.price, Some(39.99));
        assert_eq!(free.provider.as_deref(), Some("godaddy"));
    }

    #[tokio::test]
    async fn test_unsupported_tld_maps_to_unsupported_domain() {
        let base = godaddy_stub().await;
        let err = adapter(&base, "secret").check_one("weird.zz").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UnsupportedDomain { .. }));
    }

    #[tokio::test]
    async fn test_upstream_failures_keep_status() {
        let base = godaddy_stub().await;

        let err = adapter(&base, "wrong").check_one("google.com").await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("UNABLE_TO_AUTHENTICATE"));

        let err = adapter(&base, "secret").check_one("other.com").await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));

        let err = adapter(&base, "secret").check_one("garbage.com").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UpstreamError { .. }));
    }

    #[tokio::test]
    async fn test_upstream_429_is_rate_limit() {
        let base = godaddy_stub().await;
        let err = adapter(&base, "secret").check_one("busy.com").await.unwrap_err();
        match err {
            DomainCheckError::RateLimitExceeded { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_name_without_suffix_rejected_locally() {
        let adapter = adapter("http://127.0.0.1:9", "secret");
        let err = adapter.check_one("localhost").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::UnsupportedDomain { .. }));
    }
}
