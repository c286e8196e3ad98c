//! Usage-event side-channel.
//!
//! Usage events are forwarded to an external record store. Nothing in the
//! checking path depends on a sink being configured or reachable.

use crate::config::UsageSettings;
use crate::error::DomainCheckError;
use crate::protocols::snippet;
use crate::types::UsageEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for usage events.
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Store `event` and return the identifier of the created record.
    async fn record(&self, event: &UsageEvent) -> Result<String, DomainCheckError>;
}

/// Reject events missing required fields before they reach a sink.
pub fn validate_event(event: &UsageEvent) -> Result<(), DomainCheckError> {
    let required = [
        ("companyName", &event.company_name),
        ("mainDomain", &event.main_domain),
        ("email", &event.email),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DomainCheckError::invalid_input(format!("{} is required", field)));
        }
    }
    if !event.email.contains('@') {
        return Err(DomainCheckError::invalid_input("email is not a valid address"));
    }
    Ok(())
}

#[derive(Serialize)]
struct CreateRecord<'a> {
    fields: &'a UsageEvent,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: String,
}

/// Record store reached over HTTP with an optional bearer token.
pub struct HttpUsageSink {
    http_client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpUsageSink {
    pub fn new(settings: &UsageSettings) -> Result<Self, DomainCheckError> {
        let http_client = reqwest::Client::builder()
            .timeout(SINK_TIMEOUT)
            .user_agent(concat!("domain-avail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainCheckError::internal(format!("Failed to create usage HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: settings.url.clone(),
            token: settings.token.clone(),
        })
    }
}

#[async_trait]
impl UsageSink for HttpUsageSink {
    async fn record(&self, event: &UsageEvent) -> Result<String, DomainCheckError> {
        validate_event(event)?;

        let mut request = self
            .http_client
            .post(&self.url)
            .json(&CreateRecord { fields: event });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainCheckError::from(e).with_provider("usage"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainCheckError::from(e).with_provider("usage"))?;
        debug!(status = status.as_u16(), "usage sink response");

        if !status.is_success() {
            return Err(DomainCheckError::upstream_with_status(
                "usage",
                snippet(&body),
                status.as_u16(),
            ));
        }

        let created: CreatedRecord = serde_json::from_str(&body).map_err(|e| {
            DomainCheckError::upstream("usage", format!("Malformed record response: {}", e))
        })?;
        info!(record = %created.id, company = %event.company_name, "usage event recorded");
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::stub;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};

    fn event() -> UsageEvent {
        UsageEvent {
            company_name: "Acme".to_string(),
            main_domain: "acme.com".to_string(),
            email: "ops@acme.com".to_string(),
            generated_count: 12,
        }
    }

    async fn record_store() -> String {
        let router = Router::new().route(
            "/records",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer tok") {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                if body["fields"]["companyName"] != "Acme" || body["fields"]["generatedCount"] != 12 {
                    return StatusCode::UNPROCESSABLE_ENTITY.into_response();
                }
                Json(serde_json::json!({"id": "rec123", "fields": body["fields"]})).into_response()
            }),
        );
        stub::serve(router).await
    }

    #[test]
    fn test_validate_event() {
        assert!(validate_event(&event()).is_ok());

        let mut missing = event();
        missing.company_name = " ".to_string();
        assert!(validate_event(&missing).is_err());

        let mut bad_email = event();
        bad_email.email = "ops.acme.com".to_string();
        assert!(matches!(
            validate_event(&bad_email),
            Err(DomainCheckError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_returns_created_id() {
        let base = record_store().await;
        let sink = HttpUsageSink::new(&UsageSettings {
            url: format!("{}/records", base),
            token: Some("tok".to_string()),
        })
        .unwrap();

        assert_eq!(sink.record(&event()).await.unwrap(), "rec123");
    }

    #[tokio::test]
    async fn test_rejected_record_is_upstream_error() {
        let base = record_store().await;
        let sink = HttpUsageSink::new(&UsageSettings {
            url: format!("{}/records", base),
            token: None,
        })
        .unwrap();

        let err = sink.record(&event()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }
}
