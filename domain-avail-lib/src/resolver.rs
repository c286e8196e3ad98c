//! Ordered provider failover for a single domain.

use crate::error::DomainCheckError;
use crate::protocols::ProviderAdapter;
use crate::types::CheckResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tries a fixed chain of adapters in priority order.
///
/// The first adapter to answer wins. When every adapter fails the resolver
/// returns a `method = Error` sentinel instead of an error, so callers
/// fanning out over a batch always get one result per domain.
#[derive(Clone)]
pub struct FallbackResolver {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl FallbackResolver {
    /// Build a resolver over `adapters`, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an empty chain.
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Result<Self, DomainCheckError> {
        if adapters.is_empty() {
            return Err(DomainCheckError::config(
                "fallback chain needs at least one provider",
            ));
        }
        Ok(Self { adapters })
    }

    /// Provider names in the order they are tried.
    pub fn order(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Resolve one domain through the chain.
    pub async fn resolve(&self, domain: &str) -> CheckResult {
        match self.try_resolve(domain).await {
            Ok(result) => result,
            Err(err) => {
                let summary = match &err {
                    DomainCheckError::AllProvidersFailed { summary, .. } => summary.clone(),
                    other => other.to_string(),
                };
                CheckResult::failed(domain, summary)
            }
        }
    }

    /// Resolve one domain, surfacing `AllProvidersFailed` when the chain is exhausted.
    pub async fn try_resolve(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        let mut failures: Vec<String> = Vec::with_capacity(self.adapters.len());

        for (attempt, adapter) in self.adapters.iter().enumerate() {
            match adapter.check_one(domain).await {
                Ok(result) => {
                    debug!(domain, provider = adapter.name(), attempt, "resolved");
                    return Ok(result);
                }
                Err(err) => {
                    warn!(domain, provider = adapter.name(), error = %err, "provider failed, trying next");
                    failures.push(format!("{}: {}", adapter.name(), err));
                }
            }
        }

        Err(DomainCheckError::AllProvidersFailed {
            domain: domain.to_string(),
            summary: failures.join("; "),
        })
    }
}
