//! Main domain checker implementation.
//!
//! This module provides the `DomainChecker` struct that wires configuration
//! into live components: one rate limiter per quota-bound provider, one
//! adapter per configured provider, the fallback resolver over the
//! configured priority order, and the batch dispatcher on top.

use crate::config::{CheckerSettings, ProviderConfig, ServiceConfig};
use crate::dispatcher::BatchDispatcher;
use crate::error::DomainCheckError;
use crate::protocols::{
    BatchProvider, GoDaddyAdapter, NameComAdapter, ProviderAdapter, RdapAdapter,
};
use crate::rate_limit::{RateLimit, RateLimitSnapshot, RateLimiter};
use crate::resolver::FallbackResolver;
use crate::types::{BatchReport, CheckResult, ProviderKind};
use crate::utils::validate_domain;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Live quota usage for one rate-limited provider.
#[derive(Debug, Clone, Serialize)]
pub struct LimiterStatus {
    pub provider: String,
    pub limits: RateLimit,
    pub usage: RateLimitSnapshot,
}

/// Adapter instance built for one provider, with its batch view if any.
struct BuiltProvider {
    adapter: Arc<dyn ProviderAdapter>,
    batch: Option<Arc<dyn BatchProvider>>,
}

/// Main domain checker that coordinates availability checking operations.
///
/// The `DomainChecker` is built once at startup and shared by every request:
/// - Provider adapters are resolved from tagged configuration, not looked
///   up by name per call
/// - Rate limiters live as long as the checker and are handed to their
///   adapters by `Arc`
/// - Single checks go through the fallback chain; batches go through the
///   dispatcher
///
/// # Example
///
/// ```rust,no_run
/// use domain_avail_lib::{DomainChecker, ServiceConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::from_config(&ServiceConfig::default())?;
///     let result = checker.check_domain("example.com").await?;
///     println!("{}: {} via {}", result.domain, result.available, result.method);
///     Ok(())
/// }
/// ```
pub struct DomainChecker {
    dispatcher: BatchDispatcher,
    limiters: Vec<Arc<RateLimiter>>,
}

impl DomainChecker {
    /// Build every component described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a provider named in the fallback order or
    /// as batch provider has no settings, or when a limiter or HTTP client
    /// cannot be created.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, DomainCheckError> {
        let mut limiters = Vec::new();
        let mut built: HashMap<ProviderKind, BuiltProvider> = HashMap::new();

        for provider in &config.providers {
            let limiter = match provider.rate_limit() {
                Some(limits) => {
                    let limiter = Arc::new(RateLimiter::new(provider.kind().as_str(), limits)?);
                    limiters.push(Arc::clone(&limiter));
                    Some(limiter)
                }
                None => None,
            };
            built.insert(provider.kind(), build_provider(provider, limiter)?);
        }

        let chain = config
            .fallback_order
            .iter()
            .map(|kind| {
                built
                    .get(kind)
                    .map(|p| Arc::clone(&p.adapter))
                    .ok_or_else(|| missing_provider(*kind))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let batch = match config.batch_provider {
            Some(kind) => Some(
                built
                    .get(&kind)
                    .and_then(|p| p.batch.clone())
                    .ok_or_else(|| missing_provider(kind))?,
            ),
            None => None,
        };

        let checker = Self::assemble(chain, batch, &config.checker, limiters)?;
        info!(
            fallback_order = ?checker.fallback_order(),
            batch_provider = ?checker.batch_provider(),
            concurrency = checker.dispatcher.concurrency(),
            "domain checker ready"
        );
        Ok(checker)
    }

    /// Build a checker over already-constructed adapters.
    ///
    /// Useful for embedding custom providers and for tests.
    pub fn from_adapters(
        chain: Vec<Arc<dyn ProviderAdapter>>,
        batch_provider: Option<Arc<dyn BatchProvider>>,
        settings: &CheckerSettings,
    ) -> Result<Self, DomainCheckError> {
        Self::assemble(chain, batch_provider, settings, Vec::new())
    }

    fn assemble(
        chain: Vec<Arc<dyn ProviderAdapter>>,
        batch_provider: Option<Arc<dyn BatchProvider>>,
        settings: &CheckerSettings,
        limiters: Vec<Arc<RateLimiter>>,
    ) -> Result<Self, DomainCheckError> {
        let resolver = FallbackResolver::new(chain)?;
        let mut dispatcher = BatchDispatcher::new(resolver)
            .with_concurrency(settings.concurrency)
            .with_max_batch(settings.max_batch);
        if let Some(provider) = batch_provider {
            dispatcher = dispatcher.with_batch_provider(provider);
        }
        Ok(Self {
            dispatcher,
            limiters,
        })
    }

    /// Check availability of a single domain.
    ///
    /// The name is validated and normalized, then tried against each
    /// provider in fallback order. Provider failures never surface as
    /// errors: when the whole chain fails the result has `method = Error`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the domain name is malformed.
    pub async fn check_domain(&self, domain: &str) -> Result<CheckResult, DomainCheckError> {
        let lookup = validate_domain(domain)?;
        let mut result = self.dispatcher.resolver().resolve(&lookup).await;
        result.domain = domain.trim().to_string();
        Ok(result)
    }

    /// Check a list of domains and return the aggregate report.
    ///
    /// Results are in the same order as `domains`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the list is empty or larger than the
    /// configured maximum.
    pub async fn check_batch(&self, domains: &[String]) -> Result<BatchReport, DomainCheckError> {
        self.dispatcher.dispatch(domains).await
    }

    /// Check a domain list taken straight from a request body.
    pub async fn check_batch_value(
        &self,
        value: &serde_json::Value,
    ) -> Result<BatchReport, DomainCheckError> {
        self.dispatcher.dispatch_value(value).await
    }

    /// Provider names in fallback order.
    pub fn fallback_order(&self) -> Vec<&str> {
        self.dispatcher.resolver().order()
    }

    /// Name of the batch provider, if one is configured.
    pub fn batch_provider(&self) -> Option<&str> {
        self.dispatcher.batch_provider_name()
    }

    pub fn max_batch(&self) -> usize {
        self.dispatcher.max_batch()
    }

    /// Current quota usage of every rate-limited provider.
    pub async fn rate_limits(&self) -> Vec<LimiterStatus> {
        let mut statuses = Vec::with_capacity(self.limiters.len());
        for limiter in &self.limiters {
            statuses.push(LimiterStatus {
                provider: limiter.provider().to_string(),
                limits: limiter.limits(),
                usage: limiter.snapshot().await,
            });
        }
        statuses
    }
}

fn build_provider(
    config: &ProviderConfig,
    limiter: Option<Arc<RateLimiter>>,
) -> Result<BuiltProvider, DomainCheckError> {
    Ok(match config {
        ProviderConfig::Rdap(settings) => BuiltProvider {
            adapter: Arc::new(RdapAdapter::with_settings(settings, limiter)?),
            batch: None,
        },
        ProviderConfig::GoDaddy(settings) => BuiltProvider {
            adapter: Arc::new(GoDaddyAdapter::with_settings(settings, limiter)?),
            batch: None,
        },
        ProviderConfig::NameCom(settings) => {
            let adapter = Arc::new(NameComAdapter::with_settings(settings, limiter)?);
            BuiltProvider {
                adapter: adapter.clone(),
                batch: Some(adapter as Arc<dyn BatchProvider>),
            }
        }
    })
}

fn missing_provider(kind: ProviderKind) -> DomainCheckError {
    DomainCheckError::config(format!("provider '{}' is referenced but not configured", kind))
}
