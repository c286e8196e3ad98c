//! Application state shared by all HTTP handlers.

use domain_avail_lib::{DomainCheckError, DomainChecker, HttpUsageSink, ServiceConfig, UsageSink};
use std::sync::Arc;
use std::time::Duration;

/// Built once at startup; cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Lookup engine: adapters, limiters, resolver and dispatcher
    pub checker: Arc<DomainChecker>,
    /// Usage-event record store, when configured
    pub usage: Option<Arc<dyn UsageSink>>,
    /// Outer deadline for one check request
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        checker: Arc<DomainChecker>,
        usage: Option<Arc<dyn UsageSink>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            checker,
            usage,
            request_timeout,
        }
    }

    /// Build the engine and side-channel described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, DomainCheckError> {
        let checker = Arc::new(DomainChecker::from_config(config)?);
        let usage = match &config.usage {
            Some(settings) => Some(Arc::new(HttpUsageSink::new(settings)?) as Arc<dyn UsageSink>),
            None => None,
        };
        Ok(Self::new(checker, usage, config.server.request_timeout))
    }
}
