//! # Domain Avail Library
//!
//! A multi-provider engine for checking domain availability across RDAP
//! registries and registrar APIs.
//!
//! Lookups go through a fixed, configured chain of providers: the first
//! provider that answers wins, and a domain for which every provider fails
//! still produces a result (with `method = Error`) rather than an error.
//! Quota-bound providers sit behind a shared sliding-window rate limiter,
//! and batches of up to 100 domains are fanned out concurrently or sent
//! to a batch-capable registrar in chunks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_avail_lib::{DomainChecker, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::load(None, false)?;
//!     let checker = DomainChecker::from_config(&config)?;
//!
//!     let report = checker
//!         .check_batch(&["example.com".to_string(), "example.dev".to_string()])
//!         .await?;
//!     for result in &report.results {
//!         println!("{} - available: {} ({})", result.domain, result.available, result.method);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **RDAP**: unauthenticated, suffix-routed lookups
//! - **Registrar APIs**: GoDaddy (single-domain) and Name.com (batch, priced)
//! - **Fallback chain**: ordered provider failover per domain
//! - **Rate limiting**: per-second suspension, per-hour hard stop
//! - **Layered configuration**: TOML files plus `DA_*` environment variables

// Re-export main public API types and functions
// This makes them available as domain_avail_lib::TypeName
pub use checker::{DomainChecker, LimiterStatus};
pub use config::{
    env_config_from, load_env_config, parse_duration, CheckerSettings, ConfigManager, EnvConfig,
    Environment, FileConfig, ProviderConfig, ServerSettings, ServiceConfig, UsageSettings,
    MAX_BATCH_LIMIT,
};
pub use dispatcher::BatchDispatcher;
pub use error::DomainCheckError;
pub use protocols::{BatchProvider, ProviderAdapter};
pub use rate_limit::{RateLimit, RateLimitSnapshot, RateLimiter};
pub use resolver::FallbackResolver;
pub use types::{BatchReport, CheckMethod, CheckResult, ProviderKind, UsageEvent};
pub use usage::{validate_event, HttpUsageSink, UsageSink};
pub use utils::{normalize_domain, validate_domain};

/// Provider adapters, for embedding or wrapping individual providers
pub mod protocols;

// Internal modules - these are not part of the public API
mod checker;
mod config;
mod dispatcher;
mod error;
mod rate_limit;
mod resolver;
mod types;
mod usage;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
