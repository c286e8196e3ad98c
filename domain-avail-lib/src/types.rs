//! Core data types for domain availability checking.
//!
//! This module defines the canonical result shape every provider normalizes
//! into, the aggregate batch report, and the usage event accepted by the
//! side-channel.

use serde::{Deserialize, Serialize};

/// Normalized outcome of checking one domain.
///
/// `available = false` means two different things depending on `method`:
/// a registered domain when the method is `Rdap` or `Registrar`, and a
/// failed lookup when the method is `Error`. Callers must look at `method`
/// before trusting `available`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// The domain name that was checked (e.g., "example.com")
    pub domain: String,

    /// Whether the domain can be registered
    pub available: bool,

    /// Which path produced the result
    pub method: CheckMethod,

    /// Registration price, when the provider reports commercial pricing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Renewal price, when the provider reports commercial pricing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_price: Option<f64>,

    /// Whether the registrar flags the name as premium-priced
    #[serde(default)]
    pub premium: bool,

    /// Name of the adapter that answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Failure summary, set only when `method` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    /// Availability answer from an RDAP registry.
    pub fn rdap<D: Into<String>>(domain: D, available: bool) -> Self {
        Self {
            domain: domain.into(),
            available,
            method: CheckMethod::Rdap,
            price: None,
            renewal_price: None,
            premium: false,
            provider: Some("rdap".to_string()),
            error: None,
        }
    }

    /// Availability answer from a registrar API.
    pub fn registrar<D: Into<String>, P: Into<String>>(
        domain: D,
        provider: P,
        available: bool,
    ) -> Self {
        Self {
            domain: domain.into(),
            available,
            method: CheckMethod::Registrar,
            price: None,
            renewal_price: None,
            premium: false,
            provider: Some(provider.into()),
            error: None,
        }
    }

    /// Sentinel failure result. Never a statement about registration.
    pub fn failed<D: Into<String>, E: Into<String>>(domain: D, error: E) -> Self {
        Self {
            domain: domain.into(),
            available: false,
            method: CheckMethod::Error,
            price: None,
            renewal_price: None,
            premium: false,
            provider: None,
            error: Some(error.into()),
        }
    }

    /// Attach registrar pricing.
    pub fn with_pricing(mut self, price: Option<f64>, renewal_price: Option<f64>) -> Self {
        self.price = price;
        self.renewal_price = renewal_price;
        self
    }

    /// Mark the result as premium-priced.
    pub fn with_premium(mut self, premium: bool) -> Self {
        self.premium = premium;
        self
    }

    /// Whether this result is a failure sentinel.
    pub fn is_error(&self) -> bool {
        self.method == CheckMethod::Error
    }
}

/// Method that produced a [`CheckResult`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckMethod {
    /// Answered by an RDAP registry lookup
    #[serde(rename = "rdap")]
    Rdap,

    /// Answered by an authenticated registrar API
    #[serde(rename = "registrar")]
    Registrar,

    /// No provider could answer
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckMethod::Rdap => write!(f, "RDAP"),
            CheckMethod::Registrar => write!(f, "Registrar"),
            CheckMethod::Error => write!(f, "Error"),
        }
    }
}

/// The upstream providers this engine knows how to talk to.
///
/// Configuration names providers by these tags; each tag is resolved once
/// at startup into a concrete adapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Suffix-keyed RDAP registries, unauthenticated
    Rdap,
    /// Account-keyed registrar API, single-domain lookups
    #[serde(rename = "godaddy")]
    GoDaddy,
    /// Account-keyed registrar API with native batch lookups
    #[serde(rename = "namecom")]
    NameCom,
}

impl ProviderKind {
    /// Whether the provider answers many domains in one upstream call.
    pub fn is_batch_capable(&self) -> bool {
        matches!(self, ProviderKind::NameCom)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Rdap => "rdap",
            ProviderKind::GoDaddy => "godaddy",
            ProviderKind::NameCom => "namecom",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rdap" => Ok(ProviderKind::Rdap),
            "godaddy" => Ok(ProviderKind::GoDaddy),
            "namecom" | "name.com" => Ok(ProviderKind::NameCom),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Aggregate result of a batch dispatch.
///
/// `results[i]` always corresponds to the i-th requested domain, and
/// `available_count + unavailable_count == total_checked`. Error sentinels
/// are counted as unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub results: Vec<CheckResult>,
    pub total_checked: usize,
    pub available_count: usize,
    pub unavailable_count: usize,
    pub duration_ms: u64,
}

impl BatchReport {
    /// Build the report once every outcome is known.
    pub fn from_results(results: Vec<CheckResult>, duration_ms: u64) -> Self {
        let available_count = results.iter().filter(|r| r.available).count();
        let total_checked = results.len();
        Self {
            total_checked,
            available_count,
            unavailable_count: total_checked - available_count,
            duration_ms,
            results,
        }
    }

    /// Number of results that are failure sentinels.
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_error()).count()
    }
}

/// Usage event forwarded to the external record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub company_name: String,
    pub main_domain: String,
    pub email: String,
    pub generated_count: u32,
}
