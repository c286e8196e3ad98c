//! Error handling for domain availability lookups.
//!
//! This module defines the error type shared by every layer of the engine:
//! batch validation, provider adapters, the rate limiter, configuration
//! loading and the usage side-channel.

use std::fmt;
use std::time::Duration;

/// Main error type for domain availability operations.
///
/// Any error an adapter returns sends the fallback resolver on to the next
/// provider; when the chain runs out the failures are folded into an
/// `AllProvidersFailed` summary. Only batch-shape `InvalidInput` reaches the
/// caller of a batch.
#[derive(Debug, Clone)]
pub enum DomainCheckError {
    /// Malformed or out-of-bound request (bad batch shape, bad domain)
    InvalidInput {
        message: String,
    },

    /// No route exists for the domain's suffix on this provider
    UnsupportedDomain {
        provider: String,
        domain: String,
    },

    /// Upstream call exceeded its deadline
    UpstreamTimeout {
        provider: String,
        duration: Duration,
    },

    /// Transport failure, non-2xx response or unparseable body
    UpstreamError {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Local (or upstream-reported) quota exhausted
    RateLimitExceeded {
        provider: String,
        retry_after: Option<Duration>,
    },

    /// Every provider in the chain failed for a domain
    AllProvidersFailed {
        domain: String,
        summary: String,
    },

    /// Configuration errors (invalid settings, missing credentials, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl DomainCheckError {
    /// Create a new invalid input error.
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new unsupported domain error.
    pub fn unsupported<P: Into<String>, D: Into<String>>(provider: P, domain: D) -> Self {
        Self::UnsupportedDomain {
            provider: provider.into(),
            domain: domain.into(),
        }
    }

    /// Create a new upstream timeout error.
    pub fn timeout<P: Into<String>>(provider: P, duration: Duration) -> Self {
        Self::UpstreamTimeout {
            provider: provider.into(),
            duration,
        }
    }

    /// Create a new upstream error.
    pub fn upstream<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::UpstreamError {
            provider: provider.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new upstream error with HTTP status code.
    pub fn upstream_with_status<P: Into<String>, M: Into<String>>(
        provider: P,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::UpstreamError {
            provider: provider.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new rate limit error.
    pub fn rate_limited<P: Into<String>>(provider: P, retry_after: Option<Duration>) -> Self {
        Self::RateLimitExceeded {
            provider: provider.into(),
            retry_after,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach a provider name to a transport-level error.
    ///
    /// `From<reqwest::Error>` has no idea which adapter issued the call, so
    /// adapters convert and then stamp their own name on the result.
    pub fn with_provider<P: Into<String>>(self, name: P) -> Self {
        let name = name.into();
        match self {
            Self::UpstreamTimeout { duration, .. } => Self::UpstreamTimeout {
                provider: name,
                duration,
            },
            Self::UpstreamError {
                message,
                status_code,
                ..
            } => Self::UpstreamError {
                provider: name,
                message,
                status_code,
            },
            Self::RateLimitExceeded { retry_after, .. } => Self::RateLimitExceeded {
                provider: name,
                retry_after,
            },
            other => other,
        }
    }

    /// HTTP status reported by the upstream provider, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UpstreamError { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl fmt::Display for DomainCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "Invalid input: {}", message),
            Self::UnsupportedDomain { provider, domain } => {
                write!(f, "{} has no route for '{}'", provider, domain)
            }
            Self::UpstreamTimeout { provider, duration } => {
                write!(f, "{} timed out after {:?}", provider, duration)
            }
            Self::UpstreamError {
                provider,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "{} error (HTTP {}): {}", provider, code, message)
                } else {
                    write!(f, "{} error: {}", provider, message)
                }
            }
            Self::RateLimitExceeded {
                provider,
                retry_after,
            } => {
                if let Some(retry) = retry_after {
                    write!(f, "{} rate limit exceeded (retry after {:?})", provider, retry)
                } else {
                    write!(f, "{} rate limit exceeded", provider)
                }
            }
            Self::AllProvidersFailed { domain, summary } => {
                write!(f, "All providers failed for '{}': {}", domain, summary)
            }
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for DomainCheckError {}

// Implement From conversions for common error types
impl From<reqwest::Error> for DomainCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("http", Duration::ZERO)
        } else if err.is_connect() {
            Self::upstream("http", format!("Connection failed: {}", err))
        } else if let Some(status) = err.status() {
            Self::upstream_with_status("http", err.to_string(), status.as_u16())
        } else {
            Self::upstream("http", format!("HTTP request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for DomainCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::upstream("json", format!("JSON parsing failed: {}", err))
    }
}

impl From<std::io::Error> for DomainCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for DomainCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_provider_rewrites_transport_errors() {
        let err = DomainCheckError::upstream_with_status("http", "bad gateway", 502)
            .with_provider("godaddy");
        assert_eq!(err.status_code(), Some(502));
        assert!(err.to_string().starts_with("godaddy error (HTTP 502)"));

        let untouched = DomainCheckError::invalid_input("nope").with_provider("godaddy");
        assert!(matches!(untouched, DomainCheckError::InvalidInput { .. }));
    }

    #[test]
    fn test_display_preserves_status() {
        let err = DomainCheckError::upstream_with_status("rdap", "server error", 503);
        assert_eq!(err.to_string(), "rdap error (HTTP 503): server error");
    }
}
