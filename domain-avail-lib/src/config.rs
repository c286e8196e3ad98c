//! Configuration file parsing and management.
//!
//! Configuration is layered: built-in defaults, then a TOML file, then
//! `DA_*` environment variables. The merged [`FileConfig`] is resolved once
//! into a [`ServiceConfig`], whose provider entries are concrete tagged
//! variants ready to be turned into adapters.

use crate::error::DomainCheckError;
use crate::rate_limit::RateLimit;
use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hard ceiling on the number of domains in one batch.
pub const MAX_BATCH_LIMIT: usize = 100;

const DEFAULT_NAMECOM_BATCH: usize = 50;

// ---------------------------------------------------------------------------
// File-level configuration (everything optional, merged by precedence)
// ---------------------------------------------------------------------------

/// Configuration loaded from TOML files or the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Active environment ("production" or "sandbox")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Providers tried in order for single-domain resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_order: Option<Vec<String>>,

    /// Batch-capable provider used for whole-batch lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerFileConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker: Option<CheckerFileConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<ProvidersFileConfig>,

    /// Usage-event record store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageFileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Outer deadline for one HTTP request (e.g. "30s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckerFileConfig {
    /// Concurrent per-domain resolutions within one batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Largest accepted batch (at most 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_batch: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap: Option<RdapFileConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub godaddy: Option<GoDaddyFileConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namecom: Option<NameComFileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RdapFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    /// Extra or replacement TLD routes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoDaddyFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NameComFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UsageFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Which registrar deployment the credentials belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" | "live" => Ok(Environment::Production),
            "sandbox" | "ote" | "test" | "dev" => Ok(Environment::Sandbox),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Connection data for the RDAP adapter.
#[derive(Debug, Clone)]
pub struct RdapSettings {
    pub timeout: Duration,
    pub endpoints: HashMap<String, String>,
    pub rate_limit: Option<RateLimit>,
}

impl Default for RdapSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            endpoints: HashMap::new(),
            rate_limit: None,
        }
    }
}

/// Connection data for the GoDaddy adapter.
#[derive(Debug, Clone)]
pub struct GoDaddySettings {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout: Duration,
    pub rate_limit: Option<RateLimit>,
}

impl GoDaddySettings {
    pub fn default_base_url(environment: Environment) -> &'static str {
        match environment {
            Environment::Production => "https://api.godaddy.com",
            Environment::Sandbox => "https://api.ote-godaddy.com",
        }
    }
}

/// Connection data for the Name.com adapter.
#[derive(Debug, Clone)]
pub struct NameComSettings {
    pub base_url: String,
    pub username: String,
    pub token: String,
    pub timeout: Duration,
    pub rate_limit: Option<RateLimit>,
    pub max_batch_size: usize,
}

impl NameComSettings {
    pub fn default_base_url(environment: Environment) -> &'static str {
        match environment {
            Environment::Production => "https://api.name.com",
            Environment::Sandbox => "https://api.dev.name.com",
        }
    }

    /// Documented account quota.
    pub fn default_rate_limit() -> RateLimit {
        RateLimit::new(20, 3000)
    }
}

/// Static per-provider configuration, one variant per provider.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Rdap(RdapSettings),
    GoDaddy(GoDaddySettings),
    NameCom(NameComSettings),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Rdap(_) => ProviderKind::Rdap,
            ProviderConfig::GoDaddy(_) => ProviderKind::GoDaddy,
            ProviderConfig::NameCom(_) => ProviderKind::NameCom,
        }
    }

    pub fn rate_limit(&self) -> Option<RateLimit> {
        match self {
            ProviderConfig::Rdap(s) => s.rate_limit,
            ProviderConfig::GoDaddy(s) => s.rate_limit,
            ProviderConfig::NameCom(s) => s.rate_limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckerSettings {
    pub concurrency: usize,
    pub max_batch: usize,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            concurrency: 20,
            max_batch: MAX_BATCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsageSettings {
    pub url: String,
    pub token: Option<String>,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub server: ServerSettings,
    pub checker: CheckerSettings,
    /// Providers tried in order by the fallback resolver
    pub fallback_order: Vec<ProviderKind>,
    /// Provider used for whole-batch lookups, if any
    pub batch_provider: Option<ProviderKind>,
    /// Settings for every provider referenced above
    pub providers: Vec<ProviderConfig>,
    pub usage: Option<UsageSettings>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerSettings::default(),
            checker: CheckerSettings::default(),
            fallback_order: vec![ProviderKind::Rdap],
            batch_provider: None,
            providers: vec![ProviderConfig::Rdap(RdapSettings::default())],
            usage: None,
        }
    }
}

impl ServiceConfig {
    /// Discover config files, apply `DA_*` overrides and resolve.
    ///
    /// An explicit `path` replaces file discovery and must exist.
    pub fn load(path: Option<&Path>, verbose: bool) -> Result<Self, DomainCheckError> {
        let manager = ConfigManager::new(verbose);
        let env_config = load_env_config();

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env_config.config_path.clone());

        let file_config = match explicit {
            Some(path) => manager.load_file(&path)?,
            None => manager.discover_and_load()?,
        };

        let merged = manager.merge_configs(file_config, env_config.overlay);
        Self::from_file_config(merged)
    }

    /// Resolve a merged file configuration into concrete settings.
    pub fn from_file_config(config: FileConfig) -> Result<Self, DomainCheckError> {
        let environment = match &config.environment {
            Some(name) => name.parse().map_err(DomainCheckError::config)?,
            None => Environment::Production,
        };

        let server = resolve_server(config.server.unwrap_or_default())?;
        let checker = resolve_checker(config.checker.unwrap_or_default())?;
        let providers = config.providers.unwrap_or_default();

        let fallback_order = match &config.fallback_order {
            Some(names) => parse_provider_list(names)?,
            None => default_fallback_order(&providers),
        };
        if fallback_order.is_empty() {
            return Err(DomainCheckError::config("fallback_order cannot be empty"));
        }

        let batch_provider = match &config.batch_provider {
            Some(name) if !name.trim().is_empty() => Some(
                name.parse::<ProviderKind>()
                    .map_err(DomainCheckError::config)?,
            ),
            _ => None,
        };
        if let Some(kind) = batch_provider {
            if !kind.is_batch_capable() {
                return Err(DomainCheckError::config(format!(
                    "batch_provider '{}' does not support batch lookups",
                    kind
                )));
            }
        }

        let mut needed: Vec<ProviderKind> = fallback_order.clone();
        if let Some(kind) = batch_provider {
            if !needed.contains(&kind) {
                needed.push(kind);
            }
        }

        let resolved = needed
            .iter()
            .map(|kind| resolve_provider(*kind, &providers, environment))
            .collect::<Result<Vec<_>, _>>()?;

        let usage = match config.usage {
            Some(UsageFileConfig { url: Some(url), token }) if !url.trim().is_empty() => {
                Some(UsageSettings {
                    url: url.trim().to_string(),
                    token: token.filter(|t| !t.trim().is_empty()),
                })
            }
            _ => None,
        };

        Ok(Self {
            environment,
            server,
            checker,
            fallback_order,
            batch_provider,
            providers: resolved,
            usage,
        })
    }

    /// Settings for `kind`, if it is part of this configuration.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Effective configuration with every credential masked.
    pub fn redacted(&self) -> serde_json::Value {
        let providers: serde_json::Map<String, serde_json::Value> = self
            .providers
            .iter()
            .map(|provider| {
                let value = match provider {
                    ProviderConfig::Rdap(s) => serde_json::json!({
                        "timeout": format_duration(s.timeout),
                        "endpoint_overrides": s.endpoints.len(),
                        "rate_limit": s.rate_limit,
                    }),
                    ProviderConfig::GoDaddy(s) => serde_json::json!({
                        "base_url": s.base_url,
                        "api_key": mask(&s.api_key),
                        "api_secret": "***",
                        "timeout": format_duration(s.timeout),
                        "rate_limit": s.rate_limit,
                    }),
                    ProviderConfig::NameCom(s) => serde_json::json!({
                        "base_url": s.base_url,
                        "username": s.username,
                        "token": "***",
                        "timeout": format_duration(s.timeout),
                        "rate_limit": s.rate_limit,
                        "max_batch_size": s.max_batch_size,
                    }),
                };
                (provider.kind().to_string(), value)
            })
            .collect();

        serde_json::json!({
            "environment": self.environment.to_string(),
            "server": {
                "host": self.server.host,
                "port": self.server.port,
                "request_timeout": format_duration(self.server.request_timeout),
            },
            "checker": {
                "concurrency": self.checker.concurrency,
                "max_batch": self.checker.max_batch,
            },
            "fallback_order": self.fallback_order,
            "batch_provider": self.batch_provider,
            "providers": providers,
            "usage": self.usage.as_ref().map(|u| u.url.clone()),
        })
    }
}

fn resolve_server(config: ServerFileConfig) -> Result<ServerSettings, DomainCheckError> {
    let defaults = ServerSettings::default();
    Ok(ServerSettings {
        host: config.host.unwrap_or(defaults.host),
        port: config.port.unwrap_or(defaults.port),
        request_timeout: match config.request_timeout {
            Some(s) => require_duration("server.request_timeout", &s)?,
            None => defaults.request_timeout,
        },
    })
}

fn resolve_checker(config: CheckerFileConfig) -> Result<CheckerSettings, DomainCheckError> {
    let defaults = CheckerSettings::default();
    let concurrency = config.concurrency.unwrap_or(defaults.concurrency);
    if concurrency == 0 || concurrency > 100 {
        return Err(DomainCheckError::config(
            "Concurrency must be between 1 and 100",
        ));
    }
    let max_batch = config.max_batch.unwrap_or(defaults.max_batch);
    if max_batch == 0 || max_batch > MAX_BATCH_LIMIT {
        return Err(DomainCheckError::config(format!(
            "max_batch must be between 1 and {}",
            MAX_BATCH_LIMIT
        )));
    }
    Ok(CheckerSettings {
        concurrency,
        max_batch,
    })
}

fn parse_provider_list(names: &[String]) -> Result<Vec<ProviderKind>, DomainCheckError> {
    let mut kinds = Vec::new();
    for name in names {
        let kind: ProviderKind = name.parse().map_err(DomainCheckError::config)?;
        if kinds.contains(&kind) {
            return Err(DomainCheckError::config(format!(
                "provider '{}' listed twice in fallback_order",
                kind
            )));
        }
        kinds.push(kind);
    }
    Ok(kinds)
}

/// RDAP first, then each registrar that has credentials.
fn default_fallback_order(providers: &ProvidersFileConfig) -> Vec<ProviderKind> {
    let mut order = vec![ProviderKind::Rdap];
    if providers
        .godaddy
        .as_ref()
        .is_some_and(|g| has_value(&g.api_key) && has_value(&g.api_secret))
    {
        order.push(ProviderKind::GoDaddy);
    }
    if providers
        .namecom
        .as_ref()
        .is_some_and(|n| has_value(&n.username) && has_value(&n.token))
    {
        order.push(ProviderKind::NameCom);
    }
    order
}

fn resolve_provider(
    kind: ProviderKind,
    providers: &ProvidersFileConfig,
    environment: Environment,
) -> Result<ProviderConfig, DomainCheckError> {
    match kind {
        ProviderKind::Rdap => {
            let file = providers.rdap.clone().unwrap_or_default();
            let defaults = RdapSettings::default();
            Ok(ProviderConfig::Rdap(RdapSettings {
                timeout: optional_duration("providers.rdap.timeout", file.timeout)?
                    .unwrap_or(defaults.timeout),
                endpoints: file.endpoints.unwrap_or_default(),
                rate_limit: validate_rate_limit("rdap", file.rate_limit)?,
            }))
        }
        ProviderKind::GoDaddy => {
            let file = providers.godaddy.clone().unwrap_or_default();
            let api_key = require_value("providers.godaddy.api_key", file.api_key)?;
            let api_secret = require_value("providers.godaddy.api_secret", file.api_secret)?;
            Ok(ProviderConfig::GoDaddy(GoDaddySettings {
                base_url: file
                    .base_url
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| GoDaddySettings::default_base_url(environment).to_string()),
                api_key,
                api_secret,
                timeout: optional_duration("providers.godaddy.timeout", file.timeout)?
                    .unwrap_or(Duration::from_secs(5)),
                rate_limit: validate_rate_limit("godaddy", file.rate_limit)?,
            }))
        }
        ProviderKind::NameCom => {
            let file = providers.namecom.clone().unwrap_or_default();
            let username = require_value("providers.namecom.username", file.username)?;
            let token = require_value("providers.namecom.token", file.token)?;
            let max_batch_size = file.max_batch_size.unwrap_or(DEFAULT_NAMECOM_BATCH);
            if max_batch_size == 0 {
                return Err(DomainCheckError::config(
                    "providers.namecom.max_batch_size must be greater than zero",
                ));
            }
            Ok(ProviderConfig::NameCom(NameComSettings {
                base_url: file
                    .base_url
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or_else(|| NameComSettings::default_base_url(environment).to_string()),
                username,
                token,
                timeout: optional_duration("providers.namecom.timeout", file.timeout)?
                    .unwrap_or(Duration::from_secs(8)),
                rate_limit: validate_rate_limit("namecom", file.rate_limit)?
                    .or(Some(NameComSettings::default_rate_limit())),
                max_batch_size,
            }))
        }
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_ref().is_some_and(|v| !v.trim().is_empty())
}

fn require_value(field: &str, value: Option<String>) -> Result<String, DomainCheckError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(DomainCheckError::config(format!("{} is required", field))),
    }
}

fn require_duration(field: &str, value: &str) -> Result<Duration, DomainCheckError> {
    parse_duration(value).ok_or_else(|| {
        DomainCheckError::config(format!(
            "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
            field, value
        ))
    })
}

fn optional_duration(
    field: &str,
    value: Option<String>,
) -> Result<Option<Duration>, DomainCheckError> {
    value.map(|v| require_duration(field, &v)).transpose()
}

fn validate_rate_limit(
    provider: &str,
    limit: Option<RateLimit>,
) -> Result<Option<RateLimit>, DomainCheckError> {
    match limit {
        Some(l) if l.per_second == 0 || l.per_hour == 0 => Err(DomainCheckError::config(format!(
            "Rate limits for '{}' must be greater than zero",
            provider
        ))),
        other => Ok(other),
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{}***", visible)
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() != 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{}s", duration.as_secs())
    }
}

// ---------------------------------------------------------------------------
// Discovery and merging
// ---------------------------------------------------------------------------

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        if self.verbose {
            info!(path = %path.display(), "loaded configuration file");
        } else {
            debug!(path = %path.display(), "loaded configuration file");
        }
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest precedence, the working directory highest.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let mut merged = FileConfig::default();
        let mut loaded = Vec::new();

        for path in [self.get_xdg_config_path(), self.get_local_config_path()]
            .into_iter()
            .flatten()
        {
            let config = self.load_file(&path)?;
            merged = self.merge_configs(merged, config);
            loaded.push(path);
        }

        if self.verbose && loaded.len() > 1 {
            warn!(files = ?loaded, "multiple config files found, later files take precedence");
        }

        Ok(merged)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./domain-avail.toml", "./.domain-avail.toml"]
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("domain-avail").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            environment: higher.environment.or(lower.environment),
            fallback_order: higher.fallback_order.or(lower.fallback_order),
            batch_provider: higher.batch_provider.or(lower.batch_provider),
            server: merge_option(lower.server, higher.server, |l, h| ServerFileConfig {
                host: h.host.or(l.host),
                port: h.port.or(l.port),
                request_timeout: h.request_timeout.or(l.request_timeout),
            }),
            checker: merge_option(lower.checker, higher.checker, |l, h| CheckerFileConfig {
                concurrency: h.concurrency.or(l.concurrency),
                max_batch: h.max_batch.or(l.max_batch),
            }),
            providers: merge_option(lower.providers, higher.providers, merge_providers),
            usage: merge_option(lower.usage, higher.usage, |l, h| UsageFileConfig {
                url: h.url.or(l.url),
                token: h.token.or(l.token),
            }),
        }
    }
}

fn merge_option<T>(lower: Option<T>, higher: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (lower, higher) {
        (Some(l), Some(h)) => Some(merge(l, h)),
        (l, h) => h.or(l),
    }
}

fn merge_providers(lower: ProvidersFileConfig, higher: ProvidersFileConfig) -> ProvidersFileConfig {
    ProvidersFileConfig {
        rdap: merge_option(lower.rdap, higher.rdap, |l, h| RdapFileConfig {
            timeout: h.timeout.or(l.timeout),
            endpoints: match (l.endpoints, h.endpoints) {
                (Some(mut l), Some(h)) => {
                    l.extend(h);
                    Some(l)
                }
                (l, h) => h.or(l),
            },
            rate_limit: h.rate_limit.or(l.rate_limit),
        }),
        godaddy: merge_option(lower.godaddy, higher.godaddy, |l, h| GoDaddyFileConfig {
            api_key: h.api_key.or(l.api_key),
            api_secret: h.api_secret.or(l.api_secret),
            base_url: h.base_url.or(l.base_url),
            timeout: h.timeout.or(l.timeout),
            rate_limit: h.rate_limit.or(l.rate_limit),
        }),
        namecom: merge_option(lower.namecom, higher.namecom, |l, h| NameComFileConfig {
            username: h.username.or(l.username),
            token: h.token.or(l.token),
            base_url: h.base_url.or(l.base_url),
            timeout: h.timeout.or(l.timeout),
            rate_limit: h.rate_limit.or(l.rate_limit),
            max_batch_size: h.max_batch_size.or(l.max_batch_size),
        }),
    }
}

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

/// Configuration read from `DA_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Explicit config file (`DA_CONFIG`)
    pub config_path: Option<PathBuf>,
    /// Everything else, shaped like a config file so it merges the same way
    pub overlay: FileConfig,
}

/// Load configuration from the process environment.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from any variable lookup.
///
/// Invalid values are logged and ignored.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut overlay = FileConfig::default();

    overlay.environment = get("DA_ENVIRONMENT");
    overlay.fallback_order = get("DA_FALLBACK_ORDER").map(|v| split_list(&v));
    overlay.batch_provider = get("DA_BATCH_PROVIDER");

    let mut server = ServerFileConfig {
        host: get("DA_HOST"),
        ..Default::default()
    };
    if let Some(val) = get("DA_PORT") {
        match val.trim().parse::<u16>() {
            Ok(port) => server.port = Some(port),
            Err(_) => warn!("Invalid DA_PORT='{}', must be a port number", val),
        }
    }
    server.request_timeout = get_duration_var(&get, "DA_REQUEST_TIMEOUT");

    let mut checker = CheckerFileConfig::default();
    if let Some(val) = get("DA_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(c) if (1..=100).contains(&c) => checker.concurrency = Some(c),
            _ => warn!("Invalid DA_CONCURRENCY='{}', must be 1-100", val),
        }
    }

    let rdap = RdapFileConfig {
        timeout: get_duration_var(&get, "DA_RDAP_TIMEOUT"),
        ..Default::default()
    };

    let godaddy = GoDaddyFileConfig {
        api_key: get("DA_GODADDY_API_KEY"),
        api_secret: get("DA_GODADDY_API_SECRET"),
        base_url: get("DA_GODADDY_BASE_URL"),
        ..Default::default()
    };

    let per_second = get_u32_var(&get, "DA_NAMECOM_PER_SECOND");
    let per_hour = get_u32_var(&get, "DA_NAMECOM_PER_HOUR");
    let namecom_limit = match (per_second, per_hour) {
        (None, None) => None,
        (s, h) => {
            let defaults = NameComSettings::default_rate_limit();
            Some(RateLimit::new(
                s.unwrap_or(defaults.per_second),
                h.unwrap_or(defaults.per_hour),
            ))
        }
    };
    let namecom = NameComFileConfig {
        username: get("DA_NAMECOM_USERNAME"),
        token: get("DA_NAMECOM_TOKEN"),
        base_url: get("DA_NAMECOM_BASE_URL"),
        rate_limit: namecom_limit,
        ..Default::default()
    };

    let usage = UsageFileConfig {
        url: get("DA_USAGE_URL"),
        token: get("DA_USAGE_TOKEN"),
    };

    overlay.server = non_empty_server(server);
    overlay.checker = checker.concurrency.is_some().then_some(checker);
    overlay.providers = Some(ProvidersFileConfig {
        rdap: rdap.timeout.is_some().then_some(rdap),
        godaddy: (godaddy.api_key.is_some()
            || godaddy.api_secret.is_some()
            || godaddy.base_url.is_some())
        .then_some(godaddy),
        namecom: (namecom.username.is_some()
            || namecom.token.is_some()
            || namecom.base_url.is_some()
            || namecom.rate_limit.is_some())
        .then_some(namecom),
    });
    overlay.usage = (usage.url.is_some() || usage.token.is_some()).then_some(usage);

    EnvConfig {
        config_path: get("DA_CONFIG").map(PathBuf::from),
        overlay,
    }
}

fn non_empty_server(server: ServerFileConfig) -> Option<ServerFileConfig> {
    if server.host.is_none() && server.port.is_none() && server.request_timeout.is_none() {
        None
    } else {
        Some(server)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn get_duration_var<G>(get: &G, key: &str) -> Option<String>
where
    G: Fn(&str) -> Option<String>,
{
    let val = get(key)?;
    if parse_duration(&val).is_some() {
        Some(val)
    } else {
        warn!("Invalid {}='{}', use format like '5s', '30s', '2m'", key, val);
        None
    }
}

fn get_u32_var<G>(get: &G, key: &str) -> Option<u32>
where
    G: Fn(&str) -> Option<String>,
{
    let val = get(key)?;
    match val.trim().parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!("Invalid {}='{}', must be a positive integer", key, val);
            None
        }
    }
}

/// Parse a duration like "500ms", "5s", "2m" (bare numbers are seconds).
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    let parsed = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = value.strip_suffix('s') {
        s.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = value.strip_suffix('m') {
        m.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    };

    parsed.filter(|d| !d.is_zero())
}
