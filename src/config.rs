/// Configuration management for the cheqd DID resolver
use crate::endpoints::{Endpoint, EndpointRole, Network};
use crate::error::{ResolverError, ResolverResult};
use crate::types::{DID_METHOD, RESOLVER_PATH};
use std::env;
use std::time::Duration;
use tracing::info;

const DEFAULT_MAINNET_ENDPOINT: &str = "grpc.cheqd.net:443,true,5s";
const DEFAULT_TESTNET_ENDPOINT: &str = "grpc.cheqd.network:443,true,5s";

/// Main resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub service: ServiceConfig,
    pub ledger: LedgerConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

/// HTTP surface configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address, `host:port`
    pub listener: String,
    /// Route prefix, starting and ending with `/`
    pub resolver_path: String,
    pub did_method: String,
}

/// Ledger networks and their endpoints
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub networks: Vec<Network>,
    /// Timeout for endpoints that do not name their own
    pub timeout: Duration,
}

/// Background health checking
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl ResolverConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ResolverResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> ResolverResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let duration = |key: &str, default: &str| -> ResolverResult<Duration> {
            let raw = var(key, default);
            parse_duration(&raw).ok_or_else(|| ResolverError::Config(format!("Invalid duration for {}: {}", key, raw)))
        };

        let listener = var("RESOLVER_LISTENER", "0.0.0.0:8080");
        let resolver_path = var("RESOLVER_PATH", RESOLVER_PATH);
        let did_method = var("DID_METHOD", DID_METHOD);

        let ledger_timeout = duration("LEDGER_TIMEOUT", "5s")?;
        let networks = match lookup("LEDGER_NETWORKS") {
            Some(raw) => parse_networks(&raw, ledger_timeout)?,
            None => {
                let enable_fallback = var("ENABLE_FALLBACK_ENDPOINTS", "false")
                    .parse()
                    .unwrap_or(false);

                let mut networks = Vec::new();
                for (namespace, primary_key, fallback_key, default) in [
                    ("mainnet", "MAINNET_ENDPOINT", "MAINNET_FALLBACK_ENDPOINT", DEFAULT_MAINNET_ENDPOINT),
                    ("testnet", "TESTNET_ENDPOINT", "TESTNET_FALLBACK_ENDPOINT", DEFAULT_TESTNET_ENDPOINT),
                ] {
                    let mut endpoints = vec![parse_endpoint(&var(primary_key, default), EndpointRole::Primary, ledger_timeout)?];
                    if enable_fallback {
                        if let Some(fallback) = lookup(fallback_key) {
                            endpoints.push(parse_endpoint(&fallback, EndpointRole::Fallback, ledger_timeout)?);
                        }
                    }
                    networks.push(Network::new(namespace, endpoints));
                }
                networks
            }
        };

        let health = HealthConfig {
            interval: duration("HEALTH_CHECK_INTERVAL", "60s")?,
            timeout: duration("HEALTH_CHECK_TIMEOUT", "15s")?,
            ttl: duration("HEALTH_DATA_TTL", "120s")?,
        };

        let format = match var("LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(ResolverConfig {
            service: ServiceConfig {
                listener,
                resolver_path,
                did_method,
            },
            ledger: LedgerConfig {
                networks,
                timeout: ledger_timeout,
            },
            health,
            logging: LoggingConfig {
                level: var("LOG_LEVEL", "info"),
                format,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ResolverResult<()> {
        if self.ledger.networks.is_empty() {
            return Err(ResolverError::Config("At least one ledger network is required".to_string()));
        }

        for network in &self.ledger.networks {
            if network.endpoints.iter().any(|e| e.url.is_empty()) {
                return Err(ResolverError::Config(format!(
                    "Endpoint URL for {} cannot be empty",
                    network.namespace
                )));
            }
        }

        let path = &self.service.resolver_path;
        if !path.starts_with('/') || !path.ends_with('/') {
            return Err(ResolverError::Config(format!(
                "Resolver path must start and end with '/': {}",
                path
            )));
        }

        if self.health.interval.is_zero() || self.health.ttl.is_zero() {
            return Err(ResolverError::Config(
                "Health check interval and TTL must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Log the effective configuration once
    pub fn log_summary(&self) {
        info!("Listening address: {}", self.service.listener);
        info!("Resolver path: {}", self.service.resolver_path);
        info!("DID method: {}", self.service.did_method);
        for network in &self.ledger.networks {
            for endpoint in &network.endpoints {
                info!(
                    "Ledger endpoint: {} {} -> {} (tls: {}, timeout: {:?})",
                    network.namespace, endpoint.role, endpoint.url, endpoint.use_tls, endpoint.timeout
                );
            }
        }
        info!(
            "Health checks: every {:?}, timeout {:?}, ttl {:?}",
            self.health.interval, self.health.timeout, self.health.ttl
        );
    }
}

/// Parse `5s`, `250ms`, `2m` or a bare number of seconds
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse().ok().map(Duration::from_millis);
    }
    if let Some(secs) = value.strip_suffix('s') {
        return secs.trim().parse().ok().map(Duration::from_secs);
    }
    if let Some(mins) = value.strip_suffix('m') {
        return mins.trim().parse::<u64>().ok().map(|m| Duration::from_secs(m * 60));
    }
    value.parse().ok().map(Duration::from_secs)
}

/// `host:port,useTls[,timeout]`, filling in `default_timeout` when the timeout is omitted
fn parse_endpoint(spec: &str, role: EndpointRole, default_timeout: Duration) -> ResolverResult<Endpoint> {
    if spec.split(',').count() == 2 {
        return Endpoint::parse(&format!("{},{}ms", spec, default_timeout.as_millis()), role);
    }
    Endpoint::parse(spec, role)
}

/// `namespace=host:port,useTls,timeout[,role];...`. Entries of one namespace
/// are grouped in order; a missing role means primary.
fn parse_networks(raw: &str, default_timeout: Duration) -> ResolverResult<Vec<Network>> {
    let mut networks: Vec<Network> = Vec::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (namespace, spec) = entry
            .split_once('=')
            .ok_or_else(|| ResolverError::Config(format!("Ledger network must be namespace=endpoint: {}", entry)))?;
        let namespace = namespace.trim();

        let fields: Vec<&str> = spec.split(',').map(str::trim).collect();
        let (spec, role) = match fields.as_slice() {
            [url, tls, timeout, role] => {
                let role = EndpointRole::parse(role)
                    .ok_or_else(|| ResolverError::Config(format!("Unknown endpoint role: {}", role)))?;
                (format!("{},{},{}", url, tls, timeout), role)
            }
            _ => (spec.to_string(), EndpointRole::Primary),
        };
        let endpoint = parse_endpoint(&spec, role, default_timeout)?;

        match networks.iter_mut().find(|n| n.namespace == namespace) {
            Some(network) => network.endpoints.push(endpoint),
            None => networks.push(Network::new(namespace, vec![endpoint])),
        }
    }

    Ok(networks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ResolverResult<ResolverConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ResolverConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.service.listener, "0.0.0.0:8080");
        assert_eq!(config.service.resolver_path, "/1.0/identifiers/");
        assert_eq!(config.service.did_method, "cheqd");
        assert_eq!(config.ledger.networks.len(), 2);
        assert_eq!(config.ledger.networks[0].namespace, "mainnet");
        assert_eq!(config.ledger.networks[0].endpoints[0].url, "grpc.cheqd.net:443");
        assert_eq!(config.health.interval, Duration::from_secs(60));
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fallback_endpoints_require_flag() {
        let vars = [("TESTNET_FALLBACK_ENDPOINT", "backup.example.com:443,true,10s")];
        let config = load(&vars).unwrap();
        assert_eq!(config.ledger.networks[1].endpoints.len(), 1);

        let vars = [
            ("TESTNET_FALLBACK_ENDPOINT", "backup.example.com:443,true,10s"),
            ("ENABLE_FALLBACK_ENDPOINTS", "true"),
        ];
        let config = load(&vars).unwrap();
        let testnet = &config.ledger.networks[1];
        assert_eq!(testnet.endpoints.len(), 2);
        assert_eq!(testnet.endpoints[1].role, EndpointRole::Fallback);
        assert_eq!(testnet.endpoints[1].timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_ledger_networks() {
        let vars = [
            (
                "LEDGER_NETWORKS",
                "testnet=localhost:1317,false;testnet=backup:1317,false,2s,fallback;devnet=dev:1317,false,1s",
            ),
            ("LEDGER_TIMEOUT", "3s"),
        ];
        let config = load(&vars).unwrap();
        assert_eq!(config.ledger.networks.len(), 2);

        let testnet = &config.ledger.networks[0];
        assert_eq!(testnet.endpoints[0].timeout, Duration::from_secs(3));
        assert_eq!(testnet.endpoints[1].role, EndpointRole::Fallback);
        assert_eq!(config.ledger.networks[1].namespace, "devnet");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("HEALTH_CHECK_INTERVAL", "often")]),
            Err(ResolverError::Config(_))
        ));
        assert!(matches!(
            load(&[("LEDGER_NETWORKS", "testnet")]),
            Err(ResolverError::Config(_))
        ));

        let config = load(&[("RESOLVER_PATH", "/1.0/identifiers")]).unwrap();
        assert!(config.validate().is_err());

        let config = load(&[("HEALTH_DATA_TTL", "0s")]).unwrap();
        assert!(config.validate().is_err());

        let config = load(&[("LEDGER_NETWORKS", ";")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_log_format() {
        let config = load(&[("LOG_FORMAT", "JSON"), ("LOG_LEVEL", "debug")]).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }
}
