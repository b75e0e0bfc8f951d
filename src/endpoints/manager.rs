/// Endpoint health tracking and primary/fallback selection
use super::{Endpoint, EndpointRole, HealthProbe, Network};
use crate::error::{ResolverError, ResolverResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Timing of the health checker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSettings {
    /// Period between background probe cycles
    pub interval: Duration,
    /// Upper bound of a single probe
    pub timeout: Duration,
    /// Age after which a healthy record is no longer trusted
    pub ttl: Duration,
    /// Pause between consecutive probes in a cycle
    pub probe_pause: Duration,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(15),
            ttl: Duration::from_secs(120),
            probe_pause: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
struct HealthRecord {
    network: Network,
    endpoint: Endpoint,
    is_healthy: bool,
    last_check: Instant,
    last_check_at: DateTime<Utc>,
    failure_count: u32,
}

impl HealthRecord {
    fn is_fresh_and_healthy(&self, ttl: Duration) -> bool {
        self.is_healthy && self.last_check.elapsed() <= ttl
    }

    fn record(&mut self, healthy: bool) {
        if healthy {
            self.failure_count = 0;
        } else {
            self.failure_count = self.failure_count.saturating_add(1);
        }
        self.is_healthy = healthy;
        self.last_check = Instant::now();
        self.last_check_at = Utc::now();
    }
}

/// Snapshot of one health record, as reported by the health routes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    pub namespace: String,
    pub role: EndpointRole,
    pub url: String,
    pub healthy: bool,
    pub failure_count: u32,
    pub last_check: DateTime<Utc>,
}

type RecordKey = (String, EndpointRole);

/// Tracks endpoint reachability and hands out healthy endpoints
pub struct EndpointManager {
    records: RwLock<BTreeMap<RecordKey, HealthRecord>>,
    probe: Arc<dyn HealthProbe>,
    settings: HealthSettings,
}

impl EndpointManager {
    /// Register every endpoint as healthy, without probing
    pub fn new(networks: &[Network], probe: Arc<dyn HealthProbe>, settings: HealthSettings) -> Self {
        let mut records = BTreeMap::new();
        let now = Instant::now();

        for network in networks {
            for endpoint in &network.endpoints {
                records.insert(
                    (network.namespace.clone(), endpoint.role),
                    HealthRecord {
                        network: network.clone(),
                        endpoint: endpoint.clone(),
                        is_healthy: true,
                        last_check: now,
                        last_check_at: Utc::now(),
                        failure_count: 0,
                    },
                );
            }
        }

        Self {
            records: RwLock::new(records),
            probe,
            settings,
        }
    }

    /// Build the manager and run one full probe cycle. Fails when no
    /// endpoint is healthy afterwards.
    pub async fn start(
        networks: &[Network],
        probe: Arc<dyn HealthProbe>,
        settings: HealthSettings,
    ) -> ResolverResult<Self> {
        let manager = Self::new(networks, probe, settings);

        info!("Performing initial health check on all endpoints...");
        manager.check_all_endpoints().await;

        if !manager.has_any_healthy_endpoint().await {
            return Err(ResolverError::NoHealthyEndpoints(
                "all namespaces (check endpoint configuration and network connectivity)".to_string(),
            ));
        }

        info!("Initial health check completed");
        Ok(manager)
    }

    pub fn settings(&self) -> HealthSettings {
        self.settings
    }

    /// Namespaces with at least one configured endpoint
    pub async fn namespaces(&self) -> Vec<String> {
        let records = self.records.read().await;
        records
            .keys()
            .map(|(namespace, _)| namespace.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Network holding only the endpoint requests should use: a fresh healthy
    /// primary, else a fresh healthy fallback
    pub async fn get_healthy_endpoint(&self, namespace: &str) -> ResolverResult<Network> {
        let records = self.records.read().await;

        for role in [EndpointRole::Primary, EndpointRole::Fallback] {
            let Some(record) = records.get(&(namespace.to_string(), role)) else {
                continue;
            };

            if record.is_fresh_and_healthy(self.settings.ttl) {
                debug!("Using {} endpoint {} for namespace {}", role, record.endpoint.url, namespace);
                let mut network = record.network.clone();
                network.endpoints = vec![record.endpoint.clone()];
                return Ok(network);
            }
        }

        warn!("No healthy endpoints found for namespace {}", namespace);
        Err(ResolverError::NoHealthyEndpoints(namespace.to_string()))
    }

    pub async fn mark_endpoint_healthy(&self, network: &Network) {
        self.update_health(network, true).await;
    }

    pub async fn mark_endpoint_unhealthy(&self, network: &Network) {
        self.update_health(network, false).await;
    }

    async fn update_health(&self, network: &Network, healthy: bool) {
        let mut records = self.records.write().await;

        for endpoint in &network.endpoints {
            let Some(record) = records.get_mut(&(network.namespace.clone(), endpoint.role)) else {
                continue;
            };

            let was_healthy = record.is_healthy;
            record.record(healthy);

            if healthy && !was_healthy {
                info!("Marked endpoint {} as healthy again", endpoint.url);
            } else if !healthy {
                warn!(
                    "Marked endpoint {} as unhealthy (failure count: {})",
                    endpoint.url, record.failure_count
                );
            }
        }
    }

    /// Probe every endpoint, primary before fallback within a namespace.
    /// The table lock is not held while a probe is in flight.
    pub async fn check_all_endpoints(&self) {
        let targets: Vec<(RecordKey, Endpoint)> = {
            let records = self.records.read().await;
            records
                .iter()
                .map(|(key, record)| (key.clone(), record.endpoint.clone()))
                .collect()
        };

        for (key, endpoint) in targets {
            debug!("Checking health for endpoint {}: {}", key.1, endpoint.url);
            let healthy = self.probe.probe(&endpoint).await;

            {
                let mut records = self.records.write().await;
                if let Some(record) = records.get_mut(&key) {
                    if record.is_healthy != healthy {
                        if healthy {
                            info!("Endpoint {} ({}) recovered", endpoint.url, key.0);
                        } else {
                            warn!("Endpoint {} ({}) failed its health check", endpoint.url, key.0);
                        }
                    }
                    record.record(healthy);
                }
            }

            tokio::time::sleep(self.settings.probe_pause).await;
        }
    }

    pub async fn has_any_healthy_endpoint(&self) -> bool {
        let records = self.records.read().await;
        records
            .values()
            .any(|record| record.is_fresh_and_healthy(self.settings.ttl))
    }

    /// Current state of every record, stale records reported as unhealthy
    pub async fn statuses(&self) -> Vec<EndpointStatus> {
        let records = self.records.read().await;
        records
            .iter()
            .map(|((namespace, role), record)| EndpointStatus {
                namespace: namespace.clone(),
                role: *role,
                url: record.endpoint.url.clone(),
                healthy: record.is_fresh_and_healthy(self.settings.ttl),
                failure_count: record.failure_count,
                last_check: record.last_check_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Probe answering from a fixed set of healthy URLs
    struct StubProbe {
        healthy: HashSet<String>,
    }

    impl StubProbe {
        fn new(healthy: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                healthy: healthy.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    #[async_trait]
    impl HealthProbe for StubProbe {
        async fn probe(&self, endpoint: &Endpoint) -> bool {
            self.healthy.contains(&endpoint.url)
        }
    }

    fn endpoint(url: &str, role: EndpointRole) -> Endpoint {
        Endpoint {
            url: url.to_string(),
            use_tls: true,
            timeout: Duration::from_secs(5),
            role,
        }
    }

    fn networks() -> Vec<Network> {
        vec![Network::new(
            "testnet",
            vec![
                endpoint("primary.example:443", EndpointRole::Primary),
                endpoint("fallback.example:443", EndpointRole::Fallback),
            ],
        )]
    }

    fn settings() -> HealthSettings {
        HealthSettings {
            probe_pause: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_count_saturates() {
        let network = networks().remove(0);
        let mut record = HealthRecord {
            endpoint: network.endpoints[0].clone(),
            network,
            is_healthy: false,
            last_check: Instant::now(),
            last_check_at: Utc::now(),
            failure_count: u32::MAX,
        };

        record.record(false);
        assert_eq!(record.failure_count, u32::MAX);
        record.record(true);
        assert_eq!(record.failure_count, 0);
    }

    #[tokio::test]
    async fn test_primary_preferred_when_healthy() {
        let manager = EndpointManager::new(&networks(), StubProbe::new(&[]), settings());
        let network = manager.get_healthy_endpoint("testnet").await.unwrap();
        assert_eq!(network.endpoints.len(), 1);
        assert_eq!(network.endpoints[0].role, EndpointRole::Primary);
    }

    #[tokio::test]
    async fn test_failover_to_fallback_after_probe_cycle() {
        let probe = StubProbe::new(&["fallback.example:443"]);
        let manager = EndpointManager::start(&networks(), probe, settings()).await.unwrap();

        let network = manager.get_healthy_endpoint("testnet").await.unwrap();
        assert_eq!(network.namespace, "testnet");
        assert_eq!(network.endpoints, vec![endpoint("fallback.example:443", EndpointRole::Fallback)]);
    }

    #[tokio::test]
    async fn test_unknown_namespace_has_no_endpoints() {
        let manager = EndpointManager::new(&networks(), StubProbe::new(&[]), settings());
        assert_eq!(
            manager.get_healthy_endpoint("mainnet").await,
            Err(ResolverError::NoHealthyEndpoints("mainnet".to_string()))
        );
    }

    #[tokio::test]
    async fn test_start_fails_without_healthy_endpoints() {
        let result = EndpointManager::start(&networks(), StubProbe::new(&[]), settings()).await;
        assert!(matches!(result, Err(ResolverError::NoHealthyEndpoints(_))));
    }

    #[tokio::test]
    async fn test_mark_unhealthy_and_recover() {
        let manager = EndpointManager::new(&networks(), StubProbe::new(&[]), settings());
        let primary = manager.get_healthy_endpoint("testnet").await.unwrap();

        manager.mark_endpoint_unhealthy(&primary).await;
        manager.mark_endpoint_unhealthy(&primary).await;
        let fallback = manager.get_healthy_endpoint("testnet").await.unwrap();
        assert_eq!(fallback.endpoints[0].role, EndpointRole::Fallback);

        let statuses = manager.statuses().await;
        let primary_status = statuses.iter().find(|s| s.role == EndpointRole::Primary).unwrap();
        assert_eq!(primary_status.failure_count, 2);
        assert!(!primary_status.healthy);

        manager.mark_endpoint_healthy(&primary).await;
        let restored = manager.get_healthy_endpoint("testnet").await.unwrap();
        assert_eq!(restored.endpoints[0].role, EndpointRole::Primary);
        assert_eq!(manager.statuses().await[0].failure_count, 0);
    }

    #[tokio::test]
    async fn test_stale_health_data_is_unhealthy() {
        let stale = HealthSettings {
            ttl: Duration::from_millis(10),
            ..settings()
        };
        let manager = EndpointManager::new(&networks(), StubProbe::new(&[]), stale);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(manager.get_healthy_endpoint("testnet").await.is_err());
        assert!(!manager.has_any_healthy_endpoint().await);
    }

    #[tokio::test]
    async fn test_namespaces() {
        let mut networks = networks();
        networks.push(Network::new("mainnet", vec![endpoint("main.example:443", EndpointRole::Primary)]));
        let manager = EndpointManager::new(&networks, StubProbe::new(&[]), settings());
        assert_eq!(manager.namespaces().await, vec!["mainnet".to_string(), "testnet".to_string()]);
    }
}
