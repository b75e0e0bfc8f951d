/// Application context and dependency injection
use crate::{
    config::ResolverConfig,
    endpoints::{EndpointManager, HealthSettings, HttpHealthProbe},
    error::{ResolverError, ResolverResult},
    ledger::{LedgerGateway, RestLedgerGateway},
    pipeline::Resolver,
};
use std::sync::Arc;
use tracing::info;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ResolverConfig>,
    pub resolver: Resolver,
    pub endpoints: Arc<EndpointManager>,
}

impl AppContext {
    /// Create a new application context from configuration. Runs the initial
    /// health check and fails when no ledger endpoint is reachable.
    pub async fn new(config: ResolverConfig) -> ResolverResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("cheqd-did-resolver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolverError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let settings = Self::health_settings(&config);
        let probe = Arc::new(HttpHealthProbe::new(client.clone(), settings.timeout));
        let endpoints = Arc::new(EndpointManager::start(&config.ledger.networks, probe, settings).await?);

        let ledger = Arc::new(RestLedgerGateway::new(client, endpoints.clone()));
        info!("Ledger gateway ready for {} network(s)", config.ledger.networks.len());

        Ok(Self::with_ledger(config, ledger, endpoints))
    }

    /// Assemble a context around an existing ledger gateway and endpoint manager
    pub fn with_ledger(
        config: ResolverConfig,
        ledger: Arc<dyn LedgerGateway>,
        endpoints: Arc<EndpointManager>,
    ) -> Self {
        let resolver = Resolver::new(
            ledger,
            config.service.did_method.clone(),
            config.service.resolver_path.clone(),
        );

        Self {
            config: Arc::new(config),
            resolver,
            endpoints,
        }
    }

    pub fn health_settings(config: &ResolverConfig) -> HealthSettings {
        HealthSettings {
            interval: config.health.interval,
            timeout: config.health.timeout,
            ttl: config.health.ttl,
            ..HealthSettings::default()
        }
    }

    pub fn resolver_path(&self) -> &str {
        &self.config.service.resolver_path
    }
}
