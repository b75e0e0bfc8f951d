/// Ledger endpoints, their health, and primary/fallback selection
pub mod manager;
pub mod probe;

pub use manager::{EndpointManager, EndpointStatus, HealthSettings};
pub use probe::{HealthProbe, HttpHealthProbe};

use crate::error::{ResolverError, ResolverResult};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Primary,
    Fallback,
}

impl EndpointRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" => Some(EndpointRole::Primary),
            "fallback" => Some(EndpointRole::Fallback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Primary => "primary",
            EndpointRole::Fallback => "fallback",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger node reachable at `host:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub use_tls: bool,
    pub timeout: Duration,
    pub role: EndpointRole,
}

impl Endpoint {
    /// Parse `host:port,useTls,timeout`
    pub fn parse(spec: &str, role: EndpointRole) -> ResolverResult<Self> {
        let fields: Vec<&str> = spec.split(',').map(str::trim).collect();
        let [url, use_tls, timeout] = fields.as_slice() else {
            return Err(ResolverError::Config(format!(
                "endpoint must be host:port,useTls,timeout: {}",
                spec
            )));
        };

        if url.is_empty() {
            return Err(ResolverError::Config("endpoint url is empty".to_string()));
        }

        let use_tls = use_tls
            .parse::<bool>()
            .map_err(|_| ResolverError::Config(format!("invalid useTls flag in endpoint: {}", spec)))?;
        let timeout = crate::config::parse_duration(timeout)
            .ok_or_else(|| ResolverError::Config(format!("invalid timeout in endpoint: {}", spec)))?;

        Ok(Self {
            url: url.to_string(),
            use_tls,
            timeout,
            role,
        })
    }

    /// Base URL of the node's REST surface
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}", scheme, self.url)
    }
}

/// Endpoints serving one ledger namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub namespace: String,
    pub endpoints: Vec<Endpoint>,
}

impl Network {
    pub fn new(namespace: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            namespace: namespace.into(),
            endpoints,
        }
    }

    /// The endpoint a request should use; networks handed out by the
    /// manager hold exactly one
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoints.first()
    }
}
