/// Ledger gateway over the node's REST (gRPC-gateway) surface
use super::wire::{
    QueryCollectionResponse, QueryDidDocResponse, QueryResourceResponse, QueryVersionsResponse,
};
use super::LedgerGateway;
use crate::endpoints::{probe::grpc_code, EndpointManager, Network};
use crate::error::{ResolverError, ResolverResult};
use crate::types::{DidDoc, DidDocMetadata, DidParts, ResourceContent, ResourceMetadata};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

const GRPC_NOT_FOUND: i64 = 5;
const GRPC_INVALID_ARGUMENT: i64 = 3;

pub struct RestLedgerGateway {
    client: reqwest::Client,
    endpoints: Arc<EndpointManager>,
}

impl RestLedgerGateway {
    pub fn new(client: reqwest::Client, endpoints: Arc<EndpointManager>) -> Self {
        Self { client, endpoints }
    }

    fn namespace_of(did: &str) -> ResolverResult<String> {
        DidParts::split(did)
            .map(|parts| parts.namespace)
            .map_err(|e| ResolverError::InvalidDid(e.to_string()))
    }

    fn collection_id_of(did: &str) -> ResolverResult<String> {
        DidParts::split(did)
            .map(|parts| parts.id)
            .map_err(|e| ResolverError::InvalidDid(e.to_string()))
    }

    /// GET `path` on the healthy endpoint of `namespace`. Transport failures
    /// mark the endpoint unhealthy, any answer from the node marks it healthy.
    async fn get<T: DeserializeOwned>(&self, namespace: &str, path: &str, subject: &str) -> ResolverResult<T> {
        let network = self.endpoints.get_healthy_endpoint(namespace).await?;
        let endpoint = network
            .endpoint()
            .ok_or_else(|| ResolverError::NoHealthyEndpoints(namespace.to_string()))?;

        let url = format!("{}{}", endpoint.base_url(), path);
        debug!("Querying ledger: {}", url);

        let response = match self.client.get(&url).timeout(endpoint.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                self.endpoints.mark_endpoint_unhealthy(&network).await;
                return Err(ResolverError::Internal(format!("Ledger request failed: {}", e)));
            }
        };

        let status = response.status();
        if status.is_success() {
            self.endpoints.mark_endpoint_healthy(&network).await;
            return response
                .json::<T>()
                .await
                .map_err(|e| ResolverError::Internal(format!("Failed to parse ledger response: {}", e)));
        }

        let body: Option<serde_json::Value> = response.json().await.ok();
        self.classify_failure(&network, status, body.as_ref(), subject).await
    }

    async fn classify_failure<T>(
        &self,
        network: &Network,
        status: StatusCode,
        body: Option<&serde_json::Value>,
        subject: &str,
    ) -> ResolverResult<T> {
        let code = grpc_code(body);
        if status == StatusCode::NOT_FOUND
            || code == Some(GRPC_NOT_FOUND)
            || code == Some(GRPC_INVALID_ARGUMENT)
        {
            self.endpoints.mark_endpoint_healthy(network).await;
            return Err(ResolverError::NotFound(subject.to_string()));
        }

        warn!("Ledger endpoint for {} answered {}", network.namespace, status);
        let message = body
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"));
        Err(ResolverError::Internal(format!("Ledger returned {}: {}", status, message)))
    }
}

#[async_trait]
impl LedgerGateway for RestLedgerGateway {
    async fn query_did_doc(&self, did: &str, version: Option<&str>) -> ResolverResult<(DidDoc, DidDocMetadata)> {
        let namespace = Self::namespace_of(did)?;
        let path = match version {
            Some(version) => format!(
                "/cheqd/did/v2/{}/version/{}",
                urlencoding::encode(did),
                urlencoding::encode(version)
            ),
            None => format!("/cheqd/did/v2/{}", urlencoding::encode(did)),
        };

        let response: QueryDidDocResponse = self.get(&namespace, &path, did).await?;
        Ok((response.value.did_doc.into(), response.value.metadata.into()))
    }

    async fn query_resource(&self, collection_did: &str, resource_id: &str) -> ResolverResult<ResourceContent> {
        let namespace = Self::namespace_of(collection_did)?;
        let collection_id = Self::collection_id_of(collection_did)?;
        let path = format!(
            "/cheqd/resource/v2/{}/resources/{}",
            urlencoding::encode(&collection_id),
            urlencoding::encode(resource_id)
        );

        let subject = ResourceMetadata::resource_uri_for(collection_did, resource_id);
        let response: QueryResourceResponse = self.get(&namespace, &path, &subject).await?;
        response
            .resource
            .into_content(collection_did)
            .map_err(|e| ResolverError::Internal(format!("Failed to decode resource data: {}", e)))
    }

    async fn query_collection_resources(&self, did: &str) -> ResolverResult<Vec<ResourceMetadata>> {
        let namespace = Self::namespace_of(did)?;
        let collection_id = Self::collection_id_of(did)?;
        let path = format!("/cheqd/resource/v2/{}/metadata", urlencoding::encode(&collection_id));

        let response: QueryCollectionResponse = self.get(&namespace, &path, did).await?;
        Ok(response
            .resources
            .into_iter()
            .map(|metadata| metadata.into_metadata(did))
            .collect())
    }

    async fn query_all_did_doc_versions_metadata(&self, did: &str) -> ResolverResult<Vec<DidDocMetadata>> {
        let namespace = Self::namespace_of(did)?;
        let path = format!("/cheqd/did/v2/{}/versions", urlencoding::encode(did));

        let response: QueryVersionsResponse = self.get(&namespace, &path, did).await?;
        Ok(response.versions.into_iter().map(Into::into).collect())
    }

    async fn namespaces(&self) -> Vec<String> {
        self.endpoints.namespaces().await
    }
}
