/// Ledger access: the gateway trait and its REST and in-memory implementations
pub mod memory;
pub mod rest;
mod wire;

pub use memory::InMemoryLedger;
pub use rest::RestLedgerGateway;

use crate::error::ResolverResult;
use crate::types::{DidDoc, DidDocMetadata, ResourceContent, ResourceMetadata};
use async_trait::async_trait;

/// Read operations against the ledger. Each call distinguishes an absent
/// object (`ResolverError::NotFound`) from a failed call (`Internal` or
/// `NoHealthyEndpoints`).
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Document and metadata of the latest version, or of `version` when given
    async fn query_did_doc(&self, did: &str, version: Option<&str>) -> ResolverResult<(DidDoc, DidDocMetadata)>;

    /// One resource of the collection owned by `collection_did`, with its data
    async fn query_resource(&self, collection_did: &str, resource_id: &str) -> ResolverResult<ResourceContent>;

    /// Metadata of every resource in the collection owned by `did`
    async fn query_collection_resources(&self, did: &str) -> ResolverResult<Vec<ResourceMetadata>>;

    /// Metadata of every version of the document
    async fn query_all_did_doc_versions_metadata(&self, did: &str) -> ResolverResult<Vec<DidDocMetadata>>;

    /// Namespaces this gateway can serve
    async fn namespaces(&self) -> Vec<String>;
}
