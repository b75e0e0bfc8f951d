/// Ledger-backed document and resource services
use super::versions;
use crate::error::{ResolverError, ResolverResult};
use crate::ledger::LedgerGateway;
use crate::types::{DidDoc, DidDocMetadata, Fragment, ResourceContent, ResourceMetadata};
use std::sync::Arc;
use tracing::debug;

/// Resolves documents, their versions and fragments
#[derive(Clone)]
pub struct DidDocService {
    ledger: Arc<dyn LedgerGateway>,
}

impl DidDocService {
    pub fn new(ledger: Arc<dyn LedgerGateway>) -> Self {
        Self { ledger }
    }

    /// Metadata of every version, each with the resources visible under it,
    /// newest first
    pub async fn all_versions(&self, did: &str) -> ResolverResult<Vec<DidDocMetadata>> {
        let mut all = self.ledger.query_all_did_doc_versions_metadata(did).await?;
        if all.is_empty() {
            return Err(ResolverError::NotFound(did.to_string()));
        }

        let resources = self.ledger.query_collection_resources(did).await?;
        versions::attach_visible_resources(&mut all, &resources);
        Ok(all)
    }

    /// Document of the latest version, or of `version_id`, with its visible resources
    pub async fn resolve(&self, did: &str, version_id: Option<&str>) -> ResolverResult<(DidDoc, DidDocMetadata)> {
        debug!("Resolving {} (version: {:?})", did, version_id);
        let (doc, mut metadata) = self.ledger.query_did_doc(did, version_id).await?;

        let all = self.ledger.query_all_did_doc_versions_metadata(did).await?;
        let resources = self.ledger.query_collection_resources(did).await?;
        metadata.resources = versions::resources_before_next_version(&all, &metadata.version_id, &resources);

        Ok((doc, metadata))
    }

    /// Document content of one version, without metadata lookups
    pub async fn document(&self, did: &str, version_id: &str) -> ResolverResult<DidDoc> {
        let (doc, _) = self.ledger.query_did_doc(did, Some(version_id)).await?;
        Ok(doc)
    }

    /// Metadata of one version, with the resources visible under it
    pub async fn version_metadata(&self, did: &str, version_id: &str) -> ResolverResult<DidDocMetadata> {
        let all = self.all_versions(did).await?;
        versions::find_by_id(&all, version_id)
            .cloned()
            .ok_or_else(|| ResolverError::NotFound(format!("{} version {}", did, version_id)))
    }

    /// Verification method or service named by `fragment`, with the document
    /// metadata stripped of resources
    pub async fn dereference_fragment(&self, did: &str, fragment: &str) -> ResolverResult<(Fragment, DidDocMetadata)> {
        let (doc, metadata) = self.ledger.query_did_doc(did, None).await?;
        let found = doc
            .find_fragment(fragment)
            .ok_or_else(|| ResolverError::NotFound(format!("{}#{}", did, fragment)))?;

        Ok((found, metadata.without_resources()))
    }
}

/// Dereferences linked resources
#[derive(Clone)]
pub struct ResourceService {
    ledger: Arc<dyn LedgerGateway>,
}

impl ResourceService {
    pub fn new(ledger: Arc<dyn LedgerGateway>) -> Self {
        Self { ledger }
    }

    /// Metadata of the whole collection, newest first. The owning document must exist.
    pub async fn collection_metadata(&self, did: &str) -> ResolverResult<Vec<ResourceMetadata>> {
        self.ledger.query_did_doc(did, None).await?;

        let mut resources = self.ledger.query_collection_resources(did).await?;
        versions::sort_resources_newest_first(&mut resources);
        Ok(resources)
    }

    /// Every resource of the collection, unsorted
    pub async fn collection(&self, did: &str) -> ResolverResult<Vec<ResourceMetadata>> {
        self.ledger.query_collection_resources(did).await
    }

    pub async fn resource(&self, did: &str, resource_id: &str) -> ResolverResult<ResourceContent> {
        debug!("Dereferencing resource {} of {}", resource_id, did);
        self.ledger.query_resource(did, resource_id).await
    }

    pub async fn resource_metadata(&self, did: &str, resource_id: &str) -> ResolverResult<ResourceMetadata> {
        Ok(self.resource(did, resource_id).await?.metadata)
    }
}
