/// In-memory ledger, used for local development and tests
use super::LedgerGateway;
use crate::error::{ResolverError, ResolverResult};
use crate::resolution::versions;
use crate::types::{DidDoc, DidDocMetadata, DidParts, ResourceContent, ResourceMetadata};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    documents: HashMap<String, Vec<(DidDoc, DidDocMetadata)>>,
    resources: HashMap<String, Vec<ResourceContent>>,
}

#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one version of a document under its `id`
    pub fn insert_version(&self, doc: DidDoc, metadata: DidDocMetadata) {
        if let Ok(mut state) = self.state.write() {
            state.documents.entry(doc.id.clone()).or_default().push((doc, metadata));
        }
    }

    /// Store a resource in the collection owned by `did`
    pub fn insert_resource(&self, did: &str, content: ResourceContent) {
        if let Ok(mut state) = self.state.write() {
            state.resources.entry(did.to_string()).or_default().push(content);
        }
    }

    pub fn with_version(self, doc: DidDoc, metadata: DidDocMetadata) -> Self {
        self.insert_version(doc, metadata);
        self
    }

    pub fn with_resource(self, did: &str, content: ResourceContent) -> Self {
        self.insert_resource(did, content);
        self
    }

    fn read(&self) -> ResolverResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| ResolverError::Internal("ledger state lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn query_did_doc(&self, did: &str, version: Option<&str>) -> ResolverResult<(DidDoc, DidDocMetadata)> {
        let state = self.read()?;
        let versions = state
            .documents
            .get(did)
            .ok_or_else(|| ResolverError::NotFound(did.to_string()))?;

        let found = match version {
            Some(version) => versions.iter().find(|(_, md)| md.version_id == version),
            None => {
                let metadata: Vec<DidDocMetadata> = versions.iter().map(|(_, md)| md.clone()).collect();
                versions::latest(&metadata)
                    .and_then(|latest| versions.iter().find(|(_, md)| md.version_id == latest.version_id))
            }
        };

        found
            .cloned()
            .ok_or_else(|| ResolverError::NotFound(did.to_string()))
    }

    async fn query_resource(&self, collection_did: &str, resource_id: &str) -> ResolverResult<ResourceContent> {
        let state = self.read()?;
        state
            .resources
            .get(collection_did)
            .and_then(|resources| resources.iter().find(|r| r.metadata.id == resource_id))
            .cloned()
            .ok_or_else(|| {
                ResolverError::NotFound(ResourceMetadata::resource_uri_for(collection_did, resource_id))
            })
    }

    async fn query_collection_resources(&self, did: &str) -> ResolverResult<Vec<ResourceMetadata>> {
        let state = self.read()?;
        if !state.documents.contains_key(did) {
            return Err(ResolverError::NotFound(did.to_string()));
        }

        Ok(state
            .resources
            .get(did)
            .map(|resources| resources.iter().map(|r| r.metadata.clone()).collect())
            .unwrap_or_default())
    }

    async fn query_all_did_doc_versions_metadata(&self, did: &str) -> ResolverResult<Vec<DidDocMetadata>> {
        let state = self.read()?;
        state
            .documents
            .get(did)
            .map(|versions| versions.iter().map(|(_, md)| md.clone()).collect())
            .ok_or_else(|| ResolverError::NotFound(did.to_string()))
    }

    async fn namespaces(&self) -> Vec<String> {
        let Ok(state) = self.read() else {
            return Vec::new();
        };

        state
            .documents
            .keys()
            .filter_map(|did| DidParts::split(did).ok())
            .map(|parts| parts.namespace)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
