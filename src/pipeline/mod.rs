/// Request pipeline shared by every resolver route
///
/// Each request runs the same fixed sequence of steps; a [`RequestKind`]
/// specializes the steps that differ between routes:
///
/// 1. setup: pick the kind from the route, query and `Accept` header
/// 2. prepare: negotiate, unescape the DID, split fragment and query
/// 3. legacy identifier redirect
/// 4. validation: basic checks, then kind-specific checks
/// 5. query, response setup, respond
///
/// The first failing step ends the request with an [`IdentityError`].
pub mod prepare;
pub mod respond;
pub mod variants;

use crate::error::{IdentityError, ResolverError};
use crate::ledger::LedgerGateway;
use crate::resolution::{negotiate, DidDocService, Negotiated, ResourceService};
use crate::types::{ContentType, Profile, QueryParams, RequestParameters};
use axum::response::Response;
use std::sync::Arc;
use tracing::debug;

/// The route a request arrived on, with its path parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `{did}`
    Identifier,
    /// `{did}/version/{versionId}`
    Version(String),
    /// `{did}/version/{versionId}/metadata`
    VersionMetadata(String),
    /// `{did}/versions`
    Versions,
    /// `{did}/metadata`
    Metadata,
    /// `{did}/resources/{resourceId}`
    Resource(String),
    /// `{did}/resources/{resourceId}/metadata`
    ResourceMetadata(String),
}

/// An inbound request before any processing
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub route: Route,
    /// The `{did}` path segment, still percent-encoded
    pub did: String,
    pub query: Option<String>,
    pub accept: Option<String>,
}

impl RawRequest {
    pub fn new(route: Route, did: impl Into<String>) -> Self {
        Self {
            route,
            did: did.into(),
            query: None,
            accept: None,
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn with_accept(mut self, accept: Option<String>) -> Self {
        self.accept = accept;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Full,
    DidDocOnly,
    Fragment,
    Query,
    Version,
    VersionMetadata,
    AllVersionsMetadata,
    DidMetadata,
    ResourceData,
    ResourceDataWithMetadata,
    ResourceMetadata,
}

impl RequestKind {
    /// Setup step: choose the kind serving `request`
    pub fn select(request: &RawRequest) -> Self {
        match &request.route {
            Route::Identifier => {
                let did = urlencoding::decode(&request.did)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| request.did.clone());

                if did.contains('#') {
                    return RequestKind::Fragment;
                }
                if request.query.is_some() {
                    return RequestKind::Query;
                }

                let negotiated = negotiate(request.accept.as_deref(), false);
                if negotiated.content_type == ContentType::Json
                    || negotiated.is_json_ld_with(Profile::DidResolution)
                {
                    RequestKind::Full
                } else {
                    RequestKind::DidDocOnly
                }
            }
            Route::Version(_) => RequestKind::Version,
            Route::VersionMetadata(_) => RequestKind::VersionMetadata,
            Route::Versions => RequestKind::AllVersionsMetadata,
            Route::Metadata => RequestKind::DidMetadata,
            Route::Resource(_) => {
                if negotiate(request.accept.as_deref(), true).is_json_ld_with(Profile::DidUrlDereferencing) {
                    RequestKind::ResourceDataWithMetadata
                } else {
                    RequestKind::ResourceData
                }
            }
            Route::ResourceMetadata(_) => RequestKind::ResourceMetadata,
        }
    }

    /// Dereferencing kinds report errors in a dereferencing envelope
    pub fn is_dereferencing(&self) -> bool {
        matches!(
            self,
            RequestKind::Fragment
                | RequestKind::Query
                | RequestKind::VersionMetadata
                | RequestKind::DidMetadata
                | RequestKind::ResourceData
                | RequestKind::ResourceDataWithMetadata
                | RequestKind::ResourceMetadata
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Full => "full",
            RequestKind::DidDocOnly => "did-doc-only",
            RequestKind::Fragment => "fragment",
            RequestKind::Query => "query",
            RequestKind::Version => "version",
            RequestKind::VersionMetadata => "version-metadata",
            RequestKind::AllVersionsMetadata => "all-versions-metadata",
            RequestKind::DidMetadata => "did-metadata",
            RequestKind::ResourceData => "resource-data",
            RequestKind::ResourceDataWithMetadata => "resource-data-with-metadata",
            RequestKind::ResourceMetadata => "resource-metadata",
        }
    }
}

/// Everything the steps learn about a request
#[derive(Debug, Clone)]
pub struct RequestState {
    pub kind: RequestKind,
    pub route: Route,
    pub negotiated: Negotiated,
    /// Unescaped DID without fragment
    pub did: String,
    pub fragment: Option<String>,
    pub version_id: Option<String>,
    pub resource_id: Option<String>,
    /// Raw query with any encoded fragment cut off
    pub raw_query: String,
    pub query: QueryParams,
    pub params: RequestParameters,
}

impl RequestState {
    pub fn new(kind: RequestKind, request: &RawRequest) -> Self {
        Self {
            kind,
            route: request.route.clone(),
            negotiated: Negotiated::new(ContentType::LdJson, None),
            did: request.did.clone(),
            fragment: None,
            version_id: None,
            resource_id: None,
            raw_query: String::new(),
            query: QueryParams::default(),
            params: RequestParameters::default(),
        }
    }

    /// Bind an error to this request
    pub fn fail(&self, error: ResolverError) -> IdentityError {
        error.into_identity_error(
            self.did.clone(),
            self.negotiated.content_type.clone(),
            self.kind.is_dereferencing(),
        )
    }

    /// Resource data wrapped in a dereferencing envelope instead of raw bytes
    pub fn wants_resource_envelope(&self) -> bool {
        self.negotiated.is_json_ld_with(Profile::DidUrlDereferencing)
    }
}

/// Services and settings the pipeline runs against
#[derive(Clone)]
pub struct Resolver {
    pub documents: DidDocService,
    pub resources: ResourceService,
    ledger: Arc<dyn LedgerGateway>,
    method: String,
    resolver_path: String,
}

impl Resolver {
    pub fn new(ledger: Arc<dyn LedgerGateway>, method: impl Into<String>, resolver_path: impl Into<String>) -> Self {
        Self {
            documents: DidDocService::new(ledger.clone()),
            resources: ResourceService::new(ledger.clone()),
            ledger,
            method: method.into(),
            resolver_path: resolver_path.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn resolver_path(&self) -> &str {
        &self.resolver_path
    }

    /// Namespaces a DID may use
    pub async fn namespaces(&self) -> Vec<String> {
        self.ledger.namespaces().await
    }
}

/// Run every step for `request`
pub async fn execute(resolver: &Resolver, request: RawRequest) -> Result<Response, IdentityError> {
    let kind = RequestKind::select(&request);
    let mut state = RequestState::new(kind, &request);
    debug!("Handling {} request for {}", kind.as_str(), request.did);

    prepare::basic_prepare(&mut state, &request).map_err(|e| state.fail(e))?;
    variants::specific_prepare(&mut state, &request);

    let namespaces = resolver.namespaces().await;
    if prepare::is_redirect_needed(&state, resolver.method(), &namespaces) {
        return Ok(prepare::redirect(&state, resolver.resolver_path()));
    }

    prepare::basic_validation(&state, resolver.method(), &namespaces).map_err(|e| state.fail(e))?;
    variants::specific_validation(&mut state).map_err(|e| state.fail(e))?;

    let result = variants::query(&state, resolver).await.map_err(|e| state.fail(e))?;
    let reply = variants::setup_response(&state, result);
    respond::respond(&state, reply).map_err(|e| state.fail(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(route: Route, did: &str, query: Option<&str>, accept: Option<&str>) -> RawRequest {
        RawRequest::new(route, did)
            .with_query(query.map(str::to_string))
            .with_accept(accept.map(str::to_string))
    }

    const DID: &str = "did:cheqd:testnet:CpeMubv5yw63jXyrgRRsxR";

    #[test]
    fn test_identifier_kind_selection() {
        assert_eq!(
            RequestKind::select(&request(Route::Identifier, &format!("{}%23key-1", DID), None, None)),
            RequestKind::Fragment
        );
        assert_eq!(
            RequestKind::select(&request(Route::Identifier, DID, Some("versionId=1"), None)),
            RequestKind::Query
        );
        assert_eq!(
            RequestKind::select(&request(
                Route::Identifier,
                DID,
                None,
                Some("application/ld+json;profile=\"https://w3id.org/did-resolution\"")
            )),
            RequestKind::Full
        );
        assert_eq!(
            RequestKind::select(&request(Route::Identifier, DID, None, Some("*/*"))),
            RequestKind::Full
        );
        assert_eq!(
            RequestKind::select(&request(Route::Identifier, DID, None, Some("application/did+ld+json"))),
            RequestKind::DidDocOnly
        );
        assert_eq!(
            RequestKind::select(&request(Route::Identifier, DID, Some(""), None)),
            RequestKind::DidDocOnly
        );
    }

    #[test]
    fn test_resource_kind_selection() {
        let id = "9ba3922e-d5f5-4f53-b265-fc0d4e988c77".to_string();
        assert_eq!(
            RequestKind::select(&request(Route::Resource(id.clone()), DID, None, Some("*/*"))),
            RequestKind::ResourceData
        );
        assert_eq!(
            RequestKind::select(&request(
                Route::Resource(id),
                DID,
                None,
                Some("application/ld+json;profile=https://w3id.org/did-url-dereferencing")
            )),
            RequestKind::ResourceDataWithMetadata
        );
    }

    #[test]
    fn test_dereferencing_kinds() {
        assert!(RequestKind::Fragment.is_dereferencing());
        assert!(RequestKind::Query.is_dereferencing());
        assert!(!RequestKind::Full.is_dereferencing());
        assert!(!RequestKind::AllVersionsMetadata.is_dereferencing());
    }
}
