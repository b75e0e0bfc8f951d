/// Kind-specific pipeline steps: prepare, validation, query and response setup
use super::{RawRequest, RequestKind, RequestState, Resolver, Route};
use crate::error::{ResolverError, ResolverResult};
use crate::resolution::{resolve_query, validate_query, QueryOutcome};
use crate::types::did::is_valid_uuid;
use crate::types::{
    ContentMetadata, ContentStream, DidDereferencing, DidResolution, Profile, ResolutionMetadata,
    ResolutionResult, ResourceData,
};

/// A result ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub result: ResolutionResult,
    /// Value of the `Content-Type` header for JSON bodies
    pub content_type: String,
    /// Serve only the content stream, without envelope
    pub content_only: bool,
}

/// Pull path parameters out of the route
pub fn specific_prepare(state: &mut RequestState, request: &RawRequest) {
    match &request.route {
        Route::Version(version) | Route::VersionMetadata(version) => {
            state.version_id = Some(version.clone());
        }
        Route::Resource(resource) | Route::ResourceMetadata(resource) => {
            state.resource_id = Some(resource.clone());
        }
        Route::Identifier | Route::Versions | Route::Metadata => {}
    }
}

fn accepts_query(kind: RequestKind) -> bool {
    matches!(
        kind,
        RequestKind::Query | RequestKind::DidMetadata | RequestKind::Full | RequestKind::DidDocOnly
    )
}

pub fn specific_validation(state: &mut RequestState) -> ResolverResult<()> {
    let invalid_url = || ResolverError::InvalidDidUrl(state.did.clone());

    if !accepts_query(state.kind) && !state.query.is_empty() {
        return Err(invalid_url());
    }
    if state.kind != RequestKind::Fragment && state.fragment.is_some() {
        return Err(invalid_url());
    }

    match state.kind {
        RequestKind::Version | RequestKind::VersionMetadata => {
            let version = state.version_id.as_deref().unwrap_or_default();
            if !is_valid_uuid(version) {
                return Err(ResolverError::InvalidDidUrl(version.to_string()));
            }
        }
        RequestKind::ResourceData | RequestKind::ResourceDataWithMetadata | RequestKind::ResourceMetadata => {
            let resource = state.resource_id.as_deref().unwrap_or_default();
            if !is_valid_uuid(resource) {
                return Err(ResolverError::InvalidDidUrl(resource.to_string()));
            }
        }
        RequestKind::Fragment => {
            if state.fragment.as_deref().unwrap_or_default().is_empty() {
                return Err(invalid_url());
            }
        }
        RequestKind::DidMetadata => {
            if state.query.len() > 1 {
                return Err(invalid_url());
            }
        }
        RequestKind::Query => {
            state.params = validate_query(&state.query)?;
        }
        RequestKind::Full | RequestKind::DidDocOnly | RequestKind::AllVersionsMetadata => {}
    }

    Ok(())
}

/// Run the engine for this kind and wrap the outcome in its envelope
pub async fn query(state: &RequestState, resolver: &Resolver) -> ResolverResult<ResolutionResult> {
    let did = state.did.as_str();
    let metadata = || ResolutionMetadata::new(did, state.negotiated.content_type.clone());
    let dereferenced = |stream: ContentStream, content: Option<ContentMetadata>| {
        ResolutionResult::Dereferencing(DidDereferencing::new(metadata().into(), stream, content))
    };

    let result = match state.kind {
        RequestKind::Full | RequestKind::DidDocOnly | RequestKind::Version => {
            let (doc, doc_metadata) = resolver.documents.resolve(did, state.version_id.as_deref()).await?;
            ResolutionResult::Resolution(DidResolution::new(metadata(), doc, doc_metadata))
        }
        RequestKind::Fragment => {
            let fragment = state.fragment.as_deref().unwrap_or_default();
            let (found, doc_metadata) = resolver.documents.dereference_fragment(did, fragment).await?;
            dereferenced(ContentStream::Fragment(found), Some(ContentMetadata::Document(doc_metadata)))
        }
        RequestKind::VersionMetadata => {
            let version = state.version_id.as_deref().unwrap_or_default();
            let doc_metadata = resolver.documents.version_metadata(did, version).await?;
            dereferenced(ContentStream::DidDocMetadata(doc_metadata), None)
        }
        RequestKind::AllVersionsMetadata => {
            let versions = resolver.documents.all_versions(did).await?;
            dereferenced(ContentStream::Versions { versions }, None)
        }
        RequestKind::DidMetadata => {
            let linked_resource_metadata = resolver.resources.collection_metadata(did).await?;
            dereferenced(ContentStream::ResourceMetadataList { linked_resource_metadata }, None)
        }
        RequestKind::ResourceMetadata => {
            let resource = state.resource_id.as_deref().unwrap_or_default();
            let found = resolver.resources.resource_metadata(did, resource).await?;
            dereferenced(
                ContentStream::ResourceMetadataList {
                    linked_resource_metadata: vec![found],
                },
                None,
            )
        }
        RequestKind::ResourceData | RequestKind::ResourceDataWithMetadata => {
            let resource = state.resource_id.as_deref().unwrap_or_default();
            let content = resolver.resources.resource(did, resource).await?;
            let content_metadata = (state.kind == RequestKind::ResourceDataWithMetadata)
                .then(|| ContentMetadata::Resource(content.metadata.clone()));
            dereferenced(ContentStream::ResourceData(ResourceData::from(content)), content_metadata)
        }
        RequestKind::Query => {
            match resolve_query(&resolver.documents, &resolver.resources, did, &state.params).await? {
                QueryOutcome::Document(doc, doc_metadata) => {
                    ResolutionResult::Resolution(DidResolution::new(metadata(), doc, doc_metadata))
                }
                QueryOutcome::Metadata(doc_metadata) => dereferenced(ContentStream::DidDocMetadata(doc_metadata), None),
                QueryOutcome::ServiceRedirect(target) => dereferenced(ContentStream::Redirect(target), None),
                QueryOutcome::Resources(linked_resource_metadata) => {
                    dereferenced(ContentStream::ResourceMetadataList { linked_resource_metadata }, None)
                }
                QueryOutcome::Resource(content) => {
                    let content_metadata = state
                        .wants_resource_envelope()
                        .then(|| ContentMetadata::Resource(content.metadata.clone()));
                    dereferenced(ContentStream::ResourceData(ResourceData::from(content)), content_metadata)
                }
            }
        }
    };

    Ok(result)
}

/// Contexts, response content type and the document-only cut
pub fn setup_response(state: &RequestState, mut result: ResolutionResult) -> Reply {
    result.apply_contexts(state.negotiated.content_type.is_json_ld());
    let content_type = state.negotiated.header_value(result.content_type());

    if let ResolutionResult::Resolution(resolution) = &mut result {
        if state.negotiated.is_json_ld_with(Profile::DidResolution) {
            resolution.did_resolution_metadata.content_type = Profile::did_resolution_content_type();
        }
    }

    Reply {
        result,
        content_type,
        content_only: state.kind == RequestKind::DidDocOnly,
    }
}
