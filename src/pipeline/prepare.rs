/// Steps every request kind shares: prepare, legacy redirect and basic validation
use super::{RawRequest, RequestState, Route};
use crate::error::{ResolverError, ResolverResult};
use crate::migration::{is_migration_needed, migrate_did};
use crate::resolution::negotiate;
use crate::types::did::{validate_did, DidParts};
use crate::types::query::split_encoded_fragment;
use crate::types::{QueryParams, DID_METADATA_PATH, DID_VERSIONS_PATH, DID_VERSION_PATH, RESOURCE_PATH};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

/// Negotiate the representation, unescape the DID and split off fragment and query
pub fn basic_prepare(state: &mut RequestState, request: &RawRequest) -> ResolverResult<()> {
    state.negotiated = negotiate(request.accept.as_deref(), state.kind.is_dereferencing());
    if !state.negotiated.is_supported() {
        return Err(ResolverError::RepresentationNotSupported(format!(
            "unsupported Accept: {}",
            state.negotiated.content_type.as_str()
        )));
    }

    let did = urlencoding::decode(&request.did)
        .map_err(|_| ResolverError::InvalidDidUrl(request.did.clone()))?
        .into_owned();

    match did.split_once('#') {
        Some((did, fragment)) => {
            state.did = did.to_string();
            state.fragment = Some(fragment.to_string());
        }
        None => state.did = did,
    }

    let raw_query = request.query.as_deref().unwrap_or_default();
    let (query, has_fragment) = split_encoded_fragment(raw_query);
    if has_fragment {
        return Err(ResolverError::RepresentationNotSupported(
            "fragments are not supported in queries".to_string(),
        ));
    }
    state.raw_query = query.to_string();
    state.query = QueryParams::parse(query)?;

    Ok(())
}

/// The DID is rejected only for its legacy identifier form
pub fn is_redirect_needed(state: &RequestState, method: &str, namespaces: &[String]) -> bool {
    is_migration_needed(&state.did, method, namespaces)
}

/// Path of the same request addressed by the migrated DID
pub fn redirect_location(state: &RequestState, resolver_path: &str) -> String {
    let mut location = format!("{}{}", resolver_path, migrate_did(&state.did));

    match &state.route {
        Route::Identifier => {}
        Route::Version(version) => {
            location.push_str(DID_VERSION_PATH);
            location.push_str(version);
        }
        Route::VersionMetadata(version) => {
            location.push_str(DID_VERSION_PATH);
            location.push_str(version);
            location.push_str(DID_METADATA_PATH);
        }
        Route::Versions => location.push_str(DID_VERSIONS_PATH),
        Route::Metadata => location.push_str(DID_METADATA_PATH),
        Route::Resource(resource) => {
            location.push_str(RESOURCE_PATH);
            location.push_str(resource);
        }
        Route::ResourceMetadata(resource) => {
            location.push_str(RESOURCE_PATH);
            location.push_str(resource);
            location.push_str(DID_METADATA_PATH);
        }
    }

    if !state.raw_query.is_empty() {
        location.push('?');
        location.push_str(&state.raw_query);
    }
    if let Some(fragment) = state.fragment.as_deref().filter(|f| !f.is_empty()) {
        location.push_str("%23");
        location.push_str(&urlencoding::encode(fragment));
    }

    location
}

/// 301 to the migrated DID
pub fn redirect(state: &RequestState, resolver_path: &str) -> Response {
    let location = redirect_location(state, resolver_path);
    info!("Redirecting legacy DID {} to {}", state.did, location);

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Method first, then the full DID grammar and namespace
pub fn basic_validation(state: &RequestState, method: &str, namespaces: &[String]) -> ResolverResult<()> {
    let parts = DidParts::split(&state.did).map_err(|e| ResolverError::InvalidDid(e.to_string()))?;
    if parts.method != method {
        return Err(ResolverError::MethodNotSupported(parts.method));
    }

    validate_did(&state.did, Some(method), namespaces)
        .map(|_| ())
        .map_err(|e| ResolverError::InvalidDid(e.to_string()))
}
