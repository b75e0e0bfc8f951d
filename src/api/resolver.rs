/// DID resolution and dereferencing endpoints
///
/// Every route hands the raw `{did}` segment to the request pipeline, which
/// does its own unescaping so that an encoded `#` survives routing.
use crate::context::AppContext;
use crate::pipeline::{self, RawRequest, Route};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Resolver routes, relative to the resolver path
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/:did", get(resolve))
        .route("/:did/version/:version", get(resolve_version))
        .route("/:did/version/:version/metadata", get(version_metadata))
        .route("/:did/versions", get(all_versions))
        .route("/:did/metadata", get(collection_metadata))
        .route("/:did/resources/:resource", get(resource_data))
        .route("/:did/resources/:resource/metadata", get(resource_metadata))
}

/// First path segment, still percent-encoded
fn raw_did(uri: &Uri) -> String {
    uri.path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

async fn dispatch(ctx: &AppContext, route: Route, uri: &Uri, headers: &HeaderMap) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = RawRequest::new(route, raw_did(uri))
        .with_query(uri.query().map(str::to_string))
        .with_accept(accept);

    match pipeline::execute(&ctx.resolver, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// `{did}`: full resolution, document only, fragment or query
async fn resolve(State(ctx): State<AppContext>, uri: Uri, headers: HeaderMap) -> Response {
    dispatch(&ctx, Route::Identifier, &uri, &headers).await
}

async fn resolve_version(
    State(ctx): State<AppContext>,
    Path((_, version)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    dispatch(&ctx, Route::Version(version), &uri, &headers).await
}

async fn version_metadata(
    State(ctx): State<AppContext>,
    Path((_, version)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    dispatch(&ctx, Route::VersionMetadata(version), &uri, &headers).await
}

async fn all_versions(State(ctx): State<AppContext>, uri: Uri, headers: HeaderMap) -> Response {
    dispatch(&ctx, Route::Versions, &uri, &headers).await
}

/// Metadata of the DID's resource collection
async fn collection_metadata(State(ctx): State<AppContext>, uri: Uri, headers: HeaderMap) -> Response {
    dispatch(&ctx, Route::Metadata, &uri, &headers).await
}

async fn resource_data(
    State(ctx): State<AppContext>,
    Path((_, resource)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    dispatch(&ctx, Route::Resource(resource), &uri, &headers).await
}

async fn resource_metadata(
    State(ctx): State<AppContext>,
    Path((_, resource)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    dispatch(&ctx, Route::ResourceMetadata(resource), &uri, &headers).await
}
