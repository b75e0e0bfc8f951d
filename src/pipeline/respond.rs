/// Writing a prepared reply to the wire
use super::variants::Reply;
use super::RequestState;
use crate::error::{ResolverError, ResolverResult};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Service results redirect, bare resources go out as raw bytes, the rest as JSON
pub fn respond(state: &RequestState, reply: Reply) -> ResolverResult<Response> {
    if let Some(target) = reply.result.redirect_target() {
        return Ok((StatusCode::SEE_OTHER, [(header::LOCATION, target.to_string())]).into_response());
    }

    if !state.wants_resource_envelope() {
        if let Some(resource) = reply.result.resource_data() {
            let media_type = if resource.media_type.is_empty() {
                DEFAULT_MEDIA_TYPE.to_string()
            } else {
                resource.media_type.clone()
            };
            return Ok((StatusCode::OK, [(header::CONTENT_TYPE, media_type)], resource.data.clone()).into_response());
        }
    }

    let body = if reply.content_only {
        reply.result.content_stream_json()
    } else {
        reply.result.to_json()
    }
    .map_err(|e| ResolverError::Internal(format!("Failed to serialize result: {}", e)))?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, reply.content_type)], Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RawRequest, RequestKind, Route};
    use crate::resolution::Negotiated;
    use crate::types::{
        ContentStream, ContentType, DidDereferencing, Profile, ResolutionMetadata, ResolutionResult, ResourceData,
    };

    const DID: &str = "did:cheqd:testnet:CpeMubv5yw63jXyrgRRsxR";

    fn reply(stream: ContentStream) -> Reply {
        let metadata = ResolutionMetadata::new(DID, ContentType::LdJson);
        Reply {
            result: ResolutionResult::Dereferencing(DidDereferencing::new(metadata.into(), stream, None)),
            content_type: "application/ld+json".to_string(),
            content_only: false,
        }
    }

    fn state(negotiated: Negotiated) -> RequestState {
        let request = RawRequest::new(Route::Identifier, DID);
        let mut state = RequestState::new(RequestKind::Query, &request);
        state.negotiated = negotiated;
        state
    }

    #[test]
    fn test_service_redirect() {
        let response = respond(
            &state(Negotiated::new(ContentType::LdJson, None)),
            reply(ContentStream::Redirect("https://example.com/about".to_string())),
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com/about");
    }

    #[test]
    fn test_raw_resource_data() {
        let response = respond(
            &state(Negotiated::new(ContentType::LdJson, None)),
            reply(ContentStream::ResourceData(ResourceData {
                data: b"hello".to_vec(),
                media_type: String::new(),
            })),
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_enveloped_resource_data_is_json() {
        let response = respond(
            &state(Negotiated::new(ContentType::LdJson, Some(Profile::DidUrlDereferencing))),
            reply(ContentStream::ResourceData(ResourceData {
                data: b"{}".to_vec(),
                media_type: "application/json".to_string(),
            })),
        )
        .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/ld+json");
    }
}
