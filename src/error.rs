/// Unified error types for the cheqd DID resolver
use crate::types::{
    ContentType, DereferencingMetadata, DidDereferencing, DidResolution, ResolutionMetadata,
};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the resolver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    /// The DID does not match the method grammar or uses an unknown namespace
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// Malformed DID URL, or a query that does not single out one result
    #[error("invalid DID URL: {0}")]
    InvalidDidUrl(String),

    /// Unsupported Accept header or an illegal combination of query parameters
    #[error("representation not supported: {0}")]
    RepresentationNotSupported(String),

    /// The DID uses a method this resolver does not serve
    #[error("method not supported: {0}")]
    MethodNotSupported(String),

    /// Document, version, resource or service is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected ledger or transport failure
    #[error("internal error: {0}")]
    Internal(String),

    /// Every endpoint configured for the namespace is down
    #[error("no healthy endpoints available for namespace {0}")]
    NoHealthyEndpoints(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResolverError {
    fn from(e: std::io::Error) -> Self {
        ResolverError::Io(e.to_string())
    }
}

impl ResolverError {
    /// DID Resolution error code placed into resolution/dereferencing metadata
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::InvalidDid(_) => "invalidDid",
            ResolverError::InvalidDidUrl(_) => "invalidDidUrl",
            ResolverError::RepresentationNotSupported(_) => "representationNotSupported",
            ResolverError::MethodNotSupported(_) => "methodNotSupported",
            ResolverError::NotFound(_) => "notFound",
            ResolverError::Internal(_)
            | ResolverError::NoHealthyEndpoints(_)
            | ResolverError::Config(_)
            | ResolverError::Io(_) => "internalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolverError::InvalidDid(_) | ResolverError::InvalidDidUrl(_) => StatusCode::BAD_REQUEST,
            ResolverError::RepresentationNotSupported(_) | ResolverError::MethodNotSupported(_) => {
                StatusCode::NOT_ACCEPTABLE
            }
            ResolverError::NotFound(_) => StatusCode::NOT_FOUND,
            ResolverError::NoHealthyEndpoints(_) => StatusCode::SERVICE_UNAVAILABLE,
            ResolverError::Internal(_) | ResolverError::Config(_) | ResolverError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to clients
    pub fn public_message(&self) -> String {
        match self {
            ResolverError::Config(_) | ResolverError::Io(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Internal failures are logged at error level, the rest are client outcomes
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Attach the request context needed to render a resolution envelope
    pub fn into_identity_error(
        self,
        did: impl Into<String>,
        content_type: ContentType,
        is_dereferencing: bool,
    ) -> IdentityError {
        IdentityError {
            error: self,
            did: did.into(),
            content_type,
            is_dereferencing,
        }
    }
}

/// Plain error response format for routes outside the resolution pipeline
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert ResolverError to HTTP response
impl IntoResponse for ResolverError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message: self.public_message(),
        });

        (status, body).into_response()
    }
}

/// A resolver error bound to the request that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityError {
    pub error: ResolverError,
    pub did: String,
    pub content_type: ContentType,
    pub is_dereferencing: bool,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (did: {})", self.error, self.did)
    }
}

impl std::error::Error for IdentityError {}

impl IdentityError {
    /// Render the error as a resolution or dereferencing envelope
    pub fn envelope(&self) -> serde_json::Value {
        let content_type = if self.content_type.is_supported() {
            self.content_type.clone()
        } else {
            ContentType::Json
        };
        let mut metadata = ResolutionMetadata::new(&self.did, content_type.clone());
        metadata.error = Some(self.error.code().to_string());
        metadata.error_message = Some(self.error.public_message());

        let value = if self.is_dereferencing {
            serde_json::to_value(DidDereferencing::from_error(DereferencingMetadata::from(
                metadata,
            )))
        } else {
            serde_json::to_value(DidResolution::from_error(metadata))
        };

        value.unwrap_or_else(|_| serde_json::json!({ "error": self.error.code() }))
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        if self.error.is_internal() {
            tracing::error!(did = %self.did, error = %self.error, "request failed");
        } else {
            tracing::warn!(did = %self.did, error = %self.error, "request rejected");
        }

        let content_type = if self.content_type.is_supported() {
            self.content_type.as_str()
        } else {
            ContentType::Json.as_str()
        };

        let body = self.envelope();
        (
            self.error.status_code(),
            [(header::CONTENT_TYPE, content_type)],
            Json(body),
        )
            .into_response()
    }
}

/// Result type alias for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_statuses() {
        let cases = [
            (ResolverError::InvalidDid("x".into()), "invalidDid", StatusCode::BAD_REQUEST),
            (ResolverError::InvalidDidUrl("x".into()), "invalidDidUrl", StatusCode::BAD_REQUEST),
            (ResolverError::NotFound("x".into()), "notFound", StatusCode::NOT_FOUND),
            (
                ResolverError::RepresentationNotSupported("x".into()),
                "representationNotSupported",
                StatusCode::NOT_ACCEPTABLE,
            ),
            (
                ResolverError::MethodNotSupported("x".into()),
                "methodNotSupported",
                StatusCode::NOT_ACCEPTABLE,
            ),
            (ResolverError::Internal("x".into()), "internalError", StatusCode::INTERNAL_SERVER_ERROR),
            (
                ResolverError::NoHealthyEndpoints("mainnet".into()),
                "internalError",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status_code(), status);
        }
    }

    #[test]
    fn test_identity_error_envelope_resolution() {
        let err = ResolverError::NotFound("did".into()).into_identity_error(
            "did:cheqd:testnet:CpeMubv5yw63jXyrgRRsxR",
            ContentType::DidLdJson,
            false,
        );
        let body = err.envelope();

        assert_eq!(body["didResolutionMetadata"]["error"], "notFound");
        assert_eq!(body["didResolutionMetadata"]["errorMessage"], "not found: did");
        assert_eq!(
            body["didResolutionMetadata"]["did"]["didString"],
            "did:cheqd:testnet:CpeMubv5yw63jXyrgRRsxR"
        );
        assert!(body["didDocument"].is_null());
    }

    #[test]
    fn test_identity_error_envelope_dereferencing() {
        let err = ResolverError::InvalidDidUrl("ambiguous".into()).into_identity_error(
            "did:cheqd:mainnet:CpeMubv5yw63jXyrgRRsxR",
            ContentType::Unsupported("text/html".into()),
            true,
        );
        let body = err.envelope();

        assert_eq!(body["dereferencingMetadata"]["error"], "invalidDidUrl");
        assert_eq!(body["dereferencingMetadata"]["contentType"], "application/json");
        assert!(body["contentStream"].is_null());
    }

    #[test]
    fn test_internal_classification() {
        assert!(ResolverError::Internal("boom".into()).is_internal());
        assert!(ResolverError::NoHealthyEndpoints("testnet".into()).is_internal());
        assert!(!ResolverError::NotFound("x".into()).is_internal());
    }

    #[test]
    fn test_public_message_hides_configuration_detail() {
        assert_eq!(
            ResolverError::NotFound("service website".into()).public_message(),
            "not found: service website"
        );
        assert_eq!(
            ResolverError::Config("LEDGER_NETWORKS=secret".into()).public_message(),
            "Internal server error"
        );
    }
}
