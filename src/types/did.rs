/// DID syntax: splitting, joining and validation of `did:<method>:<namespace>:<id>`
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

lazy_static! {
    static ref SPLIT_DID_REGEX: Regex =
        Regex::new(r"^did:([^:]+?)(:([^:]+?))?:([^:]+)$").expect("valid DID regex");
    static ref NAMESPACE_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9]*$").expect("valid namespace regex");
}

/// Length in bytes of a decoded Indy-style identifier
pub const INDY_ID_LENGTH: usize = 16;

/// Why a DID failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidValidationError {
    #[error("unable to split did into method, namespace and id")]
    Syntax,

    #[error("did method must be: {0}")]
    Method(String),

    #[error("invalid did namespace")]
    NamespaceSyntax,

    #[error("did namespace must be one of: {0}")]
    NamespaceNotAllowed(String),

    #[error("unique id should be one of: 16 bytes of decoded base58 string or UUID")]
    Identifier,
}

/// The three components of a DID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidParts {
    pub method: String,
    pub namespace: String,
    pub id: String,
}

impl DidParts {
    pub fn split(did: &str) -> Result<Self, DidValidationError> {
        let captures = SPLIT_DID_REGEX
            .captures(did)
            .ok_or(DidValidationError::Syntax)?;

        let group = |i: usize| captures.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();

        Ok(Self {
            method: group(1),
            namespace: group(3),
            id: group(4),
        })
    }

    pub fn join(&self) -> String {
        join_did(&self.method, &self.namespace, &self.id)
    }
}

pub fn join_did(method: &str, namespace: &str, id: &str) -> String {
    if namespace.is_empty() {
        format!("did:{}:{}", method, id)
    } else {
        format!("did:{}:{}:{}", method, namespace, id)
    }
}

/// Validate a DID, checking the method only when one is given and the namespace
/// only when an allow-list is given
pub fn validate_did(
    did: &str,
    method: Option<&str>,
    allowed_namespaces: &[String],
) -> Result<DidParts, DidValidationError> {
    let parts = DidParts::split(did)?;

    if let Some(method) = method {
        if parts.method != method {
            return Err(DidValidationError::Method(method.to_string()));
        }
    }

    if !NAMESPACE_REGEX.is_match(&parts.namespace) {
        return Err(DidValidationError::NamespaceSyntax);
    }

    if !allowed_namespaces.is_empty() && !allowed_namespaces.iter().any(|ns| ns == &parts.namespace) {
        return Err(DidValidationError::NamespaceNotAllowed(allowed_namespaces.join(", ")));
    }

    if !is_valid_id(&parts.id) {
        return Err(DidValidationError::Identifier);
    }

    Ok(parts)
}

pub fn is_valid_uuid(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

/// Base58 string decoding to exactly 16 bytes
pub fn is_valid_indy_id(value: &str) -> bool {
    bs58::decode(value)
        .into_vec()
        .map(|bytes| bytes.len() == INDY_ID_LENGTH)
        .unwrap_or(false)
}

pub fn is_valid_base58(value: &str) -> bool {
    bs58::decode(value).into_vec().is_ok()
}

pub fn is_valid_id(value: &str) -> bool {
    is_valid_indy_id(value) || is_valid_uuid(value)
}

/// Lowercase a UUID, leaving any other identifier untouched
pub fn normalize_id(id: &str) -> String {
    if is_valid_uuid(id) {
        id.to_lowercase()
    } else {
        id.to_string()
    }
}
