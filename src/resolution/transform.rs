/// Verification key format transformation (`transformKeys`)
use crate::error::{ResolverError, ResolverResult};
use crate::types::{DidDoc, TransformKeyType, VerificationMethod};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::json;

/// Multicodec prefix of an Ed25519 public key
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
/// Multibase prefix of base58btc
const BASE58_BTC_PREFIX: char = 'z';
const ED25519_KEY_LENGTH: usize = 32;

/// Rewrite every verification method of the document into `target`
pub fn transform_keys(doc: &mut DidDoc, target: TransformKeyType) -> ResolverResult<()> {
    for method in doc.verification_method.iter_mut() {
        *method = transform_verification_method(method, target)?;
    }
    Ok(())
}

pub fn transform_verification_method(
    method: &VerificationMethod,
    target: TransformKeyType,
) -> ResolverResult<VerificationMethod> {
    let source = TransformKeyType::parse(&method.method_type).ok_or_else(|| {
        ResolverError::RepresentationNotSupported(format!(
            "cannot transform {} keys",
            method.method_type
        ))
    })?;

    if source == target {
        return Ok(method.clone());
    }

    let key = public_key_bytes(method, source)?;
    if key.len() != ED25519_KEY_LENGTH {
        return Err(ResolverError::Internal(format!(
            "verification method {} has a {}-byte key, expected {}",
            method.id,
            key.len(),
            ED25519_KEY_LENGTH
        )));
    }

    let mut transformed = VerificationMethod {
        context: method.context.clone(),
        id: method.id.clone(),
        method_type: target.as_str().to_string(),
        controller: method.controller.clone(),
        public_key_jwk: None,
        public_key_multibase: None,
        public_key_base58: None,
    };

    match target {
        TransformKeyType::Ed25519VerificationKey2018 => {
            transformed.public_key_base58 = Some(encode_base58(&key));
        }
        TransformKeyType::Ed25519VerificationKey2020 => {
            transformed.public_key_multibase = Some(encode_multibase(&key));
        }
        TransformKeyType::JsonWebKey2020 => {
            transformed.public_key_jwk = Some(encode_jwk(&key));
        }
    }

    Ok(transformed)
}

/// Raw Ed25519 key material of a verification method
fn public_key_bytes(method: &VerificationMethod, source: TransformKeyType) -> ResolverResult<Vec<u8>> {
    match source {
        TransformKeyType::Ed25519VerificationKey2018 => {
            let encoded = method
                .public_key_base58
                .as_deref()
                .ok_or_else(|| missing_material(method, "publicKeyBase58"))?;
            bs58::decode(encoded)
                .into_vec()
                .map_err(|e| ResolverError::Internal(format!("invalid publicKeyBase58: {}", e)))
        }
        TransformKeyType::Ed25519VerificationKey2020 => {
            let encoded = method
                .public_key_multibase
                .as_deref()
                .ok_or_else(|| missing_material(method, "publicKeyMultibase"))?;
            decode_multibase(encoded)
        }
        TransformKeyType::JsonWebKey2020 => {
            let jwk = method
                .public_key_jwk
                .as_ref()
                .ok_or_else(|| missing_material(method, "publicKeyJwk"))?;
            decode_jwk(jwk)
        }
    }
}

fn missing_material(method: &VerificationMethod, field: &str) -> ResolverError {
    ResolverError::Internal(format!("verification method {} has no {}", method.id, field))
}

pub fn encode_base58(key: &[u8]) -> String {
    bs58::encode(key).into_string()
}

pub fn encode_multibase(key: &[u8]) -> String {
    let mut bytes = ED25519_MULTICODEC.to_vec();
    bytes.extend_from_slice(key);
    format!("{}{}", BASE58_BTC_PREFIX, bs58::encode(bytes).into_string())
}

pub fn encode_jwk(key: &[u8]) -> serde_json::Value {
    json!({
        "crv": "Ed25519",
        "kty": "OKP",
        "x": URL_SAFE_NO_PAD.encode(key),
    })
}

fn decode_multibase(encoded: &str) -> ResolverResult<Vec<u8>> {
    let body = encoded.strip_prefix(BASE58_BTC_PREFIX).ok_or_else(|| {
        ResolverError::Internal("only base58btc multibase keys are supported".to_string())
    })?;
    let bytes = bs58::decode(body)
        .into_vec()
        .map_err(|e| ResolverError::Internal(format!("invalid publicKeyMultibase: {}", e)))?;

    if bytes.starts_with(&ED25519_MULTICODEC) {
        Ok(bytes[ED25519_MULTICODEC.len()..].to_vec())
    } else {
        Ok(bytes)
    }
}

fn decode_jwk(jwk: &serde_json::Value) -> ResolverResult<Vec<u8>> {
    let kty = jwk.get("kty").and_then(|v| v.as_str());
    let crv = jwk.get("crv").and_then(|v| v.as_str());
    if kty != Some("OKP") || crv != Some("Ed25519") {
        return Err(ResolverError::RepresentationNotSupported(
            "only OKP/Ed25519 JSON web keys can be transformed".to_string(),
        ));
    }

    let x = jwk
        .get("x")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ResolverError::Internal("JSON web key has no x coordinate".to_string()))?;
    URL_SAFE_NO_PAD
        .decode(x)
        .map_err(|e| ResolverError::Internal(format!("invalid JSON web key: {}", e)))
}
