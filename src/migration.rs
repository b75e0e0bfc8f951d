/// Rewriting of legacy (pre-UUID) identifiers to their current form
use crate::types::did::{is_valid_base58, is_valid_uuid, validate_did, DidParts, DidValidationError};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Character lengths of the legacy base58 identifier forms
const LEGACY_ID_LENGTHS: [usize; 2] = [16, 32];

/// True when the DID is rejected only because of a legacy identifier that
/// [`migrate_did`] knows how to rewrite
pub fn is_migration_needed(did: &str, method: &str, namespaces: &[String]) -> bool {
    match validate_did(did, Some(method), namespaces) {
        Err(DidValidationError::Identifier) => DidParts::split(did)
            .map(|parts| is_legacy_id(&parts.id))
            .unwrap_or(false),
        _ => false,
    }
}

fn is_legacy_id(id: &str) -> bool {
    (LEGACY_ID_LENGTHS.contains(&id.len()) && is_valid_base58(id)) || is_valid_uuid(id)
}

/// Rewrite a DID into the current identifier form. DIDs that cannot be split
/// are returned unchanged.
pub fn migrate_did(did: &str) -> String {
    let Ok(mut parts) = DidParts::split(did) else {
        return did.to_string();
    };

    parts.id = migrate_uuid_id(&migrate_indy_id(&parts.id));
    parts.join()
}

/// Legacy base58 ids become the base58 of the first 16 bytes of their SHA-256
fn migrate_indy_id(id: &str) -> String {
    if is_valid_uuid(id) {
        return id.to_string();
    }

    let hash = Sha256::digest(id.as_bytes());
    bs58::encode(&hash[..16]).into_string()
}

/// Mixed-case UUIDs become the name-based UUID of their text
fn migrate_uuid_id(id: &str) -> String {
    if !is_valid_uuid(id) || id == id.to_lowercase() {
        return id.to_string();
    }

    Uuid::new_v5(&Uuid::nil(), id.as_bytes()).to_string()
}
