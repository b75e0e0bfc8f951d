/// Media types, negotiation profiles and verification key types
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Media type of a resolver response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    DidJson,
    DidLdJson,
    LdJson,
    Json,
    Text,
    Unsupported(String),
}

impl ContentType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "application/did+json" => ContentType::DidJson,
            "application/did+ld+json" => ContentType::DidLdJson,
            "application/ld+json" => ContentType::LdJson,
            "application/json" => ContentType::Json,
            "text/plain" => ContentType::Text,
            other => ContentType::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContentType::DidJson => "application/did+json",
            ContentType::DidLdJson => "application/did+ld+json",
            ContentType::LdJson => "application/ld+json",
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
            ContentType::Unsupported(raw) => raw,
        }
    }

    /// Types a DID document can be rendered in
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            ContentType::DidJson | ContentType::DidLdJson | ContentType::LdJson
        )
    }

    /// Whether documents rendered in this type carry `@context`
    pub fn is_json_ld(&self) -> bool {
        matches!(self, ContentType::DidLdJson | ContentType::LdJson)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(ContentType::parse(&raw))
    }
}

/// Envelope profile negotiated through the `profile` media-type parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// DID URL dereferencing result envelope
    DidUrlDereferencing,
    /// Full DID resolution result envelope
    DidResolution,
}

impl Profile {
    pub const DID_URL_DEREFERENCING: &'static str = "https://w3id.org/did-url-dereferencing";
    pub const DID_RESOLUTION: &'static str = "https://w3id.org/did-resolution";

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches('"') {
            Self::DID_URL_DEREFERENCING => Some(Profile::DidUrlDereferencing),
            Self::DID_RESOLUTION => Some(Profile::DidResolution),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::DidUrlDereferencing => Self::DID_URL_DEREFERENCING,
            Profile::DidResolution => Self::DID_RESOLUTION,
        }
    }

    /// Content type reported in resolution metadata for the DID resolution profile
    pub fn did_resolution_content_type() -> String {
        format!(
            "{};profile=\"{}\"",
            ContentType::LdJson.as_str(),
            Self::DID_RESOLUTION
        )
    }
}

/// Verification method types that `transformKeys` can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKeyType {
    Ed25519VerificationKey2018,
    Ed25519VerificationKey2020,
    JsonWebKey2020,
}

impl TransformKeyType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Ed25519VerificationKey2018" => Some(TransformKeyType::Ed25519VerificationKey2018),
            "Ed25519VerificationKey2020" => Some(TransformKeyType::Ed25519VerificationKey2020),
            "JsonWebKey2020" => Some(TransformKeyType::JsonWebKey2020),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKeyType::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
            TransformKeyType::Ed25519VerificationKey2020 => "Ed25519VerificationKey2020",
            TransformKeyType::JsonWebKey2020 => "JsonWebKey2020",
        }
    }

    /// Security suite context of the key type
    pub fn json_ld_context(&self) -> &'static str {
        match self {
            TransformKeyType::Ed25519VerificationKey2018 => super::ED25519_2018_JSONLD,
            TransformKeyType::Ed25519VerificationKey2020 => super::ED25519_2020_JSONLD,
            TransformKeyType::JsonWebKey2020 => super::JSON_WEB_KEY_2020_JSONLD,
        }
    }
}

impl fmt::Display for TransformKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
