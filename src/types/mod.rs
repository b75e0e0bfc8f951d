/// Domain model shared by the resolver: DIDs, documents, metadata, resources and envelopes
pub mod content_type;
pub mod did;
pub mod did_doc;
pub mod envelope;
pub mod metadata;
pub mod query;
pub mod resource;

pub use content_type::{ContentType, Profile, TransformKeyType};
pub use did::{DidParts, DidValidationError};
pub use did_doc::{AssertionMethod, DidDoc, Fragment, Service, ServiceEndpoint, VerificationMethod};
pub use envelope::{ContentMetadata, ContentStream, DidDereferencing, DidResolution, ResolutionResult};
pub use metadata::{DereferencingMetadata, DidDocMetadata, DidProperties, ResolutionMetadata};
pub use query::{QueryParams, RequestParameters};
pub use resource::{ResourceContent, ResourceData, ResourceMetadata};

/// DID method served by this resolver
pub const DID_METHOD: &str = "cheqd";

/// Route prefix and sub-paths of the resolver HTTP surface
pub const RESOLVER_PATH: &str = "/1.0/identifiers/";
pub const DID_VERSION_PATH: &str = "/version/";
pub const DID_VERSIONS_PATH: &str = "/versions";
pub const DID_METADATA_PATH: &str = "/metadata";
pub const RESOURCE_PATH: &str = "/resources/";

/// JSON-LD contexts
pub const DID_SCHEMA_JSONLD: &str = "https://www.w3.org/ns/did/v1";
pub const RESOLUTION_SCHEMA_JSONLD: &str = "https://w3id.org/did-resolution/v1";
pub const LINKED_DOMAINS_JSONLD: &str =
    "https://identity.foundation/.well-known/did-configuration/v1";
pub const ED25519_2020_JSONLD: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const ED25519_2018_JSONLD: &str = "https://w3id.org/security/suites/ed25519-2018/v1";
pub const JSON_WEB_KEY_2020_JSONLD: &str = "https://w3id.org/security/suites/jws-2020/v1";

/// Service type that pulls in the well-known DID configuration context
pub const LINKED_DOMAINS_SERVICE: &str = "LinkedDomains";

/// Format a timestamp the way resolution metadata carries it
pub fn format_time(time: &chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

/// Serde helpers for RFC 3339 timestamps with `Z` suffix
pub(crate) mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => s.serialize_str(&super::super::format_time(t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw.as_deref() {
                None | Some("") => Ok(None),
                Some(value) => DateTime::parse_from_rfc3339(value)
                    .map(|t| Some(t.with_timezone(&Utc)))
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}
