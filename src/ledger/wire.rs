/// JSON shapes of the ledger REST gateway and their conversion into the resolver model
use crate::types::{
    rfc3339, AssertionMethod, DidDoc, DidDocMetadata, ResourceContent, ResourceMetadata, Service,
    ServiceEndpoint, TransformKeyType, VerificationMethod,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct QueryDidDocResponse {
    pub value: DidDocWithMetadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DidDocWithMetadata {
    #[serde(alias = "didDoc")]
    pub did_doc: LedgerDidDoc,
    pub metadata: LedgerDidMetadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryVersionsResponse {
    #[serde(default)]
    pub versions: Vec<LedgerDidMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResourceResponse {
    pub resource: ResourceWithMetadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceWithMetadata {
    pub resource: LedgerResourceData,
    pub metadata: LedgerResourceMetadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerResourceData {
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryCollectionResponse {
    #[serde(default)]
    pub resources: Vec<LedgerResourceMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LedgerDidDoc {
    #[serde(default)]
    pub context: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub controller: Vec<String>,
    #[serde(default, alias = "verificationMethod")]
    pub verification_method: Vec<LedgerVerificationMethod>,
    #[serde(default)]
    pub authentication: Vec<String>,
    #[serde(default, alias = "assertionMethod")]
    pub assertion_method: Vec<String>,
    #[serde(default, alias = "capabilityInvocation")]
    pub capability_invocation: Vec<String>,
    #[serde(default, alias = "capabilityDelegation")]
    pub capability_delegation: Vec<String>,
    #[serde(default, alias = "keyAgreement")]
    pub key_agreement: Vec<String>,
    #[serde(default)]
    pub service: Vec<LedgerService>,
    #[serde(default, alias = "alsoKnownAs")]
    pub also_known_as: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerVerificationMethod {
    pub id: String,
    #[serde(alias = "verificationMethodType")]
    pub verification_method_type: String,
    pub controller: String,
    #[serde(default, alias = "verificationMaterial")]
    pub verification_material: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerService {
    pub id: String,
    #[serde(alias = "serviceType")]
    pub service_type: String,
    #[serde(default, alias = "serviceEndpoint")]
    pub service_endpoint: Vec<String>,
    #[serde(default, alias = "recipientKeys")]
    pub recipient_keys: Vec<String>,
    #[serde(default, alias = "routingKeys")]
    pub routing_keys: Vec<String>,
    #[serde(default)]
    pub accept: Vec<String>,
    #[serde(default)]
    pub priority: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerDidMetadata {
    #[serde(with = "rfc3339")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "rfc3339::option")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deactivated: bool,
    #[serde(alias = "versionId")]
    pub version_id: String,
    #[serde(default, alias = "nextVersionId")]
    pub next_version_id: String,
    #[serde(default, alias = "previousVersionId")]
    pub previous_version_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerResourceMetadata {
    #[serde(alias = "collectionId")]
    pub collection_id: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(alias = "resourceType")]
    pub resource_type: String,
    #[serde(default, alias = "mediaType")]
    pub media_type: String,
    #[serde(with = "rfc3339")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub checksum: String,
    #[serde(default, alias = "previousVersionId")]
    pub previous_version_id: String,
    #[serde(default, alias = "nextVersionId")]
    pub next_version_id: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl From<LedgerVerificationMethod> for VerificationMethod {
    fn from(method: LedgerVerificationMethod) -> Self {
        let mut converted = VerificationMethod {
            context: Vec::new(),
            id: method.id,
            method_type: method.verification_method_type,
            controller: method.controller,
            public_key_jwk: None,
            public_key_multibase: None,
            public_key_base58: None,
        };

        let material = method.verification_material;
        match TransformKeyType::parse(&converted.method_type) {
            Some(TransformKeyType::Ed25519VerificationKey2018) => {
                converted.public_key_base58 = Some(material);
            }
            Some(TransformKeyType::JsonWebKey2020) => {
                converted.public_key_jwk = serde_json::from_str(&material).ok();
            }
            _ => match serde_json::from_str::<serde_json::Value>(&material) {
                Ok(jwk) if jwk.is_object() => converted.public_key_jwk = Some(jwk),
                _ => converted.public_key_multibase = Some(material),
            },
        }

        converted
    }
}

impl From<LedgerService> for Service {
    fn from(service: LedgerService) -> Self {
        Service {
            context: Vec::new(),
            id: service.id,
            service_type: service.service_type,
            service_endpoint: ServiceEndpoint(service.service_endpoint),
            recipient_keys: service.recipient_keys,
            routing_keys: service.routing_keys,
            accept: service.accept,
            priority: service.priority,
        }
    }
}

impl From<LedgerDidDoc> for DidDoc {
    fn from(doc: LedgerDidDoc) -> Self {
        DidDoc {
            context: doc.context,
            id: doc.id,
            controller: doc.controller,
            verification_method: doc.verification_method.into_iter().map(Into::into).collect(),
            authentication: doc.authentication,
            assertion_method: doc
                .assertion_method
                .iter()
                .filter_map(|entry| AssertionMethod::from_ledger(entry))
                .collect(),
            capability_invocation: doc.capability_invocation,
            capability_delegation: doc.capability_delegation,
            key_agreement: doc.key_agreement,
            service: doc.service.into_iter().map(Into::into).collect(),
            also_known_as: doc.also_known_as,
        }
    }
}

impl From<LedgerDidMetadata> for DidDocMetadata {
    fn from(metadata: LedgerDidMetadata) -> Self {
        DidDocMetadata {
            created: metadata.created,
            updated: metadata.updated,
            deactivated: metadata.deactivated,
            version_id: metadata.version_id,
            next_version_id: non_empty(metadata.next_version_id),
            previous_version_id: non_empty(metadata.previous_version_id),
            resources: Vec::new(),
        }
    }
}

impl LedgerResourceMetadata {
    pub fn into_metadata(self, did: &str) -> ResourceMetadata {
        ResourceMetadata {
            resource_uri: ResourceMetadata::resource_uri_for(did, &self.id),
            collection_id: self.collection_id,
            id: self.id,
            name: self.name,
            resource_type: self.resource_type,
            media_type: self.media_type,
            version: self.version,
            created: self.created,
            checksum: self.checksum,
            previous_version_id: non_empty(self.previous_version_id),
            next_version_id: non_empty(self.next_version_id),
        }
    }
}

impl ResourceWithMetadata {
    pub fn into_content(self, did: &str) -> Result<ResourceContent, base64::DecodeError> {
        let data = STANDARD.decode(self.resource.data.as_bytes())?;
        Ok(ResourceContent {
            metadata: self.metadata.into_metadata(did),
            data,
        })
    }
}
