/// DID resolution and dereferencing result envelopes
use super::{
    DereferencingMetadata, DidDoc, DidDocMetadata, Fragment, ResolutionMetadata, ResourceData,
    ResourceMetadata, DID_SCHEMA_JSONLD, RESOLUTION_SCHEMA_JSONLD,
};
use serde::{Serialize, Serializer};

/// Result of resolving a DID to its document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolution {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub did_resolution_metadata: ResolutionMetadata,
    pub did_document: Option<DidDoc>,
    #[serde(serialize_with = "empty_object_if_none")]
    pub did_document_metadata: Option<DidDocMetadata>,
}

impl DidResolution {
    pub fn new(metadata: ResolutionMetadata, document: DidDoc, document_metadata: DidDocMetadata) -> Self {
        Self {
            context: None,
            did_resolution_metadata: metadata,
            did_document: Some(document),
            did_document_metadata: Some(document_metadata),
        }
    }

    pub fn from_error(metadata: ResolutionMetadata) -> Self {
        Self {
            context: None,
            did_resolution_metadata: metadata,
            did_document: None,
            did_document_metadata: None,
        }
    }
}

/// Result of dereferencing a DID URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDereferencing {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub dereferencing_metadata: DereferencingMetadata,
    pub content_stream: Option<ContentStream>,
    #[serde(serialize_with = "empty_object_if_none")]
    pub content_metadata: Option<ContentMetadata>,
}

impl DidDereferencing {
    pub fn new(
        metadata: DereferencingMetadata,
        stream: ContentStream,
        content_metadata: Option<ContentMetadata>,
    ) -> Self {
        Self {
            context: None,
            dereferencing_metadata: metadata,
            content_stream: Some(stream),
            content_metadata,
        }
    }

    pub fn from_error(metadata: DereferencingMetadata) -> Self {
        Self {
            context: None,
            dereferencing_metadata: metadata,
            content_stream: None,
            content_metadata: None,
        }
    }
}

/// Polymorphic payload of a dereferencing result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentStream {
    DidDoc(DidDoc),
    Fragment(Fragment),
    DidDocMetadata(DidDocMetadata),
    #[serde(rename_all = "camelCase")]
    Versions { versions: Vec<DidDocMetadata> },
    #[serde(rename_all = "camelCase")]
    ResourceMetadataList {
        linked_resource_metadata: Vec<ResourceMetadata>,
    },
    ResourceData(ResourceData),
    /// Target URL of a service endpoint redirect
    Redirect(String),
}

impl ContentStream {
    pub fn add_json_ld_contexts(&mut self) {
        match self {
            ContentStream::DidDoc(doc) => doc.add_json_ld_contexts(),
            ContentStream::Fragment(fragment) => fragment.add_context(DID_SCHEMA_JSONLD),
            _ => {}
        }
    }

    pub fn remove_context(&mut self) {
        match self {
            ContentStream::DidDoc(doc) => doc.remove_context(),
            ContentStream::Fragment(fragment) => fragment.remove_context(),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentMetadata {
    Document(DidDocMetadata),
    Resource(ResourceMetadata),
}

fn empty_object_if_none<T: Serialize, S: Serializer>(
    value: &Option<T>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(inner) => inner.serialize(s),
        None => serde_json::Map::new().serialize(s),
    }
}

/// What a resolver request produced, before it is written to the wire
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    Resolution(DidResolution),
    Dereferencing(DidDereferencing),
}

impl ResolutionResult {
    pub fn content_type(&self) -> &str {
        match self {
            ResolutionResult::Resolution(r) => &r.did_resolution_metadata.content_type,
            ResolutionResult::Dereferencing(d) => &d.dereferencing_metadata.0.content_type,
        }
    }

    pub fn is_dereferencing(&self) -> bool {
        matches!(self, ResolutionResult::Dereferencing(_))
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            ResolutionResult::Dereferencing(DidDereferencing {
                content_stream: Some(ContentStream::Redirect(url)),
                ..
            }) => Some(url),
            _ => None,
        }
    }

    pub fn resource_data(&self) -> Option<&ResourceData> {
        match self {
            ResolutionResult::Dereferencing(DidDereferencing {
                content_stream: Some(ContentStream::ResourceData(data)),
                ..
            }) => Some(data),
            _ => None,
        }
    }

    /// Mark the envelope as JSON-LD and extend the payload contexts, or strip
    /// every context for plain JSON representations
    pub fn apply_contexts(&mut self, json_ld: bool) {
        match self {
            ResolutionResult::Resolution(r) => {
                if json_ld {
                    r.context = Some(RESOLUTION_SCHEMA_JSONLD.to_string());
                    if let Some(doc) = r.did_document.as_mut() {
                        doc.add_json_ld_contexts();
                    }
                } else {
                    r.context = None;
                    if let Some(doc) = r.did_document.as_mut() {
                        doc.remove_context();
                    }
                }
            }
            ResolutionResult::Dereferencing(d) => {
                if json_ld {
                    d.context = Some(RESOLUTION_SCHEMA_JSONLD.to_string());
                    if let Some(stream) = d.content_stream.as_mut() {
                        stream.add_json_ld_contexts();
                    }
                } else {
                    d.context = None;
                    if let Some(stream) = d.content_stream.as_mut() {
                        stream.remove_context();
                    }
                }
            }
        }
    }

    /// Bare payload without the envelope, as served to document-only requests
    pub fn content_stream_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            ResolutionResult::Resolution(r) => serde_json::to_value(&r.did_document),
            ResolutionResult::Dereferencing(d) => serde_json::to_value(&d.content_stream),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            ResolutionResult::Resolution(r) => serde_json::to_value(r),
            ResolutionResult::Dereferencing(d) => serde_json::to_value(d),
        }
    }
}
