/// Document metadata and resolution/dereferencing metadata
use super::{did::DidParts, rfc3339, ContentType, ResourceMetadata};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of one historical version of a DID document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocMetadata {
    #[serde(with = "rfc3339")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deactivated: bool,
    pub version_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,
    #[serde(
        rename = "linkedResourceMetadata",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub resources: Vec<ResourceMetadata>,
}

impl DidDocMetadata {
    /// `updated` when present, `created` otherwise
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.updated.unwrap_or(self.created)
    }

    /// Metadata attached to a dereferenced fragment carries no resources
    pub fn without_resources(mut self) -> Self {
        self.resources.clear();
        self
    }
}

/// The `did` block inside resolution metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidProperties {
    pub did_string: String,
    pub method_specific_id: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub retrieved: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<DidProperties>,
}

impl ResolutionMetadata {
    pub fn new(did: &str, content_type: ContentType) -> Self {
        let did_properties = DidParts::split(did).ok().map(|parts| DidProperties {
            did_string: did.to_string(),
            method_specific_id: parts.id,
            method: parts.method,
        });

        Self {
            content_type: content_type.as_str().to_string(),
            error: None,
            error_message: None,
            retrieved: super::format_time(&Utc::now().trunc_subsecs(0)),
            did: did_properties,
        }
    }
}

/// Dereferencing metadata shares the resolution metadata shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DereferencingMetadata(pub ResolutionMetadata);

impl From<ResolutionMetadata> for DereferencingMetadata {
    fn from(metadata: ResolutionMetadata) -> Self {
        DereferencingMetadata(metadata)
    }
}
