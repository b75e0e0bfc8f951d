/// Linked resources: metadata headers and content
use super::rfc3339;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Metadata of one resource version, in dereferenced form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    #[serde(rename = "resourceCollectionId")]
    pub collection_id: String,
    #[serde(rename = "resourceId")]
    pub id: String,
    #[serde(rename = "resourceName")]
    pub name: String,
    pub resource_type: String,
    pub media_type: String,
    #[serde(rename = "resourceVersion", default)]
    pub version: String,
    #[serde(with = "rfc3339")]
    pub created: DateTime<Utc>,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_version_id: Option<String>,
}

impl ResourceMetadata {
    pub fn resource_uri_for(did: &str, resource_id: &str) -> String {
        format!("{}{}{}", did, super::RESOURCE_PATH, resource_id)
    }
}

/// Resource header together with its payload
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceContent {
    pub metadata: ResourceMetadata,
    pub data: Vec<u8>,
}

/// Raw resource payload as served to clients
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData {
    pub data: Vec<u8>,
    pub media_type: String,
}

impl ResourceData {
    /// Payload as embedded in a JSON envelope: parsed JSON when possible
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::from_slice::<serde_json::Value>(&self.data)
            .unwrap_or_else(|_| serde_json::Value::String(STANDARD.encode(&self.data)))
    }
}

impl From<ResourceContent> for ResourceData {
    fn from(content: ResourceContent) -> Self {
        ResourceData {
            media_type: content.metadata.media_type,
            data: content.data,
        }
    }
}

impl Serialize for ResourceData {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = s.serialize_map(Some(1))?;
        map.serialize_entry("resourceData", &self.as_json())?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_uri() {
        assert_eq!(
            ResourceMetadata::resource_uri_for(
                "did:cheqd:testnet:c1685ca0-1f5b-439c-8eb8-5c0e85ab7cd0",
                "9ba3922e-d5f5-4f53-b265-fc0d4e988c77"
            ),
            "did:cheqd:testnet:c1685ca0-1f5b-439c-8eb8-5c0e85ab7cd0/resources/9ba3922e-d5f5-4f53-b265-fc0d4e988c77"
        );
    }

    #[test]
    fn test_resource_data_json_embedding() {
        let json = ResourceData {
            data: br#"{"name":"schema"}"#.to_vec(),
            media_type: "application/json".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&json).unwrap(),
            serde_json::json!({"resourceData": {"name": "schema"}})
        );

        let binary = ResourceData {
            data: vec![0xff, 0x00, 0x10],
            media_type: "image/png".to_string(),
        };
        assert_eq!(binary.as_json(), serde_json::json!("/wAQ"));
    }
}
