/// DID URL query parameters
use crate::error::{ResolverError, ResolverResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const VERSION_ID: &str = "versionId";
pub const VERSION_TIME: &str = "versionTime";
pub const TRANSFORM_KEYS: &str = "transformKeys";
pub const SERVICE: &str = "service";
pub const RELATIVE_REF: &str = "relativeRef";
pub const METADATA: &str = "metadata";

pub const RESOURCE_ID: &str = "resourceId";
pub const RESOURCE_COLLECTION_ID: &str = "resourceCollectionId";
pub const RESOURCE_NAME: &str = "resourceName";
pub const RESOURCE_TYPE: &str = "resourceType";
pub const RESOURCE_VERSION: &str = "resourceVersion";
pub const RESOURCE_VERSION_TIME: &str = "resourceVersionTime";
pub const RESOURCE_METADATA: &str = "resourceMetadata";
pub const CHECKSUM: &str = "checksum";

/// Queries that address the DID document itself
pub const DID_QUERIES: &[&str] = &[VERSION_ID, VERSION_TIME, TRANSFORM_KEYS, SERVICE, RELATIVE_REF, METADATA];

/// Queries that select linked resources
pub const RESOURCE_QUERIES: &[&str] = &[
    RESOURCE_ID,
    RESOURCE_COLLECTION_ID,
    RESOURCE_NAME,
    RESOURCE_METADATA,
    RESOURCE_TYPE,
    RESOURCE_VERSION,
    RESOURCE_VERSION_TIME,
    CHECKSUM,
];

/// Parameters that may accompany `transformKeys`
pub const TRANSFORM_KEYS_COMPANIONS: &[&str] = &[VERSION_ID, VERSION_TIME];

/// Decoded query string, keys in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Parse `a=1&b=2` form data. `+` decodes to a space. A key or value that
    /// is not valid percent-encoded UTF-8 makes the whole DID URL invalid.
    pub fn parse(raw: &str) -> ResolverResult<Self> {
        let mut params = QueryParams::default();

        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let invalid = || ResolverError::InvalidDidUrl(format!("undecodable query parameter: {}", pair));
            let key = decode_component(key).ok_or_else(invalid)?;
            let value = decode_component(value).ok_or_else(invalid)?;
            params.push(key, value);
        }

        Ok(params)
    }

    fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// First value of a parameter
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names that are neither DID nor resource queries
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.keys()
            .filter(|k| !DID_QUERIES.contains(k) && !RESOURCE_QUERIES.contains(k))
            .collect()
    }

    pub fn has_resource_queries(&self) -> bool {
        self.keys().any(|k| RESOURCE_QUERIES.contains(&k))
    }

    /// A parameter given once with an empty value
    pub fn has_empty_values(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, values)| values.len() == 1 && values[0].is_empty())
    }
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|s| s.into_owned())
}

/// Split an encoded fragment (`%23`) off the end of a raw query.
///
/// Returns the query without the fragment and whether one was found. A `%23`
/// followed by another `&` belongs to a parameter value and is kept.
pub fn split_encoded_fragment(raw: &str) -> (&str, bool) {
    match raw.rfind("%23") {
        Some(pos) if !raw[pos..].contains('&') => (&raw[..pos], true),
        _ => (raw, false),
    }
}

/// Parse a query timestamp: RFC 3339, or a bare date / zone-less time read as UTC
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Typed view of a validated query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParameters {
    pub version_id: Option<String>,
    pub version_time: Option<DateTime<Utc>>,
    pub transform_keys: Option<super::TransformKeyType>,
    pub service: Option<String>,
    pub relative_ref: Option<String>,
    pub metadata: Option<bool>,

    pub resource_id: Option<String>,
    pub resource_collection_id: Option<String>,
    pub resource_name: Option<String>,
    pub resource_type: Option<String>,
    pub resource_version: Option<String>,
    pub resource_version_time: Option<DateTime<Utc>>,
    pub resource_metadata: Option<bool>,
    pub checksum: Option<String>,
}

impl RequestParameters {
    /// Build from query params that already passed validation; malformed values are dropped
    pub fn from_query(params: &QueryParams) -> Self {
        let text = |key: &str| params.get(key).map(str::to_string);
        let flag = |key: &str| params.get(key).and_then(|v| v.parse::<bool>().ok());

        Self {
            version_id: text(VERSION_ID),
            version_time: params.get(VERSION_TIME).and_then(parse_time),
            transform_keys: params.get(TRANSFORM_KEYS).and_then(super::TransformKeyType::parse),
            service: text(SERVICE),
            relative_ref: text(RELATIVE_REF),
            metadata: flag(METADATA),
            resource_id: text(RESOURCE_ID),
            resource_collection_id: text(RESOURCE_COLLECTION_ID),
            resource_name: text(RESOURCE_NAME),
            resource_type: text(RESOURCE_TYPE),
            resource_version: text(RESOURCE_VERSION),
            resource_version_time: params.get(RESOURCE_VERSION_TIME).and_then(parse_time),
            resource_metadata: flag(RESOURCE_METADATA),
            checksum: text(CHECKSUM),
        }
    }

    pub fn has_resource_queries(&self) -> bool {
        self.resource_id.is_some()
            || self.resource_collection_id.is_some()
            || self.resource_name.is_some()
            || self.resource_type.is_some()
            || self.resource_version.is_some()
            || self.resource_version_time.is_some()
            || self.resource_metadata.is_some()
            || self.checksum.is_some()
    }

    /// Filters that can single out one logical resource
    pub fn has_identifying_filter(&self) -> bool {
        self.resource_id.is_some()
            || self.resource_name.is_some()
            || self.resource_type.is_some()
            || self.checksum.is_some()
            || self.resource_version_time.is_some()
    }
}
