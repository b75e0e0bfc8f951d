/// DID URL query validation and the query handler chain
use super::resources::{filter_resources, select_resource, ResourceSelection};
use super::service::{DidDocService, ResourceService};
use super::{transform, versions};
use crate::error::{ResolverError, ResolverResult};
use crate::types::did::is_valid_uuid;
use crate::types::query::{
    parse_time, METADATA, RELATIVE_REF, RESOURCE_COLLECTION_ID, RESOURCE_ID, RESOURCE_METADATA,
    RESOURCE_NAME, RESOURCE_TYPE, RESOURCE_VERSION, RESOURCE_VERSION_TIME, SERVICE, TRANSFORM_KEYS,
    VERSION_ID, VERSION_TIME,
};
use crate::types::{DidDoc, DidDocMetadata, QueryParams, RequestParameters, ResourceContent, ResourceMetadata, TransformKeyType};
use tracing::debug;

/// Parameters that cannot accompany `transformKeys`
const TRANSFORM_KEYS_EXCLUSIVE: &[&str] = &[
    SERVICE,
    RELATIVE_REF,
    RESOURCE_COLLECTION_ID,
    RESOURCE_ID,
    RESOURCE_NAME,
    RESOURCE_TYPE,
    RESOURCE_VERSION,
    RESOURCE_VERSION_TIME,
    METADATA,
    RESOURCE_METADATA,
];

fn not_supported(message: impl Into<String>) -> ResolverError {
    ResolverError::RepresentationNotSupported(message.into())
}

/// Check the query and turn it into typed parameters
pub fn validate_query(query: &QueryParams) -> ResolverResult<RequestParameters> {
    let unknown = query.unknown_keys();
    if !unknown.is_empty() {
        return Err(not_supported(format!("unknown query parameters: {}", unknown.join(", "))));
    }

    if query.has_empty_values() {
        return Err(not_supported("query parameters must not be empty"));
    }

    if let Some(key_type) = query.get(TRANSFORM_KEYS) {
        if let Some(conflict) = TRANSFORM_KEYS_EXCLUSIVE.iter().find(|k| query.contains(k)) {
            return Err(not_supported(format!("transformKeys cannot be combined with {}", conflict)));
        }
        if TransformKeyType::parse(key_type).is_none() {
            return Err(not_supported(format!("unsupported transformKeys value: {}", key_type)));
        }
    }

    if query.contains(RELATIVE_REF) && !query.contains(SERVICE) {
        return Err(not_supported("relativeRef requires service"));
    }

    if (query.contains(SERVICE) || query.contains(METADATA)) && query.has_resource_queries() {
        return Err(not_supported("service and metadata cannot be combined with resource queries"));
    }

    for flag in [METADATA, RESOURCE_METADATA] {
        if let Some(value) = query.get(flag) {
            if value.parse::<bool>().is_err() {
                return Err(not_supported(format!("{} must be true or false", flag)));
            }
        }
    }

    for time in [VERSION_TIME, RESOURCE_VERSION_TIME] {
        if let Some(value) = query.get(time) {
            if parse_time(value).is_none() {
                return Err(not_supported(format!("{} is not a valid timestamp: {}", time, value)));
            }
        }
    }

    for id in [VERSION_ID, RESOURCE_ID] {
        if let Some(value) = query.get(id) {
            if !is_valid_uuid(value) {
                return Err(ResolverError::InvalidDidUrl(format!("{} must be a UUID: {}", id, value)));
            }
        }
    }

    if query.len() == 1 && query.contains(RESOURCE_VERSION_TIME) {
        return Err(not_supported("resourceVersionTime must be combined with another resource query"));
    }

    Ok(RequestParameters::from_query(query))
}

/// What a validated query resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// A (possibly transformed) document with its metadata
    Document(DidDoc, DidDocMetadata),
    /// `metadata=true`: the selected version's metadata
    Metadata(DidDocMetadata),
    /// `service`: where the client should be sent
    ServiceRedirect(String),
    /// `resourceMetadata=true`: the matching resources' metadata
    Resources(Vec<ResourceMetadata>),
    /// A single resource, data included
    Resource(ResourceContent),
}

/// Run the query chain for `did`
pub async fn resolve_query(
    documents: &DidDocService,
    resources: &ResourceService,
    did: &str,
    params: &RequestParameters,
) -> ResolverResult<QueryOutcome> {
    let all = documents.all_versions(did).await?;
    let selected = select_version(&all, params, did)?;
    debug!("Query for {} selected version {}", did, selected.version_id);

    let mut doc = documents.document(did, &selected.version_id).await?;
    let metadata = selected.clone();

    if let Some(target) = params.transform_keys {
        transform::transform_keys(&mut doc, target)?;
    }

    if params.metadata == Some(true) {
        return Ok(QueryOutcome::Metadata(metadata));
    }

    if let Some(name) = &params.service {
        return service_redirect(&doc, name, params.relative_ref.as_deref()).map(QueryOutcome::ServiceRedirect);
    }

    if params.has_resource_queries() {
        let candidates = if params.resource_version_time.is_some()
            && params.version_id.is_none()
            && params.version_time.is_none()
        {
            resources.collection(did).await?
        } else {
            metadata.resources.clone()
        };

        let filtered = filter_resources(candidates, params)?;
        return match select_resource(filtered, params)? {
            ResourceSelection::List(list) => Ok(QueryOutcome::Resources(list)),
            ResourceSelection::Single(found) => resources
                .resource(did, &found.id)
                .await
                .map(QueryOutcome::Resource),
        };
    }

    if params.metadata == Some(false) {
        return Ok(QueryOutcome::Document(doc, metadata.without_resources()));
    }

    Ok(QueryOutcome::Document(doc, metadata))
}

/// Version named by `versionId`, active at `versionTime`, or the latest one.
/// With both given, the named version is kept as long as it had taken effect
/// by the time.
fn select_version<'a>(
    all: &'a [DidDocMetadata],
    params: &RequestParameters,
    did: &str,
) -> ResolverResult<&'a DidDocMetadata> {
    let not_found = || ResolverError::NotFound(did.to_string());

    match (&params.version_id, params.version_time) {
        (Some(id), time) => {
            let version = versions::find_by_id(all, id).ok_or_else(not_found)?;
            match time {
                Some(time) if version.effective_time() > time => Err(not_found()),
                _ => Ok(version),
            }
        }
        (None, Some(time)) => versions::find_active_for_time(all, time).ok_or_else(not_found),
        (None, None) => versions::latest(all).ok_or_else(not_found),
    }
}

/// Endpoint of the service whose id fragment is `name`, with `relative_ref` appended
fn service_redirect(doc: &DidDoc, name: &str, relative_ref: Option<&str>) -> ResolverResult<String> {
    let service = doc
        .service_by_name(name)
        .ok_or_else(|| ResolverError::NotFound(format!("service {}", name)))?;

    let endpoint = service
        .service_endpoint
        .first()
        .ok_or_else(|| ResolverError::NotFound(format!("service {} has no endpoint", name)))?;

    Ok(match relative_ref {
        Some(relative) => format!("{}{}", endpoint, relative),
        None => endpoint.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryLedger, LedgerGateway};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    const DID: &str = "did:cheqd:testnet:CpeMubv5yw63jXyrgRRsxR";
    const V1: &str = "a2f5a0e4-6b41-4d3c-9c1a-0b2f1f0d8a01";
    const V2: &str = "b7c7d5a8-2e4f-4c3b-8a9e-1c2d3e4f5a02";
    const SCHEMA_1: &str = "9ba3922e-d5f5-4f53-b265-fc0d4e988c77";
    const SCHEMA_2: &str = "e733ebb7-c8dd-41ed-9d42-33bceea70b7f";
    const LOGO: &str = "5e16a3f9-7c6e-4b6b-8e0f-ff4c7e6d0a11";

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 26, h, 0, 0).unwrap()
    }

    fn doc() -> DidDoc {
        serde_json::from_value(serde_json::json!({
            "id": DID,
            "verificationMethod": [{
                "id": format!("{}#key-1", DID),
                "type": "JsonWebKey2020",
                "controller": DID,
                "publicKeyJwk": {"crv": "Ed25519", "kty": "OKP", "x": "VCpo2LMLhn6iWku8MKvSLg2ZAoC-nlOyPVQaO3FxVeQ"}
            }],
            "service": [{
                "id": format!("{}#website", DID),
                "type": "LinkedDomains",
                "serviceEndpoint": ["https://www.cheqd.io"]
            }]
        }))
        .unwrap()
    }

    fn version(id: &str, hour: u32) -> DidDocMetadata {
        DidDocMetadata {
            created: at(hour),
            updated: None,
            deactivated: false,
            version_id: id.to_string(),
            next_version_id: None,
            previous_version_id: None,
            resources: Vec::new(),
        }
    }

    fn resource(id: &str, name: &str, resource_type: &str, hour: u32) -> ResourceContent {
        ResourceContent {
            metadata: ResourceMetadata {
                resource_uri: ResourceMetadata::resource_uri_for(DID, id),
                collection_id: "CpeMubv5yw63jXyrgRRsxR".to_string(),
                id: id.to_string(),
                name: name.to_string(),
                resource_type: resource_type.to_string(),
                media_type: "application/json".to_string(),
                version: String::new(),
                created: at(hour),
                checksum: format!("sum-{}", id),
                previous_version_id: None,
                next_version_id: None,
            },
            data: format!("{{\"id\":\"{}\"}}", id).into_bytes(),
        }
    }

    fn services() -> (DidDocService, ResourceService) {
        let ledger: Arc<dyn LedgerGateway> = Arc::new(
            InMemoryLedger::new()
                .with_version(doc(), version(V1, 1))
                .with_version(doc(), version(V2, 5))
                .with_resource(DID, resource(SCHEMA_1, "schema", "JSONSchema2020", 2))
                .with_resource(DID, resource(SCHEMA_2, "schema", "JSONSchema2020", 6))
                .with_resource(DID, resource(LOGO, "logo", "Image", 3)),
        );
        (DidDocService::new(ledger.clone()), ResourceService::new(ledger))
    }

    async fn run(query: &str) -> ResolverResult<QueryOutcome> {
        let params = validate_query(&QueryParams::parse(query)?)?;
        let (documents, resources) = services();
        resolve_query(&documents, &resources, DID, &params).await
    }

    #[test]
    fn test_validation_order() {
        let check = |q: &str| QueryParams::parse(q).and_then(|p| validate_query(&p)).map(|_| ());

        assert!(matches!(check("unknown=1"), Err(ResolverError::RepresentationNotSupported(_))));
        assert!(matches!(check("versionId="), Err(ResolverError::RepresentationNotSupported(_))));
        assert!(matches!(
            check("relativeRef=/path"),
            Err(ResolverError::RepresentationNotSupported(_))
        ));
        assert!(matches!(
            check("service=website&resourceName=schema"),
            Err(ResolverError::RepresentationNotSupported(_))
        ));
        assert!(matches!(
            check("metadata=yes"),
            Err(ResolverError::RepresentationNotSupported(_))
        ));
        assert!(matches!(
            check("versionTime=yesterday"),
            Err(ResolverError::RepresentationNotSupported(_))
        ));
        assert!(matches!(check("versionId=1.0"), Err(ResolverError::InvalidDidUrl(_))));
        assert!(matches!(
            check("resourceVersionTime=2023-01-26T00:00:00Z"),
            Err(ResolverError::RepresentationNotSupported(_))
        ));
        assert!(check("versionTime=2023-01-26").is_ok());
    }

    #[test]
    fn test_transform_keys_is_exclusive_in_any_order() {
        for other in ["resourceId=9ba3922e-d5f5-4f53-b265-fc0d4e988c77", "resourceName=schema", "resourceType=Image", "metadata=true", "resourceMetadata=true"] {
            for query in [
                format!("transformKeys=Ed25519VerificationKey2018&{}", other),
                format!("{}&transformKeys=Ed25519VerificationKey2018", other),
            ] {
                assert!(
                    matches!(
                        QueryParams::parse(&query).and_then(|p| validate_query(&p)),
                        Err(ResolverError::RepresentationNotSupported(_))
                    ),
                    "{} should be rejected",
                    query
                );
            }
        }

        assert!(matches!(
            QueryParams::parse("transformKeys=RsaVerificationKey2018").and_then(|p| validate_query(&p)),
            Err(ResolverError::RepresentationNotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_version_selection() {
        match run(&format!("versionId={}", V1)).await.unwrap() {
            QueryOutcome::Document(_, metadata) => {
                assert_eq!(metadata.version_id, V1);
                assert_eq!(metadata.resources.len(), 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match run("versionTime=2023-01-26T04:00:00Z").await.unwrap() {
            QueryOutcome::Document(_, metadata) => assert_eq!(metadata.version_id, V1),
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(matches!(
            run("versionTime=2023-01-26T00:30:00Z").await,
            Err(ResolverError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_version_id_with_version_time() {
        // An older version stays addressable after its successor took effect
        match run(&format!("versionId={}&versionTime=2023-01-26T06:00:00Z", V1)).await.unwrap() {
            QueryOutcome::Document(_, metadata) => assert_eq!(metadata.version_id, V1),
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(matches!(
            run(&format!("versionId={}&versionTime=2023-01-26T04:00:00Z", V2)).await,
            Err(ResolverError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_transform_keys() {
        match run("transformKeys=Ed25519VerificationKey2020").await.unwrap() {
            QueryOutcome::Document(doc, _) => assert_eq!(
                doc.verification_method[0].public_key_multibase.as_deref(),
                Some("z6Mkk7ooKAEpGSZvPtBBkxHSrgfNnmnFZUYvishGXwPydmFh")
            ),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_metadata_flags() {
        assert!(matches!(run("metadata=true").await, Ok(QueryOutcome::Metadata(_))));

        match run("metadata=false").await.unwrap() {
            QueryOutcome::Document(_, metadata) => assert!(metadata.resources.is_empty()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_service_redirect() {
        assert_eq!(
            run("service=website&relativeRef=/about%23team").await.unwrap(),
            QueryOutcome::ServiceRedirect("https://www.cheqd.io/about#team".to_string())
        );
        assert!(matches!(run("service=missing").await, Err(ResolverError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resource_type_ambiguity() {
        // Two schema versions share a name: newest wins
        match run("resourceType=JSONSchema2020").await.unwrap() {
            QueryOutcome::Resource(content) => assert_eq!(content.metadata.id, SCHEMA_2),
            other => panic!("unexpected outcome: {:?}", other),
        }

        // Names differ across matches
        assert!(matches!(
            run("resourceCollectionId=CpeMubv5yw63jXyrgRRsxR&resourceVersionTime=2023-01-26T04:00:00Z").await,
            Err(ResolverError::InvalidDidUrl(_))
        ));

        match run("resourceVersionTime=2023-01-26T04:00:00Z&resourceMetadata=true").await.unwrap() {
            QueryOutcome::Resources(list) => assert_eq!(list.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resource_filters() {
        assert!(matches!(
            run("resourceCollectionId=CpeMubv5yw63jXyrgRRsxR").await,
            Err(ResolverError::InvalidDidUrl(_))
        ));

        match run("resourceName=logo&resourceType=Image").await.unwrap() {
            QueryOutcome::Resource(content) => assert_eq!(content.data, format!("{{\"id\":\"{}\"}}", LOGO).into_bytes()),
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(matches!(run("resourceName=missing").await, Err(ResolverError::NotFound(_))));

        // The first version only sees resources created before the second took effect
        match run(&format!("versionId={}&resourceName=schema", V1)).await.unwrap() {
            QueryOutcome::Resource(content) => assert_eq!(content.metadata.id, SCHEMA_1),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
