/// Resource filtering and the single-resource ambiguity policy
use super::versions::sort_resources_newest_first;
use crate::error::{ResolverError, ResolverResult};
use crate::types::{RequestParameters, ResourceMetadata};

/// What a resource query resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceSelection {
    /// Metadata listing, newest first
    List(Vec<ResourceMetadata>),
    /// Exactly one resource version whose data is requested
    Single(ResourceMetadata),
}

/// Apply every supplied resource filter. Any filter that empties the set is NotFound.
pub fn filter_resources(
    candidates: Vec<ResourceMetadata>,
    params: &RequestParameters,
) -> ResolverResult<Vec<ResourceMetadata>> {
    let mut resources = non_empty(candidates, "resource collection")?;

    if let Some(id) = &params.resource_id {
        resources = keep(resources, |r| &r.id == id, "resourceId")?;
    }
    if let Some(collection_id) = &params.resource_collection_id {
        resources = keep(resources, |r| &r.collection_id == collection_id, "resourceCollectionId")?;
    }
    if let Some(name) = &params.resource_name {
        resources = keep(resources, |r| &r.name == name, "resourceName")?;
    }
    if let Some(resource_type) = &params.resource_type {
        resources = keep(resources, |r| &r.resource_type == resource_type, "resourceType")?;
    }
    if let Some(version) = &params.resource_version {
        resources = keep(resources, |r| &r.version == version, "resourceVersion")?;
    }
    if let Some(checksum) = &params.checksum {
        resources = keep(resources, |r| &r.checksum == checksum, "checksum")?;
        if resources.len() > 1 {
            return Err(ResolverError::InvalidDidUrl(
                "checksum matches more than one resource".to_string(),
            ));
        }
    }
    if let Some(time) = params.resource_version_time {
        resources = keep(resources, |r| r.created <= time, "resourceVersionTime")?;
    }

    sort_resources_newest_first(&mut resources);
    Ok(resources)
}

fn keep<F>(resources: Vec<ResourceMetadata>, predicate: F, filter: &str) -> ResolverResult<Vec<ResourceMetadata>>
where
    F: Fn(&ResourceMetadata) -> bool,
{
    non_empty(resources.into_iter().filter(|r| predicate(r)).collect(), filter)
}

fn non_empty(resources: Vec<ResourceMetadata>, filter: &str) -> ResolverResult<Vec<ResourceMetadata>> {
    if resources.is_empty() {
        Err(ResolverError::NotFound(format!("no resource matches {}", filter)))
    } else {
        Ok(resources)
    }
}

/// Decide between a listing, a single resource, or an ambiguous query.
/// `filtered` must be the non-empty, newest-first output of [`filter_resources`].
pub fn select_resource(
    filtered: Vec<ResourceMetadata>,
    params: &RequestParameters,
) -> ResolverResult<ResourceSelection> {
    if params.resource_metadata == Some(true) {
        return Ok(ResourceSelection::List(filtered));
    }

    if !params.has_identifying_filter() {
        return Err(ResolverError::InvalidDidUrl(
            "query does not identify a single resource".to_string(),
        ));
    }

    if params.resource_type.is_some() && !same(&filtered, |r| &r.name) {
        return Err(ResolverError::InvalidDidUrl(
            "resourceType matches resources with different names".to_string(),
        ));
    }

    if !same(&filtered, |r| &r.name) || !same(&filtered, |r| &r.resource_type) {
        return Err(ResolverError::InvalidDidUrl(
            "query matches more than one resource".to_string(),
        ));
    }

    filtered
        .into_iter()
        .next()
        .map(ResourceSelection::Single)
        .ok_or_else(|| ResolverError::NotFound("resource".to_string()))
}

fn same<F>(resources: &[ResourceMetadata], field: F) -> bool
where
    F: Fn(&ResourceMetadata) -> &String,
{
    match resources.split_first() {
        Some((first, rest)) => rest.iter().all(|r| field(r) == field(first)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 26, h, m, 0).unwrap()
    }

    fn resource(id: &str, name: &str, resource_type: &str, version: &str, created: DateTime<Utc>) -> ResourceMetadata {
        ResourceMetadata {
            resource_uri: format!("did:cheqd:testnet:CpeMubv5yw63jXyrgRRsxR/resources/{}", id),
            collection_id: "CpeMubv5yw63jXyrgRRsxR".to_string(),
            id: id.to_string(),
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            media_type: "application/json".to_string(),
            version: version.to_string(),
            created,
            checksum: format!("checksum-{}", id),
            previous_version_id: None,
            next_version_id: None,
        }
    }

    fn collection() -> Vec<ResourceMetadata> {
        vec![
            resource("a", "schema", "JSONSchema2020", "1", at(9, 0)),
            resource("b", "schema", "JSONSchema2020", "2", at(10, 0)),
            resource("c", "logo", "JSONSchema2020", "1", at(11, 0)),
        ]
    }

    fn select(params: RequestParameters) -> ResolverResult<ResourceSelection> {
        select_resource(filter_resources(collection(), &params)?, &params)
    }

    #[test]
    fn test_type_alone_with_mixed_names_is_ambiguous() {
        let params = RequestParameters {
            resource_type: Some("JSONSchema2020".to_string()),
            ..Default::default()
        };
        assert!(matches!(select(params), Err(ResolverError::InvalidDidUrl(_))));
    }

    #[test]
    fn test_type_with_resource_metadata_lists_all() {
        let params = RequestParameters {
            resource_type: Some("JSONSchema2020".to_string()),
            resource_metadata: Some(true),
            ..Default::default()
        };
        match select(params).unwrap() {
            ResourceSelection::List(list) => {
                let ids: Vec<&str> = list.iter().map(|r| r.id.as_str()).collect();
                assert_eq!(ids, vec!["c", "b", "a"]);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_name_picks_newest_version() {
        let params = RequestParameters {
            resource_name: Some("schema".to_string()),
            ..Default::default()
        };
        assert_eq!(select(params).unwrap(), ResourceSelection::Single(collection()[1].clone()));
    }

    #[test]
    fn test_isolated_parameters_are_ambiguous() {
        for params in [
            RequestParameters {
                resource_collection_id: Some("CpeMubv5yw63jXyrgRRsxR".to_string()),
                ..Default::default()
            },
            RequestParameters {
                resource_version: Some("1".to_string()),
                ..Default::default()
            },
            RequestParameters {
                resource_collection_id: Some("CpeMubv5yw63jXyrgRRsxR".to_string()),
                resource_version: Some("2".to_string()),
                ..Default::default()
            },
        ] {
            assert!(matches!(select(params), Err(ResolverError::InvalidDidUrl(_))));
        }
    }

    #[test]
    fn test_version_time_filters_by_created() {
        let params = RequestParameters {
            resource_name: Some("schema".to_string()),
            resource_version_time: Some(at(9, 30)),
            ..Default::default()
        };
        assert_eq!(select(params).unwrap(), ResourceSelection::Single(collection()[0].clone()));

        let too_early = RequestParameters {
            resource_name: Some("schema".to_string()),
            resource_version_time: Some(at(8, 0)),
            ..Default::default()
        };
        assert!(matches!(select(too_early), Err(ResolverError::NotFound(_))));
    }

    #[test]
    fn test_no_match_is_not_found() {
        let params = RequestParameters {
            resource_name: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(matches!(select(params), Err(ResolverError::NotFound(_))));
        assert!(matches!(
            filter_resources(vec![], &RequestParameters::default()),
            Err(ResolverError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_checksum_is_ambiguous() {
        let mut resources = collection();
        resources[1].checksum = resources[0].checksum.clone();
        let params = RequestParameters {
            checksum: Some(resources[0].checksum.clone()),
            ..Default::default()
        };
        assert!(matches!(
            filter_resources(resources, &params),
            Err(ResolverError::InvalidDidUrl(_))
        ));
    }

    #[test]
    fn test_id_selects_exact_resource() {
        let params = RequestParameters {
            resource_id: Some("c".to_string()),
            ..Default::default()
        };
        assert_eq!(select(params).unwrap(), ResourceSelection::Single(collection()[2].clone()));
    }
}
