/// Version selection over a document's metadata history
use crate::types::{DidDocMetadata, ResourceMetadata};
use chrono::{DateTime, Utc};

/// Sort newest first by effective time. Stable, so equal times keep ledger order.
pub fn sort_newest_first(versions: &mut [DidDocMetadata]) {
    versions.sort_by(|a, b| b.effective_time().cmp(&a.effective_time()));
}

pub fn sort_resources_newest_first(resources: &mut [ResourceMetadata]) {
    resources.sort_by(|a, b| b.created.cmp(&a.created));
}

/// Version active at `time`: the newest version whose effective time is not after it
pub fn find_active_for_time(versions: &[DidDocMetadata], time: DateTime<Utc>) -> Option<&DidDocMetadata> {
    let mut sorted: Vec<&DidDocMetadata> = versions.iter().collect();
    sorted.sort_by(|a, b| b.effective_time().cmp(&a.effective_time()));
    sorted.into_iter().find(|v| v.effective_time() <= time)
}

pub fn find_by_id<'a>(versions: &'a [DidDocMetadata], version_id: &str) -> Option<&'a DidDocMetadata> {
    versions.iter().find(|v| v.version_id == version_id)
}

pub fn latest(versions: &[DidDocMetadata]) -> Option<&DidDocMetadata> {
    // First of the equally newest versions
    versions
        .iter()
        .min_by(|a, b| b.effective_time().cmp(&a.effective_time()))
}

/// Resources visible under `version_id`: everything for the latest version,
/// otherwise those created no later than the next version took effect.
/// Returned newest first.
pub fn resources_before_next_version(
    versions: &[DidDocMetadata],
    version_id: &str,
    resources: &[ResourceMetadata],
) -> Vec<ResourceMetadata> {
    let mut sorted: Vec<&DidDocMetadata> = versions.iter().collect();
    sorted.sort_by(|a, b| b.effective_time().cmp(&a.effective_time()));

    let mut visible: Vec<ResourceMetadata> = match sorted.iter().position(|v| v.version_id == version_id) {
        None => Vec::new(),
        Some(0) => resources.to_vec(),
        Some(index) => {
            let cutoff = sorted[index - 1].effective_time();
            resources.iter().filter(|r| r.created <= cutoff).cloned().collect()
        }
    };

    sort_resources_newest_first(&mut visible);
    visible
}

/// Fill every version with the resources visible under it and order the
/// list newest first
pub fn attach_visible_resources(versions: &mut Vec<DidDocMetadata>, resources: &[ResourceMetadata]) {
    let snapshot = versions.clone();
    for version in versions.iter_mut() {
        version.resources = resources_before_next_version(&snapshot, &version.version_id, resources);
    }
    sort_newest_first(versions);
}
