/// Resolution and dereferencing engine
///
/// Everything here except [`service`] is a pure function of fetched ledger
/// data and request parameters.
pub mod negotiation;
pub mod query;
pub mod resources;
pub mod service;
pub mod transform;
pub mod versions;

pub use negotiation::{negotiate, Negotiated};
pub use query::{resolve_query, validate_query, QueryOutcome};
pub use resources::{filter_resources, select_resource, ResourceSelection};
pub use service::{DidDocService, ResourceService};
pub use transform::transform_keys;
