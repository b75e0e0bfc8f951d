/// cheqd DID resolver
///
/// Resolves `did:cheqd` DIDs, DID URLs and linked resources from the cheqd
/// ledger, with health-checked primary/fallback ledger endpoints.
pub mod api;
pub mod config;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod jobs;
pub mod ledger;
pub mod migration;
pub mod pipeline;
pub mod resolution;
pub mod server;
pub mod types;

pub use config::ResolverConfig;
pub use context::AppContext;
pub use error::{IdentityError, ResolverError, ResolverResult};
