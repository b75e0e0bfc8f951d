/// API routes and handlers
pub mod health;
pub mod resolver;

use crate::context::AppContext;
use axum::Router;

/// Build API routes, with the resolver routes mounted under `resolver_path`
pub fn routes(resolver_path: &str) -> Router<AppContext> {
    let prefix = resolver_path.trim_end_matches('/');
    let router = Router::new().merge(health::routes());

    if prefix.is_empty() {
        router.merge(resolver::routes())
    } else {
        router.nest(prefix, resolver::routes())
    }
}
