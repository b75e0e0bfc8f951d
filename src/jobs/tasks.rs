/// Background task implementations
use crate::{
    context::AppContext,
    error::{ResolverError, ResolverResult},
};

/// Probe every ledger endpoint and return how many are healthy afterwards
pub async fn check_endpoints(ctx: &AppContext) -> ResolverResult<usize> {
    ctx.endpoints.check_all_endpoints().await;

    let healthy = ctx
        .endpoints
        .statuses()
        .await
        .iter()
        .filter(|status| status.healthy)
        .count();

    if healthy == 0 {
        return Err(ResolverError::NoHealthyEndpoints("all namespaces".to_string()));
    }
    Ok(healthy)
}
