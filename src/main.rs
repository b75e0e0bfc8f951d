/// cheqd DID resolver
///
/// Universal Resolver driver for `did:cheqd`, serving DID resolution and DID
/// URL dereferencing over HTTP.
use cheqd_did_resolver::{
    config::{LogFormat, ResolverConfig},
    context::AppContext,
    jobs, server,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ResolverConfig::from_env()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "cheqd_did_resolver={level},tower_http={level}",
            level = config.logging.level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    print_banner();
    config.log_summary();

    // Create application context; fails when no ledger endpoint is reachable
    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let (stop_jobs, shutdown) = watch::channel(false);
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    let jobs = scheduler.start(shutdown);

    // Start server
    server::serve((*ctx).clone(), server::shutdown_signal()).await?;

    let _ = stop_jobs.send(true);
    jobs.await?;
    info!("Shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
        __                       __
  _____/ /_  ___  ____ _____/ /
 / ___/ __ \/ _ \/ __ `/ __  /
/ /__/ / / /  __/ /_/ / /_/ /
\___/_/ /_/\___/\__, /\__,_/
                  /_/
        did:cheqd Resolver v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
