use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start the background jobs. They run until `shutdown` turns true; the
    /// returned handle completes once they have stopped.
    pub fn start(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        info!("Starting background job scheduler");
        let handle = tokio::spawn(Self::endpoint_health_job(Arc::clone(&self), shutdown));
        info!("Background jobs started");
        handle
    }

    /// Re-probe every ledger endpoint at the configured interval
    async fn endpoint_health_job(scheduler: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = scheduler.context.endpoints.settings().interval;
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The initial check already ran at startup
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match tasks::check_endpoints(&scheduler.context).await {
                        Ok(healthy) => info!("Endpoint health check: {} healthy endpoint(s)", healthy),
                        Err(e) => error!("Endpoint health check failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Stopping endpoint health job");
                        break;
                    }
                }
            }
        }
    }
}
