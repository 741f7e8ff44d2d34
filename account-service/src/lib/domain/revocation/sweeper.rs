use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::ports::RevocationRegistry;

/// Spawn a background task that purges expired revocation entries every
/// `period`.
///
/// Lookups already purge lazily; the sweep only reclaims entries nobody
/// asks about again. The task runs until aborted.
pub fn spawn_sweeper<RR>(registry: Arc<RR>, period: Duration) -> JoinHandle<()>
where
    RR: RevocationRegistry + ?Sized,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            match registry.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::debug!(purged, "Swept expired revocation entries");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Revocation sweep failed");
                }
            }
        }
    })
}
