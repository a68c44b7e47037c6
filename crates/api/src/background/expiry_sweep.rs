//! Periodic expiry of in-memory admission state.
//!
//! Lazy expiry already keeps answers correct; the sweep bounds memory by
//! dropping entries for clients and sessions that never come back.

use std::sync::Arc;
use std::time::Duration;

use assessment_core::sweep::Sweep;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Call `target.sweep()` every `period` until `cancel` fires.
pub async fn run(target: Arc<dyn Sweep>, period: Duration, cancel: CancellationToken) {
    let name = target.name();
    tracing::info!(sweep = name, interval_secs = period.as_secs(), "Expiry sweep started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can have expired yet.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(sweep = name, "Expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let removed = target.sweep().await;
                if removed > 0 {
                    tracing::debug!(sweep = name, removed, "Expiry sweep: purged entries");
                }
            }
        }
    }
}
