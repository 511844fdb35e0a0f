// stakeledger/node/src/scheduler.rs

use crate::config::SchedulerConfig;
use crate::logging::TraceId;
use stakeledger_fees::{BatchSummary, FeeProcessor};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// Runs `process_all_due` on a fixed interval until `shutdown` fires.
///
/// A batch in flight when shutdown fires stops picking up wallets and
/// reports itself partial. Returns the summaries of every completed run.
pub async fn run_scheduler(
    processor: Arc<FeeProcessor>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
) -> Vec<BatchSummary> {
    let mut interval = time::interval(Duration::from_secs(config.interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    if !config.run_on_start {
        interval.tick().await;
    }

    info!(
        interval_secs = config.interval_secs,
        run_on_start = config.run_on_start,
        "Fee scheduler started"
    );

    let mut summaries = Vec::new();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        let trace_id = TraceId::new();
        let span = info_span!("scheduled_run", trace_id = %trace_id);
        match processor
            .process_all_due_until(&shutdown)
            .instrument(span)
            .await
        {
            Ok(summary) => summaries.push(summary),
            Err(e) => error!(trace_id = %trace_id, "Scheduled fee batch failed: {}", e),
        }
    }

    info!(runs = summaries.len(), "Fee scheduler stopped");
    summaries
}
