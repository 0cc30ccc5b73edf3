// src/scrape/scheduler.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, gauge, histogram};
use tokio::task::JoinHandle;

use crate::scrape::ensure_metrics_described;
use crate::scrape::persist::SnapshotSink;
use crate::scrape::types::{FetchError, Market, Snapshot, SourceFetcher};
use crate::store::SnapshotStore;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
    /// Upper bound on one fetch; a stuck fetch counts as a failed tick.
    pub scrape_timeout: Duration,
}

/// One independently scheduled scrape: a fetcher plus the market it targets
/// (`None` for sources without a market dimension).
pub struct ScrapeUnit {
    pub fetcher: Arc<dyn SourceFetcher>,
    pub market: Option<Market>,
}

/// Spawn one periodic task per unit. The first tick fires immediately, then
/// every `cfg.interval`. Units never wait on each other; a stuck or failing
/// unit only affects its own snapshot.
pub fn spawn_scrape_tasks(
    units: Vec<ScrapeUnit>,
    store: Arc<SnapshotStore>,
    sink: Option<Arc<dyn SnapshotSink>>,
    cfg: SchedulerCfg,
) -> Vec<JoinHandle<()>> {
    units
        .into_iter()
        .map(|unit| {
            let store = store.clone();
            let sink = sink.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(cfg.interval);
                loop {
                    ticker.tick().await;
                    run_unit_once(
                        unit.fetcher.as_ref(),
                        unit.market,
                        &store,
                        sink.as_deref(),
                        cfg.scrape_timeout,
                    )
                    .await;
                }
            })
        })
        .collect()
}

/// One tick for one unit: fetch, and on success swap the unit's snapshot (and
/// write it through to the sink, if any). On failure the previous snapshot is
/// left untouched and the next tick proceeds normally.
pub async fn run_unit_once(
    fetcher: &dyn SourceFetcher,
    market: Option<Market>,
    store: &SnapshotStore,
    sink: Option<&dyn SnapshotSink>,
    scrape_timeout: Duration,
) {
    ensure_metrics_described();
    let source = fetcher.source();
    let market_label = market.map(Market::as_str).unwrap_or("-");

    let t0 = Instant::now();
    let outcome = match tokio::time::timeout(scrape_timeout, fetcher.fetch(market)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    };
    histogram!("scrape_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match outcome {
        Ok(records) => {
            let snapshot = store.put(Snapshot {
                source,
                market,
                scraped_at: Utc::now(),
                records,
            });
            counter!("scrape_success_total").increment(1);
            gauge!("scrape_last_success_ts").set(snapshot.scraped_at.timestamp() as f64);
            tracing::info!(
                target: "scrape",
                source = source.key(),
                market = market_label,
                records = snapshot.total_records(),
                "scrape tick ok"
            );

            if let Some(sink) = sink {
                // Write-through is best-effort; the in-memory store stays
                // authoritative.
                if let Err(e) = sink.store(&snapshot).await {
                    tracing::warn!(
                        error = ?e,
                        source = source.key(),
                        market = market_label,
                        "snapshot persist failed"
                    );
                }
            }
        }
        Err(e) => {
            counter!("scrape_errors_total").increment(1);
            tracing::warn!(
                target: "scrape",
                error = %e,
                source = source.key(),
                market = market_label,
                "scrape failed, previous snapshot retained"
            );
        }
    }
}
