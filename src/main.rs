//! NSE Event Board — Binary Entrypoint
//! Boots the scrape scheduler and the Axum HTTP server against one shared
//! snapshot store.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nse_event_board::config::AppConfig;
use nse_event_board::metrics::Metrics;
use nse_event_board::scrape::nse::{NseApiFetcher, SOURCE_SPECS};
use nse_event_board::scrape::persist::{FsSink, SnapshotSink};
use nse_event_board::scrape::scheduler::{spawn_scrape_tasks, SchedulerCfg, ScrapeUnit};
use nse_event_board::scrape::types::SourceFetcher;
use nse_event_board::store::SnapshotStore;
use nse_event_board::{api, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("nse_event_board=info,scrape=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// One scrape unit per (source, market) combination; sources without a market
/// dimension get a single unit. The fetcher is shared across a source's units.
fn build_units(cfg: &AppConfig) -> anyhow::Result<Vec<ScrapeUnit>> {
    let mut units = Vec::new();
    for spec in SOURCE_SPECS.iter() {
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(NseApiFetcher::http(spec, cfg)?);
        let markets = spec.source.markets();
        if markets.is_empty() {
            units.push(ScrapeUnit {
                fetcher,
                market: None,
            });
        } else {
            for &market in markets {
                units.push(ScrapeUnit {
                    fetcher: fetcher.clone(),
                    market: Some(market),
                });
            }
        }
    }
    Ok(units)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load()?;
    let metrics = Metrics::init(cfg.scrape_interval_secs);

    let store = Arc::new(SnapshotStore::new());
    let sink: Option<Arc<dyn SnapshotSink>> = cfg
        .data_dir
        .as_ref()
        .map(|dir| Arc::new(FsSink::new(dir)) as Arc<dyn SnapshotSink>);

    let units = build_units(&cfg)?;
    tracing::info!(units = units.len(), interval_secs = cfg.scrape_interval_secs, "starting scrape scheduler");
    let _handles = spawn_scrape_tasks(
        units,
        store.clone(),
        sink,
        SchedulerCfg {
            interval: cfg.interval(),
            scrape_timeout: cfg.scrape_timeout(),
        },
    );

    let router = api::create_router(AppState { store }).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr.as_str()).await?;
    tracing::info!("listening on {}", cfg.listen_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
