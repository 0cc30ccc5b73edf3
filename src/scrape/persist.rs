// src/scrape/persist.rs
use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::scrape::types::Snapshot;

/// Write-through destination for freshly published snapshots. Files are never
/// read back on the API path; they exist for offline inspection and as a warm
/// copy across restarts of external tooling.
#[async_trait::async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn store(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Filesystem sink: `<root>/<source>/latest.json`, or `latest_<market>.json`
/// for units with a market dimension.
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl SnapshotSink for FsSink {
    async fn store(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = self.root.join(snapshot.source.key());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        let name = match snapshot.market {
            Some(m) => format!("latest_{}.json", m.as_str()),
            None => "latest.json".to_string(),
        };
        let payload = serde_json::json!({
            "metadata": {
                "scrape_timestamp": snapshot.scraped_at.to_rfc3339(),
                "total_records": snapshot.total_records(),
                "market_type": snapshot.market_label(),
            },
            "data": snapshot.records,
        });

        let path = dir.join(name);
        let bytes = serde_json::to_vec_pretty(&payload).context("encoding snapshot")?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

// --- Test helper ---
pub struct MockSink {
    pub stored: std::sync::Mutex<Vec<(crate::scrape::types::Source, Option<crate::scrape::types::Market>, usize)>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            stored: std::sync::Mutex::new(vec![]),
        }
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SnapshotSink for MockSink {
    async fn store(&self, snapshot: &Snapshot) -> Result<()> {
        self.stored.lock().unwrap().push((
            snapshot.source,
            snapshot.market,
            snapshot.total_records(),
        ));
        Ok(())
    }
}
