// tests/persist_files.rs
use chrono::Utc;
use nse_event_board::scrape::persist::{FsSink, SnapshotSink};
use nse_event_board::{Market, Record, Snapshot, Source};

fn snapshot(source: Source, market: Option<Market>, n: usize) -> Snapshot {
    let records = (0..n)
        .map(|i| {
            let mut r = Record::new();
            r.insert("SYMBOL".into(), serde_json::json!(format!("SYM{i}")));
            r
        })
        .collect();
    Snapshot {
        source,
        market,
        scraped_at: Utc::now(),
        records,
    }
}

#[tokio::test]
async fn fs_sink_writes_one_latest_file_per_unit() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = FsSink::new(tmp.path());

    sink.store(&snapshot(Source::Crd, None, 3)).await.unwrap();
    sink.store(&snapshot(Source::Announcements, Some(Market::Equity), 2))
        .await
        .unwrap();
    sink.store(&snapshot(Source::Announcements, Some(Market::Sme), 1))
        .await
        .unwrap();

    let crd = tmp.path().join("crd/latest.json");
    let eq = tmp.path().join("announcements/latest_equity.json");
    let sme = tmp.path().join("announcements/latest_sme.json");
    assert!(crd.exists() && eq.exists() && sme.exists());

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&crd).unwrap()).unwrap();
    assert_eq!(v["metadata"]["total_records"], 3);
    assert_eq!(v["metadata"]["market_type"], "none");
    assert!(v["metadata"]["scrape_timestamp"].is_string());
    assert_eq!(v["data"].as_array().unwrap().len(), 3);

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&eq).unwrap()).unwrap();
    assert_eq!(v["metadata"]["market_type"], "equity");
    assert_eq!(v["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn fs_sink_overwrites_on_next_publish() {
    let tmp = tempfile::tempdir().unwrap();
    let sink = FsSink::new(tmp.path());

    sink.store(&snapshot(Source::Crd, None, 5)).await.unwrap();
    sink.store(&snapshot(Source::Crd, None, 2)).await.unwrap();

    let v: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(tmp.path().join("crd/latest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(v["metadata"]["total_records"], 2);
}
