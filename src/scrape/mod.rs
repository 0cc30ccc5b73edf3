// src/scrape/mod.rs
pub mod nse;
pub mod persist;
pub mod scheduler;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::scrape::types::Record;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_success_total", "Scrape ticks that published a snapshot.");
        describe_counter!(
            "scrape_errors_total",
            "Scrape ticks that failed (timeout/connection/parse)."
        );
        describe_counter!("scrape_records_total", "Total rows parsed from the exchange.");
        describe_histogram!("scrape_duration_ms", "Wall time of one scrape tick in ms.");
        describe_histogram!("scrape_parse_ms", "Payload parse time in milliseconds.");
        describe_gauge!(
            "scrape_last_success_ts",
            "Unix ts of the most recent successful scrape."
        );
    });
}

/// Normalize a scraped cell string: decode HTML entities, collapse whitespace,
/// trim. Content is otherwise left alone.
pub fn normalize_cell_text(s: &str) -> String {
    let out = html_escape::decode_html_entities(s).to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Normalize every string cell in a row, including strings nested inside
/// `{text, link}` cell objects.
pub fn normalize_record(mut row: Record) -> Record {
    for (_, v) in row.iter_mut() {
        normalize_value(v);
    }
    row
}

fn normalize_value(v: &mut serde_json::Value) {
    match v {
        serde_json::Value::String(s) => *s = normalize_cell_text(s),
        serde_json::Value::Object(map) => {
            for (_, inner) in map.iter_mut() {
                normalize_value(inner);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_cell_decodes_and_collapses() {
        let s = "  Board&nbsp;&nbsp;Meeting \n for &amp; dividend  ";
        assert_eq!(normalize_cell_text(s), "Board Meeting for & dividend");
    }

    #[test]
    fn normalize_record_reaches_nested_cells() {
        let mut row = Record::new();
        row.insert("SYMBOL".into(), json!("  RELIANCE \t"));
        row.insert(
            "ATTACHMENT".into(),
            json!({"text": "PDF&nbsp;link", "link": "https://x/y.pdf"}),
        );
        row.insert("COUNT".into(), json!(3));

        let out = normalize_record(row);
        assert_eq!(out["SYMBOL"], json!("RELIANCE"));
        assert_eq!(out["ATTACHMENT"]["text"], json!("PDF link"));
        assert_eq!(out["COUNT"], json!(3));
    }

    #[test]
    fn record_preserves_column_order() {
        let mut row = Record::new();
        row.insert("Z_LAST".into(), json!(1));
        row.insert("A_FIRST".into(), json!(2));
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, vec!["Z_LAST", "A_FIRST"]);
    }
}
