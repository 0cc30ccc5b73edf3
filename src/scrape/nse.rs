// src/scrape/nse.rs
//
// One generic fetcher for all four exchange datasets. Each dataset is a
// `SourceSpec` configuration value (endpoint path, row-array location,
// market parameter), not its own code path.

use std::time::Instant;

use anyhow::Context;
use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};

use crate::config::AppConfig;
use crate::scrape::types::{FetchError, Market, Record, Source, SourceFetcher};
use crate::scrape::{ensure_metrics_described, normalize_record};

/// Where and how one dataset lives on the exchange site.
#[derive(Debug)]
pub struct SourceSpec {
    pub source: Source,
    /// JSON endpoint path relative to the base URL.
    pub path: &'static str,
    /// Key holding the row array, or `None` when the payload is the array.
    pub result_key: Option<&'static str>,
    /// Query parameter carrying the market filter, for sources that have one.
    pub market_param: Option<&'static str>,
}

pub static SOURCE_SPECS: [SourceSpec; 4] = [
    SourceSpec {
        source: Source::EventCalendar,
        path: "/api/event-calendar",
        result_key: None,
        market_param: None,
    },
    SourceSpec {
        source: Source::Announcements,
        path: "/api/corporate-announcements",
        result_key: None,
        market_param: Some("index"),
    },
    SourceSpec {
        source: Source::Crd,
        path: "/api/corporate-credit-rating",
        result_key: Some("data"),
        market_param: None,
    },
    SourceSpec {
        source: Source::CreditRating,
        path: "/api/credit-rating-reg30",
        result_key: Some("data"),
        market_param: Some("index"),
    },
];

impl SourceSpec {
    pub fn for_source(source: Source) -> &'static SourceSpec {
        SOURCE_SPECS
            .iter()
            .find(|s| s.source == source)
            .expect("spec table covers every source")
    }
}

/// Value the exchange expects for a market in its query string.
fn market_query_value(market: Market) -> &'static str {
    match market {
        Market::Equity => "equities",
        Market::Sme => "sme",
        Market::Debt => "debt",
        Market::Mf => "mf",
    }
}

fn request_url(spec: &SourceSpec, base_url: &str, market: Option<Market>) -> String {
    let mut url = format!("{}{}", base_url, spec.path);
    if let (Some(param), Some(market)) = (spec.market_param, market) {
        url.push('?');
        url.push_str(param);
        url.push('=');
        url.push_str(market_query_value(market));
    }
    url
}

enum Mode {
    Http {
        base_url: String,
        client: reqwest::Client,
    },
    /// Canned response body, for tests.
    Fixture(String),
}

pub struct NseApiFetcher {
    spec: &'static SourceSpec,
    mode: Mode,
}

impl NseApiFetcher {
    pub fn http(spec: &'static SourceSpec, cfg: &AppConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .user_agent(&cfg.user_agent)
            .timeout(cfg.scrape_timeout())
            .gzip(true)
            // The site's JSON endpoints refuse requests without the session
            // cookies set by the landing page.
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .context("building exchange http client")?;

        Ok(Self {
            spec,
            mode: Mode::Http {
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                client,
            },
        })
    }

    pub fn fixture(spec: &'static SourceSpec, body: &str) -> Self {
        Self {
            spec,
            mode: Mode::Fixture(body.to_string()),
        }
    }

    fn parse_rows(spec: &SourceSpec, body: &str) -> Result<Vec<Record>, FetchError> {
        ensure_metrics_described();
        let t0 = Instant::now();

        let mut payload: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| FetchError::Parse(format!("invalid json: {e}")))?;

        let rows = match spec.result_key {
            Some(key) => payload
                .get_mut(key)
                .map(serde_json::Value::take)
                .ok_or_else(|| FetchError::Parse(format!("missing '{key}' key in payload")))?,
            None => payload,
        };
        let serde_json::Value::Array(rows) = rows else {
            return Err(FetchError::Parse("payload is not a row array".into()));
        };

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                serde_json::Value::Object(map) => out.push(normalize_record(map)),
                other => {
                    return Err(FetchError::Parse(format!(
                        "row is not an object: {other}"
                    )))
                }
            }
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("scrape_parse_ms").record(ms);
        counter!("scrape_records_total").increment(out.len() as u64);
        Ok(out)
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Connection(e)
    }
}

#[async_trait::async_trait]
impl SourceFetcher for NseApiFetcher {
    async fn fetch(&self, market: Option<Market>) -> Result<Vec<Record>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => Self::parse_rows(self.spec, body),

            Mode::Http { base_url, client } => {
                // Prime the session cookie jar; the landing page response body
                // itself is irrelevant.
                client
                    .get(base_url.as_str())
                    .send()
                    .await
                    .map_err(classify)?;

                let url = request_url(self.spec, base_url, market);
                let resp = client
                    .get(&url)
                    .header(REFERER, base_url.as_str())
                    .send()
                    .await
                    .map_err(classify)?;
                if !resp.status().is_success() {
                    return Err(FetchError::Status(resp.status().as_u16()));
                }

                let body = resp.text().await.map_err(classify)?;
                Self::parse_rows(self.spec, &body)
            }
        }
    }

    fn source(&self) -> Source {
        self.spec.source
    }
}
