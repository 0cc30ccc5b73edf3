// src/scrape/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the four scraped exchange datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    EventCalendar,
    Announcements,
    Crd,
    CreditRating,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::EventCalendar,
        Source::Announcements,
        Source::Crd,
        Source::CreditRating,
    ];

    /// Stable identifier used in health payloads, metrics and on-disk layout.
    pub fn key(self) -> &'static str {
        match self {
            Source::EventCalendar => "event_calendar",
            Source::Announcements => "announcements",
            Source::Crd => "crd",
            Source::CreditRating => "credit_rating",
        }
    }

    /// Public API route serving this dataset.
    pub fn route(self) -> &'static str {
        match self {
            Source::EventCalendar => "/event-calendar",
            Source::Announcements => "/announcements",
            Source::Crd => "/crd",
            Source::CreditRating => "/credit-rating",
        }
    }

    /// Markets this dataset is scraped for. Empty slice means the dataset has
    /// no market dimension and the `market` query parameter is ignored.
    pub fn markets(self) -> &'static [Market] {
        match self {
            Source::Announcements => &[Market::Equity, Market::Sme, Market::Debt, Market::Mf],
            Source::CreditRating => &[Market::Equity, Market::Sme],
            Source::EventCalendar | Source::Crd => &[],
        }
    }

    pub fn supports(self, market: Market) -> bool {
        self.markets().contains(&market)
    }
}

/// Market sub-filter applied to sources that carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Equity,
    Sme,
    Debt,
    Mf,
}

impl Market {
    pub fn as_str(self) -> &'static str {
        match self {
            Market::Equity => "equity",
            Market::Sme => "sme",
            Market::Debt => "debt",
            Market::Mf => "mf",
        }
    }

    /// Case-insensitive parse of a query-parameter value.
    pub fn parse(s: &str) -> Option<Market> {
        match s.to_ascii_lowercase().as_str() {
            "equity" => Some(Market::Equity),
            "sme" => Some(Market::Sme),
            "debt" => Some(Market::Debt),
            "mf" => Some(Market::Mf),
            _ => None,
        }
    }
}

/// One scraped table row. Keys are the column names as the exchange reports
/// them (e.g. `SYMBOL`, `COMPANY`); values stay raw JSON because the site
/// mixes plain scalars with `{text, link}` cell objects. Insertion order is
/// preserved, so rows render in the original column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Full result set for one scrape unit as of its last successful scrape.
/// Replaced wholesale on success; never mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub source: Source,
    pub market: Option<Market>,
    pub scraped_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn market_label(&self) -> &'static str {
        self.market.map(Market::as_str).unwrap_or("none")
    }
}

/// Why a scrape attempt produced no snapshot. Callers can always distinguish
/// these from "zero rows", which is a successful fetch of an empty table.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("fetch timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("unrecognized payload: {0}")]
    Parse(String),
}

/// Swappable fetch mechanism for one dataset. The production implementation
/// talks HTTP to the exchange's JSON endpoints; tests plug in stubs, and a
/// browser-driven variant would implement the same trait.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the current table for the given market (`None` for sources
    /// without a market dimension).
    async fn fetch(&self, market: Option<Market>) -> Result<Vec<Record>, FetchError>;

    fn source(&self) -> Source;
}
