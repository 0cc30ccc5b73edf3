// src/query.rs
//
// Pagination over a snapshot, plus the query-parameter policy: missing values
// default, per_page above the cap clamps, everything else out of range is a
// hard 400. Clamp-high/reject-low keeps bulk export clients (which ask for the
// cap) working without silently accepting nonsense.

use serde::Serialize;

use crate::scrape::types::{Market, Record, Snapshot, Source};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 50;
pub const MAX_PER_PAGE: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{0}")]
    Validation(String),
    #[error("data not ready yet, scrape pending")]
    NotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: usize,
    pub per_page: usize,
}

impl PageParams {
    pub fn from_query(page: Option<&str>, per_page: Option<&str>) -> Result<Self, QueryError> {
        let page = parse_param("page", page, DEFAULT_PAGE)?;
        let per_page = parse_param("per_page", per_page, DEFAULT_PER_PAGE)?;
        Ok(Self {
            page,
            per_page: per_page.min(MAX_PER_PAGE),
        })
    }
}

fn parse_param(name: &str, raw: Option<&str>, default: usize) -> Result<usize, QueryError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| QueryError::Validation(format!("'{name}' must be a positive integer")))?;
    if value < 1 {
        return Err(QueryError::Validation(format!("'{name}' must be >= 1")));
    }
    Ok(value)
}

/// Resolve the `market` query parameter for a source. Sources without a market
/// dimension ignore the parameter entirely; for the rest a missing value
/// defaults to equity, and unknown or unsupported values are rejected.
pub fn resolve_market(source: Source, raw: Option<&str>) -> Result<Option<Market>, QueryError> {
    let supported = source.markets();
    if supported.is_empty() {
        return Ok(None);
    }
    let Some(raw) = raw else {
        return Ok(Some(Market::Equity));
    };
    let market = Market::parse(raw)
        .ok_or_else(|| QueryError::Validation(format!("unknown market '{raw}'")))?;
    if !source.supports(market) {
        let names: Vec<&str> = supported.iter().map(|m| m.as_str()).collect();
        return Err(QueryError::Validation(format!(
            "market '{}' not available for this source (supported: {})",
            market.as_str(),
            names.join(", ")
        )));
    }
    Ok(Some(market))
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug)]
pub struct PageSlice {
    pub pagination: Pagination,
    pub records: Vec<Record>,
}

/// Slice one page out of the snapshot's records.
pub fn paginate(snapshot: &Snapshot, params: &PageParams) -> PageSlice {
    let total_records = snapshot.records.len();
    let total_pages = total_records.div_ceil(params.per_page);

    let start = (params.page - 1).saturating_mul(params.per_page);
    let end = start.saturating_add(params.per_page).min(total_records);
    let records = if start < total_records {
        snapshot.records[start..end].to_vec()
    } else {
        Vec::new()
    };

    PageSlice {
        pagination: Pagination {
            page: params.page,
            per_page: params.per_page,
            total_records,
            total_pages,
            has_next: params.page < total_pages,
            has_prev: params.page > 1,
        },
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(n: usize) -> Snapshot {
        let records = (0..n)
            .map(|i| {
                let mut r = Record::new();
                r.insert("SEQ".into(), serde_json::json!(i));
                r
            })
            .collect();
        Snapshot {
            source: Source::EventCalendar,
            market: None,
            scraped_at: Utc::now(),
            records,
        }
    }

    fn page(n: usize, page: usize, per_page: usize) -> PageSlice {
        paginate(&snapshot(n), &PageParams { page, per_page })
    }

    #[test]
    fn params_default_clamp_and_reject() {
        let p = PageParams::from_query(None, None).unwrap();
        assert_eq!(p, PageParams { page: 1, per_page: 50 });

        let p = PageParams::from_query(Some("3"), Some("5000")).unwrap();
        assert_eq!(p, PageParams { page: 3, per_page: 1000 });

        assert!(PageParams::from_query(Some("abc"), None).is_err());
        assert!(PageParams::from_query(Some("0"), None).is_err());
        assert!(PageParams::from_query(None, Some("0")).is_err());
        assert!(PageParams::from_query(None, Some("-5")).is_err());
    }

    #[test]
    fn scenario_125_records_per_page_50() {
        let p1 = page(125, 1, 50);
        assert_eq!(p1.records.len(), 50);
        assert_eq!(p1.records[0]["SEQ"], serde_json::json!(0));
        assert_eq!(p1.records[49]["SEQ"], serde_json::json!(49));
        assert_eq!(p1.pagination.total_pages, 3);
        assert!(p1.pagination.has_next);
        assert!(!p1.pagination.has_prev);

        let p3 = page(125, 3, 50);
        assert_eq!(p3.records.len(), 25);
        assert_eq!(p3.records[0]["SEQ"], serde_json::json!(100));
        assert_eq!(p3.records[24]["SEQ"], serde_json::json!(124));
        assert!(!p3.pagination.has_next);
        assert!(p3.pagination.has_prev);
    }

    #[test]
    fn page_len_matches_clamped_remainder() {
        for (total, per_page, pg, want) in [
            (0, 50, 1, 0),
            (10, 50, 1, 10),
            (100, 50, 2, 50),
            (101, 50, 3, 1),
            (50, 50, 2, 0),
            (50, 50, 99, 0),
        ] {
            let got = page(total, pg, per_page).records.len();
            assert_eq!(got, want, "total={total} per_page={per_page} page={pg}");
        }
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        for (total, per_page, want) in [(0, 50, 0), (1, 50, 1), (50, 50, 1), (51, 50, 2), (125, 50, 3), (1000, 1000, 1)] {
            assert_eq!(page(total, 1, per_page).pagination.total_pages, want);
        }
    }

    #[test]
    fn empty_snapshot_pages_cleanly() {
        let p = page(0, 1, 50);
        assert_eq!(p.pagination.total_pages, 0);
        assert!(p.records.is_empty());
        assert!(!p.pagination.has_next);
        assert!(!p.pagination.has_prev);
    }

    #[test]
    fn repeated_reads_of_same_snapshot_are_identical() {
        let snap = snapshot(77);
        let params = PageParams { page: 2, per_page: 30 };
        let a = paginate(&snap, &params);
        let b = paginate(&snap, &params);
        assert_eq!(a.records, b.records);
        assert_eq!(a.pagination.total_records, b.pagination.total_records);
    }

    #[test]
    fn market_policy_per_source() {
        // no market dimension: parameter ignored, even a bogus one
        assert_eq!(resolve_market(Source::Crd, None).unwrap(), None);
        assert_eq!(resolve_market(Source::Crd, Some("debt")).unwrap(), None);
        assert_eq!(resolve_market(Source::Crd, Some("bogus")).unwrap(), None);

        // market dimension: default equity, parse, reject unknown/unsupported
        assert_eq!(
            resolve_market(Source::Announcements, None).unwrap(),
            Some(Market::Equity)
        );
        assert_eq!(
            resolve_market(Source::Announcements, Some("MF")).unwrap(),
            Some(Market::Mf)
        );
        assert!(resolve_market(Source::Announcements, Some("bogus")).is_err());
        assert!(resolve_market(Source::CreditRating, Some("debt")).is_err());
    }
}
