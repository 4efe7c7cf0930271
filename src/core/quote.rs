//! Quote abstractions and core types

use super::currency::CurrencyCode;
use super::error::QuoteError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// "1 unit of base currency equals `rate` units of `code`", as reported by
/// the quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub code: CurrencyCode,
    pub rate: f64,
    pub date: NaiveDate,
}

/// One dated set of quotes for a base currency. Quotes are ordered by code
/// and codes are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub base: CurrencyCode,
    pub date: NaiveDate,
    pub quotes: Vec<Quote>,
}

impl Snapshot {
    /// Builds a snapshot from raw `(code, rate)` pairs. Codes that are not
    /// valid currency codes are dropped.
    pub fn from_rates(base: CurrencyCode, date: NaiveDate, rates: BTreeMap<String, f64>) -> Self {
        let mut quotes: Vec<Quote> = rates
            .into_iter()
            .filter_map(|(code, rate)| match code.parse() {
                Ok(code) => Some(Quote { code, rate, date }),
                Err(_) => {
                    tracing::debug!("Skipping malformed currency code {:?}", code);
                    None
                }
            })
            .collect();
        // Case normalization can reorder or collide keys.
        quotes.sort_by(|a, b| a.code.cmp(&b.code));
        quotes.dedup_by(|a, b| a.code == b.code);
        Snapshot { base, date, quotes }
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<&Quote> {
        self.quotes
            .binary_search_by(|q| q.code.cmp(code))
            .ok()
            .map(|idx| &self.quotes[idx])
    }
}

/// A single dated rate for a fixed `(base, target)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub rate: f64,
}

/// The current and previous snapshots behind the live rates view.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPair {
    pub current: Snapshot,
    pub previous: Snapshot,
}

/// Raw reads against a quote source. Every call maps onto a single request.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn latest(&self, base: &CurrencyCode) -> Result<Snapshot, QuoteError>;

    async fn on_date(&self, base: &CurrencyCode, date: NaiveDate) -> Result<Snapshot, QuoteError>;

    async fn range(
        &self,
        base: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
        target: Option<&CurrencyCode>,
    ) -> Result<BTreeMap<NaiveDate, Snapshot>, QuoteError>;
}
