//! Fail-soft quote fetching on top of a [`QuoteSource`].
//!
//! Every operation here turns upstream failures into "no data": callers get
//! `None`, an empty map or an empty series, and the failure is logged.

use super::currency::CurrencyCode;
use super::quote::{HistoryPoint, QuoteSource, Snapshot, SnapshotPair};
use chrono::{Duration, NaiveDate};
use futures::future::join;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Width of the window used to find the two most recent trading days. Wide
/// enough to span a weekend plus holidays.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// `as_of` moved back by `days`, or `None` past the calendar range.
fn days_before(as_of: NaiveDate, days: i64) -> Option<NaiveDate> {
    let start = Duration::try_days(days).and_then(|span| as_of.checked_sub_signed(span));
    if start.is_none() {
        warn!("{} days before {} is out of range", days, as_of);
    }
    start
}

pub struct QuoteFetcher<'a> {
    source: &'a (dyn QuoteSource + Send + Sync),
}

impl<'a> QuoteFetcher<'a> {
    pub fn new(source: &'a (dyn QuoteSource + Send + Sync)) -> Self {
        QuoteFetcher { source }
    }

    /// Latest snapshot plus the one for the day before `as_of`. Both reads run
    /// concurrently. When the previous day cannot be read the current snapshot
    /// doubles as previous, so every change reads as zero.
    #[instrument(name = "LiveRates", skip(self), fields(base = %base))]
    pub async fn live(&self, base: &CurrencyCode, as_of: NaiveDate) -> Option<SnapshotPair> {
        let yesterday = days_before(as_of, 1)?;
        let (current, previous) = join(
            self.source.latest(base),
            self.source.on_date(base, yesterday),
        )
        .await;

        let current = match current {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Latest rates unavailable: {}", e);
                return None;
            }
        };
        let previous = match previous {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Rates for {} unavailable, comparing against latest: {}", yesterday, e);
                current.clone()
            }
        };
        Some(SnapshotPair { current, previous })
    }

    /// The two most recent trading days inside a one-week window ending at
    /// `as_of`. With a single trading day in the window, previous equals latest.
    #[instrument(name = "RecentRates", skip(self), fields(base = %base))]
    pub async fn recent(&self, base: &CurrencyCode, as_of: NaiveDate) -> Option<SnapshotPair> {
        let start = days_before(as_of, RECENT_WINDOW_DAYS)?;
        let mut days = self.range(base, start, as_of, None).await;

        // Keys are ordered ascending, so the tail holds the latest days.
        let (_, current) = days.pop_last()?;
        let previous = match days.pop_last() {
            Some((_, snapshot)) => snapshot,
            None => current.clone(),
        };
        debug!(current = %current.date, previous = %previous.date, "Selected trading days");
        Some(SnapshotPair { current, previous })
    }

    /// Snapshots for every published day in `[start, end]`.
    pub async fn range(
        &self,
        base: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
        target: Option<&CurrencyCode>,
    ) -> BTreeMap<NaiveDate, Snapshot> {
        match self.source.range(base, start, end, target).await {
            Ok(days) => days,
            Err(e) => {
                warn!("Rates for {}..{} unavailable: {}", start, end, e);
                BTreeMap::new()
            }
        }
    }

    /// Chronological source-convention series for `target` over the `days`
    /// days ending at `as_of`.
    #[instrument(name = "History", skip(self), fields(base = %base, target = %target))]
    pub async fn history(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        days: u32,
        as_of: NaiveDate,
    ) -> Vec<HistoryPoint> {
        let Some(start) = days_before(as_of, i64::from(days)) else {
            return Vec::new();
        };
        self.range(base, start, as_of, Some(target))
            .await
            .into_iter()
            .filter_map(|(date, snapshot)| {
                snapshot
                    .get(target)
                    .map(|quote| HistoryPoint { date, rate: quote.rate })
            })
            .collect()
    }
}
