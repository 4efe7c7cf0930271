//! Display-side rate arithmetic: reciprocal normalization, day-over-day
//! change, the synthetic buy/sell spread and the display precision policy.

use super::currency::CurrencyCode;
use super::error::RateError;
use super::quote::{HistoryPoint, Snapshot};
use chrono::NaiveDate;
use tracing::warn;

/// Multiplier applied to the display rate for the "buying" column.
pub const BUYING_FACTOR: f64 = 0.9990;
/// Multiplier applied to the display rate for the "sales" column.
pub const SALES_FACTOR: f64 = 1.0010;

/// Converts a source rate ("1 base = r target") into the display rate
/// ("1 target = 1/r base").
pub fn normalize(rate: f64) -> Result<f64, RateError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(1.0 / rate)
    } else {
        Err(RateError::InvalidRate(rate))
    }
}

/// Normalizes every point of a series. Fails on the first invalid rate.
pub fn normalize_series(points: &[HistoryPoint]) -> Result<Vec<HistoryPoint>, RateError> {
    points
        .iter()
        .map(|p| {
            Ok(HistoryPoint {
                date: p.date,
                rate: normalize(p.rate)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub delta: f64,
    pub pct: f64,
}

impl Change {
    pub fn between(current: f64, previous: f64) -> Self {
        let delta = current - previous;
        let pct = if previous == 0.0 {
            0.0
        } else {
            (delta / previous) * 100.0
        };
        Change { delta, pct }
    }
}

pub fn buying(display_rate: f64) -> f64 {
    display_rate * BUYING_FACTOR
}

pub fn sales(display_rate: f64) -> f64 {
    display_rate * SALES_FACTOR
}

/// 4 decimals below 1, 3 decimals below 10, 2 decimals otherwise.
pub fn format_rate(value: f64) -> String {
    if value < 1.0 {
        format!("{value:.4}")
    } else if value < 10.0 {
        format!("{value:.3}")
    } else {
        format!("{value:.2}")
    }
}

/// One line of the rates table, in display convention.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub code: CurrencyCode,
    pub rate: f64,
    pub buying: f64,
    pub sales: f64,
    pub change_pct: f64,
    pub date: NaiveDate,
}

impl DisplayRow {
    fn new(code: CurrencyCode, current: f64, previous: f64, date: NaiveDate) -> Self {
        DisplayRow {
            code,
            rate: current,
            buying: buying(current),
            sales: sales(current),
            change_pct: Change::between(current, previous).pct,
            date,
        }
    }
}

/// Compares two snapshots of the same base. A code missing from `previous`,
/// or carrying a non-positive rate there, falls back to its current rate.
/// Quotes with an invalid current rate are skipped.
pub fn compare_snapshots(current: &Snapshot, previous: &Snapshot) -> Vec<DisplayRow> {
    current
        .quotes
        .iter()
        .filter_map(|quote| {
            let display = match normalize(quote.rate) {
                Ok(rate) => rate,
                Err(e) => {
                    warn!(code = %quote.code, "Skipping quote: {}", e);
                    return None;
                }
            };
            let previous_display = previous
                .get(&quote.code)
                .and_then(|prev| normalize(prev.rate).ok())
                .unwrap_or(display);
            Some(DisplayRow::new(
                quote.code.clone(),
                display,
                previous_display,
                quote.date,
            ))
        })
        .collect()
}

/// Builds one row per point of a chronological display-rate series, each
/// compared against the point before it. The first point has no predecessor
/// and reports zero change.
pub fn series_rows(code: &CurrencyCode, points: &[HistoryPoint]) -> Vec<DisplayRow> {
    points
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            let previous = idx
                .checked_sub(1)
                .map_or(point.rate, |prev| points[prev].rate);
            DisplayRow::new(code.clone(), point.rate, previous, point.date)
        })
        .collect()
}
