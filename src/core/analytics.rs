//! Aggregate statistics over a chronological rate series.
use crate::core::error::RateError;
use crate::core::quote::HistoryPoint;
use crate::core::rates::Change;

/// Market stats for one currency pair over a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Rate of the second-to-last point, or of the only point.
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub average: f64,
}

impl Statistics {
    /// Computes the stats of a non-empty series sorted ascending by date.
    pub fn from_series(points: &[HistoryPoint]) -> Result<Self, RateError> {
        let latest = points.last().ok_or(RateError::EmptySeries)?;
        debug_assert!(
            points.windows(2).all(|w| w[0].date < w[1].date),
            "series must be sorted with distinct dates"
        );

        let open = points
            .len()
            .checked_sub(2)
            .map_or(latest.rate, |idx| points[idx].rate);

        let (high, low, sum) = points.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY, 0.0),
            |(high, low, sum), p| (high.max(p.rate), low.min(p.rate), sum + p.rate),
        );

        Ok(Statistics {
            open,
            high,
            low,
            average: sum / points.len() as f64,
        })
    }
}

/// Everything the history view shows above the daily table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub current: HistoryPoint,
    pub change: Change,
    pub stats: Statistics,
}

impl SeriesSummary {
    pub fn from_series(points: &[HistoryPoint]) -> Result<Self, RateError> {
        let stats = Statistics::from_series(points)?;
        let current = *points.last().ok_or(RateError::EmptySeries)?;
        Ok(SeriesSummary {
            current,
            change: Change::between(current.rate, stats.open),
            stats,
        })
    }
}
