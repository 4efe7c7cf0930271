use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::currency::CurrencyCode;
use crate::core::error::QuoteError;
use crate::core::quote::{QuoteSource, Snapshot};

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Quote source backed by a Frankfurter-compatible API.
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
    cache: Arc<Cache<String, String>>,
}

impl FrankfurterProvider {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        cache: Arc<Cache<String, String>>,
    ) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .user_agent("nomisma/0.1")
            .timeout(timeout)
            .build()?;
        Ok(FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            cache,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, QuoteError> {
        let body = match self.cache.get(&url).await {
            Some(cached) => cached,
            None => {
                debug!("Requesting rates from {}", url);
                let response = self.client.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(QuoteError::Http {
                        status: response.status(),
                        url,
                    });
                }
                let body = response.text().await?;
                self.cache.put(url.clone(), body.clone()).await;
                body
            }
        };

        serde_json::from_str(&body).map_err(|source| QuoteError::Decode { url, source })
    }
}

#[derive(Debug, Deserialize)]
struct DayResponse {
    base: CurrencyCode,
    date: NaiveDate,
    rates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    base: CurrencyCode,
    rates: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

impl From<DayResponse> for Snapshot {
    fn from(day: DayResponse) -> Self {
        Snapshot::from_rates(day.base, day.date, day.rates)
    }
}

#[async_trait]
impl QuoteSource for FrankfurterProvider {
    #[instrument(name = "FrankfurterLatest", skip(self), fields(base = %base))]
    async fn latest(&self, base: &CurrencyCode) -> Result<Snapshot, QuoteError> {
        let url = format!("{}/latest?from={}", self.base_url, base);
        let day: DayResponse = self.get_json(url).await?;
        Ok(day.into())
    }

    #[instrument(name = "FrankfurterOnDate", skip(self), fields(base = %base, date = %date))]
    async fn on_date(&self, base: &CurrencyCode, date: NaiveDate) -> Result<Snapshot, QuoteError> {
        let url = format!("{}/{}?from={}", self.base_url, date.format("%Y-%m-%d"), base);
        let day: DayResponse = self.get_json(url).await?;
        Ok(day.into())
    }

    #[instrument(name = "FrankfurterRange", skip(self, target), fields(base = %base))]
    async fn range(
        &self,
        base: &CurrencyCode,
        start: NaiveDate,
        end: NaiveDate,
        target: Option<&CurrencyCode>,
    ) -> Result<BTreeMap<NaiveDate, Snapshot>, QuoteError> {
        let mut url = format!(
            "{}/{}..{}?from={}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            base
        );
        if let Some(target) = target {
            url.push_str(&format!("&to={target}"));
        }

        let range: RangeResponse = self.get_json(url).await?;
        let base = range.base;
        Ok(range
            .rates
            .into_iter()
            .map(|(date, rates)| (date, Snapshot::from_rates(base.clone(), date, rates)))
            .collect())
    }
}
