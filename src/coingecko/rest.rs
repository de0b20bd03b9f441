use anyhow::{Context, Result};

use crate::error::AppError;
use crate::model::QuoteCurrency;

use super::types::MarketRecord;

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    per_page: usize,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, api_key: Option<String>, per_page: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            per_page,
        }
    }

    /// Fetch market records for the given coin ids, paginating until a short
    /// page signals the end. A failed page is logged and ends the loop: the
    /// engine treats absent symbols the same as fetch failure, so partial
    /// results are always preferable to an error here.
    pub async fn fetch_markets(
        &self,
        currency: QuoteCurrency,
        ids: &[String],
    ) -> Vec<MarketRecord> {
        let ids_param = ids.join(",");
        let mut all: Vec<MarketRecord> = Vec::new();
        let mut page: usize = 1;

        loop {
            match self.fetch_page(currency, &ids_param, page).await {
                Ok(batch) => {
                    let short_page = batch.len() < self.per_page;
                    all.extend(batch);
                    if short_page {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    tracing::warn!(page, error = %format!("{:#}", e), "Market fetch failed, continuing with partial data");
                    break;
                }
            }
        }

        tracing::debug!(records = all.len(), pages = page, "Market fetch complete");
        all
    }

    async fn fetch_page(
        &self,
        currency: QuoteCurrency,
        ids_param: &str,
        page: usize,
    ) -> Result<Vec<MarketRecord>> {
        let url = format!("{}/coins/markets", self.base_url);
        let per_page = self.per_page.to_string();
        let page_param = page.to_string();
        let mut req = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .query(&[
                ("vs_currency", currency.api_name()),
                ("ids", ids_param),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ]);
        if let Some(key) = &self.api_key {
            req = req.header("x-cg-api-key", key);
        }

        let resp = req.send().await.context("coins/markets request failed")?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::CoinGeckoApi { status, body }.into());
        }

        resp.json::<Vec<MarketRecord>>()
            .await
            .context("coins/markets response was not a JSON array")
    }
}
