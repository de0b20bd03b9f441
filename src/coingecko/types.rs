use serde::Deserialize;

/// One entry of CoinGecko's `/coins/markets` response. Every field the
/// pipeline consumes is optional: the API returns null for thin markets and
/// may omit fields entirely, and both cases must default rather than fail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketRecord {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub current_price: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    /// ISO-8601 with fractional seconds and trailing `Z`, when present.
    pub last_updated: Option<String>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
}

impl MarketRecord {
    /// Upstream symbols arrive lowercase; matching is case-insensitive via
    /// uppercasing on ingestion.
    pub fn symbol_upper(&self) -> Option<String> {
        self.symbol.as_ref().map(|s| s.to_ascii_uppercase())
    }
}
