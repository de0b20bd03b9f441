use serde::Serialize;

/// Intermediate record shared by the live and synthetic paths: upstream field
/// names, every numeric present, `last_updated` already resolved to Unix epoch
/// seconds. Only the shaper turns this into the output schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub name: String,
    pub symbol: String,
    pub current_price: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub last_updated: i64,
    pub price_change_24h: f64,
    pub price_change_percentage_24h: f64,
}

/// One element of the output sequence pushed to clients. Symbols carry the
/// quote-currency suffix (`BTC_CAD`); no field is ever null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRecord {
    pub name: String,
    pub symbol: String,
    pub spot: f64,
    pub ask: f64,
    pub bid: f64,
    pub timestamp: i64,
    pub change: f64,
    pub change_percentage: f64,
}
