/// Quote currency a client can ask prices in. CAD is the service default;
/// anything unrecognized in a subscribe message falls back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteCurrency {
    Cad,
    Usd,
}

impl QuoteCurrency {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" => Self::Usd,
            _ => Self::Cad,
        }
    }

    /// Value for CoinGecko's `vs_currency` parameter.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Cad => "cad",
            Self::Usd => "usd",
        }
    }

    /// Suffix appended to every output symbol, e.g. `BTC_CAD`.
    pub fn symbol_suffix(&self) -> &'static str {
        match self {
            Self::Cad => "_CAD",
            Self::Usd => "_USD",
        }
    }
}
