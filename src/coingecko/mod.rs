pub mod rest;
pub mod types;

pub use rest::CoinGeckoClient;
pub use types::MarketRecord;
