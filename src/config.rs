use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub coingecko: CoinGeckoConfig,
    pub server: ServerConfig,
    pub assets: AssetConfig,
    pub synthesis: SynthesisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub default_quote_currency: String,
    pub per_page: usize,
    /// Seconds between server-initiated refresh pushes per connection.
    pub refresh_interval_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub frontend_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    pub universe: Vec<String>,
    pub baseline_file: String,
    /// Static CAD->USD rate applied to baseline prices when USD is requested.
    pub cad_to_usd_rate: f64,
}

/// Tunable bands for the synthetic quote generator. All bands are fractions,
/// e.g. `spot_band = 0.5` means spot lands within +/-50% of the baseline.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    pub spot_band: f64,
    pub spread_min: f64,
    pub spread_max: f64,
    pub yesterday_band: f64,
    pub fallback_change_min: f64,
    pub fallback_change_max: f64,
    pub backdate_days_max: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AssetConfig {
    /// Universe symbols, uppercased, trimmed, deduplicated, in declaration order.
    pub fn universe_symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        for sym in &self.universe {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = Path::new("config/default.toml");
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;

        let mut config: Config =
            toml::from_str(&config_str).context("failed to parse config/default.toml")?;

        // The key is optional: CoinGecko's public endpoints answer without one,
        // just with tighter rate limits.
        config.coingecko.api_key = std::env::var("COINGECKO_API_KEY").ok();

        if config.assets.universe.is_empty() {
            return Err(AppError::Config("assets.universe must not be empty".to_string()).into());
        }
        if config.synthesis.spread_min > config.synthesis.spread_max {
            return Err(AppError::Config(
                "synthesis.spread_min must be <= synthesis.spread_max".to_string(),
            )
            .into());
        }

        Ok(config)
    }
}

/// Versioned baseline artifact: per-symbol reference prices (quote currency)
/// and CoinGecko ids, produced by a periodic refresh job rather than baked
/// into source. Loaded once at startup and immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct BaselineBook {
    pub prices: HashMap<String, f64>,
    #[serde(default)]
    pub ids: HashMap<String, String>,
}

impl BaselineBook {
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read baseline artifact {}", path))?;
        let book: BaselineBook =
            serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path))?;
        Ok(book)
    }

    /// Fail fast on incomplete universe coverage: a symbol with no baseline
    /// price could never be synthesized and would silently vanish from the
    /// output whenever the upstream feed misses it.
    pub fn validate_coverage(&self, universe: &[String]) -> Result<()> {
        let uncovered: Vec<&String> = universe
            .iter()
            .filter(|sym| !self.prices.contains_key(*sym))
            .collect();
        if !uncovered.is_empty() {
            return Err(AppError::Config(format!(
                "baseline artifact is missing prices for {:?}",
                uncovered
            ))
            .into());
        }
        Ok(())
    }

    /// CoinGecko ids for the given symbols, skipping unmapped ones. Symbols
    /// without an id simply never come back live and get synthesized.
    pub fn ids_for(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .filter_map(|sym| self.ids.get(sym).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let toml_str = r#"
[coingecko]
base_url = "https://api.coingecko.com/api/v3"
default_quote_currency = "cad"
per_page = 250
refresh_interval_secs = 30

[server]
bind_addr = "127.0.0.1:8000"
frontend_dir = "frontend"

[assets]
universe = ["BTC", "ETH", "DOGE"]
baseline_file = "config/baseline_prices.json"
cad_to_usd_rate = 0.73

[synthesis]
spot_band = 0.5
spread_min = 0.01
spread_max = 0.05
yesterday_band = 0.10
fallback_change_min = 1.0
fallback_change_max = 50.0
backdate_days_max = 30

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.coingecko.per_page, 250);
        assert_eq!(config.assets.universe.len(), 3);
        assert!((config.synthesis.spot_band - 0.5).abs() < f64::EPSILON);
        assert!((config.assets.cad_to_usd_rate - 0.73).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn universe_symbols_dedup_and_uppercase() {
        let cfg = AssetConfig {
            universe: vec![
                "btc".to_string(),
                "ETH".to_string(),
                "BTC".to_string(),
                "  ".to_string(),
            ],
            baseline_file: "x".to_string(),
            cad_to_usd_rate: 0.73,
        };
        assert_eq!(
            cfg.universe_symbols(),
            vec!["BTC".to_string(), "ETH".to_string()]
        );
    }

    #[test]
    fn baseline_coverage_reports_gaps() {
        let book: BaselineBook =
            serde_json::from_str(r#"{ "prices": { "BTC": 91000.0 }, "ids": { "BTC": "bitcoin" } }"#)
                .unwrap();
        let universe = vec!["BTC".to_string(), "FAKE".to_string()];
        let err = book.validate_coverage(&universe).unwrap_err();
        assert!(err.to_string().contains("FAKE"));
        assert!(book.validate_coverage(&universe[..1]).is_ok());
    }

    #[test]
    fn ids_skip_unmapped_symbols() {
        let book: BaselineBook = serde_json::from_str(
            r#"{ "prices": { "BTC": 91000.0, "QCAD": 1.0 }, "ids": { "BTC": "bitcoin" } }"#,
        )
        .unwrap();
        let ids = book.ids_for(&["BTC".to_string(), "QCAD".to_string()]);
        assert_eq!(ids, vec!["bitcoin".to_string()]);
    }
}
