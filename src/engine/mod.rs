//! Normalization and fill-in engine: turns a partial upstream result set into
//! a complete, consistently shaped, sorted panel for the configured asset
//! universe. Symbols the feed covered pass through as live records; the rest
//! are synthesized from baseline reference prices.

pub mod classifier;
pub mod extract;
pub mod shape;
pub mod synth;
pub mod timestamp;

use std::collections::HashMap;

use rand::Rng;

use crate::coingecko::MarketRecord;
use crate::config::SynthesisConfig;
use crate::model::{QuoteCurrency, RateRecord};

pub struct Engine {
    universe: Vec<String>,
    baselines: HashMap<String, f64>,
    synthesis: SynthesisConfig,
    cad_to_usd_rate: f64,
}

impl Engine {
    pub fn new(
        universe: Vec<String>,
        baselines: HashMap<String, f64>,
        synthesis: SynthesisConfig,
        cad_to_usd_rate: f64,
    ) -> Self {
        Self {
            universe,
            baselines,
            synthesis,
            cad_to_usd_rate,
        }
    }

    /// One full engine invocation. Pure apart from logging: no state survives
    /// between calls, so concurrent invocations from different connections
    /// need no locking.
    pub fn normalize(&self, raw: &[MarketRecord], currency: QuoteCurrency) -> Vec<RateRecord> {
        self.normalize_with_rng(raw, currency, &mut rand::thread_rng())
    }

    /// Same as [`Engine::normalize`] but with an injected RNG so tests can
    /// seed the synthetic path.
    pub fn normalize_with_rng(
        &self,
        raw: &[MarketRecord],
        currency: QuoteCurrency,
        rng: &mut impl Rng,
    ) -> Vec<RateRecord> {
        let (matched, missing) = classifier::partition(raw, &self.universe);

        let mut records = extract::live_records(
            raw,
            &matched,
            self.synthesis.backdate_days_max,
            rng,
        );

        // Baselines are stored in CAD; convert before perturbation when the
        // client asked for USD.
        let rate = match currency {
            QuoteCurrency::Cad => 1.0,
            QuoteCurrency::Usd => self.cad_to_usd_rate,
        };
        records.extend(synth::fill_missing(
            &missing,
            &self.baselines,
            rate,
            &self.synthesis,
            rng,
        ));

        shape::finalize(records, currency.symbol_suffix())
    }
}
