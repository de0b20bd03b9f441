use std::collections::{BTreeSet, HashMap};

use rand::Rng;

use crate::config::SynthesisConfig;
use crate::model::AssetRecord;

use super::timestamp;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Fabricate records for universe symbols the upstream feed did not cover,
/// seeded by the baseline reference price times a currency-conversion rate
/// (1.0 when the baseline currency was requested directly). A symbol with no
/// baseline entry is dropped with a warning; the config loader normally rules
/// that out at startup.
pub fn fill_missing(
    missing: &BTreeSet<String>,
    baselines: &HashMap<String, f64>,
    conversion_rate: f64,
    cfg: &SynthesisConfig,
    rng: &mut impl Rng,
) -> Vec<AssetRecord> {
    missing
        .iter()
        .filter_map(|symbol| match baselines.get(symbol) {
            Some(&base) => Some(synth_record(symbol, base * conversion_rate, cfg, rng)),
            None => {
                tracing::warn!(symbol = %symbol, "No baseline price, omitting from output");
                None
            }
        })
        .collect()
}

/// Derive one self-consistent synthetic quote from a baseline price:
/// - spot within +/-spot_band of the baseline,
/// - bid/ask a 1-5% (configurable) band below/above spot, so bid < spot < ask,
/// - a synthetic yesterday price within +/-yesterday_band of spot, from which
///   the 24h change fields follow.
/// Everything rounds to 2 decimals; every value is redrawn per invocation.
pub fn synth_record(
    symbol: &str,
    base: f64,
    cfg: &SynthesisConfig,
    rng: &mut impl Rng,
) -> AssetRecord {
    let spot = round2(base * rng.gen_range(1.0 - cfg.spot_band..=1.0 + cfg.spot_band));

    let bid = round2(spot * (1.0 - rng.gen_range(cfg.spread_min..=cfg.spread_max)));
    let ask = round2(spot * (1.0 + rng.gen_range(cfg.spread_min..=cfg.spread_max)));

    let yesterday = round2(
        rng.gen_range(spot * (1.0 - cfg.yesterday_band)..=spot * (1.0 + cfg.yesterday_band)),
    );

    let change_percentage = if yesterday != 0.0 {
        round2((spot - yesterday) / yesterday * 100.0)
    } else {
        // Division-by-zero guard: substitute a plausible random move.
        round2(rng.gen_range(cfg.fallback_change_min..=cfg.fallback_change_max))
    };
    let change = round2((spot - yesterday).abs());

    AssetRecord {
        name: symbol.to_string(),
        symbol: symbol.to_string(),
        current_price: spot,
        high_24h: ask,
        low_24h: bid,
        last_updated: timestamp::random_recent_epoch(rng, cfg.backdate_days_max),
        price_change_24h: change,
        price_change_percentage_24h: change_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cfg() -> SynthesisConfig {
        SynthesisConfig {
            spot_band: 0.5,
            spread_min: 0.01,
            spread_max: 0.05,
            yesterday_band: 0.10,
            fallback_change_min: 1.0,
            fallback_change_max: 50.0,
            backdate_days_max: 30,
        }
    }

    #[test]
    fn synthetic_quote_is_self_consistent() {
        let cfg = cfg();
        let mut rng = StdRng::seed_from_u64(42);
        for seed in 0..200u64 {
            let rec = synth_record("FAKE", 100.0, &cfg, &mut rng);
            // bid <= spot <= ask must hold on the synthetic path.
            assert!(rec.low_24h <= rec.current_price, "seed {}", seed);
            assert!(rec.current_price <= rec.high_24h, "seed {}", seed);
            // Spot stays inside the configured band around the baseline.
            assert!(rec.current_price >= 100.0 * 0.5 - 0.01);
            assert!(rec.current_price <= 100.0 * 1.5 + 0.01);
            assert!(rec.low_24h > 0.0);
            // 24h fields are mutually consistent.
            assert!(rec.price_change_24h >= 0.0);
            assert!(rec.price_change_24h.is_finite());
            assert!(rec.price_change_percentage_24h.is_finite());
            assert_eq!(rec.name, "FAKE");
            assert_eq!(rec.symbol, "FAKE");
        }
    }

    #[test]
    fn values_round_to_two_decimals() {
        let cfg = cfg();
        let mut rng = StdRng::seed_from_u64(3);
        let rec = synth_record("FAKE", 123.456, &cfg, &mut rng);
        for v in [
            rec.current_price,
            rec.high_24h,
            rec.low_24h,
            rec.price_change_24h,
            rec.price_change_percentage_24h,
        ] {
            assert!(
                ((v * 100.0).round() - v * 100.0).abs() < 1e-9,
                "{} is not rounded to 2 decimals",
                v
            );
        }
    }

    #[test]
    fn zero_baseline_takes_fallback_percentage() {
        let cfg = cfg();
        let mut rng = StdRng::seed_from_u64(5);
        // base 0 forces spot and yesterday to 0, hitting the zero guard.
        let rec = synth_record("ZERO", 0.0, &cfg, &mut rng);
        assert!((rec.current_price - 0.0).abs() < f64::EPSILON);
        assert!(rec.price_change_percentage_24h >= 1.0);
        assert!(rec.price_change_percentage_24h <= 50.0);
    }

    #[test]
    fn missing_baseline_is_omitted() {
        let cfg = cfg();
        let mut rng = StdRng::seed_from_u64(8);
        let missing: BTreeSet<String> =
            ["FAKE".to_string(), "GHOST".to_string()].into_iter().collect();
        let baselines: HashMap<String, f64> = [("FAKE".to_string(), 100.0)].into_iter().collect();
        let out = fill_missing(&missing, &baselines, 1.0, &cfg, &mut rng);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "FAKE");
    }

    #[test]
    fn conversion_rate_scales_the_baseline() {
        let cfg = cfg();
        let mut rng = StdRng::seed_from_u64(13);
        let missing: BTreeSet<String> = ["FAKE".to_string()].into_iter().collect();
        let baselines: HashMap<String, f64> = [("FAKE".to_string(), 100.0)].into_iter().collect();
        let out = fill_missing(&missing, &baselines, 0.73, &cfg, &mut rng);
        assert!(out[0].current_price <= 100.0 * 0.73 * 1.5 + 0.01);
        assert!(out[0].current_price >= 100.0 * 0.73 * 0.5 - 0.01);
    }
}
