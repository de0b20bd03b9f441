use std::collections::BTreeSet;

use rand::Rng;

use crate::coingecko::MarketRecord;
use crate::model::AssetRecord;

use super::timestamp;

/// Project upstream records onto the fixed intermediate field set, defaulting
/// absent values and resolving `last_updated` to epoch seconds. Records whose
/// symbol is not in the matched universe set are dropped, and a symbol
/// appearing twice across pages keeps its first record, so the output holds
/// exactly one record per matched symbol. Fill-in for symbols the feed never
/// mentioned happens in the synthetic path, not here.
pub fn live_records(
    records: &[MarketRecord],
    matched: &BTreeSet<String>,
    backdate_days_max: i64,
    rng: &mut impl Rng,
) -> Vec<AssetRecord> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    records
        .iter()
        .filter_map(|rec| {
            let symbol = rec.symbol_upper()?;
            if !matched.contains(&symbol) || !seen.insert(symbol.clone()) {
                return None;
            }
            let last_updated = match rec.last_updated.as_deref() {
                Some(raw) => timestamp::iso_to_epoch(raw),
                None => timestamp::random_recent_epoch(rng, backdate_days_max),
            };
            Some(AssetRecord {
                name: rec.name.clone().unwrap_or_else(|| "Unknown".to_string()),
                symbol,
                current_price: rec.current_price.unwrap_or(0.0),
                high_24h: rec.high_24h.unwrap_or(0.0),
                low_24h: rec.low_24h.unwrap_or(0.0),
                last_updated,
                price_change_24h: rec.price_change_24h.unwrap_or(0.0),
                price_change_percentage_24h: rec.price_change_percentage_24h.unwrap_or(0.0),
            })
        })
        .collect()
}
