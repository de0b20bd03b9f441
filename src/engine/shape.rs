use std::cmp::Ordering;

use crate::model::{AssetRecord, RateRecord};

/// Final pass over the unified live + synthetic list: rename to the output
/// schema, append the quote-currency suffix, and sort by bid descending.
/// The sort is stable, so equal bids keep their encounter order.
pub fn finalize(records: Vec<AssetRecord>, suffix: &str) -> Vec<RateRecord> {
    let mut out: Vec<RateRecord> = records
        .into_iter()
        .map(|rec| {
            // Guard against double-appending if a record somehow arrives
            // already suffixed.
            let symbol = if rec.symbol.ends_with(suffix) {
                rec.symbol
            } else {
                format!("{}{}", rec.symbol, suffix)
            };
            RateRecord {
                name: rec.name,
                symbol,
                spot: rec.current_price,
                ask: rec.high_24h,
                bid: rec.low_24h,
                timestamp: rec.last_updated,
                change: rec.price_change_24h,
                change_percentage: rec.price_change_percentage_24h,
            }
        })
        .collect();

    out.sort_by(|a, b| b.bid.partial_cmp(&a.bid).unwrap_or(Ordering::Equal));
    out
}
