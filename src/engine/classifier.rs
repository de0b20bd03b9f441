use std::collections::BTreeSet;

use crate::coingecko::MarketRecord;

/// Split the universe into symbols the upstream feed covered and symbols it
/// did not. Matching is exact string equality after uppercasing the upstream
/// symbol; records outside the universe are ignored here and dropped later by
/// extraction.
pub fn partition(
    records: &[MarketRecord],
    universe: &[String],
) -> (BTreeSet<String>, BTreeSet<String>) {
    let seen: BTreeSet<String> = records
        .iter()
        .filter_map(|rec| rec.symbol_upper())
        .collect();

    let mut matched = BTreeSet::new();
    let mut missing = BTreeSet::new();
    for sym in universe {
        if seen.contains(sym) {
            matched.insert(sym.clone());
        } else {
            missing.insert(sym.clone());
        }
    }

    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Symbols absent from upstream feed, will synthesize");
    }

    (matched, missing)
}
